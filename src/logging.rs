//! Logging setup (§11): one `fern::Dispatch` chain, silent by default except
//! for this crate's own target, mirroring the teacher's "only log our own
//! code, let library consumers opt in" policy.

use std::io;
use std::path::Path;

use log::LevelFilter;

/// Configure the global logger. `log_file` is the path the caller wants the
/// recipe run's log written to; if it can't be opened (or none was given),
/// logging falls back to `/tmp/albius.log`, printing a warning rather than
/// failing the whole run.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Off)
        .level_for("albius", LevelFilter::Debug)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                {
                    let target = record.target();
                    target.find(':').map_or(target, |pos| &target[..pos])
                },
                message
            ))
        })
        .chain(io::stderr());

    let path = log_file.unwrap_or_else(|| Path::new("/tmp/albius.log"));
    match fern::log_file(path) {
        Ok(log) => dispatch = dispatch.chain(log),
        Err(why) => eprintln!("failed to create log file at {}: {}", path.display(), why),
    }

    dispatch.apply()
}
