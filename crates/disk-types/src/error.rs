use std::io;

/// The error taxonomy shared by every crate in the workspace.
///
/// Variants correspond one-to-one with the kinds named in the storage core's
/// error handling design: a failure always belongs to exactly one of these
/// buckets, never a bespoke ad-hoc string.
#[rustfmt::skip]
#[derive(Debug, Fail)]
pub enum AlbiusError {
    #[fail(display = "`{}` failed: {}", cmd, stderr)]
    ToolFailed { cmd: String, stderr: String },

    #[fail(display = "unsupported {}: {}", context, kind)]
    Unsupported { kind: String, context: &'static str },

    #[fail(display = "failed to decode {}: {}", what, why)]
    Decode { what: &'static str, why: String },

    #[fail(display = "{} not found", what)]
    NotFound { what: String },

    #[fail(display = "timed out waiting for {}", what)]
    Timeout { what: String },

    #[fail(display = "invalid argument: {}", why)]
    InvalidArgument { why: String },

    #[fail(display = "invalid state: {}", why)]
    BadState { why: String },

    #[fail(display = "{}", _0)]
    Io(#[fail(cause)] io::Error),
}

impl From<io::Error> for AlbiusError {
    fn from(why: io::Error) -> Self { AlbiusError::Io(why) }
}

pub type Result<T> = std::result::Result<T, AlbiusError>;
