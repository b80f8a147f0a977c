//! The Device Model (disk/partition queries and refresh), the Storage
//! Mutator (setup-verb dispatch), and the Mount Planner.

mod args;
mod locate;
mod mount;
mod mutator;

pub use crate::locate::{locate_disk, refresh};
pub use crate::mount::mount_all;
pub use crate::mutator::dispatch as apply_setup_verb;
