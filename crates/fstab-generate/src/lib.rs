//! The Table Emitter: fstab and crypttab generation as pure functions of
//! the staged mountpoints.

mod crypttab;
mod fstab;

pub use crate::crypttab::{crypttab_row, generate_crypttab};
pub use crate::fstab::{generate_fstab, BlockInfo, FSTAB_HEADER};
