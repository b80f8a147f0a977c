//! Entity types shared across the workspace: disks, partitions, LUKS
//! containers, LVM objects, mountpoints, and the common error taxonomy.

#[macro_use]
extern crate failure_derive;

mod disk;
mod error;
mod fs;
mod luks;
mod lvm;
mod mountpoint;

pub use crate::disk::{Disk, DiskLabel, Partition};
pub use crate::error::{AlbiusError, Result};
pub use crate::fs::FileSystem;
pub use crate::luks::LuksContainer;
pub use crate::lvm::{LogicalVolume, LvAttributes, PhysicalVolume, PvAttributes, VgAttributes, VolumeGroup};
pub use crate::mountpoint::Mountpoint;
