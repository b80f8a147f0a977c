//! Storage orchestration engine for recipe-driven OS installs: given a
//! declarative recipe (§6), partitions and formats disks, assembles LVM and
//! LUKS layers, stages mountpoints, deploys a base system, and runs
//! post-install configuration.

#![allow(unknown_lints)]

#[macro_use]
extern crate log;

pub extern crate albius_bootloader as bootloader;
pub extern crate albius_chroot as chroot;
pub extern crate albius_disk_types as disk_types;
pub extern crate albius_disks as disks;
pub extern crate albius_external as external;
pub extern crate albius_fstab_generate as fstab_generate;
pub extern crate albius_squashfs as squashfs;
pub extern crate albius_timezones as timezones;
pub extern crate albius_utils as utils;
pub extern crate hostname_validator as hostname;

pub use disk_types::{AlbiusError, Disk, DiskLabel, FileSystem, LogicalVolume, LuksContainer, Mountpoint, Partition, PhysicalVolume, VolumeGroup};

mod errors;
mod installer;
mod logging;
mod recipe;

pub use crate::errors::{Phase, RecipeError};
pub use crate::installer::{DeploySource, OciSource, RecipeInterpreter, UnsquashfsSource};
pub use crate::logging::init_logging;
pub use crate::recipe::{Installation, PostStep, Recipe, RecipeMountpoint, SetupStep};
