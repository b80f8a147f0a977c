use std::fmt;
use std::str::FromStr;

use crate::AlbiusError;

/// A filesystem kind, as named in a recipe or reported by `lsblk`/`parted`.
///
/// Kinds the core does not know how to format (`hfs`, `hfs+`, `udf`) are
/// still representable here — rejection happens at the point of use
/// (`format`/`luks-format` dispatch), not at parse time, so that a recipe
/// can still reference them in read-only contexts such as mount planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileSystem {
    Btrfs,
    Ext2,
    Ext3,
    Ext4,
    Fat16,
    Fat32,
    Hfs,
    HfsPlus,
    LinuxSwap,
    Ntfs,
    ReiserFs,
    Udf,
    Xfs,
    /// Anything else: passed through verbatim to `mkfs.<kind>`.
    Other(String),
}

impl FileSystem {
    /// True for the three kinds the core refuses to format.
    pub fn is_unsupported_for_format(&self) -> bool {
        matches!(self, FileSystem::Hfs | FileSystem::HfsPlus | FileSystem::Udf)
    }

    /// The `mkfs.<kind>` / `mkswap` command line for this filesystem, given
    /// a target block device path. Returns an error for the unsupported
    /// trio rather than constructing a doomed command line.
    pub fn mkfs_command(&self, path: &str) -> Result<String, AlbiusError> {
        let cmd = match self {
            FileSystem::Fat16 => format!("mkfs.fat -I -F 16 {}", path),
            FileSystem::Fat32 => format!("mkfs.fat -I -F 32 {}", path),
            FileSystem::Ext2 => format!("mkfs.ext2 -F {}", path),
            FileSystem::Ext3 => format!("mkfs.ext3 -F {}", path),
            FileSystem::Ext4 => format!("mkfs.ext4 -F {}", path),
            FileSystem::LinuxSwap => format!("mkswap -f {}", path),
            FileSystem::Hfs | FileSystem::HfsPlus | FileSystem::Udf => {
                return Err(AlbiusError::Unsupported {
                    kind: self.as_str().to_owned(),
                    context: "format",
                });
            }
            FileSystem::Btrfs | FileSystem::Ntfs | FileSystem::ReiserFs | FileSystem::Xfs => {
                format!("mkfs.{} -f {}", self.as_str(), path)
            }
            FileSystem::Other(kind) => format!("mkfs.{} -f {}", kind, path),
        };
        Ok(cmd)
    }

    /// The label-setting command for this filesystem, or `None` if labels
    /// cannot be changed post-creation (`linux-swap`).
    pub fn label_command(&self, path: &str, label: &str) -> Result<Option<String>, AlbiusError> {
        let cmd = match self {
            FileSystem::Fat16 | FileSystem::Fat32 => format!("fatlabel {} {}", path, label),
            FileSystem::Ext2 | FileSystem::Ext3 | FileSystem::Ext4 => {
                format!("e2label {} {}", path, label)
            }
            FileSystem::Btrfs => format!("btrfs filesystem label {} {}", path, label),
            FileSystem::ReiserFs => format!("reiserfstune -l {} {}", label, path),
            FileSystem::Xfs => format!("xfs_admin -L {} {}", label, path),
            FileSystem::Ntfs => format!("ntfslabel {} {}", path, label),
            FileSystem::LinuxSwap => return Ok(None),
            FileSystem::Hfs | FileSystem::HfsPlus | FileSystem::Udf | FileSystem::Other(_) => {
                return Err(AlbiusError::Unsupported {
                    kind: self.as_str().to_owned(),
                    context: "setlabel",
                });
            }
        };
        Ok(Some(cmd))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileSystem::Btrfs => "btrfs",
            FileSystem::Ext2 => "ext2",
            FileSystem::Ext3 => "ext3",
            FileSystem::Ext4 => "ext4",
            FileSystem::Fat16 => "fat16",
            FileSystem::Fat32 => "fat32",
            FileSystem::Hfs => "hfs",
            FileSystem::HfsPlus => "hfs+",
            FileSystem::LinuxSwap => "linux-swap",
            FileSystem::Ntfs => "ntfs",
            FileSystem::ReiserFs => "reiserfs",
            FileSystem::Udf => "udf",
            FileSystem::Xfs => "xfs",
            FileSystem::Other(kind) => kind.as_str(),
        }
    }
}

impl FromStr for FileSystem {
    type Err = std::convert::Infallible;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        Ok(match kind {
            "btrfs" => FileSystem::Btrfs,
            "ext2" => FileSystem::Ext2,
            "ext3" => FileSystem::Ext3,
            "ext4" => FileSystem::Ext4,
            "fat16" => FileSystem::Fat16,
            "fat32" => FileSystem::Fat32,
            "hfs" => FileSystem::Hfs,
            "hfs+" => FileSystem::HfsPlus,
            "linux-swap" => FileSystem::LinuxSwap,
            "ntfs" => FileSystem::Ntfs,
            "reiserfs" => FileSystem::ReiserFs,
            "udf" => FileSystem::Udf,
            "xfs" => FileSystem::Xfs,
            other => FileSystem::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_kinds() {
        for kind in &["btrfs", "ext4", "fat32", "linux-swap", "xfs"] {
            let fs: FileSystem = kind.parse().unwrap();
            assert_eq!(fs.as_str(), *kind);
        }
    }

    #[test]
    fn unknown_kind_is_passthrough() {
        let fs: FileSystem = "zfs".parse().unwrap();
        assert_eq!(fs, FileSystem::Other("zfs".to_owned()));
        assert_eq!(fs.mkfs_command("/dev/sda1").unwrap(), "mkfs.zfs -f /dev/sda1");
    }

    #[test]
    fn hfs_rejected_for_format_and_label() {
        let fs = FileSystem::Hfs;
        assert!(fs.mkfs_command("/dev/sda1").is_err());
        assert!(fs.label_command("/dev/sda1", "x").is_err());
    }

    #[test]
    fn swap_label_is_noop() {
        let fs = FileSystem::LinuxSwap;
        assert_eq!(fs.label_command("/dev/sda1", "x").unwrap(), None);
    }

    #[test]
    fn fat_and_ext_mkfs_commands() {
        assert_eq!(
            FileSystem::Fat32.mkfs_command("/dev/sda1").unwrap(),
            "mkfs.fat -I -F 32 /dev/sda1"
        );
        assert_eq!(
            FileSystem::Ext4.mkfs_command("/dev/sda2").unwrap(),
            "mkfs.ext4 -F /dev/sda2"
        );
    }
}
