//! Extracts a squashfs (or tar) image into a deployment target directory.

#[macro_use]
extern crate log;

use std::path::Path;

use albius_disk_types::AlbiusError;
use albius_external::{run, shell_quote};

enum ExtractFormat {
    Tar,
    Squashfs,
}

/// Extracts `archive` into `directory`, overwriting files already present.
///
/// Dispatches on the archive's extension: a `.squashfs` file is unpacked
/// with `unsquashfs -f`, anything else is treated as a tarball.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(archive: P, directory: Q) -> Result<(), AlbiusError> {
    let archive = archive.as_ref();
    let directory = directory.as_ref();

    let format = if archive.extension().map_or(false, |ext| ext == "squashfs") {
        ExtractFormat::Squashfs
    } else {
        ExtractFormat::Tar
    };

    let archive = shell_quote(&archive.to_string_lossy());
    let directory = shell_quote(&directory.to_string_lossy());

    let cmd = match format {
        ExtractFormat::Squashfs => format!("unsquashfs -f -d {} {}", directory, archive),
        ExtractFormat::Tar => format!("tar --overwrite -xf {} -C {}", archive, directory),
    };

    debug!("extracting image: {}", cmd);
    run(&cmd, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squashfs_archive_uses_unsquashfs() {
        let archive = Path::new("/mnt/iso/filesystem.squashfs");
        let format = if archive.extension().map_or(false, |ext| ext == "squashfs") {
            "unsquashfs"
        } else {
            "tar"
        };
        assert_eq!(format, "unsquashfs");
    }

    #[test]
    fn other_archive_falls_back_to_tar() {
        let archive = Path::new("/mnt/iso/rootfs.tar.gz");
        let format = if archive.extension().map_or(false, |ext| ext == "squashfs") {
            "unsquashfs"
        } else {
            "tar"
        };
        assert_eq!(format, "tar");
    }
}
