//! The deploy-source interface (§6): how the base system gets onto the
//! staged root. `unsquashfs` extracts a squashfs/tar archive directly;
//! `oci` pulls a container image and rsyncs its top layer in, the way
//! the original's `OCISetup` does, minus any OCI client library — every
//! step is a shelled-out `podman`/`rsync`/`mount` call (§15).

use std::fs;
use std::path::{Path, PathBuf};

use albius_disk_types::AlbiusError;
use albius_external::{output, run};

pub trait DeploySource {
    fn deploy(&self, target_root: &Path) -> Result<(), AlbiusError>;
}

/// Extracts a squashfs image (or tarball) directly into `target_root`.
pub struct UnsquashfsSource {
    pub source: PathBuf,
}

impl DeploySource for UnsquashfsSource {
    fn deploy(&self, target_root: &Path) -> Result<(), AlbiusError> {
        albius_squashfs::extract(&self.source, target_root)
    }
}

/// Pulls an OCI image and copies its contents into `target_root`.
///
/// `storage` is the podman storage root; a `tmp` directory under it is
/// bind-mounted over `/var/tmp` for the duration of the pull, since the
/// live ISO's `/var/tmp` is often tmpfs-backed and too small to hold a
/// full image layer.
pub struct OciSource {
    pub image_ref: String,
    pub storage: PathBuf,
    pub verbose: bool,
}

impl DeploySource for OciSource {
    fn deploy(&self, target_root: &Path) -> Result<(), AlbiusError> {
        let storage_tmp = self.storage.join("tmp");
        fs::create_dir_all(&storage_tmp)?;
        run(&format!("mount --bind {} /var/tmp", storage_tmp.display()), &[])?;

        let pull_result = self.pull_and_sync(target_root);

        let _ = run("umount -l /var/tmp", &[]);
        for entry in fs::read_dir(&storage_tmp)?.flatten() {
            let _ = fs::remove_dir_all(entry.path());
            let _ = fs::remove_file(entry.path());
        }

        pull_result
    }
}

impl OciSource {
    fn pull_and_sync(&self, target_root: &Path) -> Result<(), AlbiusError> {
        let storage_flag = format!("--root {}", self.storage.join("storage").display());

        let mut last_error = None;
        for attempt in 0..4 {
            match run(&format!("podman {} pull {}", storage_flag, self.image_ref), &[]) {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(why) => {
                    warn!("OCI pull attempt {} failed: {}", attempt + 1, why);
                    last_error = Some(why);
                }
            }
        }
        if let Some(why) = last_error {
            return Err(why);
        }

        let mount_point =
            output(&format!("podman {} image mount {}", storage_flag, self.image_ref), &[])?;
        let mount_point = mount_point.trim();

        let verbose_flag = if self.verbose { "v" } else { "" };
        let sync_result = run(
            &format!(
                "rsync -a{}xHAX --numeric-ids {}/ {}/",
                verbose_flag,
                mount_point,
                target_root.display()
            ),
            &[],
        );

        let digest =
            output(&format!("podman {} image inspect {} --format '{{{{.Digest}}}}'", storage_flag, self.image_ref), &[]);

        run(&format!("podman {} image umount {}", storage_flag, self.image_ref), &[])?;

        sync_result?;

        if let Ok(digest) = digest {
            fs::write(target_root.join(".oci_digest"), digest.trim())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_root_flag_points_at_podman_storage_subdir() {
        let source = OciSource { image_ref: "docker.io/library/debian".into(), storage: PathBuf::from("/mnt/a/var"), verbose: false };
        let flag = format!("--root {}", source.storage.join("storage").display());
        assert_eq!(flag, "--root /mnt/a/var/storage");
    }
}
