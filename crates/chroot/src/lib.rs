//! Bind-mount management for the one chrooted operation that needs real
//! kernel mounts rather than a bare `chroot`: updating the initramfs, which
//! expects a live `/dev`, `/dev/pts`, `/proc`, and `/sys` inside the target.

#[macro_use]
extern crate log;

use albius_disk_types::AlbiusError;
use albius_external::run;

const BIND_PATHS: &[&str] = &["dev", "dev/pts", "proc", "sys"];

/// Bind-mounts `/dev`, `/dev/pts`, `/proc`, and `/sys` into `root` on
/// construction; unmounts them (lazily) on drop or explicit `close`.
pub struct InitramfsMounts {
    root: String,
    mounted: Vec<String>,
}

impl InitramfsMounts {
    pub fn new(root: &str) -> Result<Self, AlbiusError> {
        let mut mounted = Vec::with_capacity(BIND_PATHS.len());
        for relative in BIND_PATHS {
            let target = format!("{}/{}", root, relative);
            if let Err(why) = run(&format!("mount --bind /{} {}", relative, target), &[]) {
                for done in mounted.iter().rev() {
                    let _ = run(&format!("umount -l {}", done), &[]);
                }
                return Err(why);
            }
            mounted.push(target);
        }
        Ok(InitramfsMounts { root: root.to_owned(), mounted })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Update the initramfs inside the chroot, running the given pre/post
    /// shell hooks around it (§15's `UpdateInitramfs` sequence).
    pub fn update_initramfs(&self, pre_hooks: &[String], post_hooks: &[String]) -> Result<(), AlbiusError> {
        for hook in pre_hooks {
            albius_external::run_in_chroot(&self.root, hook, &[])?;
        }
        albius_external::run_in_chroot(&self.root, "update-initramfs -u -k all", &[])?;
        for hook in post_hooks {
            albius_external::run_in_chroot(&self.root, hook, &[])?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<(), AlbiusError> {
        self.unmount_all()
    }

    fn unmount_all(&mut self) -> Result<(), AlbiusError> {
        while let Some(target) = self.mounted.pop() {
            run(&format!("umount {}", target), &[])?;
        }
        Ok(())
    }
}

impl Drop for InitramfsMounts {
    fn drop(&mut self) {
        for target in self.mounted.drain(..).rev() {
            if let Err(why) = run(&format!("umount -l {}", target), &[]) {
                warn!("failed to unmount {}: {}", target, why);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_path_list_matches_initramfs_requirements() {
        assert_eq!(BIND_PATHS, &["dev", "dev/pts", "proc", "sys"]);
    }
}
