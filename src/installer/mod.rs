//! The Recipe Interpreter (§4.5): sequences Setup, Mountpoints, Install, and
//! PostInstall against a staged root, wrapping every failure in a
//! `RecipeError` that names the phase, step, and verb.

mod deploy;
mod post_install;
mod state;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use albius_disk_types::{AlbiusError, Disk, LuksContainer};

use crate::errors::{Phase, RecipeError};
use crate::recipe::{PostStep, Recipe, RecipeMountpoint, SetupStep};
use state::StepContext;

pub use deploy::{DeploySource, OciSource, UnsquashfsSource};

/// Runs one recipe end to end. `target_root` is where the system is staged
/// (`/mnt/a` by default, per §4.4); `log_file` is passed through to
/// `crate::logging::init_logging` by the caller, not used here directly.
pub struct RecipeInterpreter {
    target_root: PathBuf,
    log_file: Option<PathBuf>,
}

impl Default for RecipeInterpreter {
    fn default() -> Self {
        RecipeInterpreter { target_root: PathBuf::from("/mnt/a"), log_file: None }
    }
}

impl RecipeInterpreter {
    pub fn new(target_root: PathBuf, log_file: Option<PathBuf>) -> Self {
        RecipeInterpreter { target_root, log_file }
    }

    pub fn target_root(&self) -> &PathBuf {
        &self.target_root
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Run the full pipeline: RunSetup, SetupMountpoints, Install,
    /// RunPostInstall, in that order, aborting at the first failure.
    pub fn run(&self, recipe: &Recipe) -> Result<(), RecipeError> {
        self.run_setup(&recipe.setup)?;
        self.setup_mountpoints(&recipe.mountpoints)?;
        self.install(recipe)?;
        self.run_post_install(&recipe.post_installation)?;
        Ok(())
    }

    fn run_setup(&self, steps: &[SetupStep]) -> Result<(), RecipeError> {
        let ctx = StepContext::new(Phase::Setup);
        let mut disks: HashMap<String, Disk> = HashMap::new();

        for (i, step) in steps.iter().enumerate() {
            ctx.apply(i, &step.operation, || {
                if !disks.contains_key(&step.disk) {
                    albius_external::block::wait_until_available(&step.disk)?;
                    let disk = albius_disks::locate_disk(&step.disk)?;
                    disks.insert(step.disk.clone(), disk);
                }
                let disk = disks.get_mut(&step.disk).expect("just inserted above");
                albius_disks::apply_setup_verb(disk, &step.operation, &step.params)
            })?;
        }

        Ok(())
    }

    fn setup_mountpoints(&self, mountpoints: &[RecipeMountpoint]) -> Result<(), RecipeError> {
        let ctx = StepContext::new(Phase::Mount);
        let converted: Vec<albius_disk_types::Mountpoint> = mountpoints.iter().map(Into::into).collect();
        ctx.apply(0, "mount-all", || albius_disks::mount_all(&converted))
    }

    fn install(&self, recipe: &Recipe) -> Result<(), RecipeError> {
        let ctx = StepContext::new(Phase::Install);
        ctx.apply(0, &recipe.installation.method, || self.install_inner(recipe))
    }

    fn install_inner(&self, recipe: &Recipe) -> Result<(), AlbiusError> {
        let source: Box<dyn DeploySource> = match recipe.installation.method.as_str() {
            "unsquashfs" => Box::new(UnsquashfsSource { source: PathBuf::from(&recipe.installation.source) }),
            "oci" => Box::new(OciSource {
                image_ref: recipe.installation.source.clone(),
                storage: self.target_root.join("var"),
                verbose: false,
            }),
            other => return Err(AlbiusError::InvalidArgument { why: format!("unknown installation method `{}`", other) }),
        };
        source.deploy(&self.target_root)?;

        let (fstab_entries, luks_uuids) = self.collect_table_entries(recipe)?;

        if !luks_uuids.is_empty() {
            fs::write(self.target_root.join("etc/crypttab"), albius_fstab_generate::generate_crypttab(&luks_uuids))?;
        }
        fs::write(self.target_root.join("etc/fstab"), albius_fstab_generate::generate_fstab(&fstab_entries))?;

        let mounts = albius_chroot::InitramfsMounts::new(&self.target_root.to_string_lossy())?;
        mounts.update_initramfs(&recipe.installation.initramfs_pre, &recipe.installation.initramfs_post)?;
        mounts.close()?;

        Ok(())
    }

    /// Resolve each Mountpoint's UUID and inner filesystem kind, opening the
    /// LUKS mapper beforehand if needed (the mount is already in place from
    /// `setup_mountpoints`; this only reads identifying information).
    fn collect_table_entries(
        &self,
        recipe: &Recipe,
    ) -> Result<(Vec<albius_fstab_generate::BlockInfo>, Vec<String>), AlbiusError> {
        let mut entries = Vec::with_capacity(recipe.mountpoints.len());
        let mut luks_uuids = Vec::new();

        for mp in &recipe.mountpoints {
            let is_luks = albius_external::luks::is_luks(&mp.partition)?;

            let (uuid, fs_source) = if is_luks {
                let uuid = albius_external::block::get_uuid(&mp.partition)?;
                (uuid.clone(), LuksContainer::mapper_path(&uuid))
            } else {
                let uuid = albius_external::block::get_uuid(&mp.partition)?;
                (uuid, mp.partition.clone())
            };

            let fs_kind = albius_external::block::get_filesystem(&fs_source)?
                .map(|fs| fs.to_string())
                .unwrap_or_default();

            if is_luks {
                luks_uuids.push(uuid.clone());
            }

            entries.push(albius_fstab_generate::BlockInfo::new(uuid, is_luks, mp.target.clone(), fs_kind));
        }

        Ok((entries, luks_uuids))
    }

    fn run_post_install(&self, steps: &[PostStep]) -> Result<(), RecipeError> {
        let ctx = StepContext::new(Phase::PostInstall);
        for (i, step) in steps.iter().enumerate() {
            ctx.apply(i, &step.operation, || {
                post_install::dispatch(&self.target_root, step.chroot, &step.operation, &step.params)
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_root_is_mnt_a() {
        let interpreter = RecipeInterpreter::default();
        assert_eq!(interpreter.target_root(), &PathBuf::from("/mnt/a"));
    }

    #[test]
    fn new_overrides_target_root_and_log_file() {
        let interpreter = RecipeInterpreter::new(PathBuf::from("/mnt/custom"), Some(PathBuf::from("/var/log/albius.log")));
        assert_eq!(interpreter.target_root(), &PathBuf::from("/mnt/custom"));
        assert_eq!(interpreter.log_file(), Some(&PathBuf::from("/var/log/albius.log")));
    }
}
