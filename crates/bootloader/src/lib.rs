//! Detect whether a Linux system is in EFI or BIOS mode.
//!
//! ```rust,no_run
//! use albius_bootloader::Bootloader;
//!
//! match Bootloader::detect() {
//!     Bootloader::Efi => println!("System is in EFI mode"),
//!     Bootloader::Bios => println!("System is in BIOS mode")
//! }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Force the installation to perform either a BIOS or EFI installation,
/// overriding `/sys/firmware/efi` detection — used by the GRUB PostInstall
/// verb when the recipe names a target explicitly.
pub static FORCE_BOOTLOADER: AtomicUsize = AtomicUsize::new(0);

/// Bootloader type.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Bootloader {
    Bios,
    Efi,
}

impl Bootloader {
    /// Detects whether the system is running from EFI.
    pub fn detect() -> Bootloader {
        match FORCE_BOOTLOADER.load(Ordering::SeqCst) {
            1 => return Bootloader::Bios,
            2 => return Bootloader::Efi,
            _ => (),
        }

        if Path::new("/sys/firmware/efi").is_dir() {
            Bootloader::Efi
        } else {
            Bootloader::Bios
        }
    }

    /// The `grub-install` target argument for this bootloader kind.
    pub fn grub_install_target(self) -> &'static str {
        match self {
            Bootloader::Efi => "x86_64-efi",
            Bootloader::Bios => "i386-pc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_bios_overrides_detection() {
        FORCE_BOOTLOADER.store(1, Ordering::SeqCst);
        assert_eq!(Bootloader::detect(), Bootloader::Bios);
        FORCE_BOOTLOADER.store(0, Ordering::SeqCst);
    }

    #[test]
    fn grub_targets_match_kind() {
        assert_eq!(Bootloader::Efi.grub_install_target(), "x86_64-efi");
        assert_eq!(Bootloader::Bios.grub_install_target(), "i386-pc");
    }
}
