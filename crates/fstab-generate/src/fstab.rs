/// The fixed header `/etc/fstab` carries above its generated rows.
pub const FSTAB_HEADER: &str = "\
# /etc/fstab: static file system information.
#
# <file system>  <mount point>  <type>  <options>  <dump>  <pass>
";

/// One fstab-worthy mountpoint: a UUID, whether it's reached through a LUKS
/// mapper, its target, and its inner filesystem kind.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub uuid: String,
    pub is_luks: bool,
    pub target: String,
    pub fs_kind: String,
}

impl BlockInfo {
    pub fn new(uuid: impl Into<String>, is_luks: bool, target: impl Into<String>, fs_kind: impl Into<String>) -> Self {
        BlockInfo { uuid: uuid.into(), is_luks, target: target.into(), fs_kind: fs_kind.into() }
    }

    /// `UUID=<uuid>` for a plain mountpoint, `/dev/mapper/luks-<uuid>` for a
    /// LUKS-backed one.
    pub fn source(&self) -> String {
        if self.is_luks {
            format!("/dev/mapper/luks-{}", self.uuid)
        } else {
            format!("UUID={}", self.uuid)
        }
    }

    /// Mount options keyed by target, per the documented exceptions.
    pub fn options(&self) -> &'static str {
        match self.target.as_str() {
            "/boot/efi" => "umask=0077",
            "/boot" => "noatime,errors=remount-ro",
            _ => "defaults",
        }
    }

    pub fn write_entry(&self, fstab: &mut String) {
        fstab.push_str(&self.source());
        fstab.push_str("  ");
        fstab.push_str(&self.target);
        fstab.push_str("  ");
        fstab.push_str(&self.fs_kind);
        fstab.push_str("  ");
        fstab.push_str(self.options());
        fstab.push_str("  0  0\n");
    }
}

/// Render the complete `/etc/fstab` contents: header, then one row per
/// entry in the order given.
pub fn generate_fstab(entries: &[BlockInfo]) -> String {
    let mut fstab = String::from(FSTAB_HEADER);
    for entry in entries {
        entry.write_entry(&mut fstab);
    }
    fstab
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fstab_entries_for_scenario_a() {
        let entries = vec![
            BlockInfo::new("ROOT", false, "/", "ext4"),
            BlockInfo::new("EFI", false, "/boot/efi", "fat32"),
            BlockInfo::new("HOME", false, "/home", "ext4"),
        ];
        let fstab = generate_fstab(&entries);
        assert!(fstab.starts_with(FSTAB_HEADER));
        assert!(fstab.contains("UUID=ROOT  /  ext4  defaults  0  0\n"));
        assert!(fstab.contains("UUID=EFI  /boot/efi  fat32  umask=0077  0  0\n"));
        assert!(fstab.contains("UUID=HOME  /home  ext4  defaults  0  0\n"));
    }

    #[test]
    fn luks_entry_names_mapper_path() {
        let entry = BlockInfo::new("abcd-1234", true, "/", "ext4");
        assert_eq!(entry.source(), "/dev/mapper/luks-abcd-1234");
    }

    #[test]
    fn boot_gets_noatime_options() {
        let entry = BlockInfo::new("BOOT", false, "/boot", "ext4");
        assert_eq!(entry.options(), "noatime,errors=remount-ro");
    }

    #[test]
    fn generation_is_pure_and_repeatable() {
        let entries = vec![BlockInfo::new("ROOT", false, "/", "ext4")];
        assert_eq!(generate_fstab(&entries), generate_fstab(&entries));
    }
}
