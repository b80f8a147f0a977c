use std::collections::HashMap;

use albius_disk_types::{AlbiusError, Disk, LuksContainer, Mountpoint};
use albius_external::{block, luks, run};

use crate::locate::locate_disk;

/// Mount every source in `mountpoints` under `/mnt/a` (or `/mnt/b` for a
/// second `/` target, the dual-root install pattern), in an order that
/// guarantees no parent mount shadows a child.
///
/// Non-root mountpoints are always staged under the primary root
/// (`/mnt/a`'s tree); only a repeated `/` target switches to the secondary
/// root. The source format makes no other provision for routing a
/// mountpoint to the secondary tree, and every worked scenario in this
/// system's test suite pairs a single root with its children.
pub fn mount_all(mountpoints: &[Mountpoint]) -> Result<(), AlbiusError> {
    let mut ordered: Vec<&Mountpoint> = mountpoints.iter().collect();
    ordered.sort_by_key(|m| m.depth());

    let mut disks: HashMap<String, Disk> = HashMap::new();
    let mut roots_seen = 0u32;

    for mp in ordered {
        let prefix = if mp.target == "/" {
            roots_seen += 1;
            if roots_seen == 1 { "/mnt/a" } else { "/mnt/b" }
        } else {
            "/mnt/a"
        };
        let target = if mp.target == "/" { prefix.to_owned() } else { format!("{}{}", prefix, mp.target) };

        let source = resolve_source(&mp.source, &mut disks)?;
        mount_source(&source, &target)?;
    }

    Ok(())
}

/// An LVM LV path is `/dev/<vg>/<lv>` where neither component starts with a
/// digit (distinguishing it from a two-level device node like
/// `/dev/disk/...`).
fn is_lvm_lv_path(source: &str) -> bool {
    let rest = match source.strip_prefix("/dev/") {
        Some(rest) => rest,
        None => return false,
    };
    let parts: Vec<&str> = rest.split('/').collect();
    parts.len() == 2
        && !parts[0].is_empty()
        && !parts[1].is_empty()
        && !parts[0].starts_with(|c: char| c.is_ascii_digit())
        && !parts[1].starts_with(|c: char| c.is_ascii_digit())
}

fn resolve_source(source: &str, disks: &mut HashMap<String, Disk>) -> Result<String, AlbiusError> {
    if is_lvm_lv_path(source) {
        return Ok(source.to_owned());
    }

    let (disk_path, number) = Disk::split_partition_path(source)
        .ok_or_else(|| AlbiusError::Decode { what: "mountpoint source", why: source.to_owned() })?;

    if !disks.contains_key(&disk_path) {
        disks.insert(disk_path.clone(), locate_disk(&disk_path)?);
    }
    let disk = disks.get(&disk_path).expect("just inserted");

    let partition = disk
        .get_partition(number)
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {} on {}", number, disk_path) })?;

    Ok(partition.path.clone())
}

/// Mount `source` at `target`, opening its LUKS mapper first if it is a
/// LUKS-formatted device; idempotent against an already-correct mount.
fn mount_source(source: &str, target: &str) -> Result<(), AlbiusError> {
    if luks::is_luks(source)? {
        let uuid = block::get_uuid(source)?;
        let mapping = LuksContainer::mapper_name(&uuid);
        luks::luks_try_open(source, &mapping, "")?;
        mount_if_needed(&LuksContainer::mapper_path(&uuid), target)
    } else {
        mount_if_needed(source, target)
    }
}

fn mount_if_needed(source: &str, target: &str) -> Result<(), AlbiusError> {
    if block::mountpoints(source)?.iter().any(|m| m == target) {
        return Ok(());
    }
    run(&format!("mount -m {} {}", source, target), &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lvm_lv_path_is_recognized() {
        assert!(is_lvm_lv_path("/dev/vg0/root"));
        assert!(!is_lvm_lv_path("/dev/sda2"));
        assert!(!is_lvm_lv_path("/dev/0vg/root"));
    }

    #[test]
    fn ordering_places_root_before_children() {
        let mps = vec![
            Mountpoint::new("/dev/sda1", "/boot/efi"),
            Mountpoint::new("/dev/sda2", "/"),
            Mountpoint::new("/dev/sda3", "/home"),
        ];
        let mut ordered: Vec<&Mountpoint> = mps.iter().collect();
        ordered.sort_by_key(|m| m.depth());
        assert_eq!(ordered[0].target, "/");
    }

    #[test]
    fn dual_root_targets_are_both_depth_zero() {
        let mps = vec![Mountpoint::new("/dev/sda2", "/"), Mountpoint::new("/dev/sda3", "/")];
        assert_eq!(mps[0].depth(), mps[1].depth());
    }
}
