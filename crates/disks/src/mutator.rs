use serde_json::Value;

use albius_disk_types::{AlbiusError, Disk, LuksContainer};
use albius_external::{block, luks, lvm, run};

use crate::args::{as_int, get, get_int, get_str, get_str_opt};
use crate::locate::refresh;

/// Apply one Storage Mutator setup verb against `disk`, refreshing it
/// in-place afterward if the verb altered the partition table. Unknown
/// verbs are a hard error (§4.5: "closed set").
pub fn dispatch(disk: &mut Disk, verb: &str, params: &[Value]) -> Result<(), AlbiusError> {
    match verb {
        "label" => label(disk, params),
        "mkpart" => mkpart(disk, params),
        "rm" => rm(disk, params),
        "resizepart" => resizepart(disk, params),
        "namepart" => namepart(disk, params),
        "setlabel" => setlabel(disk, params),
        "setflag" => setflag(disk, params),
        "format" => format_partition(disk, params),
        "luks-format" => luks_format_partition(disk, params),
        "pvcreate" => pvcreate(params),
        "pvresize" => pvresize(params),
        "pvremove" => pvremove(params),
        "vgcreate" => vgcreate(params),
        "vgrename" => vgrename(params),
        "vgextend" => vgextend(params),
        "vgreduce" => vgreduce(params),
        "vgremove" => vgremove(params),
        "lvcreate" => lvcreate(params),
        "lvrename" => lvrename(params),
        "lvremove" => lvremove(params),
        "make-thin-pool" => make_thin_pool(params),
        "lvcreate-thin" => lvcreate_thin(params),
        "lvm-format" => lvm_format(params),
        "lvm-luks-format" => lvm_luks_format(params),
        other => Err(AlbiusError::InvalidArgument { why: format!("unknown setup verb `{}`", other) }),
    }
}

fn label(disk: &mut Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let label = get_str(params, 0)?;

    for partition in &disk.partitions {
        if block::is_mounted(&partition.path)? {
            run(&format!("umount {}", partition.path), &[])?;
        }
    }

    for vg in lvm::vgs(&[])? {
        let owns_this_disk = vg.physical_volumes.iter().any(|pv| pv.path.contains(&disk.path));
        if owns_this_disk {
            lvm::vgremove(&vg.name, &[])?;
            for pv in &vg.physical_volumes {
                lvm::pvremove(&pv.path, &[])?;
            }
        }
    }

    run(&format!("parted -s {} mklabel {}", disk.path, label), &[])?;
    refresh(disk)
}

fn mkpart(disk: &mut Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let name = get_str_opt(params, 0).unwrap_or_default().to_owned();
    let fs_kind = get_str(params, 1)?.to_owned();
    let start = get_int(params, 2)?;
    let end = get_int(params, 3)?;
    let password = get_str_opt(params, 4).unwrap_or_default().to_owned();

    let end_arg = if end == -1 { "100%".to_owned() } else { format!("{}", end) };
    let primary = matches!(disk.label, albius_disk_types::DiskLabel::Mbr).then(|| "primary ").unwrap_or("");

    let (luks_inner_kind, parted_fs_kind) = match fs_kind.strip_prefix("luks-") {
        Some(inner) => (Some(inner.to_owned()), String::new()),
        None => (None, fs_kind.clone()),
    };

    let cached_count = disk.partitions.len();
    run(
        &format!("parted -s {} mkpart {}{} {} {}", disk.path, primary, parted_fs_kind, start, end_arg),
        &[],
    )?;

    block::wait_for_new_partition(&disk.path, cached_count)?;
    refresh(disk)?;

    let number = disk
        .partitions
        .iter()
        .map(|p| p.number)
        .max()
        .ok_or_else(|| AlbiusError::NotFound { what: "newly created partition".to_owned() })?;
    let part_path = disk
        .get_partition(number)
        .map(|p| p.path.clone())
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {} after mkpart", number) })?;

    if let Some(inner_kind) = luks_inner_kind {
        let inner_fs: albius_disk_types::FileSystem = inner_kind.parse().expect("infallible");
        luks::luks_format(&part_path, &password)?;
        block::wait_until_available(&part_path)?;
        let uuid = wait_for_uuid(&part_path)?;
        let mapping = LuksContainer::mapper_name(&uuid);
        luks::luks_open(&part_path, &mapping, &password)?;
        let mapper_path = LuksContainer::mapper_path(&uuid);
        block::mkfs(&mapper_path, &inner_fs, &[])?;
        block::set_label(&mapper_path, &inner_fs, &name, &[])?;
    } else if !parted_fs_kind.is_empty() {
        // parted's mkpart already stamped a filesystem signature of this
        // kind; mkfs is still run explicitly rather than relying on that
        // stamp, which is partial and tool-version-dependent (§9).
        let fs: albius_disk_types::FileSystem = parted_fs_kind.parse().expect("infallible");
        block::wait_until_available(&part_path)?;
        block::mkfs(&part_path, &fs, &[])?;
        block::set_label(&part_path, &fs, &name, &[])?;
    }

    if !name.is_empty() {
        run(&format!("parted -s {} name {} {}", disk.path, number, name), &[])?;
    }

    Ok(())
}

fn wait_for_uuid(path: &str) -> Result<String, AlbiusError> {
    for _ in 0..100 {
        let uuid = block::get_uuid(path)?;
        if !uuid.is_empty() {
            return Ok(uuid);
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    Err(AlbiusError::Timeout { what: format!("UUID on {}", path) })
}

fn rm(disk: &mut Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)? as u32;
    disk.get_partition(number)
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {}", number) })?;
    run(&format!("parted -s {} rm {}", disk.path, number), &[])?;
    refresh(disk)
}

fn resizepart(disk: &mut Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)?;
    let new_end = get_int(params, 1)?;
    run(&format!("parted -s {} unit MiB resizepart {} {}", disk.path, number, new_end), &[])?;
    refresh(disk)
}

fn namepart(disk: &Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)?;
    let new_name = get_str(params, 1)?;
    run(&format!("parted -s {} name {} {}", disk.path, number, new_name), &[])
}

fn setlabel(disk: &Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)? as u32;
    let label = get_str(params, 1)?;
    let partition = disk
        .get_partition(number)
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {}", number) })?;
    let fs = partition
        .filesystem
        .clone()
        .ok_or_else(|| AlbiusError::BadState { why: format!("partition {} has no filesystem", number) })?;
    block::set_label(&partition.path, &fs, label, &[])
}

fn setflag(disk: &Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)?;
    let flag = get_str(params, 1)?;
    let state = get_str(params, 2)?;
    if state != "on" && state != "off" {
        return Err(AlbiusError::InvalidArgument { why: format!("flag state must be on|off, got `{}`", state) });
    }
    run(&format!("parted -s {} set {} {} {}", disk.path, number, flag, state), &[])
}

fn format_partition(disk: &Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)? as u32;
    let kind: albius_disk_types::FileSystem = get_str(params, 1)?.parse().expect("infallible");
    let label = get_str_opt(params, 2);

    let partition = disk
        .get_partition(number)
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {}", number) })?;

    block::mkfs(&partition.path, &kind, &[])?;
    if let Some(label) = label {
        block::set_label(&partition.path, &kind, label, &[])?;
    }
    Ok(())
}

fn luks_format_partition(disk: &Disk, params: &[Value]) -> Result<(), AlbiusError> {
    let number = get_int(params, 0)? as u32;
    let inner_kind: albius_disk_types::FileSystem = get_str(params, 1)?.parse().expect("infallible");
    let password = get_str(params, 2)?;
    let label = get_str_opt(params, 3);

    let partition = disk
        .get_partition(number)
        .ok_or_else(|| AlbiusError::NotFound { what: format!("partition {}", number) })?;

    luks::luks_format(&partition.path, password)?;
    block::wait_until_available(&partition.path)?;
    let uuid = wait_for_uuid(&partition.path)?;
    let mapping = LuksContainer::mapper_name(&uuid);
    luks::luks_open(&partition.path, &mapping, password)?;
    let mapper_path = LuksContainer::mapper_path(&uuid);
    block::mkfs(&mapper_path, &inner_kind, &[])?;
    if let Some(label) = label {
        block::set_label(&mapper_path, &inner_kind, label, &[])?;
    }
    Ok(())
}

fn pvcreate(params: &[Value]) -> Result<(), AlbiusError> {
    let path = get_str(params, 0)?;
    block::wait_until_available(path)?;
    lvm::pvcreate(path, &[])?;
    lvm::pvscan_cache(path, &[])
}

fn pvresize(params: &[Value]) -> Result<(), AlbiusError> {
    let path = get_str(params, 0)?;
    let size = params.get(1).map(as_int).transpose()?.map(|n| n as u64);
    lvm::pvresize(path, size, &[])
}

fn pvremove(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::pvremove(get_str(params, 0)?, &[])
}

fn pv_paths(params: &[Value], from: usize) -> Result<Vec<String>, AlbiusError> {
    if params.len() <= from {
        return Err(AlbiusError::InvalidArgument { why: "at least one physical volume path is required".to_owned() });
    }
    params[from..].iter().map(|v| v.as_str().map(str::to_owned).ok_or_else(|| AlbiusError::Decode {
        what: "physical volume path",
        why: format!("expected a string, got {}", v),
    })).collect()
}

fn vgcreate(params: &[Value]) -> Result<(), AlbiusError> {
    let name = get_str(params, 0)?;
    let pvs = pv_paths(params, 1)?;
    for pv in &pvs {
        block::wait_until_available(pv)?;
    }
    lvm::vgcreate(name, &pvs, &[])
}

fn vgrename(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::vgrename(get_str(params, 0)?, get_str(params, 1)?, &[])
}

fn vgextend(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::vgextend(get_str(params, 0)?, &pv_paths(params, 1)?, &[])
}

fn vgreduce(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::vgreduce(get_str(params, 0)?, &pv_paths(params, 1)?, &[])
}

fn vgremove(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::vgremove(get_str(params, 0)?, &[])
}

fn lvcreate(params: &[Value]) -> Result<(), AlbiusError> {
    let name = get_str(params, 0)?;
    let vg = get_str(params, 1)?;
    let lv_type = get_str(params, 2)?;
    let size_value = get(params, 3)?;
    let size = match size_value {
        Value::Number(n) => lvm::LvSize::Mib(n.as_u64().ok_or_else(|| AlbiusError::Decode {
            what: "lv size",
            why: format!("{} is not a non-negative integer", n),
        })?),
        Value::String(s) => lvm::LvSize::Expr(s.clone()),
        other => return Err(AlbiusError::Decode { what: "lv size", why: format!("unexpected value {}", other) }),
    };
    lvm::lvcreate(name, vg, lv_type, &size, &[])
}

fn lvrename(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::lvrename(get_str(params, 2)?, get_str(params, 0)?, get_str(params, 1)?, &[])
}

fn lvremove(params: &[Value]) -> Result<(), AlbiusError> {
    let spec = get_str(params, 0)?;
    let (vg, name) = split_vg_lv(spec)?;
    lvm::lvremove(vg, name, &[])
}

fn make_thin_pool(params: &[Value]) -> Result<(), AlbiusError> {
    lvm::make_thin_pool(get_str(params, 0)?, get_str(params, 1)?, &[])
}

fn lvcreate_thin(params: &[Value]) -> Result<(), AlbiusError> {
    let name = get_str(params, 0)?;
    let vg = get_str(params, 1)?;
    let size = get_int(params, 2)? as u64;
    let thinpool = get_str(params, 3)?;
    lvm::lvcreate_thin(name, vg, size, thinpool, &[])
}

fn lvm_format(params: &[Value]) -> Result<(), AlbiusError> {
    let (vg, name) = split_vg_lv(get_str(params, 0)?)?;
    let kind: albius_disk_types::FileSystem = get_str(params, 1)?.parse().expect("infallible");
    let label = get_str_opt(params, 2);
    let path = format!("/dev/{}/{}", vg, name);
    block::mkfs(&path, &kind, &[])?;
    if let Some(label) = label {
        block::set_label(&path, &kind, label, &[])?;
    }
    Ok(())
}

fn lvm_luks_format(params: &[Value]) -> Result<(), AlbiusError> {
    let (vg, name) = split_vg_lv(get_str(params, 0)?)?;
    let inner_kind: albius_disk_types::FileSystem = get_str(params, 1)?.parse().expect("infallible");
    let password = get_str(params, 2)?;
    let label = get_str_opt(params, 3);
    let path = format!("/dev/{}/{}", vg, name);

    luks::luks_format(&path, password)?;
    block::wait_until_available(&path)?;
    let uuid = wait_for_uuid(&path)?;
    let mapping = LuksContainer::mapper_name(&uuid);
    luks::luks_open(&path, &mapping, password)?;
    let mapper_path = LuksContainer::mapper_path(&uuid);
    block::mkfs(&mapper_path, &inner_kind, &[])?;
    if let Some(label) = label {
        block::set_label(&mapper_path, &inner_kind, label, &[])?;
    }
    Ok(())
}

fn split_vg_lv(spec: &str) -> Result<(&str, &str), AlbiusError> {
    spec.split_once('/').ok_or_else(|| AlbiusError::InvalidArgument {
        why: format!("expected `<vg>/<lv>`, got `{}`", spec),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_verb_is_invalid_argument() {
        let mut disk = sample_disk();
        let err = dispatch(&mut disk, "frobnicate", &[]).unwrap_err();
        assert!(matches!(err, AlbiusError::InvalidArgument { .. }));
    }

    #[test]
    fn setflag_rejects_unknown_state() {
        let disk = sample_disk();
        let params = vec![json!(1), json!("esp"), json!("maybe")];
        let err = setflag(&disk, &params).unwrap_err();
        assert!(matches!(err, AlbiusError::InvalidArgument { .. }));
    }

    #[test]
    fn split_vg_lv_parses_spec() {
        assert_eq!(split_vg_lv("vg0/root").unwrap(), ("vg0", "root"));
        assert!(split_vg_lv("vg0-root").is_err());
    }

    #[test]
    fn vgcreate_requires_at_least_one_pv() {
        let params = vec![json!("vg0")];
        assert!(pv_paths(&params, 1).is_err());
    }

    fn sample_disk() -> Disk {
        Disk {
            path: "/dev/sda".into(),
            size: "2048MiB".into(),
            model: String::new(),
            transport: String::new(),
            label: albius_disk_types::DiskLabel::Gpt,
            logical_sector_size: 512,
            physical_sector_size: 512,
            max_partitions: 128,
            partitions: vec![],
        }
    }
}
