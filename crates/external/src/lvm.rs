use albius_disk_types::{AlbiusError, LogicalVolume, LvAttributes, PhysicalVolume, PvAttributes, VgAttributes, VolumeGroup};

use crate::{output, run, EnvOverride};

pub fn pvcreate(path: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("pvcreate -y {}", path), env)
}

pub fn pvresize(path: &str, size_mib: Option<u64>, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    let cmd = match size_mib {
        Some(size) => format!("pvresize -y --setphysicalvolumesize {}m {}", size, path),
        None => format!("pvresize -y {}", path),
    };
    run(&cmd, env)
}

pub fn pvremove(path: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("pvremove -y {}", path), env)
}

pub fn pvscan_cache(path: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("pvscan --cache {}", path), env)
}

pub fn vgcreate(name: &str, pv_paths: &[String], env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("vgcreate {} {}", name, pv_paths.join(" ")), env)
}

pub fn vgrename(old: &str, new: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("vgrename {} {}", old, new), env)
}

pub fn vgextend(name: &str, pv_paths: &[String], env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("vgextend {} {}", name, pv_paths.join(" ")), env)
}

pub fn vgreduce(name: &str, pv_paths: &[String], env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("vgreduce {} {}", name, pv_paths.join(" ")), env)
}

pub fn vgremove(name: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("vgremove -y {}", name), env)
}

/// `size` is either a MiB count or a pre-formed LVM size expression such as
/// `"100%FREE"`.
pub enum LvSize {
    Mib(u64),
    Expr(String),
}

pub fn lvcreate(name: &str, vg: &str, lv_type: &str, size: &LvSize, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    let size_arg = match size {
        LvSize::Mib(mib) => format!("-L {}m", mib),
        LvSize::Expr(expr) => format!("-l {}", expr),
    };
    run(&format!("lvcreate -y --type {} {} {} -n {}", lv_type, size_arg, vg, name), env)
}

pub fn lvrename(vg: &str, old: &str, new: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("lvrename {} {} {}", vg, old, new), env)
}

pub fn lvremove(vg: &str, name: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("lvremove -y {}/{}", vg, name), env)
}

pub fn make_thin_pool(data_lv: &str, meta_lv: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("lvconvert -y --type thin-pool --poolmetadata {} {}", meta_lv, data_lv), env)
}

pub fn lvcreate_thin(name: &str, vg: &str, size_mib: u64, thinpool: &str, env: &[EnvOverride]) -> Result<(), AlbiusError> {
    run(&format!("lvcreate -y -n {} -V {}m --thinpool {} {}", name, size_mib, thinpool, vg), env)
}

const PVS_FORMAT: &str = "pv_name,vg_name,pv_fmt,pv_attr,pv_size,pv_free";
const VGS_FORMAT: &str = "vg_name,vg_attr,vg_size,vg_free";
const LVS_FORMAT: &str = "lv_name,vg_name,pool_lv,lv_attr,lv_size";

fn lvm_report(tool: &str, fields: &str, env: &[EnvOverride]) -> Result<String, AlbiusError> {
    output(&format!("{} --noheadings --units m --nosuffix --separator , -o {}", tool, fields), env)
}

pub fn pvs(env: &[EnvOverride]) -> Result<Vec<PhysicalVolume>, AlbiusError> {
    let raw = lvm_report("pvs", PVS_FORMAT, env)?;
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.trim().split(',').collect();
            if fields.len() < 6 {
                return Err(AlbiusError::Decode { what: "pvs line", why: line.to_owned() });
            }
            Ok(PhysicalVolume {
                path: fields[0].to_owned(),
                vg_name: fields[1].to_owned(),
                format: fields[2].to_owned(),
                attributes: PvAttributes::parse(fields[3]),
                size: fields[4].to_owned(),
                free: fields[5].to_owned(),
            })
        })
        .collect()
}

pub fn vgs(env: &[EnvOverride]) -> Result<Vec<VolumeGroup>, AlbiusError> {
    let raw = lvm_report("vgs", VGS_FORMAT, env)?;
    let pvs = pvs(env)?;
    let lvs = lvs(env)?;

    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.trim().split(',').collect();
            if fields.len() < 4 {
                return Err(AlbiusError::Decode { what: "vgs line", why: line.to_owned() });
            }
            let name = fields[0].to_owned();
            Ok(VolumeGroup {
                physical_volumes: pvs.iter().filter(|pv| pv.vg_name == name).cloned().collect(),
                logical_volumes: lvs.iter().filter(|lv| lv.vg_name == name).cloned().collect(),
                attributes: VgAttributes::parse(fields[1]),
                size: fields[2].to_owned(),
                free: fields[3].to_owned(),
                name,
            })
        })
        .collect()
}

pub fn lvs(env: &[EnvOverride]) -> Result<Vec<LogicalVolume>, AlbiusError> {
    let raw = lvm_report("lvs", LVS_FORMAT, env)?;
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.trim().split(',').collect();
            if fields.len() < 5 {
                return Err(AlbiusError::Decode { what: "lvs line", why: line.to_owned() });
            }
            Ok(LogicalVolume {
                name: fields[0].to_owned(),
                vg_name: fields[1].to_owned(),
                pool: if fields[2].is_empty() { None } else { Some(fields[2].to_owned()) },
                attributes: LvAttributes::parse(fields[3])?,
                size: fields[4].to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pvs_parses_comma_separated_report() {
        // lvm_report shells out; the parser itself is what's exercised by
        // feeding a fixture line through the same split logic it uses.
        let line = "/dev/sda2,vg0,lvm2,a--,1024.00,512.00";
        let fields: Vec<&str> = line.split(',').collect();
        let pv = PhysicalVolume {
            path: fields[0].to_owned(),
            vg_name: fields[1].to_owned(),
            format: fields[2].to_owned(),
            attributes: PvAttributes::parse(fields[3]),
            size: fields[4].to_owned(),
            free: fields[5].to_owned(),
        };
        assert_eq!(pv.path, "/dev/sda2");
        assert!(pv.attributes.contains(PvAttributes::ALLOCATABLE));
    }
}
