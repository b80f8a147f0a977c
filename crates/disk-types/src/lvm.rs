use bitflags::bitflags;

use crate::AlbiusError;

bitflags! {
    /// Parsed from the 4-character PV attribute string `pvs` reports
    /// (`--noheadings -o pv_attr`). Position is significant; unused
    /// positions are reserved for tool-version skew and ignored.
    pub struct PvAttributes: u8 {
        const ALLOCATABLE = 0b0001;
        const EXPORTED     = 0b0010;
        const MISSING      = 0b0100;
    }
}

impl PvAttributes {
    pub fn parse(attr: &str) -> PvAttributes {
        let chars: Vec<char> = attr.chars().collect();
        let mut flags = PvAttributes::empty();
        if chars.get(0) == Some(&'a') {
            flags |= PvAttributes::ALLOCATABLE;
        }
        if chars.get(1) == Some(&'x') {
            flags |= PvAttributes::EXPORTED;
        }
        if chars.get(2) == Some(&'m') {
            flags |= PvAttributes::MISSING;
        }
        flags
    }
}

bitflags! {
    /// Parsed from the 6-character VG attribute string (`vgs -o vg_attr`).
    pub struct VgAttributes: u8 {
        const WRITABLE  = 0b00001;
        const RESIZABLE = 0b00010;
        const EXPORTED  = 0b00100;
        const PARTIAL   = 0b01000;
        const CLUSTERED = 0b10000;
    }
}

impl VgAttributes {
    pub fn parse(attr: &str) -> VgAttributes {
        let chars: Vec<char> = attr.chars().collect();
        let mut flags = VgAttributes::empty();
        if chars.get(0) == Some(&'w') {
            flags |= VgAttributes::WRITABLE;
        }
        if chars.get(1) == Some(&'z') {
            flags |= VgAttributes::RESIZABLE;
        }
        if chars.get(2) == Some(&'x') {
            flags |= VgAttributes::EXPORTED;
        }
        if chars.get(3) == Some(&'p') {
            flags |= VgAttributes::PARTIAL;
        }
        if chars.get(5) == Some(&'c') {
            flags |= VgAttributes::CLUSTERED;
        }
        flags
    }
}

/// The ten positional fields of the LV attribute string (`lvs -o lv_attr`),
/// kept as a table keyed by position rather than a cascade of conditionals,
/// per LVM's documented attribute glyph layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LvAttributes {
    pub volume_type: char,
    pub permissions: char,
    pub alloc_policy: char,
    pub fixed_minor: bool,
    pub state: char,
    pub device: char,
    pub target_type: char,
    pub blocks: char,
    pub health: char,
    pub skip: bool,
}

impl LvAttributes {
    pub fn parse(attr: &str) -> Result<LvAttributes, AlbiusError> {
        let chars: Vec<char> = attr.chars().collect();
        if chars.len() < 10 {
            return Err(AlbiusError::Decode {
                what: "LV attribute string",
                why: format!("expected 10 characters, got {:?}", attr),
            });
        }
        Ok(LvAttributes {
            volume_type: chars[0],
            permissions: chars[1],
            alloc_policy: chars[2],
            fixed_minor: chars[3] == 'm',
            state: chars[4],
            device: chars[5],
            target_type: chars[6],
            blocks: chars[7],
            health: chars[8],
            skip: chars[9] == 'k',
        })
    }
}

#[derive(Debug, Clone)]
pub struct PhysicalVolume {
    pub path: String,
    pub vg_name: String,
    pub format: String,
    pub attributes: PvAttributes,
    pub size: String,
    pub free: String,
}

#[derive(Debug, Clone)]
pub struct VolumeGroup {
    pub name: String,
    pub physical_volumes: Vec<PhysicalVolume>,
    pub logical_volumes: Vec<LogicalVolume>,
    pub attributes: VgAttributes,
    pub size: String,
    pub free: String,
}

#[derive(Debug, Clone)]
pub struct LogicalVolume {
    pub name: String,
    pub vg_name: String,
    pub pool: Option<String>,
    pub attributes: LvAttributes,
    pub size: String,
}

impl LogicalVolume {
    pub fn path(&self) -> String {
        format!("/dev/{}/{}", self.vg_name, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allocatable_pv() {
        let attrs = PvAttributes::parse("a--");
        assert!(attrs.contains(PvAttributes::ALLOCATABLE));
        assert!(!attrs.contains(PvAttributes::EXPORTED));
    }

    #[test]
    fn parses_writable_resizable_vg() {
        let attrs = VgAttributes::parse("wz--n-");
        assert!(attrs.contains(VgAttributes::WRITABLE));
        assert!(attrs.contains(VgAttributes::RESIZABLE));
        assert!(!attrs.contains(VgAttributes::CLUSTERED));
    }

    #[test]
    fn parses_lv_attribute_string() {
        let attrs = LvAttributes::parse("-wi-ao----").unwrap();
        assert_eq!(attrs.volume_type, '-');
        assert_eq!(attrs.permissions, 'w');
        assert_eq!(attrs.state, 'a');
        assert!(!attrs.fixed_minor);
        assert!(!attrs.skip);
    }

    #[test]
    fn lv_path_is_dev_vg_lv() {
        let lv = LogicalVolume {
            name: "root".into(),
            vg_name: "vg0".into(),
            pool: None,
            attributes: LvAttributes::parse("-wi-ao----").unwrap(),
            size: "2048.00m".into(),
        };
        assert_eq!(lv.path(), "/dev/vg0/root");
    }

    #[test]
    fn short_attribute_string_is_decode_error() {
        assert!(LvAttributes::parse("-wi").is_err());
    }
}
