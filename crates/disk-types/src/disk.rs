use crate::fs::FileSystem;

/// Partition-table kind. `Unknown` covers an unlabelled disk, which `parted`
/// reports with an empty `label` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskLabel {
    Mbr,
    Gpt,
    Unknown,
}

impl DiskLabel {
    pub fn from_parted_str(label: &str) -> DiskLabel {
        match label {
            "msdos" => DiskLabel::Mbr,
            "gpt" => DiskLabel::Gpt,
            _ => DiskLabel::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    /// The parted-assigned partition number; the stable identity of this
    /// partition, not its ordinal position within `Disk::partitions`.
    pub number: u32,
    pub start: String,
    pub end: String,
    pub size: String,
    pub type_: String,
    pub path: String,
    pub filesystem: Option<FileSystem>,
}

#[derive(Debug, Clone)]
pub struct Disk {
    pub path: String,
    pub size: String,
    pub model: String,
    pub transport: String,
    pub label: DiskLabel,
    pub logical_sector_size: u64,
    pub physical_sector_size: u64,
    pub max_partitions: u32,
    pub partitions: Vec<Partition>,
}

impl Disk {
    /// Compute a partition's path from the disk path and partition number:
    /// `<disk>p<n>` when the disk path ends in a digit (`nvme0n1`, loop
    /// devices), `<disk><n>` otherwise (`sda`).
    pub fn partition_path(disk_path: &str, number: u32) -> String {
        match disk_path.chars().last() {
            Some(c) if c.is_ascii_digit() => format!("{}p{}", disk_path, number),
            _ => format!("{}{}", disk_path, number),
        }
    }

    /// Inverse of `partition_path`: split an arbitrary partition path into
    /// its disk path and partition number. The disk path is the longest
    /// prefix matching `^/dev/[A-Za-z]+([0-9]+[a-z][0-9]+)?`; a `p`
    /// separator directly before the trailing digit run is stripped.
    pub fn split_partition_path(partition_path: &str) -> Option<(String, u32)> {
        let bytes = partition_path.as_bytes();
        let digit_start = {
            let mut i = bytes.len();
            while i > 0 && bytes[i - 1].is_ascii_digit() {
                i -= 1;
            }
            i
        };
        if digit_start == bytes.len() {
            return None;
        }
        let number: u32 = partition_path[digit_start..].parse().ok()?;
        let mut disk_end = digit_start;
        if disk_end > 0 && bytes[disk_end - 1] == b'p' {
            // Only strip the separator if what precedes it still ends in a
            // digit, matching nvme0n1p3-style paths rather than sda's sd*p.
            if disk_end > 1 && bytes[disk_end - 2].is_ascii_digit() {
                disk_end -= 1;
            }
        }
        Some((partition_path[..disk_end].to_owned(), number))
    }

    pub fn get_partition(&self, number: u32) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.number == number)
    }

    /// Scan adjacent partitions (after sorting by `number`'s start offset)
    /// for gaps, in integer MiB, per the `available_sectors` contract.
    pub fn available_sectors(&self) -> Vec<(u64, u64)> {
        let mut by_start: Vec<&Partition> = self.partitions.iter().collect();
        by_start.sort_by_key(|p| parse_mib(&p.start));

        let mut free = Vec::new();
        let mut prev_end: Option<u64> = None;
        for part in &by_start {
            let start = parse_mib(&part.start);
            let end = parse_mib(&part.end);
            if let Some(prev) = prev_end {
                if prev != start {
                    free.push((prev, start));
                }
            }
            prev_end = Some(end);
        }
        if let Some(prev) = prev_end {
            let disk_size = parse_mib(&self.size);
            if prev < disk_size {
                free.push((prev, disk_size));
            }
        }
        free
    }
}

/// Parse a parted-reported size/offset string of the form `"1234MiB"` into
/// its integer MiB value, dropping the trailing unit suffix.
fn parse_mib(value: &str) -> u64 {
    value
        .trim_end_matches("MiB")
        .trim()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_path_for_sda_style_disk() {
        assert_eq!(Disk::partition_path("/dev/sda", 3), "/dev/sda3");
    }

    #[test]
    fn partition_path_for_nvme_style_disk() {
        assert_eq!(Disk::partition_path("/dev/nvme0n1", 3), "/dev/nvme0n1p3");
    }

    #[test]
    fn split_is_inverse_of_fill_for_sda() {
        for n in 1..99 {
            let path = Disk::partition_path("/dev/sda", n);
            assert_eq!(Disk::split_partition_path(&path), Some(("/dev/sda".to_owned(), n)));
        }
    }

    #[test]
    fn split_is_inverse_of_fill_for_nvme() {
        for n in 1..99 {
            let path = Disk::partition_path("/dev/nvme0n1", n);
            assert_eq!(
                Disk::split_partition_path(&path),
                Some(("/dev/nvme0n1".to_owned(), n))
            );
        }
    }

    #[test]
    fn available_sectors_empty_when_partition_fills_disk() {
        let disk = Disk {
            path: "/dev/sda".into(),
            size: "1024MiB".into(),
            model: String::new(),
            transport: String::new(),
            label: DiskLabel::Gpt,
            logical_sector_size: 512,
            physical_sector_size: 512,
            max_partitions: 128,
            partitions: vec![Partition {
                number: 1,
                start: "1MiB".into(),
                end: "1024MiB".into(),
                size: "1023MiB".into(),
                type_: String::new(),
                path: "/dev/sda1".into(),
                filesystem: None,
            }],
        };
        assert!(disk.available_sectors().is_empty());
    }

    #[test]
    fn available_sectors_finds_gap_between_partitions() {
        let disk = Disk {
            path: "/dev/sda".into(),
            size: "2048MiB".into(),
            model: String::new(),
            transport: String::new(),
            label: DiskLabel::Gpt,
            logical_sector_size: 512,
            physical_sector_size: 512,
            max_partitions: 128,
            partitions: vec![
                Partition {
                    number: 1,
                    start: "1MiB".into(),
                    end: "500MiB".into(),
                    size: "499MiB".into(),
                    type_: String::new(),
                    path: "/dev/sda1".into(),
                    filesystem: None,
                },
                Partition {
                    number: 2,
                    start: "600MiB".into(),
                    end: "1000MiB".into(),
                    size: "400MiB".into(),
                    type_: String::new(),
                    path: "/dev/sda2".into(),
                    filesystem: None,
                },
            ],
        };
        assert_eq!(disk.available_sectors(), vec![(500, 600), (1000, 2048)]);
    }
}
