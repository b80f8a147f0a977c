use albius_disk_types::{AlbiusError, Disk, DiskLabel, Partition};
use albius_external::output_lenient;
use serde_json::Value;

/// `parted -sj <path> unit MiB print`, decoded into a `Disk` plus its
/// `Partition` list. `parted` exits non-zero on an unformatted disk but
/// still prints JSON; that case is accepted as success (§4.2).
pub fn locate_disk(path: &str) -> Result<Disk, AlbiusError> {
    let raw = output_lenient(&format!("parted -sj {} unit MiB print", path), &[])?;
    decode_disk(path, &raw)
}

/// Re-run `locate_disk` and replace every field on `disk`, including the
/// partition list. Mandatory after any verb that mutates the partition
/// table.
pub fn refresh(disk: &mut Disk) -> Result<(), AlbiusError> {
    *disk = locate_disk(&disk.path)?;
    Ok(())
}

fn decode_disk(path: &str, raw: &str) -> Result<Disk, AlbiusError> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|why| AlbiusError::Decode { what: "parted JSON", why: why.to_string() })?;

    let disk = root.get("disk").ok_or_else(|| AlbiusError::Decode {
        what: "parted JSON",
        why: "missing `disk` key".to_owned(),
    })?;

    let get_str = |key: &str| -> String {
        disk.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
    };

    let label_str = get_str("label");
    let label = if label_str.is_empty() { DiskLabel::Unknown } else { DiskLabel::from_parted_str(&label_str) };

    let mut partitions: Vec<Partition> = disk
        .get("partitions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|p| decode_partition(path, &p))
        .collect::<Result<_, _>>()?;

    partitions.sort_by_key(|p| p.number);

    Ok(Disk {
        path: path.to_owned(),
        size: get_str("size"),
        model: get_str("model"),
        transport: get_str("transport"),
        label,
        logical_sector_size: disk.get("logical-sector-size").and_then(Value::as_u64).unwrap_or(512),
        physical_sector_size: disk.get("physical-sector-size").and_then(Value::as_u64).unwrap_or(512),
        max_partitions: disk.get("max-partitions").and_then(Value::as_u64).unwrap_or(128) as u32,
        partitions,
    })
}

fn decode_partition(disk_path: &str, value: &Value) -> Result<Partition, AlbiusError> {
    let number = value.get("number").and_then(Value::as_u64).ok_or_else(|| AlbiusError::Decode {
        what: "parted partition JSON",
        why: "missing `number`".to_owned(),
    })? as u32;

    let get_str = |key: &str| -> String { value.get(key).and_then(Value::as_str).unwrap_or_default().to_owned() };

    let filesystem = value.get("filesystem").and_then(Value::as_str).map(|s| s.parse().unwrap());

    Ok(Partition {
        number,
        start: get_str("start"),
        end: get_str("end"),
        size: get_str("size"),
        type_: get_str("type"),
        path: Disk::partition_path(disk_path, number),
        filesystem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "disk": {
        "path": "/dev/sda",
        "size": "20480MiB",
        "model": "VMware Virtual disk",
        "transport": "scsi",
        "logical-sector-size": 512,
        "physical-sector-size": 512,
        "label": "gpt",
        "max-partitions": 128,
        "partitions": [
          {"number": 2, "start": "513MiB", "end": "20480MiB", "size": "19967MiB", "type": "primary", "filesystem": "ext4"},
          {"number": 1, "start": "1.00MiB", "end": "513MiB", "size": "512MiB", "type": "primary", "filesystem": "fat32"}
        ]
      }
    }"#;

    #[test]
    fn decodes_and_sorts_partitions_by_number() {
        let disk = decode_disk("/dev/sda", SAMPLE).unwrap();
        assert_eq!(disk.label, DiskLabel::Gpt);
        assert_eq!(disk.partitions.len(), 2);
        assert_eq!(disk.partitions[0].number, 1);
        assert_eq!(disk.partitions[1].number, 2);
    }

    #[test]
    fn fills_partition_paths_from_rule() {
        let disk = decode_disk("/dev/sda", SAMPLE).unwrap();
        assert_eq!(disk.partitions[0].path, "/dev/sda1");
        assert_eq!(disk.partitions[1].path, "/dev/sda2");
    }

    #[test]
    fn unlabelled_disk_has_unknown_label() {
        let raw = r#"{"disk": {"path": "/dev/sdb", "size": "1024MiB", "model": "", "transport": "",
            "logical-sector-size": 512, "physical-sector-size": 512, "label": "", "max-partitions": 128,
            "partitions": []}}"#;
        let disk = decode_disk("/dev/sdb", raw).unwrap();
        assert_eq!(disk.label, DiskLabel::Unknown);
        assert!(disk.partitions.is_empty());
    }

    #[test]
    fn missing_disk_key_is_decode_error() {
        assert!(decode_disk("/dev/sda", "{}").is_err());
    }
}
