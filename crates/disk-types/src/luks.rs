use crate::fs::FileSystem;

/// A LUKS2 container layered over a `Partition`. `mapper_name` and
/// `mapper_path` follow the `luks-<uuid>` naming convention the core uses
/// everywhere a mapping name is needed.
#[derive(Debug, Clone)]
pub struct LuksContainer {
    pub host_partition_path: String,
    pub uuid: String,
    pub inner_filesystem: Option<FileSystem>,
}

impl LuksContainer {
    pub fn mapper_name(uuid: &str) -> String {
        format!("luks-{}", uuid)
    }

    pub fn mapper_path(uuid: &str) -> String {
        format!("/dev/mapper/{}", LuksContainer::mapper_name(uuid))
    }

    pub fn new(host_partition_path: String, uuid: String, inner_filesystem: Option<FileSystem>) -> Self {
        LuksContainer { host_partition_path, uuid, inner_filesystem }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_naming() {
        assert_eq!(LuksContainer::mapper_name("abc-123"), "luks-abc-123");
        assert_eq!(LuksContainer::mapper_path("abc-123"), "/dev/mapper/luks-abc-123");
    }
}
