//! The Recipe Interpreter's input types (§6): the declarative description
//! of a single installation handed to `RecipeInterpreter::run`.

use serde::Deserialize;
use serde_json::Value;

use albius_disk_types::Mountpoint;

/// `SetupStep := { Disk: path, Operation: verb, Params: [ any ] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetupStep {
    pub disk: String,
    pub operation: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// `Mountpoint := { Partition: path, Target: dir }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecipeMountpoint {
    pub partition: String,
    pub target: String,
}

impl From<&RecipeMountpoint> for Mountpoint {
    fn from(mp: &RecipeMountpoint) -> Mountpoint {
        Mountpoint::new(mp.partition.clone(), mp.target.clone())
    }
}

/// `PostStep := { Chroot: bool, Operation: verb, Params: [ any ] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostStep {
    pub chroot: bool,
    pub operation: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// How the base system is deployed onto the staged root (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Installation {
    pub method: String,
    pub source: String,
    #[serde(default)]
    pub initramfs_pre: Vec<String>,
    #[serde(default)]
    pub initramfs_post: Vec<String>,
}

/// The complete declarative input to the Recipe Interpreter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Recipe {
    #[serde(default)]
    pub setup: Vec<SetupStep>,
    #[serde(default)]
    pub mountpoints: Vec<RecipeMountpoint>,
    pub installation: Installation,
    #[serde(default)]
    pub post_installation: Vec<PostStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_b_recipe() {
        let json = r#"{
            "Setup": [
                {"Disk": "/dev/sda", "Operation": "label", "Params": ["gpt"]},
                {"Disk": "/dev/sda", "Operation": "mkpart", "Params": ["efi", "fat32", 1, 513]},
                {"Disk": "/dev/sda", "Operation": "mkpart", "Params": ["root", "luks-ext4", 513, -1, "hunter2"]}
            ],
            "Mountpoints": [
                {"Partition": "/dev/sda2", "Target": "/"},
                {"Partition": "/dev/sda1", "Target": "/boot/efi"}
            ],
            "Installation": {
                "Method": "unsquashfs",
                "Source": "/cdrom/casper/filesystem.squashfs",
                "InitramfsPre": [],
                "InitramfsPost": []
            },
            "PostInstallation": [
                {"Chroot": true, "Operation": "hostname", "Params": ["pop-os"]}
            ]
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.setup.len(), 3);
        assert_eq!(recipe.mountpoints.len(), 2);
        assert_eq!(recipe.installation.method, "unsquashfs");
        assert_eq!(recipe.post_installation[0].operation, "hostname");
    }

    #[test]
    fn recipe_mountpoint_converts_into_shared_mountpoint_type() {
        let mp = RecipeMountpoint { partition: "/dev/sda2".into(), target: "/".into() };
        let converted: Mountpoint = (&mp).into();
        assert_eq!(converted.source, "/dev/sda2");
        assert_eq!(converted.target, "/");
    }
}
