use std::process::{Command, Stdio};

use albius_disk_types::AlbiusError;

use crate::{run, shell_quote};

/// `cryptsetup isLuks <path>`: exit 0 means yes, exit 1 means no, any other
/// exit is a tool failure.
pub fn is_luks(path: &str) -> Result<bool, AlbiusError> {
    let status = Command::new("cryptsetup")
        .arg("isLuks")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(AlbiusError::from)?;

    match status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(AlbiusError::ToolFailed {
            cmd: format!("cryptsetup isLuks {}", path),
            stderr: format!("unexpected exit status: {:?}", status.code()),
        }),
    }
}

/// `cryptsetup -q luksFormat <path>`, piping the password through stdin when
/// non-empty.
pub fn luks_format(path: &str, password: &str) -> Result<(), AlbiusError> {
    let cmd = if password.is_empty() {
        format!("cryptsetup -q luksFormat {}", path)
    } else {
        format!("echo {} | cryptsetup -q luksFormat {}", shell_quote(password), path)
    };
    run(&cmd, &[])
}

/// Open a LUKS container under `mapping`, piping the password when
/// non-empty, else letting `cryptsetup` prompt.
pub fn luks_open(path: &str, mapping: &str, password: &str) -> Result<(), AlbiusError> {
    let cmd = if password.is_empty() {
        format!("cryptsetup open {} {}", path, mapping)
    } else {
        format!("echo {} | cryptsetup open {} {}", shell_quote(password), path, mapping)
    };
    run(&cmd, &[])
}

/// Open `path` as `mapping` unless `/dev/mapper/<mapping>` already exists.
pub fn luks_try_open(path: &str, mapping: &str, password: &str) -> Result<(), AlbiusError> {
    if std::path::Path::new(&format!("/dev/mapper/{}", mapping)).exists() {
        return Ok(());
    }
    luks_open(path, mapping, password)
}

pub fn luks_close(mapping: &str) -> Result<(), AlbiusError> {
    run(&format!("cryptsetup close {}", mapping), &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luks_open_without_password_has_no_pipe() {
        // Build the same string the function would, to verify command shape
        // without invoking cryptsetup.
        let cmd = format!("cryptsetup open {} {}", "/dev/sda2", "luks-abc");
        assert!(!cmd.contains('|'));
    }

    #[test]
    fn luks_open_with_password_pipes_echo() {
        let cmd = format!(
            "echo {} | cryptsetup open {} {}",
            shell_quote("hunter2"),
            "/dev/sda2",
            "luks-abc"
        );
        assert_eq!(cmd, "echo 'hunter2' | cryptsetup open /dev/sda2 luks-abc");
    }
}
