//! PostInstallation verb dispatch (§4.5 step 4, §15). Each verb is an
//! external collaborator to the core: the core's job is to run it in order,
//! in a chroot or directly against the host as the step's `Chroot` flag
//! says, and propagate whatever it returns.

use std::fs;
use std::path::Path;

use serde_json::Value;

use albius_disk_types::AlbiusError;
use albius_external::{run, run_in_chroot};

fn as_str(params: &[Value], index: usize) -> Result<&str, AlbiusError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| AlbiusError::InvalidArgument { why: format!("expected a string at params[{}]", index) })
}

fn as_str_opt(params: &[Value], index: usize) -> Option<&str> {
    params.get(index).and_then(Value::as_str)
}

fn as_bool(params: &[Value], index: usize) -> bool {
    params.get(index).and_then(Value::as_bool).unwrap_or(false)
}

fn as_int_opt(params: &[Value], index: usize) -> Option<i64> {
    params.get(index).and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
}

fn as_str_array(params: &[Value], index: usize) -> Vec<String> {
    params
        .get(index)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn exec(target_root: &Path, chroot: bool, cmd: &str) -> Result<(), AlbiusError> {
    if chroot {
        run_in_chroot(&target_root.to_string_lossy(), cmd, &[])
    } else {
        run(cmd, &[])
    }
}

/// Apply one PostInstallation verb. Unknown verbs are a hard error, the
/// same closed-set policy as the Storage Mutator's setup verbs.
pub fn dispatch(target_root: &Path, chroot: bool, verb: &str, params: &[Value]) -> Result<(), AlbiusError> {
    match verb {
        "timezone" => timezone(target_root, chroot, params),
        "hostname" => hostname(target_root, params),
        "locale" => locale(target_root, chroot, params),
        "user" => user(target_root, chroot, params),
        "keyboard" => keyboard(target_root, chroot, params),
        "swap" => swap(target_root, chroot, params),
        "removepkg" => removepkg(target_root, chroot, params),
        "shell" => shell(target_root, chroot, params),
        "grub-install" => grub_install(target_root, chroot, params),
        "grub-config" => grub_config(target_root, params),
        "grub-mkconfig" => grub_mkconfig(target_root, chroot, params),
        other => Err(AlbiusError::InvalidArgument { why: format!("unknown post-install verb `{}`", other) }),
    }
}

fn timezone(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let tz = as_str(params, 0)?;
    fs::write(target_root.join("etc/timezone"), tz)?;
    exec(target_root, chroot, &format!("ln -sf /usr/share/zoneinfo/{} /etc/localtime", tz))
}

fn hostname(target_root: &Path, params: &[Value]) -> Result<(), AlbiusError> {
    let name = as_str(params, 0)?;
    if !hostname_validator::is_valid(name) {
        return Err(AlbiusError::InvalidArgument { why: format!("`{}` is not a valid hostname", name) });
    }
    fs::write(target_root.join("etc/hostname"), format!("{}\n", name))?;
    let hosts = format!(
        "127.0.0.1\tlocalhost\n::1\t\tlocalhost\n127.0.1.1\t{}.localdomain\t{}\n",
        name, name
    );
    fs::write(target_root.join("etc/hosts"), hosts)?;
    Ok(())
}

fn locale(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let locale = as_str(params, 0)?;

    run(&format!("grep {} {}/usr/share/i18n/SUPPORTED", locale, target_root.display()), &[])
        .map_err(|_| AlbiusError::InvalidArgument { why: format!("locale {} is not supported", locale) })?;

    albius_utils::sed(&target_root.join("etc/locale.gen"), &format!("s/^\\# \\({}\\)/\\1/", locale))?;

    exec(target_root, chroot, "locale-gen")?;

    let mut contents = String::new();
    for key in &[
        "LANG", "LC_NUMERIC", "LC_TIME", "LC_MONETARY", "LC_PAPER", "LC_NAME", "LC_ADDRESS",
        "LC_TELEPHONE", "LC_MEASUREMENT", "LC_IDENTIFICATION",
    ] {
        contents.push_str(key);
        contents.push('=');
        contents.push_str(locale);
        contents.push('\n');
    }
    fs::write(target_root.join("etc/default/locale"), contents)?;
    Ok(())
}

fn user(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let username = as_str(params, 0)?;
    let fullname = as_str_opt(params, 1).unwrap_or("");
    let groups = as_str_array(params, 2);
    let password = as_str_opt(params, 3).unwrap_or("");
    let uid = as_int_opt(params, 4);
    let gid = as_int_opt(params, 5);

    let mut extra_args = String::new();
    if let Some(uid) = uid {
        extra_args.push_str(&format!(" --uid {}", uid));
    }
    if let Some(gid) = gid {
        extra_args.push_str(&format!(" --gid {}", gid));
    }

    exec(
        target_root,
        chroot,
        &format!(
            "useradd --shell /bin/bash{} {} && usermod -c \"{}\" {}",
            extra_args, username, fullname, username
        ),
    )?;

    if !password.is_empty() {
        exec(target_root, chroot, &format!("echo \"{}:{}\" | chpasswd", username, password))?;
    }

    if !groups.is_empty() {
        exec(target_root, chroot, &format!("usermod -a -G {} {}", groups.join(","), username))?;
    }

    Ok(())
}

fn keyboard(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let layout = as_str(params, 0)?;
    let model = as_str_opt(params, 1).unwrap_or("");
    let variant = as_str_opt(params, 2).unwrap_or("");

    let contents = format!(
        "# KEYBOARD CONFIGURATION FILE\n# Consult the keyboard(5) manual page.\nXKBMODEL=\"{}\"\nXKBLAYOUT=\"{}\"\nXKBVARIANT=\"{}\"\nBACKSPACE=\"guess\"\n",
        model, layout, variant
    );
    fs::write(target_root.join("etc/default/keyboard"), contents)?;
    exec(target_root, chroot, "setupcon --save-only")
}

fn swap(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let swap_partition = as_str(params, 0)?;
    exec(target_root, chroot, &format!("swapon {}", swap_partition))
}

fn removepkg(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let pkg_list_path = as_str(params, 0)?;
    let remove_cmd = as_str(params, 1)?;

    let contents = fs::read_to_string(pkg_list_path)?;
    let pkg_list = contents.replace('\n', " ");
    exec(target_root, chroot, &format!("{} {}", remove_cmd, pkg_list))
}

fn shell(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let cmd = as_str(params, 0)?;
    exec(target_root, chroot, cmd)
}

const GRUB_BIND_PATHS: &[&str] = &["dev", "dev/pts", "proc", "sys", "run"];

fn grub_install(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let boot_directory = as_str(params, 0)?;
    let disk_path = as_str(params, 1)?;
    let target = as_str(params, 2)?;
    let entry_name = as_str(params, 3)?;
    let removable = as_bool(params, 4);
    let efi_device = as_str_opt(params, 5);

    let mut mounted = Vec::new();
    if chroot {
        for relative in GRUB_BIND_PATHS {
            let bind_target = format!("{}/{}", target_root.display(), relative);
            run(&format!("mount --bind /{} {}", relative, bind_target), &[])?;
            mounted.push(bind_target);
        }
    }

    let removable_flag = if removable { "--removable" } else { "" };
    let cmd = format!(
        "grub-install --no-nvram {} --bootloader-id={} --boot-directory {} --target={} --uefi-secure-boot {}",
        removable_flag, entry_name, boot_directory, target, disk_path
    );
    let install_result = exec(target_root, chroot, &cmd);

    for bind_target in mounted.iter().rev() {
        let _ = run(&format!("umount -l {}", bind_target), &[]);
    }

    install_result?;

    if chroot {
        return Ok(());
    }

    if !removable && target == "x86_64-efi" {
        let efi_device = efi_device
            .ok_or_else(|| AlbiusError::InvalidArgument { why: "EFI device was not specified".into() })?;
        let (disk_name, part) = albius_disk_types::Disk::split_partition_path(efi_device)
            .ok_or_else(|| AlbiusError::Decode { what: "EFI device path", why: efi_device.to_owned() })?;
        run(
            &format!(
                "efibootmgr --create --disk={} --part={} --label={} --loader=\"\\EFI\\{}\\shimx64.efi\"",
                disk_name, part, entry_name, entry_name
            ),
            &[],
        )?;
    }

    Ok(())
}

fn grub_config(target_root: &Path, params: &[Value]) -> Result<(), AlbiusError> {
    let overrides = params
        .get(0)
        .and_then(Value::as_object)
        .ok_or_else(|| AlbiusError::InvalidArgument { why: "grub-config expects an object of key/value pairs".into() })?;

    let grub_path = target_root.join("etc/default/grub");

    let mut config: Vec<(String, String)> = if grub_path.is_file() {
        fs::read_to_string(&grub_path)?
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('=').map(|(k, v)| (k.to_owned(), v.to_owned())))
            .collect()
    } else {
        Vec::new()
    };

    for (key, value) in overrides {
        let value = value.as_str().unwrap_or_default().to_owned();
        if let Some(entry) = config.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            config.push((key.clone(), value));
        }
    }

    let contents: String = config.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect();
    fs::write(grub_path, contents)?;
    Ok(())
}

fn grub_mkconfig(target_root: &Path, chroot: bool, params: &[Value]) -> Result<(), AlbiusError> {
    let output = as_str_opt(params, 0).unwrap_or("/boot/grub/grub.cfg");
    exec(target_root, chroot, &format!("grub-mkconfig -o {}", output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_verb_is_rejected() {
        let err = dispatch(Path::new("/mnt/a"), true, "reformat-universe", &[]).unwrap_err();
        assert!(matches!(err, AlbiusError::InvalidArgument { .. }));
    }

    #[test]
    fn hostname_rejects_invalid_names() {
        let err = hostname(Path::new("/tmp/does-not-matter"), &[json!("-bad-name")]).unwrap_err();
        assert!(matches!(err, AlbiusError::InvalidArgument { .. }));
    }

    #[test]
    fn user_groups_are_coerced_from_a_json_array() {
        let groups = as_str_array(&[json!("alice"), json!(null), json!(null), json!(null), json!(null), json!(["sudo", "wheel"])], 5);
        assert_eq!(groups, vec!["sudo".to_owned(), "wheel".to_owned()]);
    }

    #[test]
    fn as_int_opt_accepts_numeric_strings() {
        assert_eq!(as_int_opt(&[json!("1000")], 0), Some(1000));
        assert_eq!(as_int_opt(&[json!(1000)], 0), Some(1000));
    }
}
