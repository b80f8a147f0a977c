/// One crypttab row: `luks-<uuid>  UUID=<uuid>  none  luks,discard`.
pub fn crypttab_row(uuid: &str) -> String {
    format!("luks-{}  UUID={}  none  luks,discard\n", uuid, uuid)
}

/// Render `/etc/crypttab`'s contents: no header, one row per LUKS-backed
/// mountpoint UUID, in the order given.
pub fn generate_crypttab(luks_uuids: &[String]) -> String {
    luks_uuids.iter().map(|uuid| crypttab_row(uuid)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypttab_row_format() {
        assert_eq!(crypttab_row("abcd-1234"), "luks-abcd-1234  UUID=abcd-1234  none  luks,discard\n");
    }

    #[test]
    fn empty_when_no_luks_mountpoints() {
        assert_eq!(generate_crypttab(&[]), "");
    }

    #[test]
    fn one_row_per_uuid_in_order() {
        let rows = generate_crypttab(&["a".to_owned(), "b".to_owned()]);
        assert_eq!(rows, "luks-a  UUID=a  none  luks,discard\nluks-b  UUID=b  none  luks,discard\n");
    }
}
