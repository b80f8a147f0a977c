//! Small filesystem helpers shared across the workspace: file-open wrappers
//! with file-path-annotated errors, and a sed-style find-and-replace used by
//! the PostInstallation locale verb.

use std::{
    borrow::Cow,
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use sedregex::find_and_replace;

pub fn open<P: AsRef<Path>>(path: P) -> io::Result<File> {
    File::open(&path).map_err(|why| {
        io::Error::new(io::ErrorKind::Other, format!("unable to open file at {:?}: {}", path.as_ref(), why))
    })
}

pub fn create<P: AsRef<Path>>(path: P) -> io::Result<File> {
    File::create(&path).map_err(|why| {
        io::Error::new(io::ErrorKind::Other, format!("unable to create file at {:?}: {}", path.as_ref(), why))
    })
}

pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    open(path).and_then(|mut file| {
        let mut buffer = Vec::with_capacity(file.metadata().ok().map_or(0, |x| x.len()) as usize);
        file.read_to_end(&mut buffer).map(|_| buffer)
    })
}

pub fn write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> io::Result<()> {
    create(path).and_then(|mut file| file.write_all(contents.as_ref()))
}

/// Apply a sed expression to a file in place, rewriting it only if the
/// replacement produced a change.
pub fn sed<P: AsRef<Path>>(path: P, pattern: &str) -> io::Result<()> {
    let path = path.as_ref();
    let sources = String::from_utf8(read(path)?).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidData, format!("{:?} contains non-UTF-8 data", path))
    })?;

    let replaced = find_and_replace(&sources, &[pattern])
        .map_err(|why| io::Error::new(io::ErrorKind::Other, format!("sedregex failure: {:?}", why)))?;

    match replaced {
        Cow::Borrowed(_) => Ok(()),
        Cow::Owned(text) => write(path, &text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn write_then_read_round_trips() {
        let dir = std::env::temp_dir().join("albius-utils-test-write-read");
        write(&dir, b"hello").unwrap();
        let mut contents = String::new();
        open(&dir).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
        let _ = std::fs::remove_file(&dir);
    }
}
