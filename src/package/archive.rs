//! Compressed tarballs of the staging directory.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use walkdir::WalkDir;

/// Archive compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Bzip2,
    Gzip,
}

/// Append every entry below `root`, in file name order, named relative to `root`.
fn append_tree<W: Write>(builder: &mut tar::Builder<W>, root: &Path) -> io::Result<()> {
    builder.follow_symlinks(false);
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        builder.append_path_with_name(entry.path(), name)?;
    }
    Ok(())
}

/// Write a tarball of `root` to `dest`.
pub fn write_archive(root: &Path, dest: &Path, compression: Compression) -> io::Result<()> {
    let file = File::create(dest)?;
    match compression {
        Compression::Bzip2 => {
            let encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::best());
            let mut builder = tar::Builder::new(encoder);
            append_tree(&mut builder, root)?;
            builder.into_inner()?.finish()?;
        }
        Compression::Gzip => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            append_tree(&mut builder, root)?;
            builder.into_inner()?.finish()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entries<R: io::Read>(reader: R) -> Vec<String> {
        tar::Archive::new(reader)
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_entries_relative_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("stage");
        fs::create_dir_all(root.join("usr/bin")).unwrap();
        fs::write(root.join("usr/bin/b"), "b").unwrap();
        fs::write(root.join("usr/bin/a"), "a").unwrap();

        let gz = tmp.path().join("out.tar.gz");
        write_archive(&root, &gz, Compression::Gzip).unwrap();
        let names = entries(flate2::read::GzDecoder::new(File::open(&gz).unwrap()));
        let names: Vec<_> = names.iter().map(|n| n.trim_end_matches('/')).collect();
        assert_eq!(names, vec!["usr", "usr/bin", "usr/bin/a", "usr/bin/b"]);

        let bz = tmp.path().join("out.tar.bz2");
        write_archive(&root, &bz, Compression::Bzip2).unwrap();
        let names = entries(bzip2::read::BzDecoder::new(File::open(&bz).unwrap()));
        assert_eq!(names.len(), 4);
    }
}
