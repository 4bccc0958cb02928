//! Zip a function directory for upload.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive the contents of `src` into the zip file `dest`.
///
/// Entries are stored relative to `src`, so the directory's files sit at
/// the archive root. Symlinks are stored as links, not as the files they
/// point at. Returns the number of files and links written.
pub fn archive_dir(src: &Path, dest: &Path) -> Result<usize> {
    let file = File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = 0;
    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read {}", src.display()))?;
        let name = entry_name(entry.path().strip_prefix(src)?);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.path_is_symlink() {
            let target = std::fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link {}", entry.path().display()))?;
            zip.add_symlink(name, target.to_string_lossy(), options)?;
            files += 1;
        } else {
            let mode = permissions(&entry.metadata()?);
            zip.start_file(name, options.unix_permissions(mode))?;
            let mut source = File::open(entry.path())
                .with_context(|| format!("Failed to open {}", entry.path().display()))?;
            io::copy(&mut source, &mut zip)?;
            files += 1;
        }
    }

    zip.finish()?;
    debug!(files, archive = %dest.display(), "archive written");
    Ok(files)
}

/// Archive entry names always use `/`, whatever the host separator.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn permissions(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permissions(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn archives_contents_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("functions/hello");
        std::fs::create_dir_all(src.join("node_modules/dep")).unwrap();
        std::fs::write(src.join("index.js"), "exports.handler = async () => 1;\n").unwrap();
        std::fs::write(src.join("node_modules/dep/index.js"), "module.exports = 2;\n").unwrap();

        let dest = dir.path().join("function.zip");
        assert_eq!(archive_dir(&src, &dest).unwrap(), 2);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "index.js",
                "node_modules/",
                "node_modules/dep/",
                "node_modules/dep/index.js"
            ]
        );

        let mut handler = String::new();
        archive
            .by_name("index.js")
            .unwrap()
            .read_to_string(&mut handler)
            .unwrap();
        assert_eq!(handler, "exports.handler = async () => 1;\n");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_stored_as_links() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("functions/hello");
        std::fs::create_dir_all(src.join("node_modules/dep/bin")).unwrap();
        std::fs::create_dir_all(src.join("node_modules/.bin")).unwrap();
        std::fs::write(src.join("node_modules/dep/bin/cli.js"), "require('../index');\n").unwrap();
        std::os::unix::fs::symlink("../dep/bin/cli.js", src.join("node_modules/.bin/dep"))
            .unwrap();
        // A loop must not abort packaging.
        std::os::unix::fs::symlink(".", src.join("node_modules/dep/self")).unwrap();

        let dest = dir.path().join("function.zip");
        assert_eq!(archive_dir(&src, &dest).unwrap(), 3);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut link = archive.by_name("node_modules/.bin/dep").unwrap();
        assert_eq!(link.unix_mode().unwrap() & 0o170000, 0o120000);
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, "../dep/bin/cli.js");
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let relative: std::path::PathBuf = ["a", "b", "c.js"].iter().collect();
        assert_eq!(entry_name(&relative), "a/b/c.js");
    }
}
