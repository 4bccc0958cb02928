//! Copy template trees and write function metadata.

use anyhow::{Context, Result};
use lfhelper_config::{FunctionPaths, Scaffold};
use serde::Serialize;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Contents of `metadata.json` inside a function directory.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata<'a> {
    function_name: &'a str,
}

/// Lay out the directories for a new function.
///
/// Copies each template tree to its name-scoped destination, copies the
/// dependency manifests into the function directory and writes
/// `metadata.json`. Blocking; call it off the async runtime.
pub fn prepare(name: &str, paths: &FunctionPaths, scaffolds: &[Scaffold]) -> Result<()> {
    for scaffold in scaffolds {
        copy_tree(&scaffold.template, &scaffold.destination)?;
    }

    for (source, copy) in &paths.manifests {
        std::fs::copy(source, copy).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), copy.display())
        })?;
    }

    write_metadata(&paths.metadata, name)
}

/// Recursively copy `src` into `dest`, creating directories as needed.
/// Symlinks are recreated as links.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    debug!(from = %src.display(), to = %dest.display(), "copying template");

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to read template {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.path_is_symlink() {
            copy_link(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_link(link: &Path, target: &Path) -> Result<()> {
    let points_to = std::fs::read_link(link)
        .with_context(|| format!("Failed to read link {}", link.display()))?;
    std::os::unix::fs::symlink(&points_to, target)
        .with_context(|| format!("Failed to link {}", target.display()))
}

#[cfg(not(unix))]
fn copy_link(link: &Path, target: &Path) -> Result<()> {
    std::fs::copy(link, target)
        .map(drop)
        .with_context(|| format!("Failed to copy {} to {}", link.display(), target.display()))
}

fn write_metadata(path: &Path, name: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(&Metadata {
        function_name: name,
    })?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))
}
