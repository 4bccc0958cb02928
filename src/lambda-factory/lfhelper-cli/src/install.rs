//! Dependency installation inside a function directory.

use anyhow::{Context, Result, bail};
use lfhelper_config::{FunctionPaths, InstallSettings};
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::debug;

/// Run the install command in the function directory, then remove the
/// manifest copies it consumed.
///
/// A non-zero exit is an error and leaves the manifests in place.
pub async fn install_dependencies(settings: &InstallSettings, paths: &FunctionPaths) -> Result<()> {
    let shown = settings.command.join(" ");
    let (program, args) = settings
        .command
        .split_first()
        .context("install.command is empty")?;

    debug!(command = %shown, cwd = %paths.function_dir.display(), "installing dependencies");
    let output = Command::new(program)
        .args(args)
        .current_dir(&paths.function_dir)
        .output()
        .await
        .with_context(|| format!("Failed to run `{}`", shown))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("`{}` failed ({}): {}", shown, output.status, stderr.trim());
    }
    debug!(stdout = %String::from_utf8_lossy(&output.stdout).trim(), "install finished");

    remove_manifests(paths).await
}

/// Delete every manifest copy concurrently.
async fn remove_manifests(paths: &FunctionPaths) -> Result<()> {
    let mut removals = JoinSet::new();
    for copy in paths.manifest_copies() {
        let copy = copy.to_path_buf();
        removals.spawn(async move {
            tokio::fs::remove_file(&copy)
                .await
                .with_context(|| format!("Failed to remove {}", copy.display()))
        });
    }

    while let Some(joined) = removals.join_next().await {
        joined.context("manifest removal task failed")??;
    }
    Ok(())
}
