//! Compensating steps for a run that fails part way.

use crate::output;
use crate::service::FunctionService;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

/// Side effects of the current run, in the order they happened.
#[derive(Debug, Default)]
pub struct Ledger {
    created_dirs: Vec<PathBuf>,
    archive: Option<PathBuf>,
    registered: Option<String>,
}

impl Ledger {
    pub fn created_dir(&mut self, dir: PathBuf) {
        self.created_dirs.push(dir);
    }

    pub fn archived(&mut self, archive: PathBuf) {
        self.archive = Some(archive);
    }

    pub fn registered(&mut self, name: &str) {
        self.registered = Some(name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.created_dirs.is_empty() && self.archive.is_none() && self.registered.is_none()
    }

    /// Undo recorded side effects, newest first.
    ///
    /// Failures are logged and skipped so one stuck step does not stop the
    /// rest. Returns how many steps failed.
    pub async fn unwind<S: FunctionService>(self, service: &S) -> usize {
        let mut failed = 0;

        if let Some(name) = &self.registered {
            match service.delete(name).await {
                Ok(()) => info!(function = %name, "deleted remote function"),
                Err(err) => {
                    warn!(function = %name, "rollback: {err:#}");
                    failed += 1;
                }
            }
        }

        if let Some(archive) = &self.archive {
            match tokio::fs::remove_file(archive).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %archive.display(), "rollback: {err}");
                    failed += 1;
                }
            }
        }

        for dir in self.created_dirs.iter().rev() {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => info!(path = %dir.display(), "removed"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %dir.display(), "rollback: {err}");
                    failed += 1;
                }
            }
        }

        if failed == 0 {
            output::phase("Rolled back partial changes.");
        } else {
            output::warning(format!(
                "Rollback left {failed} step(s) undone; see the warnings above."
            ));
        }
        failed
    }
}
