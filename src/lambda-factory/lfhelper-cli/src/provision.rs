//! The provisioning workflow: name, scaffold, install, package, register.

use crate::install::install_dependencies;
use crate::output;
use crate::package::archive_dir;
use crate::rollback::Ledger;
use crate::scaffold;
use crate::service::{CreateRequest, FunctionDescriptor, FunctionService};
use crate::session::{Prompter, Session};
use anyhow::{Context, Result};
use lfhelper_config::{Config, FunctionPaths};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a successful run.
#[derive(Debug)]
pub struct Provisioned {
    pub name: String,
    pub paths: FunctionPaths,
    pub descriptor: FunctionDescriptor,
}

pub struct Provisioner<S> {
    service: S,
    config: Config,
    root: PathBuf,
}

impl<S: FunctionService> Provisioner<S> {
    /// `root` is the directory templates are read from and functions are
    /// scaffolded into.
    pub fn new(service: S, config: Config, root: PathBuf) -> Self {
        Self {
            service,
            config,
            root,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the whole workflow once.
    ///
    /// `preset` is tried as the first name; a taken name (preset or typed)
    /// falls back to prompting again. The session stays open across
    /// re-prompts; closing it is the caller's job.
    pub async fn run<P: Prompter>(
        &self,
        session: &mut Session<P>,
        preset: Option<String>,
    ) -> Result<Provisioned> {
        let name = self.choose_name(session, preset).await?;
        let paths = self.config.layout.paths_for(&self.root, &name);

        let mut ledger = Ledger::default();
        match self.provision(&name, &paths, &mut ledger).await {
            Ok(descriptor) => Ok(Provisioned {
                name,
                paths,
                descriptor,
            }),
            Err(err) => {
                if self.config.workflow.rollback_on_failure && !ledger.is_empty() {
                    output::phase(format!("Rolling back function: {name}..."));
                    ledger.unwind(&self.service).await;
                }
                Err(err)
            }
        }
    }

    async fn choose_name<P: Prompter>(
        &self,
        session: &mut Session<P>,
        mut preset: Option<String>,
    ) -> Result<String> {
        loop {
            let name = match preset.take() {
                Some(name) => name,
                None => session.ask_name()?,
            };
            if name.trim().is_empty() {
                continue;
            }

            if self.service.exists(&name).await? {
                debug!(function = %name, "name already taken");
                output::duplicate_name();
                continue;
            }
            return Ok(name);
        }
    }

    async fn provision(
        &self,
        name: &str,
        paths: &FunctionPaths,
        ledger: &mut Ledger,
    ) -> Result<FunctionDescriptor> {
        let layout = &self.config.layout;

        output::phase(format!("Preparing directories for function: {name}..."));
        let scaffolds = paths.scaffolds(layout, &self.root);
        for tree in &scaffolds {
            // Only trees this run creates are rolled back.
            if !tokio::fs::try_exists(&tree.destination).await.unwrap_or(true) {
                ledger.created_dir(tree.destination.clone());
            }
        }
        let (owned_name, owned_paths) = (name.to_string(), paths.clone());
        tokio::task::spawn_blocking(move || {
            scaffold::prepare(&owned_name, &owned_paths, &scaffolds)
        })
        .await
        .context("directory preparation task failed")??;
        info!(function = %name, "directories created");
        output::success("Directories created successfully.");

        output::phase(format!("Preparing lambda dependencies for function: {name}..."));
        install_dependencies(&self.config.install, paths).await?;
        info!(function = %name, "dependencies installed");
        output::success("Lambda dependencies created successfully.");

        output::phase(format!("Registering function: {name}, to AWS Lambda..."));
        let descriptor = self.register(name, paths, ledger).await?;
        println!("{descriptor}");
        info!(function = %name, arn = ?descriptor.arn, "function registered");
        output::success(format!("Lambda function {name} was created successfully."));

        output::phase(format!(
            "Removing function-level {} from: {name}",
            layout.dependency_cache
        ));
        remove_dir_if_present(&paths.dependency_cache).await?;
        remove_file_if_present(&paths.archive).await?;

        Ok(descriptor)
    }

    async fn register(
        &self,
        name: &str,
        paths: &FunctionPaths,
        ledger: &mut Ledger,
    ) -> Result<FunctionDescriptor> {
        ledger.archived(paths.archive.clone());
        let (src, dest) = (paths.function_dir.clone(), paths.archive.clone());
        tokio::task::spawn_blocking(move || archive_dir(&src, &dest))
            .await
            .context("packaging task failed")??;
        let zip = tokio::fs::read(&paths.archive)
            .await
            .with_context(|| format!("Failed to read {}", paths.archive.display()))?;

        let request = CreateRequest::new(name, &self.config.function, zip);
        let descriptor = self.service.create(request).await?;
        ledger.registered(name);
        Ok(descriptor)
    }
}

async fn remove_dir_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("Failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

async fn remove_file_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("Failed to remove {}", path.display()))
        }
        _ => Ok(()),
    }
}
