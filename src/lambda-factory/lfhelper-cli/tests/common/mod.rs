//! Shared fixtures: an in-memory Lambda, a scripted prompter and a
//! scratch working directory laid out like a functions repository.

#![allow(dead_code)]

use anyhow::{Result, bail};
use lfhelper_cli::{CreateRequest, FunctionDescriptor, FunctionService, Prompter};
use lfhelper_config::Config;
use std::cell::Cell;
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;

/// Installs one fake dependency, after checking the manifests are there.
pub const INSTALL_SCRIPT: &str = "test -f package.json && test -f package-lock.json \
    && mkdir -p node_modules/left-pad \
    && echo 'module.exports = 1;' > node_modules/left-pad/index.js";

#[derive(Default)]
pub struct FakeLambda {
    pub existing: Mutex<BTreeSet<String>>,
    pub lookups: Mutex<Vec<String>>,
    pub created: Mutex<Vec<CreateRequest>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_lookup: bool,
    pub fail_create: bool,
}

impl FakeLambda {
    pub fn with_existing(names: &[&str]) -> Self {
        Self {
            existing: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }
}

impl FunctionService for FakeLambda {
    async fn exists(&self, name: &str) -> Result<bool> {
        self.lookups.lock().unwrap().push(name.to_string());
        if self.fail_lookup {
            bail!("AccessDeniedException: not authorized to perform lambda:GetFunction");
        }
        Ok(self.existing.lock().unwrap().contains(name))
    }

    async fn create(&self, request: CreateRequest) -> Result<FunctionDescriptor> {
        if self.fail_create {
            bail!("ThrottlingException: Rate exceeded");
        }
        let descriptor = FunctionDescriptor {
            name: request.name.clone(),
            arn: Some(format!(
                "arn:aws:lambda:eu-west-2:000000000000:function:{}",
                request.name
            )),
            runtime: Some(request.runtime.clone()),
            handler: Some(request.handler.clone()),
            timeout: Some(request.timeout as i32),
            code_size: request.zip.len() as i64,
            state: Some("Pending".to_string()),
        };
        self.existing.lock().unwrap().insert(request.name.clone());
        self.created.lock().unwrap().push(request);
        Ok(descriptor)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(name.to_string());
        self.existing.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Answers prompts from a fixed list and counts how often it was asked.
pub struct Script {
    answers: VecDeque<String>,
    pub asked: Rc<Cell<usize>>,
}

impl Script {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Rc::new(Cell::new(0)),
        }
    }
}

impl Prompter for Script {
    fn input(&mut self, _prompt: &str) -> Result<String> {
        self.asked.set(self.asked.get() + 1);
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("prompted more often than scripted"),
        }
    }
}

/// A working directory with templates and root manifests.
pub fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "CD/template/function/index.js",
        "exports.handler = async (event) => ({ statusCode: 200 });\n",
    );
    write(root, "CD/template/events/event.json", "{ \"body\": \"{}\" }\n");
    write(
        root,
        "CD/template/test/index.test.js",
        "test('handler', () => {});\n",
    );
    write(root, "package.json", "{ \"name\": \"functions\" }\n");
    write(root, "package-lock.json", "{ \"lockfileVersion\": 3 }\n");

    dir
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub fn config(install_script: &str) -> Config {
    let mut config = Config::default();
    config.install.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        install_script.to_string(),
    ];
    config
}
