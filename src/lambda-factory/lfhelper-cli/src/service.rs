//! The remote function-hosting service.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_lambda::Client;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use lfhelper_config::FunctionSettings;
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Everything sent when registering a new function.
#[derive(Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub name: String,
    pub runtime: String,
    pub role: String,
    pub handler: String,
    /// Seconds.
    pub timeout: u32,
    /// Zipped function directory.
    pub zip: Vec<u8>,
}

impl CreateRequest {
    pub fn new(name: &str, settings: &FunctionSettings, zip: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            runtime: settings.runtime.clone(),
            role: settings.role.clone(),
            handler: settings.handler.clone(),
            timeout: settings.timeout,
            zip,
        }
    }
}

// The payload can be megabytes; show its size instead.
impl fmt::Debug for CreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateRequest")
            .field("name", &self.name)
            .field("runtime", &self.runtime)
            .field("role", &self.role)
            .field("handler", &self.handler)
            .field("timeout", &self.timeout)
            .field("zip_len", &self.zip.len())
            .finish()
    }
}

/// What the service reports back for a newly created function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub arn: Option<String>,
    pub runtime: Option<String>,
    pub handler: Option<String>,
    pub timeout: Option<i32>,
    pub code_size: i64,
    pub state: Option<String>,
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_dash(value: Option<&str>) -> &str {
            value.unwrap_or("-")
        }

        writeln!(f, "FunctionName: {}", self.name)?;
        writeln!(f, "FunctionArn:  {}", or_dash(self.arn.as_deref()))?;
        writeln!(f, "Runtime:      {}", or_dash(self.runtime.as_deref()))?;
        writeln!(f, "Handler:      {}", or_dash(self.handler.as_deref()))?;
        match self.timeout {
            Some(timeout) => writeln!(f, "Timeout:      {timeout}s")?,
            None => writeln!(f, "Timeout:      -")?,
        }
        writeln!(f, "CodeSize:     {} bytes", self.code_size)?;
        write!(f, "State:        {}", or_dash(self.state.as_deref()))
    }
}

/// Operations the provisioner needs from the hosting service.
pub trait FunctionService {
    /// Whether a function with exactly this name exists.
    ///
    /// "Not found" answers `false`; every other failure is an error.
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    fn create(&self, request: CreateRequest)
    -> impl Future<Output = Result<FunctionDescriptor>> + Send;

    /// Only used to undo a registration during rollback.
    fn delete(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// AWS Lambda through the official SDK.
pub struct LambdaService {
    client: Client,
}

impl LambdaService {
    /// Build a client from the default AWS provider chain, optionally
    /// pinning the region.
    pub async fn from_env(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
        }
    }
}

impl FunctionService for LambdaService {
    async fn exists(&self, name: &str) -> Result<bool> {
        debug!(function = name, "GetFunction");
        match self.client.get_function().function_name(name).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(aws_sdk_lambda::Error::from(err))
                .with_context(|| format!("Failed to look up function '{}'", name)),
        }
    }

    async fn create(&self, request: CreateRequest) -> Result<FunctionDescriptor> {
        debug!(?request, "CreateFunction");
        let timeout = i32::try_from(request.timeout)
            .with_context(|| format!("Timeout {} does not fit the API", request.timeout))?;
        let code = FunctionCode::builder()
            .zip_file(Blob::new(request.zip))
            .build();

        let output = self
            .client
            .create_function()
            .function_name(&request.name)
            .runtime(Runtime::from(request.runtime.as_str()))
            .role(&request.role)
            .handler(&request.handler)
            .timeout(timeout)
            .code(code)
            .send()
            .await
            .map_err(aws_sdk_lambda::Error::from)
            .with_context(|| format!("Failed to create function '{}'", request.name))?;

        Ok(FunctionDescriptor {
            name: output
                .function_name()
                .map(str::to_string)
                .unwrap_or(request.name),
            arn: output.function_arn().map(str::to_string),
            runtime: output.runtime().map(|r| r.as_str().to_string()),
            handler: output.handler().map(str::to_string),
            timeout: output.timeout(),
            code_size: output.code_size(),
            state: output.state().map(|s| s.as_str().to_string()),
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        debug!(function = name, "DeleteFunction");
        self.client
            .delete_function()
            .function_name(name)
            .send()
            .await
            .map_err(aws_sdk_lambda::Error::from)
            .with_context(|| format!("Failed to delete function '{}'", name))?;
        Ok(())
    }
}
