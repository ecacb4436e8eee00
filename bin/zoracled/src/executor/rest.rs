use std::time::Duration;

use alloy_primitives::Bytes;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ExecutionOutput, Executor, ExecutorError};

/// How the executable is shipped to the remote runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestFlavor {
    /// Executable sent as text.
    Lambda,
    /// Executable sent base64 encoded.
    CloudFunction,
}

impl RestFlavor {
    /// The name this flavor is registered under.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::CloudFunction => "cloud-function",
        }
    }

    fn encode(self, executable: &[u8]) -> String {
        match self {
            Self::Lambda => String::from_utf8_lossy(executable).into_owned(),
            Self::CloudFunction => STANDARD.encode(executable),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    executable: String,
    calldata: &'a str,
    /// Milliseconds.
    timeout: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExecuteResponse {
    returncode: i64,
    stdout: String,
    stderr: String,
}

impl From<ExecuteResponse> for ExecutionOutput {
    fn from(response: ExecuteResponse) -> Self {
        let exit_code = u8::try_from(response.returncode).unwrap_or(u8::MAX);
        let output = if response.returncode == 0 { response.stdout } else { response.stderr };
        Self::new(Bytes::from(output.into_bytes()), exit_code)
    }
}

/// Executor that posts the executable to a remote HTTP runtime.
#[derive(Clone, Debug)]
pub struct RestExecutor {
    flavor: RestFlavor,
    url: Url,
    client: Client,
}

impl RestExecutor {
    /// Creates an executor posting to `url`.
    pub fn new(flavor: RestFlavor, url: Url) -> Result<Self, ExecutorError> {
        let client = Client::builder().build()?;
        Ok(Self { flavor, url, client })
    }

    /// The endpoint requests are posted to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn try_execute(
        &self,
        executable: &[u8],
        calldata: &str,
        timeout: Duration,
    ) -> Result<ExecutionOutput, reqwest::Error> {
        let body = ExecuteRequest {
            executable: self.flavor.encode(executable),
            calldata,
            timeout: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
        let response = self
            .client
            .post(self.url.clone())
            .timeout(timeout)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ExecuteResponse>()
            .await?;
        Ok(response.into())
    }
}

#[async_trait]
impl Executor for RestExecutor {
    fn name(&self) -> &str {
        self.flavor.name()
    }

    async fn execute(
        &self,
        executable: &[u8],
        calldata: &str,
        timeout: Duration,
    ) -> ExecutionOutput {
        match self.try_execute(executable, calldata, timeout).await {
            Ok(output) => {
                debug!(executor = self.name(), exit_code = output.exit_code, "data source executed");
                output
            }
            Err(err) => {
                error!(executor = self.name(), url = %self.url, %err, "data source execution failed");
                ExecutionOutput::execution_error()
            }
        }
    }
}
