use std::collections::BTreeMap;

use reqwest::Url;

use super::{Executor, RestExecutor, RestFlavor};

/// Builds an executor for the given endpoint.
pub type ExecutorConstructor = fn(Url) -> Result<Box<dyn Executor>, ExecutorError>;

/// Errors while setting up an executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The spec is not of the form `<name>:<url>`.
    #[error("invalid executor spec {0:?}, expected <name>:<url>")]
    InvalidSpec(String),
    /// No executor is registered under the name.
    #[error("unknown executor {name:?} (url {url})")]
    UnknownExecutor {
        /// The requested name
        name: String,
        /// The requested endpoint
        url: String,
    },
    /// The endpoint is not a valid URL.
    #[error("invalid executor url {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected endpoint
        url: String,
        /// Parser message
        reason: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Splits an executor spec into its name and endpoint at the first `:`.
pub fn parse_executor(spec: &str) -> Result<(&str, &str), ExecutorError> {
    match spec.split_once(':') {
        Some((name, url)) if !name.is_empty() && !url.is_empty() => Ok((name, url)),
        _ => Err(ExecutorError::InvalidSpec(spec.to_string())),
    }
}

/// Executor constructors by name.
#[derive(Clone, Debug)]
pub struct ExecutorRegistry {
    constructors: BTreeMap<&'static str, ExecutorConstructor>,
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::empty()
            .register(RestFlavor::Lambda.name(), lambda)
            .register(RestFlavor::CloudFunction.name(), cloud_function)
    }
}

fn lambda(url: Url) -> Result<Box<dyn Executor>, ExecutorError> {
    Ok(Box::new(RestExecutor::new(RestFlavor::Lambda, url)?))
}

fn cloud_function(url: Url) -> Result<Box<dyn Executor>, ExecutorError> {
    Ok(Box::new(RestExecutor::new(RestFlavor::CloudFunction, url)?))
}

impl ExecutorRegistry {
    /// A registry without any executor.
    pub fn empty() -> Self {
        Self { constructors: BTreeMap::new() }
    }

    /// Registers `constructor` under `name`, replacing any previous one.
    pub fn register(mut self, name: &'static str, constructor: ExecutorConstructor) -> Self {
        self.constructors.insert(name, constructor);
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Creates the executor described by `spec`.
    pub fn create(&self, spec: &str) -> Result<Box<dyn Executor>, ExecutorError> {
        let (name, url) = parse_executor(spec)?;
        let constructor = self.constructors.get(name).ok_or_else(|| {
            ExecutorError::UnknownExecutor { name: name.to_string(), url: url.to_string() }
        })?;
        let url = Url::parse(url).map_err(|err| ExecutorError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        constructor(url)
    }
}
