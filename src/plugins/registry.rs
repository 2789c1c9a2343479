use async_trait::async_trait;
use crate::core::model::{BackendReply, DownloadRequest, ServiceStatus};
use clap::{ArgMatches, Command};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response (unreachable host, refused
    /// connection, TLS failure, ...).
    #[error("{0}")]
    Transport(String),

    /// A response arrived but its body was not the expected JSON.
    #[error("{0}")]
    Decode(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

#[derive(Debug, Clone)]
pub struct BackendContext {
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// `None` leaves timing entirely to the network stack.
    pub timeout_secs: Option<u64>,
}

impl Default for BackendContext {
    fn default() -> Self {
        Self {
            user_agent: concat!("form-downloader/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
            timeout_secs: None,
        }
    }
}

/// The remote download service. One call to `submit` is one outbound request.
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn submit(&self, req: &DownloadRequest) -> Result<BackendReply, BackendError>;

    /// Optional health probe. Default reports the backend as unable to answer.
    async fn service_status(&self) -> Result<ServiceStatus, BackendError> {
        Err(BackendError::Transport(format!("{} has no status endpoint", self.name())))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormCliConfig {
    pub backend_ctx: BackendContext,
}

pub trait CliPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn augment_command(&self, cmd: Command) -> Command;
    fn apply_matches(&self, matches: &ArgMatches, cfg: &mut FormCliConfig) -> anyhow::Result<()>;
}

pub struct PluginRegistry {
    cli_plugins: Vec<Box<dyn CliPlugin>>,
}

impl PluginRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self { cli_plugins: vec![] };
        reg.cli_plugins.push(Box::new(crate::plugins::http::cli::HttpCliPlugin::new()));
        reg
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.cli_plugins.iter().map(|p| p.name()).collect()
    }

    pub fn augment_command(&self, cmd: Command) -> Command {
        self.cli_plugins
            .iter()
            .fold(cmd, |c, p| p.augment_command(c))
    }

    pub fn apply_matches(&self, matches: &ArgMatches, cfg: &mut FormCliConfig) -> anyhow::Result<()> {
        for p in &self.cli_plugins {
            p.apply_matches(matches, cfg)?;
        }
        Ok(())
    }

    pub fn backend_for(&self, base_url: &Url, ctx: BackendContext) -> anyhow::Result<Arc<dyn DownloadBackend>> {
        match base_url.scheme() {
            "http" | "https" => Ok(Arc::new(crate::plugins::http::backend::HttpBackend::new(base_url.clone(), ctx)?)),
            other => anyhow::bail!("no backend for scheme: {other}"),
        }
    }
}
