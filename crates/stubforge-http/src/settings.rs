//! Server-wide settings consumed by the pipeline.

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Hook invoked on the handlebars registry right after construction, so
/// embedders can register custom helpers.
pub type HandlebarsRegistration = Arc<dyn Fn(&mut Handlebars<'static>) + Send + Sync>;

/// Opaque filesystem capability handed to the templating engines only.
pub trait FileSystemHandler: Send + Sync {
    fn read_text(&self, path: &str) -> io::Result<String>;
    fn read_bytes(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Filesystem handler rooted at a directory.
pub struct LocalFileSystemHandler {
    root: PathBuf,
}

impl LocalFileSystemHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        // Templates only get to read inside the configured root.
        if Path::new(path).is_absolute() || path.split(['/', '\\']).any(|part| part == "..") {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path escapes template root: {path}"),
            ));
        }
        Ok(self.root.join(path))
    }
}

impl Default for LocalFileSystemHandler {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileSystemHandler for LocalFileSystemHandler {
    fn read_text(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path)?)
    }

    fn read_bytes(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path)?)
    }
}

/// Settings for the pooled outbound HTTP client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpClientSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    /// Skip TLS certificate verification (self-signed upstreams in
    /// development only).
    #[serde(default)]
    pub skip_tls_verify: bool,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_keepalive_secs() -> u64 {
    60
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            keepalive_secs: default_keepalive_secs(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            skip_tls_verify: false,
        }
    }
}

/// Server-wide settings: the filesystem capability for templating, the
/// optional handlebars registration hook, and client configuration.
#[derive(Clone)]
pub struct ServerSettings {
    pub file_system: Arc<dyn FileSystemHandler>,
    pub handlebars_registration: Option<HandlebarsRegistration>,
    pub http_client: HttpClientSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            file_system: Arc::new(LocalFileSystemHandler::default()),
            handlebars_registration: None,
            http_client: HttpClientSettings::default(),
        }
    }
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field(
                "handlebars_registration",
                &self.handlebars_registration.is_some(),
            )
            .field("http_client", &self.http_client)
            .finish()
    }
}
