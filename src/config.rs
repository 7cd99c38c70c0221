use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::{PluginError, Result};

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(PluginError::Internal(format!("Unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Endpoints used to reach Azure. Overridable so tests and sovereign clouds
/// can point the plugin somewhere other than the public cloud.
#[derive(Debug, Clone)]
pub struct AzureEndpoints {
    pub authority_host: String,
    pub management_endpoint: String,
    pub timeout: Duration,
}

impl Default for AzureEndpoints {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            management_endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub bind_addr: String,
    pub grpc_port: u16,
    pub http_port: u16,
    pub log_format: LogFormat,
    pub azure: AzureEndpoints,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            grpc_port: 50051,
            http_port: 8080,
            log_format: LogFormat::Compact,
            azure: AzureEndpoints::default(),
        }
    }
}

impl PluginConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults
    /// for keys that are absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = match lookup("AZURE_HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_var::<u64>("AZURE_HTTP_TIMEOUT_SECS", &raw)?,
            None => defaults.azure.timeout.as_secs(),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            grpc_port: match lookup("GRPC_PORT") {
                Some(raw) => parse_var("GRPC_PORT", &raw)?,
                None => defaults.grpc_port,
            },
            http_port: match lookup("HTTP_PORT") {
                Some(raw) => parse_var("HTTP_PORT", &raw)?,
                None => defaults.http_port,
            },
            log_format: match lookup("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => defaults.log_format,
            },
            azure: AzureEndpoints {
                authority_host: lookup("AZURE_AUTHORITY_HOST")
                    .map(|v| v.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.azure.authority_host),
                management_endpoint: lookup("AZURE_MANAGEMENT_ENDPOINT")
                    .map(|v| v.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.azure.management_endpoint),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    pub fn grpc_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.bind_addr, self.grpc_port)
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.bind_addr, self.http_port)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PluginError::Internal(format!("Invalid value for {}: {}", key, raw)))
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|e| PluginError::Internal(format!("Invalid bind address {}: {}", host, e)))?;
    Ok(SocketAddr::new(ip, port))
}
