pub mod api;
pub mod azure;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod proto;
pub mod response;
pub mod service;
pub mod utils;

pub use error::{PluginError, Result};
