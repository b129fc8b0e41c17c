//! Endpoint and key configuration for both backends.

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DataError;

/// Default aggregation-service root for local development.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";

const STORE_URL_VAR: &str = "PULSEVO_SUPABASE_URL";
const STORE_KEY_VAR: &str = "PULSEVO_SUPABASE_ANON_KEY";
const API_URL_VAR: &str = "PULSEVO_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Relational store project URL.
    pub store_url: String,
    /// Project-level anon key for the store's REST surface.
    pub store_anon_key: String,
    /// Aggregation service root, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Config {
    /// Read configuration from the environment. The store URL and key are
    /// required; the API base falls back to the local default.
    pub fn from_env() -> Result<Self, DataError> {
        let store_url = env::var(STORE_URL_VAR)
            .map_err(|_| DataError::Config(format!("{STORE_URL_VAR} is not set")))?;
        let store_anon_key = env::var(STORE_KEY_VAR)
            .map_err(|_| DataError::Config(format!("{STORE_KEY_VAR} is not set")))?;
        let api_base_url = env::var(API_URL_VAR).unwrap_or_else(|_| default_api_base_url());
        Ok(Self {
            store_url,
            store_anon_key,
            api_base_url,
        })
    }
}

/// Parse a configured URL, naming the field in the error.
pub(crate) fn parse_url(value: &str, name: &str) -> Result<Url, DataError> {
    Url::parse(value).map_err(|e| DataError::Config(format!("{name} is not a valid URL: {e}")))
}
