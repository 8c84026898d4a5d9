//! Store endpoint and credentials.
//!
//! The WebAssembly build has no process environment, so there the values are
//! baked in from the build environment; native builds read them at runtime.

use crate::error::StoreError;

pub const URL_VAR: &str = "LEADS_SUPABASE_URL";
pub const KEY_VAR: &str = "LEADS_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Project URL, without trailing slash
    pub url: String,
    /// Anon (public) API key
    pub api_key: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|var| {
            let value = match var {
                URL_VAR => option_env!("LEADS_SUPABASE_URL"),
                KEY_VAR => option_env!("LEADS_SUPABASE_ANON_KEY"),
                _ => None,
            };
            value.map(str::to_string)
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let read = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StoreError::Config(format!("{} is not set", var)))
        };
        Ok(Self::new(read(URL_VAR)?, read(KEY_VAR)?))
    }

    /// PostgREST endpoint for `table`.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }
}
