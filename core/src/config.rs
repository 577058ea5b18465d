//! Client configuration from the environment.

use std::path::PathBuf;

use crate::session::{FileStorage, Session};

/// API base used when `PORTFOLIO_API_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

pub const BASE_URL_VAR: &str = "PORTFOLIO_API_URL";
pub const SESSION_DIR_VAR: &str = "PORTFOLIO_SESSION_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Directory for the persisted token. `None` keeps it in memory only.
    pub session_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            base_url: var(BASE_URL_VAR)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session_dir: var(SESSION_DIR_VAR).map(PathBuf::from),
        }
    }

    /// A fresh session over the configured storage.
    pub fn session(&self) -> Session {
        match &self.session_dir {
            Some(dir) => Session::with_storage(FileStorage::new(dir)),
            None => Session::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:8000/api");
    }

    #[test]
    fn reads_and_trims_base_url() {
        let config = ClientConfig::from_lookup(lookup(&[(BASE_URL_VAR, "https://example.com/api/")]));
        assert_eq!(config.base_url, "https://example.com/api");
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(BASE_URL_VAR, ""), (SESSION_DIR_VAR, "  ")]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn session_dir_selects_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::from_lookup(lookup(&[(SESSION_DIR_VAR, dir.path().to_str().unwrap())]));
        assert_eq!(config.session_dir.as_deref(), Some(dir.path()));

        config.session().set_token(Some("kept"));
        assert_eq!(config.session().token().as_deref(), Some("kept"));
    }
}
