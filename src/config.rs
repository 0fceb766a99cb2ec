use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use tracing::info;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_SUMMARY_FALLBACK: &str = "http://127.0.0.1:8000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Process-wide settings, resolved once at startup and injected into the
/// clients that need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub summary_primary_url: Option<String>,
    pub summary_fallback_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let tmdb_api_key = non_empty("TMDB_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: TMDB_API_KEY"))?;
        let tmdb_base_url =
            non_empty("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string());
        let summary_primary_url = non_empty("SUMMARY_API_URL");
        let summary_fallback_url = non_empty("SUMMARY_FALLBACK_URL")
            .unwrap_or_else(|| DEFAULT_SUMMARY_FALLBACK.to_string());
        let bind_raw = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .with_context(|| format!("BIND_ADDR is not a socket address: {}", bind_raw))?;

        match &summary_primary_url {
            Some(url) => info!("Primary summarization endpoint: {}", url),
            None => info!("SUMMARY_API_URL not set, summaries go straight to the fallback"),
        }
        info!("Fallback summarization endpoint: {}", summary_fallback_url);

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: trim_base(tmdb_base_url),
            summary_primary_url: summary_primary_url.map(trim_base),
            summary_fallback_url: trim_base(summary_fallback_url),
            bind_addr,
        })
    }

    /// Endpoint bases in the order they should be tried.
    pub fn summary_endpoints(&self) -> Vec<String> {
        self.summary_primary_url
            .iter()
            .cloned()
            .chain(std::iter::once(self.summary_fallback_url.clone()))
            .collect()
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn config(primary: Option<&str>) -> Config {
        Config {
            tmdb_api_key: "key".to_string(),
            tmdb_base_url: DEFAULT_TMDB_BASE.to_string(),
            summary_primary_url: primary.map(str::to_string),
            summary_fallback_url: DEFAULT_SUMMARY_FALLBACK.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
        }
    }

    #[test]
    fn endpoints_put_primary_before_fallback() {
        let cfg = config(Some("https://summaries.example"));
        assert_eq!(
            cfg.summary_endpoints(),
            vec![
                "https://summaries.example".to_string(),
                DEFAULT_SUMMARY_FALLBACK.to_string()
            ]
        );
    }

    #[test]
    fn endpoints_without_primary_are_fallback_only() {
        assert_eq!(
            config(None).summary_endpoints(),
            vec![DEFAULT_SUMMARY_FALLBACK.to_string()]
        );
    }

    #[test]
    fn trailing_slashes_are_dropped() {
        assert_eq!(trim_base("http://x:8000//".to_string()), "http://x:8000");
    }

    #[test]
    fn api_key_is_required() {
        let err = load(&[("TMDB_BASE_URL", "http://tmdb.local")]).unwrap_err();
        assert!(err.to_string().contains("TMDB_API_KEY"));
        assert!(load(&[("TMDB_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn defaults_fill_unset_values() {
        let cfg = load(&[("TMDB_API_KEY", "key")]).unwrap();
        assert_eq!(cfg.tmdb_api_key, "key");
        assert_eq!(cfg.tmdb_base_url, DEFAULT_TMDB_BASE);
        assert_eq!(cfg.summary_primary_url, None);
        assert_eq!(cfg.summary_fallback_url, DEFAULT_SUMMARY_FALLBACK);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn urls_lose_trailing_slashes() {
        let cfg = load(&[
            ("TMDB_API_KEY", "key"),
            ("TMDB_BASE_URL", "http://tmdb.local/3/"),
            ("SUMMARY_API_URL", " https://summaries.example/ "),
            ("SUMMARY_FALLBACK_URL", "http://127.0.0.1:9000//"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();
        assert_eq!(cfg.tmdb_base_url, "http://tmdb.local/3");
        assert_eq!(
            cfg.summary_endpoints(),
            vec![
                "https://summaries.example".to_string(),
                "http://127.0.0.1:9000".to_string()
            ]
        );
        assert_eq!(cfg.bind_addr.port(), 8080);
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let err = load(&[("TMDB_API_KEY", "key"), ("BIND_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDR"));
    }
}
