use std::{fmt::Display, net::SocketAddr, str::FromStr, time::Duration};
use anyhow::Context;

const DEFAULT_BIND: &str = "0.0.0.0:5050";
const DEFAULT_RESOLVER: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:        SocketAddr,
    pub resolver_url:     String,
    pub resolver_timeout: Duration,
    pub default_theaters: usize,
    pub default_seats:    usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("BIND_ADDR={bind} is not a socket address"))?;

        let resolver = get("RESOLVER_URL")
            .or_else(|| get("YTDL_SVC_AGENT_URL"))
            .unwrap_or_else(|| DEFAULT_RESOLVER.into());
        let resolver_url = if resolver.contains("://") {
            resolver
        } else {
            format!("http://{resolver}")
        };

        Ok(Config {
            bind_addr,
            resolver_url,
            resolver_timeout: Duration::from_secs(number_or(&get, "RESOLVER_TIMEOUT_SECS", 15)),
            default_theaters: number_or(&get, "DEFAULT_THEATER_AMT", 4),
            default_seats:    number_or(&get, "DEFAULT_THEATER_MAX_OCCUPANCY", 8),
        })
    }
}

/// Unset falls back silently; garbage falls back with a warning.
fn number_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = get(key) else { return default };
    raw.trim().parse().unwrap_or_else(|e| {
        tracing::warn!(key, value = %raw, err = %e, "not a valid number, defaulting to {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5050".parse().unwrap());
        assert_eq!(cfg.resolver_url, DEFAULT_RESOLVER);
        assert_eq!(cfg.resolver_timeout, Duration::from_secs(15));
        assert_eq!((cfg.default_theaters, cfg.default_seats), (4, 8));
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = load(&[("DEFAULT_THEATER_AMT", "many"), ("DEFAULT_THEATER_MAX_OCCUPANCY", " 3 ")]).unwrap();
        assert_eq!((cfg.default_theaters, cfg.default_seats), (4, 3));
    }

    #[test]
    fn legacy_agent_address_gets_scheme() {
        let cfg = load(&[("YTDL_SVC_AGENT_URL", "ytdl:9000")]).unwrap();
        assert_eq!(cfg.resolver_url, "http://ytdl:9000");
        let cfg = load(&[("RESOLVER_URL", "https://r.example"), ("YTDL_SVC_AGENT_URL", "ytdl:9000")]).unwrap();
        assert_eq!(cfg.resolver_url, "https://r.example");
    }

    #[test]
    fn bad_bind_addr_is_an_error() {
        assert!(load(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
