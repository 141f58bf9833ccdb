use axum::http::HeaderValue;
use std::env;
use std::net::SocketAddr;

/// HTTP-side settings, read from the environment next to `DatabaseConfig`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<HeaderValue>,
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("CINEMA_BIND_ADDR")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("ignoring invalid CINEMA_BIND_ADDR {v:?}: {e}");
                    None
                }
            })
            .unwrap_or_else(|| Self::default().bind_addr);

        Self {
            bind_addr,
            cors_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
            run_migrations: parse_flag(env::var("DB_RUN_MIGRATIONS").ok().as_deref(), true),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origins: Vec::new(),
            run_migrations: true,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}
