//! Application settings read from the environment

use std::env;
use std::net::SocketAddr;

/// Server settings with sensible local defaults
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory of quarterly snapshot CSVs; built-in sample data is used
    /// when unset
    pub data_dir: Option<String>,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let bind_addr = env::var("FORECAST_ADDR")
            .ok()
            .and_then(|addr| addr.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)));

        let data_dir = env::var("FORECAST_DATA_DIR").ok().filter(|d| !d.is_empty());

        let allowed_origins = env::var("FORECAST_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        Self {
            bind_addr,
            data_dir,
            allowed_origins,
        }
    }
}
