use std::env;
use std::net::SocketAddr;
use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Which persistence backend the stores are wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Some(Self::Memory),
            "supabase" | "postgrest" => Some(Self::Supabase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub store_backend: StoreBackend,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            store_backend: match env::var("STORE_BACKEND") {
                Ok(value) => StoreBackend::parse(&value).unwrap_or_else(|| {
                    warn!("Unknown STORE_BACKEND '{}', using in-memory store", value);
                    StoreBackend::Memory
                }),
                Err(_) => StoreBackend::Memory,
            },
            bind_addr: env::var("API_BIND_ADDR")
                .ok()
                .and_then(|value| match value.parse() {
                    Ok(addr) => Some(addr),
                    Err(_) => {
                        warn!("API_BIND_ADDR '{}' is not a socket address, using default", value);
                        None
                    }
                })
                .unwrap_or_else(default_bind_addr),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Supabase store selected but not fully configured - missing environment variables");
        }

        if config.supabase_jwt_secret.is_empty() {
            warn!("JWT secret missing - every authenticated request will be rejected");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Backend the stores should actually use. Falls back to memory when Supabase is incomplete.
    pub fn effective_store_backend(&self) -> StoreBackend {
        match self.store_backend {
            StoreBackend::Supabase if !self.is_configured() => {
                warn!("Falling back to in-memory store");
                StoreBackend::Memory
            }
            backend => backend,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)))
}
