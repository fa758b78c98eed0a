use std::env;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string (default: "sqlite:fileserver.db")
    pub database_url: String,

    /// Directory that holds uploaded blobs (default: "uploads")
    pub upload_dir: String,

    /// Maximum upload size in bytes (default: 100 MB)
    pub max_file_size: usize,

    /// HMAC secret for JWT signing
    pub jwt_secret: String,

    /// Socket address to bind (default: "127.0.0.1:3000")
    pub bind_addr: String,

    /// Page size used when the caller does not supply one (default: 10)
    pub default_page_size: u32,

    /// Upper bound on caller-supplied page sizes (default: 100)
    pub max_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:fileserver.db".to_string(),
            upload_dir: "uploads".to_string(),
            max_file_size: 100 * 1024 * 1024, // 100 MB
            jwt_secret: "secret".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or(default.upload_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            bind_addr: env::var("BIND_ADDR").unwrap_or(default.bind_addr),

            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_page_size),

            max_page_size: env::var("MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_page_size),
        }
    }

    /// Create config for development and tests (in-memory DB, small limits)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            upload_dir: "uploads".to_string(),
            max_file_size: 100 * 1024 * 1024,
            jwt_secret: "secret".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}
