use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: String,
    pub max_file_bytes: u64,
    pub max_batch_files: usize,
    pub quota_ceiling_bytes: u64,
    pub max_request_bytes: u64,
    pub placeholder_image_url: String,
    pub log_level: String,
    pub cors_allowed_origins: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".into()),
            max_file_bytes: parse_env("MAX_FILE_BYTES", 5 * 1024 * 1024),
            max_batch_files: parse_env("MAX_BATCH_FILES", 20),
            quota_ceiling_bytes: parse_env("QUOTA_CEILING_BYTES", 5 * 1024 * 1024 * 1024),
            // Room for a full batch of maximum-size files plus multipart framing.
            max_request_bytes: parse_env("MAX_REQUEST_BYTES", 110 * 1024 * 1024),
            placeholder_image_url: env::var("PLACEHOLDER_IMAGE_URL").unwrap_or_else(|_| {
                "https://via.placeholder.com/800x600/e0e0e0/808080?text=Image+Not+Available".into()
            }),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".into()),
        }
    }

    /// Directory holding every stored listing image, one flat level.
    pub fn listings_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.uploads_dir).join("listings")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
