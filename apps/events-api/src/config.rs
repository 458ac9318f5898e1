use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_first, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_events::{CloudinaryConfig, PageCacheConfig};

pub use core_config::Environment;

const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    /// `None` when no media-host credentials are set; image uploads are then refused
    pub cloudinary: Option<CloudinaryConfig>,
    pub page_cache: PageCacheConfig,
    /// Public origin of the site, used as the default CORS origin
    pub public_base_url: String,
    pub environment: Environment,
}

impl Config {
    /// Load from the environment, reading a `.env` file first when one exists.
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::load()?)
    }

    fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            mongodb: MongoConfig::from_env()?,
            server: ServerConfig::from_env()?,
            cloudinary: CloudinaryConfig::optional_from_env()?,
            page_cache: PageCacheConfig::from_env()?,
            public_base_url: env_first(&["PUBLIC_BASE_URL", "NEXT_PUBLIC_BASE_URL"])
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
            environment: Environment::from_env(),
        })
    }

    /// Explicit CORS origins, else the public base URL.
    pub fn cors_origins(&self) -> &str {
        self.server
            .cors_allowed_origins
            .as_deref()
            .unwrap_or(&self.public_base_url)
    }
}
