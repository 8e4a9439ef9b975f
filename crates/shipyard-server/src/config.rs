use std::path::PathBuf;

use crate::error::Result;
pub use clap::Parser;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Registry of space ships")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "SHIPYARD_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "SHIPYARD_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "SHIPYARD_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of server, as visible to clients"
    )]
    pub base_url: Url,

    #[arg(
        long,
        env = "SHIPYARD_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/shipyard.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "SHIPYARD_DATA_DIR",
        help = "Data directory, default is system default like ~/.local/share/shipyard",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "SHIPYARD_DEFAULT_PAGE_SIZE",
        default_value_t = shipyard_app::rest_api::DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=1000),
        help = "Page size used when request does not specify one"
    )]
    pub default_page_size: u32,

    #[arg(long, env = "SHIPYARD_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("shipyard"))
        .unwrap_or_else(|| PathBuf::from("shipyard"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/shipyard.db", self.data_dir))
    }
}

impl From<&ServerConfig> for shipyard_app::state::AppConfig {
    fn from(config: &ServerConfig) -> Self {
        shipyard_app::state::AppConfig {
            default_page_size: config.default_page_size,
        }
    }
}
