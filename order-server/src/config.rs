use std::path::PathBuf;

use eyre::WrapErr;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) port: u16,
    pub(crate) database_url: String,
    pub(crate) data_dir: PathBuf,
    /// Pricing JSON to use instead of the built-in table.
    pub(crate) pricing_config_path: Option<PathBuf>,
}

impl Config {
    pub(crate) fn from_env() -> eyre::Result<Self> {
        let port = std::env::var("BOOST_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .wrap_err("BOOST_PORT must be a valid u16")?;
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/boost.sqlite3".to_string());
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let pricing_config_path = std::env::var("PRICING_CONFIG_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            database_url,
            data_dir: PathBuf::from(data_dir),
            pricing_config_path,
        })
    }
}
