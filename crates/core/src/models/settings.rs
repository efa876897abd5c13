use serde::{Deserialize, Serialize};

/// Connection settings for the remote rate API and the local history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the exchange-rate API, without a trailing slash.
    pub api_base_url: String,

    /// Provider API key, attached to every request as a query parameter.
    pub api_key: String,

    /// SQLite database URL for the conversion history.
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.exchangeratesapi.io/v1".to_string(),
            api_key: String::new(),
            database_url: "sqlite://exchange_history.db".to_string(),
        }
    }
}
