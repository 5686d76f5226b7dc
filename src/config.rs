use std::fmt::Display;
use std::str::FromStr;

use tracing::info;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Channel whose chat is ingested and whose logs are searched.
    pub channel: String,
    /// Stable platform id of the channel, for the badge service.
    pub channel_id: String,
    pub logs_base_url: String,
    pub badges_base_url: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            database_url: try_load("DATABASE_URL", "sqlite://whosaidit.db"),
            channel: try_load("CHAT_CHANNEL", "zoil"),
            channel_id: try_load("CHAT_CHANNEL_ID", "95304188"),
            logs_base_url: try_load("LOGS_BASE_URL", "https://logs.ivr.fi"),
            badges_base_url: try_load("BADGES_BASE_URL", "https://api.ivr.fi/v2/twitch"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    dotenv::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_owned()
        })
        .parse()
        .unwrap_or_else(|e| panic!("invalid {key}: {e}"))
}
