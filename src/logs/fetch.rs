use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use time::Date;

use crate::Config;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

// The log host rejects requests without a browser-looking agent.
const AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One external retrieval of a single calendar day's log text. Behind a
/// trait so the aggregation engine can be driven without a network.
#[async_trait]
pub trait DayFetch: Send + Sync {
    async fn fetch_day(&self, date: Date) -> anyhow::Result<String>;
}

pub struct HttpLogSource {
    http: reqwest::Client,
    base_url: String,
    channel: String,
}

impl HttpLogSource {
    pub fn new(http: reqwest::Client, config: &Arc<Config>) -> Self {
        Self {
            http,
            base_url: config.logs_base_url.clone(),
            channel: config.channel.clone(),
        }
    }
}

#[async_trait]
impl DayFetch for HttpLogSource {
    async fn fetch_day(&self, date: Date) -> anyhow::Result<String> {
        // Month and day are deliberately unpadded; the log host redirects
        // padded forms but serves unpadded ones directly.
        let url = format!(
            "{}/channel/{}/{}/{}/{}",
            self.base_url,
            self.channel,
            date.year(),
            date.month() as u8,
            date.day()
        );

        let text = self
            .http
            .get(&url)
            .header(USER_AGENT, AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }
}
