use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{AppState, Config};

pub type BadgeMap = HashMap<String, HashMap<String, String>>;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One badge set as the upstream service describes it.
#[derive(Debug, Deserialize)]
pub struct BadgeSet {
    pub set_id: String,
    pub versions: Vec<BadgeVersion>,
}

#[derive(Debug, Deserialize)]
pub struct BadgeVersion {
    pub id: String,
    #[serde(alias = "image_url_1x")]
    pub image_url: String,
}

/// Upstream supplying the global and channel badge collections. Behind a
/// trait so the cache semantics can be driven without a network.
#[async_trait]
pub trait BadgeSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<(Vec<BadgeSet>, Vec<BadgeSet>)>;
}

pub struct HttpBadgeSource {
    http: reqwest::Client,
    base_url: String,
    channel_id: String,
}

impl HttpBadgeSource {
    pub fn new(http: reqwest::Client, config: &Arc<Config>) -> Self {
        Self {
            http,
            base_url: config.badges_base_url.clone(),
            channel_id: config.channel_id.clone(),
        }
    }
}

#[async_trait]
impl BadgeSource for HttpBadgeSource {
    async fn fetch(&self) -> anyhow::Result<(Vec<BadgeSet>, Vec<BadgeSet>)> {
        let global_url = format!("{}/badges/global", self.base_url);
        let channel_url = format!("{}/badges/channel?id={}", self.base_url, self.channel_id);

        tokio::try_join!(
            fetch_sets(&self.http, &global_url),
            fetch_sets(&self.http, &channel_url)
        )
    }
}

async fn fetch_sets(http: &reqwest::Client, url: &str) -> anyhow::Result<Vec<BadgeSet>> {
    let sets = http
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(sets)
}

/// Process-wide fetch-once badge mapping. A failed fetch hands back an
/// empty map without filling the cache, so a later call retries. Two
/// concurrent first-callers may both fetch; both see the same merge result.
#[derive(Clone, Default)]
pub struct BadgeCache {
    inner: Arc<RwLock<Option<BadgeMap>>>,
}

impl BadgeCache {
    pub async fn get_or_fetch<S: BadgeSource>(&self, source: &S) -> BadgeMap {
        if let Some(map) = self.inner.read().await.as_ref() {
            return map.clone();
        }

        match source.fetch().await {
            Ok((global, channel)) => {
                let map = merge_badges(global, channel);
                info!("badge cache populated with {} badge sets", map.len());
                *self.inner.write().await = Some(map.clone());
                map
            }
            Err(err) => {
                warn!("failed to fetch badges: {err}");
                BadgeMap::new()
            }
        }
    }

    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}

/// Channel sets fully replace a global set of the same id; versions are
/// never merged across the two sources.
pub fn merge_badges(global: Vec<BadgeSet>, channel: Vec<BadgeSet>) -> BadgeMap {
    let mut map = BadgeMap::new();
    for set in global.into_iter().chain(channel) {
        map.insert(
            set.set_id,
            set.versions
                .into_iter()
                .map(|v| (v.id, v.image_url))
                .collect(),
        );
    }
    map
}

#[debug_handler]
pub async fn mapping(State(state): State<AppState>) -> Json<BadgeMap> {
    let source = HttpBadgeSource::new(state.http.clone(), &state.config);
    Json(state.badges.get_or_fetch(&source).await)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn set(set_id: &str, versions: &[(&str, &str)]) -> BadgeSet {
        BadgeSet {
            set_id: set_id.to_owned(),
            versions: versions
                .iter()
                .map(|(id, url)| BadgeVersion {
                    id: (*id).to_owned(),
                    image_url: (*url).to_owned(),
                })
                .collect(),
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BadgeSource for FailingSource {
        async fn fetch(&self) -> anyhow::Result<(Vec<BadgeSet>, Vec<BadgeSet>)> {
            Err(anyhow::anyhow!("upstream down"))
        }
    }

    /// Serves one subscriber set per side and counts how often it is hit.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BadgeSource for CountingSource {
        async fn fetch(&self) -> anyhow::Result<(Vec<BadgeSet>, Vec<BadgeSet>)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((
                vec![set("subscriber", &[("1", "G")])],
                vec![set("subscriber", &[("1", "C")])],
            ))
        }
    }

    #[test]
    fn channel_set_fully_overrides_global() {
        let global = vec![set("subscriber", &[("1", "G"), ("2", "G2")])];
        let channel = vec![set("subscriber", &[("1", "C")])];

        let map = merge_badges(global, channel);
        assert_eq!(map["subscriber"]["1"], "C");
        // the whole global set is replaced, not merged into
        assert!(!map["subscriber"].contains_key("2"));
    }

    #[test]
    fn disjoint_sets_coexist() {
        let global = vec![set("moderator", &[("1", "M")])];
        let channel = vec![set("subscriber", &[("12", "S")])];

        let map = merge_badges(global, channel);
        assert_eq!(map.len(), 2);
        assert_eq!(map["moderator"]["1"], "M");
        assert_eq!(map["subscriber"]["12"], "S");
    }

    #[test]
    fn upstream_payload_shape_parses() {
        let raw = r#"[{"set_id":"subscriber","versions":[{"id":"1","image_url_1x":"https://img/1"}]}]"#;
        let sets: Vec<BadgeSet> = serde_json::from_str(raw).unwrap();
        assert_eq!(sets[0].versions[0].image_url, "https://img/1");
    }

    #[tokio::test]
    async fn failed_fetch_is_empty_and_does_not_poison_the_cache() {
        let cache = BadgeCache::default();

        assert!(cache.get_or_fetch(&FailingSource).await.is_empty());
        assert!(cache.inner.read().await.is_none());

        // a later call against a healthy upstream still populates
        let source = CountingSource::default();
        let map = cache.get_or_fetch(&source).await;
        assert_eq!(map["subscriber"]["1"], "C");
        assert!(cache.inner.read().await.is_some());
    }

    #[tokio::test]
    async fn populated_cache_never_refetches() {
        let cache = BadgeCache::default();
        let source = CountingSource::default();

        let first = cache.get_or_fetch(&source).await;
        let second = cache.get_or_fetch(&source).await;

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_the_next_call_to_fetch() {
        let cache = BadgeCache::default();
        let source = CountingSource::default();

        cache.get_or_fetch(&source).await;
        cache.invalidate().await;
        assert!(cache.inner.read().await.is_none());

        cache.get_or_fetch(&source).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
