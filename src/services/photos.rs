use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const CACHE_TTL_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    large: Option<String>,
}

struct CachedPhoto {
    url: String,
    stored_at: DateTime<Utc>,
}

/// Stock photo lookup for dish cards.
pub struct PhotoSearch {
    http: reqwest::Client,
    api_key: Option<String>,
    cache: RwLock<HashMap<String, CachedPhoto>>,
}

impl PhotoSearch {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
            .context("build photo http client")?;
        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Returns `None` when unconfigured, on a miss, or when Pexels fails.
    pub async fn search(&self, dish: &str, diet: &str) -> Option<String> {
        let query = full_query(dish, diet)?;
        let api_key = self.api_key.as_deref()?;
        let key = cache_key(&query);

        if let Some(url) = self.cached(&key, Utc::now()).await {
            return Some(url);
        }

        match self.fetch(&query, api_key).await {
            Ok(Some(url)) => {
                self.store(key, url.clone(), Utc::now()).await;
                Some(url)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(%query, error = %e, "photo search failed");
                None
            }
        }
    }

    async fn cached(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| is_fresh(entry, now))
            .map(|entry| entry.url.clone())
    }

    /// Expired entries are swept on every insert.
    async fn store(&self, key: String, url: String, now: DateTime<Utc>) {
        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| is_fresh(entry, now));
        cache.insert(key, CachedPhoto { url, stored_at: now });
    }

    async fn fetch(&self, query: &str, api_key: &str) -> Result<Option<String>> {
        let resp: SearchResponse = self
            .http
            .get(PEXELS_SEARCH_URL)
            .header("Authorization", api_key)
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.photos.into_iter().next().and_then(|p| p.src.large))
    }
}

fn is_fresh(entry: &CachedPhoto, now: DateTime<Utc>) -> bool {
    now - entry.stored_at < ChronoDuration::days(CACHE_TTL_DAYS)
}

/// Dish name followed by each diet tag, e.g. `"tofu scramble vegan gluten-free"`.
fn full_query(dish: &str, diet: &str) -> Option<String> {
    let dish = dish.trim();
    if dish.is_empty() {
        return None;
    }
    let diet = diet.to_lowercase();
    let mut parts = vec![dish.to_string()];
    parts.extend(
        diet.split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    );
    Some(parts.join(" "))
}

fn cache_key(query: &str) -> String {
    format!("pexels:{:x}", Sha256::digest(query.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_query_appends_diet_tags() {
        assert_eq!(
            full_query(" tofu scramble ", "Vegan, ,gluten-free").as_deref(),
            Some("tofu scramble vegan gluten-free")
        );
        assert_eq!(full_query("salmon", "").as_deref(), Some("salmon"));
        assert_eq!(full_query("   ", "vegan"), None);
    }

    #[test]
    fn test_cache_key_is_stable_hex() {
        let key = cache_key("salmon");
        assert!(key.starts_with("pexels:"));
        assert_eq!(key.len(), "pexels:".len() + 64);
        assert_eq!(key, cache_key("salmon"));
        assert_ne!(key, cache_key("salmon vegan"));
    }

    #[tokio::test]
    async fn test_unconfigured_returns_none() {
        let photos = PhotoSearch::new(Some("  ".into())).unwrap();
        assert_eq!(photos.search("salmon", "").await, None);
    }

    #[tokio::test]
    async fn test_cache_entries_expire() {
        let photos = PhotoSearch::new(Some("key".into())).unwrap();
        let key = cache_key("salmon");
        let stored_at = Utc::now() - ChronoDuration::days(CACHE_TTL_DAYS + 1);
        photos.cache.write().await.insert(
            key.clone(),
            CachedPhoto {
                url: "https://images.example/salmon.jpg".into(),
                stored_at,
            },
        );
        assert_eq!(photos.cached(&key, Utc::now()).await, None);
        assert_eq!(
            photos.cached(&key, stored_at + ChronoDuration::days(1)).await.as_deref(),
            Some("https://images.example/salmon.jpg")
        );
    }

    #[tokio::test]
    async fn test_store_sweeps_expired_entries() {
        let photos = PhotoSearch::new(Some("key".into())).unwrap();
        let now = Utc::now();
        photos.cache.write().await.insert(
            cache_key("stale"),
            CachedPhoto {
                url: "https://images.example/stale.jpg".into(),
                stored_at: now - ChronoDuration::days(CACHE_TTL_DAYS),
            },
        );
        let yesterday = now - ChronoDuration::days(1);
        photos
            .store(cache_key("recent"), "https://images.example/recent.jpg".into(), yesterday)
            .await;
        photos
            .store(cache_key("fresh"), "https://images.example/fresh.jpg".into(), now)
            .await;

        let cache = photos.cache.read().await;
        assert!(!cache.contains_key(&cache_key("stale")));
        assert!(cache.contains_key(&cache_key("recent")));
        assert!(cache.contains_key(&cache_key("fresh")));
        assert_eq!(cache.len(), 2);
    }
}
