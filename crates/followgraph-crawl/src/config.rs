//! Configuration for the followgraph crawler.

use followgraph_twitter::TwitterConfig;
use serde::{Deserialize, Deserializer};

use crate::enrich::DEFAULT_BATCH_SIZE;
use crate::error::{CrawlError, Result};

/// Most ids `users/lookup` accepts in one request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Top-level configuration.
///
/// Loaded from `followgraph.toml` or `FOLLOWGRAPH__` environment variables
/// (e.g. `FOLLOWGRAPH__TWITTER__CONSUMER_KEY`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowgraphConfig {
    #[serde(default)]
    pub twitter: TwitterConfig,

    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// The `[crawl]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed screen names. Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_seeds")]
    pub seeds: Vec<String>,

    /// Ids per profile lookup request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Where the GraphSON document is written.
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_output_path() -> String {
    "followgraph.json".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            batch_size: default_batch_size(),
            output_path: default_output_path(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedList {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_seeds<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match SeedList::deserialize(deserializer)? {
        SeedList::List(list) => list,
        SeedList::Csv(csv) => csv.split(',').map(String::from).collect(),
    };
    Ok(normalize_seeds(raw))
}

/// Trim whitespace and a leading `@`, dropping empty entries.
pub fn normalize_seeds<I, S>(seeds: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    seeds
        .into_iter()
        .map(|s| s.as_ref().trim().trim_start_matches('@').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl FollowgraphConfig {
    /// Load from an optional config file and `FOLLOWGRAPH__` variables.
    pub fn load(file_prefix: &str) -> Result<Self> {
        Self::load_with_env_prefix(file_prefix, "FOLLOWGRAPH")
    }

    /// Environment values stay strings; numeric fields are converted during
    /// deserialization, so all-digit screen names survive as seeds.
    fn load_with_env_prefix(file_prefix: &str, env_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    /// Reject configurations that cannot produce a run.
    pub fn validate(&self) -> Result<()> {
        self.twitter
            .credentials()
            .map_err(|e| CrawlError::Config(e.to_string()))?;
        if self.crawl.seeds.is_empty() {
            return Err(CrawlError::Config(
                "at least one seed required: set crawl.seeds or pass --seed".to_string(),
            ));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.crawl.batch_size) {
            return Err(CrawlError::Config(format!(
                "crawl.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.crawl.batch_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> FollowgraphConfig {
        let mut config = FollowgraphConfig::default();
        config.twitter.bearer_token = "token".to_string();
        config.crawl.seeds = vec!["alice".to_string()];
        config
    }

    #[test]
    fn test_default_config() {
        let config = FollowgraphConfig::default();
        assert_eq!(config.crawl.batch_size, 99);
        assert_eq!(config.crawl.output_path, "followgraph.json");
        assert!(config.crawl.seeds.is_empty());
    }

    #[test]
    fn test_normalize_seeds() {
        let seeds = normalize_seeds([" alice", "@bob ", "", "  "]);
        assert_eq!(seeds, vec!["alice", "bob"]);
    }

    #[test]
    fn test_seeds_accept_csv_string() {
        let crawl: CrawlConfig = serde_json::from_str(r#"{"seeds": "alice, bob,carol"}"#).unwrap();
        assert_eq!(crawl.seeds, vec!["alice", "bob", "carol"]);

        let crawl: CrawlConfig = serde_json::from_str(r#"{"seeds": ["@dave"]}"#).unwrap();
        assert_eq!(crawl.seeds, vec!["dave"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.toml");
        std::fs::write(
            &path,
            r#"
[twitter]
bearer_token = "abc"

[crawl]
seeds = ["alice", "bob"]
batch_size = 50
"#,
        )
        .unwrap();

        let prefix = dir.path().join("crawl");
        let config = FollowgraphConfig::load(prefix.to_str().unwrap()).unwrap();

        assert_eq!(config.twitter.bearer_token, "abc");
        assert_eq!(config.twitter.max_rate_limit_waits, 15);
        assert_eq!(config.twitter.api_base, "https://api.twitter.com/1.1");
        assert_eq!(config.crawl.seeds, vec!["alice", "bob"]);
        assert_eq!(config.crawl.batch_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = FollowgraphConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.crawl.batch_size, 99);
    }

    #[test]
    fn test_load_seeds_and_numbers_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        std::env::set_var("FGSEEDTEST__CRAWL__SEEDS", "12345");
        std::env::set_var("FGSEEDTEST__CRAWL__BATCH_SIZE", "40");
        std::env::set_var("FGSEEDTEST__TWITTER__MAX_RATE_LIMIT_WAITS", "3");

        let config =
            FollowgraphConfig::load_with_env_prefix(prefix.to_str().unwrap(), "FGSEEDTEST")
                .unwrap();

        assert_eq!(config.crawl.seeds, vec!["12345"]);
        assert_eq!(config.crawl.batch_size, 40);
        assert_eq!(config.twitter.max_rate_limit_waits, 3);
    }

    #[test]
    fn test_load_csv_seeds_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        std::env::set_var("FGCSVTEST__CRAWL__SEEDS", "alice, 2024,@bob");

        let config =
            FollowgraphConfig::load_with_env_prefix(prefix.to_str().unwrap(), "FGCSVTEST")
                .unwrap();

        assert_eq!(config.crawl.seeds, vec!["alice", "2024", "bob"]);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = valid();
        config.twitter.bearer_token.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
        assert!(err.to_string().contains("bearer_token"));
    }

    #[test]
    fn test_validate_accepts_oauth_credentials() {
        let mut config = valid();
        config.twitter.bearer_token.clear();
        config.twitter.consumer_key = "ck".to_string();
        config.twitter.consumer_secret = "cs".to_string();
        config.twitter.access_token = "at".to_string();
        config.twitter.access_secret = "as".to_string();
        assert!(config.validate().is_ok());

        config.twitter.access_token.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twitter.access_token"));
    }

    #[test]
    fn test_validate_requires_seeds() {
        let mut config = valid();
        config.crawl.seeds.clear();
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = valid();
        config.crawl.batch_size = 0;
        assert!(config.validate().is_err());
        config.crawl.batch_size = 101;
        assert!(config.validate().is_err());
        config.crawl.batch_size = 100;
        assert!(config.validate().is_ok());
    }
}
