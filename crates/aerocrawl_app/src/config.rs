//! RON configuration for a crawl run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "aerocrawl.ron";

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Site index the category anchors are resolved against.
    pub start_url: String,
    /// Category names to crawl, in output order.
    pub categories: Vec<String>,
    /// Header labels applied to every section.
    pub columns: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub with_persistence: bool,
    #[serde(default)]
    pub with_geocoding: bool,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            timeout_secs: default_geocoder_timeout_secs(),
        }
    }
}

impl CrawlConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load(path: &Path) -> anyhow::Result<CrawlConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    let config: CrawlConfig = ron::from_str(&text)
        .with_context(|| format!("parsing configuration at {}", path.display()))?;

    if config.categories.is_empty() {
        anyhow::bail!("configuration lists no categories to crawl");
    }
    if config.columns.is_empty() {
        anyhow::bail!("configuration lists no output columns");
    }
    if config.queue_capacity == 0 {
        anyhow::bail!("queue_capacity must be at least 1");
    }

    Ok(config)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./harvest")
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    64
}

fn default_publish_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoder_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use tempfile::TempDir;

    fn write_config(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("aerocrawl.ron");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"(
                start_url: "http://catalog.test/",
                categories: ["US", "FR"],
                columns: ["Region", "Name"],
            )"#,
        );

        let config = super::load(&path).unwrap();
        assert_eq!(config.start_url, "http://catalog.test/");
        assert_eq!(config.categories, vec!["US", "FR"]);
        assert_eq!(config.output_dir, PathBuf::from("./harvest"));
        assert!(config.with_persistence);
        assert!(!config.with_geocoding);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.publish_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(90));
        assert_eq!(
            config.geocoder.base_url,
            "https://nominatim.openstreetmap.org"
        );
    }

    #[test]
    fn overrides_are_honored() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"(
                start_url: "http://catalog.test/",
                categories: ["US"],
                columns: ["Region"],
                output_dir: "/tmp/out",
                with_persistence: false,
                with_geocoding: true,
                geocoder: ( base_url: "http://geo.test", timeout_secs: 5 ),
                queue_capacity: 8,
                publish_timeout_secs: 10,
                request_timeout_secs: 20,
            )"#,
        );

        let config = super::load(&path).unwrap();
        assert!(!config.with_persistence);
        assert!(config.with_geocoding);
        assert_eq!(config.geocoder.base_url, "http://geo.test");
        assert_eq!(config.geocoder.timeout_secs, 5);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.publish_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn empty_categories_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"(
                start_url: "http://catalog.test/",
                categories: [],
                columns: ["Region"],
            )"#,
        );
        assert!(super::load(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(super::load(&temp.path().join("nope.ron")).is_err());
    }

    #[test]
    fn malformed_ron_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "this is not ron");
        assert!(super::load(&path).is_err());
    }
}
