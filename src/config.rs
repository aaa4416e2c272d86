use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use validator::Validate;

use crate::domain::ingress::IngressSettings;

pub const DEFAULT_ANNOTATION_KEY: &str = "auto-ingress";
pub const DEFAULT_ENTRYPOINTS: &str = "web";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_RESYNC_SECS: u64 = 300;
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 30;

/// Runtime configuration, read from `AUTO_INGRESS_*` environment variables
/// (after `.env` has been loaded by `dotenvy`).
#[derive(Debug, Clone, Validate)]
pub struct OperatorConfig {
    /// Service annotation that requests an Ingress
    #[validate(length(min = 1, max = 253))]
    pub annotation_key: String,

    /// Value of `traefik.ingress.kubernetes.io/router.entrypoints`
    #[validate(length(min = 1))]
    pub entrypoints: String,

    /// Optional `spec.ingressClassName` for generated Ingresses
    #[validate(length(min = 1, max = 253))]
    pub ingress_class: Option<String>,

    /// Restrict the watch to one namespace (all namespaces when unset)
    #[validate(length(min = 1, max = 63))]
    pub watch_namespace: Option<String>,

    #[validate(range(min = 1))]
    pub resync_secs: u64,

    #[validate(range(min = 1))]
    pub error_requeue_secs: u64,

    pub http_addr: SocketAddr,

    /// Directory for the daily-rolling log file; console only when unset
    pub log_dir: Option<String>,

    /// Plan every Service once, log the result and exit without writing
    pub debug_mode: bool,
}

impl OperatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_addr = get("AUTO_INGRESS_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());

        let config = Self {
            annotation_key: get("AUTO_INGRESS_ANNOTATION")
                .unwrap_or_else(|| DEFAULT_ANNOTATION_KEY.to_string()),
            entrypoints: get("AUTO_INGRESS_ENTRYPOINTS")
                .unwrap_or_else(|| DEFAULT_ENTRYPOINTS.to_string()),
            ingress_class: get("AUTO_INGRESS_CLASS"),
            watch_namespace: get("AUTO_INGRESS_WATCH_NAMESPACE"),
            resync_secs: parse_secs(get("AUTO_INGRESS_RESYNC_SECS"), DEFAULT_RESYNC_SECS)
                .context("AUTO_INGRESS_RESYNC_SECS")?,
            error_requeue_secs: parse_secs(
                get("AUTO_INGRESS_ERROR_REQUEUE_SECS"),
                DEFAULT_ERROR_REQUEUE_SECS,
            )
            .context("AUTO_INGRESS_ERROR_REQUEUE_SECS")?,
            http_addr: http_addr
                .parse()
                .with_context(|| format!("AUTO_INGRESS_HTTP_ADDR is not a socket address: {http_addr}"))?,
            log_dir: get("AUTO_INGRESS_LOG_DIR"),
            debug_mode: get("AUTO_INGRESS_DEBUG_MODE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        config
            .validate()
            .map_err(|e| anyhow!("invalid operator configuration: {e}"))?;

        Ok(config)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_secs)
    }

    pub fn error_requeue_interval(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }

    pub fn ingress_settings(&self) -> IngressSettings {
        IngressSettings {
            annotation_key: self.annotation_key.clone(),
            entrypoints: self.entrypoints.clone(),
            ingress_class: self.ingress_class.clone(),
        }
    }

    /// Human readable watch scope, used in logs and the status endpoint.
    pub fn watch_scope(&self) -> String {
        self.watch_namespace
            .clone()
            .unwrap_or_else(|| "<all namespaces>".to_string())
    }
}

fn parse_secs(raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("expected a number of seconds, got '{v}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OperatorConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.annotation_key, "auto-ingress");
        assert_eq!(config.entrypoints, "web");
        assert_eq!(config.ingress_class, None);
        assert_eq!(config.watch_namespace, None);
        assert_eq!(config.resync_interval(), Duration::from_secs(300));
        assert_eq!(config.error_requeue_interval(), Duration::from_secs(30));
        assert_eq!(config.http_addr.port(), 8080);
        assert!(!config.debug_mode);
        assert_eq!(config.watch_scope(), "<all namespaces>");
    }

    #[test]
    fn test_overrides() {
        let config = OperatorConfig::from_lookup(lookup_from(&[
            ("AUTO_INGRESS_ANNOTATION", "example.com/expose"),
            ("AUTO_INGRESS_ENTRYPOINTS", "websecure"),
            ("AUTO_INGRESS_CLASS", "traefik"),
            ("AUTO_INGRESS_WATCH_NAMESPACE", "apps"),
            ("AUTO_INGRESS_RESYNC_SECS", "60"),
            ("AUTO_INGRESS_HTTP_ADDR", "127.0.0.1:9000"),
            ("AUTO_INGRESS_DEBUG_MODE", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.annotation_key, "example.com/expose");
        assert_eq!(config.entrypoints, "websecure");
        assert_eq!(config.ingress_class.as_deref(), Some("traefik"));
        assert_eq!(config.watch_scope(), "apps");
        assert_eq!(config.resync_secs, 60);
        assert_eq!(config.http_addr.to_string(), "127.0.0.1:9000");
        assert!(config.debug_mode);

        let settings = config.ingress_settings();
        assert_eq!(settings.annotation_key, "example.com/expose");
        assert_eq!(settings.ingress_class.as_deref(), Some("traefik"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = OperatorConfig::from_lookup(lookup_from(&[
            ("AUTO_INGRESS_ANNOTATION", ""),
            ("AUTO_INGRESS_WATCH_NAMESPACE", "  "),
        ]))
        .unwrap();
        assert_eq!(config.annotation_key, "auto-ingress");
        assert_eq!(config.watch_namespace, None);
    }

    #[test]
    fn test_rejects_bad_numbers_and_zero_intervals() {
        assert!(OperatorConfig::from_lookup(lookup_from(&[("AUTO_INGRESS_RESYNC_SECS", "soon")])).is_err());
        assert!(OperatorConfig::from_lookup(lookup_from(&[("AUTO_INGRESS_ERROR_REQUEUE_SECS", "0")])).is_err());
        assert!(OperatorConfig::from_lookup(lookup_from(&[("AUTO_INGRESS_HTTP_ADDR", "nowhere")])).is_err());
    }
}
