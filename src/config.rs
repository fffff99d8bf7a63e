//! probe.yaml configuration
//!
//! Every key is optional. Command-line flags override what the file says.

use crate::classify::ProbeKind;
use crate::client::ProxySettings;
use crate::coordinator::BatchConfig;
use crate::probe::{ProbeSpec, DEFAULT_USER_AGENT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub user_agent: String,
    pub request_timeout_ms: u64,
    /// Defaults to the host CPU count
    pub workers: Option<usize>,
    /// Shut the pool down after this many seconds (unbounded if unset)
    pub max_wait_secs: Option<u64>,
    pub grace_period_secs: u64,
    pub proxy: Option<ProxySettings>,
    /// Comma-separated region filter, e.g. "77,78"
    pub regions: Option<String>,
    pub challenge: KindConfig,
    pub interface: KindConfig,
}

/// Per-kind probe settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KindConfig {
    /// Appended to each endpoint's base address
    pub suffix: String,
    /// Marker element id; the kind's default when unset
    pub marker: Option<String>,
    /// Endpoint ids this kind never probes
    pub exclude: Vec<u32>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: 30_000,
            workers: None,
            max_wait_secs: None,
            grace_period_secs: 60,
            proxy: None,
            regions: None,
            challenge: KindConfig::default(),
            interface: KindConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Load from `path`; a missing file is an error
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn kind(&self, kind: ProbeKind) -> &KindConfig {
        match kind {
            ProbeKind::Challenge => &self.challenge,
            ProbeKind::Interface => &self.interface,
        }
    }

    pub fn probe_spec(&self, kind: ProbeKind) -> ProbeSpec {
        let kind_config = self.kind(kind);
        ProbeSpec {
            kind,
            suffix: kind_config.suffix.clone(),
            marker: kind_config
                .marker
                .clone()
                .unwrap_or_else(|| kind.default_marker().to_string()),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        let defaults = BatchConfig::default();
        BatchConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            max_wait: self.max_wait_secs.map(Duration::from_secs),
            grace_period: Duration::from_secs(self.grace_period_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ProbeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.grace_period_secs, 60);
        assert!(config.proxy.is_none());

        let spec = config.probe_spec(ProbeKind::Challenge);
        assert_eq!(spec.marker, "captcha");
        assert_eq!(spec.suffix, "");
        assert_eq!(spec.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
user_agent: probe/1.0
workers: 3
max_wait_secs: 600
grace_period_secs: 10
proxy:
  host: 10.1.1.1
  port: 3128
regions: "77,78"
challenge:
  suffix: "modules.php?name=sud_delo"
interface:
  suffix: "modules.php?name=sud_delo&srv_num=1"
  marker: rich-ui
  exclude: [2260]
"#;
        let config: ProbeConfig = serde_yaml::from_str(yaml).unwrap();
        let batch = config.batch_config();
        assert_eq!(batch.workers, 3);
        assert_eq!(batch.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(batch.grace_period, Duration::from_secs(10));
        assert_eq!(config.proxy.as_ref().unwrap().port, 3128);

        let spec = config.probe_spec(ProbeKind::Interface);
        assert_eq!(spec.marker, "rich-ui");
        assert_eq!(spec.user_agent, "probe/1.0");
        assert_eq!(config.kind(ProbeKind::Interface).exclude, vec![2260]);
        assert!(config.kind(ProbeKind::Challenge).exclude.is_empty());
    }
}
