//! endpoints.yaml schema
//!
//! One entry per monitored site. Probing only ever rewrites `has_challenge`
//! and `strategy`; every other key is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// Root structure for endpoints.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub meta: Meta,
    pub endpoints: Vec<Endpoint>,
}

/// Metadata about the registry file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// ISO date when file was created
    pub created: String,
    /// ISO datetime of last probing run (null if never)
    pub last_probed: Option<String>,
    /// Tool that last wrote the file
    pub tool: String,
    /// Number of endpoints in the file
    pub total_endpoints: usize,
}

/// A single endpoint record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Stable identifier, unique within a registry
    pub id: u32,
    /// Grouping key used by `--regions`
    pub region: u32,
    /// Prefix every probe address is built from
    pub base_address: String,
    /// Set by challenge probes
    #[serde(default)]
    pub has_challenge: bool,
    /// Set by interface probes
    #[serde(default)]
    pub strategy: Strategy,
    /// Fields probing does not own, in file order
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Endpoint {
    pub fn new(id: u32, region: u32, base_address: impl Into<String>) -> Self {
        Self {
            id,
            region,
            base_address: base_address.into(),
            has_challenge: false,
            strategy: Strategy::default(),
            extra: Mapping::new(),
        }
    }
}

/// How future interactions with an endpoint should be carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Plain HTTP requests are enough
    #[default]
    DirectRequest,
    /// The site needs a rendering browser
    BrowserAutomation,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::DirectRequest => write!(f, "direct_request"),
            Strategy::BrowserAutomation => write!(f, "browser_automation"),
        }
    }
}
