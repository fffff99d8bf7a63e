//! Prober: one fetch, one verdict, one updated record

use crate::classify::{classify, marker_present, ProbeKind};
use crate::client::Fetch;
use crate::error::ProbeError;
use crate::schema::Endpoint;
use url::Url;

/// Browser-like UA; several registries reject anything that looks scripted
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything a probe of one kind needs besides the record and the client
#[derive(Debug, Clone)]
pub struct ProbeSpec {
    pub kind: ProbeKind,
    /// Appended to `base_address` to build the probe address
    pub suffix: String,
    /// Element id whose presence flips the verdict
    pub marker: String,
    pub user_agent: String,
}

impl ProbeSpec {
    pub fn new(kind: ProbeKind, suffix: impl Into<String>) -> Self {
        Self {
            kind,
            suffix: suffix.into(),
            marker: kind.default_marker().to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn address_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", endpoint.base_address, self.suffix)
    }
}

/// Probe one endpoint and return an updated copy.
///
/// No retry: any transport or body error is returned to the coordinator,
/// which drops the record from the batch output.
pub async fn probe<F: Fetch + ?Sized>(
    endpoint: &Endpoint,
    spec: &ProbeSpec,
    fetcher: &F,
) -> Result<Endpoint, ProbeError> {
    let address = spec.address_for(endpoint);
    let url = Url::parse(&address).map_err(|source| ProbeError::InvalidAddress {
        address: address.clone(),
        source,
    })?;

    let response = fetcher.get(&url, &spec.user_agent).await?;
    if !(200..400).contains(&response.status) {
        tracing::warn!(
            id = endpoint.id,
            address = %address,
            status = response.status,
            "Non-success status, classifying body anyway"
        );
    }

    let present = marker_present(&response.body, &spec.marker);
    let update = classify(spec.kind, present);
    tracing::debug!(id = endpoint.id, address = %address, present, ?update, "Classified");

    Ok(update.apply(endpoint))
}
