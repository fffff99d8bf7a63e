//! Working-set selection for a batch

use crate::classify::ProbeKind;
use crate::schema::Endpoint;
use std::collections::HashSet;

/// Parse a comma-separated region list such as `"77,78"`.
///
/// Malformed input is not an error: it yields `None`, which means every
/// region is probed.
pub fn parse_regions(raw: &str) -> Option<Vec<u32>> {
    let parsed: Result<Vec<u32>, _> = raw.split(',').map(|s| s.trim().parse::<u32>()).collect();

    match parsed {
        Ok(regions) => {
            tracing::info!(regions = raw, "Selected regions");
            Some(regions)
        }
        Err(e) => {
            if !raw.trim().is_empty() {
                tracing::warn!(regions = raw, error = %e, "Ignoring malformed region filter");
            }
            None
        }
    }
}

/// Predicate deciding which endpoints a batch probes
#[derive(Debug, Clone)]
pub struct Selection {
    kind: ProbeKind,
    regions: Option<Vec<u32>>,
    include: Option<HashSet<u32>>,
    exclude: HashSet<u32>,
}

impl Selection {
    /// Default selection for a probe kind.
    ///
    /// Challenge probes skip endpoints already known to have a challenge;
    /// interface probes consider everything.
    pub fn new(kind: ProbeKind) -> Self {
        Self {
            kind,
            regions: None,
            include: None,
            exclude: HashSet::new(),
        }
    }

    /// Restrict to these regions; `None` or an empty list means no filter
    pub fn regions(mut self, regions: Option<Vec<u32>>) -> Self {
        self.regions = regions.filter(|r| !r.is_empty());
        self
    }

    /// Restrict to these ids; an empty set means no filter
    pub fn include_ids(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        let ids: HashSet<u32> = ids.into_iter().collect();
        self.include = if ids.is_empty() { None } else { Some(ids) };
        self
    }

    /// Never probe these ids
    pub fn exclude_ids(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        if self.kind == ProbeKind::Challenge && endpoint.has_challenge {
            return false;
        }
        if self.exclude.contains(&endpoint.id) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.contains(&endpoint.id) {
                return false;
            }
        }
        match &self.regions {
            Some(regions) => regions.contains(&endpoint.region),
            None => true,
        }
    }
}
