//! Classification of probe responses into capability flags
//!
//! A probe kind owns exactly one endpoint field. Challenge probes only ever
//! touch `has_challenge`; interface probes only ever touch `strategy`.

use crate::schema::{Endpoint, Strategy};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Which capability a batch is testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Does the search page sit behind a captcha?
    Challenge,
    /// Does the search page need a rendering browser?
    Interface,
}

impl ProbeKind {
    /// Element id whose presence drives classification when none is configured
    pub fn default_marker(self) -> &'static str {
        match self {
            ProbeKind::Challenge => "captcha",
            ProbeKind::Interface => "show-sf",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::Challenge => write!(f, "challenge"),
            ProbeKind::Interface => write!(f, "interface"),
        }
    }
}

/// The single field change a verdict produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    ChallengeFlag(bool),
    Strategy(Strategy),
}

impl FieldUpdate {
    /// Produce a new record with only the owned field replaced
    pub fn apply(self, endpoint: &Endpoint) -> Endpoint {
        let mut updated = endpoint.clone();
        match self {
            FieldUpdate::ChallengeFlag(flag) => updated.has_challenge = flag,
            FieldUpdate::Strategy(strategy) => updated.strategy = strategy,
        }
        updated
    }
}

/// Map a marker verdict to a field update. Pure and total.
pub fn classify(kind: ProbeKind, marker_present: bool) -> FieldUpdate {
    match kind {
        ProbeKind::Challenge => FieldUpdate::ChallengeFlag(marker_present),
        ProbeKind::Interface => FieldUpdate::Strategy(if marker_present {
            Strategy::BrowserAutomation
        } else {
            Strategy::DirectRequest
        }),
    }
}

/// True if any element in the document carries `id="<marker>"`
pub fn marker_present(html: &str, marker: &str) -> bool {
    let doc = Html::parse_document(html);
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().id() == Some(marker))
}
