//! site-probe: bulk capability probing for endpoint registries
//!
//! Commands:
//! - challenge: Detect which endpoints sit behind a captcha
//! - interface: Detect which endpoints need browser automation
//! - init: Create an endpoints.yaml template

pub mod check;
pub mod classify;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod init;
pub mod probe;
pub mod progress;
pub mod schema;
pub mod select;
pub mod store;

pub use classify::{classify, FieldUpdate, ProbeKind};
pub use client::{ClientProvider, Fetch, FetchResponse, HttpClient, ProxySettings};
pub use config::ProbeConfig;
pub use coordinator::{run_batch, BatchConfig, BatchReport, ProbeFailure, TaskOutcome};
pub use error::ProbeError;
pub use probe::{probe, ProbeSpec};
pub use schema::{Endpoint, RegistryFile, Strategy};
pub use select::{parse_regions, Selection};
pub use store::{MemoryStore, RecordStore, YamlStore};
