//! challenge / interface commands: Re-classify endpoints in endpoints.yaml
//!
//! Probes the selected endpoints, merges the verdicts back and replaces the
//! registry. LLM-optimized output - JSON compact only on stdout, progress and
//! logs on stderr.

use crate::classify::ProbeKind;
use crate::client::{ClientProvider, ProxySettings};
use crate::config::ProbeConfig;
use crate::coordinator::{run_batch, ProbeFailure};
use crate::schema::Endpoint;
use crate::select::{parse_regions, Selection};
use crate::store::{RecordStore, YamlStore};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct CheckArgs {
    /// Path to endpoints.yaml
    pub file: PathBuf,

    /// Probe configuration file (YAML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Comma-separated regions to probe, e.g. "77,78" (malformed input probes all)
    #[arg(long)]
    pub regions: Option<String>,

    /// Only probe these endpoint ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<u32>,

    /// Never probe these endpoint ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<u32>,

    /// Parallel probes (default: number of CPUs)
    #[arg(long, short, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub workers: Option<u16>,

    /// Timeout per request in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Shut the worker pool down after this many seconds
    #[arg(long)]
    pub max_wait: Option<u64>,

    /// Upstream proxy host
    #[arg(long, requires = "proxy_port")]
    pub proxy_host: Option<String>,

    /// Upstream proxy port
    #[arg(long, requires = "proxy_host")]
    pub proxy_port: Option<u16>,

    /// Dry run - don't write changes back to file
    #[arg(long)]
    pub dry_run: bool,
}

/// Output for JSON
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub kind: ProbeKind,
    pub file: String,
    pub total: usize,
    pub selected: usize,
    pub ok: usize,
    pub failed: usize,
    pub changed: usize,
    pub written: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ProbeFailure>,
}

pub async fn run_check(kind: ProbeKind, args: CheckArgs) -> Result<()> {
    let config = load_config(&args).await?;
    let store = YamlStore::new(&args.file);
    let endpoints = store.load_all().await?;

    let selection = Selection::new(kind)
        .regions(config.regions.as_deref().and_then(parse_regions))
        .include_ids(args.ids.iter().copied())
        .exclude_ids(
            config
                .kind(kind)
                .exclude
                .iter()
                .chain(&args.exclude)
                .copied(),
        );

    let selected = endpoints.iter().filter(|e| selection.matches(e)).count();
    eprintln!(
        "Loaded {} endpoints from {}",
        endpoints.len(),
        args.file.display()
    );

    if selected == 0 {
        eprintln!("No endpoints to probe (all filtered out)");
        let output = CheckOutput {
            kind,
            file: args.file.display().to_string(),
            total: endpoints.len(),
            selected: 0,
            ok: 0,
            failed: 0,
            changed: 0,
            written: false,
            timestamp: Utc::now().to_rfc3339(),
            failures: Vec::new(),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let batch = config.batch_config();
    eprintln!(
        "Probing {} endpoints for {} ({} parallel)...",
        selected, kind, batch.workers
    );

    let spec = config.probe_spec(kind);
    let client = ClientProvider::new(config.request_timeout())
        .client(config.proxy.as_ref())
        .context("Failed to build HTTP client")?;

    let report = run_batch(
        &endpoints,
        |e| selection.matches(e),
        &spec,
        Arc::new(client),
        &batch,
        std::io::stderr(),
    )
    .await;

    let changed = count_changed(&endpoints, &report.records);

    if !report.failures.is_empty() {
        tracing::warn!(
            dropped = report.failures.len(),
            "Failed endpoints are left out of the merged registry"
        );
    }

    let ok = report.succeeded();
    let failed = report.failures.len();

    if !args.dry_run {
        store.replace_all(report.records).await?;
        eprintln!("Updated {}", args.file.display());
    } else {
        eprintln!("Dry run - file not modified");
    }

    let output = CheckOutput {
        kind,
        file: args.file.display().to_string(),
        total: endpoints.len(),
        selected: report.total,
        ok,
        failed,
        changed,
        written: !args.dry_run,
        timestamp: Utc::now().to_rfc3339(),
        failures: report.failures,
    };
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}

async fn load_config(args: &CheckArgs) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path).await?,
        None => ProbeConfig::default(),
    };

    if let Some(regions) = &args.regions {
        config.regions = Some(regions.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers as usize);
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_ms = timeout;
    }
    if let Some(max_wait) = args.max_wait {
        config.max_wait_secs = Some(max_wait);
    }
    if let (Some(host), Some(port)) = (&args.proxy_host, args.proxy_port) {
        config.proxy = Some(ProxySettings {
            host: host.clone(),
            port,
        });
    }

    Ok(config)
}

/// Records whose contents differ from the pre-batch snapshot
fn count_changed(before: &[Endpoint], after: &[Endpoint]) -> usize {
    let originals: HashMap<u32, &Endpoint> = before.iter().map(|e| (e.id, e)).collect();
    after
        .iter()
        .filter(|e| originals.get(&e.id).is_some_and(|orig| *orig != *e))
        .count()
}
