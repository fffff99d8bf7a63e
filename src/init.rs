//! init command: Create endpoints.yaml template
//!
//! Creates a new endpoints.yaml file with proper structure.

use crate::schema::{Endpoint, RegistryFile};
use crate::store::{new_meta, YamlStore};
use anyhow::{bail, Result};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct InitArgs {
    /// Output file path (default: endpoints.yaml)
    #[arg(short, long, default_value = "endpoints.yaml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub created: String,
    pub file: String,
}

pub async fn run_init(args: InitArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        let error = serde_json::json!({
            "error": "file_exists",
            "message": format!("{} already exists. Use --force to overwrite.", args.output.display()),
            "file": args.output.display().to_string()
        });
        println!("{}", serde_json::to_string(&error)?);
        bail!("File exists");
    }

    let mut example = Endpoint::new(1, 77, "https://example.com/");
    example
        .extra
        .insert("name".into(), serde_yaml::Value::from("Example endpoint"));

    let mut meta = new_meta();
    meta.total_endpoints = 1;

    YamlStore::new(&args.output)
        .write(&RegistryFile {
            meta,
            endpoints: vec![example],
        })
        .await?;

    let output = InitOutput {
        created: Utc::now().to_rfc3339(),
        file: args.output.display().to_string(),
    };
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}
