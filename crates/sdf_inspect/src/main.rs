//! Inspect a USD document set.
//!
//! Run with: cargo run --bin sdf_inspect -- <path> [--json] [--sequential]

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use sdf_core::material::Material;
use sdf_core::usd::{DataState, ReferenceEdge, StageSummary, UsdData, UsdDataConfig};
use sdf_core::Error;
use serde::Serialize;

/// Everything printed by `--json`.
#[derive(Serialize)]
struct Report<'a> {
    root: &'a Path,
    state: DataState,
    stages: Vec<StageSummary>,
    models: BTreeMap<&'a str, &'a Path>,
    references: Vec<&'a ReferenceEdge>,
    materials: &'a BTreeMap<String, Material>,
    errors: &'a [Error],
}

struct Args {
    path: PathBuf,
    json: bool,
    sequential: bool,
}

fn parse_args() -> Result<Args> {
    let mut path = None;
    let mut json = false;
    let mut sequential = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "--sequential" => sequential = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ if path.is_some() => bail!("Unexpected argument: {}", arg),
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    let Some(path) = path else {
        bail!("Usage: sdf_inspect <path-to-usd-file-or-directory> [--json] [--sequential]");
    };

    Ok(Args {
        path,
        json,
        sequential,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = parse_args()?;

    let config = UsdDataConfig {
        parallel: !args.sequential,
        ..Default::default()
    };
    let mut data = UsdData::with_config(&args.path, config);

    let mut errors = data.init();
    if data.state() == DataState::Ready {
        errors.extend(data.parse_materials());
    }

    if args.json {
        let report = Report {
            root: data.root(),
            state: data.state(),
            stages: data.stages().iter().map(|s| s.summary()).collect(),
            models: data.models().collect(),
            references: data.references().iter().collect(),
            materials: data.materials(),
            errors: &errors,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&data, &errors);
    }

    if data.state() == DataState::Failed {
        bail!("Unable to load {}", args.path.display());
    }

    Ok(())
}

fn print_text(data: &UsdData, errors: &[Error]) {
    println!("=== {} ({:?}) ===", data.root().display(), data.state());

    println!("\n--- Stages ({}) ---", data.stage_count());
    for stage in data.stages() {
        println!("  {}", stage.path.display());
        println!(
            "       upAxis {}, metersPerUnit {}, {} models",
            stage.up_axis,
            stage.meters_per_unit,
            stage.models.len()
        );
    }

    println!("\n--- Models ---");
    for (model, stage) in data.models() {
        println!("  {} -> {}", model, stage.display());
    }

    println!("\n--- References ---");
    for edge in data.references() {
        println!("  {} -> {}", edge.from.display(), edge.to.display());
    }

    println!("\n--- Materials ---");
    for (name, material) in data.materials() {
        let workflow = material
            .pbr
            .as_ref()
            .and_then(|pbr| pbr.workflow_type())
            .map(|kind| format!("{:?}", kind))
            .unwrap_or_else(|| "none".to_string());
        println!("  {} (workflow {}, double sided {})", name, workflow, material.double_sided);
    }

    if !errors.is_empty() {
        println!("\n--- Errors ({}) ---", errors.len());
        for error in errors {
            println!("  {}", error);
        }
    }
}
