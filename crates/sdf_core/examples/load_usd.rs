//! Example: Load a USD document and everything it references.
//!
//! Run with: cargo run --example load_usd -- assets/usd/upAxisZ.usda

use std::env;

use sdf_core::usd::UsdData;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_usd <path-to-usd-file-or-directory>");
        println!("\nExamples:");
        println!("  cargo run --example load_usd -- assets/usd/upAxisZ.usda");
        println!("  cargo run --example load_usd -- assets/usd/references/root.usda");
        return;
    }

    let path = &args[1];
    println!("Loading USD: {}", path);

    let mut data = UsdData::new(path);
    let mut errors = data.init();
    errors.extend(data.parse_materials());

    println!("\n=== Stages: {} ===", data.stage_count());
    for stage in data.stages() {
        println!(
            "  {} (upAxis {}, metersPerUnit {})",
            stage.path.display(),
            stage.up_axis,
            stage.meters_per_unit
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
        println!("  {} (workflow {})", name, workflow);
    }

    if !errors.is_empty() {
        println!("\n--- Errors ---");
        for error in &errors {
            eprintln!("  {}", error);
        }
    }
}
