//! USD (Universal Scene Description) support.
//!
//! This module parses USDA (ASCII) documents and aggregates them into an
//! index of stages, models, references and materials.
//!
//! ## Supported USD Features
//!
//! - Layer metadata: `upAxis`, `metersPerUnit`, `defaultPrim`, `subLayers`
//! - Composition arcs: `references` and `payload` (followed, not composed)
//! - `UsdShadeMaterial` networks driven by `UsdPreviewSurface`
//!
//! ## Not Yet Supported
//!
//! - Binary `.usdc` format
//! - Variants, inherits and specializes
//! - Geometry and transforms (prims are indexed by name only)
//!
//! # Example
//!
//! ```ignore
//! use sdf_core::usd::UsdData;
//!
//! let mut data = UsdData::new("scene.usda");
//! let errors = data.init();
//! println!("Loaded {} stages ({} errors)", data.stage_count(), errors.len());
//! ```

mod types;
mod parser;
mod stage;
mod shade;
mod data;

pub use types::*;
pub use parser::*;
pub use stage::*;
pub use shade::*;
pub use data::*;
