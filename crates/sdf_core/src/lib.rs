//! SDF Core - Simulation schema types and USD stage ingestion.
//!
//! This crate provides:
//!
//! - **Schema types**: `Noise`, `Material` and the `Element` document tree
//!   they are loaded from through `AttributeReader`
//! - **Material translation**: renderer materials to schema materials and back
//! - **USD support**: USDA parsing and multi-document stage aggregation
//!
//! # Example
//!
//! ```ignore
//! use sdf_core::usd::UsdData;
//!
//! let mut data = UsdData::new("scene.usda");
//! let errors = data.init();
//! let (path, stage) = data.find_stage("box");
//! ```

pub mod conversions;
pub mod element;
pub mod error;
pub mod material;
pub mod noise;
pub mod render;
pub mod usd;

// Re-export commonly used types
pub use conversions::{convert, convert_material};
pub use element::{AttributeReader, Element, ElementPtr, FromAttribute};
pub use error::{Error, ErrorCode, Errors};
pub use material::{Pbr, PbrWorkflow, PbrWorkflowType, Workflow};
pub use noise::{Noise, NoiseType};
pub use usd::{DataState, ReferenceEdge, UsdData, UsdDataConfig, UsdStage};
