//! A single parsed USD document and what the aggregator indexes from it.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::error::{Error, ErrorCode};
use crate::usd::parser::{parse_usda, ParseError};
use crate::usd::types::{UpAxis, UsdLayer, UsdMaterial, UsdPrim};

/// USD fallback for `metersPerUnit` when a layer does not author it.
pub const DEFAULT_METERS_PER_UNIT: f64 = 0.01;

/// Prim type that never counts as a model.
const PHYSICS_SCENE: &str = "PhysicsScene";

/// Errors that can occur while opening a stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Unable to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Invalid metadata in '{path}': {message}")]
    InvalidMetadata { path: PathBuf, message: String },
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

impl From<StageError> for Error {
    fn from(err: StageError) -> Self {
        let code = match err {
            StageError::Io { .. } => ErrorCode::DocumentNotFound,
            StageError::Parse { .. } | StageError::InvalidMetadata { .. } => {
                ErrorCode::DocumentUnparsable
            }
        };
        Error::new(code, err.to_string())
    }
}

/// One parsed USD document.
#[derive(Clone, Debug)]
pub struct UsdStage {
    /// Source file, canonicalized when it exists on disk
    pub path: PathBuf,

    pub up_axis: UpAxis,
    pub meters_per_unit: f64,
    pub default_prim: Option<String>,

    /// Top-level defined prims as `/name`, in authored order
    pub models: Vec<String>,

    /// Files this document pulls in through sublayers, references and payloads
    pub references: Vec<PathBuf>,

    /// Root prims of the document
    pub prims: Vec<UsdPrim>,
}

impl UsdStage {
    /// Read and parse a document from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> StageResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::from_usda(path, &content)
    }

    /// Build a stage from in-memory USDA text.
    ///
    /// `path` names the document and anchors its relative references.
    pub fn from_usda(path: impl Into<PathBuf>, content: &str) -> StageResult<Self> {
        let path = path.into();
        let layer = parse_usda(content).map_err(|source| StageError::Parse {
            path: path.clone(),
            source,
        })?;
        Self::from_layer(path, layer)
    }

    fn from_layer(path: PathBuf, layer: UsdLayer) -> StageResult<Self> {
        let meters_per_unit = layer
            .metadata
            .meters_per_unit
            .unwrap_or(DEFAULT_METERS_PER_UNIT);
        if meters_per_unit.is_nan() || meters_per_unit <= 0.0 {
            return Err(StageError::InvalidMetadata {
                path,
                message: format!("metersPerUnit must be positive, got {}", meters_per_unit),
            });
        }

        let mut models: Vec<String> = Vec::new();
        let mut seen_models: HashSet<String> = HashSet::new();
        for prim in &layer.prims {
            if !prim.is_defined() || prim.type_name() == PHYSICS_SCENE {
                continue;
            }
            let model = format!("/{}", prim.name());
            if seen_models.insert(model.clone()) {
                models.push(model);
            }
        }

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut references: Vec<PathBuf> = Vec::new();
        let mut seen_references: HashSet<PathBuf> = HashSet::new();
        let mut add_reference = |asset: &str| {
            let resolved = resolve_asset(&base_dir, asset);
            if resolved != path && seen_references.insert(resolved.clone()) {
                references.push(resolved);
            }
        };

        for sub_layer in &layer.metadata.sub_layers {
            add_reference(sub_layer);
        }
        for prim in &layer.prims {
            prim.walk(&mut |p| {
                for reference in p.references() {
                    add_reference(&reference.asset_path);
                }
            });
        }

        log::debug!(
            "Parsed stage {}: {} models, {} references",
            path.display(),
            models.len(),
            references.len()
        );

        Ok(Self {
            up_axis: layer.metadata.up_axis.unwrap_or_default(),
            meters_per_unit,
            default_prim: layer.metadata.default_prim,
            models,
            references,
            prims: layer.prims,
            path,
        })
    }

    /// Whether `name` (with or without the leading `/`) is a model of this stage.
    pub fn has_model(&self, name: &str) -> bool {
        let name = name.trim_start_matches('/');
        self.models.iter().any(|m| &m[1..] == name)
    }

    /// Every material prim of the document, depth-first.
    pub fn materials(&self) -> Vec<&UsdMaterial> {
        let mut materials = Vec::new();
        for prim in &self.prims {
            prim.walk(&mut |p| {
                if let UsdPrim::Material(material) = p {
                    materials.push(material);
                }
            });
        }
        materials
    }

    /// Serializable view without the prim tree.
    pub fn summary(&self) -> StageSummary {
        StageSummary {
            path: self.path.clone(),
            up_axis: self.up_axis,
            meters_per_unit: self.meters_per_unit,
            default_prim: self.default_prim.clone(),
            models: self.models.clone(),
            references: self.references.clone(),
            materials: self.materials().iter().map(|m| m.name.clone()).collect(),
        }
    }
}

/// Stage metadata suitable for printing or JSON output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageSummary {
    pub path: PathBuf,
    pub up_axis: UpAxis,
    pub meters_per_unit: f64,
    pub default_prim: Option<String>,
    pub models: Vec<String>,
    pub references: Vec<PathBuf>,
    pub materials: Vec<String>,
}

/// Resolve an authored asset path against the referencing document's directory.
///
/// The result is canonicalized when the file exists, otherwise only lexically
/// normalized so that missing files still produce a stable key.
pub fn resolve_asset(base_dir: &Path, asset: &str) -> PathBuf {
    let joined = base_dir.join(asset);
    joined
        .canonicalize()
        .unwrap_or_else(|_| normalize_lexically(&joined))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX_STAGE: &str = r#"#usda 1.0
(
    defaultPrim = "box"
    metersPerUnit = 0.01
    upAxis = "Z"
    subLayers = [@./lights.usda@]
)

def PhysicsScene "physics" {
}

def Xform "box" (
    references = @./parts/lid.usda@</Lid>
) {
    def Cube "geometry" (
        payload = @../shared/bolt.usda@
    ) {
    }
}

def Xform "ground" {
    def Material "Grass" {
    }
}

over "box" {
}
"#;

    #[test]
    fn test_stage_from_usda() {
        let stage = UsdStage::from_usda("/scenes/main.usda", BOX_STAGE).unwrap();

        assert_eq!(stage.up_axis, UpAxis::Z);
        assert_eq!(stage.meters_per_unit, 0.01);
        assert_eq!(stage.default_prim.as_deref(), Some("box"));
        assert_eq!(stage.models, vec!["/box", "/ground"]);
        assert!(stage.has_model("box"));
        assert!(stage.has_model("/ground"));
        assert!(!stage.has_model("physics"));

        assert_eq!(
            stage.references,
            vec![
                PathBuf::from("/scenes/lights.usda"),
                PathBuf::from("/scenes/parts/lid.usda"),
                PathBuf::from("/shared/bolt.usda"),
            ]
        );

        let materials = stage.materials();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].path, "/ground/Grass");
    }

    #[test]
    fn test_stage_fallback_metadata() {
        let stage = UsdStage::from_usda("/tmp/plain.usda", "def Xform \"a\" {\n}\n").unwrap();
        assert_eq!(stage.up_axis, UpAxis::Y);
        assert_eq!(stage.meters_per_unit, DEFAULT_METERS_PER_UNIT);
        assert!(stage.references.is_empty());
    }

    #[test]
    fn test_duplicates_keep_first_order() {
        let usda = r#"
def Xform "b" (
    references = [@./x.usda@, @./y.usda@, @./x.usda@]
) {
}

def Xform "a" (
    payload = @./y.usda@
) {
}

def Xform "b" {
}
"#;
        let stage = UsdStage::from_usda("/tmp/dups.usda", usda).unwrap();
        assert_eq!(stage.models, vec!["/b", "/a"]);
        assert_eq!(
            stage.references,
            vec![PathBuf::from("/tmp/x.usda"), PathBuf::from("/tmp/y.usda")]
        );
    }

    #[test]
    fn test_self_reference_is_dropped() {
        let usda = "def Xform \"a\" (\n    references = @./self.usda@\n) {\n}\n";
        let stage = UsdStage::from_usda("/tmp/self.usda", usda).unwrap();
        assert!(stage.references.is_empty());
    }

    #[test]
    fn test_non_positive_meters_per_unit() {
        let usda = "#usda 1.0\n(\n    metersPerUnit = 0\n)\n";
        let err = UsdStage::from_usda("/tmp/zero.usda", usda).unwrap_err();
        assert!(matches!(err, StageError::InvalidMetadata { .. }));

        let error: Error = err.into();
        assert_eq!(error.code, ErrorCode::DocumentUnparsable);
    }

    #[test]
    fn test_open_missing_file() {
        let err = UsdStage::open("/nonexistent/stage.usda").unwrap_err();
        let error: Error = err.into();
        assert_eq!(error.code, ErrorCode::DocumentNotFound);
        assert!(error.message.contains("stage.usda"));
    }

    #[test]
    fn test_summary() {
        let stage = UsdStage::from_usda("/scenes/main.usda", BOX_STAGE).unwrap();
        let summary = stage.summary();
        assert_eq!(summary.models, stage.models);
        assert_eq!(summary.materials, vec!["Grass"]);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/./../c/d.usda")),
            PathBuf::from("/a/c/d.usda")
        );
    }
}
