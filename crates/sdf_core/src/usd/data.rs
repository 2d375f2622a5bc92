//! Aggregated view over a set of USD documents.
//!
//! [`UsdData`] starts from a root file (or a directory of files), follows
//! every sublayer, reference and payload it can reach, and indexes what it
//! found:
//!
//! - a stage table, one [`UsdStage`] per document, keyed by canonical path
//! - the reference graph as [`ReferenceEdge`]s
//! - a model index from `/name` to the stage defining it
//! - schema materials, built on demand by [`UsdData::parse_materials`]
//!
//! Documents are visited breadth-first with a visited set, so reference
//! cycles terminate. Each frontier level can be parsed in parallel; results
//! are merged in frontier order, which keeps "first discovery wins"
//! deterministic.
//!
//! # Example
//!
//! ```ignore
//! use sdf_core::usd::UsdData;
//!
//! let mut data = UsdData::new("scenes/warehouse.usda");
//! let errors = data.init();
//! let (path, stage) = data.find_stage("forklift");
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::conversions;
use crate::error::{Error, ErrorCode, Errors};
use crate::material;
use crate::usd::shade;
use crate::usd::stage::{StageResult, UsdStage};

/// Options for building a [`UsdData`].
#[derive(Clone, Debug)]
pub struct UsdDataConfig {
    /// Parse each breadth-first level with rayon
    pub parallel: bool,

    /// File extensions picked up when the root is a directory
    pub extensions: Vec<String>,
}

impl Default for UsdDataConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            extensions: vec!["usda".to_string(), "usd".to_string()],
        }
    }
}

/// Lifecycle of a [`UsdData`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DataState {
    #[default]
    Uninitialized,
    Ready,
    Failed,
}

/// A directed composition link: `from` pulls in `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReferenceEdge {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Stage aggregator.
pub struct UsdData {
    root: PathBuf,
    config: UsdDataConfig,
    state: DataState,

    /// Stage arena, in discovery order
    stages: Vec<UsdStage>,
    stage_index: HashMap<PathBuf, usize>,

    references: BTreeSet<ReferenceEdge>,

    /// Model path (`/name`) to stage index
    models: BTreeMap<String, usize>,

    materials: BTreeMap<String, material::Material>,
}

impl UsdData {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_config(root, UsdDataConfig::default())
    }

    pub fn with_config<P: Into<PathBuf>>(root: P, config: UsdDataConfig) -> Self {
        Self {
            root: root.into(),
            config,
            state: DataState::Uninitialized,
            stages: Vec::new(),
            stage_index: HashMap::new(),
            references: BTreeSet::new(),
            models: BTreeMap::new(),
            materials: BTreeMap::new(),
        }
    }

    /// Load every document reachable from the root.
    ///
    /// Calling this again discards the previous indices and rebuilds them.
    /// Documents that fail to load are reported and skipped; the data is only
    /// `Failed` when the root itself cannot be resolved or none of the seed
    /// documents could be parsed.
    pub fn init(&mut self) -> Errors {
        self.clear();
        let mut errors = Errors::new();

        let seeds = match self.seeds() {
            Ok(seeds) => seeds,
            Err(err) => {
                log::warn!("{}", err);
                errors.push(err);
                self.state = DataState::Failed;
                return errors;
            }
        };

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut frontier: Vec<PathBuf> = seeds
            .into_iter()
            .filter(|seed| visited.insert(seed.clone()))
            .collect();
        let mut seed_level = true;
        let mut seeds_loaded = 0;

        while !frontier.is_empty() {
            let results: Vec<StageResult<UsdStage>> = if self.config.parallel {
                frontier.par_iter().map(UsdStage::open).collect()
            } else {
                frontier.iter().map(UsdStage::open).collect()
            };

            let mut next = Vec::new();
            for result in results {
                let stage = match result {
                    Ok(stage) => stage,
                    Err(err) => {
                        log::warn!("{}", err);
                        errors.push(err.into());
                        continue;
                    }
                };

                if seed_level {
                    seeds_loaded += 1;
                }

                for reference in &stage.references {
                    self.references.insert(ReferenceEdge {
                        from: stage.path.clone(),
                        to: reference.clone(),
                    });
                    if visited.insert(reference.clone()) {
                        next.push(reference.clone());
                    }
                }

                self.add_stage(stage);
            }

            frontier = next;
            seed_level = false;
        }

        if seeds_loaded == 0 {
            self.clear();
            self.state = DataState::Failed;
        } else {
            self.state = DataState::Ready;
        }

        log::info!(
            "Loaded {} stages, {} models, {} references from {} ({} errors)",
            self.stages.len(),
            self.models.len(),
            self.references.len(),
            self.root.display(),
            errors.len()
        );

        errors
    }

    /// Build schema materials from every material prim of every stage.
    ///
    /// Materials are keyed by prim name; the first one found wins. The map is
    /// replaced on each call.
    pub fn parse_materials(&mut self) -> Errors {
        if self.state != DataState::Ready {
            return vec![Error::new(
                ErrorCode::NotInitialized,
                format!("Materials requested before '{}' was initialized", self.root.display()),
            )];
        }

        let mut errors = Errors::new();
        let mut materials = BTreeMap::new();

        for stage in &self.stages {
            for usd_material in stage.materials() {
                if materials.contains_key(&usd_material.name) {
                    log::debug!(
                        "Material {} in {} already defined, skipping",
                        usd_material.name,
                        stage.path.display()
                    );
                    continue;
                }

                let (render_material, mut material_errors) = shade::parse_material(usd_material);
                errors.append(&mut material_errors);
                materials.insert(
                    usd_material.name.clone(),
                    conversions::convert(&render_material),
                );
            }
        }

        log::info!("Parsed {} materials", materials.len());
        self.materials = materials;
        errors
    }

    /// Find the stage defining a model.
    ///
    /// Accepts `box` or `/box`. Returns an empty path and `None` when no stage
    /// defines it.
    pub fn find_stage(&self, name: &str) -> (PathBuf, Option<&UsdStage>) {
        let key = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/{}", name)
        };

        match self.models.get(&key).map(|&i| &self.stages[i]) {
            Some(stage) => (stage.path.clone(), Some(stage)),
            None => (PathBuf::new(), None),
        }
    }

    /// Look up a stage by file path.
    pub fn stage<P: AsRef<Path>>(&self, path: P) -> Option<&UsdStage> {
        let path = path.as_ref();
        let index = match self.stage_index.get(path) {
            Some(&index) => Some(index),
            None => path
                .canonicalize()
                .ok()
                .and_then(|canonical| self.stage_index.get(&canonical).copied()),
        };
        index.map(|i| &self.stages[i])
    }

    /// All stages, in discovery order.
    pub fn stages(&self) -> &[UsdStage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn references(&self) -> &BTreeSet<ReferenceEdge> {
        &self.references
    }

    /// Every file reachable from the root, the root documents included.
    ///
    /// Holds each loaded stage plus every reference target, so files that
    /// failed to load are listed as well.
    pub fn files(&self) -> BTreeSet<&Path> {
        self.stages
            .iter()
            .map(|stage| stage.path.as_path())
            .chain(self.references.iter().map(|edge| edge.to.as_path()))
            .collect()
    }

    /// Model paths with the file of the stage defining each.
    pub fn models(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.models
            .iter()
            .map(|(name, &i)| (name.as_str(), self.stages[i].path.as_path()))
    }

    pub fn materials(&self) -> &BTreeMap<String, material::Material> {
        &self.materials
    }

    pub fn material(&self, name: &str) -> Option<&material::Material> {
        self.materials.get(name)
    }

    pub fn state(&self) -> DataState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &UsdDataConfig {
        &self.config
    }

    fn clear(&mut self) {
        self.state = DataState::Uninitialized;
        self.stages.clear();
        self.stage_index.clear();
        self.references.clear();
        self.models.clear();
        self.materials.clear();
    }

    fn add_stage(&mut self, stage: UsdStage) {
        let index = self.stages.len();

        for model in &stage.models {
            match self.models.get(model) {
                Some(&existing) => log::warn!(
                    "Model {} in {} is already defined in {}, ignoring",
                    model,
                    stage.path.display(),
                    self.stages[existing].path.display()
                ),
                None => {
                    self.models.insert(model.clone(), index);
                }
            }
        }

        self.stage_index.insert(stage.path.clone(), index);
        self.stages.push(stage);
    }

    /// Documents the traversal starts from.
    fn seeds(&self) -> Result<Vec<PathBuf>, Error> {
        let root = self.root.canonicalize().map_err(|err| {
            Error::new(
                ErrorCode::DocumentNotFound,
                format!("Unable to find '{}': {}", self.root.display(), err),
            )
        })?;

        if !root.is_dir() {
            return Ok(vec![root]);
        }

        let entries = std::fs::read_dir(&root).map_err(|err| {
            Error::new(
                ErrorCode::DocumentNotFound,
                format!("Unable to read directory '{}': {}", root.display(), err),
            )
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && self.has_usd_extension(path))
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if files.is_empty() {
            return Err(Error::new(
                ErrorCode::DocumentNotFound,
                format!("No USD documents in '{}'", root.display()),
            ));
        }

        Ok(files
            .into_iter()
            .map(|path| path.canonicalize().unwrap_or(path))
            .collect())
    }

    fn has_usd_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
