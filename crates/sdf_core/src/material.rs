//! Schema material with optional PBR workflow.

use sdf_math::{equal, equal_f32, Color};
use serde::{Deserialize, Serialize};

use crate::element::{AttributeReader, ElementPtr};
use crate::error::Errors;

/// The two PBR workflows a schema material can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PbrWorkflowType {
    Metal,
    Specular,
}

/// Coordinate space of a normal map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalMapSpace {
    #[default]
    Tangent,
    Object,
}

/// Texture maps and scalars of one PBR workflow.
///
/// Every slot is always present. Which ones are meaningful depends on the
/// [`Workflow`] variant holding the record; the others stay empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PbrWorkflow {
    pub albedo_map: String,
    pub normal_map: String,
    pub normal_map_space: NormalMapSpace,
    pub metalness_map: String,
    pub roughness_map: String,
    pub specular_map: String,
    pub glossiness_map: String,
    pub environment_map: String,
    pub ambient_occlusion_map: String,
    pub emissive_map: String,
    pub light_map: String,

    pub roughness: f64,
    pub glossiness: f64,
    pub metalness: f64,
}

impl PbrWorkflow {
    pub fn set_normal_map(&mut self, path: impl Into<String>, space: NormalMapSpace) {
        self.normal_map = path.into();
        self.normal_map_space = space;
    }
}

impl PartialEq for PbrWorkflow {
    fn eq(&self, other: &Self) -> bool {
        self.albedo_map == other.albedo_map
            && self.normal_map == other.normal_map
            && self.normal_map_space == other.normal_map_space
            && self.metalness_map == other.metalness_map
            && self.roughness_map == other.roughness_map
            && self.specular_map == other.specular_map
            && self.glossiness_map == other.glossiness_map
            && self.environment_map == other.environment_map
            && self.ambient_occlusion_map == other.ambient_occlusion_map
            && self.emissive_map == other.emissive_map
            && self.light_map == other.light_map
            && equal(self.roughness, other.roughness)
            && equal(self.glossiness, other.glossiness)
            && equal(self.metalness, other.metalness)
    }
}

/// A PBR workflow tagged with its kind. A material holds at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Workflow {
    Metal(PbrWorkflow),
    Specular(PbrWorkflow),
}

impl Workflow {
    pub fn kind(&self) -> PbrWorkflowType {
        match self {
            Workflow::Metal(_) => PbrWorkflowType::Metal,
            Workflow::Specular(_) => PbrWorkflowType::Specular,
        }
    }

    pub fn data(&self) -> &PbrWorkflow {
        match self {
            Workflow::Metal(data) | Workflow::Specular(data) => data,
        }
    }

}

/// PBR block of a schema material.
///
/// `workflow` is `None` when the source declared PBR data without a known
/// workflow kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pbr {
    pub workflow: Option<Workflow>,
}

impl Pbr {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow: Some(workflow),
        }
    }

    /// Set the workflow, replacing the previous one whatever its kind.
    pub fn set_workflow(&mut self, kind: PbrWorkflowType, data: PbrWorkflow) {
        self.workflow = Some(match kind {
            PbrWorkflowType::Metal => Workflow::Metal(data),
            PbrWorkflowType::Specular => Workflow::Specular(data),
        });
    }

    /// The workflow data if it is of the requested kind.
    pub fn workflow(&self, kind: PbrWorkflowType) -> Option<&PbrWorkflow> {
        self.workflow
            .as_ref()
            .filter(|w| w.kind() == kind)
            .map(Workflow::data)
    }

    pub fn workflow_type(&self) -> Option<PbrWorkflowType> {
        self.workflow.as_ref().map(Workflow::kind)
    }
}

/// A material as described by the simulation schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub emissive: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub ambient: Color,
    pub render_order: f32,
    pub lighting: bool,
    pub double_sided: bool,

    /// Normal map of the material, mirrored from its PBR workflow when
    /// converted from a renderer material.
    pub normal_map: String,

    pub pbr: Option<Pbr>,

    #[serde(skip)]
    pub(crate) element: Option<ElementPtr>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emissive: Color::BLACK,
            diffuse: Color::BLACK,
            specular: Color::BLACK,
            ambient: Color::BLACK,
            render_order: 0.0,
            lighting: true,
            double_sided: false,
            normal_map: String::new(),
            pbr: None,
            element: None,
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load colour and render flags from a `<material>` element.
    ///
    /// All fields are optional. A wrong element kind yields one fatal error
    /// and leaves `self` untouched.
    pub fn load(&mut self, element: ElementPtr) -> Errors {
        let mut reader = match AttributeReader::new(&element, "material", "Material") {
            Ok(reader) => reader,
            Err(err) => return vec![err],
        };

        self.ambient = reader.optional("ambient", self.ambient);
        self.diffuse = reader.optional("diffuse", self.diffuse);
        self.specular = reader.optional("specular", self.specular);
        self.emissive = reader.optional("emissive", self.emissive);
        self.render_order = reader.optional("render_order", self.render_order);
        self.lighting = reader.optional("lighting", self.lighting);
        self.double_sided = reader.optional("double_sided", self.double_sided);

        let errors = reader.finish();
        self.element = Some(element);
        errors
    }

    /// The element this material was loaded from, if any.
    pub fn element(&self) -> Option<&ElementPtr> {
        self.element.as_ref()
    }
}

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.emissive.approx_eq(&other.emissive)
            && self.diffuse.approx_eq(&other.diffuse)
            && self.specular.approx_eq(&other.specular)
            && self.ambient.approx_eq(&other.ambient)
            && equal_f32(self.render_order, other.render_order)
            && self.lighting == other.lighting
            && self.double_sided == other.double_sided
            && self.normal_map == other.normal_map
            && self.pbr == other.pbr
    }
}
