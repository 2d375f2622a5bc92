//! USD primitive types for intermediate representation.
//!
//! These types represent a parsed USDA layer before it is indexed as a stage
//! or converted into schema objects.

use std::fmt;
use std::str::FromStr;

use sdf_math::Vec3;
use serde::{Deserialize, Serialize};

/// Stage up axis (`upAxis` layer metadata).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpAxis {
    X,
    /// USD's fallback when a layer does not author `upAxis`.
    #[default]
    Y,
    Z,
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpAxis::X => "X",
            UpAxis::Y => "Y",
            UpAxis::Z => "Z",
        })
    }
}

impl FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(UpAxis::X),
            "Y" => Ok(UpAxis::Y),
            "Z" => Ok(UpAxis::Z),
            _ => Err(s.to_string()),
        }
    }
}

/// Layer-level metadata from the header block of a USDA file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerMetadata {
    pub up_axis: Option<UpAxis>,
    pub meters_per_unit: Option<f64>,
    pub default_prim: Option<String>,

    /// Asset paths listed in `subLayers`, as authored
    pub sub_layers: Vec<String>,
}

/// A parsed USDA layer: header metadata plus root prims.
#[derive(Clone, Debug, Default)]
pub struct UsdLayer {
    pub metadata: LayerMetadata,
    pub prims: Vec<UsdPrim>,
}

/// Which composition arc brought in an external file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArcKind {
    SubLayer,
    #[default]
    Reference,
    Payload,
}

/// A USD Reference to an external file.
/// Syntax: `references = @path/to/file.usda@</PrimPath>`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsdReference {
    /// Path to the external USD file (relative or absolute)
    pub asset_path: String,

    /// Optional prim path within the referenced file (e.g., "/Lucy")
    pub target_prim_path: Option<String>,

    pub kind: ArcKind,
}

/// A parsed USD prim (generic container).
#[derive(Clone, Debug)]
pub enum UsdPrim {
    /// A transform, scope or geometry prim; anything that only matters for
    /// its name, metadata and children
    Group(UsdGroup),

    /// A `UsdShadeMaterial`
    Material(UsdMaterial),

    /// A `UsdShadeShader`
    Shader(UsdShader),

    /// An `over` or `class` prim, skipped. Holds the prim type.
    Unknown(String),
}

impl UsdPrim {
    /// Prim path, empty for skipped prims.
    pub fn path(&self) -> &str {
        match self {
            UsdPrim::Group(g) => &g.path,
            UsdPrim::Material(m) => &m.path,
            UsdPrim::Shader(s) => &s.path,
            UsdPrim::Unknown(_) => "",
        }
    }

    /// Prim name, empty for skipped prims.
    pub fn name(&self) -> &str {
        match self {
            UsdPrim::Group(g) => &g.name,
            UsdPrim::Material(m) => &m.name,
            UsdPrim::Shader(s) => &s.name,
            UsdPrim::Unknown(_) => "",
        }
    }

    /// Schema type name as authored (`Xform`, `Material`, ...).
    pub fn type_name(&self) -> &str {
        match self {
            UsdPrim::Group(g) => &g.type_name,
            UsdPrim::Material(_) => "Material",
            UsdPrim::Shader(_) => "Shader",
            UsdPrim::Unknown(t) => t,
        }
    }

    pub fn children(&self) -> &[UsdPrim] {
        match self {
            UsdPrim::Group(g) => &g.children,
            UsdPrim::Material(m) => &m.children,
            UsdPrim::Shader(_) | UsdPrim::Unknown(_) => &[],
        }
    }

    /// References and payloads authored on this prim.
    pub fn references(&self) -> &[UsdReference] {
        match self {
            UsdPrim::Group(g) => &g.references,
            UsdPrim::Material(m) => &m.references,
            UsdPrim::Shader(_) | UsdPrim::Unknown(_) => &[],
        }
    }

    /// Whether this prim was defined (`def`) rather than skipped.
    pub fn is_defined(&self) -> bool {
        !matches!(self, UsdPrim::Unknown(_))
    }

    /// Visit this prim and all of its descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a UsdPrim)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

/// A grouping prim such as `Xform`, `Scope` or a geometry prim.
#[derive(Clone, Debug, Default)]
pub struct UsdGroup {
    /// Prim path (e.g., "/World/Model")
    pub path: String,

    /// Prim name (last component of path)
    pub name: String,

    /// Schema type, empty for typeless `def "Name"` prims
    pub type_name: String,

    /// Model kind metadata (`component`, `assembly`, ...)
    pub kind: Option<String>,

    pub references: Vec<UsdReference>,

    /// Child prims
    pub children: Vec<UsdPrim>,
}

/// A USD material prim with its shader network as children.
#[derive(Clone, Debug, Default)]
pub struct UsdMaterial {
    pub path: String,
    pub name: String,
    pub references: Vec<UsdReference>,

    /// Prim path of the shader connected to `outputs:surface`
    pub surface: Option<String>,

    pub children: Vec<UsdPrim>,
}

impl UsdMaterial {
    /// All shaders in this material's network, including nested node graphs.
    pub fn shaders(&self) -> Vec<&UsdShader> {
        let mut shaders = Vec::new();
        for child in &self.children {
            child.walk(&mut |prim| {
                if let UsdPrim::Shader(shader) = prim {
                    shaders.push(shader);
                }
            });
        }
        shaders
    }

    /// Find a shader of this material by prim path.
    pub fn shader(&self, path: &str) -> Option<&UsdShader> {
        self.shaders().into_iter().find(|s| s.path == path)
    }

    /// The shader driving the surface output.
    ///
    /// Follows the `outputs:surface` connection when authored, otherwise
    /// falls back to the first `UsdPreviewSurface` shader.
    pub fn surface_shader(&self) -> Option<&UsdShader> {
        if let Some(path) = &self.surface {
            if let Some(shader) = self.shader(path) {
                return Some(shader);
            }
        }
        self.shaders()
            .into_iter()
            .find(|s| s.id.as_deref() == Some("UsdPreviewSurface"))
    }
}

/// A USD shader prim.
#[derive(Clone, Debug, Default)]
pub struct UsdShader {
    pub path: String,
    pub name: String,

    /// Shader identifier (`info:id`), e.g. `UsdPreviewSurface`
    pub id: Option<String>,

    /// `inputs:*` attributes in authored order
    pub inputs: Vec<(String, ShaderValue)>,
}

impl UsdShader {
    /// Look up an input by name (without the `inputs:` prefix).
    pub fn input(&self, name: &str) -> Option<&ShaderValue> {
        self.inputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Value of a shader input.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderValue {
    /// Any scalar number (`float`, `int`, `double`)
    Float(f32),

    /// A three component tuple (`color3f`, `normal3f`, `float3`)
    Vec3(Vec3),

    /// Asset path (`@./texture.png@`)
    Asset(String),

    /// A `.connect` to another shader's output
    Connection { prim: String, output: String },

    /// Anything else, kept as authored text
    Token(String),
}
