//! Renderer-side material representation.
//!
//! This is the shape materials have when they come out of an asset loader
//! (USD preview surfaces, mesh formats) and the shape a renderer consumes.
//! It differs from the schema [`crate::material::Material`] in that the PBR
//! workflow is a tag on a single flat record rather than a variant.

use sdf_math::Color;
use serde::{Deserialize, Serialize};

/// Which PBR workflow a [`Pbr`] record describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PbrType {
    /// Unset.
    #[default]
    None,

    /// Metal/roughness.
    Metal,

    /// Specular/glossiness.
    Specular,
}

/// Coordinate space of a normal map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalMapSpace {
    #[default]
    Tangent,
    Object,
}

/// Physically based rendering parameters of a renderer material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pbr {
    pub pbr_type: PbrType,

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

impl Default for Pbr {
    fn default() -> Self {
        Self {
            pbr_type: PbrType::None,
            albedo_map: String::new(),
            normal_map: String::new(),
            normal_map_space: NormalMapSpace::Tangent,
            metalness_map: String::new(),
            roughness_map: String::new(),
            specular_map: String::new(),
            glossiness_map: String::new(),
            environment_map: String::new(),
            ambient_occlusion_map: String::new(),
            emissive_map: String::new(),
            light_map: String::new(),
            roughness: 0.5,
            glossiness: 0.0,
            metalness: 0.5,
        }
    }
}

impl Pbr {
    /// Set the normal map together with its coordinate space.
    pub fn set_normal_map(&mut self, path: impl Into<String>, space: NormalMapSpace) {
        self.normal_map = path.into();
        self.normal_map_space = space;
    }

    /// Check if any texture slot is set.
    pub fn has_textures(&self) -> bool {
        [
            &self.albedo_map,
            &self.normal_map,
            &self.metalness_map,
            &self.roughness_map,
            &self.specular_map,
            &self.glossiness_map,
            &self.environment_map,
            &self.ambient_occlusion_map,
            &self.emissive_map,
            &self.light_map,
        ]
        .iter()
        .any(|m| !m.is_empty())
    }
}

/// A renderer material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,

    pub emissive: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub ambient: Color,

    /// Draw order hint for coplanar surfaces
    pub render_order: f32,

    /// Whether dynamic lighting affects this material
    pub lighting: bool,

    /// Render back faces too
    pub two_sided_enabled: bool,

    pub pbr: Option<Pbr>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            emissive: Color::BLACK,
            diffuse: Color::BLACK,
            specular: Color::BLACK,
            ambient: Color::BLACK,
            render_order: 0.0,
            lighting: true,
            two_sided_enabled: false,
            pbr: None,
        }
    }
}

impl Material {
    /// Create a new material with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach PBR parameters, replacing any existing ones.
    pub fn with_pbr(mut self, pbr: Pbr) -> Self {
        self.pbr = Some(pbr);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbr_defaults() {
        let pbr = Pbr::default();
        assert_eq!(pbr.pbr_type, PbrType::None);
        assert_eq!(pbr.normal_map_space, NormalMapSpace::Tangent);
        assert_eq!(pbr.roughness, 0.5);
        assert_eq!(pbr.glossiness, 0.0);
        assert_eq!(pbr.metalness, 0.5);
        assert!(!pbr.has_textures());
    }

    #[test]
    fn test_material_defaults() {
        let material = Material::new("red");
        assert_eq!(material.name, "red");
        assert!(material.lighting);
        assert!(!material.two_sided_enabled);
        assert!(material.pbr.is_none());
    }

    #[test]
    fn test_set_normal_map() {
        let mut pbr = Pbr::default();
        pbr.set_normal_map("normal.png", NormalMapSpace::Object);
        assert_eq!(pbr.normal_map, "normal.png");
        assert_eq!(pbr.normal_map_space, NormalMapSpace::Object);
        assert!(pbr.has_textures());
    }
}
