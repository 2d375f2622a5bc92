//! Build renderer materials from `UsdPreviewSurface` shader networks.

use sdf_math::Color;

use crate::error::{Error, ErrorCode, Errors};
use crate::render::{self, NormalMapSpace, PbrType};
use crate::usd::types::{ShaderValue, UsdMaterial};

const TEXTURE_SHADER: &str = "UsdUVTexture";

/// Map a USD material onto a renderer material.
///
/// A material without a preview surface still yields a renderer material with
/// default values, plus an `ElementMissing` error.
pub fn parse_material(material: &UsdMaterial) -> (render::Material, Errors) {
    let mut out = render::Material::new(material.name.clone());
    let mut errors = Errors::new();

    let Some(surface) = material.surface_shader() else {
        errors.push(Error::new(
            ErrorCode::ElementMissing,
            format!("Material '{}' has no UsdPreviewSurface shader", material.path),
        ));
        return (out, errors);
    };

    let mut pbr = render::Pbr {
        pbr_type: PbrType::Metal,
        ..Default::default()
    };

    for (name, value) in &surface.inputs {
        let mut texture = |value: &ShaderValue| match texture_file(material, value) {
            Ok(file) => file,
            Err(err) => {
                errors.push(err);
                String::new()
            }
        };

        match (name.as_str(), value) {
            ("diffuseColor", ShaderValue::Vec3(c)) => out.diffuse = Color::from(*c),
            ("diffuseColor", v @ ShaderValue::Connection { .. }) => pbr.albedo_map = texture(v),
            ("emissiveColor", ShaderValue::Vec3(c)) => out.emissive = Color::from(*c),
            ("emissiveColor", v @ ShaderValue::Connection { .. }) => pbr.emissive_map = texture(v),
            ("specularColor", ShaderValue::Vec3(c)) => out.specular = Color::from(*c),
            ("specularColor", v @ ShaderValue::Connection { .. }) => pbr.specular_map = texture(v),
            ("metallic", ShaderValue::Float(f)) => pbr.metalness = f64::from(*f),
            ("metallic", v @ ShaderValue::Connection { .. }) => pbr.metalness_map = texture(v),
            ("roughness", ShaderValue::Float(f)) => pbr.roughness = f64::from(*f),
            ("roughness", v @ ShaderValue::Connection { .. }) => pbr.roughness_map = texture(v),
            ("normal", v @ ShaderValue::Connection { .. }) => {
                let map = texture(v);
                pbr.set_normal_map(map, NormalMapSpace::Tangent);
            }
            ("occlusion", v @ ShaderValue::Connection { .. }) => {
                pbr.ambient_occlusion_map = texture(v)
            }
            ("useSpecularWorkflow", ShaderValue::Float(f)) => {
                pbr.pbr_type = if *f == 1.0 {
                    PbrType::Specular
                } else {
                    PbrType::Metal
                };
            }
            _ => {}
        }
    }

    out.pbr = Some(pbr);
    (out, errors)
}

/// Follow a connection to a `UsdUVTexture` shader and return its file.
fn texture_file(material: &UsdMaterial, value: &ShaderValue) -> Result<String, Error> {
    let ShaderValue::Connection { prim, .. } = value else {
        return Err(Error::new(
            ErrorCode::ElementInvalid,
            format!("Material '{}' input is not a connection", material.path),
        ));
    };

    let shader = material
        .shader(prim)
        .filter(|s| s.id.as_deref() == Some(TEXTURE_SHADER))
        .ok_or_else(|| {
            Error::new(
                ErrorCode::ElementInvalid,
                format!(
                    "Material '{}' connects to '{}', which is not a {} shader",
                    material.path, prim, TEXTURE_SHADER
                ),
            )
        })?;

    match shader.input("file") {
        Some(ShaderValue::Asset(file)) => Ok(file.clone()),
        _ => Err(Error::new(
            ErrorCode::ElementInvalid,
            format!("Texture '{}' has no file input", shader.path),
        )),
    }
}
