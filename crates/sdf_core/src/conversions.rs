//! Conversions between renderer materials and schema materials.
//!
//! Two asymmetries are part of the contract:
//!
//! - [`convert`] attaches a PBR block with no workflow when the renderer PBR
//!   type is [`PbrType::None`].
//! - [`convert_material`] does not carry `double_sided` back to
//!   `two_sided_enabled`.
//! - [`convert_material`] drops a PBR block that holds no workflow, so a
//!   `PbrType::None` material loses its PBR data on the way back.

use crate::material::{self, NormalMapSpace, Pbr, PbrWorkflow, PbrWorkflowType};
use crate::render::{self, PbrType};

/// Convert a renderer material into a schema material.
pub fn convert(input: &render::Material) -> material::Material {
    let mut out = material::Material {
        emissive: input.emissive,
        diffuse: input.diffuse,
        specular: input.specular,
        ambient: input.ambient,
        render_order: input.render_order,
        lighting: input.lighting,
        double_sided: input.two_sided_enabled,
        ..Default::default()
    };

    if let Some(pbr) = &input.pbr {
        out.normal_map = pbr.normal_map.clone();

        let mut workflow = PbrWorkflow {
            albedo_map: pbr.albedo_map.clone(),
            metalness_map: pbr.metalness_map.clone(),
            emissive_map: pbr.emissive_map.clone(),
            roughness_map: pbr.roughness_map.clone(),
            specular_map: pbr.specular_map.clone(),
            glossiness_map: pbr.glossiness_map.clone(),
            environment_map: pbr.environment_map.clone(),
            ambient_occlusion_map: pbr.ambient_occlusion_map.clone(),
            light_map: pbr.light_map.clone(),
            roughness: pbr.roughness,
            glossiness: pbr.glossiness,
            metalness: pbr.metalness,
            ..Default::default()
        };

        let space = match pbr.normal_map_space {
            render::NormalMapSpace::Tangent => NormalMapSpace::Tangent,
            _ => NormalMapSpace::Object,
        };
        workflow.set_normal_map(pbr.normal_map.clone(), space);

        let mut pbr_out = Pbr::default();
        match pbr.pbr_type {
            PbrType::Metal => pbr_out.set_workflow(PbrWorkflowType::Metal, workflow),
            PbrType::Specular => pbr_out.set_workflow(PbrWorkflowType::Specular, workflow),
            PbrType::None => {}
        }
        out.pbr = Some(pbr_out);
    }

    out
}

/// Convert a schema material into a renderer material.
///
/// The metal workflow is looked up before the specular one. A PBR block with
/// neither workflow produces no PBR data on the output.
pub fn convert_material(input: &material::Material) -> render::Material {
    let mut out = render::Material {
        emissive: input.emissive,
        diffuse: input.diffuse,
        specular: input.specular,
        ambient: input.ambient,
        render_order: input.render_order,
        lighting: input.lighting,
        ..Default::default()
    };

    if let Some(pbr) = &input.pbr {
        let found = pbr
            .workflow(PbrWorkflowType::Metal)
            .map(|w| (PbrType::Metal, w))
            .or_else(|| {
                pbr.workflow(PbrWorkflowType::Specular)
                    .map(|w| (PbrType::Specular, w))
            });

        if let Some((pbr_type, workflow)) = found {
            let mut pbr_out = render::Pbr {
                pbr_type,
                ..Default::default()
            };
            pbr_out.albedo_map = workflow.albedo_map.clone();
            pbr_out.metalness_map = workflow.metalness_map.clone();
            pbr_out.emissive_map = workflow.emissive_map.clone();
            pbr_out.roughness_map = workflow.roughness_map.clone();
            pbr_out.specular_map = workflow.specular_map.clone();
            pbr_out.glossiness_map = workflow.glossiness_map.clone();
            pbr_out.environment_map = workflow.environment_map.clone();
            pbr_out.ambient_occlusion_map = workflow.ambient_occlusion_map.clone();
            pbr_out.light_map = workflow.light_map.clone();
            pbr_out.roughness = workflow.roughness;
            pbr_out.glossiness = workflow.glossiness;
            pbr_out.metalness = workflow.metalness;

            let space = match workflow.normal_map_space {
                NormalMapSpace::Tangent => render::NormalMapSpace::Tangent,
                NormalMapSpace::Object => render::NormalMapSpace::Object,
            };
            pbr_out.set_normal_map(workflow.normal_map.clone(), space);
            out.pbr = Some(pbr_out);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Workflow;
    use sdf_math::Color;

    fn renderer_material(pbr_type: PbrType) -> render::Material {
        let pbr = render::Pbr {
            pbr_type,
            albedo_map: "albedo.png".to_string(),
            normal_map: "normal.png".to_string(),
            normal_map_space: render::NormalMapSpace::Tangent,
            metalness_map: "metal.png".to_string(),
            roughness_map: "rough.png".to_string(),
            specular_map: "spec.png".to_string(),
            glossiness_map: "gloss.png".to_string(),
            environment_map: "env.dds".to_string(),
            ambient_occlusion_map: "ao.png".to_string(),
            emissive_map: "emissive.png".to_string(),
            light_map: "light.png".to_string(),
            roughness: 0.3,
            glossiness: 0.7,
            metalness: 0.9,
        };

        render::Material {
            name: "test".to_string(),
            emissive: Color::new(0.1, 0.2, 0.3, 1.0),
            diffuse: Color::new(0.4, 0.5, 0.6, 1.0),
            specular: Color::new(0.7, 0.8, 0.9, 1.0),
            ambient: Color::new(0.0, 0.1, 0.0, 0.5),
            render_order: 3.0,
            lighting: false,
            two_sided_enabled: true,
            pbr: Some(pbr),
        }
    }

    #[test]
    fn test_convert_copies_base_fields() {
        let input = render::Material {
            pbr: None,
            ..renderer_material(PbrType::Metal)
        };
        let out = convert(&input);

        assert_eq!(out.emissive, input.emissive);
        assert_eq!(out.diffuse, input.diffuse);
        assert_eq!(out.specular, input.specular);
        assert_eq!(out.ambient, input.ambient);
        assert_eq!(out.render_order, 3.0);
        assert!(!out.lighting);
        assert!(out.double_sided);
        assert!(out.pbr.is_none());
        assert!(out.normal_map.is_empty());
    }

    #[test]
    fn test_convert_metal_workflow() {
        let out = convert(&renderer_material(PbrType::Metal));
        let pbr = out.pbr.as_ref().unwrap();

        assert_eq!(pbr.workflow_type(), Some(PbrWorkflowType::Metal));
        assert!(pbr.workflow(PbrWorkflowType::Specular).is_none());
        assert_eq!(out.normal_map, "normal.png");

        let workflow = pbr.workflow(PbrWorkflowType::Metal).unwrap();
        assert_eq!(workflow.albedo_map, "albedo.png");
        assert_eq!(workflow.normal_map, "normal.png");
        assert_eq!(workflow.normal_map_space, NormalMapSpace::Tangent);
        assert_eq!(workflow.metalness_map, "metal.png");
        assert_eq!(workflow.roughness_map, "rough.png");
        assert_eq!(workflow.environment_map, "env.dds");
        assert_eq!(workflow.ambient_occlusion_map, "ao.png");
        assert_eq!(workflow.emissive_map, "emissive.png");
        assert_eq!(workflow.light_map, "light.png");
        assert_eq!(workflow.roughness, 0.3);
        assert_eq!(workflow.glossiness, 0.7);
        assert_eq!(workflow.metalness, 0.9);
    }

    #[test]
    fn test_convert_specular_workflow_keeps_all_slots() {
        let out = convert(&renderer_material(PbrType::Specular));
        let pbr = out.pbr.as_ref().unwrap();

        assert_eq!(pbr.workflow_type(), Some(PbrWorkflowType::Specular));
        let workflow = pbr.workflow(PbrWorkflowType::Specular).unwrap();
        assert_eq!(workflow.metalness_map, "metal.png");
        assert_eq!(workflow.specular_map, "spec.png");
        assert_eq!(workflow.glossiness_map, "gloss.png");
    }

    #[test]
    fn test_convert_unknown_pbr_type_attaches_empty_block() {
        let out = convert(&renderer_material(PbrType::None));
        let pbr = out.pbr.as_ref().unwrap();
        assert!(pbr.workflow.is_none());
        assert_eq!(out.normal_map, "normal.png");
    }

    #[test]
    fn test_convert_object_space_normal_map() {
        let mut input = renderer_material(PbrType::Metal);
        if let Some(pbr) = input.pbr.as_mut() {
            pbr.normal_map_space = render::NormalMapSpace::Object;
        }
        let out = convert(&input);
        let workflow = out.pbr.as_ref().unwrap().workflow(PbrWorkflowType::Metal).unwrap();
        assert_eq!(workflow.normal_map_space, NormalMapSpace::Object);
    }

    #[test]
    fn test_metal_roundtrip() {
        let input = renderer_material(PbrType::Metal);
        let back = convert_material(&convert(&input));

        assert_eq!(back.emissive, input.emissive);
        assert_eq!(back.diffuse, input.diffuse);
        assert_eq!(back.specular, input.specular);
        assert_eq!(back.ambient, input.ambient);
        assert_eq!(back.render_order, input.render_order);
        assert_eq!(back.lighting, input.lighting);
        assert_eq!(back.pbr, input.pbr);
    }

    #[test]
    fn test_roundtrip_drops_two_sided() {
        let input = renderer_material(PbrType::Specular);
        assert!(input.two_sided_enabled);

        let back = convert_material(&convert(&input));
        assert!(!back.two_sided_enabled);
        assert_eq!(back.pbr, input.pbr);
    }

    #[test]
    fn test_convert_material_without_workflow() {
        let material = material::Material {
            pbr: Some(Pbr::default()),
            ..Default::default()
        };
        let out = convert_material(&material);
        assert!(out.pbr.is_none());
        assert_eq!(out.diffuse, material.diffuse);
    }

    #[test]
    fn test_unknown_pbr_type_roundtrip_drops_block() {
        let input = renderer_material(PbrType::None);
        let back = convert_material(&convert(&input));
        assert!(back.pbr.is_none());
        assert_eq!(back.diffuse, input.diffuse);
    }

    #[test]
    fn test_convert_material_without_pbr() {
        let material = material::Material {
            double_sided: true,
            ..Default::default()
        };
        let out = convert_material(&material);
        assert!(out.pbr.is_none());
        assert!(!out.two_sided_enabled);
    }

    #[test]
    fn test_convert_material_prefers_metal() {
        let metal = PbrWorkflow {
            albedo_map: "metal_albedo.png".to_string(),
            metalness: 1.0,
            ..Default::default()
        };
        let material = material::Material {
            pbr: Some(Pbr::new(Workflow::Metal(metal))),
            ..Default::default()
        };

        let out = convert_material(&material);
        let pbr = out.pbr.unwrap();
        assert_eq!(pbr.pbr_type, PbrType::Metal);
        assert_eq!(pbr.albedo_map, "metal_albedo.png");
        assert_eq!(pbr.metalness, 1.0);
    }

    #[test]
    fn test_convert_material_specular() {
        let specular = PbrWorkflow {
            specular_map: "spec.png".to_string(),
            glossiness: 0.4,
            normal_map: "n.png".to_string(),
            normal_map_space: NormalMapSpace::Object,
            ..Default::default()
        };
        let material = material::Material {
            pbr: Some(Pbr::new(Workflow::Specular(specular))),
            ..Default::default()
        };

        let pbr = convert_material(&material).pbr.unwrap();
        assert_eq!(pbr.pbr_type, PbrType::Specular);
        assert_eq!(pbr.specular_map, "spec.png");
        assert_eq!(pbr.glossiness, 0.4);
        assert_eq!(pbr.normal_map, "n.png");
        assert_eq!(pbr.normal_map_space, render::NormalMapSpace::Object);
    }
}
