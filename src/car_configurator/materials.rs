use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::error::LoadError;
use crate::car_configurator::lighting::SKYBOX_BASE_NITS;
use crate::car_configurator::scene::{CarRoot, ConfiguratorCamera};
use bevy::light::GeneratedEnvironmentMapLight;
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const ENVIRONMENT_BASE_INTENSITY: f32 = SKYBOX_BASE_NITS * 1.5;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MaterialRole {
    Paint,
    Caliper,
    Trim,
}

#[derive(Resource, Debug, Clone, Default, Deserialize)]
pub struct MaterialRoleMap {
    pub roles: HashMap<String, MaterialRole>,
}

impl MaterialRoleMap {
    pub fn role_for(&self, name: &str) -> Option<MaterialRole> {
        self.roles.get(name).copied()
    }
}

pub fn load_material_roles(path: &Path) -> Result<MaterialRoleMap, LoadError> {
    let text = fs::read_to_string(path).map_err(|err| LoadError::RoleMapping {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    ron::de::from_str::<MaterialRoleMap>(&text).map_err(|err| LoadError::RoleMapping {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

pub fn default_material_roles() -> MaterialRoleMap {
    let roles = [
        ("Body", MaterialRole::Paint),
        ("Hood", MaterialRole::Paint),
        ("Doors", MaterialRole::Paint),
        ("Caliper_FL", MaterialRole::Caliper),
        ("Caliper_FR", MaterialRole::Caliper),
        ("Caliper_RL", MaterialRole::Caliper),
        ("Caliper_RR", MaterialRole::Caliper),
    ]
    .into_iter()
    .map(|(name, role)| (name.to_string(), role))
    .collect();
    MaterialRoleMap { roles }
}

pub fn apply_role_material(
    material: &mut StandardMaterial,
    role: MaterialRole,
    config: &ConfiguratorConfig,
) {
    match role {
        MaterialRole::Paint => {
            material.base_color = config.paint_color;
            material.metallic = config.metalness;
            material.perceptual_roughness = config.roughness;
            material.clearcoat = config.clearcoat;
            material.clearcoat_perceptual_roughness = config.clearcoat_roughness;
        }
        MaterialRole::Caliper => {
            material.base_color = config.caliper_color;
        }
        MaterialRole::Trim => {}
    }
}

pub fn assign_material_roles(
    mut commands: Commands,
    role_map: Res<MaterialRoleMap>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    new_meshes: Query<
        (Entity, &MeshMaterial3d<StandardMaterial>),
        (Added<MeshMaterial3d<StandardMaterial>>, Without<MaterialRole>),
    >,
    names: Query<(Option<&Name>, Option<&ChildOf>, Has<CarRoot>)>,
) {
    for (entity, material_handle) in &new_meshes {
        let Some((role, matched_name)) = resolve_role(entity, &role_map, &names) else {
            continue;
        };

        let Some(unique) = materials.get(&material_handle.0).cloned() else {
            continue;
        };
        let unique = materials.add(unique);
        commands
            .entity(entity)
            .insert((role, MeshMaterial3d(unique)));
        debug!("mesh under '{matched_name}' tagged as {role:?}");
    }
}

fn resolve_role(
    entity: Entity,
    role_map: &MaterialRoleMap,
    names: &Query<(Option<&Name>, Option<&ChildOf>, Has<CarRoot>)>,
) -> Option<(MaterialRole, String)> {
    let mut current = entity;
    loop {
        let Ok((name, parent, is_root)) = names.get(current) else {
            return None;
        };
        if let Some(name) = name {
            if let Some(role) = role_map.role_for(name.as_str()) {
                return Some((role, name.as_str().to_string()));
            }
        }
        if is_root {
            return None;
        }
        current = parent?.parent();
    }
}

pub fn update_materials(
    config: Res<ConfiguratorConfig>,
    tagged: Query<(&MaterialRole, &MeshMaterial3d<StandardMaterial>)>,
    newly_tagged: Query<(), Added<MaterialRole>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut env_query: Query<&mut GeneratedEnvironmentMapLight, With<ConfiguratorCamera>>,
) {
    if !config.is_changed() && newly_tagged.is_empty() {
        return;
    }

    let mut updated = 0usize;
    for (role, handle) in &tagged {
        if let Some(mut material) = materials.get_mut(&handle.0) {
            apply_role_material(&mut material, *role, &config);
            updated += 1;
        }
    }

    // Bevy scopes reflection intensity to the view, so the environment light
    // on the camera carries it for every mesh.
    for mut env in &mut env_query {
        env.intensity = ENVIRONMENT_BASE_INTENSITY * config.environment_intensity;
    }

    if !newly_tagged.is_empty() {
        info!("material pass applied to {updated} tagged meshes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car_configurator::config::{ColorField, ConfigUpdate, ScalarField};
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct MaterialBits {
        base_color: [u32; 4],
        metallic: u32,
        roughness: u32,
        clearcoat: u32,
        clearcoat_roughness: u32,
    }

    fn bits(material: &StandardMaterial) -> MaterialBits {
        let color = material.base_color.to_linear();
        MaterialBits {
            base_color: [
                color.red.to_bits(),
                color.green.to_bits(),
                color.blue.to_bits(),
                color.alpha.to_bits(),
            ],
            metallic: material.metallic.to_bits(),
            roughness: material.perceptual_roughness.to_bits(),
            clearcoat: material.clearcoat.to_bits(),
            clearcoat_roughness: material.clearcoat_perceptual_roughness.to_bits(),
        }
    }

    #[test]
    fn repeated_pass_is_bitwise_identical() {
        let config = ConfiguratorConfig::default();
        for role in [MaterialRole::Paint, MaterialRole::Caliper, MaterialRole::Trim] {
            let mut material = StandardMaterial::default();
            apply_role_material(&mut material, role, &config);
            let first = bits(&material);
            apply_role_material(&mut material, role, &config);
            assert_eq!(bits(&material), first);
        }
    }

    #[test]
    fn paint_role_takes_all_paint_fields() {
        let mut config = ConfiguratorConfig::default();
        config.apply_all([
            ConfigUpdate::Color(ColorField::Paint, Color::srgb(0.1, 0.2, 0.9)),
            ConfigUpdate::Scalar(ScalarField::Metalness, 0.3),
            ConfigUpdate::Scalar(ScalarField::Roughness, 0.7),
            ConfigUpdate::Scalar(ScalarField::Clearcoat, 0.4),
            ConfigUpdate::Scalar(ScalarField::ClearcoatRoughness, 0.2),
        ]);

        let mut material = StandardMaterial::default();
        apply_role_material(&mut material, MaterialRole::Paint, &config);

        assert_eq!(material.base_color, Color::srgb(0.1, 0.2, 0.9));
        assert_eq!(material.metallic, 0.3);
        assert_eq!(material.perceptual_roughness, 0.7);
        assert_eq!(material.clearcoat, 0.4);
        assert_eq!(material.clearcoat_perceptual_roughness, 0.2);
    }

    #[test]
    fn caliper_role_only_takes_colour() {
        let config = ConfiguratorConfig {
            metalness: 0.0,
            ..ConfiguratorConfig::default()
        };
        let mut material = StandardMaterial {
            metallic: 0.65,
            ..default()
        };
        apply_role_material(&mut material, MaterialRole::Caliper, &config);

        assert_eq!(material.base_color, config.caliper_color);
        assert_eq!(material.metallic, 0.65);
    }

    #[test]
    fn role_mapping_parses_from_ron() {
        let text = r#"(roles: {"Body": Paint, "Caliper_FL": Caliper, "Grille": Trim})"#;
        let map: MaterialRoleMap = ron::de::from_str(text).expect("valid role map");
        assert_eq!(map.role_for("Body"), Some(MaterialRole::Paint));
        assert_eq!(map.role_for("Caliper_FL"), Some(MaterialRole::Caliper));
        assert_eq!(map.role_for("body_paint"), None);
    }

    #[test]
    fn missing_role_file_reports_role_mapping_error() {
        let err = load_material_roles(Path::new("does/not/exist.roles.ron"))
            .expect_err("missing file should fail");
        assert!(matches!(err, LoadError::RoleMapping { .. }));
    }
}
