use crate::car_configurator::camera::OrbitCamera;
use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::lighting::{
    RIM_BASE_LUX, SPOTLIGHT_BASE_LUMENS, bloom_from_config, spotlight_orbit_position,
};
use crate::car_configurator::{GRID_EXTENT_METERS, GRID_MAJOR_STEP_METERS};
use bevy::camera::ClearColorConfig;
use bevy::camera::visibility::RenderLayers;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;
use bevy::render::view::Hdr;
use bevy_egui::PrimaryEguiContext;

pub const CAMERA_FOV_DEG: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const SHADOW_MAP_SIZE: usize = 2048;
pub const GROUND_SIZE_METERS: f32 = 40.0;

#[derive(Component)]
pub struct ConfiguratorCamera;

#[derive(Component)]
pub struct KeySpotLight;

#[derive(Component)]
pub struct RimLight;

#[derive(Component)]
pub struct CarRoot;

#[derive(Debug, Clone, Copy)]
pub struct RimLightSpec {
    pub color: Color,
    pub position: Vec3,
}

pub const RIM_LIGHTS: [RimLightSpec; 2] = [
    RimLightSpec {
        color: Color::srgb(0.55, 0.7, 1.0),
        position: Vec3::new(-6.0, 4.0, -6.0),
    },
    RimLightSpec {
        color: Color::srgb(1.0, 0.72, 0.45),
        position: Vec3::new(6.0, 3.0, -5.0),
    },
];

pub fn perspective_projection() -> PerspectiveProjection {
    PerspectiveProjection {
        fov: CAMERA_FOV_DEG.to_radians(),
        near: CAMERA_NEAR,
        far: CAMERA_FAR,
        ..default()
    }
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<ConfiguratorConfig>,
    orbit: Res<OrbitCamera>,
) {
    // Base render, bloom, then tone mapping on output.
    commands.spawn((
        Camera3d::default(),
        Hdr,
        Projection::Perspective(perspective_projection()),
        Tonemapping::AcesFitted,
        bloom_from_config(&config),
        orbit.transform(),
        ConfiguratorCamera,
        IsDefaultUiCamera,
    ));
    commands.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        RenderLayers::layer(31),
        PrimaryEguiContext,
    ));

    commands.spawn((
        SpotLight {
            color: Color::WHITE,
            intensity: SPOTLIGHT_BASE_LUMENS * config.spotlight_intensity,
            range: 40.0,
            radius: 0.25,
            inner_angle: 0.3,
            outer_angle: 0.55,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(spotlight_orbit_position(0.0)).looking_at(Vec3::ZERO, Vec3::Y),
        KeySpotLight,
    ));

    for rim in RIM_LIGHTS {
        commands.spawn((
            DirectionalLight {
                color: rim.color,
                illuminance: RIM_BASE_LUX * config.rim_intensity,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_translation(rim.position).looking_at(Vec3::ZERO, Vec3::Y),
            RimLight,
        ));
    }

    let ground_mesh = meshes.add(Plane3d::default().mesh().size(GROUND_SIZE_METERS, GROUND_SIZE_METERS));
    let ground_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.09, 0.09, 0.1),
        perceptual_roughness: 0.85,
        metallic: 0.0,
        ..default()
    });
    commands.spawn((Mesh3d(ground_mesh), MeshMaterial3d(ground_mat), Transform::default()));

    commands.spawn((CarRoot, Transform::default(), Visibility::default()));
}

pub fn draw_grid_system(mut gizmos: Gizmos) {
    let extent = GRID_EXTENT_METERS as f32;
    let y = 0.002;

    for i in -GRID_EXTENT_METERS..=GRID_EXTENT_METERS {
        let f = i as f32;
        let color = if i % GRID_MAJOR_STEP_METERS == 0 {
            Color::srgba(0.45, 0.45, 0.5, 0.45)
        } else {
            Color::srgba(0.28, 0.28, 0.3, 0.25)
        };

        gizmos.line(Vec3::new(-extent, y, f), Vec3::new(extent, y, f), color);
        gizmos.line(Vec3::new(f, y, -extent), Vec3::new(f, y, extent), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projection_uses_fixed_constants() {
        let projection = perspective_projection();
        assert_relative_eq!(projection.fov, 45.0_f32.to_radians());
        assert_relative_eq!(projection.near, 0.1);
        assert_relative_eq!(projection.far, 1000.0);
    }

    #[test]
    fn rim_lights_have_distinct_colours() {
        assert_ne!(RIM_LIGHTS[0].color, RIM_LIGHTS[1].color);
    }
}
