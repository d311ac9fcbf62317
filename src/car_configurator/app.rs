use crate::car_configurator::assets::{
    EnvironmentBackground, LoadingProgress, poll_environment_load, poll_model_load,
    start_asset_loads, update_loading_progress,
};
use crate::car_configurator::camera::{
    OrbitCamera, UiInteractionState, orbit_camera_system, orbit_input_system,
};
use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::input::{
    ActionQueue, execute_actions, keyboard_shortcuts, skip_loading_on_click,
    sync_projection_aspect, touch_swipe_panel,
};
use crate::car_configurator::lighting::{
    AMBIENT_BASE_BRIGHTNESS, animate_spotlight, apply_background, apply_bloom, apply_lighting,
};
use crate::car_configurator::materials::{
    MaterialRoleMap, assign_material_roles, default_material_roles, load_material_roles,
    update_materials,
};
use crate::car_configurator::performance::{
    PerformanceMonitor, monitor_performance, spawn_fps_overlay, update_fps_overlay,
};
use crate::car_configurator::presets::load_initial_presets;
use crate::car_configurator::scene::{SHADOW_MAP_SIZE, draw_grid_system, setup_scene};
use crate::car_configurator::transitions::{Transitions, advance_transitions};
use crate::car_configurator::ui::{ControlPanelState, Notifications, tick_notifications, ui_system};
use crate::car_configurator::{MATERIAL_ROLES_PATH, PRESETS_PATH};
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::light::PointLightShadowMap;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use std::path::Path;
use tracing::{info, warn};

pub fn run() {
    let config = ConfiguratorConfig::default();
    let ambient = GlobalAmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BASE_BRIGHTNESS * config.ambient_intensity,
        affects_lightmapped_meshes: true,
    };

    App::new()
        .insert_resource(config)
        .insert_resource(ambient)
        .insert_resource(PointLightShadowMap {
            size: SHADOW_MAP_SIZE,
        })
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.025)))
        .insert_resource(load_initial_presets(Path::new(PRESETS_PATH)))
        .insert_resource(load_initial_material_roles())
        .insert_resource(OrbitCamera::default())
        .insert_resource(UiInteractionState::default())
        .insert_resource(ControlPanelState::default())
        .insert_resource(Transitions::default())
        .insert_resource(LoadingProgress::default())
        .insert_resource(EnvironmentBackground::default())
        .insert_resource(Notifications::default())
        .insert_resource(ActionQueue::default())
        .insert_resource(PerformanceMonitor::default())
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Car Configurator".to_string(),
                resolution: (1600, 900).into(),
                present_mode: PresentMode::AutoVsync,
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_systems(Startup, (setup_scene, start_asset_loads, spawn_fps_overlay))
        .add_systems(
            Update,
            (
                poll_environment_load,
                apply_background.run_if(
                    resource_changed::<ConfiguratorConfig>
                        .or(resource_changed::<EnvironmentBackground>),
                ),
                poll_model_load,
                update_loading_progress,
                assign_material_roles,
                update_materials,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                (
                    keyboard_shortcuts,
                    touch_swipe_panel,
                    skip_loading_on_click,
                    sync_projection_aspect,
                ),
                execute_actions,
                orbit_input_system,
                advance_transitions,
                orbit_camera_system,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                apply_lighting.run_if(resource_changed::<ConfiguratorConfig>),
                apply_bloom.run_if(resource_changed::<ConfiguratorConfig>),
                animate_spotlight,
                draw_grid_system,
            ),
        )
        .add_systems(
            Update,
            (tick_notifications, monitor_performance, update_fps_overlay),
        )
        .add_systems(EguiPrimaryContextPass, ui_system)
        .run();
}

fn load_initial_material_roles() -> MaterialRoleMap {
    let path = Path::new(MATERIAL_ROLES_PATH);
    match load_material_roles(path) {
        Ok(roles) => {
            info!("loaded {} material roles from {}", roles.roles.len(), path.display());
            roles
        }
        Err(err) => {
            warn!("{err}; using built-in role mapping");
            default_material_roles()
        }
    }
}
