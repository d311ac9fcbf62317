pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod lighting;
pub mod materials;
pub mod performance;
pub mod presets;
pub mod scene;
pub mod transitions;
pub mod ui;

use bevy::math::Vec3;

pub const ENVIRONMENT_PATH: &str = "environment/showroom_cubemap.png";
pub const MODEL_PATH: &str = "models/car.glb";
pub const MATERIAL_ROLES_PATH: &str = "assets/models/car.roles.ron";
pub const PRESETS_PATH: &str = "config/presets.ron";
pub const SCREENSHOT_DIR: &str = "screenshots";

pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(5.0, 3.0, 8.0);
pub const DEFAULT_CAMERA_TARGET: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const CAMERA_TRANSITION_SECS: f32 = 1.5;
pub const PAINT_TRANSITION_SECS: f32 = 1.0;
pub const NOTIFICATION_SECS: f32 = 2.5;

pub const GRID_EXTENT_METERS: i32 = 10;
pub const GRID_MAJOR_STEP_METERS: i32 = 5;
