use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::error::LoadError;
use crate::car_configurator::lighting::SKYBOX_BASE_NITS;
use crate::car_configurator::materials::{ENVIRONMENT_BASE_INTENSITY, MaterialRole};
use crate::car_configurator::scene::{CarRoot, ConfiguratorCamera};
use crate::car_configurator::ui::Notifications;
use crate::car_configurator::{ENVIRONMENT_PATH, MODEL_PATH};
use bevy::asset::{LoadState, RenderAssetUsages};
use bevy::core_pipeline::Skybox;
use bevy::light::GeneratedEnvironmentMapLight;
use bevy::prelude::*;
use bevy::render::render_resource::{
    Extent3d, TextureDimension, TextureFormat, TextureViewDescriptor, TextureViewDimension,
};
use std::f32::consts::FRAC_PI_2;
use tracing::{error, info, warn};

pub const LOADING_STAGES: [&str; 6] = [
    "Initializing engine",
    "Loading environment",
    "Loading car model",
    "Preparing materials",
    "Finalizing scene",
    "Ready",
];
const PROGRESS_PERCENT_PER_SEC: f32 = 140.0;
const OVERLAY_HOLD_SECS: f32 = 0.4;
pub const FALLBACK_ENVIRONMENT_FACE_SIZE: u32 = 256;
pub const FALLBACK_WHEEL_RADIUS: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSlot {
    Pending,
    Loaded,
    Fallback,
}

impl AssetSlot {
    fn is_settled(self) -> bool {
        self != AssetSlot::Pending
    }
}

#[derive(Resource)]
pub struct PendingAssets {
    pub environment: Handle<Image>,
    pub model: Handle<Gltf>,
    pub environment_slot: AssetSlot,
    pub model_slot: AssetSlot,
}

impl PendingAssets {
    pub fn settled_fraction(&self) -> f32 {
        let settled = [self.environment_slot, self.model_slot]
            .into_iter()
            .filter(|slot| slot.is_settled())
            .count();
        settled as f32 / 2.0
    }
}

#[derive(Resource, Default)]
pub struct EnvironmentBackground {
    pub source: Option<Handle<Image>>,
    pub blurred: Option<(u32, Handle<Image>)>,
}

#[derive(Resource, Debug, Clone)]
pub struct LoadingProgress {
    pub target: f32,
    pub percent: f32,
    pub visible: bool,
    pub complete: bool,
    hold_remaining: f32,
}

impl Default for LoadingProgress {
    fn default() -> Self {
        Self {
            target: 0.0,
            percent: 0.0,
            visible: true,
            complete: false,
            hold_remaining: OVERLAY_HOLD_SECS,
        }
    }
}

impl LoadingProgress {
    pub fn stage(&self) -> &'static str {
        stage_for_progress(self.percent / 100.0)
    }

    pub fn advance(&mut self, dt: f32, target: f32) {
        if self.complete {
            return;
        }
        self.target = target.clamp(0.0, 1.0);
        let goal = self.target * 100.0;
        if self.percent < goal {
            self.percent = (self.percent + PROGRESS_PERCENT_PER_SEC * dt).min(goal);
        }
        if self.percent >= 100.0 {
            self.hold_remaining -= dt;
            if self.hold_remaining <= 0.0 {
                self.finish();
            }
        }
    }

    pub fn force_complete(&mut self) {
        self.target = 1.0;
        self.percent = 100.0;
        self.finish();
    }

    fn finish(&mut self) {
        self.complete = true;
        self.visible = false;
    }
}

pub fn stage_for_progress(fraction: f32) -> &'static str {
    let last = LOADING_STAGES.len() - 1;
    let idx = (fraction.clamp(0.0, 1.0) * last as f32).floor() as usize;
    LOADING_STAGES[idx.min(last)]
}

pub fn start_asset_loads(mut commands: Commands, asset_server: Res<AssetServer>) {
    let environment = asset_server.load(ENVIRONMENT_PATH);
    let model = asset_server.load::<Gltf>(MODEL_PATH);
    info!("requested environment '{ENVIRONMENT_PATH}' and model '{MODEL_PATH}'");
    commands.insert_resource(PendingAssets {
        environment,
        model,
        environment_slot: AssetSlot::Pending,
        model_slot: AssetSlot::Pending,
    });
}

#[allow(clippy::too_many_arguments)]
pub fn poll_environment_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<ConfiguratorConfig>,
    mut pending: ResMut<PendingAssets>,
    mut images: ResMut<Assets<Image>>,
    mut background: ResMut<EnvironmentBackground>,
    mut notifications: ResMut<Notifications>,
    camera_query: Query<Entity, With<ConfiguratorCamera>>,
) {
    if pending.environment_slot.is_settled() {
        return;
    }
    let Ok(camera) = camera_query.single() else {
        return;
    };

    let outcome = match asset_server.load_state(pending.environment.id()) {
        LoadState::Loaded => match images.get(&pending.environment) {
            Some(image) => stacked_to_cube(image, ENVIRONMENT_PATH),
            None => return,
        },
        LoadState::Failed(err) => Err(LoadError::from_asset_error(ENVIRONMENT_PATH, &err)),
        _ => return,
    };

    pending.environment_slot = settle_environment(
        outcome,
        camera,
        &mut commands,
        &mut images,
        &mut background,
        &config,
        &mut notifications,
    );
}

pub fn settle_environment(
    outcome: Result<Image, LoadError>,
    camera: Entity,
    commands: &mut Commands,
    images: &mut Assets<Image>,
    background: &mut EnvironmentBackground,
    config: &ConfiguratorConfig,
    notifications: &mut Notifications,
) -> AssetSlot {
    let (cube, slot) = match outcome {
        Ok(cube) => {
            info!("environment ready");
            (cube, AssetSlot::Loaded)
        }
        Err(err) => {
            report_load_failure(&err, notifications);
            (gradient_cube_image(FALLBACK_ENVIRONMENT_FACE_SIZE), AssetSlot::Fallback)
        }
    };

    let handle = images.add(cube);
    commands.entity(camera).insert((
        Skybox {
            image: handle.clone(),
            brightness: SKYBOX_BASE_NITS * config.background_intensity,
            ..default()
        },
        GeneratedEnvironmentMapLight {
            environment_map: handle.clone(),
            intensity: ENVIRONMENT_BASE_INTENSITY * config.environment_intensity,
            ..default()
        },
    ));
    background.source = Some(handle);
    background.blurred = None;
    slot
}

#[derive(Debug, Clone)]
pub enum ModelStatus {
    Pending,
    Ready(Handle<Scene>),
    Failed(LoadError),
}

// `scenes` is `None` until the glTF asset itself is in `Assets<Gltf>`.
pub fn model_status(state: &LoadState, scenes: Option<&[Handle<Scene>]>) -> ModelStatus {
    match (state, scenes) {
        (LoadState::Loaded, Some(scenes)) => match scenes.first() {
            Some(scene) => ModelStatus::Ready(scene.clone()),
            None => ModelStatus::Failed(LoadError::Unexpected {
                path: MODEL_PATH.to_string(),
                reason: "file contains no scenes".to_string(),
            }),
        },
        (LoadState::Failed(err), _) => {
            ModelStatus::Failed(LoadError::from_asset_error(MODEL_PATH, err))
        }
        _ => ModelStatus::Pending,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    config: Res<ConfiguratorConfig>,
    mut pending: ResMut<PendingAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut notifications: ResMut<Notifications>,
    root_query: Query<Entity, With<CarRoot>>,
) {
    if pending.model_slot.is_settled() {
        return;
    }
    let Ok(root) = root_query.single() else {
        return;
    };

    let scenes = gltfs.get(&pending.model).map(|gltf| match &gltf.default_scene {
        Some(scene) => std::slice::from_ref(scene),
        None => gltf.scenes.as_slice(),
    });
    let status = model_status(&asset_server.load_state(pending.model.id()), scenes);
    if let Some(slot) = settle_model(
        status,
        root,
        &mut commands,
        &mut meshes,
        &mut materials,
        &config,
        &mut notifications,
    ) {
        pending.model_slot = slot;
    }
}

pub fn settle_model(
    status: ModelStatus,
    root: Entity,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    config: &ConfiguratorConfig,
    notifications: &mut Notifications,
) -> Option<AssetSlot> {
    match status {
        ModelStatus::Pending => None,
        ModelStatus::Ready(scene) => {
            let scene = commands.spawn(SceneRoot(scene)).id();
            commands.entity(root).add_child(scene);
            info!("car model ready");
            Some(AssetSlot::Loaded)
        }
        ModelStatus::Failed(err) => {
            report_load_failure(&err, notifications);
            spawn_fallback_car(commands, root, meshes, materials, config);
            Some(AssetSlot::Fallback)
        }
    }
}

pub fn update_loading_progress(
    time: Res<Time>,
    pending: Option<Res<PendingAssets>>,
    mut progress: ResMut<LoadingProgress>,
) {
    let target = pending.map_or(0.0, |pending| pending.settled_fraction());
    progress.advance(time.delta_secs(), target);
}

fn report_load_failure(err: &LoadError, notifications: &mut Notifications) {
    if err.is_fetch_failure() {
        warn!("{err}; using procedural fallback");
    } else {
        error!("{err}; using procedural fallback");
        notifications.error("Some assets failed to load. Showing fallback content.");
    }
}

pub fn stacked_to_cube(image: &Image, path: &str) -> Result<Image, LoadError> {
    let width = image.width();
    let height = image.height();
    if width == 0 || height != width * 6 {
        return Err(LoadError::Unexpected {
            path: path.to_string(),
            reason: format!("expected six stacked square faces, got {width}x{height}"),
        });
    }
    let data = image.data.clone().ok_or_else(|| LoadError::Unexpected {
        path: path.to_string(),
        reason: "image data is not available on the CPU".to_string(),
    })?;
    Ok(cube_image_from_faces(
        width,
        data,
        image.texture_descriptor.format,
    ))
}

pub fn cube_image_from_faces(face_size: u32, data: Vec<u8>, format: TextureFormat) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 6,
        },
        TextureDimension::D2,
        data,
        format,
        RenderAssetUsages::default(),
    );
    image.texture_view_descriptor = Some(TextureViewDescriptor {
        dimension: Some(TextureViewDimension::Cube),
        ..default()
    });
    image
}

pub fn gradient_cube_image(face_size: u32) -> Image {
    let size = face_size.max(1);
    let mut data = Vec::with_capacity((size * size * 4 * 6) as usize);

    let zenith = Vec3::new(0.10, 0.12, 0.16);
    let horizon = Vec3::new(0.46, 0.48, 0.52);
    let floor = Vec3::new(0.05, 0.05, 0.06);

    for face in 0..6 {
        for y in 0..size {
            let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
            for x in 0..size {
                let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                let direction = cube_face_direction(face, u, v);
                let elevation = direction.y;
                let color = if elevation >= 0.0 {
                    horizon.lerp(zenith, elevation.powf(0.6))
                } else {
                    horizon.lerp(floor, (-elevation).powf(0.4))
                };
                data.extend_from_slice(&[
                    (color.x * 255.0) as u8,
                    (color.y * 255.0) as u8,
                    (color.z * 255.0) as u8,
                    255,
                ]);
            }
        }
    }

    cube_image_from_faces(size, data, TextureFormat::Rgba8UnormSrgb)
}

// Face order +X, -X, +Y, -Y, +Z, -Z with `v` pointing down the face.
fn cube_face_direction(face: u32, u: f32, v: f32) -> Vec3 {
    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
    .normalize()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackCarLayout {
    pub body_size: Vec3,
    pub body_center: Vec3,
    pub wheel_centers: [Vec3; 4],
}

pub fn fallback_car_layout() -> FallbackCarLayout {
    FallbackCarLayout {
        body_size: Vec3::new(4.2, 0.8, 2.0),
        body_center: Vec3::new(0.0, 0.45, 0.0),
        wheel_centers: [
            Vec3::new(1.5, 0.0, 1.2),
            Vec3::new(1.5, 0.0, -1.2),
            Vec3::new(-1.5, 0.0, 1.2),
            Vec3::new(-1.5, 0.0, -1.2),
        ],
    }
}

#[derive(Component)]
pub struct FallbackBody;

#[derive(Component)]
pub struct FallbackWheel;

pub fn spawn_fallback_car(
    commands: &mut Commands,
    root: Entity,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    config: &ConfiguratorConfig,
) {
    let layout = fallback_car_layout();
    let body_mesh = meshes.add(Cuboid::from_size(layout.body_size));
    let wheel_mesh = meshes.add(Cylinder::new(FALLBACK_WHEEL_RADIUS, 0.3));

    let mut body_mat = StandardMaterial::default();
    crate::car_configurator::materials::apply_role_material(
        &mut body_mat,
        MaterialRole::Paint,
        config,
    );
    let body_mat = materials.add(body_mat);
    let wheel_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.04, 0.04, 0.04),
        perceptual_roughness: 0.9,
        ..default()
    });

    let car = commands
        .spawn((
            Name::new("fallback_car"),
            Transform::from_xyz(0.0, FALLBACK_WHEEL_RADIUS, 0.0),
            Visibility::default(),
        ))
        .with_children(|car| {
            car.spawn((
                Name::new("fallback_body"),
                FallbackBody,
                MaterialRole::Paint,
                Mesh3d(body_mesh),
                MeshMaterial3d(body_mat),
                Transform::from_translation(layout.body_center),
            ));
            for center in layout.wheel_centers {
                car.spawn((
                    Name::new("fallback_wheel"),
                    FallbackWheel,
                    Mesh3d(wheel_mesh.clone()),
                    MeshMaterial3d(wheel_mat.clone()),
                    Transform::from_translation(center)
                        .with_rotation(Quat::from_rotation_x(FRAC_PI_2)),
                ));
            }
        })
        .id();
    commands.entity(root).add_child(car);
    warn!("car model unavailable; spawned procedural fallback car");
}
