use crate::car_configurator::assets::{EnvironmentBackground, cube_image_from_faces};
use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::scene::{ConfiguratorCamera, KeySpotLight, RimLight};
use bevy::core_pipeline::Skybox;
use bevy::post_process::bloom::{Bloom, BloomPrefilter};
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use tracing::{debug, warn};

pub const SPOTLIGHT_BASE_LUMENS: f32 = 1_200_000.0;
pub const AMBIENT_BASE_BRIGHTNESS: f32 = 500.0;
pub const RIM_BASE_LUX: f32 = 2_500.0;
pub const SKYBOX_BASE_NITS: f32 = 1_000.0;
pub const SPOTLIGHT_ORBIT_RADIUS: f32 = 6.0;
pub const SPOTLIGHT_HEIGHT: f32 = 8.0;
pub const SPOTLIGHT_ORBIT_SPEED: f32 = 0.3;
const BLUR_STEPS: f32 = 20.0;

pub fn bloom_from_config(config: &ConfiguratorConfig) -> Bloom {
    let mut bloom = Bloom::NATURAL;
    write_bloom(&mut bloom, config);
    bloom
}

fn write_bloom(bloom: &mut Bloom, config: &ConfiguratorConfig) {
    bloom.intensity = config.bloom_strength;
    bloom.high_pass_frequency = config.bloom_radius.clamp(0.05, 1.0);
    bloom.prefilter = BloomPrefilter {
        threshold: config.bloom_threshold,
        threshold_softness: 0.25,
    };
}

pub fn spotlight_orbit_position(elapsed_secs: f32) -> Vec3 {
    let angle = elapsed_secs * SPOTLIGHT_ORBIT_SPEED;
    Vec3::new(
        angle.cos() * SPOTLIGHT_ORBIT_RADIUS,
        SPOTLIGHT_HEIGHT,
        angle.sin() * SPOTLIGHT_ORBIT_RADIUS,
    )
}

pub fn animate_spotlight(
    time: Res<Time>,
    mut spot_query: Query<&mut Transform, With<KeySpotLight>>,
) {
    let position = spotlight_orbit_position(time.elapsed_secs());
    for mut transform in &mut spot_query {
        *transform = Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y);
    }
}

pub fn apply_lighting(
    config: Res<ConfiguratorConfig>,
    mut ambient: ResMut<GlobalAmbientLight>,
    mut spot_query: Query<&mut SpotLight, With<KeySpotLight>>,
    mut rim_query: Query<&mut DirectionalLight, With<RimLight>>,
) {
    for mut spot in &mut spot_query {
        spot.intensity = SPOTLIGHT_BASE_LUMENS * config.spotlight_intensity;
    }
    ambient.brightness = AMBIENT_BASE_BRIGHTNESS * config.ambient_intensity;
    // Both rim lights share one intensity; only their colours differ.
    for mut rim in &mut rim_query {
        rim.illuminance = RIM_BASE_LUX * config.rim_intensity;
    }
}

pub fn apply_bloom(
    config: Res<ConfiguratorConfig>,
    mut bloom_query: Query<&mut Bloom, With<ConfiguratorCamera>>,
) {
    for mut bloom in &mut bloom_query {
        write_bloom(&mut bloom, &config);
    }
}

pub fn apply_background(
    config: Res<ConfiguratorConfig>,
    mut background: ResMut<EnvironmentBackground>,
    mut images: ResMut<Assets<Image>>,
    mut skybox_query: Query<&mut Skybox, With<ConfiguratorCamera>>,
) {
    let Ok(mut skybox) = skybox_query.single_mut() else {
        return;
    };
    let Some(source) = background.source.clone() else {
        return;
    };

    skybox.brightness = SKYBOX_BASE_NITS * config.background_intensity;

    let blur_key = blur_key(config.background_blur);
    if blur_key == 0 {
        if skybox.image != source {
            skybox.image = source;
        }
        return;
    }

    if let Some((cached_key, handle)) = &background.blurred {
        if *cached_key == blur_key {
            if skybox.image != *handle {
                skybox.image = handle.clone();
            }
            return;
        }
    }

    let Some(source_image) = images.get(&source) else {
        return;
    };
    let sigma = blur_key as f32 / BLUR_STEPS * source_image.width() as f32 * 0.04;
    match blur_cube_image(source_image, sigma) {
        Some(blurred) => {
            let handle = images.add(blurred);
            debug!("regenerated background blur at step {blur_key}");
            skybox.image = handle.clone();
            background.blurred = Some((blur_key, handle));
        }
        None => {
            warn!(
                "background blur unsupported for texture format {:?}",
                source_image.texture_descriptor.format
            );
            background.blurred = Some((blur_key, source));
        }
    }
}

fn blur_key(blur: f32) -> u32 {
    (blur.clamp(0.0, 1.0) * BLUR_STEPS).round() as u32
}

pub fn blur_cube_image(source: &Image, sigma: f32) -> Option<Image> {
    let format = source.texture_descriptor.format;
    if !matches!(
        format,
        TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm
    ) {
        return None;
    }

    let size = source.texture_descriptor.size;
    let face_len = (size.width * size.height * 4) as usize;
    let data = source.data.as_ref()?;
    if face_len == 0 || data.len() != face_len * size.depth_or_array_layers as usize {
        return None;
    }

    let mut faces = Vec::with_capacity(size.depth_or_array_layers as usize);
    for chunk in data.chunks_exact(face_len) {
        let face = image::RgbaImage::from_raw(size.width, size.height, chunk.to_vec())?;
        faces.push(image::imageops::blur(&face, sigma.max(0.1)).into_raw());
    }

    Some(cube_image_from_faces(size.width, faces.concat(), format))
}
