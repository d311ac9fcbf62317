use bevy::color::{Color, Srgba};
use bevy::prelude::Resource;
use std::ops::RangeInclusive;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ConfiguratorConfig {
    pub paint_color: Color,
    pub caliper_color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub environment_intensity: f32,
    pub background_intensity: f32,
    pub background_blur: f32,
    pub spotlight_intensity: f32,
    pub ambient_intensity: f32,
    pub rim_intensity: f32,
    pub auto_rotate: bool,
    pub rotation_speed: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            paint_color: Color::srgb(0.72, 0.04, 0.06),
            caliper_color: Color::srgb(0.95, 0.78, 0.12),
            metalness: 0.9,
            roughness: 0.2,
            clearcoat: 1.0,
            clearcoat_roughness: 0.03,
            environment_intensity: 1.0,
            background_intensity: 1.0,
            background_blur: 0.0,
            spotlight_intensity: 1.0,
            ambient_intensity: 0.4,
            rim_intensity: 0.6,
            auto_rotate: false,
            rotation_speed: 0.3,
            bloom_strength: 0.15,
            bloom_radius: 0.8,
            bloom_threshold: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSection {
    Paint,
    Environment,
    Lighting,
    Animation,
    PostProcessing,
}

impl PanelSection {
    pub const ALL: [PanelSection; 5] = [
        PanelSection::Paint,
        PanelSection::Environment,
        PanelSection::Lighting,
        PanelSection::Animation,
        PanelSection::PostProcessing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Paint => "Paint & Material",
            Self::Environment => "Environment",
            Self::Lighting => "Lighting",
            Self::Animation => "Animation",
            Self::PostProcessing => "Post Processing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorField {
    Paint,
    Caliper,
}

impl ColorField {
    pub const ALL: [ColorField; 2] = [ColorField::Paint, ColorField::Caliper];

    pub fn label(self) -> &'static str {
        match self {
            Self::Paint => "Paint Color",
            Self::Caliper => "Caliper Color",
        }
    }

    pub fn get(self, config: &ConfiguratorConfig) -> Color {
        match self {
            Self::Paint => config.paint_color,
            Self::Caliper => config.caliper_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Metalness,
    Roughness,
    Clearcoat,
    ClearcoatRoughness,
    EnvironmentIntensity,
    BackgroundIntensity,
    BackgroundBlur,
    SpotlightIntensity,
    AmbientIntensity,
    RimIntensity,
    RotationSpeed,
    BloomStrength,
    BloomRadius,
    BloomThreshold,
}

impl ScalarField {
    pub const ALL: [ScalarField; 14] = [
        ScalarField::Metalness,
        ScalarField::Roughness,
        ScalarField::Clearcoat,
        ScalarField::ClearcoatRoughness,
        ScalarField::EnvironmentIntensity,
        ScalarField::BackgroundIntensity,
        ScalarField::BackgroundBlur,
        ScalarField::SpotlightIntensity,
        ScalarField::AmbientIntensity,
        ScalarField::RimIntensity,
        ScalarField::RotationSpeed,
        ScalarField::BloomStrength,
        ScalarField::BloomRadius,
        ScalarField::BloomThreshold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Metalness => "Metalness",
            Self::Roughness => "Roughness",
            Self::Clearcoat => "Clear Coat",
            Self::ClearcoatRoughness => "Clear Coat Roughness",
            Self::EnvironmentIntensity => "Env Map Intensity",
            Self::BackgroundIntensity => "Background Intensity",
            Self::BackgroundBlur => "Background Blur",
            Self::SpotlightIntensity => "Spotlight",
            Self::AmbientIntensity => "Ambient",
            Self::RimIntensity => "Rim Lights",
            Self::RotationSpeed => "Rotation Speed",
            Self::BloomStrength => "Bloom Strength",
            Self::BloomRadius => "Bloom Radius",
            Self::BloomThreshold => "Bloom Threshold",
        }
    }

    pub fn section(self) -> PanelSection {
        match self {
            Self::Metalness | Self::Roughness | Self::Clearcoat | Self::ClearcoatRoughness => {
                PanelSection::Paint
            }
            Self::EnvironmentIntensity | Self::BackgroundIntensity | Self::BackgroundBlur => {
                PanelSection::Environment
            }
            Self::SpotlightIntensity | Self::AmbientIntensity | Self::RimIntensity => {
                PanelSection::Lighting
            }
            Self::RotationSpeed => PanelSection::Animation,
            Self::BloomStrength | Self::BloomRadius | Self::BloomThreshold => {
                PanelSection::PostProcessing
            }
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::Metalness
            | Self::Roughness
            | Self::Clearcoat
            | Self::ClearcoatRoughness
            | Self::BackgroundBlur
            | Self::BloomRadius => 0.0..=1.0,
            Self::EnvironmentIntensity | Self::SpotlightIntensity => 0.0..=3.0,
            Self::BackgroundIntensity | Self::AmbientIntensity | Self::RimIntensity => 0.0..=2.0,
            Self::RotationSpeed => 0.0..=2.0,
            Self::BloomStrength => 0.0..=1.0,
            Self::BloomThreshold => 0.0..=1.5,
        }
    }

    pub fn step(self) -> f32 {
        match self {
            Self::ClearcoatRoughness | Self::BloomStrength => 0.005,
            _ => 0.01,
        }
    }

    pub fn get(self, config: &ConfiguratorConfig) -> f32 {
        match self {
            Self::Metalness => config.metalness,
            Self::Roughness => config.roughness,
            Self::Clearcoat => config.clearcoat,
            Self::ClearcoatRoughness => config.clearcoat_roughness,
            Self::EnvironmentIntensity => config.environment_intensity,
            Self::BackgroundIntensity => config.background_intensity,
            Self::BackgroundBlur => config.background_blur,
            Self::SpotlightIntensity => config.spotlight_intensity,
            Self::AmbientIntensity => config.ambient_intensity,
            Self::RimIntensity => config.rim_intensity,
            Self::RotationSpeed => config.rotation_speed,
            Self::BloomStrength => config.bloom_strength,
            Self::BloomRadius => config.bloom_radius,
            Self::BloomThreshold => config.bloom_threshold,
        }
    }

    fn slot(self, config: &mut ConfiguratorConfig) -> &mut f32 {
        match self {
            Self::Metalness => &mut config.metalness,
            Self::Roughness => &mut config.roughness,
            Self::Clearcoat => &mut config.clearcoat,
            Self::ClearcoatRoughness => &mut config.clearcoat_roughness,
            Self::EnvironmentIntensity => &mut config.environment_intensity,
            Self::BackgroundIntensity => &mut config.background_intensity,
            Self::BackgroundBlur => &mut config.background_blur,
            Self::SpotlightIntensity => &mut config.spotlight_intensity,
            Self::AmbientIntensity => &mut config.ambient_intensity,
            Self::RimIntensity => &mut config.rim_intensity,
            Self::RotationSpeed => &mut config.rotation_speed,
            Self::BloomStrength => &mut config.bloom_strength,
            Self::BloomRadius => &mut config.bloom_radius,
            Self::BloomThreshold => &mut config.bloom_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigUpdate {
    Color(ColorField, Color),
    Scalar(ScalarField, f32),
    AutoRotate(bool),
}

impl ConfiguratorConfig {
    pub fn apply(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::Color(ColorField::Paint, color) => self.paint_color = color,
            ConfigUpdate::Color(ColorField::Caliper, color) => self.caliper_color = color,
            ConfigUpdate::Scalar(field, value) => *field.slot(self) = value,
            ConfigUpdate::AutoRotate(enabled) => self.auto_rotate = enabled,
        }
    }

    pub fn apply_all(&mut self, updates: impl IntoIterator<Item = ConfigUpdate>) {
        for update in updates {
            self.apply(update);
        }
    }
}

pub fn color_to_rgb(color: Color) -> [f32; 3] {
    let srgba = color.to_srgba();
    [srgba.red, srgba.green, srgba.blue]
}

pub fn rgb_to_color(rgb: [f32; 3]) -> Color {
    Color::Srgba(Srgba::rgb(rgb[0], rgb[1], rgb[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_sit_inside_declared_ranges() {
        let config = ConfiguratorConfig::default();
        for field in ScalarField::ALL {
            let value = field.get(&config);
            assert!(
                field.range().contains(&value),
                "{} default {value} outside {:?}",
                field.label(),
                field.range()
            );
        }
    }

    #[test]
    fn scalar_update_writes_only_its_field() {
        let mut config = ConfiguratorConfig::default();
        let mut expected = config.clone();
        expected.roughness = 0.55;

        config.apply(ConfigUpdate::Scalar(ScalarField::Roughness, 0.55));

        assert_eq!(config, expected);
    }

    #[test]
    fn out_of_range_writes_are_stored_unvalidated() {
        let mut config = ConfiguratorConfig::default();
        config.apply(ConfigUpdate::Scalar(ScalarField::Metalness, 4.0));
        assert_eq!(config.metalness, 4.0);
    }

    #[test]
    fn colour_updates_and_rgb_conversion_agree() {
        let mut config = ConfiguratorConfig::default();
        config.apply(ConfigUpdate::Color(
            ColorField::Caliper,
            rgb_to_color([0.1, 0.2, 0.3]),
        ));
        assert_eq!(color_to_rgb(ColorField::Caliper.get(&config)), [0.1, 0.2, 0.3]);
    }

    #[test]
    fn every_section_has_at_least_one_field() {
        for section in PanelSection::ALL {
            assert!(
                ScalarField::ALL.iter().any(|f| f.section() == section),
                "{} has no fields",
                section.label()
            );
        }
    }
}
