use crate::car_configurator::PAINT_TRANSITION_SECS;
use crate::car_configurator::config::{ConfigUpdate, ConfiguratorConfig, ScalarField, rgb_to_color};
use crate::car_configurator::transitions::{TransitionTarget, Transitions};
use crate::car_configurator::ui::Notifications;
use anyhow::{Context, bail};
use bevy::prelude::{Color, Resource};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preset {
    pub name: String,
    pub paint_color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
}

impl Preset {
    pub fn paint_color(&self) -> Color {
        rgb_to_color(self.paint_color)
    }

    pub fn immediate_updates(&self) -> [ConfigUpdate; 4] {
        [
            ConfigUpdate::Scalar(ScalarField::Metalness, self.metalness),
            ConfigUpdate::Scalar(ScalarField::Roughness, self.roughness),
            ConfigUpdate::Scalar(ScalarField::Clearcoat, self.clearcoat),
            ConfigUpdate::Scalar(ScalarField::ClearcoatRoughness, self.clearcoat_roughness),
        ]
    }
}

#[derive(Resource, Debug, Clone, Deserialize)]
pub struct PresetLibrary {
    pub presets: Vec<Preset>,
}

impl PresetLibrary {
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|preset| preset.name.as_str())
    }
}

impl Default for PresetLibrary {
    fn default() -> Self {
        let preset = |name: &str, paint_color, metalness, roughness, clearcoat, clearcoat_roughness| {
            Preset {
                name: name.to_string(),
                paint_color,
                metalness,
                roughness,
                clearcoat,
                clearcoat_roughness,
            }
        };
        Self {
            presets: vec![
                preset("Racing Red", [0.72, 0.04, 0.06], 0.9, 0.2, 1.0, 0.03),
                preset("Midnight Black", [0.02, 0.02, 0.025], 0.7, 0.15, 1.0, 0.02),
                preset("Pearl White", [0.92, 0.92, 0.9], 0.3, 0.25, 1.0, 0.05),
                preset("Electric Blue", [0.05, 0.25, 0.85], 0.95, 0.1, 0.8, 0.04),
            ],
        }
    }
}

pub fn load_preset_library(path: &Path) -> anyhow::Result<PresetLibrary> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let library = ron::de::from_str::<PresetLibrary>(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if library.presets.is_empty() {
        bail!("{} defines no presets", path.display());
    }
    Ok(library)
}

pub fn load_initial_presets(path: &Path) -> PresetLibrary {
    if !path.exists() {
        return PresetLibrary::default();
    }
    load_preset_library(path).unwrap_or_else(|err| {
        warn!("falling back to built-in presets: {err:#}");
        PresetLibrary::default()
    })
}

pub fn apply_preset(
    name: &str,
    library: &PresetLibrary,
    config: &mut ConfiguratorConfig,
    transitions: &mut Transitions,
    notifications: &mut Notifications,
) -> bool {
    let Some(preset) = library.get(name) else {
        debug!("ignoring unknown preset '{name}'");
        return false;
    };

    transitions.start(
        TransitionTarget::PaintColor {
            from: config.paint_color,
            to: preset.paint_color(),
        },
        PAINT_TRANSITION_SECS,
    );
    config.apply_all(preset.immediate_updates());
    notifications.info(format!("Applied {} preset", preset.name));
    info!("applied preset '{}'", preset.name);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car_configurator::transitions::TransitionSample;
    use approx::assert_relative_eq;

    fn run_paint_transition(transitions: &mut Transitions, config: &mut ConfiguratorConfig) {
        for _ in 0..90 {
            for sample in transitions.advance(1.0 / 60.0) {
                if let TransitionSample::PaintColor(color) = sample {
                    config.paint_color = color;
                }
            }
        }
    }

    #[test]
    fn preset_fields_match_after_transition() {
        let library = PresetLibrary::default();
        let mut config = ConfiguratorConfig::default();
        let mut transitions = Transitions::default();
        let mut notifications = Notifications::default();

        for preset in &library.presets {
            assert!(apply_preset(
                &preset.name,
                &library,
                &mut config,
                &mut transitions,
                &mut notifications,
            ));
            assert_eq!(config.metalness, preset.metalness);
            assert_eq!(config.roughness, preset.roughness);
            assert_eq!(config.clearcoat, preset.clearcoat);
            assert_eq!(config.clearcoat_roughness, preset.clearcoat_roughness);

            run_paint_transition(&mut transitions, &mut config);
            let actual = config.paint_color.to_srgba();
            let expected = preset.paint_color();
            let expected = expected.to_srgba();
            assert_relative_eq!(actual.red, expected.red, epsilon = 1e-5);
            assert_relative_eq!(actual.green, expected.green, epsilon = 1e-5);
            assert_relative_eq!(actual.blue, expected.blue, epsilon = 1e-5);
        }
    }

    #[test]
    fn paint_colour_is_not_cut_immediately() {
        let library = PresetLibrary::default();
        let mut config = ConfiguratorConfig::default();
        let before = config.paint_color;
        let mut transitions = Transitions::default();
        let mut notifications = Notifications::default();

        apply_preset("Pearl White", &library, &mut config, &mut transitions, &mut notifications);
        assert_eq!(config.paint_color, before);
        assert!(notifications.current().is_some());
    }

    #[test]
    fn unknown_preset_is_a_no_op() {
        let library = PresetLibrary::default();
        let mut config = ConfiguratorConfig::default();
        let mut transitions = Transitions::default();
        let mut notifications = Notifications::default();

        assert!(!apply_preset(
            "Does Not Exist",
            &library,
            &mut config,
            &mut transitions,
            &mut notifications,
        ));
        assert_eq!(config, ConfiguratorConfig::default());
        assert!(transitions.advance(1.0).is_empty());
        assert!(notifications.current().is_none());
    }

    #[test]
    fn second_preset_mid_blend_wins() {
        let library = PresetLibrary::default();
        let mut config = ConfiguratorConfig::default();
        let mut transitions = Transitions::default();
        let mut notifications = Notifications::default();

        apply_preset("Pearl White", &library, &mut config, &mut transitions, &mut notifications);
        for sample in transitions.advance(0.3) {
            if let TransitionSample::PaintColor(color) = sample {
                config.paint_color = color;
            }
        }
        apply_preset("Electric Blue", &library, &mut config, &mut transitions, &mut notifications);
        run_paint_transition(&mut transitions, &mut config);

        let blue = library.get("Electric Blue").unwrap().paint_color().to_srgba();
        assert_relative_eq!(config.paint_color.to_srgba().blue, blue.blue, epsilon = 1e-5);
    }

    #[test]
    fn preset_file_parses() {
        let text = r#"(presets: [(name: "Lime", paint_color: (0.4, 0.9, 0.1), metalness: 0.5,
            roughness: 0.3, clearcoat: 1.0, clearcoat_roughness: 0.1)])"#;
        let library: PresetLibrary = ron::de::from_str(text).expect("valid presets");
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["Lime"]);
    }

    #[test]
    fn missing_preset_file_uses_built_ins() {
        let library = load_initial_presets(Path::new("config/does-not-exist.ron"));
        assert_eq!(library.presets.len(), PresetLibrary::default().presets.len());
    }
}
