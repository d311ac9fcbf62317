use crate::car_configurator::config::{ConfigUpdate, ConfiguratorConfig, ScalarField};
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use tracing::warn;

pub const SAMPLE_WINDOW_SECS: f32 = 5.0;
pub const MIN_ACCEPTABLE_FPS: f32 = 30.0;
pub const DEGRADED_BLOOM_FACTOR: f32 = 0.5;
pub const DEGRADED_SCALE_FACTOR: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReduction {
    pub measured_fps: f32,
}

#[derive(Resource, Debug, Default)]
pub struct PerformanceMonitor {
    frames: u32,
    window_elapsed: f32,
    degraded: bool,
    last_window_fps: Option<f32>,
}

impl PerformanceMonitor {
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn last_window_fps(&self) -> Option<f32> {
        self.last_window_fps
    }

    pub fn record_frame(&mut self, dt: f32) -> Option<QualityReduction> {
        self.frames += 1;
        self.window_elapsed += dt;
        if self.window_elapsed < SAMPLE_WINDOW_SECS {
            return None;
        }

        let fps = self.frames as f32 / self.window_elapsed;
        self.frames = 0;
        self.window_elapsed = 0.0;
        self.last_window_fps = Some(fps);

        if fps >= MIN_ACCEPTABLE_FPS || self.degraded {
            return None;
        }
        self.degraded = true;
        Some(QualityReduction { measured_fps: fps })
    }
}

#[derive(Component)]
pub struct FpsOverlayText;

pub fn spawn_fps_overlay(mut commands: Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: px(12),
            right: px(12),
            ..default()
        })
        .with_child((
            Text::new("FPS: --"),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            FpsOverlayText,
        ));
}

pub fn update_fps_overlay(
    diagnostics: Res<DiagnosticsStore>,
    mut text_query: Query<&mut Text, With<FpsOverlayText>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);

    for mut text in &mut text_query {
        **text = format!("FPS: {fps:>5.1}");
    }
}

pub fn monitor_performance(
    time: Res<Time<Real>>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut config: ResMut<ConfiguratorConfig>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Some(reduction) = monitor.record_frame(time.delta_secs()) else {
        return;
    };

    warn!(
        "average {:.1} fps over {SAMPLE_WINDOW_SECS}s; lowering render quality",
        reduction.measured_fps
    );
    if let Ok(mut window) = windows.single_mut() {
        window
            .resolution
            .set_scale_factor_override(Some(DEGRADED_SCALE_FACTOR));
    }
    let reduced = config.bloom_strength * DEGRADED_BLOOM_FACTOR;
    config.apply(ConfigUpdate::Scalar(ScalarField::BloomStrength, reduced));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(monitor: &mut PerformanceMonitor, fps: f32, seconds: f32) -> usize {
        let frames = (fps * seconds).round() as usize;
        (0..frames)
            .filter_map(|_| monitor.record_frame(1.0 / fps))
            .count()
    }

    #[test]
    fn fast_frames_never_reduce_quality() {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(run_frames(&mut monitor, 60.0, 20.0), 0);
        assert!(!monitor.is_degraded());
        assert!(monitor.last_window_fps().is_some_and(|fps| fps > 59.0));
    }

    #[test]
    fn slow_window_triggers_exactly_one_reduction() {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(run_frames(&mut monitor, 20.0, 5.2), 1);
        assert!(monitor.is_degraded());
    }

    #[test]
    fn degradation_is_never_repeated_or_undone() {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(run_frames(&mut monitor, 15.0, 30.0), 1);
        assert_eq!(run_frames(&mut monitor, 120.0, 30.0), 0);
        assert!(monitor.is_degraded());
    }

    #[test]
    fn nothing_happens_before_the_window_closes() {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(run_frames(&mut monitor, 10.0, 4.5), 0);
        assert!(monitor.last_window_fps().is_none());
    }
}
