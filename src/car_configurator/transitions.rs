use crate::car_configurator::camera::OrbitCamera;
use crate::car_configurator::config::{ColorField, ConfigUpdate, ConfiguratorConfig};
use bevy::color::{Color, LinearRgba, Mix};
use bevy::math::curve::{Curve, EaseFunction};
use bevy::prelude::*;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKey {
    Camera,
    PaintColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionTarget {
    Camera {
        from_eye: Vec3,
        to_eye: Vec3,
        from_focus: Vec3,
        to_focus: Vec3,
    },
    PaintColor {
        from: Color,
        to: Color,
    },
}

impl TransitionTarget {
    pub fn key(&self) -> TransitionKey {
        match self {
            Self::Camera { .. } => TransitionKey::Camera,
            Self::PaintColor { .. } => TransitionKey::PaintColor,
        }
    }

    fn sample(&self, t: f32) -> TransitionSample {
        match *self {
            Self::Camera {
                from_eye,
                to_eye,
                from_focus,
                to_focus,
            } => {
                if t >= 1.0 {
                    return TransitionSample::Camera {
                        eye: to_eye,
                        focus: to_focus,
                    };
                }
                TransitionSample::Camera {
                    eye: from_eye.lerp(to_eye, t),
                    focus: from_focus.lerp(to_focus, t),
                }
            }
            Self::PaintColor { from, to } => {
                if t >= 1.0 {
                    return TransitionSample::PaintColor(to);
                }
                let blended: LinearRgba = from.to_linear().mix(&to.to_linear(), t);
                TransitionSample::PaintColor(Color::LinearRgba(blended))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionSample {
    Camera { eye: Vec3, focus: Vec3 },
    PaintColor(Color),
}

#[derive(Debug, Clone)]
pub struct Transition {
    target: TransitionTarget,
    duration: f32,
    elapsed: f32,
    ease: EaseFunction,
}

impl Transition {
    pub fn new(target: TransitionTarget, duration: f32) -> Self {
        Self {
            target,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ease: EaseFunction::QuadraticInOut,
        }
    }

    fn progress(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[derive(Resource, Debug, Default)]
pub struct Transitions {
    active: HashMap<TransitionKey, Transition>,
}

impl Transitions {
    pub fn start(&mut self, target: TransitionTarget, duration: f32) -> bool {
        let key = target.key();
        let cancelled = self
            .active
            .insert(key, Transition::new(target, duration))
            .is_some();
        if cancelled {
            debug!("cancelled running {key:?} transition");
        }
        cancelled
    }

    pub fn is_active(&self, key: TransitionKey) -> bool {
        self.active.contains_key(&key)
    }

    pub fn cancel(&mut self, key: TransitionKey) {
        self.active.remove(&key);
    }

    pub fn advance(&mut self, dt: f32) -> Vec<TransitionSample> {
        let mut samples = Vec::with_capacity(self.active.len());
        self.active.retain(|_, transition| {
            transition.elapsed += dt;
            let progress = transition.progress();
            let eased = if transition.is_finished() {
                1.0
            } else {
                transition.ease.sample_clamped(progress)
            };
            samples.push(transition.target.sample(eased));
            !transition.is_finished()
        });
        samples
    }
}

pub fn advance_transitions(
    time: Res<Time>,
    mut transitions: ResMut<Transitions>,
    mut config: ResMut<ConfiguratorConfig>,
    mut orbit: ResMut<OrbitCamera>,
) {
    if transitions.active.is_empty() {
        return;
    }

    for sample in transitions.advance(time.delta_secs()) {
        match sample {
            TransitionSample::Camera { eye, focus } => orbit.set_pose(eye, focus),
            TransitionSample::PaintColor(color) => {
                config.apply(ConfigUpdate::Color(ColorField::Paint, color));
            }
        }
    }
}
