use crate::car_configurator::config::ConfiguratorConfig;
use crate::car_configurator::scene::ConfiguratorCamera;
use crate::car_configurator::transitions::{TransitionKey, TransitionTarget, Transitions};
use crate::car_configurator::{
    CAMERA_TRANSITION_SECS, DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET,
};
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

const ROTATE_SENSITIVITY: f32 = 0.005;
const ZOOM_SENSITIVITY: f32 = 0.12;
const DAMPING_FACTOR: f32 = 0.08;
const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;

// Cartesian pose so transitions land exactly on their targets.
#[derive(Resource, Debug, Clone)]
pub struct OrbitCamera {
    pub eye: Vec3,
    pub focus: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_pitch: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            eye: DEFAULT_CAMERA_POSITION,
            focus: DEFAULT_CAMERA_TARGET,
            min_distance: 3.0,
            max_distance: 20.0,
            max_pitch: FRAC_PI_2 - 0.05,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }
}

impl OrbitCamera {
    pub fn set_pose(&mut self, eye: Vec3, focus: Vec3) {
        self.eye = eye;
        self.focus = focus;
    }

    pub fn queue_rotation(&mut self, yaw: f32, pitch: f32) {
        self.pending_yaw += yaw;
        self.pending_pitch += pitch;
    }

    pub fn queue_zoom(&mut self, amount: f32) {
        self.pending_zoom += amount;
    }

    pub fn clear_pending(&mut self) {
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_zoom = 0.0;
    }

    pub fn has_pending_motion(&self) -> bool {
        self.pending_yaw.abs() > 1e-5 || self.pending_pitch.abs() > 1e-5 || self.pending_zoom.abs() > 1e-5
    }

    pub fn step(&mut self, dt: f32, auto_rotate_speed: Option<f32>) {
        let auto_yaw = auto_rotate_speed.map_or(0.0, |speed| speed * dt);
        if !self.has_pending_motion() && auto_yaw == 0.0 {
            return;
        }

        let consumed = 1.0 - (1.0 - DAMPING_FACTOR).powf(dt / REFERENCE_FRAME_SECS);
        let yaw_step = self.pending_yaw * consumed;
        let pitch_step = self.pending_pitch * consumed;
        let zoom_step = self.pending_zoom * consumed;
        self.pending_yaw -= yaw_step;
        self.pending_pitch -= pitch_step;
        self.pending_zoom -= zoom_step;
        if !self.has_pending_motion() {
            self.clear_pending();
        }

        let offset = self.eye - self.focus;
        let distance = offset.length().max(1e-4);
        let yaw = offset.x.atan2(offset.z) + yaw_step + auto_yaw;
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let pitch = if pitch_step == 0.0 {
            pitch
        } else {
            (pitch + pitch_step).clamp(0.02, self.max_pitch)
        };
        let distance = if zoom_step == 0.0 {
            distance
        } else {
            (distance * (1.0 - zoom_step)).clamp(self.min_distance, self.max_distance)
        };

        self.eye = self.focus + spherical_direction(yaw, pitch) * distance;
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye).looking_at(self.focus, Vec3::Y)
    }
}

#[derive(Resource, Default)]
pub struct UiInteractionState {
    pub wants_pointer_input: bool,
    pub wants_keyboard_input: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraView {
    Front,
    Side,
    Rear,
    Top,
}

impl CameraView {
    pub const ALL: [CameraView; 4] = [
        CameraView::Front,
        CameraView::Side,
        CameraView::Rear,
        CameraView::Top,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Side => "Side",
            Self::Rear => "Rear",
            Self::Top => "Top",
        }
    }

    pub fn pose(self) -> (Vec3, Vec3) {
        match self {
            Self::Front => (Vec3::new(0.0, 2.0, 8.0), Vec3::new(0.0, 1.0, 0.0)),
            Self::Side => (Vec3::new(8.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            Self::Rear => (Vec3::new(0.0, 2.0, -8.0), Vec3::new(0.0, 1.0, 0.0)),
            Self::Top => (Vec3::new(0.0, 12.0, 0.0), Vec3::ZERO),
        }
    }
}

pub fn reset_pose() -> (Vec3, Vec3) {
    (DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET)
}

pub fn start_camera_move(
    transitions: &mut Transitions,
    orbit: &mut OrbitCamera,
    (eye, focus): (Vec3, Vec3),
) {
    orbit.clear_pending();
    transitions.start(
        TransitionTarget::Camera {
            from_eye: orbit.eye,
            to_eye: eye,
            from_focus: orbit.focus,
            to_focus: focus,
        },
        CAMERA_TRANSITION_SECS,
    );
}

pub fn orbit_input_system(
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    ui_state: Res<UiInteractionState>,
    transitions: Res<Transitions>,
    mut orbit: ResMut<OrbitCamera>,
) {
    if ui_state.wants_pointer_input || transitions.is_active(TransitionKey::Camera) {
        return;
    }

    let mouse_delta = mouse_motion.delta;
    if mouse_buttons.pressed(MouseButton::Left) && mouse_delta.length_squared() > 0.0 {
        orbit.queue_rotation(
            -mouse_delta.x * ROTATE_SENSITIVITY,
            mouse_delta.y * ROTATE_SENSITIVITY,
        );
    }

    let scroll_delta = mouse_scroll.delta.y;
    if scroll_delta.abs() > f32::EPSILON {
        orbit.queue_zoom(scroll_delta * ZOOM_SENSITIVITY);
    }
}

pub fn orbit_camera_system(
    time: Res<Time>,
    config: Res<ConfiguratorConfig>,
    transitions: Res<Transitions>,
    mut orbit: ResMut<OrbitCamera>,
    mut camera_query: Query<&mut Transform, With<ConfiguratorCamera>>,
) {
    if !transitions.is_active(TransitionKey::Camera) {
        let auto_rotate = config.auto_rotate.then_some(config.rotation_speed);
        orbit.step(time.delta_secs(), auto_rotate);
    }

    for mut transform in &mut camera_query {
        *transform = orbit.transform();
    }
}

fn spherical_direction(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        yaw.cos() * pitch.cos(),
    )
    .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn run_until_idle(transitions: &mut Transitions, orbit: &mut OrbitCamera) {
        for _ in 0..240 {
            for sample in transitions.advance(1.0 / 60.0) {
                if let crate::car_configurator::transitions::TransitionSample::Camera {
                    eye,
                    focus,
                } = sample
                {
                    orbit.set_pose(eye, focus);
                }
            }
        }
    }

    #[rstest]
    #[case(CameraView::Front, Vec3::new(0.0, 2.0, 8.0), Vec3::new(0.0, 1.0, 0.0))]
    #[case(CameraView::Side, Vec3::new(8.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 0.0))]
    #[case(CameraView::Rear, Vec3::new(0.0, 2.0, -8.0), Vec3::new(0.0, 1.0, 0.0))]
    #[case(CameraView::Top, Vec3::new(0.0, 12.0, 0.0), Vec3::ZERO)]
    fn views_converge_to_their_pose(
        #[case] view: CameraView,
        #[case] eye: Vec3,
        #[case] focus: Vec3,
    ) {
        let mut transitions = Transitions::default();
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(Vec3::new(-3.0, 7.0, 2.0), Vec3::new(1.0, 0.0, 1.0));

        start_camera_move(&mut transitions, &mut orbit, view.pose());
        run_until_idle(&mut transitions, &mut orbit);

        assert_eq!(orbit.eye, eye);
        assert_eq!(orbit.focus, focus);
    }

    #[rstest]
    #[case(Vec3::new(0.0, 12.0, 0.0), Vec3::ZERO)]
    #[case(Vec3::new(-9.0, 0.5, 4.0), Vec3::new(2.0, 2.0, 2.0))]
    #[case(DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_TARGET)]
    fn reset_converges_from_any_pose(#[case] eye: Vec3, #[case] focus: Vec3) {
        let mut transitions = Transitions::default();
        let mut orbit = OrbitCamera::default();
        orbit.set_pose(eye, focus);
        orbit.queue_rotation(1.0, 0.3);

        start_camera_move(&mut transitions, &mut orbit, reset_pose());
        run_until_idle(&mut transitions, &mut orbit);

        assert_eq!(orbit.eye, Vec3::new(5.0, 3.0, 8.0));
        assert_eq!(orbit.focus, Vec3::new(0.0, 1.0, 0.0));
        assert!(!orbit.has_pending_motion());
    }

    #[test]
    fn auto_rotate_keeps_distance_and_height() {
        let mut orbit = OrbitCamera::default();
        let start_distance = orbit.eye.distance(orbit.focus);
        let start_height = orbit.eye.y;

        for _ in 0..120 {
            orbit.step(1.0 / 60.0, Some(0.5));
        }

        assert_relative_eq!(orbit.eye.distance(orbit.focus), start_distance, epsilon = 1e-3);
        assert_relative_eq!(orbit.eye.y, start_height, epsilon = 1e-3);
        assert!(orbit.eye.distance(DEFAULT_CAMERA_POSITION) > 0.5);
    }

    #[test]
    fn idle_camera_does_not_drift() {
        let mut orbit = OrbitCamera::default();
        orbit.step(1.0 / 60.0, None);
        assert_eq!(orbit.eye, DEFAULT_CAMERA_POSITION);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut orbit = OrbitCamera::default();
        orbit.queue_rotation(0.5, 0.0);

        orbit.step(1.0 / 60.0, None);
        let after_one = orbit.eye;
        assert!(orbit.has_pending_motion());

        for _ in 0..600 {
            orbit.step(1.0 / 60.0, None);
        }
        assert!(after_one.distance(orbit.eye) > 0.0);
        assert!(!orbit.has_pending_motion());
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut orbit = OrbitCamera::default();
        orbit.queue_zoom(50.0);
        for _ in 0..600 {
            orbit.step(1.0 / 60.0, None);
        }
        let distance = orbit.eye.distance(orbit.focus);
        assert!(distance >= orbit.min_distance - 1e-4);
    }
}
