use crate::car_configurator::SCREENSHOT_DIR;
use crate::car_configurator::assets::LoadingProgress;
use crate::car_configurator::camera::{
    CameraView, OrbitCamera, UiInteractionState, reset_pose, start_camera_move,
};
use crate::car_configurator::config::{ConfigUpdate, ConfiguratorConfig};
use crate::car_configurator::presets::{PresetLibrary, apply_preset};
use crate::car_configurator::scene::ConfiguratorCamera;
use crate::car_configurator::transitions::Transitions;
use crate::car_configurator::ui::{ControlPanelState, Notifications};
use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, save_to_disk};
use bevy::window::WindowResized;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

pub const SWIPE_THRESHOLD_PX: f32 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguratorAction {
    Screenshot,
    ResetCamera,
    ToggleRotate,
    SetView(CameraView),
    ApplyPreset(String),
}

#[derive(Resource, Debug, Default)]
pub struct ActionQueue {
    pending: Vec<ConfiguratorAction>,
}

impl ActionQueue {
    pub fn push(&mut self, action: ConfiguratorAction) {
        self.pending.push(action);
    }

    pub fn drain(&mut self) -> Vec<ConfiguratorAction> {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
}

pub fn shortcut_action(key: KeyCode, command_held: bool) -> Option<ConfiguratorAction> {
    if command_held {
        return (key == KeyCode::KeyS).then_some(ConfiguratorAction::Screenshot);
    }
    match key {
        KeyCode::Space => Some(ConfiguratorAction::ToggleRotate),
        KeyCode::KeyR => Some(ConfiguratorAction::ResetCamera),
        KeyCode::Digit1 => Some(ConfiguratorAction::SetView(CameraView::Front)),
        KeyCode::Digit2 => Some(ConfiguratorAction::SetView(CameraView::Side)),
        KeyCode::Digit3 => Some(ConfiguratorAction::SetView(CameraView::Rear)),
        KeyCode::Digit4 => Some(ConfiguratorAction::SetView(CameraView::Top)),
        _ => None,
    }
}

// Screen y grows downwards.
pub fn swipe_direction(start: Vec2, end: Vec2) -> Option<SwipeDirection> {
    let delta = end - start;
    if delta.y.abs() <= SWIPE_THRESHOLD_PX || delta.y.abs() < delta.x.abs() {
        return None;
    }
    Some(if delta.y < 0.0 {
        SwipeDirection::Up
    } else {
        SwipeDirection::Down
    })
}

pub fn aspect_ratio(width: f32, height: f32) -> Option<f32> {
    (width > 0.0 && height > 0.0).then(|| width / height)
}

pub fn screenshot_path(dir: &Path, unix_millis: u128) -> PathBuf {
    dir.join(format!("car-configurator-{unix_millis}.png"))
}

pub fn keyboard_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    ui_state: Res<UiInteractionState>,
    mut actions: ResMut<ActionQueue>,
) {
    if ui_state.wants_keyboard_input {
        return;
    }

    let command_held = keys.any_pressed([
        KeyCode::ControlLeft,
        KeyCode::ControlRight,
        KeyCode::SuperLeft,
        KeyCode::SuperRight,
    ]);
    for key in keys.get_just_pressed() {
        if let Some(action) = shortcut_action(*key, command_held) {
            actions.push(action);
        }
    }
}

pub fn sync_projection_aspect(
    mut resized: MessageReader<WindowResized>,
    mut projection_query: Query<&mut Projection, With<ConfiguratorCamera>>,
) {
    let Some(aspect) = resized
        .read()
        .last()
        .and_then(|event| aspect_ratio(event.width, event.height))
    else {
        return;
    };

    for mut projection in &mut projection_query {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = aspect;
        }
    }
}

pub fn touch_swipe_panel(touches: Res<Touches>, mut panel: ResMut<ControlPanelState>) {
    for touch in touches.iter_just_released() {
        match swipe_direction(touch.start_position(), touch.position()) {
            Some(SwipeDirection::Up) if !panel.open => panel.open = true,
            Some(SwipeDirection::Down) if panel.open => panel.open = false,
            _ => {}
        }
    }
}

pub fn skip_loading_on_click(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut progress: ResMut<LoadingProgress>,
) {
    if !progress.visible {
        return;
    }
    if mouse_buttons.just_pressed(MouseButton::Left) || touches.any_just_pressed() {
        debug!("loading overlay dismissed at {:.0}%", progress.percent);
        progress.force_complete();
    }
}

pub fn execute_actions(
    mut commands: Commands,
    mut actions: ResMut<ActionQueue>,
    mut config: ResMut<ConfiguratorConfig>,
    mut transitions: ResMut<Transitions>,
    mut orbit: ResMut<OrbitCamera>,
    mut notifications: ResMut<Notifications>,
    presets: Res<PresetLibrary>,
) {
    for action in actions.drain() {
        match action {
            ConfiguratorAction::Screenshot => capture_screenshot(&mut commands, &mut notifications),
            other => apply_scene_action(
                other,
                &mut config,
                &mut transitions,
                &mut orbit,
                &presets,
                &mut notifications,
            ),
        }
    }
}

fn apply_scene_action(
    action: ConfiguratorAction,
    config: &mut ConfiguratorConfig,
    transitions: &mut Transitions,
    orbit: &mut OrbitCamera,
    presets: &PresetLibrary,
    notifications: &mut Notifications,
) {
    match action {
        ConfiguratorAction::ResetCamera => start_camera_move(transitions, orbit, reset_pose()),
        ConfiguratorAction::SetView(view) => start_camera_move(transitions, orbit, view.pose()),
        ConfiguratorAction::ToggleRotate => {
            let enabled = !config.auto_rotate;
            config.apply(ConfigUpdate::AutoRotate(enabled));
            notifications.info(if enabled {
                "Auto-rotate on"
            } else {
                "Auto-rotate off"
            });
        }
        ConfiguratorAction::ApplyPreset(name) => {
            apply_preset(&name, presets, config, transitions, notifications);
        }
        ConfiguratorAction::Screenshot => {}
    }
}

fn capture_screenshot(commands: &mut Commands, notifications: &mut Notifications) {
    let dir = Path::new(SCREENSHOT_DIR);
    if let Err(err) = fs::create_dir_all(dir) {
        error!("cannot create {}: {err}", dir.display());
        notifications.error("Screenshot failed");
        return;
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let path = screenshot_path(dir, millis);
    info!("saving screenshot to {}", path.display());
    commands
        .spawn(Screenshot::primary_window())
        .observe(save_to_disk(path));
    notifications.info("Screenshot saved");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car_configurator::transitions::TransitionKey;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(KeyCode::Space, false, Some(ConfiguratorAction::ToggleRotate))]
    #[case(KeyCode::KeyR, false, Some(ConfiguratorAction::ResetCamera))]
    #[case(KeyCode::KeyS, true, Some(ConfiguratorAction::Screenshot))]
    #[case(KeyCode::KeyS, false, None)]
    #[case(KeyCode::KeyR, true, None)]
    #[case(KeyCode::Digit3, false, Some(ConfiguratorAction::SetView(CameraView::Rear)))]
    #[case(KeyCode::Digit5, false, None)]
    fn shortcuts_map_to_actions(
        #[case] key: KeyCode,
        #[case] command_held: bool,
        #[case] expected: Option<ConfiguratorAction>,
    ) {
        assert_eq!(shortcut_action(key, command_held), expected);
    }

    #[rstest]
    #[case(Vec2::new(200.0, 600.0), Vec2::new(210.0, 480.0), Some(SwipeDirection::Up))]
    #[case(Vec2::new(200.0, 300.0), Vec2::new(190.0, 420.0), Some(SwipeDirection::Down))]
    #[case(Vec2::new(200.0, 300.0), Vec2::new(200.0, 340.0), None)]
    #[case(Vec2::new(100.0, 300.0), Vec2::new(400.0, 380.0), None)]
    fn swipes_need_a_clear_vertical_stroke(
        #[case] start: Vec2,
        #[case] end: Vec2,
        #[case] expected: Option<SwipeDirection>,
    ) {
        assert_eq!(swipe_direction(start, end), expected);
    }

    #[test]
    fn screenshot_names_carry_the_timestamp() {
        let path = screenshot_path(Path::new("screenshots"), 1_700_000_000_123);
        assert_eq!(
            path,
            PathBuf::from("screenshots/car-configurator-1700000000123.png")
        );
    }

    #[test]
    fn minimised_window_keeps_previous_aspect() {
        assert_eq!(aspect_ratio(1600.0, 900.0), Some(1600.0 / 900.0));
        assert_eq!(aspect_ratio(1600.0, 0.0), None);
    }

    #[test]
    fn queue_drains_in_order() {
        let mut queue = ActionQueue::default();
        queue.push(ConfiguratorAction::ToggleRotate);
        queue.push(ConfiguratorAction::SetView(CameraView::Top));
        assert_eq!(
            queue.drain(),
            vec![
                ConfiguratorAction::ToggleRotate,
                ConfiguratorAction::SetView(CameraView::Top)
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn scene_actions_update_state() {
        let mut config = ConfiguratorConfig::default();
        let mut transitions = Transitions::default();
        let mut orbit = OrbitCamera::default();
        let mut notifications = Notifications::default();
        let presets = PresetLibrary::default();

        apply_scene_action(
            ConfiguratorAction::ToggleRotate,
            &mut config,
            &mut transitions,
            &mut orbit,
            &presets,
            &mut notifications,
        );
        assert!(config.auto_rotate);

        apply_scene_action(
            ConfiguratorAction::SetView(CameraView::Side),
            &mut config,
            &mut transitions,
            &mut orbit,
            &presets,
            &mut notifications,
        );
        assert!(transitions.is_active(TransitionKey::Camera));

        apply_scene_action(
            ConfiguratorAction::ApplyPreset("Pearl White".to_string()),
            &mut config,
            &mut transitions,
            &mut orbit,
            &presets,
            &mut notifications,
        );
        assert!(transitions.is_active(TransitionKey::PaintColor));
    }
}
