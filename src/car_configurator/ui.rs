use crate::car_configurator::NOTIFICATION_SECS;
use crate::car_configurator::assets::LoadingProgress;
use crate::car_configurator::camera::{CameraView, UiInteractionState};
use crate::car_configurator::config::{
    ColorField, ConfigUpdate, ConfiguratorConfig, PanelSection, ScalarField, color_to_rgb,
    rgb_to_color,
};
use crate::car_configurator::input::{ActionQueue, ConfiguratorAction};
use crate::car_configurator::presets::PresetLibrary;
use crate::car_configurator::transitions::{TransitionKey, Transitions};
use bevy::prelude::{Res, ResMut, Resource, Time};
use bevy_egui::{EguiContexts, egui};

const FADE_OUT_SECS: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub remaining: f32,
}

impl Notification {
    pub fn opacity(&self) -> f32 {
        (self.remaining / FADE_OUT_SECS).clamp(0.0, 1.0)
    }
}

#[derive(Resource, Debug, Default)]
pub struct Notifications {
    current: Option<Notification>,
}

impl Notifications {
    pub fn info(&mut self, message: impl Into<String>) {
        self.show(NotificationKind::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message.into());
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn tick(&mut self, dt: f32) {
        let expired = match self.current.as_mut() {
            Some(notification) => {
                notification.remaining -= dt;
                notification.remaining <= 0.0
            }
            None => false,
        };
        if expired {
            self.current = None;
        }
    }

    fn show(&mut self, kind: NotificationKind, message: String) {
        self.current = Some(Notification {
            kind,
            message,
            remaining: NOTIFICATION_SECS,
        });
    }
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct ControlPanelState {
    pub open: bool,
}

impl Default for ControlPanelState {
    fn default() -> Self {
        Self { open: true }
    }
}

pub fn tick_notifications(time: Res<Time>, mut notifications: ResMut<Notifications>) {
    notifications.tick(time.delta_secs());
}

#[allow(clippy::too_many_arguments)]
pub fn ui_system(
    mut contexts: EguiContexts,
    mut config: ResMut<ConfiguratorConfig>,
    mut transitions: ResMut<Transitions>,
    mut panel: ResMut<ControlPanelState>,
    mut ui_state: ResMut<UiInteractionState>,
    mut actions: ResMut<ActionQueue>,
    presets: Res<PresetLibrary>,
    progress: Res<LoadingProgress>,
    notifications: Res<Notifications>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::TopBottomPanel::top("car_configurator_top_bar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            ui.heading("Car Configurator");
            ui.separator();
            for view in CameraView::ALL {
                if ui.button(view.label()).clicked() {
                    actions.push(ConfiguratorAction::SetView(view));
                }
            }
            if ui.button("Reset").clicked() {
                actions.push(ConfiguratorAction::ResetCamera);
            }
            ui.separator();
            if ui.button("Screenshot").clicked() {
                actions.push(ConfiguratorAction::Screenshot);
            }
            let panel_label = if panel.open { "Hide Controls" } else { "Show Controls" };
            if ui.button(panel_label).clicked() {
                panel.open = !panel.open;
            }
            ui.separator();
            ui.small("LMB rotate, wheel zoom, Space auto-rotate, R reset, 1-4 views.");
        });
    });

    if panel.open {
        egui::SidePanel::right("car_configurator_controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for section in PanelSection::ALL {
                        egui::CollapsingHeader::new(section.label())
                            .default_open(section == PanelSection::Paint)
                            .show(ui, |ui| {
                                draw_section(
                                    ui,
                                    section,
                                    &mut config,
                                    &mut transitions,
                                    &mut actions,
                                    &presets,
                                );
                            });
                    }
                });
            });
    }

    if progress.visible {
        egui::Area::new(egui::Id::new("car_configurator_loading"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(280.0);
                    ui.heading("Loading showroom");
                    ui.label(progress.stage());
                    ui.add(egui::ProgressBar::new(progress.percent / 100.0).show_percentage());
                    ui.small("Click anywhere to skip");
                });
            });
    }

    if let Some(notification) = notifications.current() {
        egui::Area::new(egui::Id::new("car_configurator_toast"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -32.0])
            .show(ctx, |ui| {
                ui.set_opacity(notification.opacity());
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let color = match notification.kind {
                        NotificationKind::Info => egui::Color32::from_rgb(190, 220, 255),
                        NotificationKind::Error => egui::Color32::from_rgb(255, 120, 110),
                    };
                    ui.colored_label(color, &notification.message);
                });
            });
    }

    ui_state.wants_pointer_input = ctx.wants_pointer_input();
    ui_state.wants_keyboard_input = ctx.wants_keyboard_input();
}

fn draw_section(
    ui: &mut egui::Ui,
    section: PanelSection,
    config: &mut ResMut<ConfiguratorConfig>,
    transitions: &mut Transitions,
    actions: &mut ActionQueue,
    presets: &PresetLibrary,
) {
    match section {
        PanelSection::Paint => {
            for field in ColorField::ALL {
                draw_color_field(ui, config, transitions, field);
            }
        }
        PanelSection::Animation => {
            let mut auto_rotate = config.auto_rotate;
            if ui.checkbox(&mut auto_rotate, "Auto rotate").changed() {
                config.apply(ConfigUpdate::AutoRotate(auto_rotate));
            }
        }
        _ => {}
    }

    for field in fields_in_section(section) {
        draw_scalar_field(ui, config, field);
    }

    if section == PanelSection::Paint {
        ui.separator();
        ui.label("Presets");
        ui.horizontal_wrapped(|ui| {
            for name in presets.names() {
                if ui.button(name).clicked() {
                    actions.push(ConfiguratorAction::ApplyPreset(name.to_string()));
                }
            }
        });
    }
}

pub fn fields_in_section(section: PanelSection) -> impl Iterator<Item = ScalarField> {
    ScalarField::ALL
        .into_iter()
        .filter(move |field| field.section() == section)
}

fn draw_color_field(
    ui: &mut egui::Ui,
    config: &mut ResMut<ConfiguratorConfig>,
    transitions: &mut Transitions,
    field: ColorField,
) {
    ui.horizontal(|ui| {
        let mut rgb = color_to_rgb(field.get(config));
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            // A manual pick overrides any preset blend still in flight.
            if field == ColorField::Paint {
                transitions.cancel(TransitionKey::PaintColor);
            }
            config.apply(ConfigUpdate::Color(field, rgb_to_color(rgb)));
        }
        ui.label(field.label());
    });
}

fn draw_scalar_field(ui: &mut egui::Ui, config: &mut ResMut<ConfiguratorConfig>, field: ScalarField) {
    let mut value = field.get(config);
    let slider = egui::Slider::new(&mut value, field.range())
        .step_by(field.step() as f64)
        .text(field.label());
    if ui.add(slider).changed() {
        config.apply(ConfigUpdate::Scalar(field, value));
    }
}
