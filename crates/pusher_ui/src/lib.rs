//! Imgui control panel for the coin pusher.
//!
//! The panel only reads the simulation; every change goes out as a
//! [`PusherCommand`] and is applied at the start of the next frame.

use bevy::prelude::*;
use bevy_mod_imgui::prelude::*;
use pusher_physics::{
    ParameterChange, PointerCapture, PusherCommand, PusherSystems, Simulation, WallSide,
};

pub struct PanelPlugin;

impl Plugin for PanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(bevy_mod_imgui::ImguiPlugin::default())
            .add_systems(
                Update,
                control_panel
                    .before(PusherSystems::Frame)
                    .run_if(resource_exists::<Simulation>),
            );
    }
}

/// Text buffers that outlive a single frame.
#[derive(Default)]
struct PanelState {
    cap_text: Option<String>,
}

fn control_panel(
    mut context: NonSendMut<ImguiContext>,
    sim: Res<Simulation>,
    mut state: Local<PanelState>,
    mut capture: ResMut<PointerCapture>,
    mut commands: MessageWriter<PusherCommand>,
) {
    let ui = context.ui();
    let controller = &sim.0;
    let params = controller.parameters().clone();

    ui.window("Coin Pusher")
        .size([320.0, 360.0], Condition::FirstUseEver)
        .position([20.0, 20.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("Coins: {}", controller.population()));
            ui.separator();

            let mut mass = params.mass;
            if ui.slider("Mass", 0.1f32, 10.0f32, &mut mass) {
                commands.write(PusherCommand::SetParameter(ParameterChange::Mass(mass)));
            }
            let mut friction = params.friction;
            if ui.slider("Friction", 0.0f32, 1.0f32, &mut friction) {
                commands.write(PusherCommand::SetParameter(ParameterChange::Friction(
                    friction,
                )));
            }
            let mut restitution = params.restitution;
            if ui.slider("Restitution", 0.0f32, 1.0f32, &mut restitution) {
                commands.write(PusherCommand::SetParameter(ParameterChange::Restitution(
                    restitution,
                )));
            }
            if ui.button("Reset Parameters") {
                commands.write(PusherCommand::ResetParameters);
            }

            ui.separator();

            let mut tilt = params.tilt_degrees;
            if ui
                .input_float("Tilt (deg)", &mut tilt)
                .step(1.0)
                .build()
            {
                commands.write(PusherCommand::SetParameter(ParameterChange::TiltDegrees(
                    tilt,
                )));
            }

            let cap_text = state
                .cap_text
                .get_or_insert_with(|| params.spawn_cap.to_string());
            if ui.input_text("Coin Limit", cap_text).build() {
                if let Some(change) = ParameterChange::from_text("cap", cap_text) {
                    commands.write(PusherCommand::SetParameter(change));
                }
            }
            ui.text_disabled("0 = unlimited");

            ui.separator();

            if ui.button("Reset Coins") {
                commands.write(PusherCommand::ResetCoins);
            }
            ui.same_line();
            if ui.button("Toggle Walls") {
                commands.write(PusherCommand::ToggleWalls);
            }

            for side in WallSide::ALL {
                let mut enabled = controller.fixtures().walls.get(side).is_enabled();
                if ui.checkbox(format!("{} wall", side.name()), &mut enabled) {
                    commands.write(PusherCommand::ToggleWall(side));
                }
            }
        });

    capture.ui_wants_pointer = ui.io().want_capture_mouse;
}
