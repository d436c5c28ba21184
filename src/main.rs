use bevy::prelude::*;
use pusher_core::{CameraSystems, CorePlugin};
use pusher_physics::{PusherPlugin, PusherSystems};
use pusher_ui::PanelPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Coin Pusher".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(PusherPlugin::default())
        .add_plugins(CorePlugin::default())
        .add_plugins(PanelPlugin)
        // Camera follows the frame so it never lags a step behind
        .configure_sets(Update, CameraSystems.after(PusherSystems::Frame))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .run();
}
