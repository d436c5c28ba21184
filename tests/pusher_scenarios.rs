//! End-to-end behaviour of the simulation controller, run headless.

use std::time::Duration;

use bevy::prelude::*;
use pusher_physics::{
    HeadlessSink, ParameterChange, PusherCommand, PusherConfig, SimulationController, Spawner,
    WallSide,
};

const FRAME: Duration = Duration::from_millis(10);

fn start(seed: u64) -> (SimulationController<u32>, HeadlessSink) {
    let mut sink = HeadlessSink::new();
    let controller = SimulationController::with_spawner(
        &PusherConfig::default(),
        Spawner::from_seed(seed),
        &mut sink,
    )
    .expect("default config should start");
    (controller, sink)
}

/// Run frames of `FRAME` length starting at `from` while `now < until`.
/// Returns the time of the next frame.
fn run_until(
    controller: &mut SimulationController<u32>,
    sink: &mut HeadlessSink,
    from: Duration,
    until: Duration,
) -> (Duration, usize) {
    let mut now = from;
    let mut spawned = 0;
    while now < until {
        let report = controller
            .frame(now, FRAME.as_secs_f32(), sink)
            .expect("frame should succeed");
        if report.spawned.is_some() {
            spawned += 1;
        }
        now += FRAME;
    }
    (now, spawned)
}

fn assert_paired(controller: &SimulationController<u32>, sink: &HeadlessSink) {
    assert_eq!(
        controller.population(),
        sink.coin_count(),
        "every coin should have exactly one proxy"
    );
    for (handle, coin) in controller.registry().iter() {
        assert!(
            controller.world().contains_body(coin.body),
            "{} lost its body",
            handle
        );
        assert!(sink.is_attached(coin.proxy), "{} lost its proxy", handle);
    }
}

#[test]
fn held_gate_spawns_once_per_interval() {
    let (mut controller, mut sink) = start(1);
    controller.set_spawn_gate(true);

    let (_, spawned) = run_until(
        &mut controller,
        &mut sink,
        Duration::ZERO,
        Duration::from_millis(200),
    );

    assert_eq!(spawned, 4, "spawns at 0, 50, 100 and 150 ms");
    assert_eq!(controller.population(), 4);
    assert_paired(&controller, &sink);
}

#[test]
fn closed_gate_never_spawns() {
    let (mut controller, mut sink) = start(2);
    let (_, spawned) = run_until(
        &mut controller,
        &mut sink,
        Duration::ZERO,
        Duration::from_millis(300),
    );
    assert_eq!(spawned, 0);
    assert_eq!(sink.coin_count(), 0);
}

#[test]
fn tilt_rotates_tray_about_x_only() {
    let (mut controller, mut sink) = start(3);
    let walls_before: Vec<Quat> = controller
        .fixtures()
        .walls
        .iter()
        .map(|w| w.rotation())
        .collect();

    controller.apply(
        PusherCommand::SetParameter(ParameterChange::TiltDegrees(10.0)),
        &mut sink,
    );

    let half = 5.0f32.to_radians();
    let expected = Quat::from_xyzw(half.sin(), 0.0, 0.0, half.cos());
    let tray = &controller.fixtures().tray;
    assert!(tray.rotation().abs_diff_eq(expected, 1e-6));

    let body = controller.world().pose(tray.body).expect("tray body");
    assert!(body.rotation.abs_diff_eq(expected, 1e-6));
    let proxy = sink.pose(tray.proxy).expect("tray proxy");
    assert!(proxy.rotation.abs_diff_eq(expected, 1e-6));

    let walls_after: Vec<Quat> = controller
        .fixtures()
        .walls
        .iter()
        .map(|w| w.rotation())
        .collect();
    assert_eq!(walls_before, walls_after, "walls do not follow the tray");
}

#[test]
fn toggling_front_wall_keeps_collider_and_visibility_together() {
    let (mut controller, mut sink) = start(4);
    let front = *controller.fixtures().walls.get(WallSide::Front);
    let original = front.is_enabled();

    let check = |controller: &SimulationController<u32>, sink: &HeadlessSink| {
        let wall = controller.fixtures().walls.get(WallSide::Front);
        let collider = controller.world().collider(wall.collider).expect("wall collider");
        assert_eq!(wall.is_enabled(), collider.is_enabled());
        assert_eq!(Some(wall.is_enabled()), sink.is_visible(wall.proxy));
        wall.is_enabled()
    };

    controller.apply(PusherCommand::ToggleWall(WallSide::Front), &mut sink);
    assert_eq!(check(&controller, &sink), !original);

    controller.apply(PusherCommand::ToggleWall(WallSide::Front), &mut sink);
    assert_eq!(check(&controller, &sink), original);

    // Other walls are untouched
    for side in [WallSide::Back, WallSide::Left, WallSide::Right] {
        assert!(controller.fixtures().walls.get(side).is_enabled());
    }
}

#[test]
fn friction_change_only_affects_new_coins() {
    let (mut controller, mut sink) = start(5);
    controller.set_spawn_gate(true);

    controller.apply(
        PusherCommand::SetParameter(ParameterChange::Friction(0.9)),
        &mut sink,
    );
    let first = controller
        .try_spawn(Duration::ZERO, &mut sink)
        .expect("first spawn is immediate");

    controller.apply(
        PusherCommand::SetParameter(ParameterChange::Friction(0.2)),
        &mut sink,
    );
    let second = controller
        .try_spawn(Duration::from_millis(50), &mut sink)
        .expect("interval elapsed");

    let friction = |handle| {
        let coin = controller.registry().get(handle).unwrap();
        controller.world().collider(coin.collider).unwrap().friction()
    };
    assert_eq!(friction(first), 0.9);
    assert_eq!(friction(second), 0.2);
}

#[test]
fn cap_stops_spawning_at_limit() {
    let (mut controller, mut sink) = start(6);
    controller.set_spawn_gate(true);
    controller.apply(
        PusherCommand::SetParameter(ParameterChange::SpawnCap(3)),
        &mut sink,
    );

    let (_, spawned) = run_until(
        &mut controller,
        &mut sink,
        Duration::ZERO,
        Duration::from_millis(500),
    );
    assert_eq!(spawned, 3);
    assert_eq!(controller.population(), 3);

    // Raising the cap lets spawning resume
    controller.apply(
        PusherCommand::SetParameter(ParameterChange::SpawnCap(0)),
        &mut sink,
    );
    let report = controller
        .frame(Duration::from_millis(500), FRAME.as_secs_f32(), &mut sink)
        .unwrap();
    assert!(report.spawned.is_some());
}

#[test]
fn reset_coins_is_idempotent() {
    let (mut controller, mut sink) = start(7);
    controller.set_spawn_gate(true);
    run_until(
        &mut controller,
        &mut sink,
        Duration::ZERO,
        Duration::from_millis(150),
    );
    assert!(controller.population() > 0);
    let fixture_bodies = 5;

    controller.apply(PusherCommand::ResetCoins, &mut sink);
    assert_eq!(controller.population(), 0);
    assert_eq!(sink.coin_count(), 0);
    assert_eq!(controller.world().body_count(), fixture_bodies);

    controller.apply(PusherCommand::ResetCoins, &mut sink);
    assert_eq!(controller.population(), 0);
    assert_eq!(controller.world().body_count(), fixture_bodies);
    assert_eq!(sink.fixture_count(), fixture_bodies);
}

#[test]
fn coins_without_walls_slide_off_a_steep_tray() {
    let (mut controller, mut sink) = start(8);
    controller.apply(PusherCommand::ToggleWalls, &mut sink);
    for wall in controller.fixtures().walls.iter() {
        assert!(!wall.is_enabled());
    }
    controller.apply(
        PusherCommand::SetParameter(ParameterChange::TiltDegrees(60.0)),
        &mut sink,
    );
    controller.apply(
        PusherCommand::SetParameter(ParameterChange::Friction(0.0)),
        &mut sink,
    );

    controller.set_spawn_gate(true);
    let (now, spawned) = run_until(
        &mut controller,
        &mut sink,
        Duration::ZERO,
        Duration::from_millis(100),
    );
    assert!(spawned > 0);
    controller.set_spawn_gate(false);

    // Long enough to fall well below the exit height
    run_until(&mut controller, &mut sink, now, now + Duration::from_secs(3));

    assert_eq!(controller.population(), 0, "every coin should be evicted");
    assert_eq!(sink.coin_count(), 0);
    assert_eq!(controller.world().body_count(), 5);
}

#[test]
fn population_tracks_proxies_through_a_session() {
    let (mut controller, mut sink) = start(9);
    let mut now = Duration::ZERO;

    for round in 0..4 {
        controller.set_spawn_gate(true);
        now = run_until(&mut controller, &mut sink, now, now + Duration::from_millis(120)).0;
        assert_paired(&controller, &sink);

        controller.set_spawn_gate(false);
        now = run_until(&mut controller, &mut sink, now, now + Duration::from_millis(60)).0;
        assert_paired(&controller, &sink);

        if round % 2 == 1 {
            controller.apply(PusherCommand::ResetCoins, &mut sink);
            assert_paired(&controller, &sink);
        }
    }
}

#[test]
fn same_seed_gives_same_spawns() {
    let run = |seed| {
        let (mut controller, mut sink) = start(seed);
        controller.set_spawn_gate(true);
        run_until(
            &mut controller,
            &mut sink,
            Duration::ZERO,
            Duration::from_millis(100),
        );
        controller
            .registry()
            .iter()
            .map(|(_, coin)| coin.coin_type)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(42), run(42));
}
