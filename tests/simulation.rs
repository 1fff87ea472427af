//! Timer-driven simulation tests: deflation, pulse gating, and teardown,
//! run against a paused tokio clock so ticks are deterministic.

use std::time::Duration;

use cuffsim::audio::AudioEngineHandle;
use cuffsim::scenario::ScenarioKey;
use cuffsim::settings::PulseSoundSettings;
use cuffsim::simulation::{SimulationController, SimulationEvent};

/// Controller with the audio cue disabled so tests never touch a device.
fn quiet_controller(scenario: ScenarioKey) -> SimulationController {
    SimulationController::new(
        scenario,
        AudioEngineHandle::new(),
        PulseSoundSettings {
            enabled: false,
            volume: 0.0,
        },
        None,
    )
}

#[tokio::test(start_paused = true)]
async fn pump_raises_pressure_and_clamps_at_ceiling() {
    let controller = quiet_controller(ScenarioKey::Healthy);
    controller.pump().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.pressure, 10);
    assert!(snapshot.deflating);
    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn deflation_reaches_zero_and_halts() {
    let controller = quiet_controller(ScenarioKey::Healthy);
    let mut events = controller.subscribe();

    for _ in 0..3 {
        controller.pump().await;
    }

    loop {
        match events.recv().await {
            Ok(SimulationEvent::DeflationFinished) => break,
            Ok(_) => {}
            Err(err) => panic!("event stream ended early: {err}"),
        }
    }

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.pressure, 0);
    assert!(!snapshot.deflating);
    assert!(!snapshot.pumping);

    // Idle afterwards: nothing keeps ticking the pressure.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(controller.pressure().await, 0);
}

#[tokio::test(start_paused = true)]
async fn pulse_events_alternate_start_stop_over_a_full_cycle() {
    let controller = quiet_controller(ScenarioKey::Healthy);
    let mut events = controller.subscribe();

    for _ in 0..20 {
        controller.pump().await;
    }

    let mut starts = 0;
    let mut stops = 0;
    let mut sounding = false;
    loop {
        match events.recv().await {
            Ok(SimulationEvent::PulseStarted) => {
                assert!(!sounding, "start fired while already sounding");
                sounding = true;
                starts += 1;
            }
            Ok(SimulationEvent::PulseStopped) => {
                assert!(sounding, "stop fired while already silent");
                sounding = false;
                stops += 1;
            }
            Ok(SimulationEvent::DeflationFinished) => break,
            Ok(_) => {}
            Err(err) => panic!("event stream ended early: {err}"),
        }
    }

    // Descending from 200 always crosses the window once; the ascent may
    // have crossed it once more. Every start is paired with a stop.
    assert!(starts >= 1, "no pulse window was ever entered");
    assert_eq!(starts, stops);
    assert!(!sounding);
    assert!(!controller.pulse_audible().await);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_deflation_and_resets_state() {
    let controller = quiet_controller(ScenarioKey::Healthy);

    for _ in 0..5 {
        controller.pump().await;
    }
    controller.stop().await;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.pressure, 0);
    assert!(!snapshot.deflating);
    assert!(!snapshot.pumping);
    assert!(!controller.pulse_audible().await);

    // No dangling timer mutates state after teardown.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(controller.pressure().await, 0);
}

#[tokio::test(start_paused = true)]
async fn pumping_after_full_deflation_starts_a_new_cycle() {
    let controller = quiet_controller(ScenarioKey::Healthy);
    let mut events = controller.subscribe();

    controller.pump().await;
    loop {
        match events.recv().await {
            Ok(SimulationEvent::DeflationFinished) => break,
            Ok(_) => {}
            Err(err) => panic!("event stream ended early: {err}"),
        }
    }

    controller.pump().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.pressure, 10);
    assert!(snapshot.deflating);

    loop {
        match events.recv().await {
            Ok(SimulationEvent::DeflationFinished) => break,
            Ok(_) => {}
            Err(err) => panic!("event stream ended early: {err}"),
        }
    }
    assert_eq!(controller.pressure().await, 0);
}

#[tokio::test(start_paused = true)]
async fn arrhythmic_rerolls_stay_inside_clamp_bounds() {
    let controller = quiet_controller(ScenarioKey::Arrhythmic);

    for _ in 0..10 {
        controller.pump().await;
        let reading = controller.true_reading().await;
        assert!(
            (70..=200).contains(&reading.systolic),
            "systolic out of bounds: {reading}"
        );
        assert!(
            (40..=130).contains(&reading.diastolic),
            "diastolic out of bounds: {reading}"
        );
    }
    controller.stop().await;
}
