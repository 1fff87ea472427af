use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    audio::AudioEngineHandle,
    bridge::BridgeHandle,
    models::BpReading,
    scenario::{self, validation, ScenarioKey},
    settings::PulseSoundSettings,
};

use super::{
    pulse::{PulseGate, PulseTransition},
    state::CuffState,
};

const DEFLATE_TICK: Duration = Duration::from_millis(100);
const BRIDGE_PUSH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SimulationEvent {
    PressureChanged { pressure: i32, deflating: bool },
    PulseStarted,
    PulseStopped,
    DeflationFinished,
}

/// One training session: owns the cuff state, the true reading, the pulse
/// gate, and the timers that drive deflation and the optional device bridge.
/// All periodic work hangs off a single cancellation token so `stop()` tears
/// everything down at once.
#[derive(Clone)]
pub struct SimulationController {
    scenario: ScenarioKey,
    state: Arc<Mutex<CuffState>>,
    true_reading: Arc<Mutex<BpReading>>,
    pulse: Arc<Mutex<PulseGate>>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    events: broadcast::Sender<SimulationEvent>,
    audio: AudioEngineHandle,
    sound: PulseSoundSettings,
    bridge: Option<BridgeHandle>,
}

impl SimulationController {
    pub fn new(
        scenario: ScenarioKey,
        audio: AudioEngineHandle,
        sound: PulseSoundSettings,
        bridge: Option<BridgeHandle>,
    ) -> Self {
        let reading = roll_true_reading(scenario);
        info!("starting {} session", scenario.as_str());
        let (events, _) = broadcast::channel(64);

        Self {
            scenario,
            state: Arc::new(Mutex::new(CuffState::new())),
            true_reading: Arc::new(Mutex::new(reading)),
            pulse: Arc::new(Mutex::new(PulseGate::new())),
            cancel: Arc::new(Mutex::new(None)),
            events,
            audio,
            sound,
            bridge,
        }
    }

    pub fn scenario(&self) -> ScenarioKey {
        self.scenario
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> CuffState {
        *self.state.lock().await
    }

    pub async fn pressure(&self) -> i32 {
        self.state.lock().await.pressure
    }

    pub async fn true_reading(&self) -> BpReading {
        *self.true_reading.lock().await
    }

    pub async fn pulse_audible(&self) -> bool {
        self.pulse.lock().await.is_sounding()
    }

    /// One pump stroke: +10 mmHg clamped to the ceiling. The first stroke
    /// starts the deflation ticker (and the bridge push loop); pumping while
    /// deflating just raises the pressure again. Arrhythmic sessions re-roll
    /// the true reading on every stroke.
    pub async fn pump(&self) {
        if self.scenario == ScenarioKey::Arrhythmic {
            let reroll = roll_true_reading(self.scenario);
            *self.true_reading.lock().await = reroll;
        }

        let (pressure, deflating, started) = {
            let mut state = self.state.lock().await;
            let started = state.pump();
            (state.pressure, state.deflating, started)
        };

        self.evaluate_pulse(pressure).await;
        let _ = self.events.send(SimulationEvent::PressureChanged {
            pressure,
            deflating,
        });

        if started {
            self.start_session_tasks().await;
        }
    }

    /// Ends the session: cancels the deflation and bridge-push timers as one
    /// unit, silences the pulse cue, and resets the cuff.
    pub async fn stop(&self) {
        if let Some(token) = self.cancel.lock().await.take() {
            token.cancel();
        }

        self.state.lock().await.reset();

        if self.pulse.lock().await.reset() == Some(PulseTransition::Stopped) {
            self.silence_cue();
            let _ = self.events.send(SimulationEvent::PulseStopped);
        }

        if let Some(bridge) = &self.bridge {
            bridge.send_end();
        }

        let _ = self.events.send(SimulationEvent::PressureChanged {
            pressure: 0,
            deflating: false,
        });
        info!("{} session stopped", self.scenario.as_str());
    }

    async fn start_session_tasks(&self) {
        let token = CancellationToken::new();
        {
            let mut guard = self.cancel.lock().await;
            if let Some(old) = guard.take() {
                old.cancel();
            }
            *guard = Some(token.clone());
        }

        let deflate = self.clone();
        let deflate_token = token.clone();
        tokio::spawn(async move { deflate.deflation_loop(deflate_token).await });

        if let Some(bridge) = self.bridge.clone() {
            let push = self.clone();
            tokio::spawn(async move { push.bridge_push_loop(bridge, token).await });
        }
    }

    async fn deflation_loop(&self, token: CancellationToken) {
        let mut ticker = time::interval(DEFLATE_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the pressure
        // holds for one full period after the pump.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let (pressure, deflating, finished) = {
                        let mut state = self.state.lock().await;
                        if !state.deflating {
                            break;
                        }
                        let finished = state.deflate_tick();
                        (state.pressure, state.deflating, finished)
                    };

                    self.evaluate_pulse(pressure).await;
                    let _ = self.events.send(SimulationEvent::PressureChanged {
                        pressure,
                        deflating,
                    });

                    if finished {
                        info!("cuff fully deflated");
                        if let Some(bridge) = &self.bridge {
                            bridge.send_end();
                        }
                        let _ = self.events.send(SimulationEvent::DeflationFinished);
                        token.cancel();
                        break;
                    }
                }
                _ = token.cancelled() => break,
            }
        }
    }

    async fn bridge_push_loop(&self, bridge: BridgeHandle, token: CancellationToken) {
        let mut ticker = time::interval(BRIDGE_PUSH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let (pressure, over_max) = {
                        let state = self.state.lock().await;
                        (state.pressure, state.over_max())
                    };
                    bridge.send_update(pressure, over_max);
                }
                _ = token.cancelled() => break,
            }
        }
    }

    async fn evaluate_pulse(&self, pressure: i32) {
        let range = *self.true_reading.lock().await;
        let transition = self.pulse.lock().await.observe(pressure, range);

        match transition {
            Some(PulseTransition::Started) => {
                if self.sound.enabled {
                    if let Err(err) = self.audio.start_pulse(self.sound.volume) {
                        warn!("failed to start pulse tone: {err}");
                    }
                }
                let _ = self.events.send(SimulationEvent::PulseStarted);
            }
            Some(PulseTransition::Stopped) => {
                self.silence_cue();
                let _ = self.events.send(SimulationEvent::PulseStopped);
            }
            None => {}
        }
    }

    fn silence_cue(&self) {
        if self.sound.enabled {
            if let Err(err) = self.audio.stop_pulse() {
                warn!("failed to stop pulse tone: {err}");
            }
        }
    }
}

fn roll_true_reading(scenario: ScenarioKey) -> BpReading {
    let reading = scenario::generate(scenario, &mut rand::thread_rng());
    let check = validation::validate_reading(scenario, reading);
    if !check.is_valid {
        warn!(
            "generated reading {reading} is implausible for {}: {}",
            scenario.as_str(),
            check.warnings.join("; ")
        );
    } else {
        debug!(
            "generated reading {reading} ({})",
            check.actual_category.label()
        );
    }
    reading
}
