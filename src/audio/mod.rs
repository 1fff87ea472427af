pub mod pulse_tone;

use pulse_tone::PulseTone;

use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

enum AudioCommand {
    StartPulse { volume: f32 },
    StopPulse,
    SetVolume(f32),
}

/// Handle to a lazily spawned audio thread. The thread owns the non-Send
/// rodio objects; commands arrive over an mpsc channel. Audio failures are
/// swallowed on the thread so a missing output device never breaks a
/// training session.
#[derive(Clone)]
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        if let Some(tx) = self.tx.lock().map_err(|e| e.to_string())?.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Spawn dedicated audio thread holding non-Send audio objects
        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::StartPulse { volume } => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                            let _ = ensure_sink(&mut _stream, &mut sink);
                            if let Some(ref s) = sink {
                                s.set_volume(volume.clamp(0.0, 1.0));
                                s.append(PulseTone::new());
                            }
                        }
                        AudioCommand::StopPulse => {
                            if let Some(s_old) = sink.take() {
                                s_old.stop();
                            }
                            _stream = None;
                        }
                        AudioCommand::SetVolume(v) => {
                            if let Some(ref s) = sink {
                                s.set_volume(v.clamp(0.0, 1.0));
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        let tx_clone = tx.clone();
        *self.tx.lock().map_err(|e| e.to_string())? = Some(tx);
        Ok(tx_clone)
    }

    /// Starts the looping pulse tone from the beginning of its cycle.
    pub fn start_pulse(&self, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::StartPulse { volume })
            .map_err(|e| e.to_string())
    }

    /// Stops and rewinds the pulse tone. A no-op when nothing is playing.
    pub fn stop_pulse(&self) -> Result<(), String> {
        if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
            let _ = tx.send(AudioCommand::StopPulse);
        }
        Ok(())
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::SetVolume(volume))
            .map_err(|e| e.to_string())
    }
}
