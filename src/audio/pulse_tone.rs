use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_FREQ: f32 = 660.0;
const CYCLE_MS: u32 = 800;
const BURST_MS: u32 = 150;

/// Synthesized Korotkoff-style pulse cue: a short decaying sine burst at the
/// start of each 800ms cycle, then silence. Loops forever until stopped.
pub struct PulseTone {
    sample_rate: u32,
    num_sample: usize,
}

impl PulseTone {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
        }
    }
}

impl Default for PulseTone {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for PulseTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let cycle_len = (self.sample_rate * CYCLE_MS / 1000) as usize;
        let burst_len = (self.sample_rate * BURST_MS / 1000) as usize;
        let position = self.num_sample % cycle_len;
        self.num_sample = self.num_sample.wrapping_add(1);

        if position < burst_len {
            let t = position as f32 / self.sample_rate as f32;
            // Linear decay over the burst keeps the beat percussive
            let envelope = 1.0 - position as f32 / burst_len as f32;
            Some((2.0 * PI * TONE_FREQ * t).sin() * envelope * 0.3)
        } else {
            Some(0.0)
        }
    }
}

impl Source for PulseTone {
    fn current_frame_len(&self) -> Option<usize> {
        None // Infinite stream
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite
    }
}
