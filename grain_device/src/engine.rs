//! A small granular voice.
//!
//! While `play` is up, grains are launched at `density` per second.  Each
//! grain reads the sample buffer from `pos` (plus a little jitter) at a rate
//! set by `pitch`, shaped by a Hann window.  Parameters are read once per
//! block, so the latest write is always heard on the next block.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::context::AudioNode;
use crate::device::{BufferSlot, Shared};
use crate::patch::{GrainSettings, PITCH, PLAY, POS, SAMPLE_BUFFER};

const MAX_GRAINS: usize = 64;

#[derive(Clone, Copy, Debug)]
struct Grain {
    /// Read position in source samples.
    cursor: f32,
    /// Source samples advanced per output frame.
    step:   f32,
    age:    usize,
    length: usize,
}

impl Grain {
    fn envelope(&self) -> f32 {
        let t = self.age as f32 / self.length.max(1) as f32;
        0.5 - 0.5 * (2.0 * PI * t).cos()
    }

    fn done(&self) -> bool { self.age >= self.length }
}

pub struct GrainVoice {
    shared:      Arc<Shared>,
    settings:    GrainSettings,
    sample_rate: u32,
    grains:      Vec<Grain>,
    /// Frames until the next grain launch.
    countdown:   f32,
    rng:         u32,
}

impl GrainVoice {
    pub(crate) fn new(shared: Arc<Shared>, settings: GrainSettings, sample_rate: u32) -> Self {
        GrainVoice {
            shared,
            settings,
            sample_rate: sample_rate.max(1),
            grains: Vec::with_capacity(MAX_GRAINS),
            countdown: 0.0,
            rng: 0x9E37_79B9,
        }
    }

    fn read(&self, id: &str, fallback: f32) -> f32 {
        self.shared.parameter(id).map(|p| p.get()).unwrap_or(fallback)
    }

    /// Uniform in [-1, 1).
    fn noise(&mut self) -> f32 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        (self.rng as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    fn launch(&mut self, buffer: &AudioBuffer, pos: f32, rate: f32) {
        if self.grains.len() >= MAX_GRAINS { return; }
        let len = buffer.len() as f32;
        let start = ((pos + self.noise() * self.settings.jitter).clamp(0.0, 1.0) * len)
            .min((len - 1.0).max(0.0));
        let length = (self.settings.grain_ms * 0.001 * self.sample_rate as f32).max(1.0) as usize;
        let step = rate * buffer.sample_rate as f32 / self.sample_rate as f32;
        self.grains.push(Grain { cursor: start, step, age: 0, length });
    }
}

/// `pitch` 0–1 → playback rate, ±`octaves` around the original.
pub fn pitch_to_rate(pitch: f32, octaves: f32) -> f32 {
    2f32.powf((pitch.clamp(0.0, 1.0) - 0.5) * 2.0 * octaves)
}

impl AudioNode for GrainVoice {
    fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let buffer = self.shared.slot(SAMPLE_BUFFER).and_then(BufferSlot::try_current);
        let Some(buffer) = buffer.filter(|b| !b.is_empty()) else {
            self.grains.clear();
            return;
        };

        let playing  = self.read(PLAY, 0.0) >= 0.5;
        let pos      = self.read(POS, 0.0);
        let rate     = pitch_to_rate(self.read(PITCH, 0.5), self.settings.octaves);
        let interval = self.sample_rate as f32 / self.settings.density.max(0.1);
        let gain     = self.settings.gain;

        for frame in out.chunks_mut(channels) {
            if playing {
                self.countdown -= 1.0;
                if self.countdown <= 0.0 {
                    self.launch(&buffer, pos, rate);
                    self.countdown += interval;
                }
            }

            let mut acc = 0.0;
            for g in self.grains.iter_mut() {
                acc += buffer.read(g.cursor) * g.envelope();
                g.cursor += g.step;
                g.age += 1;
            }
            self.grains.retain(|g| !g.done());

            let sample = acc * gain;
            for s in frame.iter_mut() {
                *s += sample;
            }
        }
    }
}
