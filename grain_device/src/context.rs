//! Audio output contexts: an abstraction over cpal / null (for testing and
//! machines without an output device).
//!
//! A context starts suspended.  Devices connect an [`AudioNode`] to it; once
//! resumed, the context pulls interleaved blocks from every connected node.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::{OutputError, ResumeError};

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// Something that produces audio into an interleaved output block.
///
/// Nodes *add* into `out`; the context zeroes the block first.
pub trait AudioNode: Send {
    fn render(&mut self, out: &mut [f32], channels: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState { Suspended, Running }

/// An audio output context: the destination devices are connected to.
pub trait AudioContext {
    fn sample_rate(&self) -> u32;
    fn state(&self) -> ContextState;
    /// Ask the output to start running.  Succeeds immediately when already running.
    fn resume(&mut self) -> Result<(), ResumeError>;
    /// Connect a node's output to the destination.
    fn connect(&mut self, node: Box<dyn AudioNode>);

    fn is_running(&self) -> bool { self.state() == ContextState::Running }
}

type Bus = Arc<Mutex<Vec<Box<dyn AudioNode>>>>;

fn mix_into(bus: &Bus, data: &mut [f32], channels: usize) {
    data.fill(0.0);
    // Never block the audio callback; a contended lock costs one silent block.
    if let Ok(mut nodes) = bus.try_lock() {
        for node in nodes.iter_mut() {
            node.render(data, channels);
        }
    }
    // Safety limiter
    for s in data.iter_mut() {
        *s = s.clamp(-0.8, 0.8);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CpalContext
// ════════════════════════════════════════════════════════════════════════════

/// Real output through the platform's default cpal host.
///
/// The stream is built paused, so the context reports `Suspended` until the
/// first successful [`resume`](AudioContext::resume).
pub struct CpalContext {
    stream:      cpal::Stream,
    bus:         Bus,
    sample_rate: u32,
    state:       ContextState,
}

impl CpalContext {
    /// Open the named output device (substring match), or the default one.
    pub fn open(device_name: Option<&str>) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(search) => {
                let search = search.to_lowercase();
                host.output_devices()?
                    .find(|d| d.name().map(|n| n.to_lowercase().contains(&search)).unwrap_or(false))
                    .ok_or(OutputError::NoMatch(search))?
            }
            None => host.default_output_device().ok_or(OutputError::NoDefault)?,
        };

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0;
        let channels    = config.channels() as usize;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels,
            "audio output opened"
        );

        let bus: Bus = Arc::new(Mutex::new(Vec::new()));
        let callback_bus = Arc::clone(&bus);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mix_into(&callback_bus, data, channels);
                },
                |err| tracing::warn!(%err, "audio stream error"),
                None,
            )?;

        // Some hosts start streams on build; hold it until activation.
        let _ = stream.pause();

        Ok(CpalContext { stream, bus, sample_rate, state: ContextState::Suspended })
    }
}

impl AudioContext for CpalContext {
    fn sample_rate(&self) -> u32 { self.sample_rate }
    fn state(&self) -> ContextState { self.state }

    fn resume(&mut self) -> Result<(), ResumeError> {
        if self.state == ContextState::Running { return Ok(()); }
        self.stream.play().map_err(|e| ResumeError(e.to_string()))?;
        self.state = ContextState::Running;
        tracing::info!("audio output running");
        Ok(())
    }

    fn connect(&mut self, node: Box<dyn AudioNode>) {
        if let Ok(mut nodes) = self.bus.lock() {
            nodes.push(node);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NullContext
// ════════════════════════════════════════════════════════════════════════════

/// A context with no hardware behind it.
///
/// Audio is only produced when someone calls [`pull`](NullContext::pull).
/// `failing_resumes` makes the next N resume attempts fail, which is how
/// tests exercise the retry paths.
pub struct NullContext {
    bus:             Bus,
    sample_rate:     u32,
    state:           ContextState,
    pub resumes:     usize,
    failing_resumes: usize,
}

impl NullContext {
    pub fn new(sample_rate: u32) -> Self {
        NullContext {
            bus: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
            state: ContextState::Suspended,
            resumes: 0,
            failing_resumes: 0,
        }
    }

    /// A context that is already running, like an output that was unlocked
    /// before the app asked.
    pub fn running(sample_rate: u32) -> Self {
        NullContext { state: ContextState::Running, ..Self::new(sample_rate) }
    }

    pub fn failing(sample_rate: u32, failing_resumes: usize) -> Self {
        NullContext { failing_resumes, ..Self::new(sample_rate) }
    }

    pub fn node_count(&self) -> usize {
        self.bus.lock().map(|n| n.len()).unwrap_or(0)
    }

    /// Render `frames` interleaved frames from every connected node.
    pub fn pull(&self, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * channels];
        if self.state == ContextState::Running {
            mix_into(&self.bus, &mut out, channels);
        }
        out
    }
}

impl AudioContext for NullContext {
    fn sample_rate(&self) -> u32 { self.sample_rate }
    fn state(&self) -> ContextState { self.state }

    fn resume(&mut self) -> Result<(), ResumeError> {
        self.resumes += 1;
        if self.failing_resumes > 0 {
            self.failing_resumes -= 1;
            return Err(ResumeError("null output refused to resume".to_string()));
        }
        self.state = ContextState::Running;
        Ok(())
    }

    fn connect(&mut self, node: Box<dyn AudioNode>) {
        if let Ok(mut nodes) = self.bus.lock() {
            nodes.push(node);
        }
    }
}
