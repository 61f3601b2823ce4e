//! The device facade.
//!
//! A [`Device`] is a cheap, cloneable handle onto the state shared with its
//! voice on the audio thread: the declared parameters (lock-free, bit-cast
//! `f32` in an `AtomicU32`) and the buffer slots.  Parameter writes are
//! visible to the voice on its next block; nothing is queued.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use crate::buffer::AudioBuffer;
use crate::context::AudioContext;
use crate::engine::GrainVoice;
use crate::error::{
    DecodeError, DependencyLoadError, FailedDependency, PatchLoadError, UnknownParameterError,
};
use crate::patch::{Dependency, Manifest, ParameterSpec, Patch, PLAY, SAMPLE_BUFFER};

// ════════════════════════════════════════════════════════════════════════════
// Parameter
// ════════════════════════════════════════════════════════════════════════════

/// A named control channel.  Written by the UI thread, read by the voice.
#[derive(Debug)]
pub struct Parameter {
    id:    String,
    min:   f32,
    max:   f32,
    value: AtomicU32,
}

impl Parameter {
    fn from_spec(spec: &ParameterSpec) -> Self {
        Parameter {
            id:    spec.id.clone(),
            min:   spec.min,
            max:   spec.max,
            value: AtomicU32::new(spec.initial.clamp(spec.min, spec.max).to_bits()),
        }
    }

    pub fn id(&self)  -> &str { &self.id }
    pub fn min(&self) -> f32  { self.min }
    pub fn max(&self) -> f32  { self.max }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }

    /// Clamp into range and store.  Returns the applied value.
    #[inline]
    fn set(&self, v: f32) -> f32 {
        let clamped = if v.is_nan() { self.min } else { v.clamp(self.min, self.max) };
        self.value.store(clamped.to_bits(), Ordering::Release);
        clamped
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Shared state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub(crate) struct BufferSlot {
    pub(crate) id:   String,
    pub(crate) data: Mutex<Option<Arc<AudioBuffer>>>,
}

impl BufferSlot {
    /// Blocking read.  A slot poisoned by a panicking holder still yields
    /// whatever was bound last.
    pub(crate) fn current(&self) -> Option<Arc<AudioBuffer>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Non-blocking read for the audio thread; `None` while contended.
    pub(crate) fn try_current(&self) -> Option<Arc<AudioBuffer>> {
        match self.data.try_lock() {
            Ok(guard)                      => guard.clone(),
            Err(TryLockError::Poisoned(p)) => p.into_inner().clone(),
            Err(TryLockError::WouldBlock)  => None,
        }
    }

    fn bind(&self, buffer: AudioBuffer) {
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(buffer));
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) buffers:    Vec<BufferSlot>,
}

impl Shared {
    pub(crate) fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub(crate) fn slot(&self, id: &str) -> Option<&BufferSlot> {
        self.buffers.iter().find(|b| b.id == id)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Resolver: where dependency bytes come from
// ════════════════════════════════════════════════════════════════════════════

/// Fetches the raw bytes of a named dependency.
pub trait Resolver: Send + Sync {
    fn fetch(&self, dependency: &Dependency) -> io::Result<Vec<u8>>;
}

/// Resolves dependency files relative to a base directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        FileResolver { base: base.into() }
    }

    /// Resolve relative to the directory holding `manifest_path`.
    pub fn beside(manifest_path: &Path) -> Self {
        FileResolver::new(manifest_path.parent().unwrap_or_else(|| Path::new(".")))
    }
}

impl Resolver for FileResolver {
    fn fetch(&self, dependency: &Dependency) -> io::Result<Vec<u8>> {
        fs::read(self.base.join(&dependency.file))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Device
// ════════════════════════════════════════════════════════════════════════════

/// Handle to a loaded granular device.
#[derive(Debug, Clone)]
pub struct Device {
    name:   String,
    shared: Arc<Shared>,
}

impl Device {
    /// Instantiate `patch` and connect its voice to `context`.
    pub fn load_patch(context: &mut dyn AudioContext, patch: &Patch) -> Result<Self, PatchLoadError> {
        patch.validate()?;

        let shared = Arc::new(Shared {
            parameters: patch.parameters.iter().map(Parameter::from_spec).collect(),
            buffers:    patch.buffers.iter()
                .map(|b| BufferSlot { id: b.id.clone(), data: Mutex::new(None) })
                .collect(),
        });

        let voice = GrainVoice::new(Arc::clone(&shared), patch.grains, context.sample_rate());
        context.connect(Box::new(voice));

        tracing::info!(
            patch = %patch.name,
            parameters = patch.parameters.len(),
            buffers = patch.buffers.len(),
            "device created"
        );

        Ok(Device { name: patch.name.clone(), shared })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn parameters(&self) -> &[Parameter] { &self.shared.parameters }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> { self.shared.parameter(name) }

    pub fn buffer_ids(&self) -> impl Iterator<Item = &str> {
        self.shared.buffers.iter().map(|b| b.id.as_str())
    }

    /// The buffer currently bound to `slot`, if any.
    pub fn buffer(&self, slot: &str) -> Option<Arc<AudioBuffer>> {
        self.shared.slot(slot)?.current()
    }

    /// Resolve and bind every dependency in `manifest`.
    ///
    /// Every entry is attempted.  If any entry fails, the whole load fails
    /// even though the successful entries have been bound; callers must not
    /// treat such a device as ready.  Returns the number of buffers bound.
    pub fn load_dependencies(
        &self,
        manifest: &Manifest,
        resolver: &dyn Resolver,
    ) -> Result<usize, DependencyLoadError> {
        let mut failed = Vec::new();

        for dep in &manifest.entries {
            match self.load_dependency(dep, resolver) {
                Ok(frames) => {
                    tracing::debug!(id = %dep.id, file = %dep.file, frames, "dependency loaded");
                }
                Err(reason) => {
                    tracing::warn!(id = %dep.id, file = %dep.file, %reason, "dependency failed");
                    failed.push(FailedDependency { id: dep.id.clone(), reason });
                }
            }
        }

        if failed.is_empty() {
            Ok(manifest.len())
        } else {
            Err(DependencyLoadError::Unresolved { total: manifest.len(), failed })
        }
    }

    fn load_dependency(&self, dep: &Dependency, resolver: &dyn Resolver) -> Result<usize, String> {
        if self.shared.slot(&dep.id).is_none() {
            return Err(DecodeError::UnknownSlot(dep.id.clone()).to_string());
        }
        let bytes  = resolver.fetch(dep).map_err(|e| e.to_string())?;
        let buffer = AudioBuffer::decode(&bytes).map_err(|e| e.to_string())?;
        let frames = buffer.len();
        self.set_data_buffer(&dep.id, buffer).map_err(|e| e.to_string())?;
        Ok(frames)
    }

    /// Decode raw audio bytes into the sample slot.
    pub fn set_buffer(&self, bytes: &[u8]) -> Result<(), DecodeError> {
        let buffer = AudioBuffer::decode(bytes)?;
        self.set_data_buffer(SAMPLE_BUFFER, buffer)
    }

    /// Bind an already decoded buffer to a named slot.
    pub fn set_data_buffer(&self, slot: &str, buffer: AudioBuffer) -> Result<(), DecodeError> {
        let slot = self.shared.slot(slot)
            .ok_or_else(|| DecodeError::UnknownSlot(slot.to_string()))?;
        slot.bind(buffer);
        Ok(())
    }

    /// Clamp `value` into the parameter's range and apply it immediately.
    /// Returns the value actually applied.
    pub fn set_parameter(&self, name: &str, value: f32) -> Result<f32, UnknownParameterError> {
        self.shared
            .parameter(name)
            .map(|p| p.set(value))
            .ok_or_else(|| UnknownParameterError(name.to_string()))
    }

    pub fn start(&self) { self.set_transport(1.0); }
    pub fn stop(&self)  { self.set_transport(0.0); }

    pub fn is_playing(&self) -> bool {
        self.shared.parameter(PLAY).map(|p| p.get() >= 0.5).unwrap_or(false)
    }

    fn set_transport(&self, value: f32) {
        // `play` is guaranteed by Patch::validate.
        if let Some(p) = self.shared.parameter(PLAY) {
            p.set(value);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
