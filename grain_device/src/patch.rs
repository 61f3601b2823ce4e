//! Patch definitions and dependency manifests.
//!
//! Both are JSON assets loaded at startup.  A patch names the device's
//! control parameters, its buffer slots and the grain settings of the voice;
//! a manifest lists the sample files to bind into those slots.
//!
//! ```json
//! {
//!   "name": "granular",
//!   "parameters": [
//!     { "id": "pos",   "min": 0.0, "max": 1.0, "initial": 0.0 },
//!     { "id": "pitch", "min": 0.0, "max": 1.0, "initial": 0.5 },
//!     { "id": "play",  "min": 0.0, "max": 1.0, "initial": 0.0 }
//!   ],
//!   "buffers": [ { "id": "buf_sample" } ],
//!   "grains":  { "grain_ms": 90.0, "density": 28.0 }
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DependencyLoadError, PatchLoadError};

/// Horizontal read position within the sample, 0–1.
pub const POS: &str = "pos";
/// Playback pitch, 0–1 (0.5 = original pitch).
pub const PITCH: &str = "pitch";
/// Transport gate: 1 = playing, 0 = silent.
pub const PLAY: &str = "play";
/// The buffer slot that [`Device::set_buffer`](crate::Device::set_buffer) replaces.
pub const SAMPLE_BUFFER: &str = "buf_sample";

const REQUIRED_PARAMETERS: [&str; 3] = [POS, PITCH, PLAY];

// ════════════════════════════════════════════════════════════════════════════
// Patch
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub id:      String,
    pub min:     f32,
    pub max:     f32,
    #[serde(default)]
    pub initial: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpec {
    pub id: String,
}

/// Voice settings.  Every field has a default so patches may omit the block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainSettings {
    /// Length of each grain in milliseconds.
    pub grain_ms: f32,
    /// Grains started per second while playing.
    pub density:  f32,
    /// Random offset of each grain's start, as a fraction of the sample.
    pub jitter:   f32,
    /// Pitch range either side of the original, in octaves.
    pub octaves:  f32,
    /// Output gain applied to the summed grains.
    pub gain:     f32,
}

impl Default for GrainSettings {
    fn default() -> Self {
        GrainSettings {
            grain_ms: 90.0,
            density:  28.0,
            jitter:   0.01,
            octaves:  1.0,
            gain:     0.35,
        }
    }
}

/// A parsed, validated patch definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name:       String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default)]
    pub buffers:    Vec<BufferSpec>,
    #[serde(default)]
    pub grains:     GrainSettings,
}

impl Patch {
    /// Parse and validate a patch from JSON text.
    pub fn parse(json: &str) -> Result<Self, PatchLoadError> {
        let patch: Patch = serde_json::from_str(json)?;
        patch.validate()?;
        Ok(patch)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatchLoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PatchLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json)
    }

    /// Check that the patch can be instantiated as a device.
    pub fn validate(&self) -> Result<(), PatchLoadError> {
        let mut seen = HashSet::new();
        for p in &self.parameters {
            if !seen.insert(p.id.as_str()) {
                return Err(PatchLoadError::DuplicateParameter(p.id.clone()));
            }
            if !p.min.is_finite() || !p.max.is_finite() || p.min > p.max {
                return Err(PatchLoadError::InvalidRange { id: p.id.clone(), min: p.min, max: p.max });
            }
        }
        for required in REQUIRED_PARAMETERS {
            if !seen.contains(required) {
                return Err(PatchLoadError::MissingParameter(required));
            }
        }

        let mut slots = HashSet::new();
        for b in &self.buffers {
            if !slots.insert(b.id.as_str()) {
                return Err(PatchLoadError::DuplicateBuffer(b.id.clone()));
            }
        }
        if !slots.contains(SAMPLE_BUFFER) {
            return Err(PatchLoadError::MissingBuffer(SAMPLE_BUFFER));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Manifest
// ════════════════════════════════════════════════════════════════════════════

/// A named data dependency: the buffer slot it fills and where its bytes live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id:   String,
    pub file: String,
}

/// The list of dependencies a device needs before it is playable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<Dependency>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, DependencyLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DependencyLoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| DependencyLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
