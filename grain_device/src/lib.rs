//! # grain_device
//!
//! A thin facade over a granular sampler: the part of the audio engine the
//! sketch talks to.
//!
//! | Operation | What it does |
//! |---|---|
//! | [`Device::load_patch`] | instantiate a [`Patch`] and connect it to an [`AudioContext`] |
//! | [`Device::load_dependencies`] | bind every buffer in a [`Manifest`]; any failure fails the load |
//! | [`Device::set_buffer`] | decode WAV bytes into the sample slot |
//! | [`Device::set_parameter`] | clamp and apply a named control value immediately |
//! | [`Device::start`] / [`Device::stop`] | transport, via the `play` parameter |
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use grain_device::{Device, FileResolver, Manifest, NullContext, Patch};
//!
//! let mut ctx  = NullContext::new(48_000);
//! let patch    = Patch::from_file("assets/granular/patch.json")?;
//! let manifest = Manifest::from_file("assets/granular/dependencies.json")?;
//!
//! let device = Device::load_patch(&mut ctx, &patch)?;
//! device.load_dependencies(&manifest, &FileResolver::new("assets/granular"))?;
//! device.set_parameter("pos", 0.4)?;
//! device.start();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buffer;
pub mod context;
pub mod device;
pub mod engine;
pub mod error;
pub mod patch;

pub use buffer::AudioBuffer;
pub use context::{AudioContext, AudioNode, ContextState, CpalContext, NullContext};
pub use device::{Device, FileResolver, Parameter, Resolver};
pub use error::{
    DecodeError, DependencyLoadError, FailedDependency, OutputError, PatchLoadError,
    ResumeError, UnknownParameterError,
};
pub use patch::{Dependency, GrainSettings, Manifest, Patch, PITCH, PLAY, POS, SAMPLE_BUFFER};
