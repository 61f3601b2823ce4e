//! The audio session, the one object that owns the activation controller
//! and, once audio is running, the device.
//!
//! Setup is lazy.  Nothing touches the output until the first gesture asks
//! for activation; once the context is running the patch is instantiated on
//! the render thread and the dependency files load on a worker thread that
//! reports back over a channel.  The device only becomes reachable for
//! parameter updates after every dependency has been bound.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use grain_device::{
    AudioContext, Device, Manifest, Patch, Resolver, ResumeError, UnknownParameterError,
};

use crate::activation::{
    ActivationController, ActivationRequest, ActivationState, ActivationWait, ResumePolicy,
    WaitStatus,
};
use crate::error::SetupError;

// ════════════════════════════════════════════════════════════════════════════
// AudioLink: what the interaction loop needs from audio
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user granted permission and the output is running.
    Activated,
    /// Patch instantiated; dependencies are loading.
    Loading,
    /// Every dependency is bound; parameters and transport are live.
    Ready { patch: String, buffers: usize },
}

pub trait AudioLink {
    fn activation_state(&self) -> ActivationState;
    fn prompt_visible(&self) -> bool;
    /// Non-blocking.  `Err` means an autonomous resume failed and the next
    /// request may try again.
    fn request_activation(&mut self) -> Result<ActivationState, ResumeError>;
    fn grant_permission(&mut self) -> Result<bool, ResumeError>;
    /// Advance setup.  Called once per frame.  A returned error is reported
    /// once; the session then stays failed until [`retry_setup`](Self::retry_setup).
    fn poll(&mut self) -> Result<Option<SessionEvent>, SetupError>;
    /// Start a fresh setup attempt after a failure.  Returns `false` when
    /// there was nothing to retry.
    fn retry_setup(&mut self) -> bool;
    fn is_ready(&self) -> bool;
    /// `Ok(None)` while no device is ready.
    fn set_parameter(&self, name: &str, value: f32) -> Result<Option<f32>, UnknownParameterError>;
    fn start(&self);
    fn stop(&self);
}

// ════════════════════════════════════════════════════════════════════════════
// AudioSession
// ════════════════════════════════════════════════════════════════════════════

enum SetupPhase {
    Idle,
    Loading { device: Device, rx: Receiver<Result<usize, SetupError>> },
    Ready(Device),
    /// A device that was built keeps its voice connected, so a retry only
    /// reloads its buffers.
    Failed(Option<Device>),
}

pub struct AudioSession<C: AudioContext> {
    activation: ActivationController<C>,
    patch:      Patch,
    manifest:   Manifest,
    resolver:   Arc<dyn Resolver>,
    /// Replaces the sample slot once the manifest is bound.
    sample:     Option<PathBuf>,
    wait:       Option<ActivationWait>,
    setup:      SetupPhase,
}

impl<C: AudioContext> AudioSession<C> {
    pub fn new(
        context:  C,
        policy:   ResumePolicy,
        patch:    Patch,
        manifest: Manifest,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        AudioSession {
            activation: ActivationController::new(context, policy),
            patch,
            manifest,
            resolver,
            sample: None,
            wait:   None,
            setup:  SetupPhase::Idle,
        }
    }

    pub fn with_sample(mut self, path: impl Into<PathBuf>) -> Self {
        self.sample = Some(path.into());
        self
    }

    pub fn activation(&self) -> &ActivationController<C> { &self.activation }

    /// The device, once it is fully set up.
    pub fn device(&self) -> Option<&Device> {
        match &self.setup {
            SetupPhase::Ready(device) => Some(device),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool { matches!(self.setup, SetupPhase::Loading { .. }) }
    pub fn has_failed(&self) -> bool { matches!(self.setup, SetupPhase::Failed(_)) }

    fn begin_setup(&mut self) -> Result<SetupPhase, SetupError> {
        let device = Device::load_patch(self.activation.context_mut(), &self.patch)?;
        Ok(self.spawn_loader(device))
    }

    fn spawn_loader(&self, device: Device) -> SetupPhase {
        let (tx, rx)  = mpsc::channel();
        let worker    = device.clone();
        let manifest  = self.manifest.clone();
        let resolver  = Arc::clone(&self.resolver);
        let sample    = self.sample.clone();
        thread::spawn(move || {
            let result = load_buffers(&worker, &manifest, resolver.as_ref(), sample.as_deref());
            let _ = tx.send(result);
        });

        tracing::info!(patch = %self.patch.name, dependencies = self.manifest.len(), "loading dependencies");
        SetupPhase::Loading { device, rx }
    }

    /// The device that transport commands should reach: ready, or still
    /// loading (a release during loading must still stop it).
    fn transport(&self) -> Option<&Device> {
        match &self.setup {
            SetupPhase::Loading { device, .. } | SetupPhase::Ready(device) => Some(device),
            SetupPhase::Idle | SetupPhase::Failed(_) => None,
        }
    }
}

fn load_buffers(
    device:   &Device,
    manifest: &Manifest,
    resolver: &dyn Resolver,
    sample:   Option<&Path>,
) -> Result<usize, SetupError> {
    let bound = device.load_dependencies(manifest, resolver)?;
    if let Some(path) = sample {
        let bytes = fs::read(path)
            .map_err(|source| SetupError::SampleRead { path: path.to_path_buf(), source })?;
        device.set_buffer(&bytes)?;
        tracing::info!(path = %path.display(), "sample buffer replaced");
    }
    Ok(bound)
}

impl<C: AudioContext> AudioLink for AudioSession<C> {
    fn activation_state(&self) -> ActivationState { self.activation.state() }
    fn prompt_visible(&self)   -> bool            { self.activation.prompt_visible() }

    fn request_activation(&mut self) -> Result<ActivationState, ResumeError> {
        match self.activation.request() {
            ActivationRequest::Running        => {}
            ActivationRequest::AlreadyPending => {}
            ActivationRequest::Pending(wait)  => self.wait = Some(wait),
            ActivationRequest::Failed(e)      => return Err(e),
        }
        Ok(self.activation.state())
    }

    fn grant_permission(&mut self) -> Result<bool, ResumeError> {
        self.activation.grant()
    }

    fn poll(&mut self) -> Result<Option<SessionEvent>, SetupError> {
        if let Some(wait) = &self.wait {
            match wait.try_wait() {
                WaitStatus::Pending   => {}
                WaitStatus::Granted   => {
                    self.wait = None;
                    return Ok(Some(SessionEvent::Activated));
                }
                WaitStatus::Abandoned => self.wait = None,
            }
        }

        let phase = std::mem::replace(&mut self.setup, SetupPhase::Failed(None));
        let (next, result) = match phase {
            SetupPhase::Idle if self.activation.is_running() => match self.begin_setup() {
                Ok(loading) => (loading, Ok(Some(SessionEvent::Loading))),
                Err(e)      => (SetupPhase::Failed(None), Err(e)),
            },
            SetupPhase::Loading { device, rx } => match rx.try_recv() {
                Ok(Ok(buffers)) => {
                    tracing::info!(patch = %device.name(), buffers, "audio device ready");
                    let event = SessionEvent::Ready { patch: device.name().to_string(), buffers };
                    (SetupPhase::Ready(device), Ok(Some(event)))
                }
                Ok(Err(e))               => (SetupPhase::Failed(Some(device)), Err(e)),
                Err(TryRecvError::Empty) => (SetupPhase::Loading { device, rx }, Ok(None)),
                Err(TryRecvError::Disconnected) => {
                    (SetupPhase::Failed(Some(device)), Err(SetupError::LoaderLost))
                }
            },
            other => (other, Ok(None)),
        };
        self.setup = next;
        result
    }

    fn retry_setup(&mut self) -> bool {
        let device = match std::mem::replace(&mut self.setup, SetupPhase::Idle) {
            SetupPhase::Failed(device) => device,
            other => {
                self.setup = other;
                return false;
            }
        };
        tracing::info!(patch = %self.patch.name, "retrying audio setup");
        // Without a device the next poll instantiates the patch again.
        if let Some(device) = device {
            self.setup = self.spawn_loader(device);
        }
        true
    }

    fn is_ready(&self) -> bool { self.device().is_some() }

    fn set_parameter(&self, name: &str, value: f32) -> Result<Option<f32>, UnknownParameterError> {
        match self.device() {
            Some(device) => device.set_parameter(name, value).map(Some),
            None         => Ok(None),
        }
    }

    fn start(&self) {
        if let Some(device) = self.device() {
            device.start();
        }
    }

    fn stop(&self) {
        if let Some(device) = self.transport() {
            device.stop();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
