//! Audio activation: bringing the output context from suspended to running.
//!
//! Some hosts let an app start audio on its own; others only after the user
//! has explicitly allowed it.  Which one applies is a [`ResumePolicy`] chosen
//! at construction, never sniffed from the environment.
//!
//! ```text
//!   Uninitialized ──request──┬─ Autonomous ── resume ok ──────────────► Running
//!                            │                 resume err ─► SuspendedAutoResumable
//!                            │                                  (request again)
//!                            └─ ConsentGated ─ already running ─────► Running
//!                                              otherwise ─► SuspendedAwaitingPermission
//!                                                           (prompt shown, one waiter)
//!                                                           ── grant ─► Running
//! ```

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use grain_device::{AudioContext, ResumeError};
use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════
// Policy and state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    /// Desktop-hosted: the app may resume output by itself.
    #[default]
    Autonomous,
    /// Browser-like: output resumes only after the user grants permission.
    ConsentGated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Uninitialized,
    SuspendedAwaitingPermission,
    SuspendedAutoResumable,
    Running,
}

// ════════════════════════════════════════════════════════════════════════════
// Request outcome and the one-shot wait handle
// ════════════════════════════════════════════════════════════════════════════

/// What a call to [`ActivationController::request`] produced.
#[derive(Debug)]
pub enum ActivationRequest {
    /// Output is running (now, or it already was).
    Running,
    /// The permission prompt is up; the handle resolves on grant.
    Pending(ActivationWait),
    /// A prompt is already up from an earlier request.  No new waiter.
    AlreadyPending,
    /// Autonomous resume failed.  The controller is retryable.
    Failed(ResumeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Pending,
    Granted,
    /// The controller went away without a grant.
    Abandoned,
}

/// Single-shot notification resolved when the user grants audio permission.
#[derive(Debug)]
pub struct ActivationWait {
    rx: Receiver<()>,
}

impl ActivationWait {
    /// Non-blocking check, for the render loop.
    pub fn try_wait(&self) -> WaitStatus {
        match self.rx.try_recv() {
            Ok(())                          => WaitStatus::Granted,
            Err(TryRecvError::Empty)        => WaitStatus::Pending,
            Err(TryRecvError::Disconnected) => WaitStatus::Abandoned,
        }
    }

    /// Block until granted.  Returns false if the controller was dropped.
    pub fn wait(self) -> bool {
        self.rx.recv().is_ok()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ActivationController
// ════════════════════════════════════════════════════════════════════════════

pub struct ActivationController<C: AudioContext> {
    context:        C,
    policy:         ResumePolicy,
    state:          ActivationState,
    prompt_visible: bool,
    /// At most one listener while awaiting permission.
    waiter:         Option<SyncSender<()>>,
}

impl<C: AudioContext> ActivationController<C> {
    pub fn new(context: C, policy: ResumePolicy) -> Self {
        ActivationController {
            context,
            policy,
            state:          ActivationState::Uninitialized,
            prompt_visible: false,
            waiter:         None,
        }
    }

    pub fn state(&self)          -> ActivationState { self.state }
    pub fn policy(&self)         -> ResumePolicy    { self.policy }
    pub fn is_running(&self)     -> bool            { self.state == ActivationState::Running }
    pub fn prompt_visible(&self) -> bool            { self.prompt_visible }
    pub fn context(&self)        -> &C              { &self.context }
    pub fn context_mut(&mut self) -> &mut C         { &mut self.context }

    /// Ask for running audio.  Never blocks.
    pub fn request(&mut self) -> ActivationRequest {
        match self.state {
            ActivationState::Running                     => return ActivationRequest::Running,
            ActivationState::SuspendedAwaitingPermission => return ActivationRequest::AlreadyPending,
            ActivationState::Uninitialized
            | ActivationState::SuspendedAutoResumable    => {}
        }

        match self.policy {
            ResumePolicy::Autonomous => {
                if self.context.is_running() {
                    self.state = ActivationState::Running;
                    return ActivationRequest::Running;
                }
                match self.context.resume() {
                    Ok(()) => {
                        self.state = ActivationState::Running;
                        tracing::info!("audio activated");
                        ActivationRequest::Running
                    }
                    Err(e) => {
                        self.state = ActivationState::SuspendedAutoResumable;
                        tracing::warn!(error = %e, "audio resume failed; will retry on next gesture");
                        ActivationRequest::Failed(e)
                    }
                }
            }
            ResumePolicy::ConsentGated => {
                if self.context.is_running() {
                    self.state = ActivationState::Running;
                    return ActivationRequest::Running;
                }
                let (tx, rx) = mpsc::sync_channel(1);
                self.waiter = Some(tx);
                self.prompt_visible = true;
                self.state = ActivationState::SuspendedAwaitingPermission;
                tracing::info!("waiting for audio permission");
                ActivationRequest::Pending(ActivationWait { rx })
            }
        }
    }

    /// The user-initiated grant.  Returns `Ok(true)` when it activated audio,
    /// `Ok(false)` when there was nothing to grant.  On failure the prompt
    /// and its waiter stay in place so the user can try again.
    pub fn grant(&mut self) -> Result<bool, ResumeError> {
        if self.state != ActivationState::SuspendedAwaitingPermission {
            return Ok(false);
        }
        if let Err(e) = self.context.resume() {
            tracing::warn!(error = %e, "audio resume failed after permission grant");
            return Err(e);
        }
        self.prompt_visible = false;
        self.state = ActivationState::Running;
        if let Some(tx) = self.waiter.take() {
            let _ = tx.try_send(());
        }
        tracing::info!("audio permission granted");
        Ok(true)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use grain_device::NullContext;
    use std::thread;

    fn controller(ctx: NullContext, policy: ResumePolicy) -> ActivationController<NullContext> {
        ActivationController::new(ctx, policy)
    }

    #[test]
    fn autonomous_resumes_immediately() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::Autonomous);
        assert_eq!(c.state(), ActivationState::Uninitialized);
        assert!(matches!(c.request(), ActivationRequest::Running));
        assert!(c.is_running());
        assert!(!c.prompt_visible());
        assert_eq!(c.context().resumes, 1);
    }

    #[test]
    fn autonomous_failure_is_retryable() {
        let mut c = controller(NullContext::failing(48_000, 1), ResumePolicy::Autonomous);
        assert!(matches!(c.request(), ActivationRequest::Failed(_)));
        assert_eq!(c.state(), ActivationState::SuspendedAutoResumable);
        assert!(matches!(c.request(), ActivationRequest::Running));
        assert_eq!(c.state(), ActivationState::Running);
    }

    #[test]
    fn consent_skips_prompt_when_already_running() {
        let mut c = controller(NullContext::running(48_000), ResumePolicy::ConsentGated);
        assert!(matches!(c.request(), ActivationRequest::Running));
        assert!(!c.prompt_visible());
        assert_eq!(c.context().resumes, 0);
    }

    #[test]
    fn consent_shows_prompt_and_waits() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        let ActivationRequest::Pending(wait) = c.request() else {
            panic!("expected a pending request");
        };
        assert_eq!(c.state(), ActivationState::SuspendedAwaitingPermission);
        assert!(c.prompt_visible());
        assert_eq!(wait.try_wait(), WaitStatus::Pending);

        assert_eq!(c.grant(), Ok(true));
        assert_eq!(wait.try_wait(), WaitStatus::Granted);
        assert!(c.is_running());
        assert!(!c.prompt_visible());
        assert!(c.context().is_running());
    }

    #[test]
    fn repeated_requests_register_one_waiter() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        let first = c.request();
        assert!(matches!(first, ActivationRequest::Pending(_)));
        assert!(matches!(c.request(), ActivationRequest::AlreadyPending));
        assert!(matches!(c.request(), ActivationRequest::AlreadyPending));
        assert_eq!(c.context().resumes, 0);
    }

    #[test]
    fn requests_while_running_are_no_ops() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        let _wait = c.request();
        c.grant().unwrap();
        let resumes = c.context().resumes;
        assert!(matches!(c.request(), ActivationRequest::Running));
        assert_eq!(c.context().resumes, resumes);
        assert!(!c.prompt_visible());
        assert_eq!(c.grant(), Ok(false));
    }

    #[test]
    fn failed_grant_keeps_prompt_and_waiter() {
        let mut c = controller(NullContext::failing(48_000, 1), ResumePolicy::ConsentGated);
        let ActivationRequest::Pending(wait) = c.request() else {
            panic!("expected a pending request");
        };
        assert!(c.grant().is_err());
        assert!(c.prompt_visible());
        assert_eq!(wait.try_wait(), WaitStatus::Pending);
        assert_eq!(c.grant(), Ok(true));
        assert_eq!(wait.try_wait(), WaitStatus::Granted);
    }

    #[test]
    fn grant_without_request_does_nothing() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        assert_eq!(c.grant(), Ok(false));
        assert_eq!(c.state(), ActivationState::Uninitialized);
    }

    #[test]
    fn blocking_wait_wakes_on_grant() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        let ActivationRequest::Pending(wait) = c.request() else {
            panic!("expected a pending request");
        };
        let waiter = thread::spawn(move || wait.wait());
        c.grant().unwrap();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn dropped_controller_abandons_wait() {
        let mut c = controller(NullContext::new(48_000), ResumePolicy::ConsentGated);
        let ActivationRequest::Pending(wait) = c.request() else {
            panic!("expected a pending request");
        };
        drop(c);
        assert_eq!(wait.try_wait(), WaitStatus::Abandoned);
    }
}
