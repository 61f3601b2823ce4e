//! Top-level interaction loop.
//!
//! `InteractionLoop` owns the audio session, the drawing surface and the
//! gesture in progress.  Pointer events are recorded as they arrive; each
//! frame [`tick`](InteractionLoop::tick) consumes the latest sample once and
//! applies it in a fixed order: `pos`, then `pitch`, then ink.

use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;

use grain_device::{
    AudioContext, CpalContext, FileResolver, Manifest, NullContext, Patch, Resolver, PITCH, POS,
};

use crate::activation::ActivationState;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::gesture::{GestureState, InputEvent, PointerEvent, UserCommand};
use crate::region::{DrawingRegion, RawPoint};
use crate::session::{AudioLink, AudioSession, SessionEvent};
use crate::surface::{ColorMode, DrawingSurface};
use crate::visualizer::Visualizer;

const HEADLESS_SAMPLE_RATE: u32 = 48_000;

// ════════════════════════════════════════════════════════════════════════════
// Debug readout
// ════════════════════════════════════════════════════════════════════════════

/// The last values forwarded to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebugReadout {
    pub pos:   f32,
    pub pitch: f32,
}

impl DebugReadout {
    pub fn pos_line(&self)   -> String { format!("pos: {:.2}", self.pos) }
    pub fn pitch_line(&self) -> String { format!("pitch: {:.3}", self.pitch) }
}

// ════════════════════════════════════════════════════════════════════════════
// InteractionLoop
// ════════════════════════════════════════════════════════════════════════════

pub struct InteractionLoop<A: AudioLink> {
    // ── owned state ──────────────────────────────────────────────────────
    audio:         A,
    surface:       DrawingSurface,
    region:        DrawingRegion,
    gesture:       GestureState,
    stroke_width:  u32,

    // ── activation ───────────────────────────────────────────────────────
    /// Set while an activation request is outstanding; suppresses duplicates.
    audio_pending: bool,

    // ── input recorded since the last tick ───────────────────────────────
    press:         Option<RawPoint>,
    sample:        Option<RawPoint>,
    release:       bool,

    readout:       DebugReadout,
    pub status:    String,
}

impl<A: AudioLink> InteractionLoop<A> {
    pub fn new(audio: A, region: DrawingRegion, surface: DrawingSurface, stroke_width: u32) -> Self {
        InteractionLoop {
            audio,
            surface,
            region,
            gesture:       GestureState::default(),
            stroke_width,
            audio_pending: false,
            press:         None,
            sample:        None,
            release:       false,
            readout:       DebugReadout::default(),
            status:        "Draw to play".to_string(),
        }
    }

    // ── input ─────────────────────────────────────────────────────────────

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press(p) => {
                self.press   = Some(p);
                self.sample  = None;
                self.release = false;
            }
            PointerEvent::Move(p) => self.sample = Some(p),
            PointerEvent::Release => self.release = true,
        }
    }

    pub fn handle_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::ClearDrawing => {
                self.surface.clear();
                self.status = "Canvas cleared".to_string();
            }
            UserCommand::ToggleColorMode => {
                self.status = match self.surface.toggle_color_mode() {
                    ColorMode::Fixed      => "Ink: fixed".to_string(),
                    ColorMode::CyclingHue => "Ink: rainbow".to_string(),
                };
            }
            UserCommand::GrantAudioPermission => match self.audio.grant_permission() {
                Ok(true)  => self.status = "Audio enabled".to_string(),
                Ok(false) => {}
                Err(e)    => self.status = format!("Audio unavailable: {}", e),
            },
        }
    }

    // ── per-frame tick ────────────────────────────────────────────────────

    /// Advance one frame.  Nothing here is fatal: audio failures are logged
    /// and shown on the status line while drawing carries on.
    pub fn tick(&mut self) {
        self.poll_audio();

        if let Some(p) = self.press.take() {
            self.begin_gesture(p);
        }
        if !self.gesture.active {
            self.sample  = None;
            self.release = false;
            return;
        }
        if let Some(p) = self.sample.take() {
            self.apply_sample(p);
        }
        if std::mem::take(&mut self.release) {
            self.end_gesture();
        }
    }

    fn poll_audio(&mut self) {
        match self.audio.poll() {
            Ok(Some(SessionEvent::Activated)) => {
                self.audio_pending = false;
                self.status = "Audio enabled".to_string();
            }
            Ok(Some(SessionEvent::Loading)) => {
                self.status = "Loading samples...".to_string();
            }
            Ok(Some(SessionEvent::Ready { patch, buffers })) => {
                self.status = format!("{} ready ({} buffers)", patch, buffers);
                // The press that triggered setup is still held.
                if self.gesture.active && self.gesture.began_inside {
                    self.audio.start();
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "audio setup failed; next gesture retries");
                self.status = format!("Audio setup failed: {}", e);
            }
        }
    }

    fn begin_gesture(&mut self, p: RawPoint) {
        let inside = self.region.contains(p);
        self.gesture.begin(Some(self.region.normalize(p)), inside);

        if self.audio.retry_setup() {
            self.status = "Loading samples...".to_string();
        }

        if self.audio.activation_state() != ActivationState::Running && !self.audio_pending {
            match self.audio.request_activation() {
                Ok(ActivationState::Running) => {}
                Ok(_) => {
                    self.audio_pending = true;
                    self.status = "Click ENABLE AUDIO or press Enter".to_string();
                }
                Err(e) => self.status = format!("Audio unavailable: {}", e),
            }
        }

        if inside && self.audio.is_ready() {
            self.audio.start();
        }
    }

    fn apply_sample(&mut self, p: RawPoint) {
        let point = self.region.normalize(p);
        if !self.region.contains(p) {
            // Remember where the stroke left so re-entry connects from the edge.
            self.gesture.last_point = Some(point);
            return;
        }

        if let Some(v) = self.forward(POS, point.x()) {
            self.readout.pos = v;
        }
        if let Some(v) = self.forward(PITCH, 1.0 - point.y()) {
            self.readout.pitch = v;
        }

        if let Some(prev) = self.gesture.last_point {
            let color = self.surface.next_color();
            self.surface.append_segment(
                Some(self.region.to_local(prev)),
                self.region.to_local(point),
                color,
                self.stroke_width,
            );
        }
        self.gesture.last_point = Some(point);
    }

    fn forward(&self, name: &str, value: f32) -> Option<f32> {
        match self.audio.set_parameter(name, value) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::warn!(error = %e, "parameter update dropped");
                None
            }
        }
    }

    fn end_gesture(&mut self) {
        self.audio.stop();
        self.gesture.reset();
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn audio(&self)          -> &A              { &self.audio }
    pub fn surface(&self)        -> &DrawingSurface { &self.surface }
    pub fn region(&self)         -> &DrawingRegion  { &self.region }
    pub fn gesture(&self)        -> &GestureState   { &self.gesture }
    pub fn readout(&self)        -> &DebugReadout   { &self.readout }
    pub fn prompt_visible(&self) -> bool            { self.audio.prompt_visible() }
}

// ════════════════════════════════════════════════════════════════════════════
// run(), the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the sketch until the window closes or the user quits.
///
/// Assets are read up front so a bad patch or manifest fails before the
/// window opens.  The sound card is opened suspended; nothing plays until the
/// first gesture activates it.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let region   = cfg.region()?;
    let patch    = Patch::from_file(&cfg.patch)?;
    let manifest = Manifest::from_file(&cfg.dependencies)?;
    let resolver: Arc<dyn Resolver> = Arc::new(FileResolver::beside(&cfg.dependencies));

    tracing::info!(
        patch = %patch.name,
        dependencies = manifest.len(),
        policy = ?cfg.resume_policy,
        "starting sketch"
    );

    if cfg.headless_audio {
        tracing::info!("headless audio requested; using null output");
        let ctx = NullContext::new(HEADLESS_SAMPLE_RATE);
        return drive(&cfg, region, session(ctx, &cfg, patch, manifest, resolver));
    }

    match CpalContext::open(cfg.output_device.as_deref()) {
        Ok(ctx) => drive(&cfg, region, session(ctx, &cfg, patch, manifest, resolver)),
        Err(e) => {
            tracing::warn!(error = %e, "no audio output; falling back to null output");
            let ctx = NullContext::new(HEADLESS_SAMPLE_RATE);
            drive(&cfg, region, session(ctx, &cfg, patch, manifest, resolver))
        }
    }
}

fn session<C: AudioContext>(
    ctx:      C,
    cfg:      &AppConfig,
    patch:    Patch,
    manifest: Manifest,
    resolver: Arc<dyn Resolver>,
) -> AudioSession<C> {
    let session = AudioSession::new(ctx, cfg.resume_policy, patch, manifest, resolver);
    match &cfg.sample {
        Some(path) => session.with_sample(path),
        None       => session,
    }
}

fn drive<A: AudioLink>(cfg: &AppConfig, region: DrawingRegion, audio: A) -> Result<(), AppError> {
    // ── input channel (window → loop) ─────────────────────────────────────
    let (input_tx, input_rx) = mpsc::channel::<InputEvent>();
    let mut vis = Visualizer::new(cfg, region, input_tx)?;

    let surface = DrawingSurface::new(region.width() as usize, region.height() as usize)
        .with_hue_step(cfg.hue_step);
    let mut app = InteractionLoop::new(audio, region, surface, cfg.stroke_width);

    while vis.is_open() {
        // 1. Poll window input → InputEvents
        if !vis.poll_input(app.prompt_visible()) { break; }

        // 2. Drain input events
        loop {
            match input_rx.try_recv() {
                Ok(InputEvent::Quit)       => return Ok(()),
                Ok(InputEvent::Pointer(p)) => app.handle_pointer(p),
                Ok(InputEvent::Command(c)) => app.handle_command(c),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 3. Per-frame logic
        app.tick();

        // 4. Render
        vis.render(
            app.surface(),
            app.readout(),
            &app.status,
            app.prompt_visible(),
        );
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ResumePolicy;
    use crate::error::SetupError;
    use crate::surface::{BLANK, DEFAULT_HUE_STEP, FIXED_INK};
    use grain_device::{ResumeError, UnknownParameterError};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    /// Records every call the loop makes.
    #[derive(Default)]
    struct FakeAudio {
        state:     Option<ActivationState>,
        ready:     bool,
        consent:   bool,
        requests:  usize,
        failed:    bool,
        retries:   usize,
        calls:     RefCell<Vec<(String, f32)>>,
        starts:    RefCell<usize>,
        stops:     RefCell<usize>,
        events:    Vec<Result<Option<SessionEvent>, SetupError>>,
    }

    impl FakeAudio {
        fn running() -> Self {
            FakeAudio { state: Some(ActivationState::Running), ready: true, ..Default::default() }
        }

        fn count(&self, name: &str) -> usize {
            self.calls.borrow().iter().filter(|(n, _)| n == name).count()
        }
    }

    impl AudioLink for FakeAudio {
        fn activation_state(&self) -> ActivationState {
            self.state.unwrap_or(ActivationState::Uninitialized)
        }

        fn prompt_visible(&self) -> bool {
            self.state == Some(ActivationState::SuspendedAwaitingPermission)
        }

        fn request_activation(&mut self) -> Result<ActivationState, ResumeError> {
            self.requests += 1;
            let next = if self.consent {
                ActivationState::SuspendedAwaitingPermission
            } else {
                ActivationState::Running
            };
            self.state = Some(next);
            Ok(next)
        }

        fn grant_permission(&mut self) -> Result<bool, ResumeError> {
            if self.prompt_visible() {
                self.state = Some(ActivationState::Running);
                self.events.push(Ok(Some(SessionEvent::Activated)));
                return Ok(true);
            }
            Ok(false)
        }

        fn poll(&mut self) -> Result<Option<SessionEvent>, SetupError> {
            if self.events.is_empty() { return Ok(None); }
            let event = self.events.remove(0);
            self.failed |= event.is_err();
            event
        }

        fn retry_setup(&mut self) -> bool {
            if !self.failed { return false; }
            self.failed   = false;
            self.retries += 1;
            true
        }

        fn is_ready(&self) -> bool { self.ready }

        fn set_parameter(&self, name: &str, value: f32) -> Result<Option<f32>, UnknownParameterError> {
            if !self.ready { return Ok(None); }
            if name != POS && name != PITCH {
                return Err(UnknownParameterError(name.to_string()));
            }
            self.calls.borrow_mut().push((name.to_string(), value));
            Ok(Some(value.clamp(0.0, 1.0)))
        }

        fn start(&self) { *self.starts.borrow_mut() += 1; }
        fn stop(&self)  { *self.stops.borrow_mut() += 1; }
    }

    fn make_loop(audio: FakeAudio) -> InteractionLoop<FakeAudio> {
        let region = DrawingRegion::new(150.0, 0.0, 650.0, 600.0).unwrap();
        InteractionLoop::new(audio, region, DrawingSurface::new(650, 600), 2)
    }

    fn ink(app: &InteractionLoop<FakeAudio>) -> usize {
        app.surface().pixels().iter().filter(|&&p| p != BLANK).count()
    }

    fn step(app: &mut InteractionLoop<FakeAudio>, event: PointerEvent) {
        app.handle_pointer(event);
        app.tick();
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut app = make_loop(FakeAudio::running());
        let before = ink(&app);
        app.tick();
        assert_eq!(ink(&app), before);
        assert!(app.audio().calls.borrow().is_empty());
        assert_eq!(*app.audio().stops.borrow(), 0);
    }

    #[test]
    fn gesture_forwards_once_per_move_then_stops() {
        let mut app = make_loop(FakeAudio::running());
        // Cycling ink advances the hue once per appended segment.
        app.handle_command(UserCommand::ToggleColorMode);
        let border = ink(&app);

        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        assert_eq!(*app.audio().starts.borrow(), 1);
        assert!(app.audio().calls.borrow().is_empty());
        assert_eq!(app.surface().hue(), 0.0);

        step(&mut app, PointerEvent::Move(RawPoint::new(400.0, 200.0)));
        assert_eq!(app.audio().count(POS), 1);
        assert_eq!(app.audio().count(PITCH), 1);
        assert_eq!(app.surface().hue(), DEFAULT_HUE_STEP);
        let after_first = ink(&app);
        assert!(after_first > border);

        step(&mut app, PointerEvent::Move(RawPoint::new(500.0, 100.0)));
        assert_eq!(app.audio().count(POS), 2);
        assert_eq!(app.audio().count(PITCH), 2);
        assert_eq!(app.surface().hue(), 2.0 * DEFAULT_HUE_STEP);
        assert!(ink(&app) > after_first);

        step(&mut app, PointerEvent::Release);
        assert_eq!(*app.audio().stops.borrow(), 1);
        assert!(!app.gesture().active);
        assert_eq!(app.gesture().last_point, None);
    }

    #[test]
    fn updates_arrive_pos_then_pitch() {
        let mut app = make_loop(FakeAudio::running());
        step(&mut app, PointerEvent::Press(RawPoint::new(200.0, 100.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(475.0, 150.0)));

        let calls = app.audio().calls.borrow().clone();
        assert_eq!(calls, vec![(POS.to_string(), 0.5), (PITCH.to_string(), 0.75)]);
        assert_eq!(app.readout().pos_line(), "pos: 0.50");
        assert_eq!(app.readout().pitch_line(), "pitch: 0.750");
    }

    #[test]
    fn only_latest_sample_per_frame_is_used() {
        let mut app = make_loop(FakeAudio::running());
        step(&mut app, PointerEvent::Press(RawPoint::new(200.0, 100.0)));
        app.handle_pointer(PointerEvent::Move(RawPoint::new(250.0, 100.0)));
        app.handle_pointer(PointerEvent::Move(RawPoint::new(300.0, 100.0)));
        app.tick();
        assert_eq!(app.audio().count(POS), 1);
        app.tick();
        assert_eq!(app.audio().count(POS), 1);
    }

    #[test]
    fn samples_outside_region_are_ignored() {
        let mut app = make_loop(FakeAudio::running());
        let border = ink(&app);
        step(&mut app, PointerEvent::Press(RawPoint::new(50.0, 100.0)));
        assert_eq!(*app.audio().starts.borrow(), 0);
        step(&mut app, PointerEvent::Move(RawPoint::new(100.0, 120.0)));
        assert!(app.audio().calls.borrow().is_empty());
        assert_eq!(ink(&app), border);

        step(&mut app, PointerEvent::Release);
        assert_eq!(*app.audio().stops.borrow(), 1);
    }

    #[test]
    fn single_point_gesture_draws_nothing() {
        let mut app = make_loop(FakeAudio::running());
        let border = ink(&app);
        step(&mut app, PointerEvent::Press(RawPoint::new(400.0, 300.0)));
        step(&mut app, PointerEvent::Release);
        assert_eq!(ink(&app), border);
        assert!(app.audio().calls.borrow().is_empty());
    }

    #[test]
    fn entering_from_tool_strip_connects_from_edge() {
        let mut app = make_loop(FakeAudio::running());
        step(&mut app, PointerEvent::Press(RawPoint::new(50.0, 300.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(250.0, 300.0)));
        // Region-local: from the clamped left edge (0, 300) to (100, 300).
        assert_eq!(app.surface().pixel(50, 300), Some(FIXED_INK));
        assert_eq!(app.audio().count(POS), 1);
    }

    #[test]
    fn ink_is_drawn_before_audio_is_ready() {
        let mut app = make_loop(FakeAudio { consent: true, ..Default::default() });
        let border = ink(&app);
        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(320.0, 310.0)));
        assert!(ink(&app) > border);
        assert!(app.audio().calls.borrow().is_empty());
    }

    #[test]
    fn activation_requested_once_while_pending() {
        let mut app = make_loop(FakeAudio { consent: true, ..Default::default() });
        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        step(&mut app, PointerEvent::Release);
        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        step(&mut app, PointerEvent::Release);
        assert_eq!(app.audio().requests, 1);
        assert!(app.prompt_visible());

        app.handle_command(UserCommand::GrantAudioPermission);
        app.tick();
        assert!(!app.prompt_visible());
        assert_eq!(app.status, "Audio enabled");
    }

    #[test]
    fn activation_while_running_is_a_no_op() {
        let mut app = make_loop(FakeAudio::running());
        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        step(&mut app, PointerEvent::Release);
        assert_eq!(app.audio().requests, 0);
    }

    #[test]
    fn toggle_mid_gesture_keeps_earlier_ink() {
        let mut app = make_loop(FakeAudio::running());
        step(&mut app, PointerEvent::Press(RawPoint::new(200.0, 100.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(300.0, 100.0)));
        // Region-local x = 100..150 on row 100.
        assert_eq!(app.surface().pixel(100, 100), Some(FIXED_INK));

        app.handle_command(UserCommand::ToggleColorMode);
        step(&mut app, PointerEvent::Move(RawPoint::new(300.0, 400.0)));

        assert_eq!(app.surface().pixel(100, 100), Some(FIXED_INK));
        let new_ink = app.surface().pixel(150, 300).unwrap();
        assert_ne!(new_ink, FIXED_INK);
        assert_ne!(new_ink, BLANK);
    }

    #[test]
    fn clear_command_erases_ink() {
        let mut app = make_loop(FakeAudio::running());
        let border = ink(&app);
        step(&mut app, PointerEvent::Press(RawPoint::new(200.0, 100.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(400.0, 300.0)));
        assert!(ink(&app) > border);
        app.handle_command(UserCommand::ClearDrawing);
        assert_eq!(ink(&app), border);
    }

    #[test]
    fn unknown_parameter_never_aborts_the_frame() {
        let mut app = make_loop(FakeAudio::running());
        assert_eq!(app.forward("grain", 0.3), None);
        step(&mut app, PointerEvent::Press(RawPoint::new(200.0, 100.0)));
        step(&mut app, PointerEvent::Move(RawPoint::new(400.0, 300.0)));
        assert_eq!(app.audio().count(POS), 1);
    }

    #[test]
    fn setup_failure_keeps_drawing_and_retries() {
        let mut audio = FakeAudio::running();
        audio.ready = false;
        audio.events.push(Err(SetupError::LoaderLost));
        let mut app = make_loop(audio);
        let border = ink(&app);

        app.tick();
        assert!(app.status.starts_with("Audio setup failed"));

        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        assert_eq!(app.audio().retries, 1);
        assert_eq!(app.status, "Loading samples...");
        step(&mut app, PointerEvent::Move(RawPoint::new(400.0, 350.0)));
        assert!(ink(&app) > border);
        step(&mut app, PointerEvent::Release);

        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        assert_eq!(app.audio().retries, 1);
    }

    #[test]
    fn ready_mid_gesture_starts_transport() {
        let mut audio = FakeAudio::running();
        audio.ready = false;
        let mut app = make_loop(audio);

        step(&mut app, PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        assert_eq!(*app.audio().starts.borrow(), 0);

        app.audio.ready = true;
        app.audio.events.push(Ok(Some(SessionEvent::Ready { patch: "granular".into(), buffers: 1 })));
        app.tick();
        assert_eq!(*app.audio().starts.borrow(), 1);
    }

    #[test]
    fn ready_after_outside_press_leaves_transport_alone() {
        let mut audio = FakeAudio::running();
        audio.ready = false;
        audio.events.push(Ok(None));
        audio.events.push(Ok(Some(SessionEvent::Ready { patch: "granular".into(), buffers: 1 })));
        let mut app = make_loop(audio);

        step(&mut app, PointerEvent::Press(RawPoint::new(50.0, 300.0)));
        app.tick();
        assert_eq!(*app.audio().starts.borrow(), 0);
    }

    // ── against a real session over the bundled assets ────────────────────

    fn bundled_loop() -> InteractionLoop<AudioSession<NullContext>> {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../assets/granular");
        let deps = dir.join("dependencies.json");
        let session = AudioSession::new(
            NullContext::new(48_000),
            ResumePolicy::Autonomous,
            Patch::from_file(dir.join("patch.json")).unwrap(),
            Manifest::from_file(&deps).unwrap(),
            Arc::new(FileResolver::beside(&deps)),
        );
        let region = DrawingRegion::new(150.0, 0.0, 650.0, 600.0).unwrap();
        InteractionLoop::new(session, region, DrawingSurface::new(650, 600), 2)
    }

    fn tick_until_ready(app: &mut InteractionLoop<AudioSession<NullContext>>) {
        for _ in 0..2000 {
            app.tick();
            if app.audio().is_ready() { return; }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("audio setup never finished");
    }

    #[test]
    fn first_gesture_plays_once_setup_finishes() {
        let mut app = bundled_loop();
        app.handle_pointer(PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        app.tick();
        assert_eq!(app.audio().activation_state(), ActivationState::Running);
        assert!(!app.audio().is_ready());

        tick_until_ready(&mut app);
        let device = app.audio().device().unwrap().clone();
        assert!(device.is_playing());

        app.handle_pointer(PointerEvent::Move(RawPoint::new(475.0, 150.0)));
        app.tick();
        assert_eq!(device.parameter(POS).unwrap().get(), 0.5);
        assert!(device.is_playing());

        app.handle_pointer(PointerEvent::Release);
        app.tick();
        assert!(!device.is_playing());
    }

    #[test]
    fn gesture_released_during_setup_stays_stopped() {
        let mut app = bundled_loop();
        app.handle_pointer(PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        app.tick();
        app.handle_pointer(PointerEvent::Release);
        app.tick();

        tick_until_ready(&mut app);
        assert!(!app.audio().device().unwrap().is_playing());
    }

    #[test]
    fn press_and_release_in_one_frame_still_stops() {
        let mut app = make_loop(FakeAudio::running());
        app.handle_pointer(PointerEvent::Press(RawPoint::new(300.0, 300.0)));
        app.handle_pointer(PointerEvent::Release);
        app.tick();
        assert_eq!(*app.audio().starts.borrow(), 1);
        assert_eq!(*app.audio().stops.borrow(), 1);
        assert!(!app.gesture().active);
    }
}
