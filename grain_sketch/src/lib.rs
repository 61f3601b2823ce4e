//! # grain_sketch
//!
//! Draw to play.  Dragging the pointer across the canvas leaves a persistent
//! line and, at the same time, drives a granular sampler: horizontal position
//! picks the read position in the sample, vertical position picks the pitch.
//!
//! ## Gesture → Action mapping
//!
//! | Input | Action |
//! |---|---|
//! | Press | Request audio activation (first time); start transport if inside the canvas |
//! | Drag inside canvas | `pos` ← x, `pitch` ← 1 − y, then draw a segment from the previous sample |
//! | Release | Stop transport |
//! | `C` / CLEAR | Clear the canvas |
//! | `M` / INK | Toggle fixed / rainbow ink |
//! | `Enter` / ENABLE AUDIO | Grant audio permission (consent-gated hosts) |
//! | `Q` / `Escape` | Quit |
//!
//! ## Audio activation
//!
//! Audio starts suspended.  With the `autonomous` policy the first gesture
//! resumes it directly; with `consent-gated` the first gesture raises a
//! permission prompt and audio only starts once the user grants it.  The
//! device is built after the output is running.

pub mod activation;
pub mod app;
pub mod config;
pub mod error;
pub mod gesture;
pub mod region;
pub mod session;
pub mod surface;
pub mod visualizer;
