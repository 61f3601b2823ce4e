//! Application configuration, read from TOML.  Every field has a default, so
//! a config file only needs the keys it changes.
//!
//! ```toml
//! patch         = "assets/granular/patch.json"
//! dependencies  = "assets/granular/dependencies.json"
//! resume_policy = "consent-gated"
//! hue_step      = 7.5
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::activation::ResumePolicy;
use crate::error::AppError;
use crate::region::DrawingRegion;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window size in pixels.
    pub width:          usize,
    pub height:         usize,
    /// Width of the tool strip on the left; the drawing region is the rest.
    pub tool_width:     usize,

    pub patch:          PathBuf,
    /// Dependency files resolve relative to this manifest's directory.
    pub dependencies:   PathBuf,
    /// Replaces the sample slot after the dependencies are bound.
    pub sample:         Option<PathBuf>,

    pub resume_policy:  ResumePolicy,
    /// Skip the sound card and render into a null output.
    pub headless_audio: bool,
    pub output_device:  Option<String>,

    pub stroke_width:   u32,
    /// Degrees the hue advances per segment in cycling mode.
    pub hue_step:       f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            width:          800,
            height:         600,
            tool_width:     150,
            patch:          PathBuf::from("assets/granular/patch.json"),
            dependencies:   PathBuf::from("assets/granular/dependencies.json"),
            sample:         None,
            resume_policy:  ResumePolicy::Autonomous,
            headless_audio: false,
            output_device:  None,
            stroke_width:   2,
            hue_step:       5.0,
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| AppError::ConfigRead { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    /// Everything right of the tool strip.
    pub fn region(&self) -> Result<DrawingRegion, AppError> {
        let width  = self.width.saturating_sub(self.tool_width) as f32;
        let height = self.height as f32;
        DrawingRegion::new(self.tool_width as f32, 0.0, width, height)
            .ok_or(AppError::InvalidRegion { width, height })
    }
}
