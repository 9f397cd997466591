use crate::pipeline::wireframe::ViewParams;
use crate::scene::context::RenderSettings;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub view: ViewParams,
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// 0 lets the renderer decide.
    #[serde(default)]
    pub supersampling: u32,
    #[serde(default = "default_output")]
    pub output: String,
    /// Clear color of the wireframe preview when the scene has no background.
    #[serde(default = "default_background")]
    pub background: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            supersampling: 0,
            output: default_output(),
            background: default_background(),
        }
    }
}

fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_output() -> String {
    "output.png".to_string()
}
fn default_background() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationConfig {
    #[serde(default)]
    pub start: f64,
    #[serde(default = "default_end")]
    pub end: f64,
    #[serde(default = "default_fps")]
    pub fps: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: default_end(),
            fps: default_fps(),
        }
    }
}

fn default_end() -> f64 {
    10.0
}
fn default_fps() -> f64 {
    25.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    /// Time box for one external builder run; 0 waits forever.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Directories scanned for scene scripts at startup.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            dirs: Vec::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl ScriptsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Initial values for the numeric context entries.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            width: self.render.width,
            height: self.render.height,
            supersampling: self.render.supersampling,
            anim_start: self.animation.start,
            anim_end: self.animation.end,
            fps: self.animation.fps,
        }
    }
}
