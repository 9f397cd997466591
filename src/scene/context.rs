use crate::pipeline::algorithm::{ImageFunction, Renderer};
use crate::scene::graph::SceneGraph;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The fixed set of well-known context entries, with their canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    Scene,
    Algorithm,
    Synthesizer,
    Tooltip,
    Width,
    Height,
    SuperSampling,
    StartAnim,
    EndAnim,
    Fps,
}

impl ContextKey {
    pub const ALL: [ContextKey; 10] = [
        ContextKey::Scene,
        ContextKey::Algorithm,
        ContextKey::Synthesizer,
        ContextKey::Tooltip,
        ContextKey::Width,
        ContextKey::Height,
        ContextKey::SuperSampling,
        ContextKey::StartAnim,
        ContextKey::EndAnim,
        ContextKey::Fps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::Scene => "scene",
            ContextKey::Algorithm => "algorithm",
            ContextKey::Synthesizer => "synthesizer",
            ContextKey::Tooltip => "tooltip",
            ContextKey::Width => "width",
            ContextKey::Height => "height",
            ContextKey::SuperSampling => "superSampling",
            ContextKey::StartAnim => "startAnim",
            ContextKey::EndAnim => "endAnim",
            ContextKey::Fps => "fps",
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKey {
    type Err = String;

    /// Names are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContextKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown context key '{}'", s))
    }
}

/// Which pass of the two-phase builder protocol a context is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No tooltip yet: builders publish metadata only.
    Probing,
    /// Tooltip present: builders construct the scene.
    Built,
}

/// Numeric and time parameters of a rendering session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub supersampling: u32,
    pub anim_start: f64,
    pub anim_end: f64,
    pub fps: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            supersampling: 0,
            anim_start: 0.0,
            anim_end: 10.0,
            fps: 25.0,
        }
    }
}

/// Shared state between the resolution pipeline, scene builders and the front end.
///
/// Builders may keep private precomputed values in `extras`.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub scene: SceneGraph,
    pub algorithm: Option<Arc<dyn ImageFunction>>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub tooltip: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub supersampling: Option<u32>,
    pub anim_start: Option<f64>,
    pub anim_end: Option<f64>,
    pub fps: Option<f64>,
    pub extras: BTreeMap<String, toml::Value>,
}

/// Values read back from a context after resolution.
#[derive(Debug, Clone)]
pub struct MinedContext<'a> {
    pub scene: &'a SceneGraph,
    pub algorithm: Option<Arc<dyn ImageFunction>>,
    pub renderer: Option<Arc<dyn Renderer>>,
    /// Empty when no builder published one.
    pub tooltip: String,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.tooltip.is_some() {
            Phase::Built
        } else {
            Phase::Probing
        }
    }

    /// (Re)initializes the context before a resolution.
    ///
    /// Numeric fields are always overwritten, `existing` replaces the scene when
    /// given, and `algorithm`/`renderer` are cleared so the next builder has to
    /// publish them again.
    pub fn init(&mut self, existing: Option<SceneGraph>, settings: &RenderSettings) {
        if let Some(scene) = existing {
            self.scene = scene;
        }

        self.algorithm = None;
        self.renderer = None;

        self.width = Some(settings.width);
        self.height = Some(settings.height);
        self.supersampling = Some(settings.supersampling);
        self.anim_start = Some(settings.anim_start);
        self.anim_end = Some(settings.anim_end);
        self.fps = Some(settings.fps);
    }

    /// Reads back what the front end needs. Numeric fields of `settings` are
    /// overwritten only when the context holds a value for them.
    pub fn mine(&self, settings: &mut RenderSettings) -> MinedContext<'_> {
        if let Some(v) = self.width {
            settings.width = v;
        }
        if let Some(v) = self.height {
            settings.height = v;
        }
        if let Some(v) = self.supersampling {
            settings.supersampling = v;
        }
        if let Some(v) = self.anim_start {
            settings.anim_start = v;
        }
        if let Some(v) = self.anim_end {
            settings.anim_end = v;
        }
        if let Some(v) = self.fps {
            settings.fps = v;
        }

        MinedContext {
            scene: &self.scene,
            algorithm: self.algorithm.clone(),
            renderer: self.renderer.clone(),
            tooltip: self.tooltip.clone().unwrap_or_default(),
        }
    }

    /// Assigns a numeric entry by its canonical key name.
    pub fn set_number(&mut self, key: ContextKey, value: f64) -> Result<(), String> {
        let as_count = |v: f64| -> Result<u32, String> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(format!("'{}' expects a non-negative integer, got {}", key, v))
            }
        };

        match key {
            ContextKey::Width => self.width = Some(as_count(value)?),
            ContextKey::Height => self.height = Some(as_count(value)?),
            ContextKey::SuperSampling => self.supersampling = Some(as_count(value)?),
            ContextKey::StartAnim => self.anim_start = Some(value),
            ContextKey::EndAnim => self.anim_end = Some(value),
            ContextKey::Fps => self.fps = Some(value),
            other => return Err(format!("'{}' is not a numeric context entry", other)),
        }
        Ok(())
    }
}
