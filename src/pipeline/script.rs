//! TOML scene scripts: the external scene-builder format.
//!
//! A script is declarative data interpreted by [`TomlSceneBuilder`]; it can
//! publish a tooltip, pick algorithm and renderer by name, override numeric
//! context entries and describe a CSG tree. String values of the form
//! `"$name"` are looked up in the parameters (script defaults from
//! `[params]`, overridden by the caller's `key=value` text).

use crate::core::math::transform::TransformFactory;
use crate::io::params::parse_key_value_list;
use crate::pipeline::algorithm::{image_function_by_name, renderer_by_name};
use crate::pipeline::resolve::{CancelToken, ExternalBuilder, ScriptEngine, ScriptGlobals};
use crate::scene::camera::Camera;
use crate::scene::context::{ContextKey, Phase};
use crate::scene::graph::{Attribute, NodeId, SceneGraph, SetOperation};
use crate::scene::light::Light;
use crate::scene::material::PhongMaterial;
use crate::scene::solid::{Cube, Plane, Solid, Sphere};
use crate::scene::texture::{CheckerTexture, Texture, WoodTexture};
use anyhow::{Context, anyhow, bail};
use log::debug;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneScript {
    #[serde(default)]
    pub script: ScriptHeader,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
    /// Numeric context entries by canonical key name.
    #[serde(default)]
    pub context: BTreeMap<String, f64>,
    pub scene: SceneSection,
    pub camera: CameraSection,
    #[serde(default)]
    pub lights: Vec<LightSection>,
    #[serde(default)]
    pub materials: BTreeMap<String, MaterialSection>,
    #[serde(default)]
    pub nodes: Vec<NodeSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptHeader {
    pub tooltip: Option<String>,
    pub algorithm: Option<String>,
    pub renderer: Option<String>,
    /// Values published into the context's side channel during the metadata pass.
    #[serde(default)]
    pub cache: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneSection {
    pub background: [f32; 3],
    #[serde(default)]
    pub operation: SetOperation,
    pub material: Option<String>,
    pub color: Option<[f32; 3]>,
    pub texture: Option<TextureSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSection {
    pub position: [f32; 3],
    pub direction: [f32; 3],
    #[serde(default = "default_angle")]
    pub angle: f32,
}

fn default_angle() -> f32 {
    40.0
}

/// A number, or `"$param"` naming one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Param(String),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum LightSection {
    Ambient { intensity: Scalar },
    Point { position: [f32; 3], intensity: Scalar },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialSection {
    pub color: [f32; 3],
    pub ka: Scalar,
    pub kd: Scalar,
    pub ks: Scalar,
    pub h: Scalar,
    pub n: Option<Scalar>,
    pub kt: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum TextureSection {
    Checker {
        #[serde(default = "default_cell")]
        u: f32,
        #[serde(default = "default_cell")]
        v: f32,
        color: [f32; 3],
    },
    Wood {
        #[serde(default = "default_frequency")]
        frequency: f32,
        #[serde(default = "default_seed")]
        seed: u64,
        light: Option<[f32; 3]>,
        dark: Option<[f32; 3]>,
    },
}

fn default_cell() -> f32 {
    0.5
}
fn default_frequency() -> f32 {
    5.0
}
fn default_seed() -> u64 {
    WoodTexture::DEFAULT_SEED
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolidKind {
    Cube,
    Plane,
    Sphere,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    pub solid: Option<SolidKind>,
    pub operation: Option<SetOperation>,
    #[serde(default)]
    pub children: Vec<NodeSection>,
    #[serde(default)]
    pub translate: [f32; 3],
    /// Degrees around X, Y, Z.
    #[serde(default)]
    pub rotate: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    pub material: Option<String>,
    pub color: Option<[f32; 3]>,
    pub texture: Option<TextureSection>,
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Compiles TOML scene scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlScriptEngine;

impl ScriptEngine for TomlScriptEngine {
    fn compile(&self, source: &str) -> anyhow::Result<Box<dyn ExternalBuilder>> {
        Ok(Box::new(TomlSceneBuilder::parse(source)?))
    }
}

/// A parsed scene script following the two-phase builder convention.
#[derive(Debug)]
pub struct TomlSceneBuilder {
    script: SceneScript,
}

type Params = HashMap<String, String>;

impl TomlSceneBuilder {
    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let script: SceneScript = toml::from_str(source).context("invalid scene script")?;
        for key in script.context.keys() {
            key.parse::<ContextKey>().map_err(|e| anyhow!(e))?;
        }
        Ok(Self { script })
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.script.script.tooltip.as_deref()
    }

    fn params(&self, param: &str) -> Params {
        let mut params: Params = self
            .script
            .params
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.to_lowercase(), text)
            })
            .collect();
        params.extend(parse_key_value_list(param));
        params
    }

    fn build(&self, scene: &mut SceneGraph, params: &Params, cancel: &CancelToken) -> anyhow::Result<()> {
        let s = &self.script;

        let root = scene.add_inner(s.scene.operation);
        self.apply_attributes(
            scene,
            root,
            params,
            s.scene.material.as_deref(),
            s.scene.color,
            s.scene.texture.as_ref(),
        )?;
        scene.root = Some(root);

        scene.camera = Some(Camera::new(
            Point3::from(s.camera.position),
            Vector3::from(s.camera.direction),
            s.camera.angle,
        ));

        scene.lights = s
            .lights
            .iter()
            .map(|l| match l {
                LightSection::Ambient { intensity } => {
                    Ok(Light::new_ambient(resolve_scalar(intensity, params)?))
                }
                LightSection::Point {
                    position,
                    intensity,
                } => Ok(Light::new_point(
                    Point3::from(*position),
                    resolve_scalar(intensity, params)?,
                )),
            })
            .collect::<anyhow::Result<_>>()?;

        for (i, node) in s.nodes.iter().enumerate() {
            self.build_node(scene, root, node, params, cancel)
                .with_context(|| format!("node #{}", i + 1))?;
        }

        // Publishing the background marks the scene as built.
        scene.background = Some(Vector3::from(s.scene.background));
        Ok(())
    }

    fn build_node(
        &self,
        scene: &mut SceneGraph,
        parent: NodeId,
        node: &NodeSection,
        params: &Params,
        cancel: &CancelToken,
    ) -> anyhow::Result<()> {
        cancel.check()?;

        let id = match (node.solid, node.operation) {
            (Some(kind), None) => {
                if !node.children.is_empty() {
                    bail!("a '{:?}' solid cannot have children", kind);
                }
                let solid: Arc<dyn Solid> = match kind {
                    SolidKind::Cube => Arc::new(Cube),
                    SolidKind::Plane => Arc::new(Plane::default()),
                    SolidKind::Sphere => Arc::new(Sphere::default()),
                };
                debug!("Adding {} leaf", solid.kind());
                scene.add_shared_solid(solid)
            }
            (None, Some(op)) => scene.add_inner(op),
            _ => bail!("a node needs exactly one of 'solid' or 'operation'"),
        };

        let transform = TransformFactory::placement(
            &Vector3::from(node.translate),
            &Vector3::from(node.rotate),
            &Vector3::from(node.scale),
        );
        scene.insert_child(parent, id, transform);
        self.apply_attributes(
            scene,
            id,
            params,
            node.material.as_deref(),
            node.color,
            node.texture.as_ref(),
        )?;

        for child in &node.children {
            self.build_node(scene, id, child, params, cancel)?;
        }
        Ok(())
    }

    fn apply_attributes(
        &self,
        scene: &mut SceneGraph,
        id: NodeId,
        params: &Params,
        material: Option<&str>,
        color: Option<[f32; 3]>,
        texture: Option<&TextureSection>,
    ) -> anyhow::Result<()> {
        if let Some(reference) = material {
            let name = resolve_text(reference, params)?;
            let section = self
                .script
                .materials
                .get(name)
                .ok_or_else(|| anyhow!("unknown material '{}'", name))?;
            scene.set_attribute(id, Attribute::Material(build_material(section, params)?));
        }
        if let Some(c) = color {
            scene.set_attribute(id, Attribute::Color(Vector3::from(c)));
        }
        if let Some(t) = texture {
            scene.set_attribute(id, Attribute::Texture(build_texture(t)));
        }
        Ok(())
    }
}

impl ExternalBuilder for TomlSceneBuilder {
    fn run(&self, globals: &mut ScriptGlobals, cancel: &CancelToken) -> anyhow::Result<()> {
        let header = &self.script.script;
        let ctx = &mut globals.context;

        if ctx.phase() == Phase::Probing {
            ctx.tooltip = Some(header.tooltip.clone().unwrap_or_default());
            ctx.extras
                .extend(header.cache.iter().map(|(k, v)| (k.clone(), v.clone())));
            debug!("Scene '{}': metadata published", globals.scene_name);
            return Ok(());
        }

        for (key, value) in &self.script.context {
            let key: ContextKey = key.parse().map_err(|e: String| anyhow!(e))?;
            ctx.set_number(key, *value).map_err(|e| anyhow!(e))?;
        }
        if let Some(name) = &header.algorithm {
            ctx.algorithm =
                Some(image_function_by_name(name).ok_or_else(|| anyhow!("unknown algorithm '{}'", name))?);
        }
        if let Some(name) = &header.renderer {
            ctx.renderer =
                Some(renderer_by_name(name).ok_or_else(|| anyhow!("unknown renderer '{}'", name))?);
        }

        if globals.scene.is_ready() {
            // Scene can be shared between calls.
            return Ok(());
        }

        let params = self.params(&globals.param);
        self.build(&mut globals.scene, &params, cancel)
    }
}

fn resolve_text<'a>(value: &'a str, params: &'a Params) -> anyhow::Result<&'a str> {
    match value.strip_prefix('$') {
        Some(name) => params
            .get(&name.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| anyhow!("undefined parameter '{}'", name)),
        None => Ok(value),
    }
}

fn resolve_scalar(value: &Scalar, params: &Params) -> anyhow::Result<f32> {
    match value {
        Scalar::Number(v) => Ok(*v as f32),
        Scalar::Param(text) => {
            if !text.starts_with('$') {
                bail!("expected a number or \"$param\", got '{}'", text);
            }
            let raw = resolve_text(text, params)?;
            raw.parse::<f32>()
                .with_context(|| format!("parameter {} = '{}' is not a number", text, raw))
        }
    }
}

fn build_material(section: &MaterialSection, params: &Params) -> anyhow::Result<PhongMaterial> {
    let material = PhongMaterial::new(
        Vector3::from(section.color),
        resolve_scalar(&section.ka, params)?,
        resolve_scalar(&section.kd, params)?,
        resolve_scalar(&section.ks, params)?,
        resolve_scalar(&section.h, params)?.round() as i32,
    );
    let n = match &section.n {
        Some(v) => resolve_scalar(v, params)?,
        None => material.n,
    };
    let kt = match &section.kt {
        Some(v) => resolve_scalar(v, params)?,
        None => material.kt,
    };
    Ok(material.with_transmission(n, kt))
}

fn build_texture(section: &TextureSection) -> Arc<dyn Texture> {
    match section {
        TextureSection::Checker { u, v, color } => {
            Arc::new(CheckerTexture::new(*u, *v, Vector3::from(*color)))
        }
        TextureSection::Wood {
            frequency,
            seed,
            light,
            dark,
        } => {
            let mut wood = WoodTexture::new(*frequency, *seed);
            if let Some(c) = light {
                wood.light = Vector3::from(*c);
            }
            if let Some(c) = dark {
                wood.dark = Vector3::from(*c);
            }
            Arc::new(wood)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::context::RenderContext;

    const SCRIPT: &str = r#"
[script]
tooltip = "mat={base|glass}, n=<double>"
algorithm = "background"
renderer = "simple"
cache = { table = 3 }

[params]
mat = "base"
n = 1.5

[context]
superSampling = 4

[scene]
background = [0.0, 0.05, 0.07]
material = "$mat"

[camera]
position = [0.0, 1.0, -8.0]
direction = [0.0, 0.0, 1.0]

[[lights]]
type = "ambient"
intensity = 0.5

[[lights]]
type = "point"
position = [-5.0, 3.0, -3.0]
intensity = 1

[materials.base]
color = [1.0, 0.6, 0.1]
ka = 0.1
kd = 0.8
ks = 0.2
h = 16

[materials.glass]
color = [0.0, 0.2, 0.1]
ka = 0.05
kd = 0.05
ks = 0.1
h = 128
n = "$n"
kt = 0.9

[[nodes]]
solid = "plane"
rotate = [-90.0, 0.0, 0.0]
translate = [0.0, -1.0, 0.0]
color = [0.6, 0.0, 0.0]
texture = { type = "checker", color = [1.0, 1.0, 1.0] }

[[nodes]]
operation = "difference"
translate = [1.0, 0.0, 0.0]

[[nodes.children]]
solid = "cube"

[[nodes.children]]
solid = "sphere"
scale = [0.7, 0.7, 0.7]
texture = { type = "wood", frequency = 8.0 }
"#;

    fn globals(tooltip: Option<&str>, param: &str) -> ScriptGlobals {
        let context = RenderContext {
            tooltip: tooltip.map(str::to_string),
            ..RenderContext::default()
        };
        ScriptGlobals {
            scene_name: "test".to_string(),
            scene: SceneGraph::new(),
            param: param.to_string(),
            context,
        }
    }

    #[test]
    fn metadata_pass_only_publishes_tooltip_and_cache() {
        let builder = TomlSceneBuilder::parse(SCRIPT).unwrap();
        let mut g = globals(None, "");

        builder.run(&mut g, &CancelToken::default()).unwrap();

        assert_eq!(g.context.tooltip.as_deref(), builder.tooltip());
        assert_eq!(g.context.extras.get("table"), Some(&toml::Value::Integer(3)));
        assert_eq!(g.scene.node_count(), 0);
        assert!(g.context.algorithm.is_none());
    }

    #[test]
    fn build_pass_constructs_tree_and_context() {
        let builder = TomlSceneBuilder::parse(SCRIPT).unwrap();
        let mut g = globals(Some(""), "mat=glass, n=1.9");

        builder.run(&mut g, &CancelToken::default()).unwrap();

        let scene = &g.scene;
        assert!(scene.is_ready());
        let root = scene.root.unwrap();
        assert_eq!(scene.children(root).len(), 2);
        let group = scene.children(root)[1];
        assert_eq!(scene.children(group).len(), 2);
        let sphere = scene.children(group)[1];
        assert_eq!(scene.material(sphere).unwrap().n, 1.9);
        assert!(scene.texture(sphere).is_some());
        assert_eq!(scene.lights.len(), 2);
        assert_eq!(scene.lights[0].intensity(), 0.5);

        assert_eq!(g.context.supersampling, Some(4));
        assert_eq!(g.context.algorithm.as_ref().unwrap().name(), "background");
        assert_eq!(g.context.renderer.as_ref().unwrap().name(), "simple");
    }

    #[test]
    fn build_pass_skips_published_scene() {
        let builder = TomlSceneBuilder::parse(SCRIPT).unwrap();
        let mut g = globals(Some(""), "");
        builder.run(&mut g, &CancelToken::default()).unwrap();
        let nodes = g.scene.node_count();

        builder.run(&mut g, &CancelToken::default()).unwrap();
        assert_eq!(g.scene.node_count(), nodes);
    }

    #[test]
    fn unknown_material_parameter_fails() {
        let builder = TomlSceneBuilder::parse(SCRIPT).unwrap();
        let mut g = globals(Some(""), "mat=velvet");
        let err = builder.run(&mut g, &CancelToken::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("velvet"));
    }

    #[test]
    fn malformed_scripts_are_rejected_at_compile_time() {
        assert!(TomlSceneBuilder::parse("[scene]\nbackground = 3").is_err());
        let bad_key = SCRIPT.replace("superSampling", "supersampling");
        assert!(TomlSceneBuilder::parse(&bad_key).is_err());
        assert!(TomlScriptEngine.compile("not toml at all [").is_err());
    }

    #[test]
    fn node_with_solid_and_operation_is_an_error() {
        let script = SCRIPT.replace("operation = \"difference\"", "operation = \"difference\"\nsolid = \"cube\"");
        let builder = TomlSceneBuilder::parse(&script).unwrap();
        let mut g = globals(Some(""), "");
        assert!(builder.run(&mut g, &CancelToken::default()).is_err());
    }

    #[test]
    fn cancelled_build_stops() {
        let builder = TomlSceneBuilder::parse(SCRIPT).unwrap();
        let mut g = globals(Some(""), "");
        let cancel = CancelToken::default();
        cancel.cancel();
        assert!(builder.run(&mut g, &cancel).is_err());
    }
}
