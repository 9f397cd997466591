use csg_scenes::pipeline::resolve::{
    ExternalSource, FailureKind, ResolveOutcome, SceneDescriptor, SceneResolver,
};
use csg_scenes::pipeline::script::TomlScriptEngine;
use csg_scenes::scene::context::{Phase, RenderContext, RenderSettings};
use csg_scenes::scene::library::default_scene;
use nalgebra::Vector3;
use std::path::PathBuf;
use std::sync::Arc;

const TWO_PASS: &str = r#"
[script]
tooltip = "size=<double>"
algorithm = "background"
renderer = "simple"

[params]
size = 1.0

[scene]
background = [0.2, 0.2, 0.2]

[camera]
position = [0.0, 0.0, -5.0]
direction = [0.0, 0.0, 1.0]

[[lights]]
type = "ambient"
intensity = 1.0

[[nodes]]
solid = "sphere"

[[nodes]]
solid = "cube"
translate = [2.0, 0.0, 0.0]
"#;

fn resolver() -> SceneResolver {
    SceneResolver::new(Arc::new(TomlScriptEngine))
}

fn fresh_context() -> RenderContext {
    let mut ctx = RenderContext::new();
    ctx.init(None, &RenderSettings::default());
    ctx
}

fn script(text: &str) -> SceneDescriptor {
    SceneDescriptor::External(ExternalSource::Text(text.to_string()))
}

fn default_background() -> Vector3<f32> {
    let mut scene = Default::default();
    default_scene(&mut scene);
    scene.background.unwrap()
}

#[test]
fn missing_script_file_falls_back_to_default_builder() {
    let mut ctx = fresh_context();
    ctx.tooltip = Some(String::new());
    let descriptor = SceneDescriptor::script_file("no/such/scene.toml");

    let outcome = resolver().resolve(&mut ctx, "missing", &descriptor, "", &default_scene);

    assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::ResourceAccess));
    assert_eq!(ctx.scene.background, Some(default_background()));
    assert!(ctx.scene.root.is_some() && ctx.scene.camera.is_some());
}

#[test]
fn metadata_pass_then_build_pass() {
    let mut resolver = resolver();
    let mut ctx = fresh_context();
    let descriptor = script(TWO_PASS);
    assert_eq!(ctx.phase(), Phase::Probing);

    let outcome = resolver.resolve(&mut ctx, "two-pass", &descriptor, "", &default_scene);
    assert_eq!(outcome, ResolveOutcome::Probed);
    assert_eq!(ctx.tooltip.as_deref(), Some("size=<double>"));
    assert_eq!(ctx.scene.node_count(), 0);
    assert!(ctx.scene.background.is_none());

    let outcome = resolver.resolve(&mut ctx, "two-pass", &descriptor, "", &default_scene);
    assert_eq!(outcome, ResolveOutcome::Script);
    let root = ctx.scene.root.unwrap();
    assert_eq!(ctx.scene.children(root).len(), 2);
    assert_eq!(ctx.scene.background, Some(Vector3::new(0.2, 0.2, 0.2)));
    assert_eq!(resolver.runs(), 2);
}

#[test]
fn repeated_resolution_reuses_the_published_scene() {
    let mut resolver = resolver();
    let mut ctx = fresh_context();
    ctx.tooltip = Some(String::new());
    let descriptor = script(TWO_PASS);

    resolver.resolve(&mut ctx, "frames", &descriptor, "", &default_scene);
    let root = ctx.scene.root.unwrap();
    let children = ctx.scene.children(root).len();
    let nodes = ctx.scene.node_count();

    ctx.init(None, &RenderSettings::default());
    let outcome = resolver.resolve(&mut ctx, "frames", &descriptor, "", &default_scene);

    assert_eq!(outcome, ResolveOutcome::Script);
    assert_eq!(ctx.scene.root, Some(root));
    assert_eq!(ctx.scene.children(root).len(), children);
    assert_eq!(ctx.scene.node_count(), nodes);
}

#[test]
fn context_init_forgets_algorithm_and_renderer() {
    let mut ctx = fresh_context();
    ctx.tooltip = Some(String::new());
    resolver().resolve(&mut ctx, "algo", &script(TWO_PASS), "", &default_scene);
    assert!(ctx.algorithm.is_some() && ctx.renderer.is_some());

    let settings = RenderSettings {
        width: 320,
        ..RenderSettings::default()
    };
    ctx.init(None, &settings);

    assert!(ctx.algorithm.is_none());
    assert!(ctx.renderer.is_none());
    assert_eq!(ctx.width, Some(320));
    assert!(ctx.scene.is_ready());
}

#[test]
fn broken_script_leaves_no_partial_graph() {
    let broken = TWO_PASS.replace("solid = \"cube\"", "solid = \"cube\"\noperation = \"union\"");
    let mut ctx = fresh_context();
    ctx.tooltip = Some(String::new());

    let outcome = resolver().resolve(&mut ctx, "broken", &script(&broken), "", &default_scene);

    assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Builder));
    assert_eq!(ctx.scene.background, Some(default_background()));
    let root = ctx.scene.root.unwrap();
    // Only what the default builder added.
    let mut expected = Default::default();
    default_scene(&mut expected);
    assert_eq!(ctx.scene.node_count(), expected.node_count());
    assert_eq!(ctx.scene.children(root).len(), expected.children(expected.root.unwrap()).len());
    assert!(ctx.algorithm.is_none());
}

#[test]
fn cubes_script_from_data_directory() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/rtscenes/cubes.toml");
    let descriptor = SceneDescriptor::script_file(path);
    let mut resolver = resolver();
    let mut ctx = fresh_context();

    assert_eq!(
        resolver.resolve(&mut ctx, "* cubes", &descriptor, "mat=glass, n=1.33", &default_scene),
        ResolveOutcome::Probed
    );
    assert_eq!(
        resolver.resolve(&mut ctx, "* cubes", &descriptor, "mat=glass, n=1.33", &default_scene),
        ResolveOutcome::Script
    );

    let scene = &ctx.scene;
    let root = scene.root.unwrap();
    assert_eq!(scene.children(root).len(), 3);
    let front_row = scene.children(root)[1];
    let cube = scene.children(front_row)[0];
    let material = scene.material(cube).unwrap();
    assert_eq!(material.n, 1.33);
    assert_eq!(material.kt, 0.9);
    assert_eq!(scene.leaves().len(), 13);
}
