use crate::core::framebuffer::FrameBuffer;
use crate::io::cli::Cli;
use crate::io::config::Config;
use crate::io::image::save_framebuffer;
use crate::io::obj_loader::load_obj;
use crate::pipeline::algorithm::{Renderer, SimpleRenderer};
use crate::pipeline::repository::SceneRepository;
use crate::pipeline::resolve::{ResolveOutcome, SceneDescriptor, SceneResolver};
use crate::pipeline::script::TomlScriptEngine;
use crate::pipeline::wireframe::Wireframe;
use crate::scene::context::{Phase, RenderContext, RenderSettings};
use crate::scene::graph::SceneGraph;
use crate::scene::library;
use crate::scene::mesh::Mesh;
use log::{info, warn};
use nalgebra::Vector3;
use std::sync::Arc;
use std::time::Instant;

/// Runs the previewer headless: resolve the requested scene, render it, save the image.
pub fn run_cli(cli: &Cli, config: &Config) -> Result<(), String> {
    info!("Starting CLI mode...");

    let mut repo = SceneRepository::with_builtins();
    repo.discover(&cli.discovery(config));

    let mut resolver =
        SceneResolver::new(Arc::new(TomlScriptEngine)).with_timeout(config.scripts.timeout());

    if cli.list {
        list_scenes(&repo, &mut resolver, config);
        return Ok(());
    }

    if let Some(path) = &cli.obj {
        let mesh = load_obj(path)?;
        let mut fb = new_framebuffer(&config.render_settings());
        fb.clear(Vector3::from(config.render.background));
        draw_wireframe(&mut fb, &mesh, config);
        return save(&fb, &config.render.output);
    }

    let descriptor = repo
        .get(&cli.scene)
        .ok_or_else(|| format!("Unknown scene '{}' (try --list)", cli.scene))?
        .clone();

    let start_time = Instant::now();
    let mut settings = config.render_settings();
    let mut ctx = RenderContext::new();
    ctx.init(None, &settings);

    if matches!(descriptor, SceneDescriptor::External(_)) {
        // Metadata pass; a failure here already leaves the default scene in place.
        let outcome =
            resolver.resolve(&mut ctx, &cli.scene, &descriptor, &cli.param, &library::default_scene);
        if let Some(failure) = outcome.failure() {
            warn!("Metadata pass of '{}' failed: {}", cli.scene, failure);
        }
        if ctx.phase() == Phase::Probing {
            ctx.tooltip = Some(String::new());
        }
    }

    let frames = cli.frames.max(1);
    for frame in 0..frames {
        ctx.init(None, &settings);
        let outcome =
            resolver.resolve(&mut ctx, &cli.scene, &descriptor, &cli.param, &library::default_scene);
        if let ResolveOutcome::Fallback(failure) = &outcome {
            warn!("Scene '{}' replaced by the default scene: {}", cli.scene, failure);
        }

        let mined = ctx.mine(&mut settings);
        if !mined.tooltip.is_empty() {
            info!("Scene parameters: {}", mined.tooltip);
        }

        let mut fb = new_framebuffer(&settings);
        match (&mined.algorithm, &mined.renderer) {
            (Some(algorithm), renderer) => {
                let renderer: Arc<dyn Renderer> =
                    renderer.clone().unwrap_or_else(|| Arc::new(SimpleRenderer));
                info!(
                    "Rendering with '{}' / '{}' ({}x{}, supersampling {})",
                    algorithm.name(),
                    renderer.name(),
                    settings.width,
                    settings.height,
                    fb.sample_count
                );
                renderer.render(&mut fb, &**algorithm, mined.scene);
            }
            (None, _) => {
                let background = mined
                    .scene
                    .background
                    .unwrap_or_else(|| Vector3::from(config.render.background));
                fb.clear(background);
                draw_wireframe(&mut fb, &mined.scene.tessellate(), config);
            }
        }

        save(&fb, &frame_path(&config.render.output, frame, frames))?;
    }

    info!(
        "Done: {} frame(s) of '{}' in {:.2?} ({} builder run(s))",
        frames,
        cli.scene,
        start_time.elapsed(),
        resolver.runs()
    );
    Ok(())
}

fn list_scenes(repo: &SceneRepository, resolver: &mut SceneResolver, config: &Config) {
    for name in repo.names() {
        let tooltip = match repo.get(name) {
            Some(descriptor) if matches!(descriptor, SceneDescriptor::External(_)) => {
                let mut ctx = RenderContext::new();
                ctx.init(Some(SceneGraph::new()), &config.render_settings());
                resolver.resolve(&mut ctx, name, descriptor, "", &library::default_scene);
                ctx.tooltip.unwrap_or_default()
            }
            _ => repo.tooltip(name).unwrap_or_default().to_string(),
        };

        if tooltip.is_empty() {
            println!("{}", name);
        } else {
            println!("{}\t{}", name, tooltip);
        }
    }
}

fn new_framebuffer(settings: &RenderSettings) -> FrameBuffer {
    FrameBuffer::new(
        settings.width as usize,
        settings.height as usize,
        settings.supersampling.max(1) as usize,
    )
}

fn draw_wireframe(fb: &mut FrameBuffer, mesh: &Mesh, config: &Config) {
    if mesh.is_empty() {
        warn!("Nothing to draw: the mesh is empty");
        return;
    }
    Wireframe::new(config.view).render(fb, mesh);
}

fn save(fb: &FrameBuffer, path: &str) -> Result<(), String> {
    if save_framebuffer(fb, path) {
        Ok(())
    } else {
        Err(format!("Could not write '{}'", path))
    }
}

/// `out.png` for a single frame, `out_0003.png` for frame 3 of many.
fn frame_path(output: &str, frame: u32, frames: u32) -> String {
    if frames <= 1 {
        return output.to_string();
    }
    match output.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{:04}.{}", stem, frame, ext),
        _ => format!("{}_{:04}", output, frame),
    }
}
