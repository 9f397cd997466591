use crate::core::framebuffer::FrameBuffer;
use crate::scene::graph::SceneGraph;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::fmt::Debug;
use std::sync::Arc;

/// Computes the color seen through one image-plane position.
pub trait ImageFunction: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// `x`, `y` are normalized image coordinates in [0, 1], Y pointing down.
    fn pixel(&self, scene: &SceneGraph, x: f32, y: f32) -> Vector3<f32>;
}

/// Drives an image function over a whole frame.
pub trait Renderer: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, target: &mut FrameBuffer, function: &dyn ImageFunction, scene: &SceneGraph);
}

/// Paints the scene background everywhere. Stand-in for a ray tracer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundFunction;

impl ImageFunction for BackgroundFunction {
    fn name(&self) -> &str {
        "background"
    }

    fn pixel(&self, scene: &SceneGraph, _x: f32, _y: f32) -> Vector3<f32> {
        scene.background.unwrap_or_else(Vector3::zeros)
    }
}

/// Evaluates one sample per framebuffer sample, rows in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRenderer;

impl Renderer for SimpleRenderer {
    fn name(&self) -> &str {
        "simple"
    }

    fn render(&self, target: &mut FrameBuffer, function: &dyn ImageFunction, scene: &SceneGraph) {
        let bw = target.buffer_width;
        let bh = target.buffer_height;
        if bw == 0 || bh == 0 {
            return;
        }

        target
            .samples_mut()
            .par_chunks_mut(bw)
            .enumerate()
            .for_each(|(y, row)| {
                let fy = (y as f32 + 0.5) / bh as f32;
                for (x, sample) in row.iter_mut().enumerate() {
                    let fx = (x as f32 + 0.5) / bw as f32;
                    *sample = function.pixel(scene, fx, fy);
                }
            });
    }
}

pub fn image_function_by_name(name: &str) -> Option<Arc<dyn ImageFunction>> {
    match name {
        "background" => Some(Arc::new(BackgroundFunction)),
        _ => None,
    }
}

pub fn renderer_by_name(name: &str) -> Option<Arc<dyn Renderer>> {
    match name {
        "simple" => Some(Arc::new(SimpleRenderer)),
        _ => None,
    }
}
