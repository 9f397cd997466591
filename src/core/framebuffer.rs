use crate::core::canvas::{Canvas, clip_segment};
use nalgebra::{Point2, Vector3};

/// Represents a 2D color buffer with optional supersampling.
///
/// Drawing happens in the supersampled buffer space (`buffer_width` x
/// `buffer_height`); `get_pixel` resolves back to the output resolution.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,
    color_buffer: Vec<Vector3<f32>>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: vec![Vector3::zeros(); buffer_width * buffer_height],
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color_buffer.fill(color);
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Vector3<f32>) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.color_buffer[idx] = color;
        }
    }

    /// Raw supersampled rows, `buffer_width` samples each.
    pub fn samples_mut(&mut self) -> &mut [Vector3<f32>] {
        &mut self.color_buffer
    }

    /// Returns the output pixel at (x, y), averaging its supersamples.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }

        if self.sample_count == 1 {
            return Some(self.color_buffer[self.index(x, y)]);
        }

        let mut sum_color = Vector3::zeros();
        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;

        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum_color += self.color_buffer[self.index(start_x + dx, start_y + dy)];
            }
        }

        let samples = (self.sample_count * self.sample_count) as f32;
        Some(sum_color / samples)
    }
}

impl Canvas for FrameBuffer {
    fn width(&self) -> usize {
        self.buffer_width
    }

    fn height(&self) -> usize {
        self.buffer_height
    }

    /// DDA line, clipped to the buffer first so far-away endpoints stay cheap.
    fn draw_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Vector3<f32>) {
        let max_x = self.buffer_width as f32 - 1.0;
        let max_y = self.buffer_height as f32 - 1.0;
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let Some((a, b)) = clip_segment(from, to, max_x, max_y) else {
            return;
        };

        let d = b - a;
        let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as usize;
        let step = d / steps as f32;
        let mut p = a;
        for _ in 0..=steps {
            self.set_pixel(p.x.round() as usize, p.y.round() as usize, color);
            p += step;
        }
    }
}
