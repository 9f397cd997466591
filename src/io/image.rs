use crate::core::color::{linear_to_srgb, to_rgb8};
use crate::core::framebuffer::FrameBuffer;
use image::{ImageBuffer, Rgb, RgbImage};
use log::{error, info};
use std::path::Path;

/// Resolves the supersamples of `fb` into an 8-bit sRGB image.
pub fn framebuffer_to_image(fb: &FrameBuffer) -> RgbImage {
    ImageBuffer::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let color = fb.get_pixel(x as usize, y as usize).unwrap_or_default();
        Rgb(to_rgb8(linear_to_srgb(color)))
    })
}

/// Saves the framebuffer as PNG (format chosen by extension). Failures are logged.
pub fn save_framebuffer(fb: &FrameBuffer, path: &str) -> bool {
    match framebuffer_to_image(fb).save(Path::new(path)) {
        Ok(()) => {
            info!("Image saved to '{}'", path);
            true
        }
        Err(e) => {
            error!("Failed to save image to '{}': {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn converts_to_srgb_bytes() {
        let mut fb = FrameBuffer::new(2, 1, 1);
        fb.set_pixel(0, 0, Vector3::new(1.0, 0.0, 0.0));
        fb.set_pixel(1, 0, Vector3::new(0.0, 0.0, 2.0));

        let img = framebuffer_to_image(&fb);
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255]);
    }
}
