//! Image padding for tasks with `resize_images` set.
//!
//! Forum gallery thumbnails crop tightly, so each image is centered on a
//! transparent canvas larger than the original before upload.

use archivist_types::attachment::Attachment;
use async_trait::async_trait;
use bytes::Bytes;
use image::{imageops, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::{debug, warn};

/// Transforms task attachments before upload.
#[async_trait]
pub trait ImageResizer: Send + Sync {
    /// Return the attachments to upload, in the same order.
    async fn resize(&self, files: Vec<Attachment>) -> Vec<Attachment>;
}

/// Pads every image onto a transparent canvas `scale` times its size.
#[derive(Debug, Clone, Copy)]
pub struct PaddingResizer {
    scale: f32,
}

impl Default for PaddingResizer {
    fn default() -> Self {
        Self { scale: 1.5 }
    }
}

impl PaddingResizer {
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.max(1.0),
        }
    }
}

/// Decode `data`, center it on a padded canvas and encode the result as PNG.
pub fn pad_image(data: &[u8], scale: f32) -> Result<Vec<u8>, image::ImageError> {
    let source = image::load_from_memory(data)?.to_rgba8();
    let (width, height) = source.dimensions();
    let canvas_w = ((width as f32) * scale).round().max(width as f32) as u32;
    let canvas_h = ((height as f32) * scale).round().max(height as f32) as u32;

    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    let x = i64::from((canvas_w - width) / 2);
    let y = i64::from((canvas_h - height) / 2);
    imageops::overlay(&mut canvas, &source, x, y);

    let mut out = Cursor::new(Vec::new());
    canvas.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[async_trait]
impl ImageResizer for PaddingResizer {
    async fn resize(&self, files: Vec<Attachment>) -> Vec<Attachment> {
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            if !file.is_image() {
                out.push(file);
                continue;
            }
            let data = file.data.clone();
            let scale = self.scale;
            let padded = tokio::task::spawn_blocking(move || pad_image(&data, scale)).await;
            match padded {
                Ok(Ok(png)) => {
                    debug!(file = %file.name, bytes = png.len(), "Padded image");
                    out.push(Attachment {
                        name: file.name,
                        content_type: "image/png".to_string(),
                        data: Bytes::from(png),
                    });
                }
                Ok(Err(e)) => {
                    warn!(file = %file.name, error = %e, "Failed to pad image, uploading original");
                    out.push(file);
                }
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Image padding task failed, uploading original");
                    out.push(file);
                }
            }
        }
        out
    }
}
