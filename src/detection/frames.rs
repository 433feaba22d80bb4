//! Uniform stride sampling of video frames into classifier input

use std::path::Path;

use image::{imageops, RgbImage};

use crate::config::ChannelOrder;

/// A decoded video that can be read one frame at a time
pub trait VideoSource {
    /// Total frames reported by the container
    fn frame_count(&self) -> u64;

    /// Seek to `index` and decode one frame
    fn read_frame(&mut self, index: u64) -> Result<RgbImage, String>;
}

/// Opens uploaded files as `VideoSource`s
pub trait VideoDecoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, String>;
}

/// Normalized frame: `height x width x 3` floats in [0, 1], row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Frame {
    /// Resize (bilinear) and scale pixel values into [0, 1]
    pub fn from_image(img: &RgbImage, size: u32, order: ChannelOrder) -> Self {
        let resized = if img.dimensions() == (size, size) {
            img.clone()
        } else {
            imageops::resize(img, size, size, imageops::FilterType::Triangle)
        };

        let mut data = Vec::with_capacity((size * size * 3) as usize);
        for px in resized.pixels() {
            let [r, g, b] = px.0;
            let ordered = match order {
                ChannelOrder::Rgb => [r, g, b],
                ChannelOrder::Bgr => [b, g, r],
            };
            data.extend(ordered.iter().map(|&c| c as f32 / 255.0));
        }

        Frame {
            width: size,
            height: size,
            data,
        }
    }

    /// Pixel rows as nested `[row][col][channel]`, the layout the model expects
    pub fn to_nested(&self) -> Vec<Vec<[f32; 3]>> {
        self.data
            .chunks_exact(self.width as usize * 3)
            .map(|row| {
                row.chunks_exact(3)
                    .map(|px| [px[0], px[1], px[2]])
                    .collect()
            })
            .collect()
    }
}

/// Sampling parameters
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub target_count: usize,
    pub size: u32,
    pub channel_order: ChannelOrder,
}

/// Sample up to `target_count` frames evenly across the video
///
/// `stride = max(1, total / target_count)`; frames at `0, stride, 2*stride, ...`
/// are decoded until enough are collected or the stream runs out. Frames that
/// fail to decode are skipped, so the result may be shorter than requested.
pub fn extract_frames(source: &mut dyn VideoSource, opts: &ExtractOptions) -> Vec<Frame> {
    let total = source.frame_count();
    let target = opts.target_count.max(1) as u64;
    let stride = (total / target).max(1);

    let mut frames = Vec::with_capacity(opts.target_count);
    let mut index = 0;
    while index < total && frames.len() < opts.target_count {
        match source.read_frame(index) {
            Ok(img) => frames.push(Frame::from_image(&img, opts.size, opts.channel_order)),
            Err(e) => tracing::debug!("Skipping undecodable frame {}: {}", index, e),
        }
        index += stride;
    }

    tracing::debug!(
        "Sampled {}/{} frames (total={}, stride={})",
        frames.len(),
        opts.target_count,
        total,
        stride
    );
    frames
}
