// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (image sequences and videos).
//!
//! This module handles opening the media being labeled and decoding single
//! frames from it by index. Frames are always handed out as RGB8 images in
//! the media's native resolution.

use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Random access to the decoded frames of one video.
pub trait FrameSource {
    /// Decode the frame at `index`.
    fn frame(&mut self, index: usize) -> Result<RgbImage>;

    fn frame_count(&self) -> usize;

    /// Native (width, height) of every frame.
    fn native_size(&self) -> (u32, u32);
}

/// Open a directory of still frames or, with the `video-opencv` feature, a
/// video file.
pub fn open_frame_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.exists() {
        bail!("No such file: {}", path.display());
    }

    if path.is_dir() {
        return Ok(Box::new(ImageSequence::open(path)?));
    }
    open_video(path)
}

#[cfg(feature = "video-opencv")]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(video::VideoFile::open(path)?))
}

#[cfg(not(feature = "video-opencv"))]
fn open_video(path: &Path) -> Result<Box<dyn FrameSource>> {
    bail!(
        "{} is a video file, but video decoding is disabled; rebuild with \
         `--features video-opencv` or pass a directory of frames",
        path.display()
    )
}

/// Frames stored as individual image files in one directory.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequence {
    /// Collect the image files of `dir` in natural file-name order.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        alphanumeric_sort::sort_path_slice(&mut paths);

        let Some(first) = paths.first() else {
            bail!("No image frames found in {}", dir.display());
        };
        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read frame {}", first.display()))?;

        log::info!(
            "Opened {} frames from {} ({}x{})",
            paths.len(),
            dir.display(),
            width,
            height
        );
        Ok(Self { paths, width, height })
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequence {
    fn frame(&mut self, index: usize) -> Result<RgbImage> {
        let path = self
            .paths
            .get(index)
            .with_context(|| format!("Frame {} out of range (0..{})", index, self.paths.len()))?;
        let img = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        if img.dimensions() != (self.width, self.height) {
            log::debug!(
                "Resizing {} from {:?} to {}x{}",
                path.display(),
                img.dimensions(),
                self.width,
                self.height
            );
            return Ok(image::imageops::resize(
                &img,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            ));
        }
        Ok(img)
    }

    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(feature = "video-opencv")]
mod video {
    use super::FrameSource;
    use anyhow::{bail, Context, Result};
    use image::RgbImage;
    use opencv::{core::Mat, imgproc, prelude::*, videoio};
    use std::path::Path;

    /// Frames decoded from a video container through OpenCV.
    pub struct VideoFile {
        capture: videoio::VideoCapture,
        frame_count: usize,
        width: u32,
        height: u32,
    }

    impl VideoFile {
        pub fn open(path: &Path) -> Result<Self> {
            let name = path.to_string_lossy();
            let capture = videoio::VideoCapture::from_file(&name, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open video {}", path.display()))?;
            if !capture.is_opened()? {
                bail!("Failed to open video {}", path.display());
            }

            let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;
            let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?.max(0.0) as u32;
            let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?.max(0.0) as u32;
            if frame_count == 0 || width == 0 || height == 0 {
                bail!("Video {} reports no decodable frames", path.display());
            }

            log::info!("Image size = [{}x{}], {} frames", width, height, frame_count);
            Ok(Self {
                capture,
                frame_count,
                width,
                height,
            })
        }
    }

    impl FrameSource for VideoFile {
        fn frame(&mut self, index: usize) -> Result<RgbImage> {
            if index >= self.frame_count {
                bail!("Frame {} out of range (0..{})", index, self.frame_count);
            }

            self.capture.set(videoio::CAP_PROP_POS_FRAMES, index as f64)?;
            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr)? || bgr.empty() {
                bail!("Failed to decode frame {}", index);
            }

            let mut rgb = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
            let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
            let bytes = rgb.data_bytes()?.to_vec();
            RgbImage::from_raw(width, height, bytes)
                .with_context(|| format!("Frame {} has an unexpected pixel layout", index))
        }

        fn frame_count(&self) -> usize {
            self.frame_count
        }

        fn native_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }
    }
}
