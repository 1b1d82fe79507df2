// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Simple template matching tracker.
//!
//! The grey-scale patch under the initial box is kept as the template. Each
//! update searches a square window around the previous position for the
//! offset with the lowest mean absolute difference and reports a loss when
//! even the best offset differs by more than the configured threshold.

use super::ShortHorizonTracker;
use crate::config::TrackerConfig;
use crate::util::geometry::Rect;
use image::{GrayImage, RgbImage};

/// Upper bound on template samples per axis; larger boxes are subsampled.
const MAX_SAMPLES_PER_AXIS: u32 = 64;

pub struct TemplateTracker {
    config: TrackerConfig,
    template: Option<GrayImage>,
    /// Top-left corner of the last match.
    position: (u32, u32),
}

impl TemplateTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            template: None,
            position: (0, 0),
        }
    }

    /// Lowest mean absolute difference and its position inside the search
    /// window, or `None` if the template no longer fits the frame.
    fn find_best_match(&self, frame: &GrayImage, template: &GrayImage) -> Option<(f32, (u32, u32))> {
        let (tw, th) = template.dimensions();
        let (fw, fh) = frame.dimensions();
        if tw > fw || th > fh {
            return None;
        }

        let radius = self.config.search_radius;
        let (px, py) = self.position;
        let min_x = px.saturating_sub(radius);
        let max_x = px.saturating_add(radius).min(fw - tw);
        let min_y = py.saturating_sub(radius);
        let max_y = py.saturating_add(radius).min(fh - th);
        if min_x > max_x || min_y > max_y {
            return None;
        }

        let step = (tw.max(th) / MAX_SAMPLES_PER_AXIS).max(1);
        let mut best: Option<(f32, (u32, u32))> = None;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let bound = best.map(|(score, _)| score).unwrap_or(f32::INFINITY);
                if let Some(score) = mean_abs_diff(frame, template, x, y, step, bound) {
                    if score < bound {
                        best = Some((score, (x, y)));
                    }
                }
            }
        }
        best
    }
}

/// Mean absolute difference of the template placed at (x, y), sampling
/// every `step` pixels. Gives up with `None` once the mean is certain to
/// exceed `bound`.
fn mean_abs_diff(
    frame: &GrayImage,
    template: &GrayImage,
    x: u32,
    y: u32,
    step: u32,
    bound: f32,
) -> Option<f32> {
    let (tw, th) = template.dimensions();
    let samples = (tw.div_ceil(step) * th.div_ceil(step)) as f32;
    let budget = bound * samples;
    let mut sum = 0.0f32;

    for ty in (0..th).step_by(step as usize) {
        for tx in (0..tw).step_by(step as usize) {
            let f = frame.get_pixel(x + tx, y + ty)[0] as f32;
            let t = template.get_pixel(tx, ty)[0] as f32;
            sum += (f - t).abs();
        }
        if sum > budget {
            return None;
        }
    }

    Some(sum / samples)
}

impl ShortHorizonTracker for TemplateTracker {
    fn init(&mut self, frame: &RgbImage, region: Rect) {
        let gray = image::imageops::grayscale(frame);
        let (fw, fh) = gray.dimensions();

        let x0 = region.x.round().clamp(0.0, fw as f64) as u32;
        let y0 = region.y.round().clamp(0.0, fh as f64) as u32;
        let x1 = (region.x + region.width).round().clamp(0.0, fw as f64) as u32;
        let y1 = (region.y + region.height).round().clamp(0.0, fh as f64) as u32;

        if x1 <= x0 || y1 <= y0 {
            log::debug!("Tracker region {:?} lies outside the frame", region);
            self.template = None;
            return;
        }

        let template = image::imageops::crop_imm(&gray, x0, y0, x1 - x0, y1 - y0).to_image();
        self.template = Some(template);
        self.position = (x0, y0);
    }

    fn update(&mut self, frame: &RgbImage) -> Option<Rect> {
        let template = self.template.as_ref()?;
        let gray = image::imageops::grayscale(frame);

        let (score, position) = self.find_best_match(&gray, template)?;
        if score > self.config.max_mean_abs_diff {
            log::debug!(
                "Best match {:.1} exceeds threshold {:.1}",
                score,
                self.config.max_mean_abs_diff
            );
            return None;
        }

        self.position = position;
        let (tw, th) = template.dimensions();
        Some(Rect::new(
            position.0 as f64,
            position.1 as f64,
            tw as f64,
            th as f64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// A white 20x20 square moving 5 px right per frame on black.
    fn create_test_sequence() -> Vec<RgbImage> {
        (0..5)
            .map(|frame_idx| {
                let mut frame = RgbImage::new(100, 100);
                let square_x = 30 + frame_idx * 5;
                for y in 40..60 {
                    for x in square_x..square_x + 20 {
                        frame.put_pixel(x, y, Rgb([255, 255, 255]));
                    }
                }
                frame
            })
            .collect()
    }

    fn tracker() -> TemplateTracker {
        TemplateTracker::new(TrackerConfig {
            search_radius: 8,
            max_mean_abs_diff: 28.0,
        })
    }

    #[test]
    fn test_follows_moving_square() {
        let frames = create_test_sequence();
        let mut tracker = tracker();
        tracker.init(&frames[0], Rect::new(25.0, 35.0, 30.0, 30.0));

        for (i, frame) in frames.iter().enumerate().skip(1) {
            let rect = tracker.update(frame).unwrap();
            assert_eq!(rect, Rect::new(25.0 + 5.0 * i as f64, 35.0, 30.0, 30.0));
        }
    }

    #[test]
    fn test_reports_loss_when_object_vanishes() {
        let frames = create_test_sequence();
        let mut tracker = tracker();
        tracker.init(&frames[0], Rect::new(25.0, 35.0, 30.0, 30.0));

        assert!(tracker.update(&RgbImage::new(100, 100)).is_none());
    }

    #[test]
    fn test_reports_loss_beyond_search_radius() {
        let frames = create_test_sequence();
        let mut tracker = tracker();
        tracker.init(&frames[0], Rect::new(25.0, 35.0, 30.0, 30.0));

        // 20 px jump, radius is 8
        assert!(tracker.update(&frames[4]).is_none());
    }

    #[test]
    fn test_region_outside_frame_is_lost() {
        let frames = create_test_sequence();
        let mut tracker = tracker();
        tracker.init(&frames[0], Rect::new(150.0, 150.0, 10.0, 10.0));

        assert!(tracker.update(&frames[1]).is_none());
    }

    #[test]
    fn test_region_is_clipped_to_frame() {
        let frames = create_test_sequence();
        let mut tracker = tracker();
        tracker.init(&frames[0], Rect::new(-10.0, -10.0, 30.0, 30.0));

        let rect = tracker.update(&frames[0]).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 20.0, 20.0));
    }
}
