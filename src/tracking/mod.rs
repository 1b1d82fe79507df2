// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Short-horizon single-object tracking.
//!
//! A tracker is initialized on one frame with a box and then stepped one
//! frame at a time. It either reports the box on the new frame or reports
//! that the object was lost, after which it is not used again.

pub mod propagate;
pub mod template;

use crate::util::geometry::Rect;
use image::RgbImage;

/// Tracker interface
pub trait ShortHorizonTracker {
    /// Start tracking `region` (native coordinates) on `frame`.
    fn init(&mut self, frame: &RgbImage, region: Rect);

    /// Step to the next frame. `None` means the object was lost.
    fn update(&mut self, frame: &RgbImage) -> Option<Rect>;
}

/// Creates a fresh tracker for every label that gets propagated.
pub trait TrackerFactory {
    fn create(&self) -> Box<dyn ShortHorizonTracker>;
}

impl<F, T> TrackerFactory for F
where
    F: Fn() -> T,
    T: ShortHorizonTracker + 'static,
{
    fn create(&self) -> Box<dyn ShortHorizonTracker> {
        Box::new(self())
    }
}
