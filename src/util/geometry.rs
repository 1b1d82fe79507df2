// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the rectangle type shared by labels and trackers,
//! and the transformation between the video's native pixel grid and the
//! (usually downscaled) grid the frame is displayed at.

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rectangle from its center point and size.
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when the rectangle covers no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Scale every component independently per axis.
    pub fn scale(&self, sx: f64, sy: f64) -> Rect {
        Rect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// Mapping between native video coordinates and display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTransform {
    pub native_width: u32,
    pub native_height: u32,
    pub display_width: u32,
    pub display_height: u32,
}

impl DisplayTransform {
    /// Fit the native frame into a square of `display_size` pixels, keeping
    /// the aspect ratio. The longer side becomes exactly `display_size`.
    pub fn fit(native_width: u32, native_height: u32, display_size: u32) -> Self {
        let (wr, hr) = (native_width.max(1) as u64, native_height.max(1) as u64);
        let size = display_size.max(1) as u64;
        let display_width = if wr > hr { size } else { size * wr / hr };
        let display_height = if hr > wr { size } else { size * hr / wr };
        Self {
            native_width: native_width.max(1),
            native_height: native_height.max(1),
            display_width: display_width.max(1) as u32,
            display_height: display_height.max(1) as u32,
        }
    }

    /// Scale factors from display to native, per axis.
    fn native_per_display(&self) -> (f64, f64) {
        (
            self.native_width as f64 / self.display_width as f64,
            self.native_height as f64 / self.display_height as f64,
        )
    }

    /// Convert a display-space rectangle into native coordinates.
    pub fn to_native(&self, rect: &Rect) -> Rect {
        let (sx, sy) = self.native_per_display();
        rect.scale(sx, sy)
    }

    /// Convert a native-space rectangle into display coordinates.
    pub fn to_display(&self, rect: &Rect) -> Rect {
        let (sx, sy) = self.native_per_display();
        rect.scale(1.0 / sx, 1.0 / sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_landscape() {
        let t = DisplayTransform::fit(1920, 1080, 960);
        assert_eq!(t.display_width, 960);
        assert_eq!(t.display_height, 540);
    }

    #[test]
    fn test_fit_portrait() {
        let t = DisplayTransform::fit(720, 1280, 960);
        assert_eq!(t.display_width, 540);
        assert_eq!(t.display_height, 960);
    }

    #[test]
    fn test_fit_square() {
        let t = DisplayTransform::fit(500, 500, 960);
        assert_eq!(t.display_width, 960);
        assert_eq!(t.display_height, 960);
    }

    #[test]
    fn test_native_display_roundtrip() {
        let t = DisplayTransform::fit(1280, 720, 960);
        let native = Rect::from_center(333.3, 201.7, 57.5, 91.25);

        let display = t.to_display(&native);
        let back = t.to_native(&display);

        assert!((back.x - native.x).abs() < 0.0001);
        assert!((back.y - native.y).abs() < 0.0001);
        assert!((back.width - native.width).abs() < 0.0001);
        assert!((back.height - native.height).abs() < 0.0001);
    }

    #[test]
    fn test_to_native_scales_per_axis() {
        let t = DisplayTransform::fit(1920, 1080, 960);
        let native = t.to_native(&Rect::new(10.0, 10.0, 100.0, 50.0));

        assert!((native.x - 20.0).abs() < 0.0001);
        assert!((native.y - 20.0).abs() < 0.0001);
        assert!((native.width - 200.0).abs() < 0.0001);
        assert!((native.height - 100.0).abs() < 0.0001);
    }

    #[test]
    fn test_center_roundtrip() {
        let rect = Rect::from_center(50.0, 60.0, 10.0, 20.0);
        assert_eq!(rect.x, 45.0);
        assert_eq!(rect.y, 50.0);
        assert_eq!(rect.center(), (50.0, 60.0));
        assert!(rect.contains(50.0, 60.0));
        assert!(!rect.contains(44.0, 60.0));
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(5.0, 5.0, 0.0, 10.0).is_degenerate());
        assert!(Rect::new(5.0, 5.0, 10.0, -1.0).is_degenerate());
        assert!(!Rect::new(5.0, 5.0, 1.0, 1.0).is_degenerate());
    }
}
