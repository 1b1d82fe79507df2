// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bounding-box label data structures.
//!
//! A label is one annotated object on one frame. Geometry is always stored
//! in the native pixel grid of the video, as a box center plus size.

use crate::util::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Object identity shared by the labels of one physical object across frames.
pub type LabelId = i64;

/// One annotated object instance on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Label {
    /// Free-text category.
    pub name: String,
    pub id: LabelId,
    /// Box center, native coordinates.
    pub x: f64,
    pub y: f64,
    /// Box size, native coordinates.
    pub w: f64,
    pub h: f64,
}

impl Label {
    /// Create a label from a corner-anchored rectangle.
    pub fn from_rect(name: impl Into<String>, id: LabelId, rect: Rect) -> Self {
        let (x, y) = rect.center();
        Self {
            name: name.into(),
            id,
            x,
            y,
            w: rect.width,
            h: rect.height,
        }
    }

    /// The label's box as a corner-anchored rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.x, self.y, self.w, self.h)
    }

    /// True when every geometry field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite())
    }

    /// Text shown next to the box.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_roundtrip() {
        let label = Label {
            name: "car".to_string(),
            id: 4,
            x: 100.0,
            y: 50.0,
            w: 40.0,
            h: 20.0,
        };

        let rect = label.rect();
        assert_eq!(rect.x, 80.0);
        assert_eq!(rect.y, 40.0);

        let back = Label::from_rect("car", 4, rect);
        assert_eq!(back, label);
    }

    #[test]
    fn test_tag() {
        let label = Label::from_rect("person", 12, Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(label.tag(), "person:12");
    }
}
