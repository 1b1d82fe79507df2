// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation file serialization and deserialization.
//!
//! The annotation file is a YAML mapping from frame index to the labels on
//! that frame. Each frame's list is written on one line in flow style, with
//! every record encoded as compact JSON, which YAML reads as a flow mapping:
//!
//! ```yaml
//! 0: [{"name":"car","id":0,"x":412.5,"y":230.0,"w":81.0,"h":40.0}]
//! 5: []
//! ```
//!
//! Hand-edited files may use any YAML spelling of the same structure. Each
//! record must carry exactly `name`, `id`, `x`, `y`, `w` and `h`, and the
//! geometry must be finite since JSON has no spelling for NaN or infinity.

use crate::models::label::Label;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

pub type LabelsMap = BTreeMap<usize, Vec<Label>>;

/// Render the annotation mapping as YAML text.
pub fn to_yaml_string(frames: &LabelsMap) -> Result<String> {
    let mut out = String::new();
    for (frame, labels) in frames {
        check_finite(*frame, labels)?;
        let records = labels
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to encode labels of frame {}", frame))?;
        writeln!(out, "{}: [{}]", frame, records.join(", "))?;
    }
    Ok(out)
}

/// Parse annotation YAML text. Blank text is an empty mapping.
pub fn from_yaml_str(yaml: &str) -> Result<LabelsMap> {
    if yaml.trim().is_empty() {
        return Ok(LabelsMap::new());
    }
    let frames: LabelsMap = serde_yaml::from_str(yaml)?;
    for (frame, labels) in &frames {
        check_finite(*frame, labels)?;
    }
    Ok(frames)
}

fn check_finite(frame: usize, labels: &[Label]) -> Result<()> {
    if let Some((i, label)) = labels.iter().enumerate().find(|(_, l)| !l.is_finite()) {
        bail!("{}[{}] ({}): geometry must be finite", frame, i, label.tag());
    }
    Ok(())
}

/// Write annotations to a YAML file.
pub fn write_annotations(frames: &LabelsMap, path: &Path) -> Result<()> {
    let yaml = to_yaml_string(frames)?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write annotation file {}", path.display()))?;
    Ok(())
}

/// Read annotations from a YAML file; `None` when no file exists.
pub fn read_annotations(path: &Path) -> Result<Option<LabelsMap>> {
    if !path.exists() {
        return Ok(None);
    }
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotation file {}", path.display()))?;
    let frames = from_yaml_str(&yaml)
        .with_context(|| format!("Malformed annotation file {}", path.display()))?;
    Ok(Some(frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::geometry::Rect;

    fn sample() -> LabelsMap {
        let mut frames = LabelsMap::new();
        frames.insert(
            0,
            vec![
                Label::from_rect("car", 0, Rect::new(372.0, 210.0, 81.0, 40.0)),
                Label::from_rect("traffic \"light\"", 1, Rect::new(10.5, 0.25, 3.0, 9.0)),
            ],
        );
        frames.insert(5, Vec::new());
        frames
    }

    #[test]
    fn test_flow_style_layout() {
        let yaml = to_yaml_string(&sample()).unwrap();
        let lines: Vec<_> = yaml.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0: [{\"name\":\"car\",\"id\":0,"));
        assert_eq!(lines[1], "5: []");
        assert!(!yaml.contains("is_track"));
    }

    #[test]
    fn test_written_text_parses_back() {
        let frames = sample();
        let parsed = from_yaml_str(&to_yaml_string(&frames).unwrap()).unwrap();
        assert_eq!(parsed, frames);
    }

    #[test]
    fn test_accepts_hand_written_yaml() {
        let yaml = "\
3:
  - name: bike
    id: 2
    x: 10
    y: 20.5
    w: 4
    h: 8
7: [{name: bike, id: 2, x: 12.0, y: 21.0, w: 4.0, h: 8.0}]
";
        let frames = from_yaml_str(yaml).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[&3][0].name, "bike");
        assert_eq!(frames[&3][0].x, 10.0);
        assert_eq!(frames[&7][0].id, 2);
    }

    #[test]
    fn test_missing_field_is_error() {
        let yaml = "0: [{name: car, id: 1, x: 1.0, y: 2.0, w: 3.0}]";
        assert!(from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_extra_field_is_error() {
        let yaml = "0: [{name: car, id: 1, x: 1.0, y: 2.0, w: 3.0, h: 4.0, is_track: true}]";
        assert!(from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_wrong_type_is_error() {
        let yaml = "0: [{name: car, id: one, x: 1.0, y: 2.0, w: 3.0, h: 4.0}]";
        assert!(from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_non_finite_geometry_is_error() {
        let yaml = "0: [{name: car, id: 1, x: .nan, y: .inf, w: 3.0, h: 4.0}]";
        let err = from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("car:1"));

        let yaml = "2: [{name: car, id: 1, x: 1.0, y: 2.0, w: -.inf, h: 4.0}]";
        assert!(from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_non_finite_geometry_is_not_written() {
        let mut frames = sample();
        frames.insert(9, vec![Label::from_rect("car", 4, Rect::new(f64::NAN, 0.0, 1.0, 1.0))]);
        assert!(to_yaml_string(&frames).is_err());

        let path = std::env::temp_dir().join("tracklabel_non_finite_write.yaml");
        std::fs::write(&path, "0: []\n").unwrap();
        assert!(write_annotations(&frames, &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0: []\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_blank_file_is_empty() {
        assert!(from_yaml_str("").unwrap().is_empty());
        assert!(from_yaml_str("\n  \n").unwrap().is_empty());
    }
}
