// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Side panel with key help, frame position and the active prompt.

use crate::session::{AnnotationSession, InputState};

const HELP: &[(&str, &str)] = &[
    ("z", "exit labeling"),
    ("q", "last frame"),
    ("e", "next frame"),
    ("a", "add new roi"),
    ("d", "remove selected roi"),
];

/// Prompt lines for the add-target flow, empty while browsing.
pub fn prompt(state: &InputState) -> Vec<String> {
    match state {
        InputState::Browsing => Vec::new(),
        InputState::DrawingRegion => vec![
            "Drag a ROI over the frame!".to_string(),
            "Press ESC to cancel!".to_string(),
        ],
        InputState::EnteringName { name, .. } => vec![
            format!("Input target name: {}", name),
            "Press ENTER to finish!".to_string(),
            "Press ESC to cancel!".to_string(),
        ],
        InputState::EnteringId { id, .. } => vec![
            format!("Input target id: {}", id),
            "Press ENTER to finish!".to_string(),
            "Press ESC to cancel!".to_string(),
        ],
    }
}

pub fn show(
    ui: &mut egui::Ui,
    session: &AnnotationSession,
    status: Option<&str>,
    frame_error: Option<&str>,
) {
    ui.heading("HELP:");
    for (key, action) in HELP {
        ui.label(format!("{}: {}", key, action));
    }

    ui.separator();
    ui.label(format!(
        "frame: [{}/{}]",
        session.current_frame(),
        session.total_frames()
    ));
    ui.label(
        egui::RichText::new(session.annotation_path().display().to_string())
            .small()
            .weak(),
    );

    for line in prompt(session.state()) {
        ui.label(egui::RichText::new(line).strong());
    }

    if let Some(status) = status {
        ui.label(egui::RichText::new(status).weak());
    }
    if let Some(error) = frame_error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }

    ui.separator();
    egui::ScrollArea::vertical().show(ui, |ui| {
        for (i, label) in session.labels().iter().enumerate() {
            let mut text = label.tag();
            if session.is_provisional(i) {
                text.push_str(" (tracked)");
            }
            let text = egui::RichText::new(text).monospace();
            if session.selected() == Some(i) {
                ui.label(text.color(egui::Color32::from_rgb(255, 64, 64)));
            } else {
                ui.label(text);
            }
        }
    });
}
