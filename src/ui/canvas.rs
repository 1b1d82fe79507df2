// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for frame display and box annotation.
//!
//! This module shows the current frame at display resolution with the
//! frame's labels drawn on top, and reports clicks and dragged regions in
//! display coordinates relative to the frame's top-left corner.

use crate::session::{AnnotationSession, InputState};
use crate::util::geometry::Rect;

const MANUAL_COLOR: egui::Color32 = egui::Color32::from_rgb(64, 255, 64);
const TRACKED_COLOR: egui::Color32 = egui::Color32::from_rgb(64, 64, 255);
const SELECTED_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 64, 64);
const DRAWING_COLOR: egui::Color32 = egui::Color32::LIGHT_BLUE;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// Click at a display-space point.
    Click(f64, f64),
    /// A region finished dragging, display space.
    Region(Rect),
}

/// Display the frame and its labels and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    texture: &Option<egui::TextureHandle>,
    session: &AnnotationSession,
    drag_start: &mut Option<egui::Pos2>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(0);

    let transform = session.transform();
    let size = egui::vec2(transform.display_width as f32, transform.display_height as f32);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
    let image_rect = response.rect;

    match texture {
        Some(texture) => {
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(image_rect, 0.0, egui::Color32::from_gray(20));
        }
    }

    for (i, label) in session.labels().iter().enumerate() {
        let color = if session.selected() == Some(i) {
            SELECTED_COLOR
        } else if session.is_provisional(i) {
            TRACKED_COLOR
        } else {
            MANUAL_COLOR
        };
        let display = transform.to_display(&label.rect());
        draw_box(&painter, to_screen(&display, image_rect.min), &label.tag(), color);
    }

    if *session.state() == InputState::DrawingRegion {
        if response.drag_started() {
            // The pointer is already past the drag threshold here.
            *drag_start = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
        }

        if let (Some(start), Some(current)) = (*drag_start, response.interact_pointer_pos()) {
            let rect = egui::Rect::from_two_pos(image_rect.clamp(start), image_rect.clamp(current));
            painter.rect_stroke(rect, 0.0, egui::Stroke::new(2.0, DRAWING_COLOR));
        }

        if response.drag_stopped() {
            let end = response
                .interact_pointer_pos()
                .or_else(|| ui.input(|i| i.pointer.latest_pos()));
            if let (Some(start), Some(end)) = (drag_start.take(), end) {
                action = CanvasAction::Region(drag_region(image_rect, start, end));
            }
        }
    } else {
        *drag_start = None;
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if image_rect.contains(pos) {
                    let (x, y) = relative(image_rect, pos);
                    action = CanvasAction::Click(x, y);
                }
            }
        }
    }

    painter.rect_stroke(image_rect, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));

    action
}

/// Screen position to frame-relative display coordinates, clamped to the frame.
fn relative(image_rect: egui::Rect, pos: egui::Pos2) -> (f64, f64) {
    let clamped = image_rect.clamp(pos);
    ((clamped.x - image_rect.min.x) as f64, (clamped.y - image_rect.min.y) as f64)
}

/// The display-space region spanned by a drag from `start` to `end`.
fn drag_region(image_rect: egui::Rect, start: egui::Pos2, end: egui::Pos2) -> Rect {
    let (x0, y0) = relative(image_rect, start);
    let (x1, y1) = relative(image_rect, end);
    Rect::new(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs())
}

fn to_screen(rect: &Rect, origin: egui::Pos2) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.width as f32, rect.height as f32),
    )
}

/// Draw a box with its `name:id` tag above the top-left corner.
fn draw_box(painter: &egui::Painter, rect: egui::Rect, tag: &str, color: egui::Color32) {
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(2.0, color));

    let font = egui::FontId::proportional(12.0);
    let text_size = painter
        .layout_no_wrap(tag.to_string(), font.clone(), egui::Color32::BLACK)
        .size();
    let tag_rect = egui::Rect::from_min_size(
        rect.min - egui::vec2(0.0, text_size.y + 3.0),
        egui::vec2(text_size.x + 4.0, text_size.y + 3.0),
    );
    painter.rect_filled(tag_rect, 0.0, color);
    painter.text(
        tag_rect.left_bottom() + egui::vec2(2.0, -1.0),
        egui::Align2::LEFT_BOTTOM,
        tag,
        font,
        egui::Color32::BLACK,
    );
}
