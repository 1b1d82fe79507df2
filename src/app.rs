// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module is the display and input surface of the labeler. Each frame
//! it turns keyboard and pointer input into session events, feeds them to
//! the annotation session one at a time, and redraws the canvas and the
//! side panel from the session's state.

use crate::navigator::{Direction, Step};
use crate::session::{AnnotationSession, Event, InputState, Outcome};
use crate::models::store::Removal;
use crate::ui::{canvas, panel};
use std::cell::RefCell;
use std::rc::Rc;

/// Main application state.
pub struct LabelerApp {
    /// Shared with `main`, which saves the annotations once the window closes
    session: Rc<RefCell<AnnotationSession>>,

    /// Texture of the frame currently shown
    texture: Option<egui::TextureHandle>,

    /// Frame index the texture was made from
    texture_frame: Option<usize>,

    /// Decode error of the current frame, if any
    frame_error: Option<String>,

    /// Display-space start of the region being dragged
    drag_start: Option<egui::Pos2>,

    /// Last advisory message for the side panel
    status: Option<String>,
}

impl LabelerApp {
    pub fn new(session: Rc<RefCell<AnnotationSession>>) -> Self {
        Self {
            session,
            texture: None,
            texture_frame: None,
            frame_error: None,
            drag_start: None,
            status: None,
        }
    }

    /// Upload the current frame as a texture when the frame changed.
    fn refresh_texture(&mut self, ctx: &egui::Context, session: &mut AnnotationSession) {
        let frame = session.current_frame();
        if self.texture_frame == Some(frame) {
            return;
        }
        self.texture_frame = Some(frame);

        match session.current_image() {
            Ok(img) => {
                let size = [img.width() as usize, img.height() as usize];
                let color_image = egui::ColorImage::from_rgb(size, img.as_raw());
                self.texture = Some(ctx.load_texture(
                    format!("frame_{}", frame),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
                self.frame_error = None;
            }
            Err(e) => {
                log::error!("Failed to load frame {}: {:#}", frame, e);
                self.texture = None;
                self.frame_error = Some(format!("{:#}", e));
            }
        }
    }

    /// Turn an outcome into a side-panel message.
    fn describe(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Navigated {
                step: Step::Boundary(Direction::Forward),
                ..
            } => self.status = Some("Already the final frame.".to_string()),
            Outcome::Navigated {
                step: Step::Boundary(Direction::Backward),
                ..
            } => self.status = Some("Already the first frame.".to_string()),
            Outcome::Navigated {
                propagation: Some(result),
                ..
            } => {
                self.status = Some(format!(
                    "Tracked {}, lost {}",
                    result.survived.len(),
                    result.lost.len()
                ))
            }
            Outcome::Navigated { .. } => self.status = None,
            Outcome::Removed(Removal::Stale) => {
                self.status = Some("Select a box before removing it.".to_string())
            }
            Outcome::Removed(Removal::Removed(label)) => {
                self.status = Some(format!("Removed {}", label.tag()))
            }
            Outcome::Cancelled => self.status = Some("Add cancelled.".to_string()),
            _ => {}
        }
    }
}

/// Map this frame's keyboard input to session events.
fn keyboard_events(ctx: &egui::Context, state: &InputState) -> Vec<Event> {
    let typing = matches!(
        state,
        InputState::EnteringName { .. } | InputState::EnteringId { .. }
    );

    ctx.input(|i| {
        let mut events = Vec::new();
        for event in &i.events {
            match event {
                egui::Event::Text(text) if typing => {
                    events.extend(text.chars().map(Event::Char));
                }
                egui::Event::Text(text) if *state == InputState::Browsing => {
                    events.extend(text.chars().filter_map(browsing_command));
                }
                egui::Event::Key {
                    key, pressed: true, ..
                } => match key {
                    egui::Key::Enter => events.push(Event::Confirm),
                    egui::Key::Backspace => events.push(Event::Backspace),
                    egui::Key::Escape if *state == InputState::DrawingRegion => {
                        events.push(Event::RegionCancelled)
                    }
                    egui::Key::Escape => events.push(Event::Cancel),
                    _ => {}
                },
                _ => {}
            }
        }
        events
    })
}

/// Single-key commands available while browsing.
fn browsing_command(c: char) -> Option<Event> {
    match c {
        'z' => Some(Event::Exit),
        'q' => Some(Event::Retreat),
        'e' => Some(Event::Advance),
        'a' => Some(Event::BeginAdd),
        'd' => Some(Event::RemoveSelected),
        _ => None,
    }
}

impl eframe::App for LabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let shared = Rc::clone(&self.session);
        let mut session = shared.borrow_mut();

        self.refresh_texture(ctx, &mut session);

        // Properties panel (right side)
        egui::SidePanel::right("panel")
            .default_width(300.0)
            .resizable(false)
            .show(ctx, |ui| {
                panel::show(
                    ui,
                    &session,
                    self.status.as_deref(),
                    self.frame_error.as_deref(),
                );
            });

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| canvas::show(ui, &self.texture, &session, &mut self.drag_start))
            .inner;

        let mut events = keyboard_events(ctx, session.state());
        match canvas_action {
            canvas::CanvasAction::Click(x, y) => events.push(Event::ClickAt { x, y }),
            canvas::CanvasAction::Region(rect) => events.push(Event::RegionCommitted(rect)),
            canvas::CanvasAction::None => {}
        }

        for event in events {
            log::debug!("Event {:?} in state {:?}", event, session.state());
            let outcome = session.handle(event);
            self.describe(&outcome);
            if outcome == Outcome::Exit {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                break;
            }
            if matches!(outcome, Outcome::Navigated { .. }) {
                // Remaining input was aimed at the frame we just left.
                break;
            }
        }

        if session.current_frame() != self.texture_frame.unwrap_or(usize::MAX) {
            ctx.request_repaint();
        }
    }
}
