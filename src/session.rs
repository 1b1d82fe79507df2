// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state machine.
//!
//! The session owns the label store, the frame cache and the navigator, and
//! turns discrete input events from the display surface into edits. Adding a
//! target is a short modal flow: draw a region, type a name, type an id.
//! Everything else happens while browsing.

use crate::config::LabelerConfig;
use crate::io::cache::FrameCache;
use crate::io::media::FrameSource;
use crate::models::label::{Label, LabelId};
use crate::models::store::{LabelStore, LoadStatus, Removal};
use crate::navigator::{Direction, Navigator, Step};
use crate::tracking::propagate::{propagate, Propagation};
use crate::tracking::TrackerFactory;
use crate::util::geometry::{DisplayTransform, Rect};
use anyhow::{bail, Result};
use image::RgbImage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Discrete input from the display surface. Geometry is in display
/// coordinates, relative to the top-left corner of the shown frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Exit,
    Retreat,
    Advance,
    BeginAdd,
    RemoveSelected,
    RegionCommitted(Rect),
    RegionCancelled,
    Char(char),
    Backspace,
    Confirm,
    Cancel,
    ClickAt { x: f64, y: f64 },
}

/// Where the session is in the add-target flow.
#[derive(Debug, Clone, PartialEq)]
pub enum InputState {
    Browsing,
    /// Waiting for the display surface to report a drawn region.
    DrawingRegion,
    EnteringName { region: Rect, name: String },
    EnteringId { region: Rect, name: String, id: LabelId },
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The event means nothing in the current state.
    Ignored,
    Exit,
    Navigated {
        step: Step,
        /// Present when a forward move ran a propagation pass.
        propagation: Option<Propagation>,
    },
    /// The add-target flow advanced or its buffer changed.
    Editing,
    Added { index: usize },
    Cancelled,
    Removed(Removal),
    Selected(Option<usize>),
}

pub struct AnnotationSession {
    store: LabelStore,
    cache: FrameCache,
    navigator: Navigator,
    tracker_factory: Box<dyn TrackerFactory>,
    transform: DisplayTransform,
    annotation_path: PathBuf,
    state: InputState,
    /// Index into the current frame's labels.
    selected: Option<usize>,
    /// Indices of current-frame labels placed by propagation on this visit.
    provisional: BTreeSet<usize>,
}

impl AnnotationSession {
    /// Start a session over `source`, loading `annotation_path` if it exists.
    pub fn open(
        source: Box<dyn FrameSource>,
        annotation_path: &Path,
        config: &LabelerConfig,
        tracker_factory: Box<dyn TrackerFactory>,
    ) -> Result<(Self, LoadStatus)> {
        config.validate()?;
        let total_frames = source.frame_count();
        if total_frames == 0 {
            bail!("The video has no frames");
        }
        let (native_width, native_height) = source.native_size();
        log::info!("Image size = [{}x{}]", native_width, native_height);

        let mut store = LabelStore::new(config.id_seed, config.id_policy);
        let status = store.load(annotation_path)?;
        store.visit(0);

        let session = Self {
            store,
            cache: FrameCache::new(source, config.cache_capacity),
            navigator: Navigator::new(config.jump_stride, total_frames),
            tracker_factory,
            transform: DisplayTransform::fit(native_width, native_height, config.display_size),
            annotation_path: annotation_path.to_path_buf(),
            state: InputState::Browsing,
            selected: None,
            provisional: BTreeSet::new(),
        };
        Ok((session, status))
    }

    /// Write all annotations to the session's annotation file.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.annotation_path)
    }

    pub fn handle(&mut self, event: Event) -> Outcome {
        let state = std::mem::replace(&mut self.state, InputState::Browsing);
        let (next, outcome) = match state {
            InputState::Browsing => self.handle_browsing(event),
            InputState::DrawingRegion => Self::handle_drawing(event),
            InputState::EnteringName { region, name } => self.handle_name(region, name, event),
            InputState::EnteringId { region, name, id } => self.handle_id(region, name, id, event),
        };
        self.state = next;
        outcome
    }

    fn handle_browsing(&mut self, event: Event) -> (InputState, Outcome) {
        let outcome = match event {
            Event::Exit => Outcome::Exit,
            Event::Retreat => self.navigate(Direction::Backward),
            Event::Advance => self.navigate(Direction::Forward),
            Event::BeginAdd => return (InputState::DrawingRegion, Outcome::Editing),
            Event::RemoveSelected => Outcome::Removed(self.remove_selected()),
            Event::ClickAt { x, y } => Outcome::Selected(self.select_at(x, y)),
            _ => Outcome::Ignored,
        };
        (InputState::Browsing, outcome)
    }

    fn handle_drawing(event: Event) -> (InputState, Outcome) {
        match event {
            Event::RegionCommitted(region) if region.is_degenerate() => {
                log::info!("Empty region, add cancelled");
                (InputState::Browsing, Outcome::Cancelled)
            }
            Event::RegionCommitted(region) => (
                InputState::EnteringName {
                    region,
                    name: String::new(),
                },
                Outcome::Editing,
            ),
            Event::RegionCancelled | Event::Cancel => (InputState::Browsing, Outcome::Cancelled),
            _ => (InputState::DrawingRegion, Outcome::Ignored),
        }
    }

    fn handle_name(&mut self, region: Rect, mut name: String, event: Event) -> (InputState, Outcome) {
        let outcome = match event {
            Event::Char(c) if c.is_ascii_alphabetic() => {
                name.push(c);
                Outcome::Editing
            }
            Event::Backspace => {
                name.pop();
                Outcome::Editing
            }
            Event::Confirm => {
                let id = self.store.next_id();
                return (InputState::EnteringId { region, name, id }, Outcome::Editing);
            }
            Event::Cancel => return (InputState::Browsing, Outcome::Cancelled),
            _ => Outcome::Ignored,
        };
        (InputState::EnteringName { region, name }, outcome)
    }

    fn handle_id(
        &mut self,
        region: Rect,
        name: String,
        mut id: LabelId,
        event: Event,
    ) -> (InputState, Outcome) {
        let outcome = match event {
            Event::Char(c) if c.is_ascii_digit() => {
                let digit = LabelId::from(c as u8 - b'0');
                id = id.saturating_mul(10).saturating_add(digit);
                Outcome::Editing
            }
            Event::Backspace => {
                id /= 10;
                Outcome::Editing
            }
            Event::Confirm => {
                let native = self.transform.to_native(&region);
                let label = Label::from_rect(name, id, native);
                log::info!("Added {} on frame {}", label.tag(), self.current_frame());
                let index = self.store.add(self.current_frame(), label);
                return (InputState::Browsing, Outcome::Added { index });
            }
            Event::Cancel => return (InputState::Browsing, Outcome::Cancelled),
            _ => Outcome::Ignored,
        };
        (InputState::EnteringId { region, name, id }, outcome)
    }

    fn navigate(&mut self, direction: Direction) -> Outcome {
        // Leaving the frame confirms whatever propagation placed on it.
        self.provisional.clear();
        self.selected = None;

        let step = match direction {
            Direction::Forward => self.navigator.advance(),
            Direction::Backward => self.navigator.retreat(),
        };

        let mut propagation = None;
        if let Step::Moved { from, to } = step {
            self.store.visit(to);
            if direction == Direction::Forward {
                propagation = self.propagate_into(from, to);
            }
        }
        Outcome::Navigated { step, propagation }
    }

    /// Track the labels of frame `from` onto frame `to` and insert the
    /// survivors. `None` when nothing was attempted.
    fn propagate_into(&mut self, from: usize, to: usize) -> Option<Propagation> {
        let source = self.store.labels_of(from).to_vec();
        if source.is_empty() {
            return None;
        }

        let frames = match self.cache.get_range(from, to) {
            Ok(frames) => frames,
            Err(e) => {
                log::warn!("Skipping propagation {} -> {}: {:#}", from, to, e);
                return None;
            }
        };

        let result = propagate(
            &source,
            &frames,
            self.store.labels_of(to),
            self.tracker_factory.as_ref(),
        );
        for label in &result.survived {
            let index = self.store.add(to, label.clone());
            self.provisional.insert(index);
        }

        log::info!(
            "Propagated frame {} -> {}: {} tracked, {} lost, {} already present",
            from,
            to,
            result.survived.len(),
            result.lost.len(),
            result.duplicates.len()
        );
        Some(result)
    }

    fn remove_selected(&mut self) -> Removal {
        let Some(index) = self.selected.take() else {
            return Removal::Stale;
        };

        let removal = self.store.remove(self.current_frame(), index);
        if let Removal::Removed(label) = &removal {
            log::info!("Removed {} from frame {}", label.tag(), self.current_frame());
            self.provisional = std::mem::take(&mut self.provisional)
                .into_iter()
                .filter(|&i| i != index)
                .map(|i| if i > index { i - 1 } else { i })
                .collect();
        }
        removal
    }

    /// Select the top-most label under a display-space point. A click on
    /// empty space keeps the current selection.
    fn select_at(&mut self, x: f64, y: f64) -> Option<usize> {
        let hit = self
            .labels()
            .iter()
            .rposition(|label| self.transform.to_display(&label.rect()).contains(x, y));
        if hit.is_some() {
            self.selected = hit;
        }
        self.selected
    }

    /// A copy of the current frame's image, native resolution.
    pub fn current_image(&mut self) -> Result<RgbImage> {
        let frame = self.current_frame();
        self.cache.get(frame)
    }

    pub fn current_frame(&self) -> usize {
        self.navigator.current_frame()
    }

    pub fn total_frames(&self) -> usize {
        self.navigator.total_frames()
    }

    /// Labels on the current frame.
    pub fn labels(&self) -> &[Label] {
        self.store.labels_of(self.current_frame())
    }

    /// True when the current-frame label at `index` was placed by
    /// propagation during this visit.
    pub fn is_provisional(&self, index: usize) -> bool {
        self.provisional.contains(&index)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn transform(&self) -> &DisplayTransform {
        &self.transform
    }

    pub fn annotation_path(&self) -> &Path {
        &self.annotation_path
    }
}

#[cfg(test)]
impl AnnotationSession {
    pub fn store(&self) -> &LabelStore {
        &self.store
    }
}
