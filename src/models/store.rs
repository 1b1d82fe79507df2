// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame-indexed label storage.
//!
//! The store maps a frame index to the ordered list of labels on that
//! frame. Frames that were never visited have no entry; a visited frame
//! without objects has an empty list. The store also owns the counter that
//! hands out ids for new targets.

use super::label::{Label, LabelId};
use crate::config::IdPolicy;
use crate::io::serialization;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

/// Result of removing a label by its position in a frame's list.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    Removed(Label),
    /// The index did not point into the list; nothing changed.
    Stale,
}

/// Result of loading an annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded { frames: usize, labels: usize },
    /// No file at the path; the store was left empty.
    Missing,
}

#[derive(Debug)]
pub struct LabelStore {
    frames: BTreeMap<usize, Vec<Label>>,
    id_factory: AtomicI64,
    id_policy: IdPolicy,
}

impl Default for LabelStore {
    fn default() -> Self {
        Self::new(0, IdPolicy::default())
    }
}

impl LabelStore {
    /// Create an empty store whose first handed-out id is `seed`.
    pub fn new(seed: LabelId, id_policy: IdPolicy) -> Self {
        Self {
            frames: BTreeMap::new(),
            id_factory: AtomicI64::new(seed),
            id_policy,
        }
    }

    /// Labels on a frame, in insertion order. Unvisited frames are empty.
    pub fn labels_of(&self, frame: usize) -> &[Label] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record a frame as visited and return its list for in-place edits.
    pub fn visit(&mut self, frame: usize) -> &mut Vec<Label> {
        self.frames.entry(frame).or_default()
    }

    /// Append a label to a frame and return its index. Ids are not checked.
    pub fn add(&mut self, frame: usize, label: Label) -> usize {
        let labels = self.visit(frame);
        labels.push(label);
        labels.len() - 1
    }

    /// Remove the label at `index`; later labels shift down by one.
    pub fn remove(&mut self, frame: usize, index: usize) -> Removal {
        match self.frames.get_mut(&frame) {
            Some(labels) if index < labels.len() => Removal::Removed(labels.remove(index)),
            _ => Removal::Stale,
        }
    }

    /// Hand out the next target id.
    pub fn next_id(&self) -> LabelId {
        self.id_factory.fetch_add(1, Ordering::SeqCst)
    }

    pub fn label_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Write every visited frame to an annotation file.
    pub fn save(&self, path: &Path) -> Result<()> {
        serialization::write_annotations(&self.frames, path)?;
        log::info!(
            "Saved {} labels on {} frames to {}",
            self.label_count(),
            self.frames.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the store's contents with an annotation file.
    ///
    /// A missing file is not an error: the store is left untouched and
    /// [`LoadStatus::Missing`] is returned. A malformed file is an error
    /// and also leaves the store untouched.
    pub fn load(&mut self, path: &Path) -> Result<LoadStatus> {
        let Some(frames) = serialization::read_annotations(path)? else {
            log::warn!("No existing label data at {}", path.display());
            return Ok(LoadStatus::Missing);
        };

        self.frames = frames;
        if self.id_policy == IdPolicy::ResyncOnLoad {
            self.resync_ids();
        }

        let status = LoadStatus::Loaded {
            frames: self.frames.len(),
            labels: self.label_count(),
        };
        log::info!("Loaded existing label data from {}: {:?}", path.display(), status);
        Ok(status)
    }

    /// Raise the id counter above every id currently stored.
    fn resync_ids(&mut self) {
        let max_id = self.frames.values().flatten().map(|l| l.id).max();
        if let Some(max_id) = max_id {
            let next = max_id.saturating_add(1);
            let previous = self.id_factory.fetch_max(next, Ordering::SeqCst);
            if next > previous {
                log::debug!("Id counter raised from {} to {}", previous, next);
            }
        }
    }
}

#[cfg(test)]
impl LabelStore {
    pub fn is_visited(&self, frame: usize) -> bool {
        self.frames.contains_key(&frame)
    }

    /// The id the next call to [`LabelStore::next_id`] returns.
    pub fn peek_id(&self) -> LabelId {
        self.id_factory.load(Ordering::SeqCst)
    }

    /// Visited frames in ascending order.
    pub fn frames(&self) -> impl Iterator<Item = (usize, &[Label])> {
        self.frames.iter().map(|(&frame, labels)| (frame, labels.as_slice()))
    }
}
