// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Carrying labels forward from one sampled frame to the next.
//!
//! Every label of the source frame is tracked through each intermediate
//! frame in turn rather than matched across the whole gap at once. A label
//! whose tracker loses the object on any frame is dropped; a label whose id
//! is already present on the destination frame is left alone, so boxes the
//! annotator placed by hand always win over tracked ones.

use super::TrackerFactory;
use crate::models::label::{Label, LabelId};
use image::RgbImage;

/// Outcome of one propagation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Propagation {
    /// New labels for the destination frame, in source order.
    pub survived: Vec<Label>,
    /// Ids whose tracker lost the object before the destination frame.
    pub lost: Vec<LabelId>,
    /// Ids skipped because the destination frame already has them.
    pub duplicates: Vec<LabelId>,
}

#[cfg(test)]
impl Propagation {
    pub fn is_empty(&self) -> bool {
        self.survived.is_empty() && self.lost.is_empty() && self.duplicates.is_empty()
    }
}

/// Track `source` labels across `frames`.
///
/// `frames[0]` is the source frame and the last element is the destination
/// frame; everything in between is the gap, in playback order.
/// `destination` is the destination frame's current label list.
pub fn propagate(
    source: &[Label],
    frames: &[RgbImage],
    destination: &[Label],
    factory: &dyn TrackerFactory,
) -> Propagation {
    let mut result = Propagation::default();
    let Some((first, rest)) = frames.split_first() else {
        return result;
    };
    if source.is_empty() || rest.is_empty() {
        return result;
    }

    for label in source {
        let taken = destination
            .iter()
            .chain(result.survived.iter())
            .any(|other| other.id == label.id);
        if taken {
            result.duplicates.push(label.id);
            continue;
        }

        let mut tracker = factory.create();
        tracker.init(first, label.rect());

        let mut region = None;
        for (offset, frame) in rest.iter().enumerate() {
            region = tracker.update(frame);
            if region.is_none() {
                log::debug!("Lost {} after {} frame(s)", label.tag(), offset + 1);
                break;
            }
        }

        match region {
            Some(rect) => result
                .survived
                .push(Label::from_rect(label.name.clone(), label.id, rect)),
            None => result.lost.push(label.id),
        }
    }

    result
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTracker;
    use super::*;
    use crate::tracking::ShortHorizonTracker;
    use crate::util::geometry::Rect;
    use image::Rgb;
    use std::cell::RefCell;

    fn frames(first: usize, last: usize) -> Vec<RgbImage> {
        (first..=last)
            .map(|i| RgbImage::from_pixel(2, 2, Rgb([i as u8, i as u8, i as u8])))
            .collect()
    }

    fn label(name: &str, id: LabelId, x: f64) -> Label {
        Label::from_rect(name, id, Rect::new(x, 10.0, 20.0, 10.0))
    }

    #[test]
    fn test_perfect_tracker_carries_every_label() {
        let source = vec![label("car", 1, 0.0), label("bus", 2, 50.0)];
        let factory = || ScriptedTracker::new(2.0, []);

        let result = propagate(&source, &frames(10, 15), &[], &factory);

        assert_eq!(result.survived.len(), 2);
        assert!(result.lost.is_empty());
        assert_eq!(result.survived[0].name, "car");
        assert_eq!(result.survived[0].id, 1);
        // five updates of 2 px each
        assert_eq!(result.survived[0].rect(), Rect::new(10.0, 10.0, 20.0, 10.0));
        assert_eq!(result.survived[1].id, 2);
    }

    #[test]
    fn test_existing_id_on_destination_wins() {
        let source = vec![label("car", 1, 0.0), label("bus", 2, 50.0)];
        let destination = vec![label("car", 1, 99.0)];
        let factory = || ScriptedTracker::new(1.0, []);

        let result = propagate(&source, &frames(0, 3), &destination, &factory);

        let ids: Vec<_> = result.survived.iter().map(|l| l.id).collect();
        assert_eq!(ids, [2]);
        assert_eq!(result.duplicates, [1]);
    }

    #[test]
    fn test_duplicate_ids_in_source_insert_once() {
        let source = vec![label("car", 1, 0.0), label("car", 1, 30.0)];
        let factory = || ScriptedTracker::new(1.0, []);

        let result = propagate(&source, &frames(0, 1), &[], &factory);

        assert_eq!(result.survived.len(), 1);
        assert_eq!(result.survived[0].x, 11.0);
        assert_eq!(result.duplicates, [1]);
    }

    #[test]
    fn test_loss_on_intermediate_frame_drops_only_that_label() {
        let source = vec![label("car", 1, 0.0), label("bus", 2, 50.0)];
        let created = RefCell::new(0);
        let factory = || {
            *created.borrow_mut() += 1;
            // first tracker fails on frame 12, second never fails
            if *created.borrow() == 1 {
                ScriptedTracker::new(1.0, [12])
            } else {
                ScriptedTracker::new(1.0, [])
            }
        };

        let result = propagate(&source, &frames(10, 15), &[], &factory);

        assert_eq!(result.lost, [1]);
        assert_eq!(result.survived.len(), 1);
        assert_eq!(result.survived[0].id, 2);
    }

    #[test]
    fn test_loss_on_destination_frame() {
        let source = vec![label("car", 1, 0.0)];
        let factory = || ScriptedTracker::new(1.0, [5]);

        let result = propagate(&source, &frames(0, 5), &[], &factory);

        assert!(result.survived.is_empty());
        assert_eq!(result.lost, [1]);
    }

    #[test]
    fn test_stops_updating_after_loss() {
        struct Counting<'a> {
            updates: &'a RefCell<usize>,
        }
        impl ShortHorizonTracker for Counting<'_> {
            fn init(&mut self, _frame: &RgbImage, _region: Rect) {}
            fn update(&mut self, _frame: &RgbImage) -> Option<Rect> {
                *self.updates.borrow_mut() += 1;
                None
            }
        }

        // The factory must produce 'static trackers, so count through a leak.
        let updates: &'static RefCell<usize> = Box::leak(Box::new(RefCell::new(0)));
        let factory = move || Counting { updates };

        let result = propagate(&[label("car", 1, 0.0)], &frames(0, 9), &[], &factory);

        assert_eq!(result.lost, [1]);
        assert_eq!(*updates.borrow(), 1);
    }

    #[test]
    fn test_nothing_to_do() {
        let factory = || ScriptedTracker::new(1.0, []);

        assert!(propagate(&[], &frames(0, 3), &[], &factory).is_empty());
        assert!(propagate(&[label("car", 1, 0.0)], &frames(0, 0), &[], &factory).is_empty());
        assert!(propagate(&[label("car", 1, 0.0)], &[], &[], &factory).is_empty());
    }
}
