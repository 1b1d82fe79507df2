// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decoded frame cache.
//!
//! Seeking and decoding a video frame is slow, and a propagation pass
//! revisits the frames it tracked through as soon as the user comes back.
//! The cache keeps decoded frames by index and evicts the least recently
//! used one once it holds `capacity` frames.

use super::media::FrameSource;
use anyhow::Result;
use image::RgbImage;
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

pub struct FrameCache {
    source: Box<dyn FrameSource>,
    frames: HashMap<usize, RgbImage>,
    /// Cached indices, least recently used first.
    recency: VecDeque<usize>,
    /// `None` keeps every frame.
    capacity: Option<NonZeroUsize>,
}

impl FrameCache {
    /// Wrap a frame source. A capacity of 0 disables eviction.
    pub fn new(source: Box<dyn FrameSource>, capacity: usize) -> Self {
        Self {
            source,
            frames: HashMap::new(),
            recency: VecDeque::new(),
            capacity: NonZeroUsize::new(capacity),
        }
    }

    /// A copy of the frame at `index`, decoding it on first use.
    ///
    /// The returned image is the caller's to modify.
    pub fn get(&mut self, index: usize) -> Result<RgbImage> {
        if let Some(img) = self.frames.get(&index) {
            let img = img.clone();
            self.touch(index);
            return Ok(img);
        }

        let img = self.source.frame(index)?;
        self.insert(index, img.clone());
        Ok(img)
    }

    /// Copies of the frames `first..=last`, in order.
    ///
    /// The whole range is held in the returned Vec at once, so a call uses
    /// `last - first + 1` full frames of memory on top of the cache itself,
    /// whatever the cache capacity.
    pub fn get_range(&mut self, first: usize, last: usize) -> Result<Vec<RgbImage>> {
        (first..=last).map(|index| self.get(index)).collect()
    }

    fn touch(&mut self, index: usize) {
        if let Some(pos) = self.recency.iter().position(|&i| i == index) {
            self.recency.remove(pos);
        }
        self.recency.push_back(index);
    }

    fn insert(&mut self, index: usize, img: RgbImage) {
        self.frames.insert(index, img);
        self.touch(index);

        let Some(capacity) = self.capacity else {
            return;
        };
        while self.frames.len() > capacity.get() {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            self.frames.remove(&oldest);
            log::debug!("Evicted frame {} from cache", oldest);
        }
    }
}

#[cfg(test)]
impl FrameCache {
    /// Number of frames currently held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.frames.contains_key(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::SyntheticFrames;
    use image::Rgb;

    fn cache_with(capacity: usize) -> (FrameCache, std::rc::Rc<std::cell::RefCell<Vec<usize>>>) {
        let source = SyntheticFrames::new(100, 4, 4);
        let decoded = source.decoded.clone();
        (FrameCache::new(Box::new(source), capacity), decoded)
    }

    #[test]
    fn test_second_get_is_cached() {
        let (mut cache, decoded) = cache_with(8);
        let first = cache.get(3).unwrap();
        let second = cache.get(3).unwrap();

        assert_eq!(first, second);
        assert_eq!(*decoded.borrow(), vec![3]);
    }

    #[test]
    fn test_returned_copy_does_not_alias_cache() {
        let (mut cache, _) = cache_with(8);
        let mut img = cache.get(7).unwrap();
        img.put_pixel(0, 0, Rgb([255, 0, 0]));

        assert_eq!(cache.get(7).unwrap().get_pixel(0, 0), &Rgb([7, 7, 7]));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let (mut cache, decoded) = cache_with(2);
        cache.get(0).unwrap();
        cache.get(1).unwrap();
        cache.get(0).unwrap(); // 1 is now the oldest
        cache.get(2).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));

        cache.get(1).unwrap();
        assert_eq!(*decoded.borrow(), vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let (mut cache, _) = cache_with(0);
        for i in 0..50 {
            cache.get(i).unwrap();
        }
        assert_eq!(cache.len(), 50);
    }

    #[test]
    fn test_get_range_in_order() {
        let (mut cache, _) = cache_with(0);
        let frames = cache.get_range(4, 6).unwrap();
        let values: Vec<u8> = frames.iter().map(|f| f.get_pixel(0, 0)[0]).collect();
        assert_eq!(values, [4, 5, 6]);
    }

    #[test]
    fn test_range_larger_than_capacity() {
        let (mut cache, _) = cache_with(2);
        let frames = cache.get_range(0, 5).unwrap();

        assert_eq!(frames.len(), 6);
        assert_eq!(frames[5].get_pixel(0, 0), &Rgb([5, 5, 5]));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(4));
        assert!(cache.contains(5));
    }

    #[test]
    fn test_decode_failure_is_not_cached() {
        let (mut cache, _) = cache_with(4);
        assert!(cache.get(100).is_err());
        assert!(!cache.contains(100));
    }
}
