// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Sampled-frame navigation.
//!
//! The annotator only sees every `jump_stride`-th frame. Moving past either
//! end of the video is refused with a boundary signal instead of clamping,
//! so the current frame always stays on the sampling grid.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved { from: usize, to: usize },
    /// The move would leave `[0, total_frames)`; the frame did not change.
    Boundary(Direction),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    current_frame: usize,
    jump_stride: usize,
    total_frames: usize,
}

impl Navigator {
    /// Start at frame 0. A stride of 0 is treated as 1.
    pub fn new(jump_stride: usize, total_frames: usize) -> Self {
        Self {
            current_frame: 0,
            jump_stride: jump_stride.max(1),
            total_frames,
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Move one stride forward.
    pub fn advance(&mut self) -> Step {
        let from = self.current_frame;
        match from.checked_add(self.jump_stride) {
            Some(to) if to < self.total_frames => {
                self.current_frame = to;
                Step::Moved { from, to }
            }
            _ => {
                log::warn!("Already the final sampled frame ({})", from);
                Step::Boundary(Direction::Forward)
            }
        }
    }

    /// Move one stride backward.
    pub fn retreat(&mut self) -> Step {
        let from = self.current_frame;
        match from.checked_sub(self.jump_stride) {
            Some(to) => {
                self.current_frame = to;
                Step::Moved { from, to }
            }
            None => {
                log::warn!("Already the first sampled frame ({})", from);
                Step::Boundary(Direction::Backward)
            }
        }
    }
}

#[cfg(test)]
impl Navigator {
    pub fn jump_stride(&self) -> usize {
        self.jump_stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(frame: usize, stride: usize, total: usize) -> Navigator {
        let mut nav = Navigator::new(stride, total);
        while nav.current_frame() < frame {
            nav.advance();
        }
        assert_eq!(nav.current_frame(), frame);
        nav
    }

    #[test]
    fn test_advance_by_stride() {
        let mut nav = Navigator::new(10, 100);
        assert_eq!(nav.advance(), Step::Moved { from: 0, to: 10 });
        assert_eq!(nav.current_frame(), 10);
    }

    #[test]
    fn test_advance_to_last_exact_fit() {
        let mut nav = at(80, 10, 100);
        assert_eq!(nav.advance(), Step::Moved { from: 80, to: 90 });
        assert_eq!(nav.advance(), Step::Boundary(Direction::Forward));
        assert_eq!(nav.current_frame(), 90);
    }

    #[test]
    fn test_advance_past_end_is_boundary() {
        let mut nav = at(95, 5, 100);
        let mut nav10 = Navigator { jump_stride: 10, ..nav.clone() };

        assert_eq!(nav10.advance(), Step::Boundary(Direction::Forward));
        assert_eq!(nav10.current_frame(), 95);
        assert_eq!(nav.advance(), Step::Boundary(Direction::Forward));
    }

    #[test]
    fn test_retreat_before_start_is_boundary() {
        let nav = at(5, 5, 100);
        let mut nav10 = Navigator { jump_stride: 10, ..nav };

        assert_eq!(nav10.retreat(), Step::Boundary(Direction::Backward));
        assert_eq!(nav10.current_frame(), 5);
    }

    #[test]
    fn test_retreat_by_stride() {
        let mut nav = at(20, 10, 100);
        assert_eq!(nav.retreat(), Step::Moved { from: 20, to: 10 });
        assert_eq!(nav.retreat(), Step::Moved { from: 10, to: 0 });
        assert_eq!(nav.retreat(), Step::Boundary(Direction::Backward));
        assert_eq!(nav.current_frame(), 0);
    }

    #[test]
    fn test_single_frame_video() {
        let mut nav = Navigator::new(1, 1);
        assert_eq!(nav.advance(), Step::Boundary(Direction::Forward));
        assert_eq!(nav.retreat(), Step::Boundary(Direction::Backward));
    }

    #[test]
    fn test_zero_stride_is_one() {
        let mut nav = Navigator::new(0, 3);
        assert_eq!(nav.jump_stride(), 1);
        assert_eq!(nav.advance(), Step::Moved { from: 0, to: 1 });
    }
}
