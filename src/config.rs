// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labeling session configuration.
//!
//! Settings come from an optional YAML file. Every field has a default, so
//! a partial file only overrides what it names. Command-line flags are
//! applied on top by `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_JUMP_STRIDE: usize = 1;
pub const DEFAULT_DISPLAY_SIZE: u32 = 960;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_SEARCH_RADIUS: u32 = 24;
pub const DEFAULT_MAX_MEAN_ABS_DIFF: f32 = 28.0;

/// How the id counter reacts to loading an existing annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Keep counting from the configured seed; loaded ids are not inspected.
    #[default]
    Sequential,
    /// Raise the counter above the largest id found in the loaded file.
    ResyncOnLoad,
}

/// Template tracker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Pixels searched around the previous position on each update
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,

    /// Largest mean absolute grey difference still accepted as a match
    #[serde(default = "default_max_mean_abs_diff")]
    pub max_mean_abs_diff: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            max_mean_abs_diff: DEFAULT_MAX_MEAN_ABS_DIFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelerConfig {
    /// Frames skipped between annotated samples
    #[serde(default = "default_jump_stride")]
    pub jump_stride: usize,

    /// Longest side of the displayed frame, in pixels
    #[serde(default = "default_display_size")]
    pub display_size: u32,

    /// Decoded frames kept in memory; 0 keeps every frame
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// First id handed out for new targets
    #[serde(default)]
    pub id_seed: i64,

    #[serde(default)]
    pub id_policy: IdPolicy,

    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_jump_stride() -> usize {
    DEFAULT_JUMP_STRIDE
}

fn default_display_size() -> u32 {
    DEFAULT_DISPLAY_SIZE
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_search_radius() -> u32 {
    DEFAULT_SEARCH_RADIUS
}

fn default_max_mean_abs_diff() -> f32 {
    DEFAULT_MAX_MEAN_ABS_DIFF
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self {
            jump_stride: DEFAULT_JUMP_STRIDE,
            display_size: DEFAULT_DISPLAY_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            id_seed: 0,
            id_policy: IdPolicy::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl LabelerConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.jump_stride == 0 {
            anyhow::bail!("jump_stride must be at least 1");
        }
        if self.display_size == 0 {
            anyhow::bail!("display_size must be at least 1");
        }
        if self.id_seed < 0 {
            anyhow::bail!("id_seed must not be negative");
        }
        Ok(())
    }
}
