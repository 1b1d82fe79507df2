// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media frames and annotation files.

pub mod cache;
pub mod media;
pub mod serialization;
