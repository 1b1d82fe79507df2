// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! TRACKLABEL - tracker-assisted bounding-box labeling for video
//!
//! The annotator steps through a video every `jump` frames and draws boxes
//! around objects. When stepping forward, boxes from the previous sample are
//! tracked across the skipped frames and placed on the new one, so only new
//! or lost objects need to be drawn by hand.

mod app;
mod config;
mod io;
mod models;
mod navigator;
mod session;
mod tracking;
mod ui;
mod util;

use anyhow::Result;
use app::LabelerApp;
use clap::Parser;
use config::{IdPolicy, LabelerConfig};
use models::store::LoadStatus;
use session::AnnotationSession;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracking::template::TemplateTracker;

/// Width reserved for the side panel next to the frame.
const PANEL_SIZE: f32 = 300.0;

#[derive(Parser, Debug)]
#[command(version, about = "Label objects in a video with tracker-assisted bounding boxes")]
struct Args {
    /// Video file, or a directory of frame images
    video: PathBuf,

    /// YAML annotation file; loaded if it exists and written on exit
    annotations: PathBuf,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Annotate every N-th frame
    #[arg(long)]
    jump: Option<usize>,

    /// Longest side of the displayed frame, in pixels
    #[arg(long)]
    display_size: Option<u32>,

    /// Number of decoded frames kept in memory (0 keeps all)
    #[arg(long)]
    cache: Option<usize>,

    /// Continue ids after the largest id in the loaded annotation file
    #[arg(long)]
    resync_ids: bool,
}

impl Args {
    /// Configuration file settings with command-line overrides applied.
    fn config(&self) -> Result<LabelerConfig> {
        let mut config = match &self.config {
            Some(path) => LabelerConfig::load(path)?,
            None => LabelerConfig::default(),
        };
        if let Some(jump) = self.jump {
            config.jump_stride = jump;
        }
        if let Some(size) = self.display_size {
            config.display_size = size;
        }
        if let Some(cache) = self.cache {
            config.cache_capacity = cache;
        }
        if self.resync_ids {
            config.id_policy = IdPolicy::ResyncOnLoad;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config()?;

    let source = io::media::open_frame_source(&args.video)?;
    let tracker_config = config.tracker.clone();
    let factory = Box::new(move || TemplateTracker::new(tracker_config.clone()));
    let (session, status) = AnnotationSession::open(source, &args.annotations, &config, factory)?;
    if let LoadStatus::Loaded { frames, labels } = status {
        log::info!("Resuming with {} labels on {} frames", labels, frames);
    }

    let transform = *session.transform();
    let session = Rc::new(RefCell::new(session));

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([
                transform.display_width as f32 + PANEL_SIZE,
                transform.display_height as f32 + 20.0,
            ])
            .with_title("TRACKLABEL"),
        ..Default::default()
    };

    // Run the application
    let app_session = Rc::clone(&session);
    let result = eframe::run_native(
        "TRACKLABEL",
        options,
        Box::new(move |_cc| Ok(Box::new(LabelerApp::new(app_session)))),
    );

    let session = session.borrow();
    save_and_finish(&session, result)
}

/// Save the annotations, then report how the window ended. Edits made
/// before a late window failure are kept.
fn save_and_finish<E: std::fmt::Display>(
    session: &AnnotationSession,
    result: std::result::Result<(), E>,
) -> Result<()> {
    session.save()?;
    result.map_err(|e| anyhow::anyhow!("Application error: {}", e))
}
