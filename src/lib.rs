//! `trmaker` — split chapter recordings into per-verse clips for translation-recorder projects.
//!
//! This crate provides:
//! - Parsing of verse-timing transcripts (one per chapter)
//! - Reconciliation of timing-file names, embedded tags and audio-tree book numbering
//! - Lookup of the matching chapter recording
//! - Planning of per-verse clips into the project folder layout
//! - Lossless clip extraction through an external tool (`ffmpeg` by default)
//!
//! Most consumers should start with [`Pipeline`] and [`Opts`].

// High-level API.
pub mod opts;
pub mod pipeline;

// Timing transcripts and identifiers.
pub mod naming;
pub mod timing;

// Audio lookup, planning and extraction.
pub mod extractor;
pub mod locator;
pub mod planner;

// Run summaries.
pub mod output_type;
pub mod report;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
pub use extractor::{ClipExtractor, FfmpegExtractor};
pub use opts::Opts;
pub use output_type::OutputType;
pub use pipeline::{Pipeline, RunSummary};

#[cfg(feature = "logging")]
pub use logging::{LogOpts, init as init_logging};
