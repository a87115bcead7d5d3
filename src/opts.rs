use std::path::PathBuf;

use crate::naming::BookNumbering;
use crate::planner::ProjectLayout;

/// Options that control a run.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - tests and batch jobs can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// Directory holding one timing file per chapter.
    pub timing_dir: PathBuf,

    /// Root of the audio tree (one directory per book).
    pub audio_dir: PathBuf,

    /// Output root, language code, project type and take used for clip paths.
    pub layout: ProjectLayout,

    /// Offset between timing-file and audio-directory book numbers.
    pub numbering: BookNumbering,

    /// Plan and report clips without creating directories or running the extractor.
    pub dry_run: bool,
}

impl Opts {
    pub fn new(
        language_code: &str,
        timing_dir: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            timing_dir: timing_dir.into(),
            audio_dir: audio_dir.into(),
            layout: ProjectLayout::new(output_dir, language_code),
            numbering: BookNumbering::default(),
            dry_run: false,
        }
    }
}
