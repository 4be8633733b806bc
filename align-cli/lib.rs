//! Batch alignment of photos onto a reference photo.
//!
//! A batch is an explicit list of [`ImagePair`]s. Each pair is loaded,
//! matched, aligned and written next to its destination file; failures are
//! recorded in the [`BatchReport`] and never stop the remaining pairs.

mod batch;
mod config;
mod diagnostics;
mod error;
mod report;

pub use batch::{output_path, BatchAligner, PairAlignment};
pub use config::{BatchConfig, BatchConfigError, ImagePair, DEFAULT_OUTPUT_SUFFIX};
pub use diagnostics::{draw_matches, DiagnosticsSink, PairDiagnostics, PreviewWriter, PREVIEW_SCALE};
pub use error::PairError;
pub use report::{BatchReport, PairOutcome, PairReport, PairStatus};

pub use align_core::{self, init_thread_pool, AlignConfig, MatchConfig, OrbConfig, RansacConfig};
pub use align_geometry::{self, AlignError, Alignment, Homography};
pub use align_match::{self, ImageRole, MatchError};
