use crate::config::ImagePair;
use crate::error::PairError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    Aligned,
    Failed,
}

/// Successful alignment of one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOutcome {
    pub output: PathBuf,
    pub raw_matches: usize,
    pub kept_matches: usize,
    pub inliers: usize,
    /// Row-major destination-to-reference homography
    pub homography: [[f64; 3]; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub reference: PathBuf,
    pub destination: PathBuf,
    pub status: PairStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outcome: Option<PairOutcome>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl PairReport {
    pub fn new(pair: &ImagePair, result: Result<PairOutcome, PairError>) -> Self {
        let (status, outcome, error_kind, error) = match result {
            Ok(outcome) => (PairStatus::Aligned, Some(outcome), None, None),
            Err(err) => (
                PairStatus::Failed,
                None,
                Some(err.kind().to_string()),
                Some(err.to_string()),
            ),
        };
        Self {
            reference: pair.reference.clone(),
            destination: pair.destination.clone(),
            status,
            outcome,
            error_kind,
            error,
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.status == PairStatus::Aligned
    }
}

/// Per-pair results of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub pairs: Vec<PairReport>,
}

impl BatchReport {
    pub fn aligned(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_aligned()).count()
    }

    pub fn failed(&self) -> usize {
        self.pairs.len() - self.aligned()
    }

    pub fn all_aligned(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use align_geometry::AlignError;

    fn outcome() -> PairOutcome {
        PairOutcome {
            output: PathBuf::from("b.jpg.new.jpg"),
            raw_matches: 900,
            kept_matches: 180,
            inliers: 171,
            homography: [[1.0, 0.0, 10.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    #[test]
    fn test_counts() {
        let pair = ImagePair::new("a.jpg", "b.jpg");
        let report = BatchReport {
            pairs: vec![
                PairReport::new(&pair, Ok(outcome())),
                PairReport::new(&pair, Err(AlignError::DegenerateHomography.into())),
            ],
        };
        assert_eq!(report.aligned(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.all_aligned());
        assert!(BatchReport::default().all_aligned());
    }

    #[test]
    fn test_json_layout() {
        let pair = ImagePair::new("a.jpg", "c.jpg");
        let report = BatchReport {
            pairs: vec![
                PairReport::new(&pair, Ok(outcome())),
                PairReport::new(
                    &pair,
                    Err(AlignError::InsufficientCorrespondences { found: 2, required: 4 }.into()),
                ),
            ],
        };
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["pairs"][0]["status"], "aligned");
        assert_eq!(value["pairs"][0]["outcome"]["inliers"], 171);
        assert!(value["pairs"][0].get("error").is_none());
        assert_eq!(value["pairs"][1]["status"], "failed");
        assert_eq!(value["pairs"][1]["error_kind"], "insufficient_correspondences");
        assert!(value["pairs"][1].get("outcome").is_none());

        let parsed: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
