//! Event type definitions for progress reporting.

use crate::core::features::AnalyzerKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while inspecting a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Batch inspection events
    Inspect(InspectEvent),
    /// Observational similarity reports
    Report(ReportEvent),
}

/// Events during a batch inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InspectEvent {
    /// Inspection has started
    Started {
        analyzer: AnalyzerKind,
        total_candidates: usize,
    },
    /// The reference descriptor is ready
    ReferenceExtracted { path: PathBuf },
    /// A candidate has been judged
    Progress(InspectProgress),
    /// Inspection completed
    Completed { summary: InspectSummary },
}

/// Progress information after each candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectProgress {
    /// Number of candidates judged so far
    pub completed: usize,
    /// Total number of candidates
    pub total: usize,
    /// Candidate just judged
    pub current_path: PathBuf,
    /// Verdict for the candidate
    pub is_defect: bool,
}

/// Summary of an inspection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectSummary {
    /// Analyzer that produced the verdicts
    pub analyzer: AnalyzerKind,
    /// Number of candidates judged
    pub total_candidates: usize,
    /// Number of candidates flagged as defects
    pub defect_count: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Reports that observe a run without influencing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportEvent {
    /// Cosine similarity between the reference and one candidate
    Similarity { name: String, similarity: f32 },
}

impl std::fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportEvent::Similarity { name, similarity } => {
                write!(f, "Similarity between reference and {}: {:?}", name, similarity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Inspect(InspectEvent::Progress(InspectProgress {
            completed: 3,
            total: 4,
            current_path: PathBuf::from("images/image3.jpg"),
            is_defect: true,
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Inspect(InspectEvent::Progress(p)) => {
                assert_eq!(p.completed, 3);
                assert!(p.is_defect);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn similarity_report_line_format() {
        let event = ReportEvent::Similarity {
            name: "image1.jpg".to_string(),
            similarity: 0.5,
        };
        assert_eq!(
            event.to_string(),
            "Similarity between reference and image1.jpg: 0.5"
        );
    }

    #[test]
    fn whole_similarity_keeps_decimal_point() {
        let event = ReportEvent::Similarity {
            name: "image2.jpg".to_string(),
            similarity: 1.0,
        };
        assert_eq!(
            event.to_string(),
            "Similarity between reference and image2.jpg: 1.0"
        );
    }
}
