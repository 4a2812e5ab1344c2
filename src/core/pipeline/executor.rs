//! Batch inspection implementation.

use super::batch::{basename, unique_paths, Batch};
use crate::core::comparator::{
    cosine_similarity, AllCloseRule, CosineThresholdRule, DefectRule, KeypointPresenceRule,
    StandaloneRule,
};
use crate::core::features::{
    AnalyzerKind, FeatureExtractor, HarrisExtractor, HogExtractor, KeypointExtractor,
};
use crate::error::Result;
use crate::events::{
    null_sender, Event, EventSender, InspectEvent, InspectProgress, InspectSummary, ReportEvent,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Decision for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub path: PathBuf,
    pub is_defect: bool,
    /// Rule-specific magnitude (similarity, largest difference, keypoint count)
    pub score: f64,
}

/// Result of inspecting a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionResult {
    /// Analyzer that produced the verdicts
    pub analyzer: AnalyzerKind,
    /// Reference the candidates were judged against, if any
    pub reference: Option<PathBuf>,
    /// One verdict per candidate, in input order
    pub verdicts: Vec<Verdict>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl InspectionResult {
    /// Paths of the defective candidates, in input order
    pub fn defect_paths(&self) -> Vec<&Path> {
        self.verdicts
            .iter()
            .filter(|v| v.is_defect)
            .map(|v| v.path.as_path())
            .collect()
    }

    /// Basenames of the defective candidates, in input order
    pub fn defect_names(&self) -> Vec<String> {
        self.defect_paths().into_iter().map(basename).collect()
    }

    /// Number of defective candidates
    pub fn defect_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_defect).count()
    }
}

/// Judge every candidate of `batch` against the reference descriptor.
///
/// The reference is extracted once; candidates are then extracted and
/// judged one at a time, so at most two descriptors are alive.
pub fn inspect_against_reference<E, R>(
    extractor: &E,
    rule: &R,
    batch: &Batch,
    events: &EventSender,
) -> Result<InspectionResult>
where
    E: FeatureExtractor,
    R: DefectRule<E::Descriptor>,
{
    let start_time = Instant::now();
    let analyzer = extractor.kind();
    let total = batch.len();

    tracing::debug!(%analyzer, total, reference = %batch.reference().display(), "Inspection started");
    events.send(Event::Inspect(InspectEvent::Started {
        analyzer,
        total_candidates: total,
    }));

    let reference = extractor.extract_file(batch.reference())?;
    events.send(Event::Inspect(InspectEvent::ReferenceExtracted {
        path: batch.reference().to_path_buf(),
    }));

    let mut verdicts = Vec::with_capacity(total);
    for (index, path) in batch.candidates().iter().enumerate() {
        let candidate = extractor.extract_file(path)?;
        let judgement = rule.judge(&reference, &candidate)?;

        tracing::debug!(
            path = %path.display(),
            is_defect = judgement.is_defect,
            score = judgement.score,
            "Candidate judged"
        );
        events.send(Event::Inspect(InspectEvent::Progress(InspectProgress {
            completed: index + 1,
            total,
            current_path: path.clone(),
            is_defect: judgement.is_defect,
        })));

        verdicts.push(Verdict {
            path: path.clone(),
            is_defect: judgement.is_defect,
            score: judgement.score,
        });
    }

    Ok(finish(
        analyzer,
        Some(batch.reference().to_path_buf()),
        verdicts,
        start_time,
        events,
    ))
}

/// Judge every path on its own; no reference is involved.
///
/// A path listed more than once is judged at its first position only.
pub fn inspect_each<E, R>(
    extractor: &E,
    rule: &R,
    paths: &[PathBuf],
    events: &EventSender,
) -> Result<InspectionResult>
where
    E: FeatureExtractor,
    R: StandaloneRule<E::Descriptor>,
{
    let start_time = Instant::now();
    let analyzer = extractor.kind();
    let paths = unique_paths(paths);
    let total = paths.len();

    tracing::debug!(%analyzer, total, "Inspection started");
    events.send(Event::Inspect(InspectEvent::Started {
        analyzer,
        total_candidates: total,
    }));

    let mut verdicts = Vec::with_capacity(total);
    for (index, path) in paths.iter().enumerate() {
        let judgement = rule.judge(&extractor.extract_file(path)?);

        tracing::debug!(
            path = %path.display(),
            is_defect = judgement.is_defect,
            score = judgement.score,
            "Image judged"
        );
        events.send(Event::Inspect(InspectEvent::Progress(InspectProgress {
            completed: index + 1,
            total,
            current_path: path.clone(),
            is_defect: judgement.is_defect,
        })));

        verdicts.push(Verdict {
            path: path.clone(),
            is_defect: judgement.is_defect,
            score: judgement.score,
        });
    }

    Ok(finish(analyzer, None, verdicts, start_time, events))
}

fn finish(
    analyzer: AnalyzerKind,
    reference: Option<PathBuf>,
    verdicts: Vec<Verdict>,
    start_time: Instant,
    events: &EventSender,
) -> InspectionResult {
    let result = InspectionResult {
        analyzer,
        reference,
        verdicts,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    tracing::info!(
        %analyzer,
        candidates = result.verdicts.len(),
        defects = result.defect_count(),
        duration_ms = result.duration_ms,
        "Inspection completed"
    );
    events.send(Event::Inspect(InspectEvent::Completed {
        summary: InspectSummary {
            analyzer,
            total_candidates: result.verdicts.len(),
            defect_count: result.defect_count(),
            duration_ms: result.duration_ms,
        },
    }));

    result
}

/// Candidates whose embedding's cosine similarity to the reference is
/// below `threshold`, as basenames in input order.
pub fn interpret_resnet_features<E>(
    extractor: &E,
    paths: &[PathBuf],
    reference: &Path,
    threshold: f32,
) -> Result<Vec<String>>
where
    E: FeatureExtractor<Descriptor = Array1<f32>>,
{
    let batch = Batch::new(paths, reference);
    let rule = CosineThresholdRule::new(threshold);
    Ok(inspect_against_reference(extractor, &rule, &batch, &null_sender())?.defect_names())
}

/// Emit one similarity report per candidate. Classification is not affected.
pub fn report_resnet_similarity<E>(
    extractor: &E,
    paths: &[PathBuf],
    reference: &Path,
    events: &EventSender,
) -> Result<()>
where
    E: FeatureExtractor<Descriptor = Array1<f32>>,
{
    let batch = Batch::new(paths, reference);
    let reference = extractor.extract_file(batch.reference())?;

    for path in batch.candidates() {
        let candidate = extractor.extract_file(path)?;
        let similarity = cosine_similarity(&reference, &candidate)?;
        let name = basename(path);

        tracing::debug!(%name, similarity, "Similarity computed");
        events.send(Event::Report(ReportEvent::Similarity { name, similarity }));
    }

    Ok(())
}

/// Candidates whose leading gradient-histogram bins differ from the reference.
pub fn interpret_hog_descriptors(paths: &[PathBuf], reference: &Path) -> Result<Vec<String>> {
    let batch = Batch::from_listing(paths, reference)?;
    let result = inspect_against_reference(
        &HogExtractor::default(),
        &AllCloseRule::default(),
        &batch,
        &null_sender(),
    )?;
    Ok(result.defect_names())
}

/// Candidates whose Harris response map differs from the reference.
pub fn interpret_harris_response(paths: &[PathBuf], reference: &Path) -> Result<Vec<String>> {
    let batch = Batch::from_listing(paths, reference)?;
    let result = inspect_against_reference(
        &HarrisExtractor::default(),
        &AllCloseRule::default(),
        &batch,
        &null_sender(),
    )?;
    Ok(result.defect_names())
}

/// Every image with at least one scale-space keypoint.
pub fn interpret_sift_features(paths: &[PathBuf]) -> Result<Vec<String>> {
    let result = inspect_each(
        &KeypointExtractor::default(),
        &KeypointPresenceRule,
        paths,
        &null_sender(),
    )?;
    Ok(result.defect_names())
}
