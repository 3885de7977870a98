use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::curriculum::{canonical_subject_key, CurriculumMap, GradeSubjects, SubjectTopics};

/// Grade band -> folder of parsed subject fragments, mirroring the layout
/// produced by the PDF parsing step.
const BAND_FOLDERS: [(&str, &str); 3] = [
    ("Primary 1–3", "parsed_pri1_3_curr_json"),
    ("Primary 4–6", "parsed_pri4_6_curr_json"),
    ("Junior Secondary 1–3", "parsed_js_curr_json"),
];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("curriculum data path not found: {0}")]
    DataDirMissing(PathBuf),
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct MergeReport {
    /// "Grade band/subject_key" entries that made it into the map.
    pub merged: Vec<String>,
    pub skipped: Vec<SkippedFragment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFragment {
    pub file: String,
    pub reason: String,
}

impl MergeReport {
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn skip(&mut self, file: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("skipping {}: {}", file.display(), reason);
        self.skipped.push(SkippedFragment {
            file: file.display().to_string(),
            reason,
        });
    }
}

/// Merge every subject fragment under `data_dir` into a single hierarchical
/// map. A single bad fragment never aborts the run: it is recorded in the
/// report and the rest of the curriculum still loads.
pub fn merge(data_dir: &Path) -> Result<(CurriculumMap, MergeReport), MergeError> {
    if !data_dir.exists() {
        return Err(MergeError::DataDirMissing(data_dir.to_path_buf()));
    }

    let mut map = CurriculumMap::new();
    let mut report = MergeReport::default();

    for (band, folder) in BAND_FOLDERS {
        let folder_path = data_dir.join(folder);
        if !folder_path.exists() {
            warn!("folder not found: {}", folder_path.display());
            continue;
        }

        info!("processing {} from {}", band, folder);
        let mut subjects = GradeSubjects::new();

        let mut files: Vec<PathBuf> = fs::read_dir(&folder_path)
            .map_err(|source| MergeError::Scan {
                path: folder_path.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for file in files {
            let subject = match file.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => canonical_subject_key(stem),
                None => {
                    report.skip(&file, "file name is not valid UTF-8");
                    continue;
                }
            };

            if subjects.contains_key(&subject) {
                report.skip(&file, format!("subject {subject} already merged for {band}"));
                continue;
            }

            match load_fragment(&file) {
                Ok(topics) => {
                    info!("added {} to {}", subject, band);
                    subjects.insert(subject.clone(), topics);
                    report.merged.push(format!("{band}/{subject}"));
                }
                Err(reason) => report.skip(&file, reason),
            }
        }

        map.insert(band.to_string(), subjects);
    }

    info!(
        "merge complete: {} subjects merged, {} skipped",
        report.merged_count(),
        report.skipped_count()
    );

    Ok((map, report))
}

/// Parse and validate one subject fragment. Returns a human-readable reason
/// instead of an error type because the only consumer is the skip report.
fn load_fragment(path: &Path) -> Result<SubjectTopics, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read error: {e}"))?;

    if raw.trim().is_empty() {
        return Err("fragment file is empty".to_string());
    }

    let mut topics: SubjectTopics =
        serde_json::from_str(&raw).map_err(|e| format!("invalid fragment structure: {e}"))?;

    if topics.is_empty() {
        return Err("fragment contains no topics".to_string());
    }

    // The key is authoritative for the display name; fragments rarely
    // repeat it in the record body.
    for (name, record) in topics.iter_mut() {
        record.topic_name = name.clone();
    }

    Ok(topics)
}
