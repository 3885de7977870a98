use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The three fixed grade bands of the 2025 basic education curriculum.
/// These are the top-level keys of the merged map.
pub const GRADE_BANDS: [&str; 3] = ["Primary 1–3", "Primary 4–6", "Junior Secondary 1–3"];

/// One topic's teaching content, as merged from a subject fragment.
///
/// Source fragments are hand-parsed from PDFs and frequently drop columns,
/// so every list defaults to empty rather than failing the whole fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurriculumRecord {
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub teacher_activities: Vec<String>,
    #[serde(default)]
    pub student_activities: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    /// Full display name of the topic, e.g. "Parts of Speech: Nouns, Verbs
    /// and Adjectives". Filled in from the map key during the merge.
    #[serde(default)]
    pub topic_name: String,
}

/// Topic display name -> record. Insertion order is the curriculum sequence,
/// which is why these are IndexMaps and not HashMaps.
pub type SubjectTopics = IndexMap<String, CurriculumRecord>;

/// Canonical subject key (lowercase, underscored) -> topics.
pub type GradeSubjects = IndexMap<String, SubjectTopics>;

/// Grade band -> subjects. Built once by the merger, read-only afterwards.
pub type CurriculumMap = IndexMap<String, GradeSubjects>;

/// Derive the canonical subject key from a fragment file name or a
/// human-entered subject, e.g. "English Studies" -> "english_studies".
pub fn canonical_subject_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Load the merged curriculum artifact written by a previous merge run.
pub fn load_map(path: &Path) -> io::Result<CurriculumMap> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(io::Error::other)
}

/// Persist the merged map so later starts don't have to re-parse every
/// fragment file.
pub fn save_map(map: &CurriculumMap, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(map).map_err(io::Error::other)?;
    fs::write(path, raw)
}
