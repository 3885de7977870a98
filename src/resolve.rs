use serde::Serialize;
use thiserror::Error;

use crate::curriculum::{
    canonical_subject_key, CurriculumMap, CurriculumRecord, GradeSubjects, SubjectTopics,
    GRADE_BANDS,
};

/// Common spellings of a class level mapped onto its grade band. Numeric
/// sub-levels within a band all resolve to the same key; the merged map has
/// no finer grain.
const GRADE_ALIASES: &[(&str, &str)] = &[
    ("primary 1–3", "Primary 1–3"),
    ("primary 1-3", "Primary 1–3"),
    ("primary 1", "Primary 1–3"),
    ("primary 2", "Primary 1–3"),
    ("primary 3", "Primary 1–3"),
    ("pri 1", "Primary 1–3"),
    ("pri 2", "Primary 1–3"),
    ("pri 3", "Primary 1–3"),
    ("pri1", "Primary 1–3"),
    ("pri2", "Primary 1–3"),
    ("pri3", "Primary 1–3"),
    ("p1", "Primary 1–3"),
    ("p2", "Primary 1–3"),
    ("p3", "Primary 1–3"),
    ("primary 4–6", "Primary 4–6"),
    ("primary 4-6", "Primary 4–6"),
    ("primary 4", "Primary 4–6"),
    ("primary 5", "Primary 4–6"),
    ("primary 6", "Primary 4–6"),
    ("pri 4", "Primary 4–6"),
    ("pri 5", "Primary 4–6"),
    ("pri 6", "Primary 4–6"),
    ("pri4", "Primary 4–6"),
    ("pri5", "Primary 4–6"),
    ("pri6", "Primary 4–6"),
    ("p4", "Primary 4–6"),
    ("p5", "Primary 4–6"),
    ("p6", "Primary 4–6"),
    ("junior secondary 1–3", "Junior Secondary 1–3"),
    ("junior secondary 1-3", "Junior Secondary 1–3"),
    ("junior secondary 1", "Junior Secondary 1–3"),
    ("junior secondary 2", "Junior Secondary 1–3"),
    ("junior secondary 3", "Junior Secondary 1–3"),
    ("junior secondary", "Junior Secondary 1–3"),
    ("jss 1", "Junior Secondary 1–3"),
    ("jss 2", "Junior Secondary 1–3"),
    ("jss 3", "Junior Secondary 1–3"),
    ("jss1", "Junior Secondary 1–3"),
    ("jss2", "Junior Secondary 1–3"),
    ("jss3", "Junior Secondary 1–3"),
    ("jss", "Junior Secondary 1–3"),
    ("js 1", "Junior Secondary 1–3"),
    ("js 2", "Junior Secondary 1–3"),
    ("js 3", "Junior Secondary 1–3"),
    ("js1", "Junior Secondary 1–3"),
    ("js2", "Junior Secondary 1–3"),
    ("js3", "Junior Secondary 1–3"),
];

/// Subject names teachers type that don't line up with the fragment file
/// names. Keys whose canonical form already matches (e.g. "social studies")
/// don't need an entry.
const SUBJECT_ALIASES: &[(&str, &str)] = &[
    ("english", "english_studies"),
    ("english language", "english_studies"),
    ("mathematics", "maths"),
    ("math", "maths"),
    ("basic science", "basic_science_and_technology"),
    ("bst", "basic_science_and_technology"),
];

#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum LookupError {
    #[error("grade '{input}' not found; valid grades: {valid:?}")]
    GradeNotFound { input: String, valid: Vec<String> },
    #[error("subject '{input}' not found under {grade}; available subjects: {available:?}")]
    SubjectNotFound {
        input: String,
        grade: String,
        available: Vec<String>,
    },
    #[error("topic '{input}' not found under {grade}/{subject}; available topics: {available:?}")]
    TopicNotFound {
        input: String,
        grade: String,
        subject: String,
        available: Vec<String>,
    },
    #[error("curriculum index has not been loaded yet")]
    IndexUnavailable,
}

/// A fully resolved lookup: the canonical keys actually matched, so callers
/// can show the teacher what they got rather than echo the query.
#[derive(Debug, Clone, Serialize)]
pub struct LookupMatch {
    pub grade: String,
    pub subject: String,
    pub topic: String,
    pub record: CurriculumRecord,
}

/// Map free-text grade input onto one of the three grade bands.
pub fn resolve_grade(input: &str) -> Result<&'static str, LookupError> {
    let norm = input.trim().to_lowercase();
    GRADE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == norm)
        .map(|(_, band)| *band)
        .ok_or_else(|| LookupError::GradeNotFound {
            input: input.trim().to_string(),
            valid: GRADE_BANDS.iter().map(|b| b.to_string()).collect(),
        })
}

/// Map free-text subject input onto a canonical subject key present under
/// the given (already resolved) grade band.
pub fn resolve_subject(
    subjects: &GradeSubjects,
    grade: &str,
    input: &str,
) -> Result<String, LookupError> {
    let norm = input.trim().to_lowercase();

    if let Some((_, canon)) = SUBJECT_ALIASES.iter().find(|(alias, _)| *alias == norm) {
        if subjects.contains_key(*canon) {
            return Ok(canon.to_string());
        }
    }

    let key = canonical_subject_key(&norm);
    if subjects.contains_key(&key) {
        return Ok(key);
    }

    // Last resort before failing: "science" should still land on
    // "basic_science_and_technology" when that's the only science key.
    if !key.is_empty() {
        if let Some(found) = subjects.keys().find(|k| k.contains(&key)) {
            return Ok(found.clone());
        }
    }

    Err(LookupError::SubjectNotFound {
        input: input.trim().to_string(),
        grade: grade.to_string(),
        available: subjects.keys().cloned().collect(),
    })
}

/// Find the best topic for a free-text query. Priority: exact
/// case-insensitive match, then query-in-topic substring, then
/// topic-in-query (a teacher pasting a longer phrase than the stored
/// title). Within a priority level the earliest topic in curriculum order
/// wins, so repeated queries are deterministic.
pub fn find_topic<'a>(
    topics: &'a SubjectTopics,
    query: &str,
) -> Option<(&'a str, &'a CurriculumRecord)> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }

    for (name, record) in topics {
        if name.to_lowercase() == q {
            return Some((name.as_str(), record));
        }
    }
    for (name, record) in topics {
        if name.to_lowercase().contains(&q) {
            return Some((name.as_str(), record));
        }
    }
    for (name, record) in topics {
        if q.contains(&name.to_lowercase()) {
            return Some((name.as_str(), record));
        }
    }
    None
}

/// The single entry point the HTTP layer and lesson generator go through:
/// grade -> subject -> topic, short-circuiting with the stage-specific
/// failure so a bad grade never turns into a confusing topic error.
pub fn lookup(
    map: &CurriculumMap,
    grade: &str,
    subject: &str,
    topic: &str,
) -> Result<LookupMatch, LookupError> {
    let band = resolve_grade(grade)?;

    let subjects = map.get(band).ok_or_else(|| LookupError::SubjectNotFound {
        input: subject.trim().to_string(),
        grade: band.to_string(),
        available: Vec::new(),
    })?;

    let subject_key = resolve_subject(subjects, band, subject)?;
    let topics = &subjects[&subject_key];

    match find_topic(topics, topic) {
        Some((name, record)) => Ok(LookupMatch {
            grade: band.to_string(),
            subject: subject_key,
            topic: name.to_string(),
            record: record.clone(),
        }),
        None => Err(LookupError::TopicNotFound {
            input: topic.trim().to_string(),
            grade: band.to_string(),
            subject: subject_key,
            available: topics.keys().cloned().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(names: &[&str]) -> SubjectTopics {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    CurriculumRecord {
                        topic_name: n.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn grade_aliases_cover_sub_levels() {
        for input in ["JSS 1", "jss2", "js 3", "Junior Secondary 1"] {
            assert_eq!(resolve_grade(input).unwrap(), "Junior Secondary 1–3");
        }
        for input in ["pri 4", "Primary 5", "p6"] {
            assert_eq!(resolve_grade(input).unwrap(), "Primary 4–6");
        }
    }

    #[test]
    fn grade_resolution_is_idempotent_on_canonical_keys() {
        for band in GRADE_BANDS {
            assert_eq!(resolve_grade(band).unwrap(), band);
        }
    }

    #[test]
    fn unknown_grade_reports_valid_bands() {
        match resolve_grade("Atlantis") {
            Err(LookupError::GradeNotFound { input, valid }) => {
                assert_eq!(input, "Atlantis");
                assert_eq!(valid, GRADE_BANDS.map(String::from).to_vec());
            }
            other => panic!("expected GradeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn subject_aliases_and_literals_resolve() {
        let mut subjects = GradeSubjects::new();
        subjects.insert("english_studies".to_string(), topics(&["Reading"]));
        subjects.insert("maths".to_string(), topics(&["Fractions"]));

        assert_eq!(
            resolve_subject(&subjects, "Primary 4–6", "English").unwrap(),
            "english_studies"
        );
        assert_eq!(
            resolve_subject(&subjects, "Primary 4–6", "Mathematics").unwrap(),
            "maths"
        );
        // already canonical comes back unchanged
        assert_eq!(
            resolve_subject(&subjects, "Primary 4–6", "english_studies").unwrap(),
            "english_studies"
        );
    }

    #[test]
    fn subject_falls_back_to_substring_match() {
        let mut subjects = GradeSubjects::new();
        subjects.insert(
            "basic_science_and_technology".to_string(),
            topics(&["Living Things"]),
        );

        assert_eq!(
            resolve_subject(&subjects, "Primary 1–3", "science").unwrap(),
            "basic_science_and_technology"
        );
    }

    #[test]
    fn unknown_subject_lists_available_keys() {
        let mut subjects = GradeSubjects::new();
        subjects.insert("maths".to_string(), topics(&["Fractions"]));

        match resolve_subject(&subjects, "Primary 1–3", "alchemy") {
            Err(LookupError::SubjectNotFound { available, .. }) => {
                assert_eq!(available, vec!["maths"]);
            }
            other => panic!("expected SubjectNotFound, got {other:?}"),
        }
    }

    #[test]
    fn topic_match_priority_and_tie_break() {
        let t = topics(&["Reading Comprehension", "reading for retention"]);

        // substring tie between both topics: earliest in curriculum order wins
        let (name, _) = find_topic(&t, "reading").unwrap();
        assert_eq!(name, "Reading Comprehension");

        // exact match beats an earlier substring match
        let t = topics(&["Reading Comprehension", "Reading"]);
        let (name, _) = find_topic(&t, "READING").unwrap();
        assert_eq!(name, "Reading");
    }

    #[test]
    fn topic_in_query_direction_matches() {
        let t = topics(&["Fractions"]);
        let (name, _) = find_topic(&t, "introduction to fractions for primary 4").unwrap();
        assert_eq!(name, "Fractions");
    }

    #[test]
    fn empty_query_never_matches() {
        let t = topics(&["Fractions"]);
        assert!(find_topic(&t, "   ").is_none());
    }

    #[test]
    fn bad_grade_short_circuits_before_subject_resolution() {
        let map = CurriculumMap::new();
        match lookup(&map, "Atlantis", "English", "Reading") {
            Err(LookupError::GradeNotFound { valid, .. }) => {
                assert_eq!(valid.len(), 3);
            }
            other => panic!("expected GradeNotFound, got {other:?}"),
        }
    }
}
