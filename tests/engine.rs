//! End-to-end engine tests over real files: merge fragment directories,
//! persist the map, reload it, and resolve fuzzy lookups against it.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use klassiq::curriculum::{load_map, save_map, GRADE_BANDS};
use klassiq::merge::merge;
use klassiq::resolve::{lookup, LookupError};

const ENGLISH_FRAGMENT: &str = r#"{
  "Parts of Speech: Nouns, Verbs and Adjectives": {
    "objectives": [
      "identify the features of nouns, verbs and adjectives in a given passage",
      "use nouns, verbs and adjectives correctly in sentences"
    ],
    "content": ["Nouns", "Verbs", "Adjectives"],
    "teacher_activities": ["writes a short passage on the board"],
    "student_activities": ["underline nouns in the passage"],
    "resources": ["chart of common nouns"]
  },
  "Reading Comprehension": {
    "objectives": ["read a passage and answer questions"]
  },
  "reading for retention": {
    "objectives": ["recall key points of a passage"]
  }
}"#;

const MATHS_FRAGMENT: &str = r#"{
  "Whole Numbers": {
    "objectives": ["count and write numbers up to 1000"]
  },
  "Fractions": {
    "objectives": ["identify halves and quarters"]
  }
}"#;

fn build_data_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let js = tmp.path().join("parsed_js_curr_json");
    fs::create_dir_all(&js).unwrap();
    fs::write(js.join("English Studies.json"), ENGLISH_FRAGMENT).unwrap();

    let pri = tmp.path().join("parsed_pri4_6_curr_json");
    fs::create_dir_all(&pri).unwrap();
    fs::write(pri.join("Maths.json"), MATHS_FRAGMENT).unwrap();

    tmp
}

#[test]
fn end_to_end_fuzzy_lookup() {
    let data = build_data_dir();
    let (map, report) = merge(data.path()).unwrap();
    assert_eq!(report.merged_count(), 2);
    assert_eq!(report.skipped_count(), 0);

    let matched = lookup(&map, "JSS 1", "English", "parts of speech").unwrap();
    assert_eq!(matched.grade, "Junior Secondary 1–3");
    assert_eq!(matched.subject, "english_studies");
    assert_eq!(matched.topic, "Parts of Speech: Nouns, Verbs and Adjectives");
    assert_eq!(
        matched.record.objectives,
        vec![
            "identify the features of nouns, verbs and adjectives in a given passage",
            "use nouns, verbs and adjectives correctly in sentences"
        ]
    );
    assert_eq!(matched.record.topic_name, matched.topic);
}

#[test]
fn unknown_grade_fails_before_subject_resolution() {
    let data = build_data_dir();
    let (map, _) = merge(data.path()).unwrap();

    // the subject and topic are nonsense too; the error must still be about
    // the grade, with all three valid bands attached
    match lookup(&map, "Atlantis", "alchemy", "turning lead into gold") {
        Err(LookupError::GradeNotFound { input, valid }) => {
            assert_eq!(input, "Atlantis");
            assert_eq!(valid, GRADE_BANDS.map(String::from).to_vec());
        }
        other => panic!("expected GradeNotFound, got {other:?}"),
    }
}

#[test]
fn stored_topic_names_match_their_records() {
    let data = build_data_dir();
    let (map, _) = merge(data.path()).unwrap();

    for (grade, subjects) in &map {
        for (subject, topics) in subjects {
            for (topic, record) in topics {
                let matched = lookup(&map, grade, subject, topic).unwrap();
                assert_eq!(&matched.topic, topic);
                assert_eq!(&matched.record.topic_name, topic);
                assert_eq!(&matched.record, record);
            }
        }
    }
}

#[test]
fn topic_tie_break_is_stable_across_runs() {
    let data = build_data_dir();
    for _ in 0..3 {
        let (map, _) = merge(data.path()).unwrap();
        let matched = lookup(&map, "jss1", "english_studies", "reading").unwrap();
        assert_eq!(matched.topic, "Reading Comprehension");
    }
}

#[test]
fn artifact_round_trip_preserves_content_and_order() {
    let data = build_data_dir();
    let (map, _) = merge(data.path()).unwrap();

    let out = TempDir::new().unwrap();
    let artifact = out.path().join("data").join("curriculum_map.json");
    save_map(&map, &artifact).unwrap();
    let reloaded = load_map(&artifact).unwrap();

    assert_eq!(map, reloaded);

    // IndexMap equality ignores order; the curriculum sequence must survive
    // the round trip too
    let original: Vec<&String> = map["Junior Secondary 1–3"]["english_studies"]
        .keys()
        .collect();
    let restored: Vec<&String> = reloaded["Junior Secondary 1–3"]["english_studies"]
        .keys()
        .collect();
    assert_eq!(original, restored);
}

#[test]
fn empty_fragment_degrades_gracefully() {
    let data = build_data_dir();
    let js = data.path().join("parsed_js_curr_json");
    fs::write(js.join("Security Education.json"), "").unwrap();

    let (map, report) = merge(data.path()).unwrap();
    assert_eq!(report.merged_count(), 2);
    assert_eq!(report.skipped_count(), 1);
    assert!(report.skipped[0].file.contains("Security Education"));
    assert!(!map["Junior Secondary 1–3"].contains_key("security_education"));

    // the well-formed subjects are still fully usable
    assert!(lookup(&map, "primary 4", "maths", "fractions").is_ok());
}

fn fragment_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn merge_ignores_non_json_files() {
    let data = build_data_dir();
    let js = data.path().join("parsed_js_curr_json");
    fs::write(js.join("notes.txt"), "not a fragment").unwrap();
    assert_eq!(fragment_count(&js), 2);

    let (_, report) = merge(data.path()).unwrap();
    assert_eq!(report.merged_count(), 2);
    assert_eq!(report.skipped_count(), 0);
}
