// operator tool for the curriculum index: merge, inspect, look up
use clap::Command;
use dotenv::dotenv;
use std::{
    env,
    io::{self, Write},
    path::PathBuf,
};

use klassiq::{curriculum, merge, resolve};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klassiq=info".into()),
        )
        .init();

    let matches = Command::new("klassiqctl")
        .subcommand(Command::new("merge")
                        .aliases(["m"])
                        .about("Merge subject fragments into curriculum_map.json"))
        .subcommand(Command::new("stats")
                        .aliases(["s", "report"])
                        .about("Print statistics for the merged curriculum map"))
        .subcommand(Command::new("lookup")
                        .aliases(["l", "find"])
                        .about("Look up a curriculum record interactively"))
        .get_matches();

    match matches.subcommand() {
        Some(("merge", _)) => run_merge()?,
        Some(("stats", _)) => run_stats()?,
        Some(("lookup", _)) => run_lookup()?,
        _ => {
            eprintln!("Invalid command, run klassiqctl help");
        }
    }
    Ok(())
}

fn data_dir() -> PathBuf {
    PathBuf::from(
        env::var("CURRICULUM_DATA_DIR")
            .unwrap_or_else(|_| "curriculum_data/parsed_jsons".to_string()),
    )
}

fn map_path() -> PathBuf {
    PathBuf::from(
        env::var("CURRICULUM_MAP_PATH").unwrap_or_else(|_| "data/curriculum_map.json".to_string()),
    )
}

fn run_merge() -> Result<(), Box<dyn std::error::Error>> {
    let (map, report) = merge::merge(&data_dir())?;
    let path = map_path();
    curriculum::save_map(&map, &path)?;

    println!("Merged {} subjects, skipped {}", report.merged_count(), report.skipped_count());
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.file, skipped.reason);
    }
    println!("Curriculum map written to {}", path.display());
    Ok(())
}

fn run_stats() -> Result<(), Box<dyn std::error::Error>> {
    let map = curriculum::load_map(&map_path())?;

    for (band, subjects) in &map {
        let topics: usize = subjects.values().map(|t| t.len()).sum();
        println!("{}: {} subjects, {} topics", band, subjects.len(), topics);
        for (subject, t) in subjects {
            println!("  {}: {} topics", subject, t.len());
        }
    }
    Ok(())
}

fn run_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let map = curriculum::load_map(&map_path())?;

    let mut grade = String::new();
    get_response("Enter grade (e.g. JSS 1)", &mut grade)?;

    let mut subject = String::new();
    get_response("Enter subject (e.g. English)", &mut subject)?;

    let mut topic = String::new();
    get_response("Enter topic", &mut topic)?;

    match resolve::lookup(&map, grade.trim(), subject.trim(), topic.trim()) {
        Ok(matched) => {
            println!("Matched: {} / {} / {}", matched.grade, matched.subject, matched.topic);
            print_list("Objectives", &matched.record.objectives);
            print_list("Content", &matched.record.content);
            print_list("Teacher activities", &matched.record.teacher_activities);
            print_list("Student activities", &matched.record.student_activities);
            print_list("Resources", &matched.record.resources);
        }
        Err(e) => eprintln!("{}", e),
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}

fn get_response(question: &str, output: &mut String)
-> Result<(), Box<dyn std::error::Error>> {
    print!("{}: ", question);
    io::stdout().flush()?;

    io::stdin().read_line(output)?;

    Ok(())
}
