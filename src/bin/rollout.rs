//! Random-rollout CLI.
//!
//! Loads a serialized `State` and plays random-policy rollouts from it,
//! writing one JSON summary per rollout.
//!
//! Usage:
//!   cargo run --release --bin rollout -- STATE.json [OPTIONS]
//!
//! Options:
//!   --rollouts N    Number of rollouts (default: 8)
//!   --turns N       Main-phase turns per rollout (default: 100)
//!   --threads N     Worker threads, 0 for rayon's default (default: 0)
//!   --seed N        Base seed; rollout i uses seed + i (default: 0)
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress summary output

use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::process;
use std::str::FromStr;
use std::time::Instant;

use lichen_engine::selfplay::{self, RolloutConfig};
use lichen_engine::State;

fn parse_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).map(|s| s.parse()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("invalid {flag} value");
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut config = RolloutConfig::default();
    let mut state_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rollouts" => {
                i += 1;
                config.num_rollouts = parse_value(&args, i, "--rollouts");
            }
            "--turns" => {
                i += 1;
                config.max_turns = parse_value(&args, i, "--turns");
            }
            "--threads" => {
                i += 1;
                config.threads = parse_value(&args, i, "--threads");
            }
            "--seed" => {
                i += 1;
                config.seed = parse_value(&args, i, "--seed");
            }
            "--output" => {
                i += 1;
                output_path = args.get(i).cloned();
            }
            "--quiet" => quiet = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other if state_path.is_none() && !other.starts_with("--") => {
                state_path = Some(other.to_string());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(state_path) = state_path else {
        print_usage();
        process::exit(1);
    };
    let state: State = match fs::read_to_string(&state_path)
        .map_err(|e| e.to_string())
        .and_then(|text| State::from_json_str(&text).map_err(|e| e.to_string()))
    {
        Ok(state) => state,
        Err(err) => {
            eprintln!("cannot load {state_path}: {err}");
            process::exit(1);
        }
    };

    let start = Instant::now();
    let records = selfplay::run_rollouts(&state, &config);
    if !quiet {
        let wins = [0, 1].map(|t| records.iter().filter(|r| r.winner == Some(t)).count());
        eprintln!(
            "Completed {} rollouts in {:.2}s: team 0 won {}, team 1 won {}, {} drawn",
            records.len(),
            start.elapsed().as_secs_f64(),
            wins[0],
            wins[1],
            records.len() - wins[0] - wins[1],
        );
    }

    let written = match output_path {
        Some(path) => File::create(&path).and_then(|file| selfplay::write_jsonl(&records, &mut BufWriter::new(file))),
        None => selfplay::write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(err) = written {
        eprintln!("failed to write output: {err}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage: rollout STATE.json [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --rollouts N     Number of rollouts (default: 8)");
    eprintln!("  --turns N        Main-phase turns per rollout (default: 100)");
    eprintln!("  --threads N      Worker threads, 0 for rayon's default (default: 0)");
    eprintln!("  --seed N         Base seed (default: 0)");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress summary output");
    eprintln!("  --help           Show this help");
}
