//! cabin-differential CLI
//!
//! Validate cabin differentials of a fare usage from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Validate a scenario file
//! cabin-differential evaluate --input scenario.json
//!
//! # Output as JSON
//! cabin-differential evaluate --input scenario.json --format json
//!
//! # Generate a random scenario for testing
//! cabin-differential generate --segments 6 --seed 42 --output scenario.json
//! ```
//!
//! Set `RUST_LOG=debug` to trace the pipeline.

use cabin_differential::simulation::generator::{generate_random_scenario, max_segments, ScenarioConfig};
use cabin_differential::simulation::scenario::Scenario;
use cabin_differential::validator::DifferentialOutcome;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"cabin-differential - cabin differential validation for fare components

USAGE:
    cabin-differential <COMMAND> [OPTIONS]

COMMANDS:
    evaluate    Validate the fare usage of a scenario file
    generate    Generate a random scenario (for testing)
    help        Show this message

OPTIONS (evaluate):
    --input <FILE>      Path to JSON scenario file
    --format <FORMAT>   Output format: text (default) or json
    --detail            Include the full sector arena in JSON output

OPTIONS (generate):
    --segments <N>      Segments in the fare component (default: 4)
    --seed <N>          Seed for a reproducible scenario
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    cabin-differential evaluate --input scenario.json
    cabin-differential evaluate --input scenario.json --format json
    cabin-differential generate --segments 6 --seed 42 --output scenario.json"#
    );
}

/// JSON output schema for a verdict.
#[derive(serde::Serialize)]
struct EvaluateOutput<'a> {
    passed: bool,
    amount: String,
    failure: Option<String>,
    calculation_sequence: Option<u32>,
    sectors: Vec<SectorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a DifferentialOutcome>,
}

#[derive(serde::Serialize)]
struct SectorOutput {
    tag: String,
    segments: String,
    status: String,
    amount: String,
    high_fare: Option<String>,
    low_fare: Option<String>,
}

fn load_scenario(path: &str) -> Scenario {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    Scenario::from_json(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing scenario JSON: {}", e);
        eprintln!("Expected an object with a \"usage\" fare usage and optional");
        eprintln!("\"reference\", \"markets\", \"rules\", \"minimum_fares\" and \"config\".");
        eprintln!("Run `cabin-differential generate` for a complete example.");
        process::exit(1);
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    })
}

fn cmd_evaluate(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut verbose = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            "--detail" => verbose = true,
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let scenario = load_scenario(&path);
    let outcome = scenario.validate().unwrap_or_else(|e| {
        eprintln!("Validation aborted: {}", e);
        process::exit(2);
    });

    if format == "json" {
        let output = EvaluateOutput {
            passed: outcome.passed,
            amount: outcome.amount.to_string(),
            failure: outcome.failure.as_ref().map(|f| f.to_string()),
            calculation_sequence: outcome.calculation.as_ref().and_then(|c| c.sequence),
            sectors: outcome
                .priced_sectors()
                .map(|s| SectorOutput {
                    tag: s.tag.to_string(),
                    segments: s.range.to_string(),
                    status: s.status().to_string(),
                    amount: s.effective_amount().to_string(),
                    high_fare: s.high.as_ref().map(|f| f.fare_basis.clone()),
                    low_fare: s.low.as_ref().map(|f| f.fare_basis.clone()),
                })
                .collect(),
            detail: verbose.then_some(&outcome),
        };
        println!("{}", to_json(&output));
    } else {
        print!("{}", outcome);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = ScenarioConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--segments" => {
                i += 1;
                config.segment_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|n| (1..=max_segments()).contains(n))
                    .unwrap_or_else(|| {
                        eprintln!("--segments requires a number from 1 to {}", max_segments());
                        process::exit(1);
                    });
            }
            "--seed" => {
                i += 1;
                config.seed = Some(args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    process::exit(1);
                }));
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let scenario = generate_random_scenario(&config);
    let json = scenario.to_json().unwrap_or_else(|e| {
        eprintln!("Error serializing scenario: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {}-segment scenario with {} fare markets → {}",
            scenario.usage.segment_count(),
            scenario.markets.markets.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "evaluate" => cmd_evaluate(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
