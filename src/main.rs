use std::{env, fs, path::Path, process};

use statledger::configs::ProfileRegistry;
use statledger::parsers::{ParseOptions, StatementEngine};
use statledger::structs::layout::read_layout;
use statledger::ParseError;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <input.txt> <profile> <output.json> [--strict]\n\n\
         <input.txt>   layout-text token file produced by an extractor\n\
         <profile>     a registered profile key, or a path to a profile .json\n\
         <output.json> where to write the statement result\n\
         --strict      fail (exit 4) when any period does not reconcile\n"
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        print_usage(&args[0]);
        process::exit(1);
    }
    let input = &args[1];
    let profile_arg = &args[2];
    let output = &args[3];
    let strict = args.get(4).map(|a| a == "--strict").unwrap_or(false);

    if !Path::new(input).exists() {
        eprintln!("Input file does not exist: {input}");
        process::exit(1);
    }

    // Resolve the profile: a .json path loads directly, anything else is
    // looked up among the registered profiles.
    let profile = if profile_arg.to_lowercase().ends_with(".json") {
        match statledger::configs::from_json_file(profile_arg) {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!("Failed to load profile {profile_arg}: {e}");
                process::exit(2);
            }
        }
    } else {
        let registry = ProfileRegistry::with_builtins();
        match registry.get(profile_arg) {
            Ok(profile) => profile,
            Err(_) => {
                eprintln!(
                    "Unknown profile '{profile_arg}'. Registered profiles: {}",
                    registry.keys().join(", ")
                );
                process::exit(2);
            }
        }
    };

    let layout = match fs::read_to_string(input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read {input}: {e}");
            process::exit(1);
        }
    };
    let tokens = match read_layout(&layout) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("Failed to parse layout text: {e}");
            process::exit(3);
        }
    };

    let engine = match StatementEngine::new(profile) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };
    let options = ParseOptions {
        require_strict: strict,
        ..ParseOptions::default()
    };

    let result = match engine.parse_tokens(tokens, &options) {
        Ok(result) => result,
        Err(ParseError::ProfileInvalid { key, reason }) => {
            eprintln!("Profile '{key}' rejected: {reason}");
            process::exit(2);
        }
        Err(e) => {
            if let Some(partial) = e.partial_result() {
                eprintln!(
                    "{e} ({} transaction(s) recovered before failure)",
                    partial.transactions.len()
                );
            } else {
                eprintln!("{e}");
            }
            process::exit(3);
        }
    };

    let json = match serde_json::to_string_pretty(&result) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to serialize result: {e}");
            process::exit(3);
        }
    };
    if let Err(e) = fs::write(output, json) {
        eprintln!("Failed to write output file {output}: {e}");
        process::exit(3);
    }

    println!(
        "Parsed {} transaction(s) across {} period(s), confidence {}. {} warning(s).",
        result.transactions.len(),
        result.periods.len(),
        result.confidence_overall,
        result.warnings.len()
    );
    if !result.success {
        eprintln!("Reconciliation failed under strict mode; see warnings in {output}");
        process::exit(4);
    }
}
