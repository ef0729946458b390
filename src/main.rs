use std::env;
use std::io;
use std::process;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use grep_backtrack::{compile, MatchOptions};

/// Reads the pattern from `-E <pattern>` and one line from stdin.
fn run() -> Result<bool> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [flag, pattern] = args.as_slice() else {
        bail!("Expected two arguments: -E <pattern>");
    };
    if flag != "-E" {
        bail!("Expected first argument to be '-E'");
    }

    let mut input_line = String::new();
    io::stdin()
        .read_line(&mut input_line)
        .context("failed to read input line")?;

    // Trim the line terminator for correct '$' anchor matching
    let trimmed_len = input_line.trim_end_matches(['\n', '\r']).len();
    input_line.truncate(trimmed_len);

    let program = compile(pattern)?;
    let end = program.find_with(Bytes::from(input_line), &MatchOptions::default())?;
    log::debug!("pattern {pattern:?} -> {end:?}");
    Ok(end.is_some())
}

// Usage: echo <input_text> | grep-backtrack -E <pattern>
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(true) => {
            println!("found");
            process::exit(0)
        }
        Ok(false) => {
            println!("not found");
            process::exit(1)
        }
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1)
        }
    }
}
