use std::env;
use std::io;
use std::process;

use anyhow::{bail, Context, Result};
use backtrack_grep::Regex;

struct Args {
    pattern: String,
    only_matching: bool,
}

fn parse_args() -> Result<Args> {
    let mut pattern = None;
    let mut only_matching = false;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-E" => pattern = Some(args.next().context("expected a pattern after '-E'")?),
            "-o" => only_matching = true,
            other => bail!("unexpected argument '{}'", other),
        }
    }
    let pattern = pattern.context("expected first argument to be '-E'")?;
    Ok(Args {
        pattern,
        only_matching,
    })
}

// Returns whether any match was found.
fn run() -> Result<bool> {
    let args = parse_args()?;
    let regex = Regex::new(&args.pattern)
        .with_context(|| format!("invalid pattern '{}'", args.pattern))?;

    let mut input_line = String::new();
    io::stdin()
        .read_line(&mut input_line)
        .context("failed to read input")?;
    let input = input_line.trim_end_matches('\n');

    if !args.only_matching {
        return Ok(regex.is_match(input)?);
    }

    let mut found = false;
    for result in regex.find_iter(input) {
        let result = result?;
        found = true;
        match result.get(input, 0) {
            Some(text) if !text.is_empty() => println!("{}", text),
            _ => {}
        }
    }
    Ok(found)
}

// Usage: echo <input_text> | backtrack-grep -E <pattern> [-o]
fn main() {
    env_logger::init();

    match run() {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(2)
        }
    }
}
