#![forbid(unsafe_code)]

use std::env;
use std::io::{self, Read};

use aletheia_tools::turn_cli::{execute_turn_command, mvp_pipeline};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args[0] != "turn" {
        return Err("usage: aletheia turn < request.json".to_string());
    }

    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| e.to_string())?;
    if raw.trim().is_empty() {
        return Err("usage: aletheia turn < request.json (stdin was empty)".to_string());
    }

    let mut pipeline = mvp_pipeline();
    let output = execute_turn_command(&mut pipeline, &raw)?;
    println!("{output}");
    Ok(())
}
