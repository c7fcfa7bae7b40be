//! Record verifier CLI
//!
//! Re-derives addresses and keys from a saved match record, discrete
//! flags, or interactively entered fields, and reports whether they
//! agree. A verification mismatch is a report, not a process error.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;

use onion_vanity::record::MatchRecord;
use onion_vanity::verify::{verify, VerifyInput};

/// Tor v3 onion key record verifier
#[derive(Parser, Debug)]
#[command(name = "ovcheck", version, about)]
struct Cli {
    /// Match record file produced by the generator
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Onion address (with or without .onion suffix)
    #[arg(long)]
    onion: Option<String>,

    /// Public key, 64 hex characters
    #[arg(long)]
    public_key: Option<String>,

    /// Seed, 64 hex characters
    #[arg(long)]
    seed: Option<String>,

    /// Expanded secret key, 128 hex characters
    #[arg(long)]
    expanded: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let record = match &cli.file {
        Some(path) => match MatchRecord::load(path) {
            Ok(record) => Some(record),
            Err(e) => {
                eprintln!("Error: could not read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    // discrete flags override record fields; anything still missing is
    // prompted for, and an empty answer leaves the field absent
    let interactive = record.is_none();
    let onion = field(cli.onion, record.as_ref().map(|r| r.onion_address.clone()), "Onion address", interactive);
    let public_key = field(cli.public_key, record.as_ref().map(|r| r.public_key.clone()), "Public key (hex)", interactive);
    let seed = field(cli.seed, record.as_ref().map(|r| r.seed.clone()), "Seed (hex)", interactive);
    let expanded = field(cli.expanded, record.as_ref().map(|r| r.expanded_secret_key.clone()), "Expanded secret key (hex)", interactive);

    let input = match VerifyInput::parse(
        onion.as_deref(),
        public_key.as_deref(),
        seed.as_deref(),
        expanded.as_deref(),
    ) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let report = verify(&input);
    println!("{}", report);
}

fn field(
    flag: Option<String>,
    from_file: Option<String>,
    label: &str,
    interactive: bool,
) -> Option<String> {
    flag.or(from_file).or_else(|| {
        if interactive {
            prompt(label)
        } else {
            None
        }
    })
}

fn prompt(label: &str) -> Option<String> {
    print!("{} (blank to skip): ", label);
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}
