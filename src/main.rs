//! Vanity onion address generator CLI
//!
//! Searches random Ed25519 key pairs until the requested number of
//! addresses matching the pattern has been found and saved.

use std::sync::atomic::Ordering;

use clap::error::ErrorKind;
use clap::Parser;

use onion_vanity::config::Cli;
use onion_vanity::pool::{PrettyDur, SearchPool};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = match cli.validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== Onion Vanity Generator ===");
    println!("Pattern: {} (compiled: {})", config.pattern.source(), config.pattern.anchored());
    if let Some(expected) = config.pattern.expected_attempts() {
        println!("Expected attempts per match: ~{:.2e}", expected);
    }
    println!("Target:  {} address(es)", config.target);
    println!("Workers: {}", config.workers);
    println!("Output:  {}", cli.dst.display());
    println!();

    let pool = SearchPool::start(&config, cli.dst.clone());

    // ctrl-c raises the same stop flag the pool polls; pressing it twice
    // is harmless
    let stop_flag = pool.stop_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        stop_flag.store(true, Ordering::Relaxed);
    })
    .ok();

    println!("Searching... (Press Ctrl+C to stop)\n");
    let summary = pool.run();

    println!();
    if summary.interrupted {
        println!("=== Interrupted ===");
    } else {
        println!("=== Complete! ===");
    }
    println!("Found:          {}/{}", summary.found, summary.target);
    println!("Total attempts: {}", summary.total_attempts);
    println!(
        "Elapsed:        {}",
        PrettyDur(
            chrono::Duration::from_std(summary.elapsed)
                .unwrap_or_else(|_| chrono::Duration::zero())
        )
    );
    let secs = summary.elapsed.as_secs_f64();
    if secs > 0.0 {
        println!(
            "Average speed:  {:.0} attempts/sec",
            summary.total_attempts as f64 / secs
        );
    }
}
