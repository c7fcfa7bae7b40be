//! Search coordination
//!
//! The pool spawns one worker thread per configured slot and then runs a
//! single-consumer loop over the event channel. It is the only owner of
//! [`SearchStats`]; aggregation is a fold over received events, never
//! shared-memory mutation. Workers may overshoot the target by whatever
//! candidates were in flight when the stop flag went up; surplus match
//! events are discarded.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, unbounded, Receiver};

use crate::config::SearchConfig;
use crate::record::MatchRecord;
use crate::worker::{SearchWorker, WorkerEvent};

/// Cadence of the progress line, independent of event arrivals.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Aggregate counters, owned and mutated exclusively by the pool loop.
#[derive(Debug)]
pub struct SearchStats {
    pub total_attempts: u64,
    pub per_worker_attempts: Vec<u64>,
    pub found: usize,
    pub progress_renders: u64,
    pub start: Instant,
}

impl SearchStats {
    fn new(workers: usize) -> Self {
        Self {
            total_attempts: 0,
            per_worker_attempts: vec![0; workers],
            found: 0,
            progress_renders: 0,
            start: Instant::now(),
        }
    }

    fn record_attempts(&mut self, worker_id: usize, attempts: u64) {
        self.total_attempts += attempts;
        if let Some(slot) = self.per_worker_attempts.get_mut(worker_id) {
            *slot += attempts;
        }
    }

    pub fn attempts_per_sec(&self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Final totals handed back to the binary once the run ends.
#[derive(Debug)]
pub struct Summary {
    pub found: usize,
    pub target: usize,
    pub total_attempts: u64,
    pub per_worker_attempts: Vec<u64>,
    pub progress_renders: u64,
    pub elapsed: Duration,
    pub interrupted: bool,
}

/// Owns the worker threads and the receiving half of the event channel.
pub struct SearchPool {
    target: usize,
    output_dir: PathBuf,
    expected_attempts: Option<f64>,
    handles: Vec<JoinHandle<()>>,
    event_rx: Receiver<WorkerEvent>,
    stop_flag: Arc<AtomicBool>,
    stats: SearchStats,
}

impl SearchPool {
    /// Spawn the workers. The search is running as soon as this returns.
    pub fn start(config: &SearchConfig, output_dir: PathBuf) -> Self {
        let (event_tx, event_rx) = unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let handles = (0..config.workers)
            .map(|id| {
                let worker = SearchWorker::new(
                    id,
                    config.pattern.clone(),
                    event_tx.clone(),
                    stop_flag.clone(),
                );
                thread::Builder::new()
                    .name(format!("search-worker-{}", id))
                    .spawn(move || worker.run())
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            target: config.target,
            output_dir,
            expected_attempts: config.pattern.expected_attempts(),
            handles,
            event_rx,
            stop_flag,
            stats: SearchStats::new(config.workers),
        }
    }

    /// Clone of the stop flag, for wiring up a ctrl-c handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Run the aggregation loop until the target is reached or the stop
    /// flag is raised externally, then stop and join every worker.
    ///
    /// The progress tick is its own channel, selected alongside the
    /// event stream: a steady flow of worker events cannot starve it.
    pub fn run(mut self) -> Summary {
        let mut interrupted = false;
        let ticker = tick(PROGRESS_INTERVAL);
        let event_rx = self.event_rx.clone();

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }

            select! {
                recv(event_rx) -> event => match event {
                    Ok(event) => {
                        if self.handle_event(event) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.print_progress();
                }
            }
        }

        self.stop_flag.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }

        Summary {
            found: self.stats.found,
            target: self.target,
            total_attempts: self.stats.total_attempts,
            per_worker_attempts: self.stats.per_worker_attempts.clone(),
            progress_renders: self.stats.progress_renders,
            elapsed: self.stats.start.elapsed(),
            interrupted,
        }
    }

    /// Fold one worker event into the stats. Returns true once the
    /// target has been reached.
    fn handle_event(&mut self, event: WorkerEvent) -> bool {
        match event {
            WorkerEvent::Match(found) => {
                self.stats.record_attempts(found.worker_id, found.attempts);
                if self.stats.found >= self.target {
                    // overshoot from an in-flight candidate
                    return true;
                }
                let record = MatchRecord::from_keypair(&found.keypair);
                match record.save(&self.output_dir) {
                    Ok(path) => {
                        self.stats.found += 1;
                        println!(
                            "FOUND [{}/{}]: {}.onion (worker {})",
                            self.stats.found,
                            self.target,
                            record.onion_address,
                            found.worker_id
                        );
                        println!("  Saved to: {}", path.display());
                    }
                    Err(e) => {
                        // a failed write is not counted and must not
                        // block later matches
                        eprintln!(
                            "Error: could not save record for {}: {}",
                            record.onion_address, e
                        );
                    }
                }
                self.stats.found >= self.target
            }
            WorkerEvent::Stats {
                worker_id,
                attempts,
            } => {
                self.stats.record_attempts(worker_id, attempts);
                false
            }
            WorkerEvent::Error { worker_id, message } => {
                eprintln!("Worker {} error: {}", worker_id, message);
                false
            }
        }
    }

    fn print_progress(&mut self) {
        self.stats.progress_renders += 1;
        let elapsed = PrettyDur(
            chrono::Duration::from_std(self.stats.start.elapsed())
                .unwrap_or_else(|_| chrono::Duration::zero()),
        );
        match self.expected_attempts {
            Some(expected) => println!(
                "Progress: {}/{} found | {} attempts (~{:.1}% of expected {:.2e}) | {:.0}/s | {}",
                self.stats.found,
                self.target,
                self.stats.total_attempts,
                self.stats.total_attempts as f64 / expected * 100.0,
                expected,
                self.stats.attempts_per_sec(),
                elapsed
            ),
            None => println!(
                "Progress: {}/{} found | {} attempts | {:.0}/s | {}",
                self.stats.found,
                self.target,
                self.stats.total_attempts,
                self.stats.attempts_per_sec(),
                elapsed
            ),
        }
    }
}

impl Drop for SearchPool {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Human-friendly duration formatter for progress and summary lines.
pub struct PrettyDur(pub chrono::Duration);

impl std::fmt::Display for PrettyDur {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.num_weeks() >= 52 {
            write!(f, "{} years, ", self.0.num_weeks() / 52)?;
        }
        if self.0.num_weeks() % 52 > 0 {
            write!(f, "{} weeks, ", self.0.num_weeks() % 52)?;
        }
        if self.0.num_days() % 7 > 0 {
            write!(f, "{} days, ", self.0.num_days() % 7)?;
        }
        if self.0.num_hours() % 24 > 0 {
            write!(f, "{} hours, ", self.0.num_hours() % 24)?;
        }
        if self.0.num_minutes() % 60 > 0 {
            write!(f, "{} minutes, ", self.0.num_minutes() % 60)?;
        }
        write!(f, "{} seconds", self.0.num_seconds() % 60)
    }
}
