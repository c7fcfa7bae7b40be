//! Search workers
//!
//! Each worker owns the generate → derive → test loop and shares nothing
//! with its siblings except the event channel and the stop flag. All
//! aggregation happens on the receiving side, so the loop needs no locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::keys::KeyPair;
use crate::matcher::Pattern;
use crate::onion;

/// Attempts between stats events, measured on the raw running counter.
pub const STATS_INTERVAL: u64 = 1000;

/// A key pair that passed the pattern, with everything the coordinator
/// needs to persist and report it.
#[derive(Debug, Clone)]
pub struct FoundMatch {
    pub worker_id: usize,
    pub onion_address: String,
    pub keypair: KeyPair,
    /// Attempts accumulated since this worker's previous event.
    pub attempts: u64,
}

/// Messages flowing from workers to the coordinator.
///
/// Every event that carries an attempt count flushes the worker's pending
/// counter, so each candidate is counted exactly once across the stream.
#[derive(Debug)]
pub enum WorkerEvent {
    Match(Box<FoundMatch>),
    Stats { worker_id: usize, attempts: u64 },
    Error { worker_id: usize, message: String },
}

/// One unit of parallel search. Runs until the shared stop flag is set;
/// it has no termination condition of its own.
pub struct SearchWorker {
    id: usize,
    pattern: Pattern,
    event_tx: Sender<WorkerEvent>,
    stop_flag: Arc<AtomicBool>,
}

impl SearchWorker {
    pub fn new(
        id: usize,
        pattern: Pattern,
        event_tx: Sender<WorkerEvent>,
        stop_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            pattern,
            event_tx,
            stop_flag,
        }
    }

    /// The worker loop. Returns when the stop flag is observed or the
    /// coordinator has gone away (channel closed).
    pub fn run(&self) {
        // raw counter drives the stats cadence; pending is what gets
        // flushed into the next emitted event
        let mut raw: u64 = 0;
        let mut pending: u64 = 0;

        while !self.stop_flag.load(Ordering::Relaxed) {
            let pair = match KeyPair::generate() {
                Ok(pair) => pair,
                Err(e) => {
                    // a single generation failure never kills the worker
                    let sent = self.event_tx.send(WorkerEvent::Error {
                        worker_id: self.id,
                        message: e.to_string(),
                    });
                    if sent.is_err() {
                        return;
                    }
                    continue;
                }
            };

            let address = onion::pubkey_to_onion(&pair.public);
            raw += 1;
            pending += 1;

            if self.pattern.is_match(&address) {
                let event = WorkerEvent::Match(Box::new(FoundMatch {
                    worker_id: self.id,
                    onion_address: address,
                    keypair: pair,
                    attempts: pending,
                }));
                pending = 0;
                if self.event_tx.send(event).is_err() {
                    return;
                }
            }

            if raw % STATS_INTERVAL == 0 && pending > 0 {
                let event = WorkerEvent::Stats {
                    worker_id: self.id,
                    attempts: pending,
                };
                pending = 0;
                if self.event_tx.send(event).is_err() {
                    return;
                }
            }
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn spawn_worker(
        pattern: &str,
    ) -> (
        crossbeam_channel::Receiver<WorkerEvent>,
        Arc<AtomicBool>,
        std::thread::JoinHandle<()>,
    ) {
        let pattern = Pattern::compile(pattern).unwrap();
        let (tx, rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = SearchWorker::new(0, pattern, tx, stop.clone());
        let handle = std::thread::spawn(move || worker.run());
        (rx, stop, handle)
    }

    #[test]
    fn test_match_everything_pattern_emits_matches() {
        // `.` matches any first character, so every candidate is a match
        let (rx, stop, handle) = spawn_worker(".");

        let event = rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap();
        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();

        match event {
            WorkerEvent::Match(found) => {
                assert_eq!(found.onion_address.len(), 56);
                assert_eq!(found.attempts, 1);
                assert!(onion::verify_address_matches_key(
                    &found.onion_address,
                    &found.keypair.public,
                ));
            }
            other => panic!("expected a match event, got {:?}", other),
        }
    }

    #[test]
    fn test_attempts_counted_exactly_once() {
        // impossible pattern: only stats events, each flushing the counter
        let (rx, stop, handle) = spawn_worker("^00000000");

        let mut total = 0u64;
        for _ in 0..3 {
            match rx.recv_timeout(std::time::Duration::from_secs(30)).unwrap() {
                WorkerEvent::Stats { attempts, .. } => {
                    assert_eq!(attempts, STATS_INTERVAL);
                    total += attempts;
                }
                other => panic!("expected stats, got {:?}", other),
            }
        }
        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();

        assert_eq!(total, 3 * STATS_INTERVAL);
    }

    #[test]
    fn test_worker_stops_on_flag() {
        let (rx, stop, handle) = spawn_worker("^00000000");
        // wait for the first event so the loop is demonstrably running
        let _ = rx.recv_timeout(std::time::Duration::from_secs(30)).unwrap();
        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }
}
