//! Tor v3 vanity onion address generator
//!
//! The library splits into pure derivation code and the search engine
//! built on top of it:
//!
//! - `onion`: base32 codec and v3 address checksum/assembly
//! - `keys`: Ed25519 key generation and seed expansion
//! - `matcher`: anchored regex predicate over candidate addresses
//! - `worker` / `pool`: parallel search loop and single-consumer
//!   coordination
//! - `record`: persisted JSON match records
//! - `verify`: cross-checking of previously generated records

pub mod config;
pub mod keys;
pub mod matcher;
pub mod onion;
pub mod pool;
pub mod record;
pub mod verify;
pub mod worker;

pub use config::{Cli, ConfigError, SearchConfig};
pub use keys::{derive_public_key, expand_secret_key, KeyError, KeyPair};
pub use matcher::{Pattern, PatternError};
pub use onion::{pubkey_to_onion, verify_address_matches_key, CodecError};
pub use pool::{SearchPool, Summary};
pub use record::MatchRecord;
pub use verify::{verify, Check, VerifyError, VerifyInput, VerifyReport};
pub use worker::{FoundMatch, SearchWorker, WorkerEvent};
