//! Record verification
//!
//! Re-derives key material from whatever subset of fields the caller
//! supplies and cross-checks it against the rest. Input is validated
//! strictly before any derivation runs; the checks themselves cannot
//! fail, only disagree.

use thiserror::Error;

use crate::keys::{expand_secret_key, KeyPair};
use crate::onion::{self, ADDRESS_LEN};
use crate::record::MatchRecord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerifyError {
    #[error("onion address must be 56 characters of [a-z2-7], got {0:?}")]
    BadAddress(String),

    #[error("{field} must be {expected} hex characters")]
    BadHexLength { field: &'static str, expected: usize },

    #[error("{field} is not valid hex")]
    BadHex { field: &'static str },

    #[error("nothing to verify: no fields were supplied")]
    NoFields,
}

/// Outcome of one independent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Ok,
    Mismatch,
    /// The inputs required for this check were not supplied.
    Absent,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::Ok => write!(f, "OK"),
            Check::Mismatch => write!(f, "MISMATCH"),
            Check::Absent => write!(f, "-"),
        }
    }
}

/// Validated, normalized verification inputs.
#[derive(Debug, Clone, Default)]
pub struct VerifyInput {
    pub onion: Option<String>,
    pub public_key: Option<[u8; 32]>,
    pub seed: Option<[u8; 32]>,
    pub expanded: Option<[u8; 64]>,
}

impl VerifyInput {
    /// Parse raw field strings. Empty or missing strings mean "absent";
    /// anything else must be exactly the expected shape.
    pub fn parse(
        onion: Option<&str>,
        public_key: Option<&str>,
        seed: Option<&str>,
        expanded: Option<&str>,
    ) -> Result<Self, VerifyError> {
        let input = Self {
            onion: onion.and_then(non_empty).map(parse_onion).transpose()?,
            public_key: public_key
                .and_then(non_empty)
                .map(|s| parse_hex::<32>("public key", s))
                .transpose()?,
            seed: seed
                .and_then(non_empty)
                .map(|s| parse_hex::<32>("seed", s))
                .transpose()?,
            expanded: expanded
                .and_then(non_empty)
                .map(|s| parse_hex::<64>("expanded secret key", s))
                .transpose()?,
        };
        if input.onion.is_none()
            && input.public_key.is_none()
            && input.seed.is_none()
            && input.expanded.is_none()
        {
            return Err(VerifyError::NoFields);
        }
        Ok(input)
    }

    pub fn from_record(record: &MatchRecord) -> Result<Self, VerifyError> {
        Self::parse(
            Some(&record.onion_address),
            Some(&record.public_key),
            Some(&record.seed),
            Some(&record.expanded_secret_key),
        )
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_onion(s: &str) -> Result<String, VerifyError> {
    let lower = s.to_lowercase();
    // strip one suffix at most; "x.onion.onion" is not an address
    let body = lower.strip_suffix(".onion").unwrap_or(&lower);
    if body.len() != ADDRESS_LEN || !body.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7')) {
        return Err(VerifyError::BadAddress(s.to_string()));
    }
    Ok(body.to_string())
}

fn parse_hex<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N], VerifyError> {
    let s = s.to_lowercase();
    if s.len() != N * 2 {
        return Err(VerifyError::BadHexLength {
            field,
            expected: N * 2,
        });
    }
    let bytes = hex::decode(&s).map_err(|_| VerifyError::BadHex { field })?;
    Ok(bytes.try_into().expect("length checked above"))
}

/// The three independent checks over one input set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyReport {
    /// onion address re-derived from the public key
    pub address_key: Check,
    /// public key re-derived from the seed
    pub seed_key: Check,
    /// expanded secret key re-derived from the seed
    pub seed_expanded: Check,
}

impl VerifyReport {
    /// OK only if at least one check ran and every check that ran passed.
    pub fn overall_ok(&self) -> bool {
        let checks = [self.address_key, self.seed_key, self.seed_expanded];
        checks.iter().any(|c| *c != Check::Absent)
            && checks.iter().all(|c| *c != Check::Mismatch)
    }
}

impl std::fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Onion ↔ Public Key:          {}", self.address_key)?;
        writeln!(f, "Seed ↔ Public Key:           {}", self.seed_key)?;
        writeln!(f, "Seed → Expanded Secret Key:  {}", self.seed_expanded)?;
        write!(
            f,
            "Result: {}",
            if self.overall_ok() { "OK" } else { "FAIL" }
        )
    }
}

/// Run every check the supplied fields allow.
pub fn verify(input: &VerifyInput) -> VerifyReport {
    let address_key = match (&input.onion, &input.public_key) {
        (Some(onion), Some(pubkey)) => {
            if onion::verify_address_matches_key(onion, pubkey) {
                Check::Ok
            } else {
                Check::Mismatch
            }
        }
        _ => Check::Absent,
    };

    let seed_key = match (&input.seed, &input.public_key) {
        (Some(seed), Some(pubkey)) => {
            if KeyPair::from_seed(*seed).public == *pubkey {
                Check::Ok
            } else {
                Check::Mismatch
            }
        }
        _ => Check::Absent,
    };

    let seed_expanded = match &input.seed {
        Some(seed) => match &input.expanded {
            Some(expanded) => {
                if expand_secret_key(seed) == *expanded {
                    Check::Ok
                } else {
                    Check::Mismatch
                }
            }
            // derivation ran and nothing contradicts it
            None => Check::Ok,
        },
        None => Check::Absent,
    };

    VerifyReport {
        address_key,
        seed_key,
        seed_expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MatchRecord {
        MatchRecord::from_keypair(&KeyPair::from_seed([3u8; 32]))
    }

    #[test]
    fn test_full_record_all_ok() {
        let input = VerifyInput::from_record(&record()).unwrap();
        let report = verify(&input);
        assert_eq!(report.address_key, Check::Ok);
        assert_eq!(report.seed_key, Check::Ok);
        assert_eq!(report.seed_expanded, Check::Ok);
        assert!(report.overall_ok());
    }

    #[test]
    fn test_flipped_public_key_digit_fails() {
        let mut rec = record();
        let mut chars: Vec<char> = rec.public_key.chars().collect();
        chars[0] = if chars[0] == '0' { '1' } else { '0' };
        rec.public_key = chars.into_iter().collect();

        let input = VerifyInput::from_record(&rec).unwrap();
        let report = verify(&input);
        assert_eq!(report.address_key, Check::Mismatch);
        assert!(!report.overall_ok());
    }

    #[test]
    fn test_seed_only_is_vacuously_ok() {
        let rec = record();
        let input = VerifyInput::parse(None, None, Some(&rec.seed), None).unwrap();
        let report = verify(&input);
        assert_eq!(report.address_key, Check::Absent);
        assert_eq!(report.seed_key, Check::Absent);
        assert_eq!(report.seed_expanded, Check::Ok);
        assert!(report.overall_ok());
    }

    #[test]
    fn test_wrong_expanded_key_fails() {
        let rec = record();
        let wrong = "ab".repeat(64);
        let input = VerifyInput::parse(None, None, Some(&rec.seed), Some(&wrong)).unwrap();
        assert_eq!(verify(&input).seed_expanded, Check::Mismatch);
    }

    #[test]
    fn test_address_length_rejected_before_derivation() {
        let rec = record();
        let short = &rec.onion_address[..55];
        let long = format!("{}a", rec.onion_address);
        assert!(matches!(
            VerifyInput::parse(Some(short), None, None, None),
            Err(VerifyError::BadAddress(_))
        ));
        assert!(matches!(
            VerifyInput::parse(Some(&long), None, None, None),
            Err(VerifyError::BadAddress(_))
        ));
    }

    #[test]
    fn test_doubled_suffix_rejected() {
        let rec = record();
        let doubled = format!("{}.onion.onion", rec.onion_address);
        assert!(matches!(
            VerifyInput::parse(Some(&doubled), None, None, None),
            Err(VerifyError::BadAddress(_))
        ));
        // a single suffix still normalizes
        let single = format!("{}.onion", rec.onion_address);
        assert!(VerifyInput::parse(Some(&single), None, None, None).is_ok());
    }

    #[test]
    fn test_hex_validation() {
        assert!(matches!(
            VerifyInput::parse(None, Some("abcd"), None, None),
            Err(VerifyError::BadHexLength { field: "public key", expected: 64 })
        ));
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            VerifyInput::parse(None, Some(&not_hex), None, None),
            Err(VerifyError::BadHex { field: "public key" })
        ));
    }

    #[test]
    fn test_no_fields_rejected() {
        assert_eq!(
            VerifyInput::parse(None, Some(""), None, None).unwrap_err(),
            VerifyError::NoFields
        );
    }

    #[test]
    fn test_onion_suffix_and_case_normalized() {
        let rec = record();
        let fancy = format!("{}.ONION", rec.onion_address.to_uppercase());
        let input = VerifyInput::parse(
            Some(&fancy),
            Some(&rec.public_key),
            None,
            None,
        )
        .unwrap();
        assert_eq!(verify(&input).address_key, Check::Ok);
    }
}
