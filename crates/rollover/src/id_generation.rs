//! Hash-based cycle identifiers.
//!
//! IDs look like `cycle-k3f9x2ab`: SHA-256 over the milestone name, the
//! capture instant and a nonce, base36-encoded and truncated. A candidate
//! that is already known (e.g. present in the history log) is retried with
//! the next nonce.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rollover::id_generation::CycleIdGenerator;
//!
//! let mut generator = CycleIdGenerator::new("cycle");
//! let id = generator.generate("14 KW 23", Utc::now()).unwrap();
//! assert!(id.as_str().starts_with("cycle-"));
//! ```

use crate::domain::CycleId;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const HASH_LENGTH: usize = 8;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce produced an ID that is already in use
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of candidates tried
        attempts: u32,
    },
}

/// Generator for collision-free cycle IDs.
#[derive(Debug, Clone)]
pub struct CycleIdGenerator {
    prefix: String,
    existing_ids: HashSet<String>,
}

impl CycleIdGenerator {
    /// Create a generator for IDs of the form `{prefix}-{hash}`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID so it is never generated again.
    pub fn register_id(&mut self, id: &CycleId) {
        self.existing_ids.insert(id.as_str().to_string());
    }

    /// Generate a new unique ID and register it.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no nonce yields
    /// an unused ID.
    pub fn generate(
        &mut self,
        milestone: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<CycleId, IdGenerationError> {
        for nonce in 0..MAX_NONCE {
            let candidate = format!("{}-{}", self.prefix, hash_content(milestone, captured_at, nonce));
            if self.existing_ids.insert(candidate.clone()) {
                return Ok(CycleId::new(candidate));
            }
            debug!(nonce, candidate = %candidate, "Cycle ID collision, retrying");
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }
}

fn hash_content(milestone: &str, captured_at: DateTime<Utc>, nonce: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(milestone.as_bytes());
    hasher.update(b"|");
    hasher.update(
        captured_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| captured_at.timestamp_millis())
            .to_le_bytes(),
    );
    hasher.update(b"|");
    hasher.update(nonce.to_le_bytes());
    let digest = hasher.finalize();

    let mut value = u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]);

    let mut encoded = Vec::with_capacity(HASH_LENGTH);
    for _ in 0..HASH_LENGTH {
        encoded.push(BASE36_CHARS[(value % 36) as usize]);
        value /= 36;
    }
    encoded.reverse();
    String::from_utf8_lossy(&encoded).into_owned()
}
