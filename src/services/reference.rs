//! Reference id generation with collision resolution.

use crate::domain::{ReferenceId, SUFFIX_ALPHABET, SUFFIX_LEN};
use crate::errors::{CertforgeError, Result};
use crate::storage::CertificateStore;
use chrono::Datelike;
use rand::Rng;
use tracing::debug;

/// Defensive cap on candidate draws. With 36^5 possible suffixes a
/// collision streak this long means something is wrong with the store,
/// not bad luck.
const MAX_DRAWS: usize = 32;

/// Draws candidate reference ids and resolves collisions against the
/// active store.
#[derive(Debug, Clone)]
pub struct ReferenceIdGenerator {
    year: i32,
}

impl ReferenceIdGenerator {
    /// Generator stamping ids with the current year.
    pub fn new() -> Self {
        Self { year: chrono::Utc::now().year() }
    }

    /// Generator for a fixed year.
    pub fn for_year(year: i32) -> Self {
        Self { year }
    }

    fn draw(&self) -> ReferenceId {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        ReferenceId::compose(self.year, &suffix)
    }

    /// Draw candidates until one is unused in `store`, up to the draw cap.
    pub async fn next_unused(&self, store: &dyn CertificateStore) -> Result<ReferenceId> {
        for attempt in 1..=MAX_DRAWS {
            let candidate = self.draw();

            if store.find_by_reference_id(candidate.as_str()).await?.is_none() {
                return Ok(candidate);
            }

            debug!(
                reference_id = %candidate,
                attempt,
                "Reference id collision, drawing a new candidate"
            );
        }

        Err(CertforgeError::generation_exhausted(MAX_DRAWS))
    }
}

impl Default for ReferenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
