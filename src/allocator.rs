use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::LinkRecord;
use crate::shortcode::ShortCode;
use crate::storage::{LinkStore, StorageError};
use crate::validation::{validate_url, InvalidUrl};

/// Upper bound on insert attempts for one allocation.
pub const MAX_ATTEMPTS: u32 = 10;

/// Source of candidate short codes.
///
/// Generators never talk to storage; uniqueness is settled by the insert.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> ShortCode;
}

/// Uniform random codes from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> ShortCode {
        ShortCode::random(&mut rand::rng())
    }
}

#[derive(Debug, Error)]
pub enum AllocateError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),
    #[error("could not find a free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

/// Outcome of a successful allocation.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub record: LinkRecord,
    /// False when the URL had already been shortened and the existing code was reused.
    pub created: bool,
}

impl Allocation {
    pub fn short_code(&self) -> &str {
        &self.record.short_code
    }
}

/// Hands out short codes for URLs, reusing the existing code for a URL seen before.
pub struct CodeAllocator {
    store: Arc<dyn LinkStore>,
    generator: Box<dyn CodeGenerator>,
    max_attempts: u32,
}

impl CodeAllocator {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self::with_generator(store, RandomCodeGenerator)
    }

    pub fn with_generator(store: Arc<dyn LinkStore>, generator: impl CodeGenerator + 'static) -> Self {
        Self {
            store,
            generator: Box::new(generator),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn store(&self) -> &Arc<dyn LinkStore> {
        &self.store
    }

    /// Returns the code for `url`, minting and persisting a new one if needed.
    ///
    /// The pre-insert lookup only saves work for repeat submissions. Code
    /// uniqueness itself rests on the table's unique constraint: a
    /// `DuplicateCode` from the insert triggers a fresh draw, up to
    /// [`MAX_ATTEMPTS`] inserts in total. Concurrent first-time callers with
    /// the same URL may each insert a row; they then converge on the oldest.
    pub async fn allocate(&self, url: &str) -> Result<Allocation, AllocateError> {
        let url = url.trim();
        validate_url(url)?;

        if let Some(record) = self.store.find_by_url(url).await.map_err(AllocateError::Storage)? {
            info!(short_code = %record.short_code, url, "URL already shortened");
            return Ok(Allocation {
                record,
                created: false,
            });
        }

        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();

            match self.store.create(url, candidate.as_str()).await {
                Ok(record) => {
                    info!(short_code = %record.short_code, url, attempt, "created short URL");
                    return self.settle(url, record).await;
                }
                Err(StorageError::DuplicateCode) => {
                    debug!(short_code = %candidate, attempt, "short code collision, retrying");
                }
                Err(e) => return Err(AllocateError::Storage(e)),
            }
        }

        error!(
            url,
            attempts = self.max_attempts,
            "short code allocation exhausted; keyspace saturated or storage misbehaving"
        );
        Err(AllocateError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Resolves a race between concurrent first-time submissions of `url`.
    ///
    /// Every racer re-reads the URL after its own insert and adopts the oldest
    /// row, so they all hand back the same code.
    async fn settle(&self, url: &str, inserted: LinkRecord) -> Result<Allocation, AllocateError> {
        let oldest = self.store.find_by_url(url).await.map_err(AllocateError::Storage)?;
        match oldest {
            Some(winner) if winner.id != inserted.id => {
                info!(
                    short_code = %winner.short_code,
                    orphaned = %inserted.short_code,
                    url,
                    "lost same-URL race, reusing earlier code"
                );
                Ok(Allocation {
                    record: winner,
                    created: false,
                })
            }
            _ => Ok(Allocation {
                record: inserted,
                created: true,
            }),
        }
    }
}
