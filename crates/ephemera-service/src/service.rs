use async_trait::async_trait;
use ephemera_core::{
    ContentValidator, ExpiryPolicy, Paste, PasteError, PasteId, PasteReceipt, PasteStats,
    Pastebin, Repository, StorageError,
};
use ephemera_generator::Generator;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// How many identifiers are tried before a create gives up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Tunables for [`PasteService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    #[builder(default)]
    pub validator: ContentValidator,
    #[builder(default)]
    pub expiry: ExpiryPolicy,
    /// Values below one are treated as one.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Pastebin` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - Content validation
/// - Expiry key resolution
/// - Identifier allocation, retrying when the store reports a collision
#[derive(Debug, Clone)]
pub struct PasteService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    config: ServiceConfig,
}

impl<R: Repository, G: Generator> PasteService<R, G> {
    /// Creates a service with the default validator, expiry policy and retry bound.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_config(repository, generator, ServiceConfig::default())
    }

    pub fn with_config(repository: R, generator: G, config: ServiceConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            config,
        }
    }

    fn max_attempts(&self) -> usize {
        self.config.max_attempts.max(1)
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Pastebin for PasteService<R, G> {
    async fn create_paste(&self, content: &str, expiry_key: &str) -> Result<PasteReceipt, PasteError> {
        self.config.validator.validate(content)?;

        let expiry = self.config.expiry.resolve(expiry_key);
        if expiry.key != expiry_key {
            debug!(
                requested = expiry_key,
                using = expiry.key,
                "unknown expiry key, using default"
            );
        }

        let attempts = self.max_attempts();
        for attempt in 1..=attempts {
            let id = self.generator.generate();
            match self.repository.insert(&id, content, expiry.duration).await {
                Ok(receipt) => {
                    info!(
                        id = %receipt.id,
                        expiry = expiry.key,
                        bytes = content.len(),
                        "paste created"
                    );
                    return Ok(receipt);
                }
                Err(StorageError::Conflict(_)) => {
                    warn!(attempt, id = %id, "paste id collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(attempts, "no unique paste id available, giving up");
        Err(PasteError::CollisionExhausted { attempts })
    }

    async fn get_paste(&self, id: &str) -> Result<Paste, PasteError> {
        let id = PasteId::parse(id, self.generator.id_length())?;

        self.repository
            .get(&id)
            .await?
            .ok_or(PasteError::NotFound)
    }

    async fn stats(&self) -> Result<PasteStats, PasteError> {
        Ok(self.repository.stats().await?)
    }

    fn expiry_policy(&self) -> &ExpiryPolicy {
        &self.config.expiry
    }
}
