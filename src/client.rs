//! Flag evaluation client.
//!
//! Composes the store, condition matching, rollout bucketing, and variant
//! selection into one decision pipeline. Every step is a pure function of
//! (definition, context, seed), so a decision made here is reproducible on
//! any machine sharing the seed.

use std::sync::Arc;

use tracing::trace;

use crate::error::FlagResult;
use crate::flag::{EvaluationContext, EvaluationResult, FlagDefinition, Rollout};
use crate::hash;
use crate::store::{FlagStore, InMemoryStore};

/// Seed mixed into every hash input when none is configured.
pub const DEFAULT_SEED: &str = "vexil";

/// Bucketing attribute used when neither the flag nor the client names one.
pub const DEFAULT_ROLLOUT_ATTRIBUTE: &str = "userId";

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Flag definition backend.
    pub store: Arc<dyn FlagStore>,

    /// Seed mixed into every hash input. Deployments sharing a seed bucket
    /// identically; distinct seeds diverge while each stays internally
    /// consistent.
    pub seed: String,

    /// Default bucketing attribute for rollouts and variant assignment.
    pub default_rollout_attribute: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            seed: DEFAULT_SEED.to_string(),
            default_rollout_attribute: DEFAULT_ROLLOUT_ATTRIBUTE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create the default configuration: fresh in-memory store, default seed,
    /// `"userId"` bucketing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `store` as the flag backend.
    pub fn with_store(mut self, store: Arc<dyn FlagStore>) -> Self {
        self.store = store;
        self
    }

    /// Set the bucketing seed.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Set the default bucketing attribute.
    pub fn with_rollout_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.default_rollout_attribute = attribute.into();
        self
    }
}

/// Feature flag evaluation client.
///
/// # Examples
///
/// ```
/// use vexil::{EvaluationContext, FeatureClient, FlagDefinition, Rollout};
///
/// let client = FeatureClient::default();
/// client
///     .upsert_flag("new-ui", FlagDefinition::on().with_rollout(Rollout::new(25.0)))
///     .unwrap();
///
/// let context = EvaluationContext::new().with_user_id("user-123");
/// let result = client.evaluate("new-ui", &context);
/// assert_eq!(result.enabled, client.is_enabled("new-ui", &context));
/// ```
#[derive(Clone)]
pub struct FeatureClient {
    store: Arc<dyn FlagStore>,
    seed: String,
    default_rollout_attribute: String,
}

impl Default for FeatureClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl FeatureClient {
    /// Create a client from `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            store: config.store,
            seed: config.seed,
            default_rollout_attribute: config.default_rollout_attribute,
        }
    }

    /// The underlying flag store.
    pub fn store(&self) -> &Arc<dyn FlagStore> {
        &self.store
    }

    /// Insert or replace a flag definition. Delegates to the store.
    pub fn upsert_flag(&self, key: &str, flag: FlagDefinition) -> FlagResult<()> {
        self.store.upsert_flag(key, flag)
    }

    /// Delete a flag definition. Delegates to the store.
    pub fn delete_flag(&self, key: &str) -> FlagResult<()> {
        self.store.delete_flag(key)
    }

    /// Evaluate `key` for `context`.
    ///
    /// Total: always returns a result, never an error. Malformed flag data
    /// degrades to disabled or no-variant. The pipeline short-circuits at the
    /// first disabling step: missing definition, master switch off, failed
    /// condition, outside the rollout.
    pub fn evaluate(&self, key: &str, context: &EvaluationContext) -> EvaluationResult {
        let Some(flag) = self.store.get_flag(key) else {
            trace!(flag = key, "Flag not in store");
            return EvaluationResult::disabled(None);
        };

        if !flag.enabled {
            return EvaluationResult::disabled(Some(flag));
        }

        if !flag.conditions_pass(context) {
            trace!(flag = key, "Conditions failed");
            return EvaluationResult::disabled(Some(flag));
        }

        if let Some(rollout) = &flag.rollout
            && !self.is_in_rollout(key, rollout, context)
        {
            trace!(flag = key, "Outside rollout");
            return EvaluationResult::disabled(Some(flag));
        }

        let variant = self.select_variant(key, &flag, context);
        trace!(flag = key, variant = ?variant, "Flag enabled");

        EvaluationResult {
            enabled: true,
            variant,
            flag: Some(flag),
        }
    }

    /// Whether `key` is enabled for `context`.
    pub fn is_enabled(&self, key: &str, context: &EvaluationContext) -> bool {
        self.evaluate(key, context).enabled
    }

    /// The variant assigned to `context` for `key`, if any.
    pub fn get_variant(&self, key: &str, context: &EvaluationContext) -> Option<String> {
        self.evaluate(key, context).variant
    }

    /// Whether `context` falls inside `rollout`'s enabled percentage.
    ///
    /// Deterministic per (seed, flag key, identifier), and monotone in the
    /// percentage: raising it never drops a previously included subject. At
    /// 100 percent bucketing is skipped entirely; no identifier is needed.
    pub fn is_in_rollout(
        &self,
        flag_key: &str,
        rollout: &Rollout,
        context: &EvaluationContext,
    ) -> bool {
        let percentage = rollout.clamped_percentage();
        if percentage <= 0.0 {
            return false;
        }
        if percentage >= 100.0 {
            return true;
        }

        let attribute = rollout
            .attribute
            .as_deref()
            .unwrap_or(&self.default_rollout_attribute);
        let identifier = context.identifier(attribute);
        let input = format!("{}:{}:{}", self.seed, flag_key, identifier);

        hash::bucket(&input, 100)
            .map(|bucket| f64::from(bucket) < percentage)
            .unwrap_or(false)
    }

    /// Deterministically assign `context` to one of `flag`'s weighted
    /// variants.
    ///
    /// Returns `None` when the flag declares no variants or their clamped
    /// weights sum to zero. The bucketing attribute is resolved from the
    /// rollout config (or the client default) whether or not the rollout gate
    /// itself was consulted.
    pub fn select_variant(
        &self,
        flag_key: &str,
        flag: &FlagDefinition,
        context: &EvaluationContext,
    ) -> Option<String> {
        if flag.variants.is_empty() {
            return None;
        }
        let total: f64 = flag.variants.iter().map(|v| v.clamped_weight()).sum();
        if total <= 0.0 {
            return None;
        }

        let attribute = flag
            .rollout
            .as_ref()
            .and_then(|r| r.attribute.as_deref())
            .unwrap_or(&self.default_rollout_attribute);
        let identifier = context.identifier(attribute);
        let input = format!("{}:variant:{}:{}", self.seed, flag_key, identifier);

        // f64 modulo of the raw hash keeps [0, total) semantics for
        // fractional weight totals; for integer totals it equals the integer
        // bucket.
        let point = f64::from(hash::fnv1a_32(&input)) % total;

        let mut cumulative = 0.0;
        for variant in &flag.variants {
            cumulative += variant.clamped_weight();
            if point < cumulative {
                return Some(variant.name.clone());
            }
        }

        // Floating point can leave `point` a hair past the final boundary.
        flag.variants.last().map(|v| v.name.clone())
    }
}
