//! Deterministic feature flags for Rust.
//!
//! Flag evaluation with attribute targeting, percentage-based gradual
//! rollout, and weighted A/B variants, all bucketed by a stable hash: the
//! same seed, flag key, and identifying attribute produce the same decision
//! in every process, on every machine, forever.
//!
//! # Features
//!
//! - 🚀 **Feature Flags** - toggle features per request
//! - 🎯 **Targeting Conditions** - attribute-based access restriction
//! - 🎲 **Gradual Rollout** - stable percentage bucketing
//! - 📊 **A/B Testing** - weighted variant assignment
//! - 💾 **Pluggable Stores** - in-memory and file-backed out of the box
//!
//! # Quick Start
//!
//! ```
//! use vexil::*;
//!
//! let client = FeatureClient::default();
//! client
//!     .upsert_flag("new-ui", FlagDefinition::on().with_rollout(Rollout::new(25.0)))
//!     .unwrap();
//!
//! let context = EvaluationContext::new().with_user_id("user-123");
//! if client.is_enabled("new-ui", &context) {
//!     // Show new UI
//! }
//! ```
//!
//! # Targeting Conditions
//!
//! ```
//! use vexil::*;
//!
//! let client = FeatureClient::default();
//! client
//!     .upsert_flag(
//!         "pro-dashboard",
//!         FlagDefinition::on().with_condition(Condition::new("plan", Operator::Eq, "pro")),
//!     )
//!     .unwrap();
//!
//! let pro = EvaluationContext::new().with_attribute("plan", "pro");
//! assert!(client.is_enabled("pro-dashboard", &pro));
//! ```
//!
//! # A/B Testing
//!
//! ```
//! use vexil::*;
//!
//! let client = FeatureClient::default();
//! client
//!     .upsert_flag(
//!         "button-color",
//!         FlagDefinition::on()
//!             .with_variant("control", 50.0)
//!             .with_variant("blue", 25.0)
//!             .with_variant("green", 25.0),
//!     )
//!     .unwrap();
//!
//! let context = EvaluationContext::new().with_user_id("user-123");
//! let variant = client.get_variant("button-color", &context);
//! assert!(variant.is_some());
//! // The same user gets the same variant on every call.
//! assert_eq!(variant, client.get_variant("button-color", &context));
//! ```
//!
//! # Persistence
//!
//! Any backend implementing [`FlagStore`] plugs into the client. The crate
//! ships an [`InMemoryStore`] and a [`FileStore`] that keeps the whole flag
//! mapping in one JSON file, treating missing or corrupt data as an empty
//! flag set rather than an error.

pub mod client;
pub mod error;
pub mod flag;
pub mod hash;
pub mod store;

pub use client::{ClientConfig, DEFAULT_ROLLOUT_ATTRIBUTE, DEFAULT_SEED, FeatureClient};
pub use error::{FlagError, FlagResult};
pub use flag::{
    Condition, EvaluationContext, EvaluationResult, FlagDefinition, Operator, Rollout, Variant,
};
pub use hash::bucket;
pub use store::{FileStore, FlagStore, InMemoryStore};
