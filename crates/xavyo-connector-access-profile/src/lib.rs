//! Access Profile entitlement reconciliation for xavyo connectors
//!
//! An account update that removes entitlements from an Access Profile cannot
//! be sent to the Access Profiles API as is: the API only replaces the whole
//! entitlement list and refuses to leave a profile with none. This crate
//! provides the before-update hook that reads the current list, computes what
//! remains, and rewrites the update into one JSON Patch operation (replace the
//! list, or disable the profile when nothing remains).
//!
//! # Features
//!
//! - `OAuth2` client credentials authentication
//! - Retry with exponential backoff on `429 Too Many Requests`
//! - Failure-absorbing client boundary: lookups that fail leave the update untouched
//!
//! # Example
//!
//! ```no_run
//! use xavyo_connector_access_profile::{
//!     connector_customizer, AccessProfileConfig, AttributeChange, HookContext,
//!     StdAccountUpdateInput,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AccessProfileConfig::from_env()?;
//! let customizer = connector_customizer(&config)?;
//!
//! let input = StdAccountUpdateInput {
//!     identity: "2c9180835d2e5168015d32f890ca1581".to_string(),
//!     key: None,
//!     changes: vec![AttributeChange::remove("entitlements", "2c9180867624cbd7017642d8c8c81f67")],
//! };
//! let rewritten = customizer
//!     .run_before_std_account_update(&HookContext::default(), input)
//!     .await;
//! # let _ = rewritten;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod customizer;
pub mod error;
pub mod hook;
pub mod logging;
pub mod model;
pub mod retry;

pub use client::{AccessProfileApi, AccessProfileClient};
pub use config::{AccessProfileConfig, ConfigError};
pub use customizer::{connector_customizer, AccountUpdateHook, ConnectorCustomizer, HookContext};
pub use error::{AccessProfileError, AccessProfileResult};
pub use hook::{
    corrective_action, remaining_entitlements, removal_ids, AccessProfileUpdateHook,
    Reconciliation,
};
pub use model::{
    AccessProfile, AttributeChange, AttributeChangeOp, ChangeValue, EntitlementRef, JsonPatchOp,
    JsonPatchOperation, StdAccountUpdateInput,
};
pub use retry::RetryPolicy;
