//! Connector customizer: the registration point the host runtime calls into.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::AccessProfileClient;
use crate::config::AccessProfileConfig;
use crate::error::AccessProfileResult;
use crate::hook::AccessProfileUpdateHook;
use crate::model::StdAccountUpdateInput;

/// Invocation context supplied by the host runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookContext {
    /// Host-assigned invocation id.
    #[serde(default)]
    pub id: Option<String>,
    /// Free-form attributes passed through by the host.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

/// A handler run before the host applies a standard account update.
///
/// Handlers never fail: the worst case is returning `input` unchanged.
#[async_trait]
pub trait AccountUpdateHook: Send + Sync {
    async fn before_account_update(
        &self,
        context: &HookContext,
        input: StdAccountUpdateInput,
    ) -> StdAccountUpdateInput;
}

#[async_trait]
impl AccountUpdateHook for AccessProfileUpdateHook {
    async fn before_account_update(
        &self,
        _context: &HookContext,
        input: StdAccountUpdateInput,
    ) -> StdAccountUpdateInput {
        AccessProfileUpdateHook::before_account_update(self, input).await
    }
}

/// Registry of lifecycle handlers exposed to the host.
#[derive(Clone, Default)]
pub struct ConnectorCustomizer {
    before_std_account_update: Option<Arc<dyn AccountUpdateHook>>,
}

impl std::fmt::Debug for ConnectorCustomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorCustomizer")
            .field(
                "before_std_account_update",
                &self.before_std_account_update.is_some(),
            )
            .finish()
    }
}

impl ConnectorCustomizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler run before a standard account update.
    #[must_use]
    pub fn before_std_account_update(mut self, hook: Arc<dyn AccountUpdateHook>) -> Self {
        self.before_std_account_update = Some(hook);
        self
    }

    /// Whether a before-update handler is registered.
    #[must_use]
    pub fn has_before_std_account_update(&self) -> bool {
        self.before_std_account_update.is_some()
    }

    /// Entry point for the host: run the registered handler, or return the
    /// input unchanged when none is registered.
    pub async fn run_before_std_account_update(
        &self,
        context: &HookContext,
        input: StdAccountUpdateInput,
    ) -> StdAccountUpdateInput {
        match &self.before_std_account_update {
            Some(hook) => hook.before_account_update(context, input).await,
            None => {
                debug!(identity = %input.identity, "No before account update handler registered");
                input
            }
        }
    }
}

/// Build the customizer for Access Profile sources: one client built from
/// `config`, shared by the registered before-update hook.
pub fn connector_customizer(config: &AccessProfileConfig) -> AccessProfileResult<ConnectorCustomizer> {
    let client = AccessProfileClient::new(config)?;
    let hook = AccessProfileUpdateHook::new(Arc::new(client));
    Ok(ConnectorCustomizer::new().before_std_account_update(Arc::new(hook)))
}
