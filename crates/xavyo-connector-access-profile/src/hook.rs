//! Before-update reconciliation for Access Profile entitlements.
//!
//! The host asks to remove entitlement values from an Access Profile. The API
//! only accepts full replacement of the entitlement list and rejects a list
//! that would end up empty, so the hook rewrites the request into a single
//! JSON Patch operation:
//!
//! - `replace /entitlements` with what remains after the removal, or
//! - `replace /enabled` with `"false"` when nothing would remain.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::AccessProfileApi;
use crate::model::{
    AttributeChange, AttributeChangeOp, ChangeValue, EntitlementRef, JsonPatchOperation,
    StdAccountUpdateInput, ENTITLEMENTS_ATTRIBUTE,
};

/// Outcome of reconciling one update request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Current entitlements could not be read; the request is left as is.
    Unchanged,
    /// The single corrective operation to send to the API.
    Patch(JsonPatchOperation),
}

/// Every identifier named by a `Remove` change, in request order.
#[must_use]
pub fn removal_ids(changes: &[AttributeChange]) -> Vec<String> {
    changes
        .iter()
        .filter(|change| change.op == AttributeChangeOp::Remove)
        .flat_map(|change| change.value.iter().map(str::to_string))
        .collect()
}

/// `current` minus every entitlement whose id is in `removed`, order kept.
#[must_use]
pub fn remaining_entitlements(
    current: Vec<EntitlementRef>,
    removed: &[String],
) -> Vec<EntitlementRef> {
    let removed: HashSet<&str> = removed.iter().map(String::as_str).collect();
    current
        .into_iter()
        .filter(|entitlement| !removed.contains(entitlement.id.as_str()))
        .collect()
}

/// The patch operation for the remaining entitlements.
///
/// An Access Profile cannot be left without entitlements, so an empty
/// remainder disables the profile instead.
pub fn corrective_action(
    remaining: &[EntitlementRef],
) -> Result<JsonPatchOperation, serde_json::Error> {
    if remaining.is_empty() {
        Ok(JsonPatchOperation::disable())
    } else {
        JsonPatchOperation::replace_entitlements(remaining)
    }
}

/// Hook run by the host before an account update on an Access Profile.
///
/// Holds only shared immutable state and can serve concurrent invocations.
#[derive(Clone)]
pub struct AccessProfileUpdateHook {
    api: Arc<dyn AccessProfileApi>,
}

impl std::fmt::Debug for AccessProfileUpdateHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessProfileUpdateHook").finish_non_exhaustive()
    }
}

impl AccessProfileUpdateHook {
    pub fn new(api: Arc<dyn AccessProfileApi>) -> Self {
        Self { api }
    }

    /// Compute the corrective operation for an update request.
    pub async fn reconcile(&self, input: &StdAccountUpdateInput) -> Reconciliation {
        let removed = removal_ids(&input.changes);
        debug!(
            identity = %input.identity,
            removed = removed.len(),
            "Collected entitlements to remove"
        );

        let Some(current) = self.api.fetch_entitlements(&input.identity).await else {
            error!(
                identity = %input.identity,
                "No current entitlements found for Access Profile {}", input.identity
            );
            return Reconciliation::Unchanged;
        };

        let current_count = current.len();
        let remaining = remaining_entitlements(current, &removed);
        debug!(
            identity = %input.identity,
            current = current_count,
            remaining = remaining.len(),
            "Computed remaining entitlements"
        );

        match corrective_action(&remaining) {
            Ok(action) => Reconciliation::Patch(action),
            Err(e) => {
                error!(identity = %input.identity, error = %e, "Failed to build patch operation");
                Reconciliation::Unchanged
            }
        }
    }

    /// Run the hook: returns the rewritten update request, or `input`
    /// unchanged when the current entitlements could not be read.
    ///
    /// The rewritten request carries exactly one `Remove` change on
    /// `entitlements` whose value is the JSON Patch body, serialized as a
    /// one-element array, for the host to send verbatim.
    pub async fn before_account_update(
        &self,
        input: StdAccountUpdateInput,
    ) -> StdAccountUpdateInput {
        info!(
            identity = %input.identity,
            changes = input.changes.len(),
            "Running before account update for Access Profile {}", input.identity
        );

        let action = match self.reconcile(&input).await {
            Reconciliation::Unchanged => return input,
            Reconciliation::Patch(action) => action,
        };

        let body = match serde_json::to_string(&[&action]) {
            Ok(body) => body,
            Err(e) => {
                error!(identity = %input.identity, error = %e, "Failed to serialize patch body");
                return input;
            }
        };

        info!(
            identity = %input.identity,
            path = %action.path,
            "Rewrote account update into a single patch operation"
        );

        StdAccountUpdateInput {
            changes: vec![AttributeChange {
                op: AttributeChangeOp::Remove,
                attribute: ENTITLEMENTS_ATTRIBUTE.to_string(),
                value: ChangeValue::Single(body),
            }],
            ..input
        }
    }
}
