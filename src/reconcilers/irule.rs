// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! iRule reconciliation.
//!
//! Rules are compared on content only. The device's query omits rules whose
//! content is empty, so a rule that is listed but missing from the query
//! result exists with empty content; it is modified, never recreated.

use async_trait::async_trait;
use std::slice;
use std::time::Instant;
use tracing::debug;

use super::{apply_actions, finish, ReconcileOutcome, RemoteMutation, RemoteResultExt};
use crate::device::LoadBalancer;
use crate::errors::{ReconcileError, ResourceKind};
use crate::icontrol::types::RuleDefinition;
use crate::icontrol::{Remote, RemoteResult};
use crate::resources::IRuleSpec;

const KIND: ResourceKind = ResourceKind::IRule;

/// Remote mutations on iRules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IRuleAction {
    Create { rule: RuleDefinition },
    Modify { rule: RuleDefinition },
    Delete { name: String },
}

#[async_trait]
impl RemoteMutation for IRuleAction {
    fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Modify { .. } => "modify",
            Self::Delete { .. } => "delete",
        }
    }

    async fn execute(&self, remote: &Remote) -> RemoteResult<()> {
        match self {
            Self::Create { rule } => remote.rules.create(slice::from_ref(rule)).await,
            Self::Modify { rule } => remote.rules.modify(slice::from_ref(rule)).await,
            Self::Delete { name } => remote.rules.delete(slice::from_ref(name)).await,
        }
    }
}

/// Action converging a rule, given its current content (`None` when the rule
/// is not listed at all).
pub(crate) fn plan_irule(name: &str, current: Option<&str>, desired: &str) -> Option<IRuleAction> {
    let rule = RuleDefinition {
        rule_name: name.to_string(),
        rule_definition: desired.to_string(),
    };
    match current {
        None => Some(IRuleAction::Create { rule }),
        Some(content) if content != desired => Some(IRuleAction::Modify { rule }),
        Some(_) => None,
    }
}

/// Content of a listed rule; empty when the query leaves it out.
async fn current_content(
    device: &LoadBalancer,
    name: &str,
) -> Result<Option<String>, ReconcileError> {
    let rules = &device.remote().rules;
    let listed = rules.list().await.during(KIND, name, "list rules")?;
    if !listed.iter().any(|rule| rule == name) {
        return Ok(None);
    }

    let content = rules
        .query(&[name.to_string()])
        .await
        .during(KIND, name, "query rule")?
        .into_iter()
        .find(|rule| rule.rule_name == name)
        .map(|rule| rule.rule_definition)
        .unwrap_or_default();
    Ok(Some(content))
}

/// Converge an iRule to its declaration.
///
/// A bare name resolves against the active folder.
///
/// # Errors
///
/// Returns a contract error if the rule has no content, or an error if a
/// remote call fails.
pub async fn reconcile_irule(
    device: &mut LoadBalancer,
    desired: &IRuleSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = converge(device, desired).await;
    finish(device, started, result)
}

async fn converge(
    device: &mut LoadBalancer,
    desired: &IRuleSpec,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut outcome = ReconcileOutcome::new(KIND, desired.name.as_str());

    let definition = desired
        .definition()
        .map_err(|e| ReconcileError::contract(KIND, desired.name.as_str(), e))?;

    device
        .change_folder_for(&desired.name)
        .await
        .during(KIND, &desired.name, "change folder")?;
    let name = device.qualify(&desired.name);

    let current = current_content(device, &name).await?;
    if let Some(action) = plan_irule(&name, current.as_deref(), definition) {
        apply_actions(device, &[action], &mut outcome).await?;
    }

    Ok(outcome)
}

/// Delete an iRule.
///
/// # Errors
///
/// Returns an error if a remote call fails.
pub async fn delete_irule(
    device: &mut LoadBalancer,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let started = Instant::now();
    let result = remove(device, name).await;
    finish(device, started, result)
}

async fn remove(device: &mut LoadBalancer, name: &str) -> Result<ReconcileOutcome, ReconcileError> {
    let mut outcome = ReconcileOutcome::new(KIND, name);

    device
        .change_folder_for(name)
        .await
        .during(KIND, name, "change folder")?;
    let qualified = device.qualify(name);

    let listed = device
        .remote()
        .rules
        .list()
        .await
        .during(KIND, name, "list rules")?;
    if !listed.contains(&qualified) {
        debug!(device = %device.hostname(), name, "iRule already absent");
        return Ok(outcome);
    }

    apply_actions(device, &[IRuleAction::Delete { name: qualified }], &mut outcome).await?;
    Ok(outcome)
}
