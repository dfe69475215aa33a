//! Permission filtering of search results
//!
//! Authorization policy lives outside this crate. The search core only asks an
//! injected [`PermissionEvaluator`] whether a principal may perform an action on
//! a component. An evaluator error counts as "not allowed".

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Component, Principal, RequestedAction};
use crate::Result;

pub trait PermissionEvaluator: Send + Sync {
    fn is_action_allowed(
        &self,
        component: &Component,
        principal: &Principal,
        action: RequestedAction,
    ) -> Result<bool>;
}

impl<F> PermissionEvaluator for F
where
    F: Fn(&Component, &Principal, RequestedAction) -> Result<bool> + Send + Sync,
{
    fn is_action_allowed(
        &self,
        component: &Component,
        principal: &Principal,
        action: RequestedAction,
    ) -> Result<bool> {
        self(component, principal, action)
    }
}

#[derive(Clone)]
pub struct AccessFilter {
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl AccessFilter {
    pub fn new(evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Fail-closed decision for one action.
    pub fn is_allowed(
        &self,
        component: &Component,
        principal: &Principal,
        action: RequestedAction,
    ) -> bool {
        match self
            .evaluator
            .is_action_allowed(component, principal, action)
        {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!(
                    component_id = %component.id(),
                    principal = %principal.email,
                    action = %action,
                    error = %e,
                    "Permission check failed, denying"
                );
                false
            }
        }
    }

    /// Drop every component the principal may not read. Order is preserved.
    pub fn retain_readable(
        &self,
        mut components: Vec<Component>,
        principal: &Principal,
    ) -> Vec<Component> {
        let before = components.len();
        components.retain(|c| self.is_allowed(c, principal, RequestedAction::Read));
        if components.len() < before {
            tracing::debug!(
                principal = %principal.email,
                dropped = before - components.len(),
                "Removed unreadable components from results"
            );
        }
        components
    }

    /// Attach the principal's per-action flags to every component.
    pub fn annotate(&self, components: &mut [Component], principal: &Principal) {
        for component in components.iter_mut() {
            let permissions: BTreeMap<RequestedAction, bool> = RequestedAction::ALL
                .iter()
                .map(|&action| (action, self.is_allowed(&*component, principal, action)))
                .collect();
            component.permissions = Some(permissions);
        }
    }
}
