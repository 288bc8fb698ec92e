//! Deterministic model → connection resolution.
//!
//! Precedence, in order:
//! 1. a sole connection owns every model;
//! 2. otherwise the first connection (declaration order) with any matcher
//!    accepting the name wins, first-found rather than best-found;
//! 3. otherwise the first connection flagged `default`;
//! 4. otherwise the model is unresolved.
//!
//! This module only answers the question. Recording the assignment is the
//! caller's job (see the runtime's connection registry).

use std::fmt;

use serde::Serialize;

use crate::types::Route;

/// Which precedence rule picked the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionRule {
    Sole,
    Matched,
    Default,
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionRule::Sole => write!(f, "sole"),
            ResolutionRule::Matched => write!(f, "matched"),
            ResolutionRule::Default => write!(f, "default"),
        }
    }
}

/// The owner of a model: an index into the routes passed to [`find_owner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub rule: ResolutionRule,
}

/// Find the connection that owns `model` among `routes`, given in
/// declaration order.
pub fn find_owner<R: AsRef<Route>>(model: &str, routes: &[R]) -> Option<Resolution> {
    if routes.len() == 1 {
        return Some(Resolution {
            index: 0,
            rule: ResolutionRule::Sole,
        });
    }

    let mut fallback = None;
    for (index, route) in routes.iter().enumerate() {
        let route = route.as_ref();
        if route.is_default && fallback.is_none() {
            fallback = Some(index);
        }
        if route.matchers.iter().any(|m| m.matches(model)) {
            return Some(Resolution {
                index,
                rule: ResolutionRule::Matched,
            });
        }
    }

    fallback.map(|index| Resolution {
        index,
        rule: ResolutionRule::Default,
    })
}
