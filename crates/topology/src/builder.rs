//! Instance list construction
//!
//! Expands a role-indexed location plan into an ordered list of instance
//! records with sequential node ids.

use crate::spec::Instance;
use std::collections::BTreeSet;

/// One desired instance: a name, a role-set, and a location reference
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub name: String,
    pub roles: BTreeSet<String>,
    pub location: String,
}

impl PlanEntry {
    pub fn new(name: &str, roles: &[&str], location: &str) -> Self {
        Self {
            name: name.to_string(),
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
            location: location.to_string(),
        }
    }
}

/// Build instances from a plan, assigning node ids from `starting_node_id`
///
/// Plan order is preserved exactly; identical entries produce distinct
/// instances. Each instance gets its own copy of the role-set so later
/// stages can mutate roles without affecting the plan.
pub fn build(plan: &[PlanEntry], starting_node_id: u32) -> Vec<Instance> {
    plan.iter()
        .enumerate()
        .map(|(i, entry)| {
            Instance::new(
                starting_node_id + i as u32,
                &entry.name,
                entry.roles.clone(),
                &entry.location,
            )
        })
        .collect()
}
