//! Role augmentation
//!
//! Adds synthesized roles and instances after the base topology is built:
//! monitoring agents on eligible instances, and an optional dedicated
//! server instance appended at the end.

use crate::error::{Error, Result};
use crate::spec::Instance;
use std::collections::BTreeSet;

/// Which instances receive the monitoring agent role
#[derive(Debug, Clone)]
pub struct AgentPolicy {
    /// Role added to eligible instances, e.g. `pem-agent`
    pub agent_role: String,
    /// Instances carrying any of these roles are eligible
    pub eligible: BTreeSet<String>,
    /// Instances carrying this role also get the agent when the backup
    /// API is enabled, independent of the eligibility set
    pub backup_role: String,
}

/// Add the agent role to every eligible instance
///
/// Role addition uses set semantics, so re-running over an already
/// augmented list changes nothing.
pub fn add_agent_roles(instances: &mut [Instance], policy: &AgentPolicy, backup_api: bool) {
    for instance in instances.iter_mut() {
        if instance.roles_intersect(&policy.eligible) {
            instance.add_role(&policy.agent_role);
        }
        if backup_api && instance.has_role(&policy.backup_role) {
            instance.add_role(&policy.agent_role);
        }
    }
}

/// Append exactly one dedicated server instance
///
/// The new instance takes the next unused node id, read from the last
/// instance in the list, and is placed in the cluster's first location.
/// Must run after all other instances exist; an empty list is an invalid
/// precondition and fails before any mutation.
pub fn add_dedicated_server(
    instances: &mut Vec<Instance>,
    name: &str,
    role: &str,
    location: &str,
) -> Result<()> {
    let last = instances
        .last()
        .ok_or(Error::EmptyTopology("dedicated server placement"))?;
    let node = last.node + 1;
    instances.push(Instance::new(
        node,
        name,
        BTreeSet::from([role.to_string()]),
        location,
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn policy() -> AgentPolicy {
        AgentPolicy {
            agent_role: "pem-agent".to_string(),
            eligible: roles(&["bdr", "replica", "witness", "primary"]),
            backup_role: "barman".to_string(),
        }
    }

    #[test]
    fn test_eligible_instances_gain_agent_role() {
        let mut instances = vec![
            Instance::new(1, "n1", roles(&["bdr"]), "a"),
            Instance::new(2, "n2", roles(&["barman"]), "a"),
        ];
        add_agent_roles(&mut instances, &policy(), false);
        assert!(instances[0].has_role("pem-agent"));
        assert!(!instances[1].has_role("pem-agent"));
    }

    #[test]
    fn test_backup_role_gains_agent_with_backup_api() {
        let mut instances = vec![Instance::new(1, "backup", roles(&["barman"]), "a")];
        add_agent_roles(&mut instances, &policy(), true);
        assert!(instances[0].has_role("pem-agent"));
    }

    #[test]
    fn test_augment_is_idempotent() {
        let mut instances = vec![Instance::new(1, "n1", roles(&["bdr"]), "a")];
        add_agent_roles(&mut instances, &policy(), false);
        let snapshot = instances.clone();
        add_agent_roles(&mut instances, &policy(), false);
        assert_eq!(instances, snapshot);
    }

    #[test]
    fn test_dedicated_server_takes_next_node_id() {
        let mut instances = vec![
            Instance::new(1, "n1", roles(&["bdr"]), "a"),
            Instance::new(7, "n2", roles(&["bdr"]), "b"),
        ];
        add_dedicated_server(&mut instances, "pemserver", "pem-server", "a").unwrap();
        let server = instances.last().unwrap();
        assert_eq!(server.node, 8);
        assert_eq!(server.name, "pemserver");
        assert_eq!(server.location, "a");
        assert!(server.has_role("pem-server"));
    }

    #[test]
    fn test_dedicated_server_requires_existing_instances() {
        let mut instances: Vec<Instance> = Vec::new();
        let err = add_dedicated_server(&mut instances, "pemserver", "pem-server", "a").unwrap_err();
        assert!(matches!(err, Error::EmptyTopology(_)));
        assert!(instances.is_empty());
    }
}
