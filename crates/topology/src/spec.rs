//! Cluster specification - the aggregate the pipeline resolves
//!
//! A [`ClusterSpec`] is created from partial user input, passes through each
//! pipeline stage exactly once (each stage takes the whole aggregate by
//! exclusive reference), and is handed to downstream rendering as a terminal
//! artifact serialized to `config.yml`.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Instance var that records the CAMO failover partner of an instance
pub const CAMO_PARTNER_VAR: &str = "bdr_node_camo_partner";

/// A logical placement slot, later resolved to a region/availability-zone
///
/// Identity is positional: the allocator assigns regions round-robin over
/// the location sequence, so the index of a location is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub az: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

impl Location {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            region: None,
            az: None,
            subnet: None,
        }
    }
}

/// One machine in the cluster
///
/// Node ids are strictly increasing in creation order and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub node: u32,
    #[serde(rename = "Name")]
    pub name: String,
    pub role: BTreeSet<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(node: u32, name: &str, roles: BTreeSet<String>, location: &str) -> Self {
        Self {
            node,
            name: name.to_string(),
            role: roles,
            location: location.to_string(),
            vars: BTreeMap::new(),
        }
    }

    /// Add a role; inserting a role already present is a no-op
    pub fn add_role(&mut self, role: &str) {
        self.role.insert(role.to_string());
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.contains(role)
    }

    /// Whether this instance carries any role from `candidates`
    pub fn roles_intersect(&self, candidates: &BTreeSet<String>) -> bool {
        self.role.iter().any(|r| candidates.contains(r))
    }

    /// The name of this instance's CAMO partner, if one has been assigned
    pub fn camo_partner(&self) -> Option<&str> {
        self.vars.get(CAMO_PARTNER_VAR).and_then(Value::as_str)
    }

    /// Record `partner` as this instance's CAMO partner
    ///
    /// The pairer never calls this on an instance that already has a
    /// partner; the link is immutable once set.
    pub fn set_camo_partner(&mut self, partner: &str) {
        self.vars
            .insert(CAMO_PARTNER_VAR.to_string(), Value::from(partner));
    }
}

/// The root aggregate: everything needed to provision one cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub architecture: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cluster_vars: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platform_settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl ClusterSpec {
    pub fn new(cluster_name: &str, architecture: &str) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            architecture: architecture.to_string(),
            ..Self::default()
        }
    }

    /// Set a cluster var; stages run in fixed order, so last writer wins
    pub fn set_var(&mut self, key: &str, value: impl Into<Value>) {
        self.cluster_vars.insert(key.to_string(), value.into());
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.cluster_vars.get(key)
    }
}
