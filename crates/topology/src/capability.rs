//! Capability interfaces for architectures and platforms
//!
//! The engine is policy-free: what replication topology to build comes from
//! an [`Architecture`], and where instances run comes from a [`Platform`].
//! Concrete variants live in the binary crate and are selected at startup;
//! adding a new cloud or replication architecture means adding a new
//! implementation, not a new inheritance layer.

use crate::builder::PlanEntry;
use crate::compat::CompatibilityTable;
use crate::error::Result;
use crate::repos::Channel;
use crate::spec::{ClusterSpec, Location};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// User input driving one configure run
///
/// This is the full option surface the pipeline resolves against; the CLI
/// fills it from arguments and defaults.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub postgres_version: Option<String>,
    pub bdr_version: Option<String>,
    pub postgresql_flavour: String,
    pub failover_manager: String,
    /// User-specified package repositories; always take precedence
    pub repositories: Vec<String>,
    pub bdr_node_group: String,
    pub bdr_database: String,
    pub enable_camo: bool,
    pub enable_pem: bool,
    pub enable_pg_backup_api: bool,
    /// Number of data nodes in the default layout
    pub data_nodes: u32,
    pub regions: Vec<String>,
    pub instance_type: String,
    pub owner: Option<String>,
    pub cluster_bucket: Option<String>,
    /// OS/image label, e.g. "Debian" or a literal image name
    pub image_label: String,
    pub image_version: Option<String>,
    /// Resolve image labels to concrete image ids via the platform
    pub lookup_images: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            postgres_version: None,
            bdr_version: None,
            postgresql_flavour: "postgresql".to_string(),
            failover_manager: "none".to_string(),
            repositories: Vec::new(),
            bdr_node_group: "bdrgroup".to_string(),
            bdr_database: "bdrdb".to_string(),
            enable_camo: false,
            enable_pem: false,
            enable_pg_backup_api: false,
            data_nodes: 3,
            regions: Vec::new(),
            instance_type: "t3.micro".to_string(),
            owner: None,
            cluster_bucket: None,
            image_label: "Debian".to_string(),
            image_version: None,
            lookup_images: false,
        }
    }
}

/// Role-sets driving eligibility checks during augmentation and pairing
#[derive(Debug, Clone)]
pub struct RoleSets {
    pub agent_eligible: BTreeSet<String>,
    pub partner_eligible: BTreeSet<String>,
}

/// A concrete machine image, possibly resolved to a cloud image id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub os: String,
    pub os_family: String,
}

impl ImageRecord {
    /// A record for a literal image name with no catalogue metadata
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
            image_id: None,
            user: None,
            version: None,
            os: String::new(),
            os_family: String::new(),
        }
    }
}

/// Memoized image lookups, keyed by (image name, region)
///
/// Scoped to a single pipeline run: the engine performs at most one
/// external lookup per distinct pair and reuses the result afterwards.
/// There is no cross-run persistence.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<(String, String), ImageRecord>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached record for (name, region), fetching it once if
    /// absent. A failed fetch is not cached; the pipeline aborts anyway.
    pub fn get_or_fetch<F>(&mut self, name: &str, region: &str, fetch: F) -> Result<ImageRecord>
    where
        F: FnOnce() -> Result<ImageRecord>,
    {
        let key = (name.to_string(), region.to_string());
        if let Some(record) = self.entries.get(&key) {
            return Ok(record.clone());
        }
        let record = fetch()?;
        self.entries.insert(key, record.clone());
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replication topology and behavior policy
pub trait Architecture {
    fn name(&self) -> &'static str;

    /// Valid version pairs and default inference maps for this architecture
    fn compatibility_table(&self) -> CompatibilityTable;

    fn candidate_role_sets(&self) -> RoleSets;

    /// Repository channels required by the resolved version and flags
    fn channel_requirements(&self, bdr_version: &str, opts: &ClusterOptions) -> Vec<Channel>;

    /// The instance plan when the caller did not supply one
    fn default_layout(&self, opts: &ClusterOptions, locations: &[Location]) -> Vec<PlanEntry>;

    /// Resolve versions and repositories into cluster vars
    fn update_cluster_vars(&self, opts: &ClusterOptions, spec: &mut ClusterSpec) -> Result<()>;

    /// Augment roles and pair partners over the built instance list
    fn update_instances(&self, opts: &ClusterOptions, spec: &mut ClusterSpec) -> Result<()>;
}

/// Where instances run: regions, zones, and machine images
pub trait Platform {
    fn name(&self) -> &'static str;

    /// Region used when the caller specifies none; empty string selects
    /// single-region mode with no availability zones
    fn default_region(&self) -> &str {
        ""
    }

    fn zones_by_region(&self) -> BTreeMap<String, Vec<String>>;

    /// Validate and normalize the requested regions
    ///
    /// Duplicates are dropped order-preserving; an empty selection falls
    /// back to the platform default.
    fn validate_regions(&self, opts: &ClusterOptions) -> Result<Vec<String>> {
        let mut seen = BTreeSet::new();
        let mut regions: Vec<String> = opts
            .regions
            .iter()
            .filter(|r| seen.insert((*r).clone()))
            .cloned()
            .collect();
        if regions.is_empty() {
            regions.push(self.default_region().to_string());
        }
        Ok(regions)
    }

    /// Resolve an OS/image label to a concrete image record
    ///
    /// Lookups go through `cache` so identical (name, region) pairs are
    /// fetched at most once per run.
    fn resolve_image(
        &self,
        opts: &ClusterOptions,
        region: &str,
        cache: &mut ImageCache,
    ) -> Result<ImageRecord> {
        let _ = (region, cache);
        Ok(ImageRecord::named(&opts.image_label))
    }

    /// Fill cluster tags; existing tags are never overwritten
    fn update_cluster_tags(&self, opts: &ClusterOptions, tags: &mut BTreeMap<String, String>) {
        if let Some(owner) = &opts.owner {
            tags.entry("Owner".to_string()).or_insert_with(|| owner.clone());
        }
    }

    /// Platform-specific settings for the resolved cluster
    fn platform_settings(
        &self,
        opts: &ClusterOptions,
        spec: &ClusterSpec,
        cache: &mut ImageCache,
    ) -> Result<BTreeMap<String, Value>> {
        let _ = (opts, spec, cache);
        Ok(BTreeMap::new())
    }
}
