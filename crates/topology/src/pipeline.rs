//! The topology derivation pipeline
//!
//! Stages run strictly in sequence over one exclusively-owned
//! [`ClusterSpec`]; each stage completes fully before the next begins, so
//! no locking is needed. Every stage validates its preconditions before
//! mutating, and a failure aborts the remaining stages with the stage name
//! attached to the error.

use crate::allocator;
use crate::builder;
use crate::capability::{Architecture, ClusterOptions, ImageCache, Platform};
use crate::error::{Error, Result};
use crate::spec::ClusterSpec;

/// Run the full derivation pipeline over `spec`
///
/// Order: validate regions, allocate locations, resolve cluster vars
/// (versions and repositories), build instances, augment roles and pair
/// partners, then assemble tags and platform settings (including image
/// resolution, memoized per (name, region) pair).
pub fn run(
    arch: &dyn Architecture,
    platform: &dyn Platform,
    opts: &ClusterOptions,
    mut spec: ClusterSpec,
) -> Result<ClusterSpec> {
    let regions = platform
        .validate_regions(opts)
        .map_err(|e| e.with_stage("validate regions"))?;
    log::debug!("regions: {regions:?}");

    let subnets: Vec<String> = (0..spec.locations.len())
        .map(|i| format!("10.33.{i}.0/24"))
        .collect();
    allocator::allocate(
        &mut spec.locations,
        &regions,
        &platform.zones_by_region(),
        &subnets,
    )
    .map_err(|e| e.with_stage("allocate locations"))?;

    arch.update_cluster_vars(opts, &mut spec)
        .map_err(|e| e.with_stage("resolve cluster vars"))?;

    // A caller-supplied instance list is kept as-is; re-running the
    // pipeline over a resolved spec does not rebuild it.
    if spec.instances.is_empty() {
        if spec.locations.is_empty() {
            return Err(Error::NoLocations.with_stage("build instances"));
        }
        let plan = arch.default_layout(opts, &spec.locations);
        spec.instances = builder::build(&plan, 1);
        log::debug!("built {} instances", spec.instances.len());
    }

    arch.update_instances(opts, &mut spec)
        .map_err(|e| e.with_stage("update instances"))?;

    platform.update_cluster_tags(opts, &mut spec.cluster_tags);

    let mut cache = ImageCache::new();
    let settings = platform
        .platform_settings(opts, &spec, &mut cache)
        .map_err(|e| e.with_stage("platform settings"))?;
    spec.platform_settings.extend(settings);

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{self, AgentPolicy};
    use crate::builder::PlanEntry;
    use crate::capability::RoleSets;
    use crate::compat::CompatibilityTable;
    use crate::pairing;
    use crate::repos::{self, Channel};
    use crate::spec::Location;
    use crate::Error;
    use std::collections::{BTreeMap, BTreeSet};

    struct TinyArch;

    impl TinyArch {
        fn role_set() -> BTreeSet<String> {
            BTreeSet::from(["data".to_string()])
        }
    }

    impl Architecture for TinyArch {
        fn name(&self) -> &'static str {
            "tiny"
        }

        fn compatibility_table(&self) -> CompatibilityTable {
            CompatibilityTable::new()
                .with_pair("14", "4")
                .with_default_bdr("14", "4")
                .with_default_postgres("4", "14")
                .with_fallback_bdr("4")
        }

        fn candidate_role_sets(&self) -> RoleSets {
            RoleSets {
                agent_eligible: Self::role_set(),
                partner_eligible: Self::role_set(),
            }
        }

        fn channel_requirements(&self, _bdr: &str, _opts: &ClusterOptions) -> Vec<Channel> {
            vec![Channel::new("/tiny/", "products/tiny/release")]
        }

        fn default_layout(
            &self,
            opts: &ClusterOptions,
            locations: &[Location],
        ) -> Vec<PlanEntry> {
            (0..opts.data_nodes)
                .map(|i| {
                    let loc = &locations[i as usize % locations.len()];
                    PlanEntry::new(&format!("node-{}", i + 1), &["data"], &loc.name)
                })
                .collect()
        }

        fn update_cluster_vars(
            &self,
            opts: &ClusterOptions,
            spec: &mut ClusterSpec,
        ) -> Result<()> {
            let table = self.compatibility_table();
            let (pg, bdr) = crate::versions::resolve(
                opts.postgres_version.as_deref(),
                opts.bdr_version.as_deref(),
                &table,
            )?;
            let channels = self.channel_requirements(&bdr, opts);
            let repositories = repos::resolve(&channels, &opts.repositories);
            spec.set_var("postgres_version", pg);
            spec.set_var("bdr_version", bdr);
            spec.set_var(
                "repositories",
                serde_yaml::Value::Sequence(
                    repositories.into_iter().map(serde_yaml::Value::from).collect(),
                ),
            );
            Ok(())
        }

        fn update_instances(&self, opts: &ClusterOptions, spec: &mut ClusterSpec) -> Result<()> {
            let sets = self.candidate_role_sets();
            if opts.enable_pem {
                let policy = AgentPolicy {
                    agent_role: "agent".to_string(),
                    eligible: sets.agent_eligible,
                    backup_role: "backup".to_string(),
                };
                augment::add_agent_roles(&mut spec.instances, &policy, false);
            }
            if opts.enable_camo {
                pairing::pair(&mut spec.instances, &sets.partner_eligible);
            }
            Ok(())
        }
    }

    struct TinyPlatform;

    impl Platform for TinyPlatform {
        fn name(&self) -> &'static str {
            "tiny"
        }

        fn default_region(&self) -> &str {
            "eu-west-1"
        }

        fn zones_by_region(&self) -> BTreeMap<String, Vec<String>> {
            let mut m = BTreeMap::new();
            m.insert("eu-west-1".to_string(), vec!["a".into(), "b".into()]);
            m
        }
    }

    fn base_spec(locations: usize) -> ClusterSpec {
        let mut spec = ClusterSpec::new("test", "tiny");
        for i in 0..locations {
            spec.locations.push(Location::new(&format!("loc-{i}")));
        }
        spec
    }

    #[test]
    fn test_full_pipeline() {
        let opts = ClusterOptions {
            enable_camo: true,
            enable_pem: true,
            data_nodes: 5,
            owner: Some("ops".to_string()),
            ..ClusterOptions::default()
        };
        let spec = run(&TinyArch, &TinyPlatform, &opts, base_spec(2)).unwrap();

        assert_eq!(spec.instances.len(), 5);
        assert_eq!(spec.locations[0].az.as_deref(), Some("eu-west-1a"));
        assert_eq!(spec.cluster_tags.get("Owner").map(String::as_str), Some("ops"));
        assert!(spec.instances.iter().all(|i| i.has_role("agent")));
        // 5 eligible instances: two pairs, one left unpaired.
        let unpaired = spec
            .instances
            .iter()
            .filter(|i| i.camo_partner().is_none())
            .count();
        assert_eq!(unpaired, 1);
    }

    #[test]
    fn test_stage_identity_attached_to_errors() {
        let opts = ClusterOptions {
            postgres_version: Some("13".to_string()),
            ..ClusterOptions::default()
        };
        let err = run(&TinyArch, &TinyPlatform, &opts, base_spec(1)).unwrap_err();
        match err {
            Error::Stage { stage, source } => {
                assert_eq!(stage, "resolve cluster vars");
                assert!(matches!(*source, Error::UnsupportedCombination { .. }));
            }
            other => panic!("expected staged error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_locations_fails_instead_of_building() {
        let err = run(&TinyArch, &TinyPlatform, &ClusterOptions::default(), base_spec(0))
            .unwrap_err();
        match err {
            Error::Stage { stage, source } => {
                assert_eq!(stage, "build instances");
                assert!(matches!(*source, Error::NoLocations));
            }
            other => panic!("expected staged error, got {other:?}"),
        }
    }

    #[test]
    fn test_rerun_over_resolved_spec_keeps_instances() {
        let opts = ClusterOptions::default();
        let first = run(&TinyArch, &TinyPlatform, &opts, base_spec(1)).unwrap();
        let second = run(&TinyArch, &TinyPlatform, &opts, first.clone()).unwrap();
        assert_eq!(first.instances, second.instances);
    }
}
