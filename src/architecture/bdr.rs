//! BDR architecture: N-node multi-master replication
//!
//! Decides which Postgres and BDR versions to install, which repositories
//! and extensions the combination needs, and which instances carry agent
//! roles and CAMO partner links.

use std::collections::BTreeSet;

use serde_yaml::Value;
use topology::augment::{self, AgentPolicy};
use topology::builder::PlanEntry;
use topology::{
    pairing, repos, versions, Architecture, Channel, ClusterOptions, ClusterSpec,
    CompatibilityTable, Location, Result, RoleSets,
};

/// Role added to instances that should run the monitoring agent
const AGENT_ROLE: &str = "pem-agent";
/// Role of the dedicated monitoring server instance
const SERVER_ROLE: &str = "pem-server";
/// Backup instances get an agent too when the backup API is enabled
const BACKUP_ROLE: &str = "barman";

pub struct Bdr;

impl Bdr {
    /// Roles that count as BDR node candidates
    fn candidate_roles() -> BTreeSet<String> {
        ["bdr", "replica", "readonly", "subscriber-only", "witness"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Extensions required by specific BDR versions
    fn extensions_for(bdr_version: &str) -> Vec<String> {
        match bdr_version {
            "3" => vec!["pglogical".to_string()],
            _ => Vec::new(),
        }
    }
}

impl Architecture for Bdr {
    fn name(&self) -> &'static str {
        "BDR"
    }

    fn compatibility_table(&self) -> CompatibilityTable {
        CompatibilityTable::new()
            .with_pair("9.4", "1")
            .with_pair("9.6", "2")
            .with_pair("10", "3")
            .with_pair("11", "3")
            .with_pair("12", "3")
            .with_pair("13", "3")
            .with_pair("14", "4")
            .with_default_bdr("9.4", "1")
            .with_default_bdr("9.6", "2")
            .with_default_bdr("10", "3")
            .with_default_bdr("11", "3")
            .with_default_bdr("12", "3")
            .with_default_bdr("13", "3")
            .with_default_bdr("14", "4")
            .with_default_postgres("1", "9.4")
            .with_default_postgres("2", "9.6")
            .with_default_postgres("3", "13")
            .with_default_postgres("4", "14")
            .with_fallback_bdr("3")
    }

    fn candidate_role_sets(&self) -> RoleSets {
        let partner_eligible = Self::candidate_roles();
        let mut agent_eligible = partner_eligible.clone();
        agent_eligible.insert("primary".to_string());
        RoleSets {
            agent_eligible,
            partner_eligible,
        }
    }

    fn channel_requirements(&self, bdr_version: &str, opts: &ClusterOptions) -> Vec<Channel> {
        let flavour = opts.postgresql_flavour.as_str();
        let mut channels = match bdr_version {
            "2" => vec![Channel::new("/bdr2/", "products/bdr2/release")],
            // BDR 3 repositories are flavour-specific and only apply when
            // the caller hasn't taken over repository selection (empty
            // token: any user-supplied repository covers them).
            "3" => match flavour {
                "pgextended" => vec![Channel::new("", "products/bdr_enterprise_3_7/release")],
                "epas" => vec![Channel::new("", "products/bdr_enterprise_3_7-epas/release")],
                _ => vec![
                    Channel::new("", "products/bdr3_7/release"),
                    Channel::new("", "products/pglogical3_7/release"),
                ],
            },
            "4" => vec![Channel::new("/bdr4/", "products/bdr4/release")],
            "5" => vec![Channel::new("/bdr5/", "products/bdr5/release")],
            _ => Vec::new(),
        };

        if matches!(bdr_version, "4" | "5") && flavour == "pgextended" {
            channels.push(Channel::new("/2ndqpostgres/", "products/2ndqpostgres/release"));
        }
        if opts.failover_manager == "harp" {
            channels.push(Channel::new("/harp/", "products/harp/release"));
        }
        channels
    }

    fn default_layout(&self, opts: &ClusterOptions, locations: &[Location]) -> Vec<PlanEntry> {
        if locations.is_empty() {
            return Vec::new();
        }
        // Data nodes are spread round-robin over the locations.
        (0..opts.data_nodes)
            .map(|i| {
                let location = &locations[i as usize % locations.len()];
                PlanEntry::new(&format!("node-{}", i + 1), &["bdr"], &location.name)
            })
            .collect()
    }

    fn update_cluster_vars(&self, opts: &ClusterOptions, spec: &mut ClusterSpec) -> Result<()> {
        let table = self.compatibility_table();
        let (postgres, bdr) = versions::resolve(
            opts.postgres_version.as_deref(),
            opts.bdr_version.as_deref(),
            &table,
        )?;

        // BDR 1 only exists as a patched Postgres, so it forces the flavour.
        let flavour = if bdr == "1" {
            "postgresql-bdr".to_string()
        } else {
            opts.postgresql_flavour.clone()
        };

        let channels = self.channel_requirements(&bdr, opts);
        let repositories = repos::resolve(&channels, &opts.repositories);
        let extensions = Self::extensions_for(&bdr);

        spec.set_var("postgres_coredump_filter", "0xff");
        spec.set_var("postgres_version", postgres);
        spec.set_var("bdr_version", bdr);
        spec.set_var("postgresql_flavour", flavour);
        spec.set_var("bdr_node_group", opts.bdr_node_group.as_str());
        spec.set_var("bdr_database", opts.bdr_database.as_str());
        if opts.failover_manager != "none" {
            spec.set_var("failover_manager", opts.failover_manager.as_str());
        }
        if !repositories.is_empty() {
            spec.set_var(
                "tpa_2q_repositories",
                Value::Sequence(repositories.into_iter().map(Value::from).collect()),
            );
        }
        if !extensions.is_empty() {
            spec.set_var(
                "extra_postgres_extensions",
                Value::Sequence(extensions.into_iter().map(Value::from).collect()),
            );
        }
        Ok(())
    }

    fn update_instances(&self, opts: &ClusterOptions, spec: &mut ClusterSpec) -> Result<()> {
        let sets = self.candidate_role_sets();

        if opts.enable_pem {
            let policy = AgentPolicy {
                agent_role: AGENT_ROLE.to_string(),
                eligible: sets.agent_eligible,
                backup_role: BACKUP_ROLE.to_string(),
            };
            augment::add_agent_roles(&mut spec.instances, &policy, opts.enable_pg_backup_api);

            let location = spec
                .locations
                .first()
                .map(|l| l.name.clone())
                .unwrap_or_default();
            augment::add_dedicated_server(&mut spec.instances, "pemserver", SERVER_ROLE, &location)?;
        }

        if opts.enable_camo {
            let pairs = pairing::pair(&mut spec.instances, &sets.partner_eligible);
            log::debug!("paired {pairs} CAMO partner pairs");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::Instance;

    fn opts() -> ClusterOptions {
        ClusterOptions::default()
    }

    fn repo_names(channels: &[Channel]) -> Vec<&str> {
        channels.iter().map(|c| c.repository.as_str()).collect()
    }

    #[test]
    fn test_channels_per_version() {
        assert!(Bdr.channel_requirements("1", &opts()).is_empty());
        assert_eq!(
            repo_names(&Bdr.channel_requirements("2", &opts())),
            vec!["products/bdr2/release"]
        );
        assert_eq!(
            repo_names(&Bdr.channel_requirements("3", &opts())),
            vec!["products/bdr3_7/release", "products/pglogical3_7/release"]
        );
        assert_eq!(
            repo_names(&Bdr.channel_requirements("4", &opts())),
            vec!["products/bdr4/release"]
        );
    }

    #[test]
    fn test_channels_for_flavours_and_harp() {
        let pgextended = ClusterOptions {
            postgresql_flavour: "pgextended".to_string(),
            ..opts()
        };
        assert_eq!(
            repo_names(&Bdr.channel_requirements("3", &pgextended)),
            vec!["products/bdr_enterprise_3_7/release"]
        );
        assert_eq!(
            repo_names(&Bdr.channel_requirements("4", &pgextended)),
            vec!["products/bdr4/release", "products/2ndqpostgres/release"]
        );

        let harp = ClusterOptions {
            failover_manager: "harp".to_string(),
            ..opts()
        };
        assert_eq!(
            repo_names(&Bdr.channel_requirements("4", &harp)),
            vec!["products/bdr4/release", "products/harp/release"]
        );
    }

    #[test]
    fn test_cluster_vars_defaults() {
        let mut spec = ClusterSpec::new("test", "BDR");
        Bdr.update_cluster_vars(&opts(), &mut spec).unwrap();

        assert_eq!(spec.var("postgres_version"), Some(&Value::from("13")));
        assert_eq!(spec.var("bdr_version"), Some(&Value::from("3")));
        assert_eq!(
            spec.var("postgresql_flavour"),
            Some(&Value::from("postgresql"))
        );
        assert_eq!(
            spec.var("extra_postgres_extensions"),
            Some(&Value::Sequence(vec![Value::from("pglogical")]))
        );
        let repos = spec.var("tpa_2q_repositories").unwrap();
        assert_eq!(
            repos,
            &Value::Sequence(vec![
                Value::from("products/bdr3_7/release"),
                Value::from("products/pglogical3_7/release"),
            ])
        );
    }

    #[test]
    fn test_bdr1_forces_flavour() {
        let args = ClusterOptions {
            bdr_version: Some("1".to_string()),
            ..opts()
        };
        let mut spec = ClusterSpec::new("test", "BDR");
        Bdr.update_cluster_vars(&args, &mut spec).unwrap();
        assert_eq!(
            spec.var("postgresql_flavour"),
            Some(&Value::from("postgresql-bdr"))
        );
        assert_eq!(spec.var("postgres_version"), Some(&Value::from("9.4")));
    }

    #[test]
    fn test_user_repositories_take_precedence() {
        let args = ClusterOptions {
            bdr_version: Some("4".to_string()),
            postgres_version: Some("14".to_string()),
            repositories: vec!["products/bdr4/staging".to_string()],
            ..opts()
        };
        let mut spec = ClusterSpec::new("test", "BDR");
        Bdr.update_cluster_vars(&args, &mut spec).unwrap();
        assert_eq!(
            spec.var("tpa_2q_repositories"),
            Some(&Value::Sequence(vec![Value::from("products/bdr4/staging")]))
        );
    }

    #[test]
    fn test_default_layout_round_robin() {
        let locations = vec![Location::new("first"), Location::new("second")];
        let args = ClusterOptions {
            data_nodes: 3,
            ..opts()
        };
        let plan = Bdr.default_layout(&args, &locations);
        let placed: Vec<&str> = plan.iter().map(|p| p.location.as_str()).collect();
        assert_eq!(placed, vec!["first", "second", "first"]);
    }

    #[test]
    fn test_default_layout_with_no_locations_is_empty() {
        assert!(Bdr.default_layout(&opts(), &[]).is_empty());
    }

    #[test]
    fn test_enable_pem_adds_agents_and_server() {
        let mut spec = ClusterSpec::new("test", "BDR");
        spec.locations.push(Location::new("first"));
        spec.instances = vec![
            Instance::new(1, "n1", Bdr::candidate_roles(), "first"),
            Instance::new(2, "backup", BTreeSet::from([BACKUP_ROLE.to_string()]), "first"),
        ];
        let args = ClusterOptions {
            enable_pem: true,
            enable_pg_backup_api: true,
            ..opts()
        };
        Bdr.update_instances(&args, &mut spec).unwrap();

        assert!(spec.instances[0].has_role(AGENT_ROLE));
        assert!(spec.instances[1].has_role(AGENT_ROLE));
        let server = spec.instances.last().unwrap();
        assert_eq!(server.name, "pemserver");
        assert_eq!(server.node, 3);
        assert_eq!(server.location, "first");
    }

    #[test]
    fn test_enable_camo_pairs_data_nodes() {
        let mut spec = ClusterSpec::new("test", "BDR");
        spec.instances = (1..=4)
            .map(|i| {
                Instance::new(
                    i,
                    &format!("n{i}"),
                    BTreeSet::from(["bdr".to_string()]),
                    "first",
                )
            })
            .collect();
        let args = ClusterOptions {
            enable_camo: true,
            ..opts()
        };
        Bdr.update_instances(&args, &mut spec).unwrap();
        assert_eq!(spec.instances[0].camo_partner(), Some("n2"));
        assert_eq!(spec.instances[3].camo_partner(), Some("n3"));
    }
}
