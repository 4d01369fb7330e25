//! `pgforge configure`
//!
//! Resolves CLI arguments into [`topology::ClusterOptions`], runs the
//! derivation pipeline for the selected architecture and platform, and
//! writes the result to `<cluster-dir>/config.yml`.

use anyhow::{anyhow, Context as _, Result};
use serde_yaml::Value;
use topology::{pipeline, ClusterOptions, ClusterSpec, Location};

use crate::cli::ConfigureArgs;
use crate::{architecture, config, platform, ui, Context};

pub fn run(ctx: &Context, args: ConfigureArgs) -> Result<()> {
    let arch = architecture::by_name(&args.architecture).ok_or_else(|| {
        anyhow!(
            "unknown architecture {:?} (expected one of: {})",
            args.architecture,
            architecture::names().join(", ")
        )
    })?;
    let platform = platform::by_name(&args.platform).ok_or_else(|| {
        anyhow!(
            "unknown platform {:?} (expected one of: {})",
            args.platform,
            platform::names().join(", ")
        )
    })?;

    let cluster_name = args
        .cluster
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cluster path {:?} has no usable directory name", args.cluster))?;

    let opts = cluster_options(&args);

    let mut spec = ClusterSpec::new(&cluster_name, arch.name());
    for i in 0..args.locations {
        spec.locations.push(Location::new(&location_name(i)));
    }

    let spec = pipeline::run(arch.as_ref(), platform.as_ref(), &opts, spec)
        .with_context(|| format!("could not derive a configuration for {cluster_name}"))?;

    let path = config::write_config(&args.cluster, &spec)?;

    if !ctx.quiet {
        ui::success(&format!("Configuration written to {}", path.display()));
        ui::kv("architecture", arch.name());
        ui::kv("platform", platform.name());
        if let Some(version) = spec.var("postgres_version").and_then(Value::as_str) {
            ui::kv("postgres version", version);
        }
        if let Some(version) = spec.var("bdr_version").and_then(Value::as_str) {
            ui::kv("bdr version", version);
        }
        ui::kv("locations", &spec.locations.len().to_string());
        ui::kv("instances", &spec.instances.len().to_string());
        if ctx.verbose > 0 {
            for instance in &spec.instances {
                let roles: Vec<&str> = instance.role.iter().map(String::as_str).collect();
                ui::kv(
                    &format!("node {}", instance.node),
                    &format!("{} [{}] at {}", instance.name, roles.join(", "), instance.location),
                );
            }
        }
    }
    Ok(())
}

fn cluster_options(args: &ConfigureArgs) -> ClusterOptions {
    let regions = if args.regions.is_empty() {
        args.region.clone().into_iter().collect()
    } else {
        args.regions.clone()
    };
    ClusterOptions {
        postgres_version: args.postgres_version.clone(),
        bdr_version: args.bdr_version.clone(),
        postgresql_flavour: args.postgresql_flavour.clone(),
        failover_manager: args.failover_manager.clone(),
        repositories: args.repositories.clone(),
        bdr_node_group: args.bdr_node_group.clone(),
        bdr_database: args.bdr_database.clone(),
        enable_camo: args.enable_camo,
        enable_pem: args.enable_pem,
        enable_pg_backup_api: args.enable_pg_backup_api,
        data_nodes: args.data_nodes,
        regions,
        instance_type: args.instance_type.clone(),
        owner: args.owner.clone(),
        cluster_bucket: args.cluster_bucket.clone(),
        image_label: args.os.clone(),
        image_version: args.os_version.clone(),
        lookup_images: args.lookup_images,
    }
}

/// Location names: a, b, ..., z, aa, bb, ...
fn location_name(i: u32) -> String {
    let letter = char::from(b'a' + u8::try_from(i % 26).unwrap_or(0));
    let repeats = (i / 26) as usize + 1;
    std::iter::repeat(letter).take(repeats).collect()
}
