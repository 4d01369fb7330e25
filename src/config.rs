//! Cluster configuration files
//!
//! A configure run writes the resolved [`ClusterSpec`] to
//! `<cluster-dir>/config.yml`. The file is the terminal artifact of the
//! pipeline; downstream provisioning consumes it as-is.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use topology::ClusterSpec;

pub const CONFIG_FILE: &str = "config.yml";

/// Write a resolved cluster spec to `<dir>/config.yml`
///
/// Refuses to overwrite an existing configuration.
pub fn write_config(dir: &Path, spec: &ClusterSpec) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists; refusing to overwrite", path.display());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create cluster directory {}", dir.display()))?;

    let yaml = serde_yaml::to_string(spec)?;
    fs::write(&path, yaml).with_context(|| format!("could not write {}", path.display()))?;
    Ok(path)
}

/// Load a cluster spec from a cluster directory or a direct file path
pub fn read_config(cluster: &Path) -> Result<ClusterSpec> {
    let path = if cluster.is_file() {
        cluster.to_path_buf()
    } else {
        cluster.join(CONFIG_FILE)
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("invalid cluster configuration in {}", path.display()))
}
