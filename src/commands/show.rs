//! `pgforge show`

use crate::config;
use crate::ui;
use crate::Context;
use anyhow::Result;
use std::path::Path;

pub fn run(ctx: &Context, cluster: &Path) -> Result<()> {
    let spec = config::read_config(cluster)?;
    if !ctx.quiet {
        ui::header(&spec.cluster_name);
    }
    print!("{}", serde_yaml::to_string(&spec)?);
    Ok(())
}
