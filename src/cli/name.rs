//! Name command.
//!
//! Prints the cluster name a run with this job identifier would use.

use std::path::Path;

use crate::core::config::Config;
use crate::core::types::EnvironmentName;
use crate::error::Result;

/// Print the derived cluster name.
pub fn execute(job_id: &str, config_path: Option<&Path>) -> Result<i32> {
    let config = Config::load(config_path)?;
    let name = EnvironmentName::derive(&config.cluster.name_prefix, job_id)?;
    println!("{}", name);
    Ok(0)
}
