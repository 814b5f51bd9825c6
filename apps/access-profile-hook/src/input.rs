//! Loading configuration and update requests from files or stdin.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{CliError, CliResult};
use xavyo_connector_access_profile::{AccessProfileConfig, StdAccountUpdateInput};

/// Load client configuration from a source config file, or the environment.
pub fn load_config(path: Option<&Path>) -> CliResult<AccessProfileConfig> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            let source: serde_json::Value = serde_json::from_str(&raw)?;
            Ok(AccessProfileConfig::from_source_config(&source)?)
        }
        None => Ok(AccessProfileConfig::from_env()?),
    }
}

/// Read an update request from `path`, or stdin when `path` is `-`.
pub fn read_update_input(path: &Path) -> CliResult<StdAccountUpdateInput> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    parse_update_input(&raw)
}

fn parse_update_input(raw: &str) -> CliResult<StdAccountUpdateInput> {
    let input: StdAccountUpdateInput = serde_json::from_str(raw)?;
    if input.identity.trim().is_empty() {
        return Err(CliError::Validation(
            "update request has an empty identity".to_string(),
        ));
    }
    Ok(input)
}
