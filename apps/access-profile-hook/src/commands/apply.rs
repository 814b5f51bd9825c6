//! Apply command - reconcile and submit the corrective patch

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;
use xavyo_connector_access_profile::{
    AccessProfileClient, AccessProfileConfig, AccessProfileUpdateHook, Reconciliation,
};

use crate::error::{CliError, CliResult};
use crate::input::read_update_input;

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Update request JSON file, or `-` for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,

    /// Print the patch instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the apply command
pub async fn execute(
    args: ApplyArgs,
    config: &AccessProfileConfig,
    out: &mut impl Write,
) -> CliResult<()> {
    let input = read_update_input(&args.input)?;
    let client = Arc::new(AccessProfileClient::new(config)?);
    let hook = AccessProfileUpdateHook::new(client.clone());

    let action = match hook.reconcile(&input).await {
        Reconciliation::Patch(action) => action,
        Reconciliation::Unchanged => return Err(CliError::LookupFailed(input.identity)),
    };
    let actions = [action];

    if args.dry_run {
        writeln!(out, "{}", serde_json::to_string_pretty(&actions)?)?;
        return Ok(());
    }

    let updated = client
        .apply_patch(&input.identity, &actions)
        .await
        .ok_or_else(|| CliError::PatchFailed(input.identity.clone()))?;

    info!(identity = %updated.id, path = %actions[0].path, "Applied corrective patch");
    writeln!(out, "{}", serde_json::to_string_pretty(&updated)?)?;
    Ok(())
}
