//! Reconcile command - run the before-update hook and print its output

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use xavyo_connector_access_profile::{connector_customizer, AccessProfileConfig, HookContext};

use crate::error::CliResult;
use crate::input::read_update_input;

/// Arguments for the reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Update request JSON file, or `-` for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,
}

/// Execute the reconcile command
pub async fn execute(
    args: ReconcileArgs,
    config: &AccessProfileConfig,
    out: &mut impl Write,
) -> CliResult<()> {
    let input = read_update_input(&args.input)?;
    let customizer = connector_customizer(config)?;

    let output = customizer
        .run_before_std_account_update(&HookContext::default(), input)
        .await;

    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{
        config, entitlement, mock_profile, mock_token, profile_path, removal_file,
    };
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use xavyo_connector_access_profile::{ChangeValue, StdAccountUpdateInput};

    async fn run(server: &MockServer, ids: &[&str]) -> StdAccountUpdateInput {
        let file = removal_file(ids);
        let args = ReconcileArgs {
            input: file.path().to_path_buf(),
        };
        let mut out = Vec::new();
        execute(args, &config(server), &mut out).await.unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_prints_rewritten_request() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        mock_profile(&server, "ap-1", &["A", "B", "C"]).await;

        let output = run(&server, &["A", "C"]).await;

        assert_eq!(output.identity, "ap-1");
        assert_eq!(output.key, Some(json!({ "simple": { "id": "ap-1" } })));
        assert_eq!(output.changes.len(), 1);
        assert_eq!(output.changes[0].attribute, "entitlements");
        let body: Value = match &output.changes[0].value {
            ChangeValue::Single(body) => serde_json::from_str(body).unwrap(),
            other => panic!("Expected serialized patch body, got {other:?}"),
        };
        assert_eq!(
            body,
            json!([{ "op": "replace", "path": "/entitlements", "value": [entitlement("B")] }])
        );
    }

    #[tokio::test]
    async fn test_reconcile_prints_request_unchanged_on_failed_lookup() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        Mock::given(method("GET"))
            .and(path(profile_path("ap-1")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let output = run(&server, &["A"]).await;

        assert_eq!(output.changes.len(), 1);
        assert_eq!(output.changes[0].value, ChangeValue::Multiple(vec!["A".to_string()]));
    }
}
