//! Private registry authentication.
//!
//! The token itself comes from the registry helper (`aws ecr
//! get-login-password`). This module only turns it into the docker
//! `config.json` the kubelet reads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::constants;
use crate::core::exec::{ExecError, Executor, Invocation};
use crate::core::types::RegistryCredential;
use crate::error::{Error, Result};

/// Host name of the account's private registry in `region`.
pub fn registry_host(account_id: &str, region: &str) -> String {
    format!("{}.dkr.ecr.{}.amazonaws.com", account_id, region)
}

/// Render a docker `config.json` authenticating `host` with `token`.
pub fn render_docker_config(host: &str, token: &str) -> Zeroizing<String> {
    let auth = Zeroizing::new(STANDARD.encode(format!("{}:{}", constants::REGISTRY_USER, token)));
    let document = json!({
        "auths": {
            host: { "auth": auth.as_str() }
        }
    });
    Zeroizing::new(document.to_string())
}

/// Ask the registry helper for a login token and stage it as a credential.
///
/// # Errors
///
/// Returns `Error::CredentialInjection` if the helper fails or prints no
/// token, and `Error::Interrupted` if a signal arrives meanwhile.
pub fn fetch_credential<E: Executor>(
    executor: &E,
    helper: &str,
    account_id: &str,
    region: &str,
) -> Result<RegistryCredential> {
    let host = registry_host(account_id, region);
    debug!(registry = %host, "requesting registry token");

    let invocation = Invocation::new(helper)
        .args(["ecr", "get-login-password", "--region", region])
        .capture_stdout();

    let completion = executor.execute(&invocation).map_err(|e| match e {
        ExecError::Interrupted(signal) => Error::Interrupted(signal),
        other => Error::CredentialInjection {
            reason: format!("could not run `{}`: {}", helper, other),
            code: None,
        },
    })?;

    if !completion.success() {
        return Err(Error::CredentialInjection {
            reason: format!("`{}` failed to produce a registry token", invocation),
            code: completion.code,
        });
    }

    let token = Zeroizing::new(completion.stdout);
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::CredentialInjection {
            reason: format!("`{}` printed an empty token", invocation),
            code: None,
        });
    }

    let contents = render_docker_config(&host, token);
    let credential = RegistryCredential::stage(host, contents)?;
    info!(registry = %credential.registry(), "registry credential staged");
    Ok(credential)
}
