use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::config::AzureEndpoints;
use crate::metrics;
use crate::models::{CredentialSchema, ParamMap};
use crate::{PluginError, Result};

/// Service principal credentials for the `azure_client_secret` schema.
#[derive(Clone)]
pub struct ClientSecretCredential {
    pub tenant_id: String,
    pub client_id: String,
    client_secret: String,
    pub subscription_id: Option<String>,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("subscription_id", &self.subscription_id)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    /// Reads the credential out of `secret_data` for the given schema.
    pub fn from_secret_data(schema: CredentialSchema, secret_data: &ParamMap) -> Result<Self> {
        for key in schema.required_keys() {
            secret_string(secret_data, key)?;
        }

        match schema {
            CredentialSchema::AzureClientSecret => Ok(Self {
                tenant_id: secret_string(secret_data, "tenant_id")?,
                client_id: secret_string(secret_data, "client_id")?,
                client_secret: secret_string(secret_data, "client_secret")?,
                subscription_id: secret_data
                    .get("subscription_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
        }
    }

    /// Runs the OAuth2 client credentials flow against Azure AD.
    pub async fn acquire_token(
        &self,
        http: &reqwest::Client,
        endpoints: &AzureEndpoints,
    ) -> Result<AccessToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            endpoints.authority_host, self.tenant_id
        );
        let scope = format!("{}/.default", endpoints.management_endpoint);

        debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "Requesting Azure access token");

        let response = http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                metrics::record_azure_request("token", None);
                PluginError::Azure(format!("Token request failed: {}", e))
            })?;

        let status = response.status();
        metrics::record_azure_request("token", Some(status.as_u16()));

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenError>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(PluginError::Azure(format!(
                "Token request returned {}: {}",
                status, reason
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| PluginError::Azure(format!("Malformed token response: {}", e)))?;

        Ok(token)
    }
}

fn secret_string(secret_data: &ParamMap, key: &str) -> Result<String> {
    match secret_data.get(key).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(PluginError::RequiredParameter(format!("secret_data.{}", key))),
    }
}

#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}
