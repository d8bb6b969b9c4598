//! UAA password grant

use crate::config::CloudFoundryConfig;
use crate::error::{decode, transport};
use crate::models::{Info, Token};
use scs_core::GatewayError;

/// Discover the UAA from `/v2/info` and log in with the configured user
///
/// # Errors
/// [`GatewayError::Auth`] when the UAA refuses the credentials.
pub(crate) async fn login(http: &reqwest::Client, config: &CloudFoundryConfig) -> Result<Token, GatewayError> {
    let info_url = config.url("/v2/info");
    let response = http
        .get(&info_url)
        .send()
        .await
        .map_err(|e| transport(&info_url, &e))?;
    if !response.status().is_success() {
        return Err(GatewayError::Status {
            method: "GET".to_string(),
            url: info_url,
            status: response.status().as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }
    let info: Info = response.json().await.map_err(|e| decode(&info_url, e))?;

    let token_url = format!("{}/oauth/token", info.uaa_url());
    tracing::debug!(%token_url, user = %config.username, "requesting token");
    let response = http
        .post(&token_url)
        .basic_auth(&config.client_id, Some(""))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[
            ("grant_type", "password"),
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ])
        .send()
        .await
        .map_err(|e| transport(&token_url, &e))?;

    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Auth(format!("{status}: {body}")));
    }
    if !status.is_success() {
        return Err(GatewayError::Status {
            method: "POST".to_string(),
            url: token_url,
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    response.json().await.map_err(|e| decode(&token_url, e))
}
