//! Cloud Controller v2 client
//!
//! Implements both platform traits. The bearer token is fetched at connect
//! time and fetched again once when a request comes back `401`.

use crate::auth::login;
use crate::config::CloudFoundryConfig;
use crate::error::{decode, transport, ClientError};
use crate::models::{AppEntity, BindingEntity, OrgEntity, Page, Resource, ServiceInstanceEntity, SpaceEntity};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use scs_core::{
    App, Binding, ConfigPayload, GatewayError, NewServiceInstance, Org, PlatformGateway,
    PlatformInventory, ServiceInstance, Space, SpaceSummary,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// Authenticated Cloud Controller client
pub struct CloudFoundryClient {
    http: reqwest::Client,
    config: CloudFoundryConfig,
    token: RwLock<String>,
}

impl CloudFoundryClient {
    /// Build the HTTP client and log in
    ///
    /// # Errors
    /// The client cannot be built, the API is unreachable, or the
    /// credentials are refused.
    pub async fn connect(config: CloudFoundryConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()?;
        let token = login(&http, &config).await?;
        tracing::info!(api = %config.api_address, user = %config.username, "logged in");

        Ok(Self {
            http,
            config,
            token: RwLock::new(token.header()),
        })
    }

    /// Connection settings
    #[must_use]
    pub fn config(&self) -> &CloudFoundryConfig {
        &self.config
    }

    async fn refresh_token(&self) -> Result<String, GatewayError> {
        let header = login(&self.http, &self.config).await?.header();
        *self.token.write().await = header.clone();
        tracing::debug!("token refreshed");
        Ok(header)
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| transport(url, &e))
    }

    /// Send an authenticated request, retrying once with a fresh token on 401
    async fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Result<reqwest::Response, GatewayError> {
        let token = self.token.read().await.clone();
        let mut response = self.send_once(&method, url, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(%url, "token rejected, logging in again");
            let token = self.refresh_token().await?;
            response = self.send_once(&method, url, body, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T, GatewayError> {
        let url = self.config.url(path);
        let response = self.execute(method, &url, body).await?;
        response.json().await.map_err(|e| decode(&url, e))
    }

    /// Follow `next_url` until the last page
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<Resource<T>>, GatewayError> {
        let mut resources = Vec::new();
        let mut next = Some(path.to_string());

        while let Some(path) = next {
            let page: Page<T> = self.call(Method::GET, &path, None).await?;
            resources.extend(page.resources);
            next = page.next_url;
        }

        Ok(resources)
    }
}

impl std::fmt::Debug for CloudFoundryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFoundryClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PlatformInventory for CloudFoundryClient {
    async fn list_orgs(&self) -> Result<Vec<Org>, GatewayError> {
        let orgs = self.list::<OrgEntity>("/v2/organizations").await?;
        Ok(orgs.into_iter().map(Org::from).collect())
    }

    async fn list_apps(&self) -> Result<Vec<App>, GatewayError> {
        let apps = self.list::<AppEntity>("/v2/apps").await?;
        Ok(apps.into_iter().map(App::from).collect())
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, GatewayError> {
        let spaces = self.list::<SpaceEntity>("/v2/spaces").await?;
        Ok(spaces.into_iter().map(Space::from).collect())
    }

    async fn space_summary(&self, space_guid: &str) -> Result<SpaceSummary, GatewayError> {
        self.call(Method::GET, &format!("/v2/spaces/{space_guid}/summary"), None)
            .await
    }

    async fn list_service_bindings(&self, service_instance_guid: &str) -> Result<Vec<Binding>, GatewayError> {
        let bindings = self
            .list::<BindingEntity>(&format!(
                "/v2/service_bindings?q=service_instance_guid:{service_instance_guid}"
            ))
            .await?;
        Ok(bindings.into_iter().map(Binding::from).collect())
    }

    async fn fetch_parameters(&self, url: &str) -> Result<ConfigPayload, GatewayError> {
        self.call(Method::GET, url, None).await
    }
}

#[async_trait]
impl PlatformGateway for CloudFoundryClient {
    async fn rename_service_instance(&self, guid: &str, new_name: &str) -> Result<(), GatewayError> {
        let path = format!("/v2/service_instances/{guid}?accepts_incomplete=true");
        self.execute(Method::PUT, &self.config.url(&path), Some(&json!({ "name": new_name })))
            .await?;
        Ok(())
    }

    async fn service_instance(&self, guid: &str) -> Result<ServiceInstance, GatewayError> {
        let resource: Resource<ServiceInstanceEntity> = self
            .call(Method::GET, &format!("/v2/service_instances/{guid}"), None)
            .await?;
        Ok(resource.into())
    }

    async fn create_service_instance(&self, request: &NewServiceInstance) -> Result<ServiceInstance, GatewayError> {
        let body = serde_json::to_value(request).map_err(|e| decode("/v2/service_instances", e))?;
        let resource: Resource<ServiceInstanceEntity> = self
            .call(Method::POST, "/v2/service_instances?accepts_incomplete=true", Some(&body))
            .await?;
        Ok(resource.into())
    }

    async fn create_service_binding(&self, app_guid: &str, service_instance_guid: &str) -> Result<Binding, GatewayError> {
        let body = json!({
            "app_guid": app_guid,
            "service_instance_guid": service_instance_guid,
        });
        let resource: Resource<BindingEntity> = self
            .call(Method::POST, "/v2/service_bindings", Some(&body))
            .await?;
        Ok(resource.into())
    }

    async fn delete_service_binding(&self, binding_guid: &str) -> Result<(), GatewayError> {
        let path = format!("/v2/service_bindings/{binding_guid}");
        self.execute(Method::DELETE, &self.config.url(&path), None).await?;
        Ok(())
    }

    async fn restage_app(&self, app_guid: &str) -> Result<App, GatewayError> {
        let resource: Resource<AppEntity> = self
            .call(Method::POST, &format!("/v2/apps/{app_guid}/restage"), None)
            .await?;
        Ok(resource.into())
    }

    async fn delete_service_instance(
        &self,
        guid: &str,
        recursive: bool,
        accepts_incomplete: bool,
    ) -> Result<(), GatewayError> {
        let path = format!("/v2/service_instances/{guid}?recursive={recursive}&async={accepts_incomplete}");
        self.execute(Method::DELETE, &self.config.url(&path), None).await?;
        Ok(())
    }
}
