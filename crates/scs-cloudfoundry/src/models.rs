//! Cloud Controller v2 wire shapes

use scs_core::{App, Binding, LastOperation, Org, ServiceInstance, Space};
use serde::Deserialize;

/// One page of a v2 listing
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default)]
    pub(crate) next_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub(crate) resources: Vec<Resource<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Resource<T> {
    pub(crate) metadata: Metadata,
    pub(crate) entity: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metadata {
    pub(crate) guid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrgEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppEntity {
    name: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpaceEntity {
    name: String,
    organization_guid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BindingEntity {
    app_guid: String,
    service_instance_guid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceInstanceEntity {
    name: String,
    #[serde(default)]
    last_operation: Option<LastOperation>,
}

impl From<Resource<OrgEntity>> for Org {
    fn from(r: Resource<OrgEntity>) -> Self {
        Org {
            guid: r.metadata.guid,
            name: r.entity.name,
        }
    }
}

impl From<Resource<AppEntity>> for App {
    fn from(r: Resource<AppEntity>) -> Self {
        App {
            guid: r.metadata.guid,
            name: r.entity.name,
            state: r.entity.state,
        }
    }
}

impl From<Resource<SpaceEntity>> for Space {
    fn from(r: Resource<SpaceEntity>) -> Self {
        Space {
            guid: r.metadata.guid,
            name: r.entity.name,
            organization_guid: r.entity.organization_guid,
        }
    }
}

impl From<Resource<BindingEntity>> for Binding {
    fn from(r: Resource<BindingEntity>) -> Self {
        Binding {
            guid: r.metadata.guid,
            app_guid: r.entity.app_guid,
            service_instance_guid: r.entity.service_instance_guid,
        }
    }
}

impl From<Resource<ServiceInstanceEntity>> for ServiceInstance {
    fn from(r: Resource<ServiceInstanceEntity>) -> Self {
        ServiceInstance {
            guid: r.metadata.guid,
            name: r.entity.name,
            last_operation: r.entity.last_operation,
        }
    }
}

/// `GET /v2/info`
#[derive(Debug, Deserialize)]
pub(crate) struct Info {
    pub(crate) authorization_endpoint: String,
    #[serde(default)]
    pub(crate) token_endpoint: Option<String>,
}

impl Info {
    /// UAA base URL for the password grant
    pub(crate) fn uaa_url(&self) -> &str {
        self.token_endpoint
            .as_deref()
            .unwrap_or(&self.authorization_endpoint)
            .trim_end_matches('/')
    }
}

/// UAA token response
#[derive(Debug, Deserialize)]
pub(crate) struct Token {
    pub(crate) access_token: String,
    #[serde(default = "bearer")]
    pub(crate) token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

impl Token {
    /// `Authorization` header value
    pub(crate) fn header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
