//! HTTPS client for the bridge's CLIP v2 API.

use std::str::FromStr;

use randomizer_app::ports::{DeviceGateway, GroupCatalog};
use randomizer_domain::error::GatewayError;
use randomizer_domain::group::{Group, GroupKind};
use randomizer_domain::id::{DeviceId, GroupId, GroupedLightId};
use randomizer_domain::light::{Brightness, DesiredState, DeviceState};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::config::HueConfig;
use crate::error::HueError;
use crate::wire::{Envelope, GroupResource, LightResource, LightUpdate, ResourceRef};

const API_KEY_HEADER: &str = "hue-application-key";

/// One bridge, shared by every worker of a session.
///
/// Requests in flight are capped by a semaphore so a large group cannot
/// open more connections than the bridge tolerates.
pub struct HueBridge {
    http: reqwest::Client,
    base_url: String,
    permits: Semaphore,
}

impl HueBridge {
    /// Connect to the bridge named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::InvalidApiKey`] or [`HueError::Client`] when the
    /// HTTP client cannot be built.
    pub fn new(config: &HueConfig) -> Result<Self, HueError> {
        Self::with_base_url(config, config.base_url())
    }

    /// Like [`HueBridge::new`] with an explicit API root.
    ///
    /// # Errors
    ///
    /// Same as [`HueBridge::new`].
    pub fn with_base_url(config: &HueConfig, base_url: impl Into<String>) -> Result<Self, HueError> {
        let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| HueError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.max_connections)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(HueError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            permits: Semaphore::new(config.max_connections.max(1)),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, HueError> {
        let _permit = self.permits.acquire().await.map_err(|_| HueError::PoolClosed)?;
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), HueError> {
        let _permit = self.permits.acquire().await.map_err(|_| HueError::PoolClosed)?;
        let response = self
            .http
            .put(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        decode::<ResourceRef>(response).await.map(drop)
    }

    async fn lights(&self) -> Result<Vec<DeviceState>, HueError> {
        let resources: Vec<LightResource> = self.get("/resource/light").await?;
        Ok(resources
            .into_iter()
            .filter_map(|resource| match light_state(resource) {
                Ok(state) => Some(state),
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed light");
                    None
                }
            })
            .collect())
    }

    async fn light(&self, id: DeviceId) -> Result<DeviceState, HueError> {
        let resources: Vec<LightResource> = self.get(&format!("/resource/light/{id}")).await?;
        let resource = resources.into_iter().next().ok_or_else(|| HueError::Missing {
            kind: "light",
            id: id.to_string(),
        })?;
        light_state(resource)
    }

    async fn groups_of(&self, kind: GroupKind) -> Result<Vec<Group>, HueError> {
        let resources: Vec<GroupResource> = self.get(&format!("/resource/{}", kind.resource())).await?;
        resources
            .into_iter()
            .map(|resource| group_from(resource, kind))
            .collect()
    }

    async fn group(&self, id: GroupId, kind: GroupKind) -> Result<Option<Group>, HueError> {
        let path = format!("/resource/{}/{id}", kind.resource());
        let resources: Vec<GroupResource> = match self.get(&path).await {
            Ok(resources) => resources,
            Err(HueError::Status(StatusCode::NOT_FOUND)) => return Ok(None),
            Err(err) => return Err(err),
        };
        resources
            .into_iter()
            .next()
            .map(|resource| group_from(resource, kind))
            .transpose()
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<Vec<T>, HueError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            tracing::debug!(%status, errors = ?envelope.error_message(), "bridge error response");
        }
        return Err(HueError::Status(status));
    }
    let envelope: Envelope<T> = response.json().await?;
    if let Some(message) = envelope.error_message() {
        return Err(HueError::Api(message));
    }
    Ok(envelope.data)
}

fn parse_id<T: FromStr>(raw: &str) -> Result<T, HueError> {
    raw.parse().map_err(|_| HueError::InvalidId(raw.to_string()))
}

fn light_state(resource: LightResource) -> Result<DeviceState, HueError> {
    let color = resource.color();
    Ok(DeviceState {
        id: parse_id(&resource.id)?,
        name: resource.metadata.map(|m| m.name),
        on: resource.on.is_some_and(|on| on.on),
        // Non-dimmable lights report no dimming block.
        brightness: resource
            .dimming
            .map_or(Brightness::FULL, |d| Brightness::new(d.brightness)),
        color,
        reachable: resource.owner.is_some(),
    })
}

fn group_from(resource: GroupResource, kind: GroupKind) -> Result<Group, HueError> {
    let members = resource
        .children
        .iter()
        .filter(|child| child.rtype == "light")
        .map(|child| parse_id::<DeviceId>(&child.rid))
        .collect::<Result<Vec<_>, _>>()?;
    let handle = resource
        .services
        .iter()
        .find(|service| service.rtype == "grouped_light")
        .map(|service| parse_id::<GroupedLightId>(&service.rid))
        .transpose()?;

    let mut builder = Group::builder()
        .id(parse_id(&resource.id)?)
        .name(resource.metadata.map(|m| m.name).unwrap_or_default())
        .kind(kind)
        .members(members);
    if let Some(handle) = handle {
        builder = builder.grouped_light(handle);
    }
    Ok(builder.build()?)
}

impl DeviceGateway for HueBridge {
    async fn fetch_all(&self) -> Result<Vec<DeviceState>, GatewayError> {
        Ok(self.lights().await?)
    }

    async fn fetch_one(&self, id: DeviceId) -> Result<DeviceState, GatewayError> {
        Ok(self.light(id).await?)
    }

    async fn set_state(&self, id: DeviceId, state: DesiredState) -> Result<(), GatewayError> {
        let body = LightUpdate::from(&state);
        Ok(self.put(&format!("/resource/light/{id}"), &body).await?)
    }

    async fn set_group_state(
        &self,
        handle: GroupedLightId,
        state: DesiredState,
    ) -> Result<(), GatewayError> {
        let body = LightUpdate::from(&state);
        Ok(self
            .put(&format!("/resource/grouped_light/{handle}"), &body)
            .await?)
    }
}

impl GroupCatalog for HueBridge {
    async fn list_groups(&self) -> Result<Vec<Group>, GatewayError> {
        let mut groups = self.groups_of(GroupKind::Room).await?;
        groups.extend(self.groups_of(GroupKind::Zone).await?);
        Ok(groups)
    }

    async fn fetch_group(&self, id: GroupId, kind: GroupKind) -> Result<Option<Group>, GatewayError> {
        Ok(self.group(id, kind).await?)
    }
}
