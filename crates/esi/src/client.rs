use crate::gateway::{FleetGateway, GroupMetadata, NameCategory, TypeMetadata};
use crate::{Credential, GatewayError, Result};
use async_trait::async_trait;
use fcat_protocol::{CharacterId, FleetId, GroupId, RawFleetMember, TypeId};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const DEFAULT_ESI_BASE_URL: &str = "https://esi.evetech.net";
pub const DEFAULT_USER_AGENT: &str = "FCAT/1.0 (+https://github.com/MifuneSG/FCAT)";

const DATASOURCE: &str = "tranquility";
const MAX_NAMES_PER_REQUEST: usize = 1000;

#[derive(Debug, Clone)]
pub struct EsiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for EsiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ESI_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CharacterFleet {
    fleet_id: FleetId,
}

#[derive(Debug, Deserialize)]
struct NameEntry {
    id: i64,
    name: String,
    #[serde(default)]
    category: String,
}

/// Authenticated ESI client.
pub struct EsiClient {
    http: Client,
    base_url: String,
    credential: Credential,
}

impl EsiClient {
    pub fn new(config: &EsiConfig, credential: Credential) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    #[must_use]
    pub fn character_id(&self) -> CharacterId {
        self.credential.character_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.credential.access_token)
            .query(&[("datasource", DATASOURCE)])
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = self.authorized(request).send().await?;
        if let Some(err) = GatewayError::from_status(response.status(), url) {
            log::debug!("ESI request failed: {err}");
            return Err(err);
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| GatewayError::Malformed(format!("{url}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        self.fetch_json(self.http.get(&url), &url).await
    }
}

#[async_trait]
impl FleetGateway for EsiClient {
    async fn fleet_id(&self, character_id: CharacterId) -> Result<Option<FleetId>> {
        match self
            .get_json::<CharacterFleet>(&format!("/v1/characters/{character_id}/fleet/"))
            .await
        {
            Ok(fleet) => Ok(Some(fleet.fleet_id)),
            Err(GatewayError::NotFound(_) | GatewayError::Rejected { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fleet_members(&self, fleet_id: FleetId) -> Result<Vec<RawFleetMember>> {
        let entries: Vec<serde_json::Value> = self
            .get_json(&format!("/v1/fleets/{fleet_id}/members/"))
            .await?;
        let mut members = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<RawFleetMember>(entry) {
                Ok(member) => members.push(member),
                Err(err) => log::warn!("Skipping malformed fleet member entry: {err}"),
            }
        }
        Ok(members)
    }

    async fn names_bulk(
        &self,
        ids: &[i64],
        category: NameCategory,
    ) -> Result<HashMap<i64, String>> {
        let mut seen = HashSet::new();
        let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        let mut names = HashMap::new();
        if unique.is_empty() {
            return Ok(names);
        }

        let url = self.url("/latest/universe/names/");
        for chunk in unique.chunks(MAX_NAMES_PER_REQUEST) {
            let entries: Vec<NameEntry> = self
                .fetch_json(self.http.post(&url).json(chunk), &url)
                .await?;
            names.extend(
                entries
                    .into_iter()
                    .filter(|e| e.category == category.as_str())
                    .map(|e| (e.id, e.name)),
            );
        }
        Ok(names)
    }

    async fn type_metadata(&self, type_id: TypeId) -> Result<TypeMetadata> {
        self.get_json(&format!("/v4/universe/types/{type_id}/")).await
    }

    async fn group_metadata(&self, group_id: GroupId) -> Result<GroupMetadata> {
        self.get_json(&format!("/v2/universe/groups/{group_id}/")).await
    }
}
