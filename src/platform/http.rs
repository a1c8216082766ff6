// ZoneLens - platform/http.rs
//
// HTTP backend talking to the designer server's JSON API under `/api`.
//
// Wire shapes are snake_case DTOs, mapped to core model types here so nothing
// above this module sees them. Error responses carry `{"error": "..."}` and
// become `ProviderError::Status` with that message; the pattern evaluator
// classifies the message as pattern vs transport failure.
//
// The server mounts list_tree, list_zones, list_matching_paths, get_zone,
// create_zone, update_zone, and assign_path_to_zone. It has no notion of
// projects: tree and match requests name a `root` directory on the server,
// and an empty root means the server's own default. This backend therefore
// exposes a single project whose root is the configured one. Agents are the
// distinct agents assigned to the server's zones.
//
// Calls are blocking (`ureq`) and run on the caller's background thread.

use crate::core::model::{Agent, Project, TreeNode, Zone, ZoneDraft};
use crate::core::provider::BlueprintProvider;
use crate::util::constants::{API_PREFIX, DEFAULT_PROJECT_ID};
use crate::util::error::ProviderError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct AgentDto {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct ZoneDto {
    id: String,
    #[serde(default)]
    project_id: String,
    name: String,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    constraints: Option<Vec<String>>,
    #[serde(default)]
    assigned_agents: Option<Vec<AgentDto>>,
    #[serde(default)]
    explicit_paths: Option<Vec<String>>,
}

impl From<ZoneDto> for Zone {
    fn from(dto: ZoneDto) -> Self {
        let assigned_agent_id = dto
            .assigned_agents
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|a| a.id)
            .unwrap_or_default();
        Zone {
            id: dto.id,
            project_id: dto.project_id,
            name: dto.name,
            pattern: dto.pattern.unwrap_or_default(),
            purpose: dto.purpose.unwrap_or_default(),
            constraints: dto.constraints.unwrap_or_default(),
            assigned_agent_id,
            explicit_paths: dto.explicit_paths.unwrap_or_default().into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TreeNodeDto {
    path: String,
    name: String,
    #[serde(default)]
    is_dir: bool,
    // The server encodes childless nodes as `null`.
    #[serde(default)]
    children: Option<Vec<TreeNodeDto>>,
}

impl From<TreeNodeDto> for TreeNode {
    fn from(dto: TreeNodeDto) -> Self {
        TreeNode {
            path: dto.path,
            name: dto.name,
            is_directory: dto.is_dir,
            children: dto
                .children
                .unwrap_or_default()
                .into_iter()
                .map(TreeNode::from)
                .collect(),
        }
    }
}

impl From<AgentDto> for Agent {
    fn from(dto: AgentDto) -> Self {
        Agent {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            prompt: dto.prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TreeOut {
    tree: TreeNodeDto,
}

#[derive(Debug, Deserialize)]
struct ZonesOut {
    #[serde(default)]
    zones: Option<Vec<ZoneDto>>,
}

#[derive(Debug, Deserialize)]
struct ZoneOut {
    zone: ZoneDto,
}

#[derive(Debug, Deserialize)]
struct PathsOut {
    #[serde(default)]
    paths: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorOut {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Serialize)]
struct ZoneIn<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    zone_id: &'a str,
    name: &'a str,
    pattern: &'a str,
    purpose: &'a str,
    constraints: &'a [String],
    assigned_agents: Vec<AgentDto>,
}

impl<'a> ZoneIn<'a> {
    fn new(zone_id: &'a str, draft: &'a ZoneDraft) -> Self {
        let assigned_agents = if draft.assigned_agent_id.is_empty() {
            Vec::new()
        } else {
            vec![AgentDto {
                id: draft.assigned_agent_id.clone(),
                ..Default::default()
            }]
        };
        Self {
            zone_id,
            name: &draft.name,
            pattern: &draft.pattern,
            purpose: &draft.purpose,
            constraints: &draft.constraints,
            assigned_agents,
        }
    }
}

#[derive(Debug, Serialize)]
struct AssignIn<'a> {
    zone_id: &'a str,
    path: &'a str,
}

// =============================================================================
// Client
// =============================================================================

/// Backend reached over HTTP.
pub struct HttpProvider {
    base_url: String,
    /// Server-side project root; empty means the server's default.
    root: String,
    agent: ureq::Agent,
}

impl HttpProvider {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            // Error statuses carry a JSON message we want to read.
            .http_status_as_error(false)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            root: String::new(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Point tree and match requests at `root` on the server.
    pub fn with_root(mut self, root: &str) -> Self {
        self.root = root.to_string();
        self
    }

    fn default_project(&self) -> Project {
        Project {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: DEFAULT_PROJECT_ID.to_string(),
            root_dir: self.root.clone(),
            ignored_paths: Default::default(),
        }
    }

    /// Server root for `project_id`. Only the single exposed project exists.
    fn root_for(&self, project_id: &str) -> Result<&str, ProviderError> {
        if project_id.is_empty() || project_id == DEFAULT_PROJECT_ID {
            Ok(&self.root)
        } else {
            Err(ProviderError::NotFound {
                kind: "project",
                id: project_id.to_string(),
            })
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{API_PREFIX}/{route}", self.base_url)
    }

    fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        context: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = self.url(route);
        let mut request = self.agent.get(&url);
        for (key, value) in query.iter().filter(|(_, v)| !v.is_empty()) {
            request = request.query(*key, *value);
        }
        tracing::debug!(url = %url, "GET");
        let response = request.call().map_err(|e| ProviderError::Transport {
            url: url.clone(),
            source: Box::new(e),
        })?;
        read_response(&url, context, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        route: &str,
        context: &'static str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let url = self.url(route);
        let payload = serde_json::to_string(body).map_err(|e| ProviderError::Decode {
            context,
            source: e,
        })?;
        tracing::debug!(url = %url, "POST");
        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(payload.as_str())
            .map_err(|e| ProviderError::Transport {
                url: url.clone(),
                source: Box::new(e),
            })?;
        read_response(&url, context, response)
    }
}

fn read_response<T: DeserializeOwned>(
    url: &str,
    context: &'static str,
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<T, ProviderError> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ProviderError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })?;
    if !status.is_success() {
        return Err(status_error(status.as_u16(), &text, status.canonical_reason()));
    }
    decode(context, &text)
}

fn decode<T: DeserializeOwned>(context: &'static str, text: &str) -> Result<T, ProviderError> {
    serde_json::from_str(text).map_err(|e| ProviderError::Decode { context, source: e })
}

/// Build the status error, preferring the server's `{"error": ...}` message.
fn status_error(status: u16, body: &str, reason: Option<&str>) -> ProviderError {
    let message = serde_json::from_str::<ErrorOut>(body)
        .ok()
        .map(|e| e.error)
        .filter(|m| !m.is_empty())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    ProviderError::Status { status, message }
}

impl BlueprintProvider for HttpProvider {
    fn kind(&self) -> &'static str {
        "http"
    }

    fn list_projects(&self) -> Result<Vec<Project>, ProviderError> {
        Ok(vec![self.default_project()])
    }

    fn list_agents(&self) -> Result<Vec<Agent>, ProviderError> {
        let out: ZonesOut = self.get("list_zones", "list_zones", &[])?;
        let mut agents: Vec<Agent> = Vec::new();
        let assigned = out
            .zones
            .unwrap_or_default()
            .into_iter()
            .flat_map(|z| z.assigned_agents.unwrap_or_default());
        for dto in assigned {
            if !dto.id.is_empty() && !agents.iter().any(|a| a.id == dto.id) {
                agents.push(dto.into());
            }
        }
        Ok(agents)
    }

    fn fetch_tree(&self, project_id: &str) -> Result<TreeNode, ProviderError> {
        let root = self.root_for(project_id)?;
        let out: TreeOut = self.get("list_tree", "list_tree", &[("root", root)])?;
        Ok(out.tree.into())
    }

    fn fetch_zones(&self, project_id: &str) -> Result<Vec<Zone>, ProviderError> {
        self.root_for(project_id)?;
        let out: ZonesOut = self.get("list_zones", "list_zones", &[])?;
        Ok(out
            .zones
            .unwrap_or_default()
            .into_iter()
            .map(Zone::from)
            .collect())
    }

    fn fetch_matching_paths(
        &self,
        pattern: &str,
        project_id: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let root = self.root_for(project_id)?;
        let out: PathsOut = self.get(
            "list_matching_paths",
            "list_matching_paths",
            &[("pattern", pattern), ("root", root)],
        )?;
        Ok(out.paths.unwrap_or_default())
    }

    fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        let out: ZoneOut = self.post("create_zone", "create_zone", &ZoneIn::new("", draft))?;
        Ok(out.zone.into())
    }

    fn update_zone(&self, zone_id: &str, draft: &ZoneDraft) -> Result<Zone, ProviderError> {
        let out: ZoneOut = self.post("update_zone", "update_zone", &ZoneIn::new(zone_id, draft))?;
        Ok(out.zone.into())
    }

    fn assign_path_to_zone(&self, zone_id: &str, path: &str) -> Result<Zone, ProviderError> {
        let out: ZoneOut = self.post(
            "assign_path_to_zone",
            "assign_path_to_zone",
            &AssignIn { zone_id, path },
        )?;
        Ok(out.zone.into())
    }
}
