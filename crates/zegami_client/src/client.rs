//! Zegami API client.
//!
//! Every operation is one blocking request against
//! `<api_url>v0/project/<project>/...`, with the resource unwrapped from the
//! response envelope where the API uses one.

use std::fs::File;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{Result, ZegamiError};
use crate::http::{self, Session};

/// MIME type for image uploads.
pub const PNG_TYPE: &str = "image/png";
/// MIME type for tabular data uploads.
pub const TSV_TYPE: &str = "text/tab-separated-values";

/// Zegami API client (blocking).
pub struct ZegamiClient {
    session: Session,
    api_url: String,
    project: String,
}

impl ZegamiClient {
    /// Create a client whose session only sends `token` to `api_url`.
    pub fn new(api_url: &str, project: &str, token: &str) -> Result<Self> {
        let auth = http::scoped_bearer_auth(api_url, token);
        let session = http::make_session(Some(Box::new(auth)))?;
        Ok(Self::with_session(api_url, project, session))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_url, &config.project, &config.token)
    }

    /// Use a prepared session (custom transport or auth).
    pub fn with_session(api_url: &str, project: &str, session: Session) -> Self {
        Self {
            session,
            api_url: api_url.to_string(),
            project: project.to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn create_collection(&self, name: &str, description: Option<&str>) -> Result<Value> {
        let url = self.project_url("collections/");
        let json = http::post_json(&self.session, &url, &collection_info(name, description))?;
        unwrap_envelope(json, "collection")
    }

    /// Replace collection fields; `info` is sent as-is.
    pub fn update_collection(&self, coll_id: &str, info: &Value) -> Result<Value> {
        let url = self.project_url(&format!("collections/{}", coll_id));
        let json = http::put_json(&self.session, &url, info)?;
        unwrap_envelope(json, "collection")
    }

    pub fn create_imageset(&self, name: &str, source: Option<&Value>) -> Result<Value> {
        let url = self.project_url("imagesets/");
        let json = http::post_json(&self.session, &url, &imageset_info(name, source))?;
        unwrap_envelope(json, "imageset")
    }

    /// Create a dataset joining imageset names to the `id` column of a dataset.
    pub fn create_join(&self, name: &str, imageset_id: &str, dataset_id: &str) -> Result<Value> {
        let url = self.project_url("datasets/");
        let info = join_info(name, imageset_id, dataset_id);
        let json = http::post_json(&self.session, &url, &info)?;
        unwrap_envelope(json, "dataset")
    }

    /// Upload a TSV file as dataset content. Returns the raw response.
    pub fn upload_data(&self, dataset_id: &str, path: &Path) -> Result<Value> {
        let url = self.project_url(&format!("datasets/{}/file", dataset_id));
        self.upload_file(&url, path, TSV_TYPE)
    }

    /// Upload a PNG into an imageset. Returns the raw response.
    pub fn upload_png(&self, imageset_id: &str, path: &Path) -> Result<Value> {
        let url = self.project_url(&format!("imagesets/{}/images", imageset_id));
        self.upload_file(&url, path, PNG_TYPE)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn project_url(&self, resource: &str) -> String {
        format!("{}v0/project/{}/{}", self.api_url, self.project, resource)
    }

    fn upload_file(&self, url: &str, path: &Path, mimetype: &str) -> Result<Value> {
        // Open before anything touches the network
        let file = File::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        http::post_file(&self.session, url, &name, file, mimetype)
    }
}

impl std::fmt::Debug for ZegamiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZegamiClient")
            .field("api_url", &self.api_url)
            .field("project", &self.project)
            .field("session", &self.session)
            .finish()
    }
}

// ── Payload builders ────────────────────────────────────────────────

/// `{name, description?}` — `description` omitted when `None`.
pub fn collection_info(name: &str, description: Option<&str>) -> Value {
    let mut info = Map::new();
    info.insert("name".into(), Value::String(name.to_string()));
    if let Some(description) = description {
        info.insert("description".into(), Value::String(description.to_string()));
    }
    Value::Object(info)
}

/// `{name, source?}` — `source` omitted when `None`.
pub fn imageset_info(name: &str, source: Option<&Value>) -> Value {
    let mut info = Map::new();
    info.insert("name".into(), Value::String(name.to_string()));
    if let Some(source) = source {
        info.insert("source".into(), source.clone());
    }
    Value::Object(info)
}

pub fn join_info(name: &str, imageset_id: &str, dataset_id: &str) -> Value {
    serde_json::json!({
        "name": name,
        "source": {
            "imageset_id": imageset_id,
            "dataset_id": dataset_id,
            "imageset_name_join_to_dataset": {"dataset_column": "id"},
        },
    })
}

fn unwrap_envelope(json: Value, key: &str) -> Result<Value> {
    match json {
        Value::Object(mut obj) => obj
            .remove(key)
            .ok_or_else(|| ZegamiError::MissingKey(key.to_string())),
        _ => Err(ZegamiError::MissingKey(key.to_string())),
    }
}
