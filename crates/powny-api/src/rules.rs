//! HTTP implementation of the remote rule store

use std::collections::BTreeMap;

use powny_core::{Change, RemoteRuleStore, RemoteSnapshot, RuleSet, UploadManifest};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, decode};
use crate::{Error, Result};

const RULES_PATH: &str = "/v1/rules";

#[derive(Debug, Deserialize)]
struct RulesDocument {
    version: String,
    #[serde(default)]
    rules: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    base_version: &'a str,
    message: &'a str,
    changes: Vec<WireChange<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum WireChange<'a> {
    Upsert { name: &'a str, content: &'a str },
    Remove { name: &'a str },
}

impl<'a> WireChange<'a> {
    fn from_manifest(manifest: &'a UploadManifest) -> Vec<Self> {
        manifest
            .entries()
            .iter()
            .map(|entry| match &entry.change {
                Change::Added { content, .. } | Change::Changed { content, .. } => Self::Upsert {
                    name: &entry.name,
                    content,
                },
                Change::Removed { .. } => Self::Remove { name: &entry.name },
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    version: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConflictResponse {
    #[serde(default)]
    version: Option<String>,
}

/// The cluster's rule store, reached over `GET`/`POST /v1/rules`.
#[derive(Debug, Clone)]
pub struct HttpRuleStore {
    client: ApiClient,
}

impl HttpRuleStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn fetch_document(&self) -> Result<RulesDocument> {
        self.client.get_json("fetch", RULES_PATH)
    }

    fn push_manifest(&self, manifest: &UploadManifest, base_version: &str) -> Result<String> {
        let request = PushRequest {
            base_version,
            message: manifest.message(),
            changes: WireChange::from_manifest(manifest),
        };
        let url = self.client.url(RULES_PATH);
        let response = self.client.post_json("push", RULES_PATH, &request)?;

        if response.status() == StatusCode::CONFLICT {
            let body: ConflictResponse = response.json().unwrap_or_default();
            return Err(Error::Conflict {
                expected: base_version.to_string(),
                actual: body.version,
            });
        }

        let accepted: PushResponse = decode("push", &url, response)?;
        Ok(accepted.version)
    }
}

impl RemoteRuleStore for HttpRuleStore {
    fn fetch(&self) -> powny_core::Result<RemoteSnapshot> {
        let document = self.fetch_document()?;
        tracing::debug!(version = %document.version, rules = document.rules.len(), "fetched rule document");
        Ok(RemoteSnapshot {
            rule_set: RuleSet::from_contents(Some(document.version.clone()), document.rules),
            version: document.version,
        })
    }

    fn push(&self, manifest: &UploadManifest, base_version: &str) -> powny_core::Result<String> {
        Ok(self.push_manifest(manifest, base_version)?)
    }

    fn describe(&self) -> String {
        self.client.url(RULES_PATH)
    }
}
