use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::client::kube_resources::{Deployment, Service};

/// One document of a YAML manifest stream.
#[derive(Debug, Clone)]
pub enum ManifestDocument {
    Deployment(Box<Deployment>),
    Service(Box<Service>),
    /// Any other kind; kept so document counts stay accurate.
    Other { api_version: String, kind: String },
}

impl ManifestDocument {
    pub fn kind(&self) -> &str {
        match self {
            ManifestDocument::Deployment(_) => "Deployment",
            ManifestDocument::Service(_) => "Service",
            ManifestDocument::Other { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub documents: Vec<ManifestDocument>,
}

impl Manifest {
    pub fn deployments(&self) -> impl Iterator<Item = &Deployment> {
        self.documents.iter().filter_map(|doc| match doc {
            ManifestDocument::Deployment(d) => Some(d.as_ref()),
            _ => None,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.documents.iter().filter_map(|doc| match doc {
            ManifestDocument::Service(s) => Some(s.as_ref()),
            _ => None,
        })
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest(&content).with_context(|| format!("failed to parse manifest {}", path.display()))
}

/// Parses a `---` separated YAML stream. Empty documents are skipped.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let mut documents = Vec::new();

    for (index, doc) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = serde_yaml::Value::deserialize(doc)
            .with_context(|| format!("document {} is not valid YAML", index + 1))?;
        if value.is_null() {
            continue;
        }

        let api_version = str_field(&value, "apiVersion");
        let kind = str_field(&value, "kind");

        let document = match (api_version.as_str(), kind.as_str()) {
            ("apps/v1", "Deployment") => ManifestDocument::Deployment(Box::new(
                serde_yaml::from_value(value)
                    .with_context(|| format!("document {} is not a valid Deployment", index + 1))?,
            )),
            ("v1", "Service") => ManifestDocument::Service(Box::new(
                serde_yaml::from_value(value)
                    .with_context(|| format!("document {} is not a valid Service", index + 1))?,
            )),
            _ => ManifestDocument::Other { api_version, kind },
        };
        documents.push(document);
    }

    Ok(Manifest { documents })
}

fn str_field(value: &serde_yaml::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
