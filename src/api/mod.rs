//! Client for the remote document analysis API.
//!
//! Two calls are exposed through the [`AnalysisApi`] trait:
//!
//! - **fetch_models**: `GET` the catalog of models, grouped by provider.
//! - **perform_analysis**: multipart `POST` of a document and model name,
//!   authorised with a bearer key, returning a [`Report`].
//!
//! [`HttpApiClient`] is the production implementation; sessions take the
//! trait so tests can drive them with a scripted fake.

mod http;
mod multipart;

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cancel::CancellationToken;
use crate::error::ClientError;
use crate::report::Report;

pub use http::HttpApiClient;

/// Provider display name → ordered model list.
///
/// Providers keep the order the server listed them in, so the first model
/// of the first provider is the natural default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelCatalog {
    providers: Vec<(String, Vec<ModelDescriptor>)>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `models` under `provider`, replacing an earlier entry in place.
    pub fn insert(&mut self, provider: impl Into<String>, models: Vec<ModelDescriptor>) {
        let provider = provider.into();
        match self.providers.iter_mut().find(|(name, _)| *name == provider) {
            Some((_, existing)) => *existing = models,
            None => self.providers.push((provider, models)),
        }
    }

    pub fn get(&self, provider: &str) -> Option<&[ModelDescriptor]> {
        self.providers
            .iter()
            .find(|(name, _)| name == provider)
            .map(|(_, models)| models.as_slice())
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|(name, _)| name.as_str())
    }

    /// Every model, in provider order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.providers.iter().flat_map(|(_, models)| models.iter())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModelCatalog {
    type Item = (&'a str, &'a [ModelDescriptor]);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(
            self.providers
                .iter()
                .map(|(name, models)| (name.as_str(), models.as_slice())),
        )
    }
}

impl Serialize for ModelCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.providers.len()))?;
        for (provider, models) in &self.providers {
            map.serialize_entry(provider, models)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModelCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = ModelCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of provider name to model list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ModelCatalog, A::Error> {
                let mut catalog = ModelCatalog::new();
                while let Some((provider, models)) =
                    access.next_entry::<String, Vec<ModelDescriptor>>()?
                {
                    catalog.insert(provider, models);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Full `provider:model` identifier sent back as `model_name`.
    pub value: String,
    /// Display name.
    pub name: String,
}

/// First model of the first provider, the catalog's natural default.
pub fn first_model(catalog: &ModelCatalog) -> Option<&ModelDescriptor> {
    catalog.models().next()
}

/// Look up a model by its `value` or display `name`.
pub fn find_model<'a>(catalog: &'a ModelCatalog, query: &str) -> Option<&'a ModelDescriptor> {
    catalog
        .models()
        .find(|m| m.value == query || m.name == query)
}

pub trait AnalysisApi {
    fn fetch_models(&self) -> Result<ModelCatalog, ClientError>;

    /// Submit `file` for analysis. Must return [`ClientError::Cancelled`]
    /// promptly once `cancel` is signalled.
    fn perform_analysis(
        &self,
        api_key: &str,
        file: &DocumentUpload,
        model_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError>;
}

// ---------------------------------------------------------------------------
// Document upload
// ---------------------------------------------------------------------------

/// A document selected for analysis, held in memory until submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = fs::read(path)
            .map_err(|e| ClientError::Read(format!("failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self { file_name, bytes })
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => "application/pdf",
            "txt" | "log" => "text/plain",
            "md" | "markdown" => "text/markdown",
            "csv" => "text/csv",
            "json" => "application/json",
            "html" | "htm" => "text/html",
            "xml" => "application/xml",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "py" => "text/x-python",
            "rs" => "text/x-rust",
            "js" => "text/javascript",
            _ => "application/octet-stream",
        }
    }
}
