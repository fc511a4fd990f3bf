//! Configuration rendering for the Hemmer Config Generator
//!
//! Turns a discovered [`ResourceCollection`] into a complete configuration
//! file: a provider preamble followed by one `resource` block per discovered
//! object.

mod render;
mod templates;

pub use render::{render, render_resource};
pub use templates::load_templates;

use hemmer_config_generator_common::{GeneratorError, ProviderInfo, ResourceCollection, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::{debug, info};

/// Registry host used in `required_providers` unless overridden
pub const DEFAULT_REGISTRY: &str = "registry.terraform.io";

/// File extension of generated configuration
pub const CONFIG_EXTENSION: &str = "tf";

#[derive(Debug, Serialize)]
struct ConfigContext<'a> {
    version: &'a str,
    root: &'a str,
    provider_name: &'a str,
    provider_source: String,
    url: &'a str,
    resources: String,
}

/// Writes discovered resources as a configuration file
pub struct ConfigWriter {
    provider: ProviderInfo,
    registry: String,
    tera: Tera,
}

impl ConfigWriter {
    /// Create a writer for `provider`, sourced from `registry`
    pub fn new(provider: ProviderInfo, registry: impl Into<String>) -> Result<Self> {
        Ok(Self {
            provider,
            registry: registry.into(),
            tera: load_templates()?,
        })
    }

    /// Render the whole file: preamble, provider block and resources
    ///
    /// Only the URL of the management API is written; credentials never are.
    pub fn render_file(&self, collection: &ResourceCollection, root: &str, url: &str) -> Result<String> {
        let context = ConfigContext {
            version: env!("CARGO_PKG_VERSION"),
            root,
            provider_name: &self.provider.name,
            provider_source: format!("{}/{}", self.registry, self.provider.source),
            url,
            resources: render(collection),
        };
        let context = Context::from_serialize(&context)
            .map_err(|e| GeneratorError::Generation(format!("Failed to build context: {}", e)))?;

        self.tera
            .render("config.tf", &context)
            .map_err(|e| GeneratorError::Generation(format!("Failed to render config: {}", e)))
    }

    /// Render and write to `path` (with `.tf` appended when missing)
    ///
    /// The file is written to a temporary sibling and renamed into place, so a
    /// failed run leaves any existing file untouched.
    pub fn write(
        &self,
        collection: &ResourceCollection,
        root: &str,
        url: &str,
        path: &Path,
    ) -> Result<PathBuf> {
        let content = self.render_file(collection, root, url)?;
        let path = output_path(path);
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        debug!("Wrote {} bytes to {}", content.len(), file.path().display());
        file.persist(&path).map_err(|e| GeneratorError::Io(e.error))?;

        info!("Wrote {} resource(s) to {}", collection.len(), path.display());
        Ok(path)
    }
}

/// `path` with the configuration extension appended unless it already ends in it
pub fn output_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(CONFIG_EXTENSION);
    PathBuf::from(name)
}
