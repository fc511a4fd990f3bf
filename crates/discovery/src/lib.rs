//! Discovery engine for the Hemmer Config Generator
//!
//! Walks the live objects of a management API, starting from one root
//! instance, and produces a [`ResourceCollection`] ready for rendering:
//!
//! 1. [`RelationshipGraph`] relates object types by path template nesting
//! 2. [`Walker`] fetches instances depth first, binding identifiers as it goes
//! 3. [`AttributeProjector`] turns each record into attribute assignments
//! 4. [`resource_token`] names each instance uniquely
//! 5. [`link_dependencies`] rewrites name literals into references
//!
//! # Examples
//!
//! ```no_run
//! use hemmer_config_generator_common::{Catalog, FetchError, ManagementApi, Record};
//! use hemmer_config_generator_discovery::{discover, RootSelector};
//! use std::path::Path;
//!
//! struct Offline;
//!
//! impl ManagementApi for Offline {
//!     fn fetch(&self, _path: &str) -> Result<Vec<Record>, FetchError> {
//!         Err(FetchError::NotFound)
//!     }
//! }
//!
//! let catalog = Catalog::load(Path::new("catalogs/solacebroker.yaml")).unwrap();
//! let root = RootSelector::parse("solacebroker_msg_vpn.mq", "default");
//! let resources = discover(&catalog, Offline, &root).unwrap();
//! ```

mod graph;
mod linker;
mod naming;
mod projector;
mod session;
mod walker;

pub use graph::RelationshipGraph;
pub use linker::link_dependencies;
pub use naming::{resource_token, sanitize_identifier};
pub use projector::{AttributeProjector, ParentContext};
pub use session::DiscoverySession;
pub use walker::{ObjectInstance, Walker};

use hemmer_config_generator_common::{
    Catalog, GeneratorError, ManagementApi, ObjectTypeDescriptor, ResourceCollection, Result,
};
use tracing::info;

/// The root instance of a run, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSelector {
    /// Output type name (or catalog entity name)
    pub type_name: String,
    /// Resource name for the root; derived from the identifier values when absent
    pub name: Option<String>,
    /// `/`-separated placeholder values
    pub identifier: String,
}

impl RootSelector {
    /// Parse `<type>[.<name>]` plus the identifier
    pub fn parse(address: &str, identifier: &str) -> Self {
        let (type_name, name) = match address.split_once('.') {
            Some((type_name, name)) if !name.is_empty() => (type_name, Some(name.to_string())),
            Some((type_name, _)) => (type_name, None),
            None => (address, None),
        };
        Self {
            type_name: type_name.to_string(),
            name,
            identifier: identifier.to_string(),
        }
    }

    fn resolve<'c>(&self, catalog: &'c Catalog) -> Result<&'c ObjectTypeDescriptor> {
        catalog
            .entity_by_output_type(&self.type_name)
            .or_else(|| catalog.entity(&self.type_name))
            .ok_or_else(|| {
                GeneratorError::Catalog(format!("Unknown resource type: {}", self.type_name))
            })
    }

    /// The explicit name, or the identifier's values joined with `_`
    fn root_name(&self, entity: &ObjectTypeDescriptor) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        let bindings = entity.path.bind_identifier(&self.identifier)?;
        if bindings.is_empty() {
            return Ok(entity.name.clone());
        }
        Ok(bindings
            .iter()
            .map(|b| b.value.as_str())
            .collect::<Vec<_>>()
            .join("_"))
    }
}

/// Discover everything below `root` and link cross-object references
///
/// Any fetch failure other than a missing child collection aborts the run.
pub fn discover<A: ManagementApi>(
    catalog: &Catalog,
    api: A,
    root: &RootSelector,
) -> Result<ResourceCollection> {
    let entity = root.resolve(catalog)?;
    let root_name = root.root_name(entity)?;
    let graph = RelationshipGraph::build(catalog);
    let mut session = DiscoverySession::new();

    Walker::new(catalog, &graph, api).walk(
        &mut session,
        entity,
        &root.identifier,
        &root_name,
    )?;

    let linked = link_dependencies(session.collection_mut(), &catalog.links);
    info!(
        "Discovered {} resource(s), linked {} reference(s)",
        session.collection().len(),
        linked
    );

    Ok(session.into_collection())
}
