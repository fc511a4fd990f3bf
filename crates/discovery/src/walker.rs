//! Depth-first discovery of object instances

use crate::graph::RelationshipGraph;
use crate::naming::resource_token;
use crate::projector::{AttributeProjector, ParentContext};
use crate::session::DiscoverySession;
use hemmer_config_generator_common::{
    AttributeValue, Bindings, Catalog, FetchError, GeneratorError, ManagementApi,
    ObjectTypeDescriptor, Record, Result,
};
use tracing::{debug, info};

/// One discovered object
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    /// Catalog entity name
    pub entity: String,
    /// Values for every placeholder of the entity's template, in order
    pub bindings: Bindings,
    /// Resolved request path
    pub path: String,
    /// Address of the generated resource
    pub address: String,
}

/// Walks the object graph below one root instance
pub struct Walker<'a, A> {
    catalog: &'a Catalog,
    graph: &'a RelationshipGraph,
    api: A,
    projector: AttributeProjector<'a>,
    root_segments: usize,
    root_name: String,
}

impl<'a, A: ManagementApi> Walker<'a, A> {
    pub fn new(catalog: &'a Catalog, graph: &'a RelationshipGraph, api: A) -> Self {
        Self {
            catalog,
            graph,
            api,
            projector: AttributeProjector::new(&catalog.system_marker),
            root_segments: 0,
            root_name: String::new(),
        }
    }

    /// Discover the instance of `entity` named by `identifier` and everything
    /// below it
    ///
    /// `root_name` replaces the root's share of every descendant token.
    pub fn walk(
        &mut self,
        session: &mut DiscoverySession,
        entity: &ObjectTypeDescriptor,
        identifier: &str,
        root_name: &str,
    ) -> Result<ObjectInstance> {
        self.root_segments = entity.path.segments().len();
        self.root_name = root_name.to_string();

        let bindings = entity.path.bind_identifier(identifier)?;
        let path = entity.path.resolve(&bindings)?;

        let record = match self.api.fetch(&path) {
            Ok(records) => records.into_iter().next(),
            Err(FetchError::NotFound) => None,
            Err(e) => return Err(GeneratorError::from_fetch(&path, e)),
        }
        .ok_or_else(|| GeneratorError::NotFound(path.clone()))?;

        info!("Fetched {} {}", entity.output_type, path);
        let root = self.materialize(session, entity, bindings, path, record, None)?;
        self.walk_children(session, &root)?;
        Ok(root)
    }

    fn walk_children(&self, session: &mut DiscoverySession, parent: &ObjectInstance) -> Result<()> {
        for child in self.graph.children(&parent.entity) {
            let entity = self.catalog.entity(child).ok_or_else(|| {
                GeneratorError::Catalog(format!("Unknown entity {} in relationship graph", child))
            })?;
            self.walk_collection(session, entity, parent)?;
        }
        Ok(())
    }

    /// Fetch every instance of `entity` under `parent` and recurse into each
    fn walk_collection(
        &self,
        session: &mut DiscoverySession,
        entity: &ObjectTypeDescriptor,
        parent: &ObjectInstance,
    ) -> Result<()> {
        let last_is_placeholder = entity
            .path
            .segments()
            .last()
            .is_some_and(|s| s.has_placeholder());
        if !last_is_placeholder {
            return self.walk_singleton(session, entity, parent);
        }

        let (collection, introduced) = entity.path.collection()?;
        let collection_path = collection.resolve(&parent.bindings)?;
        let records = self.fetch_optional(&collection_path)?;
        info!(
            "Fetched {} {} instance(s) under {}",
            records.len(),
            entity.output_type,
            parent.address
        );

        'records: for record in records {
            let mut bindings = parent.bindings.clone();
            for name in &introduced {
                let value = identifier_value(&record, name).ok_or_else(|| {
                    GeneratorError::PathResolution(format!(
                        "Record from {} has no usable value for {}",
                        collection_path, name
                    ))
                })?;
                if self.catalog.is_system_provisioned(&value) {
                    debug!("Skipping system provisioned {} '{}'", entity.output_type, value);
                    continue 'records;
                }
                bindings.push(name.clone(), value);
            }

            debug_assert!(bindings.starts_with(&parent.bindings));

            let path = entity.path.resolve(&bindings)?;
            let instance = self.materialize(session, entity, bindings, path, record, Some(parent))?;
            self.walk_children(session, &instance)?;
        }
        Ok(())
    }

    /// Child types whose template ends in a literal have at most one instance
    fn walk_singleton(
        &self,
        session: &mut DiscoverySession,
        entity: &ObjectTypeDescriptor,
        parent: &ObjectInstance,
    ) -> Result<()> {
        let path = entity.path.resolve(&parent.bindings)?;
        let Some(record) = self.fetch_optional(&path)?.into_iter().next() else {
            debug!("No {} at {}", entity.output_type, path);
            return Ok(());
        };

        info!("Fetched {} {}", entity.output_type, path);
        let instance =
            self.materialize(session, entity, parent.bindings.clone(), path, record, Some(parent))?;
        self.walk_children(session, &instance)
    }

    /// Fetch where a missing object or collection means "nothing there"
    fn fetch_optional(&self, path: &str) -> Result<Vec<Record>> {
        match self.api.fetch(path) {
            Ok(records) => Ok(records),
            Err(FetchError::NotFound) => {
                debug!("Nothing at {}", path);
                Ok(Vec::new())
            }
            Err(e) => Err(GeneratorError::from_fetch(path, e)),
        }
    }

    /// Project, name and record one instance
    fn materialize(
        &self,
        session: &mut DiscoverySession,
        entity: &ObjectTypeDescriptor,
        bindings: Bindings,
        path: String,
        record: Record,
        parent: Option<&ObjectInstance>,
    ) -> Result<ObjectInstance> {
        let attributes = self.projector.project(
            &entity.attributes,
            &record,
            parent.map(|p| ParentContext {
                address: &p.address,
                bindings: &p.bindings,
            }),
        );
        let token = resource_token(&entity.path, &bindings, self.root_segments, &self.root_name)?;
        let address = session.add_resource(&path, &entity.output_type, token, record, attributes);
        debug!("{} -> {}", path, address);

        Ok(ObjectInstance {
            entity: entity.name.clone(),
            bindings,
            path,
            address,
        })
    }
}

/// A record field usable as a path identifier
fn identifier_value(record: &Record, name: &str) -> Option<String> {
    record
        .get(name)
        .map(AttributeValue::from_json)
        .and_then(|v| v.as_identifier())
}
