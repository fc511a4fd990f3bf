//! Parent/child relationships between object types
//!
//! Types are related purely by path template nesting: a type whose template,
//! with placeholders removed, extends another type's by one segment is that
//! type's child.

use hemmer_config_generator_common::Catalog;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::warn;

/// Object type → child object types, built once per run
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    children: IndexMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl RelationshipGraph {
    /// Build the graph over every catalog entity
    ///
    /// Children are listed in catalog order. When two entities share a
    /// signature the later one takes it over and a warning is logged.
    pub fn build(catalog: &Catalog) -> Self {
        let mut by_signature: HashMap<String, &str> = HashMap::new();
        for entity in catalog.entities() {
            let signature = entity.path.signature();
            if let Some(previous) = by_signature.insert(signature.clone(), &entity.name) {
                warn!(
                    "Entities {} and {} share the path signature '{}'; using {}",
                    previous, entity.name, signature, entity.name
                );
            }
        }

        let mut graph = RelationshipGraph {
            children: catalog
                .entities()
                .iter()
                .map(|e| (e.name.clone(), Vec::new()))
                .collect(),
            roots: Vec::new(),
        };

        for entity in catalog.entities() {
            let parent = parent_signature(&entity.path.signature())
                .and_then(|sig| by_signature.get(sig).copied())
                .filter(|parent| *parent != entity.name);

            match parent {
                Some(parent) => {
                    if let Some(children) = graph.children.get_mut(parent) {
                        children.push(entity.name.clone());
                    }
                }
                None => graph.roots.push(entity.name.clone()),
            }
        }

        graph
    }

    /// Child types of `entity`, in catalog order
    pub fn children(&self, entity: &str) -> &[String] {
        self.children.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Types with no parent in the catalog
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// `entity` and everything below it, depth first
    pub fn descendants<'a>(&'a self, entity: &'a str) -> Vec<(usize, &'a str)> {
        let mut out = Vec::new();
        self.collect(entity, 0, &mut out);
        out
    }

    fn collect<'a>(&'a self, entity: &'a str, depth: usize, out: &mut Vec<(usize, &'a str)>) {
        out.push((depth, entity));
        for child in self.children(entity) {
            self.collect(child, depth + 1, out);
        }
    }
}

fn parent_signature(signature: &str) -> Option<&str> {
    match signature.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Some(parent),
        _ => None,
    }
}
