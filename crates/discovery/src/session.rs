//! Mutable state of one discovery run

use hemmer_config_generator_common::{AttributeEntry, Record, Resource, ResourceCollection};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Everything a discovery run accumulates
///
/// Owns the resource collection, the raw records keyed by resolved path and
/// the path → address registry. Passed explicitly through the walk.
#[derive(Debug, Default)]
pub struct DiscoverySession {
    collection: ResourceCollection,
    records: HashMap<String, Record>,
    addresses: HashMap<String, String>,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource under a token unique for its type
    ///
    /// `token` gets `__2`, `__3`, ... appended until the address is free.
    /// Returns the final address.
    pub fn add_resource(
        &mut self,
        path: &str,
        type_name: &str,
        token: String,
        record: Record,
        attributes: IndexMap<String, AttributeEntry>,
    ) -> String {
        let token = self.unique_token(type_name, token);
        let resource = Resource {
            type_name: type_name.to_string(),
            token,
            attributes,
        };
        let address = resource.address();

        self.collection.push(resource);
        self.records.insert(path.to_string(), record);
        self.addresses.insert(path.to_string(), address.clone());
        address
    }

    fn unique_token(&self, type_name: &str, token: String) -> String {
        let mut candidate = token.clone();
        let mut n = 2;
        while self.collection.contains(type_name, &candidate) {
            candidate = format!("{}__{}", token, n);
            n += 1;
        }
        candidate
    }

    /// Raw record fetched from `path`
    pub fn record(&self, path: &str) -> Option<&Record> {
        self.records.get(path)
    }

    /// Address assigned to the instance at `path`
    pub fn address(&self, path: &str) -> Option<&str> {
        self.addresses.get(path).map(String::as_str)
    }

    pub fn collection(&self) -> &ResourceCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut ResourceCollection {
        &mut self.collection
    }

    pub fn into_collection(self) -> ResourceCollection {
        self.collection
    }
}
