//! Projection of raw API records onto configuration attributes

use hemmer_config_generator_common::{
    to_snake_case, AttributeDescriptor, AttributeEntry, AttributeKind, AttributeValue, Bindings,
    GeneratorError, HclValue, Record, Result,
};
use indexmap::IndexMap;
use tracing::warn;

const DEPRECATED: &str = "# Note: This attribute is deprecated.";
const SYSTEM_PROVISIONED: &str = "# Note: This attribute may be system provisioned.";
const DEPRECATED_AND_SYSTEM_PROVISIONED: &str =
    "# Note: This attribute is deprecated and may also be system provisioned.";

/// The resource an instance was discovered under
#[derive(Debug, Clone, Copy)]
pub struct ParentContext<'a> {
    pub address: &'a str,
    pub bindings: &'a Bindings,
}

/// Turns records into ordered attribute assignments
pub struct AttributeProjector<'a> {
    system_marker: &'a str,
}

impl<'a> AttributeProjector<'a> {
    pub fn new(system_marker: &'a str) -> Self {
        Self { system_marker }
    }

    /// Project `record` through `descriptors`
    ///
    /// Attributes are returned in descriptor order. Sensitive attributes,
    /// read-only non-identifying attributes, absent values, empty strings and
    /// values equal to their default are left out. A value of the wrong shape
    /// drops only that attribute.
    pub fn project(
        &self,
        descriptors: &[AttributeDescriptor],
        record: &Record,
        parent: Option<ParentContext<'_>>,
    ) -> IndexMap<String, AttributeEntry> {
        let mut out = IndexMap::new();

        for descriptor in descriptors {
            if descriptor.sensitive || (descriptor.read_only && !descriptor.identifying) {
                continue;
            }

            let value = match record.get(&descriptor.api_name) {
                Some(raw) => AttributeValue::from_json(raw),
                None => continue,
            };
            if value.is_null() {
                continue;
            }

            if let Some(reference) = parent_reference(descriptor, &value, parent) {
                out.insert(descriptor.name.clone(), AttributeEntry::new(reference));
                continue;
            }

            if descriptor.default.as_ref() == Some(&value) || is_default_object(descriptor, &value) {
                continue;
            }

            let formatted = match format_value(descriptor, &value) {
                Ok(Some(formatted)) => formatted,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping attribute: {}", e);
                    continue;
                }
            };

            let entry = match self.comment(descriptor, &value) {
                Some(comment) => AttributeEntry::with_comment(formatted, comment),
                None => AttributeEntry::new(formatted),
            };
            out.insert(descriptor.name.clone(), entry);
        }

        out
    }

    fn comment(&self, descriptor: &AttributeDescriptor, value: &AttributeValue) -> Option<&'static str> {
        let system_provisioned = descriptor.identifying
            && !self.system_marker.is_empty()
            && value
                .as_str()
                .is_some_and(|s| s.starts_with(self.system_marker));

        match (descriptor.deprecated, system_provisioned) {
            (true, true) => Some(DEPRECATED_AND_SYSTEM_PROVISIONED),
            (true, false) => Some(DEPRECATED),
            (false, true) => Some(SYSTEM_PROVISIONED),
            (false, false) => None,
        }
    }
}

/// Reference to the parent's attribute when an identifying value repeats
/// the parent's binding
fn parent_reference(
    descriptor: &AttributeDescriptor,
    value: &AttributeValue,
    parent: Option<ParentContext<'_>>,
) -> Option<HclValue> {
    let parent = parent?;
    if !descriptor.identifying {
        return None;
    }
    let bound = parent.bindings.get(&descriptor.api_name)?;
    (value.as_identifier().as_deref() == Some(bound))
        .then(|| HclValue::Reference(format!("{}.{}", parent.address, descriptor.name)))
}

/// Whether every leaf of an object value equals its own default
///
/// Leaf defaults come from the attribute's object default first, then from
/// the nested descriptor. Null leaves count as equal.
fn is_default_object(descriptor: &AttributeDescriptor, value: &AttributeValue) -> bool {
    let (AttributeKind::Object, AttributeValue::Object(fields)) = (descriptor.kind, value) else {
        return false;
    };
    let object_default = match &descriptor.default {
        Some(AttributeValue::Object(defaults)) => Some(defaults),
        _ => None,
    };

    fields.iter().all(|(api_name, leaf)| {
        if leaf.is_null() {
            return true;
        }
        let leaf_default = object_default
            .and_then(|d| d.get(api_name))
            .or_else(|| {
                descriptor
                    .attributes
                    .iter()
                    .find(|n| &n.api_name == api_name)
                    .and_then(|n| n.default.as_ref())
            });
        leaf_default == Some(leaf)
    })
}

/// Kind-checked conversion to a configuration value
///
/// `Ok(None)` means the value is present but has nothing to write.
fn format_value(descriptor: &AttributeDescriptor, value: &AttributeValue) -> Result<Option<HclValue>> {
    let mismatch = || GeneratorError::Format {
        attribute: descriptor.api_name.clone(),
        reason: format!(
            "expected {}, found {}",
            descriptor.kind.as_str(),
            value.type_name()
        ),
    };

    match (descriptor.kind, value) {
        (AttributeKind::String, AttributeValue::String(s)) if s.is_empty() => Ok(None),
        (AttributeKind::String, AttributeValue::String(s)) => Ok(Some(HclValue::String(s.clone()))),
        (AttributeKind::Integer, AttributeValue::Integer(i)) => Ok(Some(HclValue::Integer(*i))),
        (AttributeKind::Boolean, AttributeValue::Boolean(b)) => Ok(Some(HclValue::Boolean(*b))),
        (AttributeKind::Object, AttributeValue::Object(fields)) => {
            let mut formatted = Vec::with_capacity(fields.len());
            for (api_name, leaf) in fields {
                if leaf.is_null() {
                    continue;
                }
                let nested = descriptor.attributes.iter().find(|n| &n.api_name == api_name);
                let name = nested
                    .map(|n| n.name.clone())
                    .unwrap_or_else(|| to_snake_case(api_name));
                let leaf_value = match nested {
                    Some(nested) => format_value(nested, leaf)?,
                    None => format_untyped(&descriptor.api_name, api_name, leaf)?,
                };
                if let Some(leaf_value) = leaf_value {
                    formatted.push((name, leaf_value));
                }
            }
            formatted.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Some(HclValue::Object(formatted)))
        }
        _ => Err(mismatch()),
    }
}

/// Format a nested leaf the catalog does not describe, by its own shape
fn format_untyped(parent: &str, api_name: &str, leaf: &AttributeValue) -> Result<Option<HclValue>> {
    match leaf {
        AttributeValue::String(s) => Ok(Some(HclValue::String(s.clone()))),
        AttributeValue::Integer(i) => Ok(Some(HclValue::Integer(*i))),
        AttributeValue::Boolean(b) => Ok(Some(HclValue::Boolean(*b))),
        other => Err(GeneratorError::Format {
            attribute: format!("{}.{}", parent, api_name),
            reason: format!("unsupported nested {}", other.type_name()),
        }),
    }
}
