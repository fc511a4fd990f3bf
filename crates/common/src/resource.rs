//! Discovered resources and their configuration values
//!
//! A [`ResourceCollection`] is built by the discovery walker, rewritten in
//! place by the dependency linker and finally rendered to text. Values are
//! kept typed until rendering so the linker can compare string literals
//! without undoing any escaping.

use indexmap::IndexMap;

/// A configuration value ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HclValue {
    /// Unescaped string literal
    String(String),
    Integer(i64),
    Boolean(bool),
    /// Nested object; fields are written in the stored order
    Object(Vec<(String, HclValue)>),
    /// Structured reference such as `example_container.alpha.container_name`
    Reference(String),
}

impl HclValue {
    /// Format as configuration-language text
    ///
    /// # Examples
    ///
    /// ```
    /// use hemmer_config_generator_common::HclValue;
    ///
    /// assert_eq!(HclValue::String("a\"b".into()).to_hcl(), r#""a\"b""#);
    /// assert_eq!(HclValue::String("${x}".into()).to_hcl(), r#""$${x}""#);
    /// assert_eq!(HclValue::Integer(-4).to_hcl(), "-4");
    /// ```
    pub fn to_hcl(&self) -> String {
        match self {
            HclValue::String(s) => quote(s),
            HclValue::Integer(i) => i.to_string(),
            HclValue::Boolean(b) => b.to_string(),
            HclValue::Object(fields) if fields.is_empty() => "{}".to_string(),
            HclValue::Object(fields) => {
                let inner = fields
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value.to_hcl()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {} }}", inner)
            }
            HclValue::Reference(r) => r.clone(),
        }
    }

    /// The literal text of a string value
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            HclValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Quote and escape a string, neutralizing template sequences
///
/// Only the escapes the configuration language accepts are produced:
/// `\n`, `\r`, `\t`, `\"`, `\\` and `\uNNNN` for other control characters.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out.replace("${", "$${").replace("%{", "%%{")
}

/// One attribute assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    pub value: HclValue,
    /// Full comment text including the leading `#`
    pub comment: Option<String>,
}

impl AttributeEntry {
    pub fn new(value: HclValue) -> Self {
        Self {
            value,
            comment: None,
        }
    }

    pub fn with_comment(value: HclValue, comment: impl Into<String>) -> Self {
        Self {
            value,
            comment: Some(comment.into()),
        }
    }
}

/// One generated resource block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Output type name (e.g., "solacebroker_msg_vpn_queue")
    pub type_name: String,
    /// Grammar-valid token, unique per type within a run
    pub token: String,
    /// Attributes keyed by configuration name, in projection order
    pub attributes: IndexMap<String, AttributeEntry>,
}

impl Resource {
    /// The `<type>.<token>` address used in references
    pub fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.token)
    }
}

/// Ordered resources of one discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCollection {
    resources: Vec<Resource>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource; its address must not be taken yet
    pub fn push(&mut self, resource: Resource) {
        debug_assert!(!self.contains(&resource.type_name, &resource.token));
        self.resources.push(resource);
    }

    pub fn contains(&self, type_name: &str, token: &str) -> bool {
        self.resources
            .iter()
            .any(|r| r.type_name == type_name && r.token == token)
    }

    pub fn get(&self, type_name: &str, token: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.type_name == type_name && r.token == token)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Resource] {
        &mut self.resources
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}
