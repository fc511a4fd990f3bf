//! Parsed REST path templates
//!
//! A template such as `/msgVpns/{msgVpnName}/queues/{queueName}` is parsed once
//! at catalog load into segments of literal text and named placeholders. The
//! parsed form is reused for every request path, collection path, signature
//! and resource name derived from it.

use crate::{GeneratorError, Result};
use std::fmt;

/// One piece of a path segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentPart {
    Literal(String),
    Placeholder(String),
}

/// One `/`-separated segment of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    parts: Vec<SegmentPart>,
}

impl PathSegment {
    /// Whether the segment binds at least one placeholder
    pub fn has_placeholder(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, SegmentPart::Placeholder(_)))
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            SegmentPart::Placeholder(name) => Some(name.as_str()),
            SegmentPart::Literal(_) => None,
        })
    }

    /// Segment text with the placeholder span removed
    ///
    /// Everything from the first placeholder to the last one is dropped,
    /// leaving only literal text outside that span.
    fn signature_text(&self) -> String {
        let first = self
            .parts
            .iter()
            .position(|p| matches!(p, SegmentPart::Placeholder(_)));
        let last = self
            .parts
            .iter()
            .rposition(|p| matches!(p, SegmentPart::Placeholder(_)));

        let keep = |range: &[SegmentPart]| -> String {
            range
                .iter()
                .filter_map(|p| match p {
                    SegmentPart::Literal(l) => Some(l.as_str()),
                    SegmentPart::Placeholder(_) => None,
                })
                .collect()
        };

        match (first, last) {
            (Some(first), Some(last)) => {
                format!("{}{}", keep(&self.parts[..first]), keep(&self.parts[last + 1..]))
            }
            _ => keep(&self.parts),
        }
    }
}

/// A named value bound to a template placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: String,
}

/// Ordered placeholder bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(Vec<Binding>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Binding {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is an ordered prefix of these bindings
    pub fn starts_with(&self, prefix: &Bindings) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl FromIterator<(String, String)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Bindings(
            iter.into_iter()
                .map(|(name, value)| Binding { name, value })
                .collect(),
        )
    }
}

/// A parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    /// Parse a template like `/containers/{containerName}/items/{itemName}`
    pub fn parse(raw: &str) -> Result<Self> {
        let body = raw.strip_prefix('/').ok_or_else(|| {
            GeneratorError::Catalog(format!("Path template must start with '/': {}", raw))
        })?;
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for text in body.split('/') {
                if text.is_empty() {
                    return Err(GeneratorError::Catalog(format!(
                        "Empty segment in path template: {}",
                        raw
                    )));
                }
                segments.push(parse_segment(text, raw)?);
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// All placeholder names in template order
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flat_map(|s| s.placeholders())
    }

    /// Template with placeholder segments removed
    ///
    /// `/msgVpns/{msgVpnName}/queues/{queueName}` becomes `/msgVpns/queues`.
    /// Segments left empty are collapsed; a template made only of
    /// placeholders has an empty signature.
    pub fn signature(&self) -> String {
        let kept: Vec<String> = self
            .segments
            .iter()
            .map(PathSegment::signature_text)
            .filter(|s| !s.is_empty())
            .collect();
        if kept.is_empty() {
            String::new()
        } else {
            format!("/{}", kept.join("/"))
        }
    }

    /// Split off the trailing placeholder segment
    ///
    /// Returns the collection template (everything before the last segment)
    /// and the placeholder names the last segment introduces.
    pub fn collection(&self) -> Result<(PathTemplate, Vec<String>)> {
        let last = match self.segments.last() {
            Some(last) if self.segments.len() >= 2 && last.has_placeholder() => last,
            _ => {
                return Err(GeneratorError::PathResolution(format!(
                    "Cannot derive a collection path from template {}",
                    self.raw
                )))
            }
        };

        let prefix = self.segments[..self.segments.len() - 1].to_vec();
        let raw = format!(
            "/{}",
            prefix.iter().map(render_segment).collect::<Vec<_>>().join("/")
        );
        let introduced = last.placeholders().map(String::from).collect();

        Ok((
            PathTemplate {
                raw,
                segments: prefix,
            },
            introduced,
        ))
    }

    /// Substitute bindings into the template, percent-encoding each value
    pub fn resolve(&self, bindings: &Bindings) -> Result<String> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            for part in &segment.parts {
                match part {
                    SegmentPart::Literal(l) => path.push_str(l),
                    SegmentPart::Placeholder(name) => {
                        let value = bindings.get(name).ok_or_else(|| {
                            GeneratorError::PathResolution(format!(
                                "No value for {{{}}} in {}",
                                name, self.raw
                            ))
                        })?;
                        path.push_str(&urlencoding::encode(value));
                    }
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    /// Bind a `/`-separated identifier to the placeholders in order
    ///
    /// Each identifier segment is percent-decoded, so `%2F` can carry a
    /// literal slash. The number of segments must match the number of
    /// placeholders exactly.
    pub fn bind_identifier(&self, identifier: &str) -> Result<Bindings> {
        let names: Vec<&str> = self.placeholders().collect();
        if names.is_empty() && identifier.is_empty() {
            return Ok(Bindings::new());
        }

        let values: Vec<&str> = identifier.split('/').collect();
        if values.len() != names.len() {
            return Err(GeneratorError::PathResolution(format!(
                "Identifier '{}' has {} segment(s) but {} requires {}: {}",
                identifier,
                values.len(),
                self.raw,
                names.len(),
                names
                    .iter()
                    .map(|n| format!("{{{}}}", n))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        names
            .into_iter()
            .zip(values)
            .map(|(name, value)| Ok((name.to_string(), decode(value)?)))
            .collect()
    }

    /// Recover the bindings from a path produced by [`PathTemplate::resolve`]
    pub fn extract(&self, path: &str) -> Result<Bindings> {
        let mismatch = || {
            GeneratorError::PathResolution(format!(
                "Path {} does not match template {}",
                path, self.raw
            ))
        };

        let body = path.strip_prefix('/').ok_or_else(mismatch)?;
        let texts: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('/').collect()
        };
        if texts.len() != self.segments.len() {
            return Err(mismatch());
        }

        let mut bindings = Bindings::new();
        for (segment, text) in self.segments.iter().zip(texts) {
            let captures = match_segment(&segment.parts, text).ok_or_else(mismatch)?;
            for (name, raw) in captures {
                bindings.push(name, decode(raw)?);
            }
        }
        Ok(bindings)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(text: &str, raw: &str) -> Result<PathSegment> {
    let malformed = || GeneratorError::Catalog(format!("Malformed placeholder in path template: {}", raw));

    let mut parts = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find('{') {
            Some(0) => {
                let end = rest.find('}').ok_or_else(malformed)?;
                let name = &rest[1..end];
                if name.is_empty() || name.contains('{') {
                    return Err(malformed());
                }
                parts.push(SegmentPart::Placeholder(name.to_string()));
                rest = &rest[end + 1..];
            }
            Some(start) => {
                parts.push(SegmentPart::Literal(rest[..start].to_string()));
                rest = &rest[start..];
            }
            None => {
                if rest.contains('}') {
                    return Err(malformed());
                }
                parts.push(SegmentPart::Literal(rest.to_string()));
                rest = "";
            }
        }
    }
    Ok(PathSegment { parts })
}

fn render_segment(segment: &PathSegment) -> String {
    segment
        .parts
        .iter()
        .map(|p| match p {
            SegmentPart::Literal(l) => l.clone(),
            SegmentPart::Placeholder(name) => format!("{{{}}}", name),
        })
        .collect()
}

fn match_segment<'a, 'p>(
    parts: &'p [SegmentPart],
    text: &'a str,
) -> Option<Vec<(&'p str, &'a str)>> {
    let mut rest = text;
    let mut captures = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        match part {
            SegmentPart::Literal(l) => rest = rest.strip_prefix(l.as_str())?,
            SegmentPart::Placeholder(name) => match parts.get(i + 1) {
                Some(SegmentPart::Literal(next)) => {
                    let end = rest.find(next.as_str())?;
                    captures.push((name.as_str(), &rest[..end]));
                    rest = &rest[end..];
                }
                // adjacent placeholders have no boundary to split on
                Some(SegmentPart::Placeholder(_)) => return None,
                None => {
                    captures.push((name.as_str(), rest));
                    rest = "";
                }
            },
        }
    }
    rest.is_empty().then_some(captures)
}

fn decode(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| GeneratorError::PathResolution(format!("Invalid escape in '{}': {}", value, e)))
}
