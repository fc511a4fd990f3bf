//! Resource token derivation

use hemmer_config_generator_common::{Bindings, GeneratorError, PathTemplate, Result};
use unicode_ident::{is_xid_continue, is_xid_start};

/// Build the raw token for an instance of `template`
///
/// The first `root_segments` segments (the traversal root's share of the
/// template) become `root_name`. Each later literal segment adds `_` and each
/// placeholder segment adds its bound values, concatenated.
pub fn resource_token(
    template: &PathTemplate,
    bindings: &Bindings,
    root_segments: usize,
    root_name: &str,
) -> Result<String> {
    let mut raw = root_name.to_string();

    for segment in template.segments().iter().skip(root_segments) {
        if !segment.has_placeholder() {
            raw.push('_');
            continue;
        }
        for name in segment.placeholders() {
            let value = bindings.get(name).ok_or_else(|| {
                GeneratorError::PathResolution(format!(
                    "No value for {{{}}} while naming an instance of {}",
                    name, template
                ))
            })?;
            raw.push_str(value);
        }
    }

    Ok(sanitize_identifier(&raw))
}

/// Replace every character the identifier grammar rejects with `-`
///
/// Identifiers start with an XID_Start character, `_` or `-` and continue
/// with XID_Continue characters or `-`.
///
/// # Examples
///
/// ```
/// use hemmer_config_generator_discovery::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("default_my.queue"), "default_my-queue");
/// assert_eq!(sanitize_identifier("1st"), "-st");
/// ```
pub fn sanitize_identifier(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }

    raw.chars()
        .enumerate()
        .map(|(i, c)| {
            let allowed = c == '-'
                || if i == 0 {
                    c == '_' || is_xid_start(c)
                } else {
                    is_xid_continue(c)
                };
            if allowed {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_root_instance_uses_root_name() {
        let t = PathTemplate::parse("/msgVpns/{msgVpnName}").unwrap();
        let token = resource_token(&t, &bindings(&[("msgVpnName", "default")]), 2, "mq").unwrap();
        assert_eq!(token, "mq");
    }

    #[test]
    fn test_descendant_tokens() {
        let t = PathTemplate::parse("/msgVpns/{msgVpnName}/queues/{queueName}").unwrap();
        let b = bindings(&[("msgVpnName", "default"), ("queueName", "orders")]);
        assert_eq!(resource_token(&t, &b, 2, "mq").unwrap(), "mq_orders");

        let t = PathTemplate::parse(
            "/msgVpns/{msgVpnName}/queues/{queueName}/subscriptions/{subscriptionTopic}",
        )
        .unwrap();
        let b = bindings(&[
            ("msgVpnName", "default"),
            ("queueName", "orders"),
            ("subscriptionTopic", "a/b/>"),
        ]);
        assert_eq!(resource_token(&t, &b, 2, "mq").unwrap(), "mq_orders_a-b--");
    }

    #[test]
    fn test_multi_placeholder_segment_concatenates() {
        let t = PathTemplate::parse("/acl/{profile}/exceptions/{syntax},{topic}").unwrap();
        let b = bindings(&[("profile", "p"), ("syntax", "smf"), ("topic", "t")]);
        assert_eq!(resource_token(&t, &b, 2, "root").unwrap(), "root_smft");
    }

    #[test]
    fn test_missing_binding_is_an_error() {
        let t = PathTemplate::parse("/a/{x}/b/{y}").unwrap();
        assert!(resource_token(&t, &bindings(&[("x", "1")]), 2, "r").is_err());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("ok_name-1"), "ok_name-1");
        assert_eq!(sanitize_identifier("#client-profile"), "-client-profile");
        assert_eq!(sanitize_identifier("a b.c/d"), "a-b-c-d");
        assert_eq!(sanitize_identifier("9lives"), "-lives");
        assert_eq!(sanitize_identifier("ünï"), "ünï");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn test_sanitize_identifier_unicode_classes() {
        // other numbers are not identifier characters
        assert_eq!(sanitize_identifier("q²"), "q-");
        assert_eq!(sanitize_identifier("q½"), "q-");
        assert_eq!(sanitize_identifier("²q"), "-q");
        // combining marks continue an identifier but cannot start one
        assert_eq!(sanitize_identifier("cafe\u{301}"), "cafe\u{301}");
        assert_eq!(sanitize_identifier("\u{301}cafe"), "-cafe");
        assert_eq!(sanitize_identifier("_x"), "_x");
        assert_eq!(sanitize_identifier("a\u{2028}b"), "a-b");
    }
}
