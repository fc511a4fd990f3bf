//! Rewrites name literals into references between resources

use hemmer_config_generator_common::{HclValue, LinkTable, ResourceCollection};
use tracing::{debug, warn};

/// Replace literal dependency names with references to the matching resources
///
/// For every dependent resource and every dependency type declared for it,
/// the resource's own value of the dependency's name attribute is looked up
/// among resources of that type. The first resource (in collection order)
/// carrying the same literal wins; the comment of the rewritten attribute is
/// kept. Literals with no match are left alone. Returns the number of
/// references created.
pub fn link_dependencies(collection: &mut ResourceCollection, links: &LinkTable) -> usize {
    let mut rewrites: Vec<(usize, String, String)> = Vec::new();

    for (index, resource) in collection.iter().enumerate() {
        let Some(dependencies) = links.dependencies.get(&resource.type_name) else {
            continue;
        };

        for dependency in dependencies {
            let Some(name_attribute) = links.name_attributes.get(dependency) else {
                continue;
            };
            let Some(literal) = resource
                .attributes
                .get(name_attribute)
                .and_then(|entry| entry.value.as_literal())
                .filter(|literal| !literal.is_empty())
            else {
                continue;
            };

            let mut matches = collection.iter().filter(|candidate| {
                &candidate.type_name == dependency
                    && candidate
                        .attributes
                        .get(name_attribute)
                        .and_then(|entry| entry.value.as_literal())
                        == Some(literal)
            });

            let Some(target) = matches.next() else {
                debug!(
                    "No {} named '{}' for {}; keeping the literal",
                    dependency,
                    literal,
                    resource.address()
                );
                continue;
            };
            if let Some(other) = matches.next() {
                warn!(
                    "{} '{}' referenced by {} matches both {} and {}; using {}",
                    dependency,
                    literal,
                    resource.address(),
                    target.address(),
                    other.address(),
                    target.address()
                );
            }

            rewrites.push((
                index,
                name_attribute.clone(),
                format!("{}.{}", target.address(), name_attribute),
            ));
        }
    }

    let count = rewrites.len();
    let resources = collection.as_mut_slice();
    for (index, attribute, reference) in rewrites {
        if let Some(entry) = resources[index].attributes.get_mut(&attribute) {
            entry.value = HclValue::Reference(reference);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemmer_config_generator_common::{AttributeEntry, Resource};
    use indexmap::IndexMap;

    fn resource(type_name: &str, token: &str, attrs: &[(&str, HclValue)]) -> Resource {
        Resource {
            type_name: type_name.into(),
            token: token.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), AttributeEntry::new(v.clone())))
                .collect::<IndexMap<_, _>>(),
        }
    }

    fn links() -> LinkTable {
        let mut links = LinkTable::default();
        links.dependencies.insert(
            "p_client_username".into(),
            vec!["p_client_profile".into(), "p_acl_profile".into()],
        );
        links
            .name_attributes
            .insert("p_client_profile".into(), "client_profile_name".into());
        links
            .name_attributes
            .insert("p_acl_profile".into(), "acl_profile_name".into());
        links
    }

    fn text(s: &str) -> HclValue {
        HclValue::String(s.into())
    }

    #[test]
    fn test_links_matching_literals() {
        let mut collection = ResourceCollection::new();
        collection.push(resource("p_client_profile", "mq_gold", &[("client_profile_name", text("gold"))]));
        collection.push(resource("p_acl_profile", "mq_open", &[("acl_profile_name", text("open"))]));
        let mut user = resource(
            "p_client_username",
            "mq_alice",
            &[
                ("client_profile_name", text("gold")),
                ("acl_profile_name", text("elsewhere")),
            ],
        );
        user.attributes["client_profile_name"].comment = Some("# Note: This attribute is deprecated.".into());
        collection.push(user);

        assert_eq!(link_dependencies(&mut collection, &links()), 1);

        let user = collection.get("p_client_username", "mq_alice").unwrap();
        assert_eq!(
            user.attributes["client_profile_name"],
            AttributeEntry::with_comment(
                HclValue::Reference("p_client_profile.mq_gold.client_profile_name".into()),
                "# Note: This attribute is deprecated."
            )
        );
        assert_eq!(user.attributes["acl_profile_name"].value, text("elsewhere"));
    }

    #[test]
    fn test_first_match_wins() {
        let mut collection = ResourceCollection::new();
        collection.push(resource("p_client_profile", "a", &[("client_profile_name", text("gold"))]));
        collection.push(resource("p_client_profile", "b", &[("client_profile_name", text("gold"))]));
        collection.push(resource("p_client_username", "u", &[("client_profile_name", text("gold"))]));

        link_dependencies(&mut collection, &links());
        assert_eq!(
            collection.get("p_client_username", "u").unwrap().attributes["client_profile_name"].value,
            HclValue::Reference("p_client_profile.a.client_profile_name".into())
        );
    }

    #[test]
    fn test_types_without_dependencies_are_untouched() {
        let mut collection = ResourceCollection::new();
        collection.push(resource("p_client_profile", "a", &[("client_profile_name", text("gold"))]));
        collection.push(resource("p_queue", "q", &[("client_profile_name", text("gold"))]));

        let before = collection.clone();
        assert_eq!(link_dependencies(&mut collection, &links()), 0);
        assert_eq!(collection, before);
    }
}
