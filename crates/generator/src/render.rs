//! Resource blocks as configuration text

use hemmer_config_generator_common::{Resource, ResourceCollection};

/// Render every resource, in collection order, separated by blank lines
pub fn render(collection: &ResourceCollection) -> String {
    collection
        .iter()
        .map(render_resource)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one `resource "<type>" "<token>" { ... }` block
///
/// Attributes are sorted by name and the `=` signs line up two columns past
/// the longest name.
pub fn render_resource(resource: &Resource) -> String {
    let mut names: Vec<&String> = resource.attributes.keys().collect();
    names.sort();
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0) + 2;

    let mut out = format!("resource \"{}\" \"{}\" {{\n", resource.type_name, resource.token);
    for name in names {
        let entry = &resource.attributes[name.as_str()];
        let mut line = format!("  {:<width$}= {}", name, entry.value.to_hcl(), width = width);
        if let Some(comment) = &entry.comment {
            line.push_str("  ");
            line.push_str(comment);
        }
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}
