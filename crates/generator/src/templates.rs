//! Template loading and management

use hemmer_config_generator_common::{GeneratorError, HclValue, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("hcl_quote", hcl_quote_filter);

    tera.add_raw_template("config.tf", include_str!("../templates/config.tf.tera"))
        .map_err(|e| {
            GeneratorError::Generation(format!("Failed to load config.tf template: {}", e))
        })?;

    Ok(tera)
}

/// Filter to write a value as a quoted, escaped configuration string
fn hcl_quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("hcl_quote filter expects a string"))?;

    Ok(Value::String(HclValue::String(s.to_string()).to_hcl()))
}
