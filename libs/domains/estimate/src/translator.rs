//! Resource Translator (component F): expands a parsed configuration's
//! resource blocks into the flat list of concrete resource instances the
//! matcher registry consumes.

use crate::model::{AttrExpr, ExpandedResource, Multiplicity, ParsedConfig};
use std::collections::HashMap;

/// Evaluation environment built once per config: `var.*` from variable
/// defaults, `local.*` from the locals block evaluated under `var.*`.
/// Single pass — a local referencing another local that itself needs
/// resolving is left `Unknown` rather than iterated to a fixed point.
struct Env {
    vars: HashMap<String, serde_json::Value>,
    locals: HashMap<String, serde_json::Value>,
}

impl Env {
    fn build(config: &ParsedConfig) -> Self {
        let vars: HashMap<String, serde_json::Value> = config
            .variables
            .iter()
            .filter_map(|(name, var)| var.default.clone().map(|v| (name.clone(), v)))
            .collect();

        let locals = config
            .locals
            .iter()
            .filter_map(|(name, expr)| resolve(expr, &vars, &HashMap::new()).map(|v| (name.clone(), v)))
            .collect();

        Self { vars, locals }
    }

    fn resolve(&self, expr: &AttrExpr) -> Option<serde_json::Value> {
        resolve(expr, &self.vars, &self.locals)
    }
}

fn resolve(
    expr: &AttrExpr,
    vars: &HashMap<String, serde_json::Value>,
    locals: &HashMap<String, serde_json::Value>,
) -> Option<serde_json::Value> {
    match expr {
        AttrExpr::Literal(v) => Some(v.clone()),
        AttrExpr::VarRef(name) => vars.get(name).cloned(),
        AttrExpr::LocalRef(name) => locals.get(name).cloned(),
        AttrExpr::Unknown => None,
    }
}

/// Expands every resource block in `config`, skipping unresolvable
/// attributes rather than failing the whole translation.
pub fn expand(config: &ParsedConfig) -> Vec<ExpandedResource> {
    let env = Env::build(config);
    let mut expanded = Vec::new();

    for block in &config.resources {
        let resolved_config: HashMap<String, serde_json::Value> = block
            .config
            .iter()
            .filter_map(|(key, expr)| env.resolve(expr).map(|v| (key.clone(), v)))
            .collect();

        match &block.multiplicity {
            Multiplicity::Single => {
                expanded.push(ExpandedResource {
                    address: format!("{}.{}", block.resource_type, block.name),
                    resource_type: block.resource_type.clone(),
                    name: block.name.clone(),
                    config: resolved_config,
                });
            }
            Multiplicity::Count(n) => {
                for i in 0..*n {
                    expanded.push(ExpandedResource {
                        address: format!("{}.{}[{}]", block.resource_type, block.name, i),
                        resource_type: block.resource_type.clone(),
                        name: block.name.clone(),
                        config: resolved_config.clone(),
                    });
                }
            }
            Multiplicity::ForEach(keys) => {
                for key in keys {
                    expanded.push(ExpandedResource {
                        address: format!("{}.{}[\"{}\"]", block.resource_type, block.name, key),
                        resource_type: block.resource_type.clone(),
                        name: block.name.clone(),
                        config: resolved_config.clone(),
                    });
                }
            }
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;
    use serde_json::json;

    fn config_with(block: crate::model::ResourceBlock) -> ParsedConfig {
        ParsedConfig {
            variables: HashMap::new(),
            locals: HashMap::new(),
            resources: vec![block],
        }
    }

    #[test]
    fn single_resource_has_plain_address() {
        let block = crate::model::ResourceBlock {
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            multiplicity: Multiplicity::Single,
            config: HashMap::new(),
        };
        let expanded = expand(&config_with(block));
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].address, "aws_instance.web");
    }

    #[test]
    fn count_expands_to_indexed_addresses() {
        let block = crate::model::ResourceBlock {
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            multiplicity: Multiplicity::Count(3),
            config: HashMap::new(),
        };
        let expanded = expand(&config_with(block));
        let addresses: Vec<_> = expanded.iter().map(|r| r.address.clone()).collect();
        assert_eq!(addresses, vec!["aws_instance.web[0]", "aws_instance.web[1]", "aws_instance.web[2]"]);
    }

    #[test]
    fn for_each_expands_to_keyed_addresses() {
        let block = crate::model::ResourceBlock {
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            multiplicity: Multiplicity::ForEach(vec!["blue".to_string(), "green".to_string()]),
            config: HashMap::new(),
        };
        let expanded = expand(&config_with(block));
        let addresses: Vec<_> = expanded.iter().map(|r| r.address.clone()).collect();
        assert_eq!(addresses, vec!["aws_instance.web[\"blue\"]", "aws_instance.web[\"green\"]"]);
    }

    #[test]
    fn var_ref_resolves_through_default() {
        let mut variables = HashMap::new();
        variables.insert(
            "instance_type".to_string(),
            Variable { name: "instance_type".to_string(), default: Some(json!("t3.micro")) },
        );
        let mut attrs = HashMap::new();
        attrs.insert("instance_type".to_string(), AttrExpr::VarRef("instance_type".to_string()));
        let config = ParsedConfig {
            variables,
            locals: HashMap::new(),
            resources: vec![crate::model::ResourceBlock {
                resource_type: "aws_instance".to_string(),
                name: "web".to_string(),
                multiplicity: Multiplicity::Single,
                config: attrs,
            }],
        };
        let expanded = expand(&config);
        assert_eq!(expanded[0].config.get("instance_type"), Some(&json!("t3.micro")));
    }

    #[test]
    fn unknown_attribute_is_skipped_not_failed() {
        let mut attrs = HashMap::new();
        attrs.insert("computed_arn".to_string(), AttrExpr::Unknown);
        let block = crate::model::ResourceBlock {
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            multiplicity: Multiplicity::Single,
            config: attrs,
        };
        let expanded = expand(&config_with(block));
        assert!(!expanded[0].config.contains_key("computed_arn"));
    }
}
