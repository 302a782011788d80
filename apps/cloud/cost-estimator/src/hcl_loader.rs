//! Loads Terraform/HCL configuration into a [`domain_estimate::ParsedConfig`].
//!
//! This module owns the one boundary the core estimate domain deliberately
//! does not cross: turning raw `.tf` text into the AST the translator
//! expands. It resolves only what the parser itself can see -- variable
//! and resource blocks, `count`/`for_each` as written, `var.*`/`local.*`
//! references -- and leaves everything else (default merging, expansion)
//! to `domain_estimate::translator`.

use crate::error::{IngestError, IngestResult};
use domain_estimate::model::{AttrExpr, Multiplicity, ParsedConfig, ResourceBlock, Variable};
use hcl::expr::{Expression, TraversalOperator};
use hcl::Body;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Component, Path};

/// Parses a single HCL document (the contents of one `.tf` file).
pub fn parse_hcl(source: &str) -> IngestResult<ParsedConfig> {
    let body: Body = hcl::parse(source).map_err(|e| IngestError::MalformedDocument(e.to_string()))?;
    Ok(body_to_config(body))
}

/// Parses every `.tf` file under a directory (as extracted from a zip)
/// and merges them into one [`ParsedConfig`], the way Terraform treats a
/// whole module directory as one configuration.
pub fn parse_hcl_dir(dir: &Path) -> IngestResult<ParsedConfig> {
    let mut merged = ParsedConfig::default();

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tf"))
        .collect();
    entries.sort();

    for path in entries {
        let source = std::fs::read_to_string(&path)?;
        let config = parse_hcl(&source)?;
        merged.variables.extend(config.variables);
        merged.locals.extend(config.locals);
        merged.resources.extend(config.resources);
    }

    Ok(merged)
}

fn body_to_config(body: Body) -> ParsedConfig {
    let mut config = ParsedConfig::default();

    for block in body.into_blocks() {
        match block.identifier() {
            "variable" => {
                if let Some(name) = block.labels().first() {
                    let default = block
                        .body()
                        .attributes()
                        .find(|a| a.key() == "default")
                        .map(|a| expression_to_json(a.expr()));
                    config.variables.insert(
                        name.as_str().to_string(),
                        Variable {
                            name: name.as_str().to_string(),
                            default,
                        },
                    );
                }
            }
            "locals" => {
                for attr in block.body().attributes() {
                    config
                        .locals
                        .insert(attr.key().to_string(), expression_to_attr(attr.expr()));
                }
            }
            "resource" => {
                let labels = block.labels();
                if labels.len() < 2 {
                    continue;
                }
                let resource_type = labels[0].as_str().to_string();
                let name = labels[1].as_str().to_string();
                let multiplicity = resolve_multiplicity(&block);
                let mut attrs = HashMap::new();
                for attr in block.body().attributes() {
                    if attr.key() == "count" || attr.key() == "for_each" {
                        continue;
                    }
                    attrs.insert(attr.key().to_string(), expression_to_attr(attr.expr()));
                }
                config.resources.push(ResourceBlock {
                    resource_type,
                    name,
                    multiplicity,
                    config: attrs,
                });
            }
            _ => {}
        }
    }

    config
}

fn resolve_multiplicity(block: &hcl::Block) -> Multiplicity {
    if let Some(attr) = block.body().attributes().find(|a| a.key() == "count") {
        return match expression_to_json(attr.expr()) {
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|v| Multiplicity::Count(v as u32))
                .unwrap_or(Multiplicity::Single),
            _ => Multiplicity::Single,
        };
    }

    if let Some(attr) = block.body().attributes().find(|a| a.key() == "for_each") {
        return match attr.expr() {
            Expression::Array(items) => Multiplicity::ForEach(
                items
                    .iter()
                    .map(|item| match item {
                        Expression::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            Expression::Object(map) => Multiplicity::ForEach(map.keys().map(|k| k.to_string()).collect()),
            _ => Multiplicity::Single,
        };
    }

    Multiplicity::Single
}

/// Resolves an HCL expression into the translator's `AttrExpr`: a literal
/// value, a `var.*`/`local.*` reference, or `Unknown` for anything the
/// parser can't determine statically (function calls, interpolations
/// over unresolved values, etc).
fn expression_to_attr(expr: &Expression) -> AttrExpr {
    match expr {
        Expression::Traversal(traversal) => {
            let root = traversal.expr.to_string();
            let Some(TraversalOperator::GetAttr(attr)) = traversal.operators.first() else {
                return AttrExpr::Unknown;
            };
            match root.as_str() {
                "var" => AttrExpr::VarRef(attr.as_str().to_string()),
                "local" => AttrExpr::LocalRef(attr.as_str().to_string()),
                _ => AttrExpr::Unknown,
            }
        }
        Expression::Null
        | Expression::Bool(_)
        | Expression::Number(_)
        | Expression::String(_)
        | Expression::Array(_)
        | Expression::Object(_) => AttrExpr::Literal(expression_to_json(expr)),
        _ => AttrExpr::Unknown,
    }
}

fn expression_to_json(expr: &Expression) -> serde_json::Value {
    serde_json::to_value(expr).unwrap_or(serde_json::Value::Null)
}

/// Extracts a base64-decoded zip of Terraform files to a fresh temp
/// directory, rejecting any entry whose cleaned path would escape it
/// ("zip slip"). The directory is removed when the returned handle drops,
/// on every exit path.
pub fn extract_zip_base64(encoded: &str) -> IngestResult<tempfile::TempDir> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| IngestError::MalformedDocument(format!("invalid base64: {e}")))?;
    extract_zip_bytes(&bytes)
}

pub fn extract_zip_bytes(bytes: &[u8]) -> IngestResult<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| IngestError::MalformedDocument(format!("invalid zip: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| IngestError::MalformedDocument(format!("invalid zip entry: {e}")))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(IngestError::MalformedDocument(format!(
                "zip entry {} has an unsafe path",
                entry.name()
            )));
        };
        let dest = safe_join(dir.path(), &relative)?;

        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = std::fs::File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(dir)
}

/// Joins `relative` onto `root`, rejecting any path that would resolve
/// outside `root` (parent-directory segments, absolute paths).
fn safe_join(root: &Path, relative: &Path) -> IngestResult<std::path::PathBuf> {
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(IngestError::MalformedDocument(format!(
            "zip entry path escapes extraction root: {}",
            relative.display()
        )));
    }
    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_resource_block() {
        let source = r#"
            resource "aws_instance" "web" {
              instance_type = "t3.micro"
              region        = var.region
            }
        "#;
        let config = parse_hcl(source).unwrap();
        assert_eq!(config.resources.len(), 1);
        let resource = &config.resources[0];
        assert_eq!(resource.resource_type, "aws_instance");
        assert_eq!(resource.name, "web");
        assert!(matches!(resource.multiplicity, Multiplicity::Single));
        assert!(matches!(resource.config.get("region"), Some(AttrExpr::VarRef(name)) if name == "region"));
    }

    #[test]
    fn parses_count_meta_argument() {
        let source = r#"
            resource "aws_instance" "web" {
              count = 3
            }
        "#;
        let config = parse_hcl(source).unwrap();
        assert!(matches!(config.resources[0].multiplicity, Multiplicity::Count(3)));
    }

    #[test]
    fn parses_variable_defaults() {
        let source = r#"
            variable "region" {
              default = "us-east-1"
            }
        "#;
        let config = parse_hcl(source).unwrap();
        let variable = config.variables.get("region").unwrap();
        assert_eq!(variable.default, Some(serde_json::json!("us-east-1")));
    }

    #[test]
    fn safe_join_rejects_parent_dir_escape() {
        let root = Path::new("/tmp/extract-root");
        let evil = Path::new("../../etc/passwd");
        assert!(safe_join(root, evil).is_err());
    }

    #[test]
    fn safe_join_accepts_nested_relative_path() {
        let root = Path::new("/tmp/extract-root");
        let nested = Path::new("modules/network/main.tf");
        let joined = safe_join(root, nested).unwrap();
        assert_eq!(joined, root.join(nested));
    }
}
