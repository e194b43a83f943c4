//! YAML persistence of [`Node`] trees.
//!
//! A tree is written as a one-key mapping named after the root element.
//! Elements with child elements become mappings in child order; elements
//! holding only text become scalar strings:
//!
//! ```yaml
//! CameraCalibration:
//!   Intrinsics: |-
//!     500 0 320
//!     0 500 240
//!     0 0 1
//!   Distortion:
//!     Radial: -0.2 0 0
//!     Tangential: 0 0
//! ```
//!
//! Writing goes through `serde_yaml`, reading through `yaml-rust`, which keeps
//! mapping keys in document order.

use super::Node;
use crate::camera::CalibrationError;
use yaml_rust::{Yaml, YamlLoader};

impl Node {
    /// Renders the tree as a YAML document.
    pub fn to_yaml_string(&self) -> Result<String, CalibrationError> {
        let name = self.name().ok_or_else(|| {
            CalibrationError::FormatError("The root of a YAML document must be an element".to_string())
        })?;
        let document = serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String(name.to_string()),
            to_yaml_value(self),
        )]);
        serde_yaml::to_string(&document).map_err(|e| CalibrationError::YamlError(e.to_string()))
    }

    /// Parses a YAML document written by [`Node::to_yaml_string`].
    ///
    /// Numeric scalars are accepted as text.
    pub fn from_yaml_str(contents: &str) -> Result<Node, CalibrationError> {
        let docs = YamlLoader::load_from_str(contents)?;
        let doc = docs.first().ok_or_else(|| {
            CalibrationError::FormatError("Empty YAML document".to_string())
        })?;

        let root = match doc {
            Yaml::Hash(hash) if hash.len() == 1 => hash.iter().next(),
            _ => None,
        };
        let (key, value) = root.ok_or_else(|| {
            CalibrationError::FormatError(
                "Expected a YAML mapping with a single root key".to_string(),
            )
        })?;

        node_from_yaml(key, value)
    }
}

fn to_yaml_value(node: &Node) -> serde_yaml::Value {
    match node {
        Node::Text(value) => serde_yaml::Value::String(value.clone()),
        Node::Element { children, .. } => {
            if !children.is_empty() && children.iter().all(|c| matches!(c, Node::Text(_))) {
                let text = children
                    .iter()
                    .filter_map(Node::text_value)
                    .collect::<Vec<_>>()
                    .join("\n");
                return serde_yaml::Value::String(text);
            }
            let mapping = children
                .iter()
                .filter_map(|child| {
                    child.name().map(|name| {
                        (
                            serde_yaml::Value::String(name.to_string()),
                            to_yaml_value(child),
                        )
                    })
                })
                .collect::<serde_yaml::Mapping>();
            serde_yaml::Value::Mapping(mapping)
        }
    }
}

fn node_from_yaml(key: &Yaml, value: &Yaml) -> Result<Node, CalibrationError> {
    let name = key.as_str().ok_or_else(|| {
        CalibrationError::FormatError(format!("Invalid YAML key: {:?}", key))
    })?;

    let node = match value {
        Yaml::Hash(hash) => {
            let mut element = Node::element(name);
            for (child_key, child_value) in hash.iter() {
                element.add_child(node_from_yaml(child_key, child_value)?);
            }
            element
        }
        Yaml::String(text) | Yaml::Real(text) => Node::element(name).with_child(Node::text(text.clone())),
        Yaml::Integer(number) => Node::element(name).with_child(Node::text(number.to_string())),
        Yaml::Null => Node::element(name),
        other => {
            return Err(CalibrationError::FormatError(format!(
                "Unsupported YAML value for '{}': {:?}",
                name, other
            )))
        }
    };
    Ok(node)
}
