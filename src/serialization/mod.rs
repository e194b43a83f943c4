//! Tree-structured serialization.
//!
//! Types that can be persisted implement [`Serializable`], converting
//! themselves to and from a [`Node`] tree of named elements with text leaves.
//! The [`yaml`] submodule maps such trees onto YAML documents. Matrices and
//! vectors are stored in text leaves in the form produced by
//! [`encode_matrix`].

use crate::camera::CalibrationError;
use nalgebra::SMatrix;

pub mod yaml;

/// Conversion to and from a [`Node`] tree.
pub trait Serializable {
    /// Builds the tree describing `self`.
    fn serialize(&self) -> Node;

    /// Updates `self` from `node`.
    fn deserialize(&mut self, node: &Node) -> Result<(), CalibrationError>;
}

/// A node of a serialization tree: a named element or a text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element { name: String, children: Vec<Node> },
    Text(String),
}

impl Node {
    /// Creates an element without children.
    pub fn element(name: impl Into<String>) -> Self {
        Node::Element {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Appends `child` and returns the element, for building trees inline.
    pub fn with_child(mut self, child: Node) -> Self {
        self.add_child(child);
        self
    }

    /// Appends `child` to an element. Text nodes have no children; the call
    /// is ignored for them.
    pub fn add_child(&mut self, child: Node) {
        if let Node::Element { children, .. } = self {
            children.push(child);
        }
    }

    /// Tag of an element, `None` for text.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            Node::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            Node::Text(_) => &[],
        }
    }

    /// First child element called `name`.
    pub fn child_by_name(&self, name: &str) -> Option<&Node> {
        self.children()
            .iter()
            .find(|child| child.name() == Some(name))
    }

    /// The text of a text node, or of the first child of an element if that
    /// child is a text node.
    pub fn text_value(&self) -> Option<&str> {
        match self {
            Node::Text(value) => Some(value),
            Node::Element { children, .. } => match children.first() {
                Some(Node::Text(value)) => Some(value),
                _ => None,
            },
        }
    }
}

/// Encodes a matrix as text.
///
/// Values are written row-major and separated by single spaces; the rows of
/// a matrix with more than one column are separated by newlines. Values use
/// the shortest representation that parses back to the same `f64`.
///
/// ```rust
/// use camcalib::serialization::encode_matrix;
/// use nalgebra::{Matrix2, Vector3};
///
/// assert_eq!(encode_matrix(&Matrix2::new(1.0, 2.5, -3.0, 4.0)), "1 2.5\n-3 4");
/// assert_eq!(encode_matrix(&Vector3::new(-0.2, 0.0, 0.01)), "-0.2 0 0.01");
/// ```
pub fn encode_matrix<const R: usize, const C: usize>(matrix: &SMatrix<f64, R, C>) -> String {
    if C == 1 {
        return join_values(matrix.iter());
    }
    (0..R)
        .map(|i| join_values(matrix.row(i).iter()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes text written by [`encode_matrix`].
///
/// Any whitespace separates values. Exactly `R * C` values are required.
///
/// # Errors
///
/// [`CalibrationError::FormatError`] if a value does not parse or the number
/// of values is wrong.
pub fn decode_matrix<const R: usize, const C: usize>(
    text: &str,
) -> Result<SMatrix<f64, R, C>, CalibrationError> {
    let values = text
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|e| {
                CalibrationError::FormatError(format!("Invalid number '{token}': {e}"))
            })
        })
        .collect::<Result<Vec<f64>, CalibrationError>>()?;

    if values.len() != R * C {
        return Err(CalibrationError::FormatError(format!(
            "Expected {} values for a {}x{} matrix, found {}",
            R * C,
            R,
            C,
            values.len()
        )));
    }

    Ok(SMatrix::<f64, R, C>::from_row_slice(&values))
}

fn join_values<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
