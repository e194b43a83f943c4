//! Persistence of [`CameraCalibration`].
//!
//! The calibration serializes to a `CameraCalibration` element holding, for
//! each parameter group that was set, one child element:
//!
//! * `Extrinsics` - the 4×4 camera-to-world matrix,
//! * `Intrinsics` - the 3×3 intrinsic matrix,
//! * `Distortion` - with `Radial` (k1 k2 k3) and `Tangential` (p1 p2) children.
//!
//! Leaf values are stored in the text form of
//! [`crate::serialization::encode_matrix`].

use super::{CalibrationError, CameraCalibration};
use crate::serialization::{decode_matrix, encode_matrix, Node, Serializable};
use log::info;
use nalgebra::{Vector2, Vector3};
use std::fs;

pub const ROOT_TAG: &str = "CameraCalibration";
pub const EXTRINSICS_TAG: &str = "Extrinsics";
pub const INTRINSICS_TAG: &str = "Intrinsics";
pub const DISTORTION_TAG: &str = "Distortion";
pub const RADIAL_TAG: &str = "Radial";
pub const TANGENTIAL_TAG: &str = "Tangential";

impl Serializable for CameraCalibration {
    /// Builds the calibration tree. Only groups whose flag is set are emitted.
    fn serialize(&self) -> Node {
        let mut root = Node::element(ROOT_TAG);

        if self.has_extrinsics() {
            root.add_child(leaf(EXTRINSICS_TAG, encode_matrix(&self.extrinsics)));
        }

        if self.has_intrinsics() {
            root.add_child(leaf(INTRINSICS_TAG, encode_matrix(&self.intrinsics)));
        }

        if self.has_distortion() {
            root.add_child(
                Node::element(DISTORTION_TAG)
                    .with_child(leaf(RADIAL_TAG, encode_matrix(&self.radial)))
                    .with_child(leaf(TANGENTIAL_TAG, encode_matrix(&self.tangential))),
            );
        }

        root
    }

    /// Applies the groups present in `node` through the regular setters.
    ///
    /// Groups missing from `node` leave the current values and flags alone.
    /// Inside `Distortion`, a missing `Radial` or `Tangential` child counts as
    /// zero. The whole tree is validated before anything is applied, so on
    /// error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::FormatError`] if
    /// * the root tag is not `CameraCalibration`,
    /// * `Distortion` has a child other than `Radial` or `Tangential`,
    /// * a group holds no text or its text is not a matrix of the right size.
    fn deserialize(&mut self, node: &Node) -> Result<(), CalibrationError> {
        if node.name() != Some(ROOT_TAG) {
            return Err(CalibrationError::FormatError(format!(
                "This is not a camera calibration node: {}",
                node.name().unwrap_or("#text")
            )));
        }

        let extrinsics = node
            .child_by_name(EXTRINSICS_TAG)
            .map(|n| decode_matrix::<4, 4>(leaf_text(n)?))
            .transpose()?;

        let intrinsics = node
            .child_by_name(INTRINSICS_TAG)
            .map(|n| decode_matrix::<3, 3>(leaf_text(n)?))
            .transpose()?;

        let distortion = node
            .child_by_name(DISTORTION_TAG)
            .map(parse_distortion)
            .transpose()?;

        if let Some(extrinsics) = extrinsics {
            self.set_extrinsics(&extrinsics);
        }
        if let Some(intrinsics) = intrinsics {
            self.set_intrinsics(&intrinsics);
        }
        if let Some((radial, tangential)) = distortion {
            self.set_distortion(&radial, &tangential);
        }

        Ok(())
    }
}

impl CameraCalibration {
    /// Creates a calibration from a serialized tree.
    pub fn from_node(node: &Node) -> Result<Self, CalibrationError> {
        let mut calibration = CameraCalibration::new();
        calibration.deserialize(node)?;
        Ok(calibration)
    }

    pub fn to_yaml_string(&self) -> Result<String, CalibrationError> {
        self.serialize().to_yaml_string()
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, CalibrationError> {
        Self::from_node(&Node::from_yaml_str(contents)?)
    }

    /// Loads a calibration from a YAML file.
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::IOError`] if the file cannot be read.
    /// * [`CalibrationError::YamlError`] if the content is not valid YAML.
    /// * [`CalibrationError::FormatError`] if the document is not a calibration.
    ///
    /// # Related
    /// * [`CameraCalibration::save_to_yaml()`]
    pub fn load_from_yaml(path: &str) -> Result<Self, CalibrationError> {
        let contents = fs::read_to_string(path)?;
        let calibration = Self::from_yaml_str(&contents)?;
        info!("Loaded camera calibration from {}: {:?}", path, calibration);
        Ok(calibration)
    }

    /// Saves the calibration to a YAML file, overwriting it.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), CalibrationError> {
        let yaml_string = self.to_yaml_string()?;
        fs::write(path, yaml_string)?;
        info!("Saved camera calibration to {}", path);
        Ok(())
    }
}

fn leaf(name: &str, text: String) -> Node {
    Node::element(name).with_child(Node::text(text))
}

fn leaf_text(node: &Node) -> Result<&str, CalibrationError> {
    node.text_value().ok_or_else(|| {
        CalibrationError::FormatError(format!(
            "Node {} holds no text",
            node.name().unwrap_or("#text")
        ))
    })
}

fn parse_distortion(node: &Node) -> Result<(Vector3<f64>, Vector2<f64>), CalibrationError> {
    let mut radial = Vector3::zeros();
    let mut tangential = Vector2::zeros();

    for child in node.children() {
        match child.name() {
            Some(RADIAL_TAG) => radial = decode_matrix::<3, 1>(leaf_text(child)?)?,
            Some(TANGENTIAL_TAG) => tangential = decode_matrix::<2, 1>(leaf_text(child)?)?,
            other => {
                return Err(CalibrationError::FormatError(format!(
                    "Unknown child type: {}",
                    other.unwrap_or("#text")
                )))
            }
        }
    }

    Ok((radial, tangential))
}
