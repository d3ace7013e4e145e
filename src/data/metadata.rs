//! Attribute schema consumed when decoding profile payloads.
//!
//! Profiles never know how many attributes their `Data` carries or what the
//! element type is; decoders ask an [`AttributeSchema`]. [`ModelMetadata`] is the
//! concrete schema used by [`ProfileGrid`](crate::grid::ProfileGrid) and tests.

use crate::data::DataType;
use crate::debug_invariants::DebugInvariants;
use crate::profile_error::ProfileError;

/// Supplies the attribute count and element type needed to read `Data` payloads.
pub trait AttributeSchema {
    /// Number of attributes in every `Data` value of the model.
    fn n_attributes(&self) -> usize;
    /// Element type of every `Data` value of the model.
    fn data_type(&self) -> DataType;

    /// Validate that `data` matches this schema.
    fn check_data(&self, data: &crate::data::Data) -> Result<(), ProfileError> {
        data.check_shape(self.data_type(), self.n_attributes())
    }
}

/// Minimal schema: just a data type and an attribute count.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimpleSchema {
    /// Element type.
    pub data_type: DataType,
    /// Attribute count.
    pub n_attributes: usize,
}

impl SimpleSchema {
    /// Create a schema with `n_attributes` values of `data_type`.
    pub fn new(data_type: DataType, n_attributes: usize) -> Self {
        Self {
            data_type,
            n_attributes,
        }
    }
}

impl AttributeSchema for SimpleSchema {
    fn n_attributes(&self) -> usize {
        self.n_attributes
    }
    fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// Model-wide attribute and layer description.
///
/// # Invariants
/// - At least one attribute.
/// - `attribute_units.len() == attribute_names.len()`.
/// - Attribute names are unique; layer names are unique.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelMetadata {
    /// Free-form description of the model.
    pub description: String,
    attribute_names: Vec<String>,
    attribute_units: Vec<String>,
    layer_names: Vec<String>,
    data_type: DataType,
}

impl ModelMetadata {
    /// Build validated metadata.
    pub fn new<S: Into<String>>(
        description: S,
        attribute_names: Vec<String>,
        attribute_units: Vec<String>,
        layer_names: Vec<String>,
        data_type: DataType,
    ) -> Result<Self, ProfileError> {
        let meta = Self {
            description: description.into(),
            attribute_names,
            attribute_units,
            layer_names,
            data_type,
        };
        meta.validate_invariants()?;
        Ok(meta)
    }

    /// Parse semicolon-separated attribute names and units, e.g. `"vp; vs"`.
    pub fn from_delimited(
        description: &str,
        attribute_names: &str,
        attribute_units: &str,
        layer_names: &str,
        data_type: DataType,
    ) -> Result<Self, ProfileError> {
        fn split(s: &str) -> Vec<String> {
            s.split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        }
        Self::new(
            description,
            split(attribute_names),
            split(attribute_units),
            split(layer_names),
            data_type,
        )
    }

    /// Attribute names in index order.
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Attribute units in index order.
    pub fn attribute_units(&self) -> &[String] {
        &self.attribute_units
    }

    /// Layer names from the deepest layer upward.
    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }

    /// Number of layers.
    pub fn n_layers(&self) -> usize {
        self.layer_names.len()
    }

    /// Index of the attribute called `name`.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attribute_names.iter().position(|n| n == name)
    }

    /// Index of the layer called `name`.
    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layer_names.iter().position(|n| n == name)
    }
}

impl AttributeSchema for ModelMetadata {
    fn n_attributes(&self) -> usize {
        self.attribute_names.len()
    }
    fn data_type(&self) -> DataType {
        self.data_type
    }
}

fn has_duplicates(names: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .find(|n| !seen.insert(n.as_str()))
        .map(String::as_str)
}

impl DebugInvariants for ModelMetadata {
    fn debug_assert_invariants(&self) {
        crate::profile_debug_assert_ok!(self.validate_invariants(), "ModelMetadata invalid");
    }

    fn validate_invariants(&self) -> Result<(), ProfileError> {
        if self.attribute_names.is_empty() {
            return Err(ProfileError::InvalidMetadata(
                "at least one attribute is required".into(),
            ));
        }
        if self.attribute_units.len() != self.attribute_names.len() {
            return Err(ProfileError::InvalidMetadata(format!(
                "{} attribute names but {} units",
                self.attribute_names.len(),
                self.attribute_units.len()
            )));
        }
        if let Some(dup) = has_duplicates(&self.attribute_names) {
            return Err(ProfileError::InvalidMetadata(format!(
                "duplicate attribute name `{dup}`"
            )));
        }
        if let Some(dup) = has_duplicates(&self.layer_names) {
            return Err(ProfileError::InvalidMetadata(format!(
                "duplicate layer name `{dup}`"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ModelMetadata {
        ModelMetadata::from_delimited(
            "test model",
            "vp; vs",
            "km/sec; km/sec",
            "mantle; crust",
            DataType::Float,
        )
        .unwrap()
    }

    #[test]
    fn delimited_parse_and_lookup() {
        let m = meta();
        assert_eq!(m.n_attributes(), 2);
        assert_eq!(m.attribute_index("vs"), Some(1));
        assert_eq!(m.layer_index("crust"), Some(1));
        assert_eq!(m.n_layers(), 2);
        assert_eq!(m.data_type(), DataType::Float);
    }

    #[test]
    fn units_must_match_names() {
        let err = ModelMetadata::from_delimited("x", "vp; vs", "km/sec", "", DataType::Double)
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidMetadata(_)));
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let err = ModelMetadata::from_delimited("x", "vp; vp", "a; b", "", DataType::Double)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate attribute"));
    }

    #[test]
    fn serde_json_roundtrip() {
        let m = meta();
        let ser = serde_json::to_string(&m).expect("serialize");
        let de: ModelMetadata = serde_json::from_str(&ser).expect("deserialize");
        assert_eq!(de, m);
    }
}
