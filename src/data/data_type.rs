//! Element type tags for per-node attribute vectors.

use crate::profile_error::ProfileError;
use std::fmt;

/// Numeric element type shared by every [`Data`](crate::data::Data) value of a model.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    /// 64-bit IEEE float.
    Double,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit signed integer.
    Long,
    /// 32-bit signed integer.
    Int,
    /// 16-bit signed integer.
    Short,
    /// 8-bit signed integer.
    Byte,
}

impl DataType {
    /// All element types, in tag order.
    pub const ALL: [DataType; 6] = [
        DataType::Double,
        DataType::Float,
        DataType::Long,
        DataType::Int,
        DataType::Short,
        DataType::Byte,
    ];

    /// Returns a stable string label for the element type.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Double => "DOUBLE",
            DataType::Float => "FLOAT",
            DataType::Long => "LONG",
            DataType::Int => "INT",
            DataType::Short => "SHORT",
            DataType::Byte => "BYTE",
        }
    }

    /// Parse an element type from its label (case-insensitive).
    pub fn parse(tag: &str) -> Result<Self, ProfileError> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| ProfileError::UnknownDataType(tag.to_string()))
    }

    /// Width of one element on the binary wire, in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            DataType::Double | DataType::Long => 8,
            DataType::Float | DataType::Int => 4,
            DataType::Short => 2,
            DataType::Byte => 1,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for t in DataType::ALL {
            assert_eq!(DataType::parse(t.as_str()).unwrap(), t);
        }
        assert_eq!(DataType::parse(" float ").unwrap(), DataType::Float);
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert!(matches!(
            DataType::parse("complex"),
            Err(ProfileError::UnknownDataType(_))
        ));
    }

    #[test]
    fn widths() {
        let widths: Vec<_> = DataType::ALL.iter().map(|t| t.byte_width()).collect();
        assert_eq!(widths, vec![8, 4, 8, 4, 2, 1]);
    }

    #[test]
    fn serde_json_roundtrip() {
        let s = serde_json::to_string(&DataType::Short).unwrap();
        let back: DataType = serde_json::from_str(&s).unwrap();
        assert_eq!(back, DataType::Short);
    }
}
