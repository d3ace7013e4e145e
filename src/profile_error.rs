//! ProfileError: Unified error type for earth-profile public APIs
//!
//! This error type is used throughout the earth-profile library to provide
//! robust, non-panicking error handling for all public APIs. Structural
//! absence (a radius query on a variant with no radius axis, for example) is
//! never an error; it is reported through NaN / `-1` sentinels instead.

use crate::data::DataType;
use crate::profile::ProfileType;
use thiserror::Error;

/// Boxed error produced by an external gradient calculator.
pub type CalculatorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for earth-profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A node index that the variant does not have was used to access or mutate it.
    #[error("node index {node} out of bounds for {profile} profile with {len} node(s)")]
    NodeIndexOutOfBounds {
        /// Variant that rejected the index.
        profile: ProfileType,
        /// Offending node index.
        node: usize,
        /// Number of valid nodes (0 for empty variants).
        len: usize,
    },
    /// An attribute index beyond the Data length was used for a mutation.
    #[error("attribute index {attribute} out of bounds for data with {len} attribute(s)")]
    AttributeIndexOutOfBounds {
        /// Offending attribute index.
        attribute: usize,
        /// Number of attributes held by the Data value.
        len: usize,
    },
    /// Interpolation was requested outside `[bottom, top]` without permission to clamp.
    #[error("radius {radius} km lies outside layer range [{bottom}, {top}] km")]
    RadiusOutOfRange {
        /// Requested radius.
        radius: f64,
        /// Bottom radius of the layer.
        bottom: f64,
        /// Top radius of the layer.
        top: f64,
    },
    /// Construction or mutation would break a structural invariant of the variant.
    #[error("invalid {profile} profile: {reason}")]
    InvalidProfile {
        /// Variant being built or mutated.
        profile: ProfileType,
        /// Human readable reason.
        reason: String,
    },
    /// The (nRadii, nData) shape does not match any variant.
    #[error("no profile variant has {n_radii} radii and {n_data} data value(s)")]
    UnsupportedShape {
        /// Number of radii supplied.
        n_radii: usize,
        /// Number of Data values supplied.
        n_data: usize,
    },
    /// The stream carried a type tag outside the closed variant set.
    #[error("unrecognized profile type tag {0}")]
    UnknownProfileType(i64),
    /// A stream carried a type label outside the closed data type set.
    #[error("unrecognized data type `{0}`")]
    UnknownDataType(String),
    /// Malformed field in a binary or ascii profile record.
    #[error("profile format error: {0}")]
    Format(String),
    /// The stream ended in the middle of a profile record.
    #[error("truncated profile record while reading {field}")]
    Truncated {
        /// Field that could not be read completely.
        field: &'static str,
    },
    /// Data value length disagrees with the expected attribute count.
    #[error("attribute count mismatch: expected {expected}, found {found}")]
    AttributeCountMismatch {
        /// Attribute count required by the schema or profile.
        expected: usize,
        /// Attribute count carried by the value.
        found: usize,
    },
    /// Data value element type disagrees with the expected type.
    #[error("data type mismatch: expected {expected}, found {found}")]
    DataTypeMismatch {
        /// Element type required by the schema or profile.
        expected: DataType,
        /// Element type carried by the value.
        found: DataType,
    },
    /// A numeric value cannot be represented in the Data element type.
    #[error("value {value} is not representable as {data_type}")]
    ValueConversion {
        /// Value that failed to convert.
        value: f64,
        /// Target element type.
        data_type: DataType,
    },
    /// A gradient was read before it was computed for the requested flag.
    #[error(
        "gradient of attribute {attribute} at node {node} (reciprocal = {reciprocal}) has not been computed"
    )]
    GradientNotComputed {
        /// Node index of the slot.
        node: usize,
        /// Attribute index of the slot.
        attribute: usize,
        /// Reciprocal flag requested by the reader.
        reciprocal: bool,
    },
    /// Opaque failure reported by the external gradient calculator.
    #[error("gradient calculator failed: {0}")]
    GradientCalculator(#[source] CalculatorError),
    /// Metadata / schema is inconsistent.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    /// Grid lookup with a vertex or layer outside the table.
    #[error("grid index (vertex {vertex}, layer {layer}) out of bounds for {n_vertices} x {n_layers} grid")]
    GridIndexOutOfBounds {
        /// Requested vertex.
        vertex: usize,
        /// Requested layer.
        layer: usize,
        /// Number of vertices in the grid.
        n_vertices: usize,
        /// Number of layers in the grid.
        n_layers: usize,
    },
    /// An invariant check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProfileError {
    /// Map an I/O error raised while reading `field`, turning EOF into [`ProfileError::Truncated`].
    pub(crate) fn from_read(err: std::io::Error, field: &'static str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProfileError::Truncated { field }
        } else {
            ProfileError::Io(err)
        }
    }

    /// Returns `true` for the bounds-error family (index misuse).
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            ProfileError::NodeIndexOutOfBounds { .. }
                | ProfileError::AttributeIndexOutOfBounds { .. }
                | ProfileError::GridIndexOutOfBounds { .. }
        )
    }

    /// Returns `true` for errors that abort decoding of a profile record.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ProfileError::Format(_)
                | ProfileError::Truncated { .. }
                | ProfileError::UnknownProfileType(_)
                | ProfileError::UnknownDataType(_)
                | ProfileError::AttributeCountMismatch { .. }
                | ProfileError::DataTypeMismatch { .. }
                | ProfileError::InvalidProfile { .. }
                | ProfileError::UnsupportedShape { .. }
        )
    }
}
