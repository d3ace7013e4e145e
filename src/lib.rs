#![cfg_attr(docsrs, feature(doc_cfg))]
//! # earth-profile
//!
//! earth-profile stores and serializes the per-vertex radial profiles of a
//! layered volumetric Earth model defined on a triangulated grid. Within each
//! layer, every grid vertex owns a [`Profile`](profile::Profile): a small
//! record describing how attribute values vary with radius inside that layer.
//!
//! ## Features
//! - A closed set of storage-optimized profile variants (`Empty`,
//!   `SurfaceEmpty`, `Surface`, `Thin`, `Constant`, `NPoint`) sharing one
//!   behavioral contract, [`ProfileVariant`](profile::ProfileVariant)
//! - Linear and natural cubic spline interpolation along radius
//! - Binary and ascii record codecs driven by one field layout per variant
//! - A lazily computed, per-profile locked gradient cache fed by pluggable
//!   [`GradientCalculator`](gradient::GradientCalculator)s
//! - Global point numbering of profile nodes through
//!   [`ProfileGrid`](grid::ProfileGrid)
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! earth-profile = "0.3"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! ## Absence and misuse
//! Queries on nodes a variant does not have answer with NaN (or `-1` for
//! index lookups). Data access, point-index access and every setter report
//! [`ProfileError`](profile_error::ProfileError) instead.
//!
//! ## Byte order
//! Every multi-byte field of the binary format is big-endian.

pub mod codec;
pub mod data;
pub mod debug_invariants;
pub mod gradient;
pub mod grid;
pub mod profile;
pub mod profile_error;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::codec::{AsciiReader, AsciiWriter, BinaryReader, BinaryWriter};
    pub use crate::data::{AttributeSchema, Data, DataType, ModelMetadata, SimpleSchema};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::gradient::{
        CalculatorPool, GradientCache, GradientCalculator, GradientLocation, GradientRequest,
        GradientSlot,
    };
    pub use crate::grid::{NodeLocation, PointMap, ProfileGrid};
    pub use crate::profile::{
        InterpolatorType, POINT_INDEX_UNSET, Profile, ProfileConstant, ProfileEmpty,
        ProfileNPoint, ProfileSurface, ProfileSurfaceEmpty, ProfileThin, ProfileType,
        ProfileVariant,
    };
    pub use crate::profile_error::ProfileError;
}
