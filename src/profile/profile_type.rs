//! Stable type tags for the closed profile variant set.
//!
//! Tag values are persisted in every model file and must never be
//! renumbered; new variants may only be appended.

use crate::profile_error::ProfileError;
use std::fmt;

/// Tag identifying a concrete profile representation.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum ProfileType {
    /// No radii, no data.
    Empty = 0,
    /// One radius, one data value.
    Thin = 1,
    /// Bottom and top radius sharing one data value.
    Constant = 2,
    /// `n >= 2` radii, each with its own data value.
    NPoint = 3,
    /// No radius axis, one data value.
    Surface = 4,
    /// No radius axis, no data; always absent.
    SurfaceEmpty = 5,
}

static_assertions::assert_eq_size!(ProfileType, u8);

/// One field of a variant's canonical wire layout.
///
/// Both the binary and the ascii codec walk the same layout, so the two
/// formats cannot drift apart.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    /// The next radius of the profile.
    Radius,
    /// A count followed by that many radii.
    RadiusSeq,
    /// The next Data value of the profile.
    Data,
    /// As many Data values as the preceding `RadiusSeq` count.
    DataSeq,
}

impl ProfileType {
    /// All variants in tag order.
    pub const ALL: [ProfileType; 6] = [
        ProfileType::Empty,
        ProfileType::Thin,
        ProfileType::Constant,
        ProfileType::NPoint,
        ProfileType::Surface,
        ProfileType::SurfaceEmpty,
    ];

    /// Wire tag of this variant.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Variant for a wire tag.
    ///
    /// # Errors
    /// [`ProfileError::UnknownProfileType`] if `tag` is not in the closed set.
    pub fn from_tag(tag: i64) -> Result<Self, ProfileError> {
        ProfileType::ALL
            .into_iter()
            .find(|t| i64::from(t.tag()) == tag)
            .ok_or(ProfileError::UnknownProfileType(tag))
    }

    /// Stable upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileType::Empty => "EMPTY",
            ProfileType::Thin => "THIN",
            ProfileType::Constant => "CONSTANT",
            ProfileType::NPoint => "NPOINT",
            ProfileType::Surface => "SURFACE",
            ProfileType::SurfaceEmpty => "SURFACE_EMPTY",
        }
    }

    /// Canonical ordered field list following the tag on the wire.
    pub fn layout(self) -> &'static [Field] {
        match self {
            ProfileType::Empty | ProfileType::SurfaceEmpty => &[],
            ProfileType::Surface => &[Field::Data],
            ProfileType::Thin => &[Field::Radius, Field::Data],
            ProfileType::Constant => &[Field::Radius, Field::Radius, Field::Data],
            ProfileType::NPoint => &[Field::RadiusSeq, Field::DataSeq],
        }
    }

    /// Whether variants of this type carry a gradient cache.
    pub fn has_gradients(self) -> bool {
        matches!(
            self,
            ProfileType::Thin | ProfileType::Constant | ProfileType::NPoint
        )
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        let tags: Vec<u8> = ProfileType::ALL.iter().map(|t| t.tag()).collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(ProfileType::Surface.tag(), 4);
        assert_eq!(ProfileType::SurfaceEmpty.tag(), 5);
    }

    #[test]
    fn from_tag_roundtrip_and_unknown() {
        for t in ProfileType::ALL {
            assert_eq!(ProfileType::from_tag(i64::from(t.tag())).unwrap(), t);
        }
        assert!(matches!(
            ProfileType::from_tag(6),
            Err(ProfileError::UnknownProfileType(6))
        ));
        assert!(ProfileType::from_tag(-1).is_err());
    }

    #[test]
    fn layouts_mention_data_for_data_bearing_variants() {
        assert!(ProfileType::Empty.layout().is_empty());
        assert!(ProfileType::SurfaceEmpty.layout().is_empty());
        assert_eq!(ProfileType::Thin.layout(), &[Field::Radius, Field::Data]);
        assert_eq!(
            ProfileType::NPoint.layout(),
            &[Field::RadiusSeq, Field::DataSeq]
        );
    }
}
