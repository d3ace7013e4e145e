//! Binary and ascii encoding of profile records.
//!
//! A record is the variant's type tag followed by its payload. The payload is
//! described once per variant by [`ProfileType::layout`]; [`encode`] and
//! [`decode`] walk that layout and hand each field to a format-specific
//! [`FieldSink`] or [`FieldSource`], so the two formats always agree on field
//! order.
//!
//! Decoding is all-or-nothing: the profile is built only after every field
//! of the record was read, and an error never yields a partial profile.

pub mod ascii;
pub mod binary;

pub use ascii::{AsciiReader, AsciiWriter};
pub use binary::{BinaryReader, BinaryWriter};

use crate::data::{AttributeSchema, Data, DataType};
use crate::profile::{Field, Profile, ProfileType, ProfileVariant};
use crate::profile_error::ProfileError;

/// Upper bound on up-front allocation driven by a count read from a stream.
pub(crate) const MAX_PREALLOC: usize = 1024;

/// Smallest node count an NPoint record may carry.
pub(crate) const MIN_NPOINT_NODES: usize = 2;

/// Format-specific writer of the fields of one record.
pub(crate) trait FieldSink {
    fn begin(&mut self, profile_type: ProfileType) -> Result<(), ProfileError>;
    fn radius(&mut self, radius: f32) -> Result<(), ProfileError>;
    fn count(&mut self, count: usize) -> Result<(), ProfileError>;
    fn data(&mut self, data: &Data) -> Result<(), ProfileError>;
    fn end(&mut self) -> Result<(), ProfileError>;
}

/// Format-specific reader of the fields of one record.
pub(crate) trait FieldSource {
    /// Raw type tag of the next record, or `None` at a clean end of input.
    fn tag(&mut self) -> Result<Option<i64>, ProfileError>;
    fn radius(&mut self) -> Result<f32, ProfileError>;
    /// Node count, at least `min`.
    fn count(&mut self, min: usize) -> Result<usize, ProfileError>;
    fn data(&mut self, data_type: DataType, n_attributes: usize) -> Result<Data, ProfileError>;
    /// Finish the record; fails if it carries unread fields.
    fn end(&mut self) -> Result<(), ProfileError>;
}

/// Write `profile` field by field into `sink`.
pub(crate) fn encode<S: FieldSink>(profile: &Profile, sink: &mut S) -> Result<(), ProfileError> {
    let profile_type = profile.profile_type();
    let (radii, data) = (profile.radii(), profile.data());
    let (mut next_radius, mut next_data) = (0usize, 0usize);
    sink.begin(profile_type)?;
    for field in profile_type.layout() {
        match field {
            Field::Radius => {
                let r = radii.get(next_radius).ok_or_else(|| {
                    crate::invariant_error!("{profile_type} profile is missing radius {next_radius}")
                })?;
                sink.radius(*r)?;
                next_radius += 1;
            }
            Field::RadiusSeq => {
                sink.count(radii.len())?;
                for &r in radii {
                    sink.radius(r)?;
                }
                next_radius = radii.len();
            }
            Field::Data => {
                let d = data.get(next_data).ok_or_else(|| {
                    crate::invariant_error!("{profile_type} profile is missing data value {next_data}")
                })?;
                sink.data(d)?;
                next_data += 1;
            }
            Field::DataSeq => {
                for d in &data[next_data..] {
                    sink.data(d)?;
                }
                next_data = data.len();
            }
        }
    }
    sink.end()
}

/// Read the next record from `source`, or `None` at a clean end of input.
pub(crate) fn decode<S, A>(source: &mut S, schema: &A) -> Result<Option<Profile>, ProfileError>
where
    S: FieldSource,
    A: AttributeSchema + ?Sized,
{
    let Some(tag) = source.tag()? else {
        return Ok(None);
    };
    let profile_type = ProfileType::from_tag(tag).inspect_err(|_| {
        log::warn!("rejecting profile record with unknown type tag {tag}");
    })?;
    let (data_type, n_attributes) = (schema.data_type(), schema.n_attributes());
    let mut radii = Vec::new();
    let mut data = Vec::new();
    let mut count = 0usize;
    for field in profile_type.layout() {
        match field {
            Field::Radius => radii.push(source.radius()?),
            Field::RadiusSeq => {
                count = source.count(MIN_NPOINT_NODES)?;
                radii.reserve(count.min(MAX_PREALLOC));
                for _ in 0..count {
                    radii.push(source.radius()?);
                }
            }
            Field::Data => data.push(source.data(data_type, n_attributes)?),
            Field::DataSeq => {
                data.reserve(count.min(MAX_PREALLOC));
                for _ in 0..count {
                    data.push(source.data(data_type, n_attributes)?);
                }
            }
        }
    }
    source.end()?;
    let profile = Profile::with_type(profile_type, radii, data).inspect_err(|e| {
        log::warn!("rejecting {profile_type} profile record: {e}");
    })?;
    Ok(Some(profile))
}

/// Encoded size of `profile` on the binary wire, tag included.
pub fn binary_len(profile: &Profile) -> usize {
    let counts = if profile.profile_type().layout().contains(&Field::RadiusSeq) {
        4
    } else {
        0
    };
    1 + counts + 4 * profile.n_radii() + profile.data().iter().map(Data::binary_len).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SimpleSchema;

    fn samples() -> Vec<Profile> {
        let d = |v: f32| Data::from(vec![v, -v]);
        vec![
            Profile::empty(),
            Profile::surface_empty(),
            Profile::surface(d(1.0)),
            Profile::thin(6371.0, d(2.0)).unwrap(),
            Profile::constant(5000.0, 5500.5, d(3.0)).unwrap(),
            Profile::npoint(vec![10.0, 20.0, 35.25], vec![d(4.0), d(5.0), d(f32::NAN)]).unwrap(),
        ]
    }

    #[test]
    fn binary_len_matches_encoding() {
        for p in samples() {
            let mut buf = Vec::new();
            p.write_binary(&mut buf).unwrap();
            assert_eq!(buf.len(), binary_len(&p), "{}", p.profile_type());
        }
    }

    #[test]
    fn both_formats_round_trip_every_variant() {
        let schema = SimpleSchema::new(DataType::Float, 2);
        for p in samples() {
            let mut bin = Vec::new();
            p.write_binary(&mut bin).unwrap();
            assert_eq!(Profile::read_binary(bin.as_slice(), &schema).unwrap(), p);

            let mut text = Vec::new();
            p.write_ascii(&mut text).unwrap();
            assert_eq!(Profile::read_ascii(text.as_slice(), &schema).unwrap(), p);
        }
    }
}
