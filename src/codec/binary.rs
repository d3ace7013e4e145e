//! Binary profile records.
//!
//! Layout: one type-tag byte, then the variant's fields. Radii are IEEE `f32`,
//! counts are `i32`, and Data elements use their native width; every
//! multi-byte field is big-endian.

use std::io::{ErrorKind, Read, Write};

use super::{FieldSink, FieldSource};
use crate::data::{AttributeSchema, Data, DataType};
use crate::profile::{Profile, ProfileType};
use crate::profile_error::ProfileError;

/// Writes binary profile records to a byte sink.
#[derive(Debug)]
pub struct BinaryWriter<W> {
    inner: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Append one record.
    pub fn write_profile(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        super::encode(profile, self)
    }

    /// Append one record per profile.
    pub fn write_all<'a, I>(&mut self, profiles: I) -> Result<(), ProfileError>
    where
        I: IntoIterator<Item = &'a Profile>,
    {
        for profile in profiles {
            self.write_profile(profile)?;
        }
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W, ProfileError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> FieldSink for BinaryWriter<W> {
    fn begin(&mut self, profile_type: ProfileType) -> Result<(), ProfileError> {
        self.inner.write_all(&[profile_type.tag()])?;
        Ok(())
    }

    fn radius(&mut self, radius: f32) -> Result<(), ProfileError> {
        self.inner.write_all(&radius.to_be_bytes())?;
        Ok(())
    }

    fn count(&mut self, count: usize) -> Result<(), ProfileError> {
        let count = i32::try_from(count)
            .map_err(|_| ProfileError::Format(format!("node count {count} exceeds i32")))?;
        self.inner.write_all(&count.to_be_bytes())?;
        Ok(())
    }

    fn data(&mut self, data: &Data) -> Result<(), ProfileError> {
        data.write_binary(&mut self.inner)
    }

    fn end(&mut self) -> Result<(), ProfileError> {
        Ok(())
    }
}

/// Reads binary profile records from a byte source.
#[derive(Debug)]
pub struct BinaryReader<R> {
    inner: R,
    records: usize,
}

impl<R: Read> BinaryReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner, records: 0 }
    }

    /// Read the next record, or `None` when the input ends cleanly before a tag.
    pub fn next_profile<S>(&mut self, schema: &S) -> Result<Option<Profile>, ProfileError>
    where
        S: AttributeSchema + ?Sized,
    {
        let profile = super::decode(self, schema)?;
        if profile.is_some() {
            self.records += 1;
        }
        Ok(profile)
    }

    /// Read exactly one record.
    ///
    /// # Errors
    /// [`ProfileError::Truncated`] if the input is already exhausted.
    pub fn read_profile<S>(&mut self, schema: &S) -> Result<Profile, ProfileError>
    where
        S: AttributeSchema + ?Sized,
    {
        self.next_profile(schema)?
            .ok_or(ProfileError::Truncated { field: "type tag" })
    }

    /// Number of records decoded so far.
    pub fn records_read(&self) -> usize {
        self.records
    }

    /// Return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> FieldSource for BinaryReader<R> {
    fn tag(&mut self) -> Result<Option<i64>, ProfileError> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(i64::from(byte[0]))),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn radius(&mut self) -> Result<f32, ProfileError> {
        let mut buf = [0u8; 4];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| ProfileError::from_read(e, "radius"))?;
        Ok(f32::from_be_bytes(buf))
    }

    fn count(&mut self, min: usize) -> Result<usize, ProfileError> {
        let mut buf = [0u8; 4];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| ProfileError::from_read(e, "node count"))?;
        let count = i32::from_be_bytes(buf);
        match usize::try_from(count) {
            Ok(n) if n >= min => Ok(n),
            _ => Err(ProfileError::Format(format!(
                "node count {count} is below the minimum of {min}"
            ))),
        }
    }

    fn data(&mut self, data_type: DataType, n_attributes: usize) -> Result<Data, ProfileError> {
        Data::read_binary(&mut self.inner, data_type, n_attributes)
    }

    fn end(&mut self) -> Result<(), ProfileError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SimpleSchema;

    fn schema() -> SimpleSchema {
        SimpleSchema::new(DataType::Double, 1)
    }

    #[test]
    fn thin_record_layout() {
        let p = Profile::thin(1.5, Data::from(vec![2.0f64])).unwrap();
        let mut buf = Vec::new();
        p.write_binary(&mut buf).unwrap();
        let mut expected = vec![1u8];
        expected.extend_from_slice(&1.5f32.to_be_bytes());
        expected.extend_from_slice(&2.0f64.to_be_bytes());
        assert_eq!(buf, expected);
    }

    #[test]
    fn npoint_record_carries_count() {
        let d = |v: f64| Data::from(vec![v]);
        let p = Profile::npoint(vec![1.0, 2.0], vec![d(3.0), d(4.0)]).unwrap();
        let mut buf = Vec::new();
        p.write_binary(&mut buf).unwrap();
        assert_eq!(buf[0], 3);
        assert_eq!(&buf[1..5], &2i32.to_be_bytes());
        assert_eq!(buf.len(), 1 + 4 + 2 * 4 + 2 * 8);
    }

    #[test]
    fn reads_records_in_sequence() {
        let a = Profile::surface(Data::from(vec![7.0f64]));
        let b = Profile::empty();
        let mut w = BinaryWriter::new(Vec::new());
        w.write_all([&a, &b, &a]).unwrap();
        let buf = w.into_inner().unwrap();
        let mut r = BinaryReader::new(buf.as_slice());
        assert_eq!(r.next_profile(&schema()).unwrap(), Some(a.clone()));
        assert_eq!(r.next_profile(&schema()).unwrap(), Some(b));
        assert_eq!(r.next_profile(&schema()).unwrap(), Some(a));
        assert_eq!(r.next_profile(&schema()).unwrap(), None);
        assert_eq!(r.records_read(), 3);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = Profile::read_binary([9u8].as_slice(), &schema()).unwrap_err();
        assert!(matches!(err, ProfileError::UnknownProfileType(9)));
    }

    #[test]
    fn truncation_names_the_field() {
        let err = Profile::read_binary([1u8, 0, 0].as_slice(), &schema()).unwrap_err();
        assert!(matches!(err, ProfileError::Truncated { field: "radius" }));
        let err = Profile::read_binary([3u8, 0].as_slice(), &schema()).unwrap_err();
        assert!(matches!(err, ProfileError::Truncated { field: "node count" }));
        let err = Profile::read_binary(std::io::empty(), &schema()).unwrap_err();
        assert!(matches!(err, ProfileError::Truncated { field: "type tag" }));
    }

    #[test]
    fn bad_counts_are_format_errors() {
        for count in [-1i32, 0, 1] {
            let mut buf = vec![3u8];
            buf.extend_from_slice(&count.to_be_bytes());
            let err = Profile::read_binary(buf.as_slice(), &schema()).unwrap_err();
            assert!(matches!(err, ProfileError::Format(_)), "{count}");
        }
    }

    #[test]
    fn unordered_radii_are_rejected_after_read() {
        let d = Data::from(vec![1.0f64]);
        let mut buf = vec![3u8];
        buf.extend_from_slice(&2i32.to_be_bytes());
        buf.extend_from_slice(&5.0f32.to_be_bytes());
        buf.extend_from_slice(&4.0f32.to_be_bytes());
        for _ in 0..2 {
            d.write_binary(&mut buf).unwrap();
        }
        let err = Profile::read_binary(buf.as_slice(), &schema()).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidProfile { .. }));
        assert!(err.is_format_error());
    }
}
