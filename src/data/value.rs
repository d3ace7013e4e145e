//! `Data`: the per-node attribute vector held by profiles.
//!
//! A `Data` value is a fixed-length vector of one numeric element type (the
//! model's [`DataType`]). Profiles own their `Data` by value; `clone` is a deep
//! copy, and float equality treats NaN as equal to NaN so that values holding
//! "missing" attributes still compare equal after a round trip.

use crate::data::DataType;
use crate::profile_error::ProfileError;
use num_traits::{NumCast, ToPrimitive};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Element types that can live inside a [`Data`] vector.
pub(crate) trait Element: Copy + PartialEq + NumCast + ToPrimitive + fmt::Display + FromStr {
    fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()>;
    fn read_be<R: Read>(reader: &mut R) -> std::io::Result<Self>;

    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    /// Value equality; floats treat NaN == NaN.
    #[inline]
    fn same(self, other: Self) -> bool {
        self == other
    }
}

macro_rules! impl_int_element {
    ($($t:ty => $w:expr),* $(,)?) => {$(
        impl Element for $t {
            #[inline]
            fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
                writer.write_all(&self.to_be_bytes())
            }
            #[inline]
            fn read_be<R: Read>(reader: &mut R) -> std::io::Result<Self> {
                let mut buf = [0u8; $w];
                reader.read_exact(&mut buf)?;
                Ok(<$t>::from_be_bytes(buf))
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty => $w:expr),* $(,)?) => {$(
        impl Element for $t {
            #[inline]
            fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
                writer.write_all(&self.to_be_bytes())
            }
            #[inline]
            fn read_be<R: Read>(reader: &mut R) -> std::io::Result<Self> {
                let mut buf = [0u8; $w];
                reader.read_exact(&mut buf)?;
                Ok(<$t>::from_be_bytes(buf))
            }
            #[inline]
            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }
            #[inline]
            fn same(self, other: Self) -> bool {
                self == other || (<$t>::is_nan(self) && <$t>::is_nan(other))
            }
        }
    )*};
}

impl_float_element!(f64 => 8, f32 => 4);
impl_int_element!(i64 => 8, i32 => 4, i16 => 2, i8 => 1);

/// Fixed-size attribute vector of a single numeric element type.
#[derive(Clone, Debug)]
pub enum Data {
    /// `DataType::Double` values.
    Double(Vec<f64>),
    /// `DataType::Float` values.
    Float(Vec<f32>),
    /// `DataType::Long` values.
    Long(Vec<i64>),
    /// `DataType::Int` values.
    Int(Vec<i32>),
    /// `DataType::Short` values.
    Short(Vec<i16>),
    /// `DataType::Byte` values.
    Byte(Vec<i8>),
}

/// Apply `$body` to the typed vector inside a `Data`, binding it to `$v`.
macro_rules! with_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            Data::Double($v) => $body,
            Data::Float($v) => $body,
            Data::Long($v) => $body,
            Data::Int($v) => $body,
            Data::Short($v) => $body,
            Data::Byte($v) => $body,
        }
    };
}

fn cast_all<T: Element>(values: &[f64], data_type: DataType) -> Result<Vec<T>, ProfileError> {
    values
        .iter()
        .map(|&value| cast_one(value, data_type))
        .collect()
}

fn cast_one<T: Element>(value: f64, data_type: DataType) -> Result<T, ProfileError> {
    <T as NumCast>::from(value).ok_or(ProfileError::ValueConversion { value, data_type })
}

fn read_all<T: Element, R: Read>(reader: &mut R, n: usize) -> Result<Vec<T>, ProfileError> {
    let mut out = Vec::with_capacity(n.min(crate::codec::MAX_PREALLOC));
    for _ in 0..n {
        out.push(T::read_be(reader).map_err(|e| ProfileError::from_read(e, "data value"))?);
    }
    Ok(out)
}

fn parse_all<'a, T: Element, I>(
    tokens: &mut I,
    n: usize,
    data_type: DataType,
) -> Result<Vec<T>, ProfileError>
where
    I: Iterator<Item = &'a str>,
{
    let mut out = Vec::with_capacity(n.min(crate::codec::MAX_PREALLOC));
    for _ in 0..n {
        let token = tokens.next().ok_or(ProfileError::Truncated {
            field: "data value",
        })?;
        let value = token.parse::<T>().map_err(|_| {
            ProfileError::Format(format!("invalid {data_type} value `{token}`"))
        })?;
        out.push(value);
    }
    Ok(out)
}

impl Data {
    /// Build a `Data` of `data_type` from `f64` values, checking every conversion.
    ///
    /// # Errors
    /// Returns [`ProfileError::ValueConversion`] if a value cannot be
    /// represented in the target type (NaN, or a value out of range for an
    /// integer type).
    pub fn from_values(data_type: DataType, values: &[f64]) -> Result<Self, ProfileError> {
        Ok(match data_type {
            DataType::Double => Data::Double(values.to_vec()),
            DataType::Float => Data::Float(cast_all(values, data_type)?),
            DataType::Long => Data::Long(cast_all(values, data_type)?),
            DataType::Int => Data::Int(cast_all(values, data_type)?),
            DataType::Short => Data::Short(cast_all(values, data_type)?),
            DataType::Byte => Data::Byte(cast_all(values, data_type)?),
        })
    }

    /// Element type of this vector.
    pub fn data_type(&self) -> DataType {
        match self {
            Data::Double(_) => DataType::Double,
            Data::Float(_) => DataType::Float,
            Data::Long(_) => DataType::Long,
            Data::Int(_) => DataType::Int,
            Data::Short(_) => DataType::Short,
            Data::Byte(_) => DataType::Byte,
        }
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    /// Returns true if the vector has no attributes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attribute value as `f64`, or NaN if `attribute` is out of range.
    #[inline]
    pub fn value(&self, attribute: usize) -> f64 {
        with_values!(self, v => v
            .get(attribute)
            .and_then(|x| x.to_f64())
            .unwrap_or(f64::NAN))
    }

    /// Whether the attribute is NaN (or absent). Integer elements are never NaN.
    #[inline]
    pub fn is_nan(&self, attribute: usize) -> bool {
        with_values!(self, v => v.get(attribute).is_none_or(|x| Element::is_nan(*x)))
    }

    /// Overwrite one attribute, converting `value` into the element type.
    pub fn set_value(&mut self, attribute: usize, value: f64) -> Result<(), ProfileError> {
        let data_type = self.data_type();
        let len = self.len();
        with_values!(self, v => {
            let slot = v
                .get_mut(attribute)
                .ok_or(ProfileError::AttributeIndexOutOfBounds { attribute, len })?;
            *slot = cast_one(value, data_type)?;
            Ok(())
        })
    }

    /// Check that this value carries `n_attributes` elements of `data_type`.
    pub fn check_shape(
        &self,
        data_type: DataType,
        n_attributes: usize,
    ) -> Result<(), ProfileError> {
        if self.data_type() != data_type {
            return Err(ProfileError::DataTypeMismatch {
                expected: data_type,
                found: self.data_type(),
            });
        }
        if self.len() != n_attributes {
            return Err(ProfileError::AttributeCountMismatch {
                expected: n_attributes,
                found: self.len(),
            });
        }
        Ok(())
    }

    /// Write the elements big-endian at their native width. No length prefix.
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> Result<(), ProfileError> {
        with_values!(self, v => {
            for x in v {
                x.write_be(writer)?;
            }
        });
        Ok(())
    }

    /// Read `n_attributes` big-endian elements of `data_type`.
    pub fn read_binary<R: Read>(
        reader: &mut R,
        data_type: DataType,
        n_attributes: usize,
    ) -> Result<Self, ProfileError> {
        Ok(match data_type {
            DataType::Double => Data::Double(read_all(reader, n_attributes)?),
            DataType::Float => Data::Float(read_all(reader, n_attributes)?),
            DataType::Long => Data::Long(read_all(reader, n_attributes)?),
            DataType::Int => Data::Int(read_all(reader, n_attributes)?),
            DataType::Short => Data::Short(read_all(reader, n_attributes)?),
            DataType::Byte => Data::Byte(read_all(reader, n_attributes)?),
        })
    }

    /// Text tokens of the elements, in shortest round-trip form.
    pub fn ascii_tokens(&self) -> Vec<String> {
        with_values!(self, v => v.iter().map(|x| x.to_string()).collect())
    }

    /// Parse `n_attributes` whitespace tokens of `data_type`.
    pub fn parse_ascii<'a, I>(
        tokens: &mut I,
        data_type: DataType,
        n_attributes: usize,
    ) -> Result<Self, ProfileError>
    where
        I: Iterator<Item = &'a str>,
    {
        Ok(match data_type {
            DataType::Double => Data::Double(parse_all(tokens, n_attributes, data_type)?),
            DataType::Float => Data::Float(parse_all(tokens, n_attributes, data_type)?),
            DataType::Long => Data::Long(parse_all(tokens, n_attributes, data_type)?),
            DataType::Int => Data::Int(parse_all(tokens, n_attributes, data_type)?),
            DataType::Short => Data::Short(parse_all(tokens, n_attributes, data_type)?),
            DataType::Byte => Data::Byte(parse_all(tokens, n_attributes, data_type)?),
        })
    }

    /// Encoded size on the binary wire.
    pub fn binary_len(&self) -> usize {
        self.len() * self.data_type().byte_width()
    }
}

fn same_elements<T: Element>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(*y))
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Data::Double(a), Data::Double(b)) => same_elements(a, b),
            (Data::Float(a), Data::Float(b)) => same_elements(a, b),
            (Data::Long(a), Data::Long(b)) => same_elements(a, b),
            (Data::Int(a), Data::Int(b)) => same_elements(a, b),
            (Data::Short(a), Data::Short(b)) => same_elements(a, b),
            (Data::Byte(a), Data::Byte(b)) => same_elements(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.ascii_tokens().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(token)?;
        }
        Ok(())
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<Vec<$t>> for Data {
            fn from(values: Vec<$t>) -> Self {
                Data::$variant(values)
            }
        }
    )*};
}

impl_from_vec!(f64 => Double, f32 => Float, i64 => Long, i32 => Int, i16 => Short, i8 => Byte);
