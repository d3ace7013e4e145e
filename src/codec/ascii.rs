//! Ascii profile records: one line per profile.
//!
//! A line holds the type tag followed by whitespace-separated tokens in the
//! variant's field order. Floats are printed in shortest round-trip form, so
//! decoding an encoded line restores the exact bits. Blank lines are skipped;
//! tokens left over after the last field are a format error.

use std::io::{BufRead, Write};

use super::{FieldSink, FieldSource};
use crate::data::{AttributeSchema, Data, DataType};
use crate::profile::{Profile, ProfileType};
use crate::profile_error::ProfileError;

/// Writes ascii profile lines to a text sink.
#[derive(Debug)]
pub struct AsciiWriter<W> {
    inner: W,
    line: String,
}

impl<W: Write> AsciiWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }

    /// Append one line.
    pub fn write_profile(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        super::encode(profile, self)
    }

    /// Append one line per profile.
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

impl<W: Write> FieldSink for AsciiWriter<W> {
    fn begin(&mut self, profile_type: ProfileType) -> Result<(), ProfileError> {
        self.line.clear();
        self.line.push_str(&profile_type.tag().to_string());
        Ok(())
    }

    fn radius(&mut self, radius: f32) -> Result<(), ProfileError> {
        self.line.push(' ');
        self.line.push_str(&radius.to_string());
        Ok(())
    }

    fn count(&mut self, count: usize) -> Result<(), ProfileError> {
        self.line.push(' ');
        self.line.push_str(&count.to_string());
        Ok(())
    }

    fn data(&mut self, data: &Data) -> Result<(), ProfileError> {
        for token in data.ascii_tokens() {
            self.line.push(' ');
            self.line.push_str(&token);
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), ProfileError> {
        self.line.push('\n');
        self.inner.write_all(self.line.as_bytes())?;
        Ok(())
    }
}

/// Reads ascii profile lines from a buffered text source.
#[derive(Debug)]
pub struct AsciiReader<R> {
    inner: R,
    tokens: Vec<String>,
    next: usize,
    line_no: usize,
}

impl<R: BufRead> AsciiReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            tokens: Vec::new(),
            next: 0,
            line_no: 0,
        }
    }

    /// Read the next line's profile, or `None` at end of input.
    pub fn next_profile<S>(&mut self, schema: &S) -> Result<Option<Profile>, ProfileError>
    where
        S: AttributeSchema + ?Sized,
    {
        super::decode(self, schema)
    }

    /// Read exactly one profile line.
    ///
    /// # Errors
    /// [`ProfileError::Truncated`] if no line is left.
    pub fn read_profile<S>(&mut self, schema: &S) -> Result<Profile, ProfileError>
    where
        S: AttributeSchema + ?Sized,
    {
        self.next_profile(schema)?
            .ok_or(ProfileError::Truncated { field: "type tag" })
    }

    /// 1-based number of the line read last (0 before any read).
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    fn token(&mut self, field: &'static str) -> Result<&str, ProfileError> {
        let token = self
            .tokens
            .get(self.next)
            .ok_or(ProfileError::Truncated { field })?;
        self.next += 1;
        Ok(token.as_str())
    }

    fn format_error(&self, what: String) -> ProfileError {
        ProfileError::Format(format!("line {}: {what}", self.line_no))
    }
}

impl<R: BufRead> FieldSource for AsciiReader<R> {
    fn tag(&mut self) -> Result<Option<i64>, ProfileError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.inner.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                break;
            }
        }
        self.tokens = line.split_whitespace().map(str::to_owned).collect();
        self.next = 0;
        let token = self.token("type tag")?;
        match token.parse::<i64>() {
            Ok(tag) => Ok(Some(tag)),
            Err(_) => {
                let what = format!("type tag `{token}` is not an integer");
                Err(self.format_error(what))
            }
        }
    }

    fn radius(&mut self) -> Result<f32, ProfileError> {
        let token = self.token("radius")?;
        match token.parse::<f32>() {
            Ok(r) => Ok(r),
            Err(_) => {
                let what = format!("invalid radius `{token}`");
                Err(self.format_error(what))
            }
        }
    }

    fn count(&mut self, min: usize) -> Result<usize, ProfileError> {
        let token = self.token("node count")?;
        match token.parse::<i64>().ok().and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n >= min => Ok(n),
            _ => {
                let what = format!("node count `{token}` is not an integer >= {min}");
                Err(self.format_error(what))
            }
        }
    }

    fn data(&mut self, data_type: DataType, n_attributes: usize) -> Result<Data, ProfileError> {
        let mut rest = self.tokens[self.next..].iter().map(String::as_str);
        let data = Data::parse_ascii(&mut rest, data_type, n_attributes)?;
        self.next += n_attributes;
        Ok(data)
    }

    fn end(&mut self) -> Result<(), ProfileError> {
        let left = self.tokens.len() - self.next;
        if left > 0 {
            let what = format!("{left} unexpected trailing token(s)");
            return Err(self.format_error(what));
        }
        Ok(())
    }
}
