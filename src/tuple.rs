//! tuple: row encoding.
//!
//! Formats (little-endian):
//! - Value: `[tag u8][i32]` for Int, `[tag u8][len u16][utf-8 bytes]` for Text.
//! - Tuple: `[count u16][value]*`.
//!
//! Decoding runs over a borrowed slice through `Decoder`; every read is bounds
//! checked and fails with `CorruptEncoding` instead of reading past the end.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, StorageError};

pub const TAG_INT: u8 = 0;
pub const TAG_TEXT: u8 = 1;

/// Bounds-checked read cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(StorageError::corrupt(format!(
                "truncated input: need {} byte(s) at offset {}, have {}",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }
}

/// One column cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::Text(_) => "TEXT",
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(StorageError::TypeMismatch {
                expected: "INT",
                actual: other.type_name(),
            }),
        }
    }

    pub fn as_text(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(StorageError::TypeMismatch {
                expected: "TEXT",
                actual: other.type_name(),
            }),
        }
    }

    /// Exact number of bytes `serialize` produces.
    pub fn encoded_len(&self) -> usize {
        match self {
            Value::Int(_) => 1 + 4,
            Value::Text(s) => 1 + 2 + s.len(),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Append the encoding to `out`. Text over 65535 bytes is rejected.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Int(v) => {
                out.push(TAG_INT);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Text(s) => {
                let len = u16::try_from(s.len()).map_err(|_| {
                    StorageError::ValueTooLarge(format!(
                        "text of {} bytes exceeds {} byte limit",
                        s.len(),
                        u16::MAX
                    ))
                })?;
                out.push(TAG_TEXT);
                out.extend_from_slice(&len.to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
        Ok(())
    }

    pub fn deserialize(dec: &mut Decoder<'_>) -> Result<Self> {
        let tag = dec.read_u8()?;
        match tag {
            TAG_INT => Ok(Value::Int(dec.read_i32()?)),
            TAG_TEXT => {
                let len = dec.read_u16()? as usize;
                let bytes = dec.take(len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| StorageError::corrupt(format!("text is not utf-8: {e}")))?;
                Ok(Value::Text(s.to_string()))
            }
            other => Err(StorageError::corrupt(format!("unknown value tag {other}"))),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One row: ordered values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn encoded_len(&self) -> usize {
        2 + self.values.iter().map(Value::encoded_len).sum::<usize>()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let count = u16::try_from(self.values.len()).map_err(|_| {
            StorageError::ValueTooLarge(format!(
                "tuple of {} values exceeds {} value limit",
                self.values.len(),
                u16::MAX
            ))
        })?;
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&count.to_le_bytes());
        for v in &self.values {
            v.encode_into(&mut out)?;
        }
        Ok(out)
    }

    pub fn deserialize(dec: &mut Decoder<'_>) -> Result<Self> {
        let count = dec.read_u16()? as usize;
        // Each value takes at least 3 bytes; cap the reservation by what is left.
        let mut values = Vec::with_capacity(count.min(dec.remaining() / 3));
        for _ in 0..count {
            values.push(Value::deserialize(dec)?);
        }
        Ok(Self { values })
    }

    /// Decode a whole record; trailing bytes are a corruption.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let t = Self::deserialize(&mut dec)?;
        if dec.remaining() != 0 {
            return Err(StorageError::corrupt(format!(
                "{} trailing byte(s) after tuple",
                dec.remaining()
            )));
        }
        Ok(t)
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
