//! The six scalar types this engine stores, and the data type tags that
//! describe them in a schema.

use std::cmp::Ordering;
use std::io::Read;

use crate::error::{EngineError, EngineResult};

/// Sanity bound on any length-prefixed STRING/BLOB payload; exceeding it means
/// the stream is corrupt, not that the value is merely large.
const MAX_BYTES_LEN: u64 = 1_000_000;

/// Declares the shape of a column without carrying a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Str,
    Bool,
    Timestamp,
    Float,
    Blob,
}

impl DataType {
    /// Variant tag as stored on disk (declaration order, fixed).
    pub fn tag(self) -> u64 {
        match self {
            DataType::Int => 0,
            DataType::Str => 1,
            DataType::Bool => 2,
            DataType::Timestamp => 3,
            DataType::Float => 4,
            DataType::Blob => 5,
        }
    }

    pub fn from_tag(tag: u64) -> Option<DataType> {
        match tag {
            0 => Some(DataType::Int),
            1 => Some(DataType::Str),
            2 => Some(DataType::Bool),
            3 => Some(DataType::Timestamp),
            4 => Some(DataType::Float),
            5 => Some(DataType::Blob),
            _ => None,
        }
    }

    /// A zero-valued instance of this type, used when a row is missing a column.
    pub fn default_value(self) -> Value {
        match self {
            DataType::Int => Value::Int(0),
            DataType::Str => Value::Str(String::new()),
            DataType::Bool => Value::Bool(false),
            DataType::Timestamp => Value::Timestamp(0),
            DataType::Float => Value::Float(0.0),
            DataType::Blob => Value::Blob(Vec::new()),
        }
    }
}

/// A tagged union of the scalar types a row can hold.
///
/// Ordering is total: first by variant tag (declaration order above), then by
/// the natural order of the payload. `Float` uses `f32::total_cmp` so that
/// NaN payloads never violate the total order the B-tree index relies on.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Str(String),
    Bool(bool),
    Timestamp(i64),
    Float(f32),
    Blob(Vec<u8>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Str(_) => DataType::Str,
            Value::Bool(_) => DataType::Bool,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Float(_) => DataType::Float,
            Value::Blob(_) => DataType::Blob,
        }
    }

    fn variant_tag(&self) -> u8 {
        self.data_type().tag() as u8
    }

    /// Writes this value's payload only (no type tag), per the table-row
    /// layout: fixed-width for scalars, length-prefixed for Str/Blob.
    pub fn encode_payload(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Int(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Value::Str(s) => {
                buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            Value::Bool(b) => buf.push(if *b { 1 } else { 0 }),
            Value::Timestamp(t) => buf.extend_from_slice(&t.to_le_bytes()),
            Value::Float(f) => buf.extend_from_slice(&f.to_le_bytes()),
            Value::Blob(b) => {
                buf.extend_from_slice(&(b.len() as u64).to_le_bytes());
                buf.extend_from_slice(b);
            }
        }
    }

    /// Reads a payload previously written by [`Value::encode_payload`], given
    /// the column's declared type.
    pub fn decode_payload(data_type: DataType, r: &mut impl Read) -> EngineResult<Value> {
        Ok(match data_type {
            DataType::Int => Value::Int(read_i32(r)?),
            DataType::Str => Value::Str(read_string(r)?),
            DataType::Bool => Value::Bool(read_u8(r)? != 0),
            DataType::Timestamp => Value::Timestamp(read_i64(r)?),
            DataType::Float => Value::Float(read_f32(r)?),
            DataType::Blob => Value::Blob(read_bytes(r)?),
        })
    }

    /// Self-describing encoding (type tag + payload), used by the B-tree
    /// index which has no external schema to consult.
    pub fn encode_tagged(&self, buf: &mut Vec<u8>) {
        buf.push(self.variant_tag());
        self.encode_payload(buf);
    }

    pub fn decode_tagged(r: &mut impl Read) -> EngineResult<Value> {
        let tag = read_u8(r)? as u64;
        let data_type = DataType::from_tag(tag)
            .ok_or_else(|| EngineError::CorruptFile(format!("unknown value tag {tag}")))?;
        Value::decode_payload(data_type, r)
    }
}

fn read_u8(r: &mut impl Read) -> EngineResult<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_i32(r: &mut impl Read) -> EngineResult<i32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(i32::from_le_bytes(b))
}

fn read_i64(r: &mut impl Read) -> EngineResult<i64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(i64::from_le_bytes(b))
}

fn read_f32(r: &mut impl Read) -> EngineResult<f32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(f32::from_le_bytes(b))
}

pub(crate) fn read_u64(r: &mut impl Read) -> EngineResult<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_le_bytes(b))
}

fn read_bytes(r: &mut impl Read) -> EngineResult<Vec<u8>> {
    let len = read_u64(r)?;
    if len > MAX_BYTES_LEN {
        return Err(EngineError::CorruptFile(format!(
            "length-prefixed payload of {len} bytes exceeds sanity bound"
        )));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string(r: &mut impl Read) -> EngineResult<String> {
    let bytes = read_bytes(r)?;
    String::from_utf8(bytes)
        .map_err(|e| EngineError::CorruptFile(format!("invalid UTF-8 in string payload: {e}")))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let tag_order = self.variant_tag().cmp(&other.variant_tag());
        if tag_order != Ordering::Equal {
            return tag_order;
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            _ => unreachable!("variant_tag equality implies matching variants"),
        }
    }
}
