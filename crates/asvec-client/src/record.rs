//! Records, vectors, search results and access-control entities.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Str(String),
    Int(i64),
    Bytes(Vec<u8>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// A vector of one element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Vector {
    Float(Vec<f32>),
    Bool(Vec<bool>),
}

impl Vector {
    /// Number of components.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// True when there are no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An all-zero float vector.
    pub fn zero_float(dimensions: usize) -> Self {
        Self::Float(vec![0.0; dimensions])
    }

    /// An all-false boolean vector.
    pub fn zero_bool(dimensions: usize) -> Self {
        Self::Bool(vec![false; dimensions])
    }
}

/// A bin value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    FloatVector(Vec<f32>),
    BoolVector(Vec<bool>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the vector held by this value, if it is one.
    pub fn as_vector(&self) -> Option<Vector> {
        match self {
            Self::FloatVector(v) => Some(Vector::Float(v.clone())),
            Self::BoolVector(v) => Some(Vector::Bool(v.clone())),
            _ => None,
        }
    }
}

impl From<Vector> for Value {
    fn from(vector: Vector) -> Self {
        match vector {
            Vector::Float(v) => Self::FloatVector(v),
            Vector::Bool(v) => Self::BoolVector(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("<nil>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Bytes(bytes) => write!(f, "{bytes:?}"),
            Self::FloatVector(v) => write!(f, "{v:?}"),
            Self::BoolVector(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("map[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub generation: u32,
    /// `None` means the record never expires.
    pub expiration: Option<DateTime<Utc>>,
    pub data: BTreeMap<String, Value>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub namespace: String,
    pub set: Option<String>,
    pub key: Key,
    pub distance: f32,
    pub record: Record,
}

/// Per-query search tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Candidate list size. The index default applies when unset.
    pub ef: Option<u32>,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub roles: Vec<String>,
}

/// An access role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
}
