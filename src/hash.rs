//! Deterministic structural hashing for set element identity.
//!
//! Set elements are identified by content, not position. The hash is a
//! SHA-256 digest over a canonical encoding of the value, truncated to 64
//! bits. Secret bits do not participate: marking an element secret never
//! changes its identity.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::value::{Payload, Scalar, Value, ValueKind};

/// Content hash of a set element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetHash(u64);

impl SetHash {
    /// The raw hash value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A value that has no canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct HashError {
    reason: String,
}

impl HashError {
    /// Create a new hash error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

const TAG_NULL: u8 = 0;
const TAG_UNKNOWN: u8 = 1;
const TAG_BOOL: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_LIST: u8 = 6;
const TAG_SET: u8 = 7;
const TAG_MAP: u8 = 8;
const TAG_OBJECT: u8 = 9;

/// Compute the structural hash of a value.
pub fn structural_hash(value: &Value) -> Result<SetHash, HashError> {
    let mut hasher = Sha256::new();
    feed(&mut hasher, value)?;
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    Ok(SetHash(u64::from_be_bytes(bytes)))
}

fn feed(hasher: &mut Sha256, value: &Value) -> Result<(), HashError> {
    match value.kind() {
        ValueKind::Null => hasher.update([TAG_NULL]),
        ValueKind::Unknown => hasher.update([TAG_UNKNOWN]),
        ValueKind::Known(Payload::Scalar(scalar)) => feed_scalar(hasher, scalar)?,
        ValueKind::Known(Payload::List(items)) => {
            hasher.update([TAG_LIST]);
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                feed(hasher, item)?;
            }
        },
        ValueKind::Known(Payload::Set(set)) => {
            hasher.update([TAG_SET]);
            hasher.update((set.len() as u64).to_be_bytes());
            for hash in set.hashes() {
                hasher.update(hash.value().to_be_bytes());
            }
        },
        ValueKind::Known(Payload::Map(entries)) => feed_entries(hasher, TAG_MAP, entries)?,
        ValueKind::Known(Payload::Object(fields)) => feed_entries(hasher, TAG_OBJECT, fields)?,
    }
    Ok(())
}

fn feed_entries(
    hasher: &mut Sha256,
    tag: u8,
    entries: &BTreeMap<String, Value>,
) -> Result<(), HashError> {
    // An object field set to null is the same element as one left unset.
    let present: Vec<(&String, &Value)> = entries
        .iter()
        .filter(|(_, item)| tag != TAG_OBJECT || !item.is_null())
        .collect();
    hasher.update([tag]);
    hasher.update((present.len() as u64).to_be_bytes());
    for (key, item) in present {
        feed_str(hasher, key);
        feed(hasher, item)?;
    }
    Ok(())
}

fn feed_scalar(hasher: &mut Sha256, scalar: &Scalar) -> Result<(), HashError> {
    match scalar {
        Scalar::Bool(b) => hasher.update([TAG_BOOL, u8::from(*b)]),
        Scalar::Int(i) => {
            hasher.update([TAG_INT]);
            hasher.update(i.to_be_bytes());
        },
        Scalar::Float(f) => {
            if f.is_nan() {
                return Err(HashError::new("NaN has no canonical encoding"));
            }
            match Scalar::integral(*f) {
                Some(i) => {
                    hasher.update([TAG_INT]);
                    hasher.update(i.to_be_bytes());
                },
                None => {
                    hasher.update([TAG_FLOAT]);
                    hasher.update(f.to_bits().to_be_bytes());
                },
            }
        },
        Scalar::String(s) => {
            hasher.update([TAG_STRING]);
            feed_str(hasher, s);
        },
    }
    Ok(())
}

fn feed_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = structural_hash(&Value::string("val1")).unwrap();
        let b = structural_hash(&Value::string("val1")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, structural_hash(&Value::string("val2")).unwrap());
    }

    #[test]
    fn test_hash_ignores_secret() {
        let plain = structural_hash(&Value::string("s3cr3t")).unwrap();
        let secret = structural_hash(&Value::string("s3cr3t").into_secret()).unwrap();
        assert_eq!(plain, secret);
    }

    #[test]
    fn test_integral_floats_hash_as_ints() {
        let int = structural_hash(&Value::int(3)).unwrap();
        let float = structural_hash(&Value::float(3.0)).unwrap();
        assert_eq!(int, float);
        assert_ne!(int, structural_hash(&Value::float(3.5)).unwrap());
    }

    #[test]
    fn test_object_hash_independent_of_insertion_order() {
        let a = Value::object([("a", Value::int(1)), ("b", Value::int(2))]);
        let b = Value::object([("b", Value::int(2)), ("a", Value::int(1))]);
        assert_eq!(structural_hash(&a).unwrap(), structural_hash(&b).unwrap());
    }

    #[test]
    fn test_strings_do_not_collide_with_concatenation() {
        let a = Value::list(vec![Value::string("ab"), Value::string("c")]);
        let b = Value::list(vec![Value::string("a"), Value::string("bc")]);
        assert_ne!(structural_hash(&a).unwrap(), structural_hash(&b).unwrap());
    }

    #[test]
    fn test_null_object_field_hashes_as_absent() {
        let explicit = Value::object([("port", Value::int(80)), ("desc", Value::null())]);
        let absent = Value::object([("port", Value::int(80))]);
        assert_eq!(structural_hash(&explicit).unwrap(), structural_hash(&absent).unwrap());

        // Map entries keep their keys even when null.
        let explicit = Value::map([("a", Value::int(1)), ("b", Value::null())]);
        let absent = Value::map([("a", Value::int(1))]);
        assert_ne!(structural_hash(&explicit).unwrap(), structural_hash(&absent).unwrap());
    }

    #[test]
    fn test_nan_cannot_be_hashed() {
        let err = structural_hash(&Value::float(f64::NAN)).unwrap_err();
        assert_eq!(err.to_string(), "NaN has no canonical encoding");
    }
}
