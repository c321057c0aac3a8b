use serde::Serialize;
use serde_json::Value;

use graft_types::ContentHash;

/// Domain tag prepended to every fingerprint digest. Prevents collisions
/// with any other BLAKE3 use in an embedding application.
const FINGERPRINT_DOMAIN: &str = "graft-fingerprint-v1";

/// Typed builder for a shared object's content hash.
///
/// Collects the object's name and the ordered tuple of its construction
/// parameters, then digests a canonical encoding of them. The name is part
/// of the digest input, so two object types with equal parameter tuples
/// still produce distinct hashes when their names differ.
///
/// ```
/// use graft_hash::Fingerprint;
///
/// let hash = Fingerprint::new("Counter").field(&1u32).digest();
/// assert_eq!(hash, Fingerprint::new("Counter").field(&1u32).digest());
/// ```
///
/// # Panics
///
/// Building an identity from zero parameters is a programming error and
/// fails loudly: `digest` panics if no field was added. `field` panics if
/// the value cannot be encoded (e.g. a map with non-string keys).
#[derive(Clone, Debug)]
pub struct Fingerprint {
    name: String,
    fields: Vec<Value>,
}

impl Fingerprint {
    /// Start a fingerprint for an object with the given debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Fold a construction parameter into the fingerprint.
    ///
    /// Values are canonicalized through `serde_json::Value`, which sorts
    /// map keys. Field order matters: `[a, b]` and `[b, a]` are distinct
    /// identities.
    pub fn field<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        let encoded = serde_json::to_value(value).unwrap_or_else(|e| {
            panic!(
                "failed to encode fingerprint field for {:?}: {e}",
                self.name
            )
        });
        self.fields.push(encoded);
        self
    }

    /// The object name this fingerprint was started with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters folded in so far.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Produce the content hash over `[name, params...]`.
    pub fn digest(&self) -> ContentHash {
        assert!(
            !self.fields.is_empty(),
            "no parameters provided for fingerprint of {:?}: every construction \
             parameter must be folded in via field()",
            self.name
        );

        let mut input = Vec::with_capacity(self.fields.len() + 1);
        input.push(Value::String(self.name.clone()));
        input.extend(self.fields.iter().cloned());

        let encoded = serde_json::to_vec(&Value::Array(input))
            .unwrap_or_else(|e| panic!("failed to serialize fingerprint of {:?}: {e}", self.name));

        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(&encoded);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }
}
