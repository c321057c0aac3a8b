use std::fmt;

use crate::hash::ContentHash;

/// Identity of a shared object inside a store.
///
/// Folds the runtime type tag with the content hash so that two distinct
/// object types with accidentally equal parameter tuples never collide.
/// Two objects with equal keys are treated as interchangeable by the store:
/// the second registration is discarded and its caller redirected to the
/// canonical instance.
///
/// The derived `Ord` (type tag, then hash) is total and stable across runs,
/// which is what makes the sorted-keys stability policy deterministic.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    type_tag: &'static str,
    hash: ContentHash,
}

impl ObjectKey {
    /// Build a key from an explicit type tag and hash.
    pub fn new(type_tag: &'static str, hash: ContentHash) -> Self {
        Self { type_tag, hash }
    }

    /// Build a key for a concrete type, tagging it with `type_name::<T>()`.
    ///
    /// This is what the store calls at the typed registration site, where
    /// `T` is statically known.
    pub fn of<T: 'static>(hash: ContentHash) -> Self {
        Self::new(std::any::type_name::<T>(), hash)
    }

    /// The runtime type tag.
    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// The content hash component.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({}-{})", self.type_tag, self.hash.short_hex())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.type_tag, self.hash.short_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn same_type_same_hash_is_equal() {
        let hash = ContentHash::from_hash([3u8; 32]);
        assert_eq!(ObjectKey::of::<Alpha>(hash), ObjectKey::of::<Alpha>(hash));
    }

    #[test]
    fn different_types_never_collide() {
        let hash = ContentHash::from_hash([3u8; 32]);
        assert_ne!(ObjectKey::of::<Alpha>(hash), ObjectKey::of::<Beta>(hash));
    }

    #[test]
    fn different_hashes_differ() {
        let a = ObjectKey::of::<Alpha>(ContentHash::from_hash([1u8; 32]));
        let b = ObjectKey::of::<Alpha>(ContentHash::from_hash([2u8; 32]));
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_type_tag_first() {
        let a = ObjectKey::new("aaa", ContentHash::from_hash([9u8; 32]));
        let b = ObjectKey::new("bbb", ContentHash::from_hash([0u8; 32]));
        assert!(a < b);
    }

    #[test]
    fn display_includes_tag_and_short_hash() {
        let key = ObjectKey::new("demo::Counter", ContentHash::from_hash([0xab; 32]));
        assert_eq!(format!("{key}"), "demo::Counter-abababab");
    }
}
