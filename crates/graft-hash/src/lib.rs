//! Canonical parameter fingerprinting.
//!
//! A shared object's identity is the digest of its name and construction
//! parameters. [`Fingerprint`] is the typed builder that produces it: every
//! constructor parameter flows through [`Fingerprint::field`], and
//! [`Fingerprint::digest`] hashes the canonical encoding.
//!
//! # Canonical encoding
//!
//! Parameters are converted to `serde_json::Value` before serialization.
//! `serde_json` backs JSON objects with a `BTreeMap`, so any map-shaped
//! parameter serializes with sorted keys regardless of its in-memory
//! iteration order. The digest input is the compact serialization of the
//! array `[name, param, param, ...]`, prefixed with a domain tag.
//!
//! # The one dangerous mistake
//!
//! Omitting a constructor parameter from the fingerprint gives two
//! behaviorally different objects the same identity, and the store will
//! silently collapse them into one instance. Pass **every** parameter.

pub mod fingerprint;

pub use fingerprint::Fingerprint;
