//! clarity-value: Typed-value codec for ledger data
//!
//! Decodes the recursive typed-value encoding used by read-only query results
//! and contract log payloads, in both the binary consensus form and the JSON
//! form emitted by JS ledger clients, and encodes query arguments.

pub mod decode;
pub mod encode;
pub mod json;
pub mod principal;
pub mod tags;
pub mod value;

pub use decode::{normalize, normalize_hex, MAX_DEPTH};
pub use principal::{address_version, Principal, StandardPrincipal};
pub use tags::Tag;
pub use value::TypedValue;
