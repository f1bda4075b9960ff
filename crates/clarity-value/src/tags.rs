//! Value tags and their historical spellings
//!
//! Every tag seen on the wire resolves through this module: binary type
//! prefixes via [`Tag::from_prefix`], textual JSON tags via [`Tag::from_alias`].
//! Ledger-client releases have renamed tags over time (`buff` -> `buffer`,
//! `responseOk` -> `ok`, ...); all spellings map to one canonical [`Tag`].

/// Canonical value tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Int,
    UInt,
    Buffer,
    True,
    False,
    StandardPrincipal,
    ContractPrincipal,
    ResponseOk,
    ResponseErr,
    OptionalNone,
    OptionalSome,
    List,
    Tuple,
    StringAscii,
    StringUtf8,
    /// Textual-only: boolean carried in `value`
    Bool,
    /// Textual-only: principal string of either kind
    Principal,
    /// Textual-only: optional whose presence is decided by `value` being null
    Optional,
    /// Textual-only: response whose branch is decided by `success`
    Response,
}

/// Alias -> canonical tag. Lookup is exact (case-sensitive).
const TAG_ALIASES: &[(&str, Tag)] = &[
    ("int", Tag::Int),
    ("uint", Tag::UInt),
    ("buffer", Tag::Buffer),
    ("buff", Tag::Buffer),
    ("true", Tag::True),
    ("false", Tag::False),
    ("bool", Tag::Bool),
    ("address", Tag::StandardPrincipal),
    ("standard-principal", Tag::StandardPrincipal),
    ("standardPrincipal", Tag::StandardPrincipal),
    ("contract", Tag::ContractPrincipal),
    ("contract-principal", Tag::ContractPrincipal),
    ("contractPrincipal", Tag::ContractPrincipal),
    ("principal", Tag::Principal),
    ("ok", Tag::ResponseOk),
    ("response-ok", Tag::ResponseOk),
    ("responseOk", Tag::ResponseOk),
    ("err", Tag::ResponseErr),
    ("response-err", Tag::ResponseErr),
    ("responseErr", Tag::ResponseErr),
    ("response", Tag::Response),
    ("none", Tag::OptionalNone),
    ("optional-none", Tag::OptionalNone),
    ("optionalNone", Tag::OptionalNone),
    ("some", Tag::OptionalSome),
    ("optional-some", Tag::OptionalSome),
    ("optionalSome", Tag::OptionalSome),
    ("optional", Tag::Optional),
    ("list", Tag::List),
    ("tuple", Tag::Tuple),
    ("ascii", Tag::StringAscii),
    ("string-ascii", Tag::StringAscii),
    ("stringAscii", Tag::StringAscii),
    ("utf8", Tag::StringUtf8),
    ("string-utf8", Tag::StringUtf8),
    ("stringUtf8", Tag::StringUtf8),
];

impl Tag {
    /// Resolve a textual tag. Parameterised type signatures such as
    /// `(buff 32)` or `(optional uint)` resolve by their head word.
    pub fn from_alias(alias: &str) -> Option<Tag> {
        let head = alias
            .trim()
            .trim_start_matches('(')
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_end_matches(')');
        TAG_ALIASES
            .iter()
            .find(|(name, _)| *name == head)
            .map(|(_, tag)| *tag)
    }

    /// Resolve a binary type prefix (also used for numeric JSON tags)
    pub fn from_prefix(prefix: u8) -> Option<Tag> {
        Some(match prefix {
            0x00 => Tag::Int,
            0x01 => Tag::UInt,
            0x02 => Tag::Buffer,
            0x03 => Tag::True,
            0x04 => Tag::False,
            0x05 => Tag::StandardPrincipal,
            0x06 => Tag::ContractPrincipal,
            0x07 => Tag::ResponseOk,
            0x08 => Tag::ResponseErr,
            0x09 => Tag::OptionalNone,
            0x0a => Tag::OptionalSome,
            0x0b => Tag::List,
            0x0c => Tag::Tuple,
            0x0d => Tag::StringAscii,
            0x0e => Tag::StringUtf8,
            _ => return None,
        })
    }

    /// Binary type prefix. Textual-only tags report the prefix of their
    /// first concrete form.
    pub fn prefix(self) -> u8 {
        match self {
            Tag::Int => 0x00,
            Tag::UInt => 0x01,
            Tag::Buffer => 0x02,
            Tag::True | Tag::Bool => 0x03,
            Tag::False => 0x04,
            Tag::StandardPrincipal | Tag::Principal => 0x05,
            Tag::ContractPrincipal => 0x06,
            Tag::ResponseOk | Tag::Response => 0x07,
            Tag::ResponseErr => 0x08,
            Tag::OptionalNone | Tag::Optional => 0x09,
            Tag::OptionalSome => 0x0a,
            Tag::List => 0x0b,
            Tag::Tuple => 0x0c,
            Tag::StringAscii => 0x0d,
            Tag::StringUtf8 => 0x0e,
        }
    }
}
