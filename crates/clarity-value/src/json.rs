//! JSON typed-value form emitted by JS ledger clients
//!
//! Shapes vary by client release:
//! ```text
//! {"type": "uint", "value": "30"}                   -- current
//! {"type": "buff", "value": "0xdeadbeef"}           -- older spelling
//! {"type": 12, "data": {...}}                       -- numeric tags, tuple under `data`
//! {"type": "(optional uint)", "value": null}        -- signature form
//! {"type": "(response ...)", "success": true, ...}
//! ```
//! All tags resolve through [`Tag`]; this module only locates payloads.

use std::collections::BTreeMap;

use amm_core::DecodeError;
use serde_json::Value;

use crate::decode::MAX_DEPTH;
use crate::tags::Tag;
use crate::value::TypedValue;

impl TypedValue {
    /// Decode the JSON form. Fails on unknown tags and missing payloads.
    pub fn from_json(json: &Value) -> Result<TypedValue, DecodeError> {
        from_json_at(json, 0)
    }
}

fn malformed(msg: impl Into<String>) -> DecodeError {
    DecodeError::MalformedJson(msg.into())
}

fn resolve_tag(raw: &Value) -> Result<Tag, DecodeError> {
    match raw {
        Value::String(s) => Tag::from_alias(s).ok_or_else(|| DecodeError::UnknownTag(s.clone())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Tag::from_prefix)
            .ok_or_else(|| DecodeError::UnknownTag(n.to_string())),
        _ => Err(malformed("missing type tag")),
    }
}

/// First present payload key
fn payload<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Result<&'a Value, DecodeError> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .ok_or_else(|| malformed(format!("missing {}", keys.join("/"))))
}

fn parse_u128(v: &Value) -> Result<u128, DecodeError> {
    match v {
        Value::String(s) => s
            .trim_start_matches('u')
            .parse()
            .map_err(|_| DecodeError::IntegerOverflow("u128")),
        Value::Number(n) => n.as_u64().map(u128::from).ok_or(DecodeError::IntegerOverflow("u128")),
        _ => Err(malformed("uint payload must be string or number")),
    }
}

fn parse_i128(v: &Value) -> Result<i128, DecodeError> {
    match v {
        Value::String(s) => s.parse().map_err(|_| DecodeError::IntegerOverflow("i128")),
        Value::Number(n) => n.as_i64().map(i128::from).ok_or(DecodeError::IntegerOverflow("i128")),
        _ => Err(malformed("int payload must be string or number")),
    }
}

fn parse_str(v: &Value) -> Result<&str, DecodeError> {
    v.as_str().ok_or_else(|| malformed("expected string payload"))
}

fn from_json_at(json: &Value, depth: usize) -> Result<TypedValue, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthExceeded(MAX_DEPTH));
    }
    let obj = json.as_object().ok_or_else(|| malformed("expected object"))?;
    let tag = resolve_tag(obj.get("type").unwrap_or(&Value::Null))?;
    let child = |v: &Value| from_json_at(v, depth + 1);

    let value = match tag {
        Tag::Int => TypedValue::Int(parse_i128(payload(obj, &["value"])?)?),
        Tag::UInt => TypedValue::UInt(parse_u128(payload(obj, &["value"])?)?),
        Tag::Buffer => {
            let raw = parse_str(payload(obj, &["value", "buffer", "data"])?)?;
            let digits = raw.strip_prefix("0x").unwrap_or(raw);
            TypedValue::Buffer(hex::decode(digits).map_err(|_| DecodeError::InvalidHex)?)
        }
        Tag::True => TypedValue::Bool(true),
        Tag::False => TypedValue::Bool(false),
        Tag::Bool => TypedValue::Bool(
            payload(obj, &["value"])?
                .as_bool()
                .ok_or_else(|| malformed("bool payload"))?,
        ),
        Tag::StandardPrincipal | Tag::ContractPrincipal | Tag::Principal => {
            let raw = parse_str(payload(obj, &["value", "address"])?)?;
            TypedValue::Principal(raw.parse()?)
        }
        Tag::ResponseOk => TypedValue::ok(child(payload(obj, &["value"])?)?),
        Tag::ResponseErr => TypedValue::err(child(payload(obj, &["value"])?)?),
        Tag::Response => {
            let inner = child(payload(obj, &["value"])?)?;
            match obj.get("success").and_then(Value::as_bool) {
                Some(true) => TypedValue::ok(inner),
                Some(false) => TypedValue::err(inner),
                None => return Err(malformed("response without success flag")),
            }
        }
        Tag::OptionalNone => TypedValue::none(),
        Tag::OptionalSome => TypedValue::some(child(payload(obj, &["value"])?)?),
        Tag::Optional => match obj.get("value") {
            None | Some(Value::Null) => TypedValue::none(),
            Some(inner) => TypedValue::some(child(inner)?),
        },
        Tag::List => {
            let items = payload(obj, &["value", "list"])?
                .as_array()
                .ok_or_else(|| malformed("list payload"))?;
            TypedValue::List(items.iter().map(child).collect::<Result<_, _>>()?)
        }
        Tag::Tuple => {
            let members = payload(obj, &["value", "data"])?
                .as_object()
                .ok_or_else(|| malformed("tuple payload"))?;
            let mut fields = BTreeMap::new();
            for (name, member) in members {
                fields.insert(name.clone(), child(member)?);
            }
            TypedValue::Tuple(fields)
        }
        Tag::StringAscii | Tag::StringUtf8 => {
            TypedValue::Text(parse_str(payload(obj, &["value", "data"])?)?.to_string())
        }
    };

    Ok(value)
}
