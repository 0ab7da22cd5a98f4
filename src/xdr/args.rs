//! Contract call arguments
//!
//! Callers describe every positional argument with an explicit [`ContractArg`]
//! tag, so nothing has to be guessed from the shape of a string. For JSON
//! callers (the CLI, HTTP front-ends) [`ArgumentParser`] accepts the same tags
//! as annotations:
//!
//! | Type      | Example                                        | Encoded as     |
//! |-----------|------------------------------------------------|----------------|
//! | `address` | `{"type": "address", "value": "G..."}`         | `ScVal::Address` |
//! | `i128`    | `{"type": "i128", "value": "-170141183460469231731687303715884105728"}` | `ScVal::I128` |
//! | `u128`    | `{"type": "u128", "value": 100}`               | `ScVal::U128`  |
//! | `i64`     | `{"type": "i64", "value": -999}`               | `ScVal::I64`   |
//! | `u64`     | `{"type": "u64", "value": 1000000}`            | `ScVal::U64`   |
//! | `i32`     | `{"type": "i32", "value": -5}`                 | `ScVal::I32`   |
//! | `u32`     | `{"type": "u32", "value": 42}`                 | `ScVal::U32`   |
//! | `bool`    | `{"type": "bool", "value": true}`              | `ScVal::Bool`  |
//! | `string`  | `{"type": "string", "value": "hello"}`         | `ScVal::String`|
//! | `symbol`  | `{"type": "symbol", "value": "transfer"}`      | `ScVal::Symbol`|
//! | `bytes`   | `{"type": "bytes", "value": "0xdeadbeef"}`     | `ScVal::Bytes` |
//! | `vec`     | `{"type": "vec", "value": [1, 2], "element_type": "u32"}` | `ScVal::Vec` |
//! | `void`    | `{"type": "void"}` or `null`                   | `ScVal::Void`  |
//!
//! Bare values keep the legacy inference: a string that is a valid `G...` or
//! `C...` strkey becomes an address, integers become `i128`, every other
//! string becomes a `string`.

use super::parse_sc_address;
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stellar_xdr::curr::{
    BytesM, Int128Parts, ScBytes, ScString, ScSymbol, ScVal, ScVec, StringM, UInt128Parts, VecM,
};
use thiserror::Error;
use tracing::{debug, warn};

/// A positional contract argument with an explicit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContractArg {
    Address(String),
    I128(i128),
    U128(u128),
    I64(i64),
    U64(u64),
    I32(i32),
    U32(u32),
    Bool(bool),
    #[serde(rename = "string")]
    Text(String),
    Symbol(String),
    Bytes(#[serde(with = "hex_bytes")] Vec<u8>),
    Vec(Vec<ContractArg>),
    Void,
}

impl ContractArg {
    pub fn address(value: impl Into<String>) -> Self {
        ContractArg::Address(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        ContractArg::Text(value.into())
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        ContractArg::Symbol(value.into())
    }

    /// Lower the argument to the ledger's value encoding.
    pub fn to_scval(&self) -> Result<ScVal> {
        let val = match self {
            ContractArg::Address(address) => ScVal::Address(parse_sc_address(address)?),
            ContractArg::I128(v) => ScVal::I128(i128_parts(*v)),
            ContractArg::U128(v) => ScVal::U128(u128_parts(*v)),
            ContractArg::I64(v) => ScVal::I64(*v),
            ContractArg::U64(v) => ScVal::U64(*v),
            ContractArg::I32(v) => ScVal::I32(*v),
            ContractArg::U32(v) => ScVal::U32(*v),
            ContractArg::Bool(v) => ScVal::Bool(*v),
            ContractArg::Text(s) => {
                let inner: StringM = s.as_bytes().to_vec().try_into().map_err(|e| {
                    LedgerError::InvalidArgument(format!("string argument too long: {e}"))
                })?;
                ScVal::String(ScString(inner))
            }
            ContractArg::Symbol(s) => ScVal::Symbol(symbol(s)?),
            ContractArg::Bytes(bytes) => {
                let inner: BytesM = bytes.clone().try_into().map_err(|e| {
                    LedgerError::InvalidArgument(format!("bytes argument too long: {e}"))
                })?;
                ScVal::Bytes(ScBytes(inner))
            }
            ContractArg::Vec(items) => {
                let vals = items
                    .iter()
                    .map(ContractArg::to_scval)
                    .collect::<Result<Vec<_>>>()?;
                let inner: VecM<ScVal> = vals.try_into().map_err(|e| {
                    LedgerError::InvalidArgument(format!("vector argument too long: {e}"))
                })?;
                ScVal::Vec(Some(ScVec(inner)))
            }
            ContractArg::Void => ScVal::Void,
        };
        Ok(val)
    }
}

pub(crate) fn i128_parts(v: i128) -> Int128Parts {
    Int128Parts {
        hi: (v >> 64) as i64,
        lo: v as u64,
    }
}

pub(crate) fn u128_parts(v: u128) -> UInt128Parts {
    UInt128Parts {
        hi: (v >> 64) as u64,
        lo: v as u64,
    }
}

/// Build a symbol, enforcing the `[a-zA-Z0-9_]{0,32}` alphabet.
pub fn symbol(s: &str) -> Result<ScSymbol> {
    if s.len() > 32 {
        return Err(LedgerError::InvalidArgument(format!(
            "symbol '{s}' is longer than 32 characters"
        )));
    }
    if let Some(bad) = s.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(LedgerError::InvalidArgument(format!(
            "symbol '{s}' contains invalid character '{bad}'"
        )));
    }
    let inner: StringM<32> = s
        .as_bytes()
        .to_vec()
        .try_into()
        .map_err(|e| LedgerError::InvalidArgument(format!("invalid symbol '{s}': {e}")))?;
    Ok(ScSymbol(inner))
}

/// Errors that can occur during argument parsing
#[derive(Debug, Error)]
pub enum ArgumentParseError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported type: {0}. Supported types: address, i128, u128, i64, u64, i32, u32, bool, string, symbol, bytes, vec, void")]
    UnsupportedType(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Type/value mismatch: expected {expected} but got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Value out of range for type {type_name}: {value}")]
    OutOfRange { type_name: String, value: String },
}

impl From<serde_json::Error> for ArgumentParseError {
    fn from(err: serde_json::Error) -> Self {
        ArgumentParseError::JsonError(err.to_string())
    }
}

impl From<ArgumentParseError> for LedgerError {
    fn from(err: ArgumentParseError) -> Self {
        LedgerError::InvalidArgument(err.to_string())
    }
}

/// Parser for JSON-described contract arguments
#[derive(Debug, Default, Clone, Copy)]
pub struct ArgumentParser;

impl ArgumentParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON string into positional arguments.
    ///
    /// An empty string or `[]` means "no arguments". A JSON array yields one
    /// argument per element; any other value is a single argument.
    pub fn parse_args_string(&self, json_str: &str) -> std::result::Result<Vec<ContractArg>, ArgumentParseError> {
        if json_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(json_str)?;
        match &value {
            Value::Array(arr) => {
                debug!("Parsing array with {} elements", arr.len());
                arr.iter()
                    .enumerate()
                    .map(|(i, v)| {
                        self.parse_value(v).map_err(|e| {
                            warn!("Failed to parse argument {}: {}", i, e);
                            ArgumentParseError::InvalidArgument(format!("argument {}: {}", i, e))
                        })
                    })
                    .collect()
            }
            _ => self.parse_value(&value).map(|arg| vec![arg]),
        }
    }

    /// Parse one JSON value, honouring type annotations.
    pub fn parse_value(&self, value: &Value) -> std::result::Result<ContractArg, ArgumentParseError> {
        if self.is_typed_annotation(value) {
            return self.parse_typed_value(value);
        }
        self.infer(value)
    }

    /// Check if a JSON value is a type annotation `{"type": "...", "value": ...}`
    fn is_typed_annotation(&self, value: &Value) -> bool {
        match value {
            Value::Object(obj) => {
                obj.get("type").map(Value::is_string).unwrap_or(false)
                    && obj.keys().all(|k| matches!(k.as_str(), "type" | "value" | "element_type"))
            }
            _ => false,
        }
    }

    fn parse_typed_value(&self, value: &Value) -> std::result::Result<ContractArg, ArgumentParseError> {
        let obj = value.as_object().ok_or_else(|| {
            ArgumentParseError::InvalidArgument("Expected object for typed value".to_string())
        })?;
        let type_name = obj["type"].as_str().unwrap_or_default();
        let val = obj.get("value").unwrap_or(&Value::Null);

        match type_name {
            "address" => {
                let s = expect_str(val, "address (strkey string)")?;
                parse_sc_address(s).map_err(|e| ArgumentParseError::InvalidArgument(e.to_string()))?;
                Ok(ContractArg::Address(s.to_string()))
            }
            "i128" => Ok(ContractArg::I128(big_int(val, "i128")?)),
            "u128" => Ok(ContractArg::U128(big_uint(val, "u128")?)),
            "i64" => val
                .as_i64()
                .map(ContractArg::I64)
                .ok_or_else(|| mismatch("i64 (integer)", val)),
            "u64" => val
                .as_u64()
                .map(ContractArg::U64)
                .ok_or_else(|| mismatch("u64 (non-negative integer)", val)),
            "i32" => {
                let n = val.as_i64().ok_or_else(|| mismatch("i32 (integer)", val))?;
                i32::try_from(n)
                    .map(ContractArg::I32)
                    .map_err(|_| out_of_range("i32", val))
            }
            "u32" => {
                let n = val
                    .as_u64()
                    .ok_or_else(|| mismatch("u32 (non-negative integer)", val))?;
                u32::try_from(n)
                    .map(ContractArg::U32)
                    .map_err(|_| out_of_range("u32", val))
            }
            "bool" => val
                .as_bool()
                .map(ContractArg::Bool)
                .ok_or_else(|| mismatch("bool", val)),
            "string" => Ok(ContractArg::Text(expect_str(val, "string")?.to_string())),
            "symbol" => {
                let s = expect_str(val, "symbol (string)")?;
                symbol(s).map_err(|e| ArgumentParseError::InvalidArgument(e.to_string()))?;
                Ok(ContractArg::Symbol(s.to_string()))
            }
            "bytes" => Ok(ContractArg::Bytes(decode_bytes_string(expect_str(
                val,
                "string for bytes",
            )?)?)),
            "vec" => {
                let arr = val
                    .as_array()
                    .ok_or_else(|| mismatch("array for vec", val))?;
                let element_type = obj.get("element_type").and_then(Value::as_str);
                let items = arr
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match element_type {
                        Some(et) => {
                            let typed = serde_json::json!({ "type": et, "value": item });
                            self.parse_typed_value(&typed).map_err(|e| {
                                ArgumentParseError::InvalidArgument(format!(
                                    "Vector element {} does not match element_type '{}': {}",
                                    i, et, e
                                ))
                            })
                        }
                        None => self.parse_value(item),
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(ContractArg::Vec(items))
            }
            "void" => Ok(ContractArg::Void),
            other => Err(ArgumentParseError::UnsupportedType(other.to_string())),
        }
    }

    /// Legacy inference for bare JSON values.
    fn infer(&self, value: &Value) -> std::result::Result<ContractArg, ArgumentParseError> {
        match value {
            Value::Null => Ok(ContractArg::Void),
            Value::Bool(b) => Ok(ContractArg::Bool(*b)),
            Value::Number(num) => {
                if let Some(i) = num.as_i64() {
                    Ok(ContractArg::I128(i as i128))
                } else if let Some(u) = num.as_u64() {
                    Ok(ContractArg::I128(u as i128))
                } else {
                    Err(ArgumentParseError::UnsupportedType(format!(
                        "floating point numbers are not supported: {}",
                        num
                    )))
                }
            }
            Value::String(s) => {
                let looks_like_address = s.starts_with('G') || s.starts_with('C');
                if looks_like_address && parse_sc_address(s).is_ok() {
                    debug!("Inferred address argument");
                    Ok(ContractArg::Address(s.clone()))
                } else {
                    Ok(ContractArg::Text(s.clone()))
                }
            }
            Value::Array(arr) => arr
                .iter()
                .map(|item| self.parse_value(item))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(ContractArg::Vec),
            Value::Object(_) => Err(ArgumentParseError::UnsupportedType(
                "object (annotate it with {\"type\": ..., \"value\": ...})".to_string(),
            )),
        }
    }
}

fn expect_str<'a>(value: &'a Value, expected: &str) -> std::result::Result<&'a str, ArgumentParseError> {
    value.as_str().ok_or_else(|| mismatch(expected, value))
}

fn mismatch(expected: &str, actual: &Value) -> ArgumentParseError {
    ArgumentParseError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn out_of_range(type_name: &str, value: &Value) -> ArgumentParseError {
    ArgumentParseError::OutOfRange {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}

/// 128-bit integers arrive either as JSON numbers or as decimal strings,
/// since JSON numbers stop at 64 bits.
fn big_int(value: &Value, type_name: &str) -> std::result::Result<i128, ArgumentParseError> {
    match value {
        Value::Number(num) => num
            .as_i64()
            .map(i128::from)
            .or_else(|| num.as_u64().map(i128::from))
            .ok_or_else(|| mismatch(type_name, value)),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| mismatch(type_name, value)),
        _ => Err(mismatch(type_name, value)),
    }
}

fn big_uint(value: &Value, type_name: &str) -> std::result::Result<u128, ArgumentParseError> {
    match value {
        Value::Number(num) if num.as_i64().map(|n| n < 0).unwrap_or(false) => {
            Err(out_of_range(type_name, value))
        }
        Value::Number(num) => num
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| mismatch(type_name, value)),
        Value::String(s) => s.trim().parse::<u128>().map_err(|_| mismatch(type_name, value)),
        _ => Err(mismatch(type_name, value)),
    }
}

fn decode_bytes_string(s: &str) -> std::result::Result<Vec<u8>, ArgumentParseError> {
    if let Some(hex_part) = s.strip_prefix("0x") {
        hex::decode(hex_part)
            .map_err(|e| ArgumentParseError::InvalidArgument(format!("Invalid hex string: {}", e)))
    } else if let Some(b64_part) = s.strip_prefix("base64:") {
        use base64::{engine::general_purpose, Engine};
        general_purpose::STANDARD.decode(b64_part).map_err(|e| {
            ArgumentParseError::InvalidArgument(format!("Invalid base64 string: {}", e))
        })
    } else {
        Err(ArgumentParseError::InvalidArgument(
            "Bytes must start with '0x' or 'base64:'".to_string(),
        ))
    }
}

/// `0x`-prefixed hex on the wire, the form [`ArgumentParser`] reads back.
mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        super::decode_bytes_string(&encoded).map_err(D::Error::custom)
    }
}
