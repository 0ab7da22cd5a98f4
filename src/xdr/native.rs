//! Conversion of contract return values into plain JSON.

use super::{remote_limits, sc_address_to_string};
use serde_json::{json, Map, Number, Value};
use stellar_xdr::curr::{
    Int256Parts, ReadXdr, ScError, ScMapEntry, ScVal, TransactionMeta, UInt256Parts,
};

/// Pull the contract return value out of a confirmed transaction.
///
/// Newer RPC servers report it directly as `returnValue`; older ones only
/// ship the transaction meta, where it lives in the Soroban section.
/// `Ok(None)` means the transaction carries no return value at all.
pub fn decode_return_value(
    return_value: Option<&str>,
    result_meta_xdr: Option<&str>,
) -> Result<Option<ScVal>, String> {
    if let Some(encoded) = return_value {
        return ScVal::from_xdr_base64(encoded, remote_limits())
            .map(Some)
            .map_err(|e| format!("returnValue is not a valid ScVal: {e}"));
    }

    let Some(encoded) = result_meta_xdr else {
        return Ok(None);
    };
    let meta = TransactionMeta::from_xdr_base64(encoded, remote_limits())
        .map_err(|e| format!("resultMetaXdr is not a valid TransactionMeta: {e}"))?;
    match meta {
        TransactionMeta::V3(v3) => Ok(v3.soroban_meta.map(|soroban| soroban.return_value)),
        _ => Ok(None),
    }
}

/// Deepest vec/map nesting [`scval_to_native`] will walk.
pub const MAX_VALUE_DEPTH: usize = 128;

/// Convert an `ScVal` into the closest JSON value.
///
/// 128-bit integers become JSON numbers when they fit in 64 bits and decimal
/// strings otherwise; 256-bit integers become `0x`-prefixed hex strings.
pub fn scval_to_native(val: &ScVal) -> Result<Value, String> {
    to_native(val, 0)
}

fn to_native(val: &ScVal, depth: usize) -> Result<Value, String> {
    if depth > MAX_VALUE_DEPTH {
        return Err(format!("value is nested deeper than {MAX_VALUE_DEPTH} levels"));
    }
    let native = match val {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::Void => Value::Null,
        ScVal::U32(n) => json!(n),
        ScVal::I32(n) => json!(n),
        ScVal::U64(n) => json!(n),
        ScVal::I64(n) => json!(n),
        ScVal::Timepoint(t) => json!(t.0),
        ScVal::Duration(d) => json!(d.0),
        ScVal::U128(parts) => {
            let n = ((parts.hi as u128) << 64) | parts.lo as u128;
            match u64::try_from(n) {
                Ok(small) => Value::Number(Number::from(small)),
                Err(_) => Value::String(n.to_string()),
            }
        }
        ScVal::I128(parts) => {
            let n = ((parts.hi as i128) << 64) | parts.lo as i128;
            match i64::try_from(n) {
                Ok(small) => Value::Number(Number::from(small)),
                Err(_) => Value::String(n.to_string()),
            }
        }
        ScVal::U256(UInt256Parts {
            hi_hi,
            hi_lo,
            lo_hi,
            lo_lo,
        }) => Value::String(hex_words(*hi_hi, *hi_lo, *lo_hi, *lo_lo)),
        ScVal::I256(Int256Parts {
            hi_hi,
            hi_lo,
            lo_hi,
            lo_lo,
        }) => Value::String(hex_words(*hi_hi as u64, *hi_lo, *lo_hi, *lo_lo)),
        ScVal::Bytes(bytes) => Value::String(hex::encode(bytes.0.as_slice())),
        ScVal::String(s) => Value::String(utf8(s.0.as_slice(), "string")?),
        ScVal::Symbol(s) => Value::String(utf8(s.0.as_slice(), "symbol")?),
        ScVal::Address(address) => Value::String(sc_address_to_string(address)),
        ScVal::Vec(None) => Value::Array(Vec::new()),
        ScVal::Vec(Some(items)) => Value::Array(
            items
                .0
                .iter()
                .map(|item| to_native(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        ScVal::Map(None) => Value::Object(Map::new()),
        ScVal::Map(Some(entries)) => map_to_native(entries.0.as_slice(), depth + 1)?,
        ScVal::Error(ScError::Contract(code)) => json!({ "error": { "contract": code } }),
        ScVal::Error(other) => json!({ "error": format!("{other:?}") }),
        other => return Err(format!("unsupported value type {}", other.name())),
    };
    Ok(native)
}

/// Maps keyed by strings or symbols become objects (the shape of a contract
/// struct); anything else becomes a list of `[key, value]` pairs.
fn map_to_native(entries: &[ScMapEntry], depth: usize) -> Result<Value, String> {
    let string_keyed = entries
        .iter()
        .all(|entry| matches!(entry.key, ScVal::Symbol(_) | ScVal::String(_)));

    if string_keyed {
        let mut object = Map::new();
        for entry in entries {
            let Value::String(key) = to_native(&entry.key, depth)? else {
                return Err("map key did not decode to a string".to_string());
            };
            object.insert(key, to_native(&entry.val, depth)?);
        }
        Ok(Value::Object(object))
    } else {
        entries
            .iter()
            .map(|entry| Ok(json!([to_native(&entry.key, depth)?, to_native(&entry.val, depth)?])))
            .collect::<Result<Vec<_>, String>>()
            .map(Value::Array)
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| format!("{what} is not valid UTF-8: {e}"))
}

fn hex_words(a: u64, b: u64, c: u64, d: u64) -> String {
    format!("0x{a:016x}{b:016x}{c:016x}{d:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdr::args::{i128_parts, u128_parts};
    use crate::xdr::ContractArg;
    use stellar_xdr::curr::{
        ExtensionPoint, LedgerEntryChanges, Limits, ScMap, ScString, ScSymbol, ScVec,
        SorobanTransactionMeta, SorobanTransactionMetaExt, StringM, TransactionMetaV3, VecM,
        WriteXdr,
    };

    fn nested(levels: usize) -> ScVal {
        let mut val = ScVal::U32(1);
        for _ in 0..levels {
            val = ScVal::Vec(Some(ScVec(vec![val].try_into().unwrap())));
        }
        val
    }

    fn sym(s: &str) -> ScVal {
        ScVal::Symbol(ScSymbol(StringM::try_from(s.as_bytes().to_vec()).unwrap()))
    }

    #[test]
    fn test_primitives() {
        assert_eq!(scval_to_native(&ScVal::Bool(true)).unwrap(), json!(true));
        assert_eq!(scval_to_native(&ScVal::Void).unwrap(), Value::Null);
        assert_eq!(scval_to_native(&ScVal::U32(7)).unwrap(), json!(7));
        assert_eq!(scval_to_native(&sym("hello")).unwrap(), json!("hello"));
    }

    #[test]
    fn test_i128_small_and_large() {
        let small = ScVal::I128(i128_parts(-42));
        assert_eq!(scval_to_native(&small).unwrap(), json!(-42));

        let large = ScVal::I128(i128_parts(i128::MAX));
        assert_eq!(
            scval_to_native(&large).unwrap(),
            json!("170141183460469231731687303715884105727")
        );

        let unsigned = ScVal::U128(u128_parts(u64::MAX as u128 + 1));
        assert_eq!(scval_to_native(&unsigned).unwrap(), json!("18446744073709551616"));
    }

    #[test]
    fn test_struct_like_map() {
        let entries = vec![
            ScMapEntry {
                key: sym("name"),
                val: ContractArg::text("alice").to_scval().unwrap(),
            },
            ScMapEntry {
                key: sym("score"),
                val: ScVal::U32(90),
            },
        ];
        let map = ScVal::Map(Some(ScMap(entries.try_into().unwrap())));
        assert_eq!(
            scval_to_native(&map).unwrap(),
            json!({"name": "alice", "score": 90})
        );
    }

    #[test]
    fn test_integer_keyed_map_becomes_pairs() {
        let entries = vec![ScMapEntry {
            key: ScVal::U32(1),
            val: ScVal::Bool(false),
        }];
        let map = ScVal::Map(Some(ScMap(entries.try_into().unwrap())));
        assert_eq!(scval_to_native(&map).unwrap(), json!([[1, false]]));
    }

    #[test]
    fn test_invalid_utf8_is_a_decode_error() {
        let bad = ScVal::String(ScString(StringM::try_from(vec![0xff, 0xfe]).unwrap()));
        assert!(scval_to_native(&bad).is_err());
    }

    #[test]
    fn test_contract_error() {
        let val = ScVal::Error(ScError::Contract(3));
        assert_eq!(scval_to_native(&val).unwrap(), json!({"error": {"contract": 3}}));
    }

    #[test]
    fn test_decode_return_value_prefers_direct_field() {
        let encoded = ScVal::U32(5).to_xdr_base64(Limits::none()).unwrap();
        let decoded = decode_return_value(Some(&encoded), Some("garbage")).unwrap();
        assert_eq!(decoded, Some(ScVal::U32(5)));
    }

    #[test]
    fn test_decode_return_value_from_meta() {
        let meta = TransactionMeta::V3(TransactionMetaV3 {
            ext: ExtensionPoint::V0,
            tx_changes_before: LedgerEntryChanges(VecM::default()),
            operations: VecM::default(),
            tx_changes_after: LedgerEntryChanges(VecM::default()),
            soroban_meta: Some(SorobanTransactionMeta {
                ext: SorobanTransactionMetaExt::V0,
                events: VecM::default(),
                return_value: sym("done"),
                diagnostic_events: VecM::default(),
            }),
        });
        let encoded = meta.to_xdr_base64(Limits::none()).unwrap();
        let decoded = decode_return_value(None, Some(&encoded)).unwrap();
        assert_eq!(decoded, Some(sym("done")));
    }

    #[test]
    fn test_decode_return_value_absent() {
        assert_eq!(decode_return_value(None, None).unwrap(), None);
        assert!(decode_return_value(Some("not base64 xdr"), None).is_err());
    }

    #[test]
    fn test_nesting_ceiling() {
        assert!(scval_to_native(&nested(MAX_VALUE_DEPTH)).is_ok());
        let err = scval_to_native(&nested(MAX_VALUE_DEPTH + 1)).unwrap_err();
        assert!(err.contains("nested deeper"));
    }

    #[test]
    fn test_deep_remote_value_is_rejected() {
        let encoded = nested(600).to_xdr_base64(Limits::none()).unwrap();
        assert!(decode_return_value(Some(&encoded), None).is_err());
    }
}
