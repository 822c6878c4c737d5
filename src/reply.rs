//! Reply decoders.
//!
//! The store answers with flat, positional arrays. Everything that turns
//! such an array back into structure goes through [`zip_fields`] or
//! [`pair_up`], so the even/odd convention lives in one place.

use crate::command::zset::ScoredMember;
use crate::error::{CacheError, Result};
use crate::resp::RespValue;
use std::collections::HashMap;

/// A document matched by a search query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchDoc {
    /// Key of the matched hash.
    pub key: String,
    pub fields: HashMap<String, String>,
}

/// Zip an ordered request list with the positionally aligned reply.
///
/// A reply shorter than the request yields `None` for the missing tail.
pub fn zip_fields<T>(fields: &[String], values: Vec<Option<T>>) -> Vec<(String, Option<T>)> {
    let mut values = values.into_iter();
    fields
        .iter()
        .map(|field| (field.clone(), values.next().flatten()))
        .collect()
}

/// Split `[k1, v1, k2, v2, ...]` into `[(k1, v1), (k2, v2), ...]`.
pub fn pair_up<T>(command: &str, flat: Vec<T>) -> Result<Vec<(T, T)>> {
    if flat.len() % 2 != 0 {
        return Err(CacheError::UnexpectedReply {
            command: command.to_string(),
            reply: format!("odd number of elements ({})", flat.len()),
        });
    }
    let mut pairs = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(even), Some(odd)) = (iter.next(), iter.next()) {
        pairs.push((even, odd));
    }
    Ok(pairs)
}

pub fn expect_ok(command: &str, reply: RespValue) -> Result<()> {
    match reply {
        RespValue::SimpleString(s) if s.eq_ignore_ascii_case("OK") => Ok(()),
        other => Err(CacheError::unexpected(command, other)),
    }
}

pub fn into_integer(command: &str, reply: RespValue) -> Result<i64> {
    match reply {
        RespValue::Integer(i) => Ok(i),
        RespValue::BulkString(Some(ref s)) | RespValue::SimpleString(ref s) => {
            s.parse().map_err(|_| CacheError::unexpected(command, &reply))
        }
        other => Err(CacheError::unexpected(command, other)),
    }
}

pub fn into_float(command: &str, reply: RespValue) -> Result<f64> {
    match reply {
        RespValue::Integer(i) => Ok(i as f64),
        RespValue::BulkString(Some(ref s)) | RespValue::SimpleString(ref s) => {
            s.parse().map_err(|_| CacheError::unexpected(command, &reply))
        }
        other => Err(CacheError::unexpected(command, other)),
    }
}

pub fn into_optional_string(command: &str, reply: RespValue) -> Result<Option<String>> {
    match reply {
        RespValue::BulkString(value) => Ok(value),
        RespValue::SimpleString(s) => Ok(Some(s)),
        RespValue::Integer(i) => Ok(Some(i.to_string())),
        RespValue::Array(None) => Ok(None),
        other => Err(CacheError::unexpected(command, other)),
    }
}

pub fn into_string(command: &str, reply: RespValue) -> Result<String> {
    into_optional_string(command, reply)?.ok_or_else(|| CacheError::unexpected(command, "null"))
}

/// A null array decodes as empty.
pub fn into_array(command: &str, reply: RespValue) -> Result<Vec<RespValue>> {
    match reply {
        RespValue::Array(Some(items)) => Ok(items),
        RespValue::Array(None) | RespValue::BulkString(None) => Ok(Vec::new()),
        other => Err(CacheError::unexpected(command, other)),
    }
}

pub fn into_optional_strings(command: &str, reply: RespValue) -> Result<Vec<Option<String>>> {
    into_array(command, reply)?
        .into_iter()
        .map(|item| into_optional_string(command, item))
        .collect()
}

pub fn into_strings(command: &str, reply: RespValue) -> Result<Vec<String>> {
    into_array(command, reply)?
        .into_iter()
        .map(|item| into_string(command, item))
        .collect()
}

/// Decode an interleaved `[field, value, ...]` reply into a map.
pub fn into_field_map(command: &str, reply: RespValue) -> Result<HashMap<String, String>> {
    let flat = into_strings(command, reply)?;
    Ok(pair_up(command, flat)?.into_iter().collect())
}

/// Decode `[member, score, ...]` into scored members, keeping rank order.
pub fn into_scored(command: &str, reply: RespValue) -> Result<Vec<ScoredMember>> {
    let flat = into_strings(command, reply)?;
    pair_up(command, flat)?
        .into_iter()
        .map(|(member, score)| {
            let score = score
                .parse::<f64>()
                .map_err(|_| CacheError::unexpected(command, &score))?;
            Ok(ScoredMember { member, score })
        })
        .collect()
}

/// Decode `[total, key, [field, value, ...], key, [...], ...]`.
///
/// `strip` is removed from the front of every matched key. A key outside
/// that namespace is an unexpected reply.
pub fn into_search_page(command: &str, reply: RespValue, strip: &str) -> Result<(u64, Vec<SearchDoc>)> {
    let mut items = into_array(command, reply)?.into_iter();
    let count = match items.next() {
        Some(total) => into_integer(command, total)?,
        None => return Err(CacheError::unexpected(command, "empty reply")),
    };
    let count = u64::try_from(count).map_err(|_| CacheError::unexpected(command, count))?;

    let mut docs = Vec::new();
    for (key, fields) in pair_up(command, items.collect())? {
        let key = into_string(command, key)?;
        let key = match key.strip_prefix(strip) {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => return Err(CacheError::unexpected(command, &key)),
        };
        let fields = into_field_map(command, fields)?;
        docs.push(SearchDoc { key, fields });
    }
    Ok((count, docs))
}
