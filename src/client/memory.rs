//! In-process wire client.
//!
//! Understands the commands the façade emits and answers them from a local
//! map, with key expiry, HyperLogLog register sketches and a small search
//! engine over hashes. Every command received is recorded, and the client
//! can be switched offline to make calls fail.
//!
//! Search queries support `*`, `@field:value` (exact, case-insensitive,
//! `{value}` for tags) and bare terms matched against TEXT fields, all
//! terms ANDed together.

use crate::client::{reject_error, WireClient};
use crate::command::search::FieldType;
use crate::command::zset::format_score;
use crate::command::Command;
use crate::error::{CacheError, Result};
use crate::resp::RespValue;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::{IteratorRandom, SliceRandom};
use siphasher::sip::SipHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::time::Instant;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// HyperLogLog registers (2^14, 6-bit ranks stored as bytes).
#[derive(Debug, Clone)]
struct Registers(Vec<u8>);

impl Registers {
    const NUM_REGISTERS: usize = 16384;

    fn new() -> Self {
        Registers(vec![0u8; Self::NUM_REGISTERS])
    }

    fn add(&mut self, element: &str) -> bool {
        let mut hasher = SipHasher::new();
        element.hash(&mut hasher);
        let hash = hasher.finish();

        let index = (hash & 0x3FFF) as usize;
        let rank = (hash >> 14).trailing_zeros().min(50) as u8 + 1;

        if self.0[index] < rank {
            self.0[index] = rank;
            true
        } else {
            false
        }
    }

    fn count(&self) -> u64 {
        let m = Self::NUM_REGISTERS as f64;
        let alpha = 0.7213 / (1.0 + 1.079 / m);

        let sum: f64 = self.0.iter().map(|&r| 2.0_f64.powi(-(r as i32))).sum();
        let estimate = alpha * m * m / sum;

        let zeros = self.0.iter().filter(|&&r| r == 0).count();
        if estimate <= 2.5 * m && zeros > 0 {
            (m * (m / zeros as f64).ln()).round() as u64
        } else {
            estimate as u64
        }
    }

    fn merge(&mut self, other: &Registers) {
        for (mine, theirs) in self.0.iter_mut().zip(&other.0) {
            *mine = (*mine).max(*theirs);
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    ZSet(HashMap<String, f64>),
    Hll(Registers),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::ZSet(z) => z.is_empty(),
            Value::Str(_) | Value::Hll(_) => false,
        }
    }

    fn str(&self) -> Option<&String> {
        if let Value::Str(s) = self { Some(s) } else { None }
    }

    fn hash(&self) -> Option<&HashMap<String, String>> {
        if let Value::Hash(h) = self { Some(h) } else { None }
    }

    fn hash_mut(&mut self) -> Option<&mut HashMap<String, String>> {
        if let Value::Hash(h) = self { Some(h) } else { None }
    }

    fn set(&self) -> Option<&HashSet<String>> {
        if let Value::Set(s) = self { Some(s) } else { None }
    }

    fn set_mut(&mut self) -> Option<&mut HashSet<String>> {
        if let Value::Set(s) = self { Some(s) } else { None }
    }

    fn zset(&self) -> Option<&HashMap<String, f64>> {
        if let Value::ZSet(z) = self { Some(z) } else { None }
    }

    fn zset_mut(&mut self) -> Option<&mut HashMap<String, f64>> {
        if let Value::ZSet(z) = self { Some(z) } else { None }
    }

    fn hll(&self) -> Option<&Registers> {
        if let Value::Hll(r) = self { Some(r) } else { None }
    }

    fn hll_mut(&mut self) -> Option<&mut Registers> {
        if let Value::Hll(r) = self { Some(r) } else { None }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

#[derive(Debug, Clone)]
struct IndexSpec {
    prefixes: Vec<String>,
    fields: Vec<(String, FieldType)>,
}

type Reply = std::result::Result<RespValue, String>;

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, Entry>,
    indexes: BTreeMap<String, IndexSpec>,
    history: Vec<Command>,
    offline: bool,
}

fn arg<'a>(args: &'a [String], i: usize) -> std::result::Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| "ERR wrong number of arguments".to_string())
}

fn parse_num<T: std::str::FromStr>(s: &str, what: &str) -> std::result::Result<T, String> {
    s.parse().map_err(|_| format!("ERR {} is not a valid number", what))
}

fn ok() -> Reply {
    Ok(RespValue::SimpleString("OK".to_string()))
}

fn integer(n: usize) -> Reply {
    Ok(RespValue::Integer(n as i64))
}

fn strings<I: IntoIterator<Item = String>>(items: I) -> Reply {
    Ok(RespValue::array(items.into_iter().map(RespValue::bulk).collect()))
}

impl MemoryState {
    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| entry.expires_at.map_or(true, |at| now < at));
    }

    fn read<'a, T>(&'a self, key: &str, pick: fn(&'a Value) -> Option<&'a T>) -> std::result::Result<Option<&'a T>, String> {
        match self.entries.get(key) {
            Some(entry) => pick(&entry.value).map(Some).ok_or_else(|| WRONGTYPE.to_string()),
            None => Ok(None),
        }
    }

    fn write<T>(
        &mut self,
        key: &str,
        make: fn() -> Value,
        pick: fn(&mut Value) -> Option<&mut T>,
    ) -> std::result::Result<&mut T, String> {
        let entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: make(),
            expires_at: None,
        });
        pick(&mut entry.value).ok_or_else(|| WRONGTYPE.to_string())
    }

    fn drop_if_empty(&mut self, key: &str) {
        if self.entries.get(key).is_some_and(|e| e.value.is_empty()) {
            self.entries.remove(key);
        }
    }

    fn execute(&mut self, cmd: &Command) -> Reply {
        self.purge_expired();
        let args = cmd.args.as_slice();
        match cmd.name.to_uppercase().as_str() {
            "PING" => Ok(RespValue::SimpleString("PONG".to_string())),
            "SET" => self.set(args),
            "GET" => Ok(RespValue::BulkString(self.read(arg(args, 0)?, Value::str)?.cloned())),
            "EXISTS" => integer(args.iter().filter(|k| self.entries.contains_key(*k)).count()),
            "DEL" => integer(args.iter().filter(|k| self.entries.remove(*k).is_some()).count()),
            "EXPIRE" => {
                let seconds: u64 = parse_num(arg(args, 1)?, "timeout")?;
                match self.entries.get_mut(arg(args, 0)?) {
                    Some(entry) => {
                        entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
                        integer(1)
                    }
                    None => integer(0),
                }
            }
            "HSET" => self.hset(args),
            "HDEL" => {
                let key = arg(args, 0)?;
                let removed = match self.entries.get_mut(key) {
                    Some(entry) => {
                        let hash = entry.value.hash_mut().ok_or(WRONGTYPE)?;
                        args[1..].iter().filter(|f| hash.remove(*f).is_some()).count()
                    }
                    None => 0,
                };
                self.drop_if_empty(key);
                integer(removed)
            }
            "HINCRBY" => {
                let delta: i64 = parse_num(arg(args, 2)?, "increment")?;
                let hash = self.write(arg(args, 0)?, || Value::Hash(HashMap::new()), Value::hash_mut)?;
                let field = arg(args, 1)?;
                let current: i64 = match hash.get(field) {
                    Some(v) => v.parse().map_err(|_| "ERR hash value is not an integer".to_string())?,
                    None => 0,
                };
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| "ERR increment or decrement would overflow".to_string())?;
                hash.insert(field.to_string(), next.to_string());
                Ok(RespValue::Integer(next))
            }
            "HGETALL" => {
                let flat = self
                    .read(arg(args, 0)?, Value::hash)?
                    .map(|h| h.iter().flat_map(|(f, v)| [f.clone(), v.clone()]).collect::<Vec<_>>())
                    .unwrap_or_default();
                strings(flat)
            }
            "HGET" => {
                let hash = self.read(arg(args, 0)?, Value::hash)?;
                let field = arg(args, 1)?;
                Ok(RespValue::BulkString(hash.and_then(|h| h.get(field).cloned())))
            }
            "HMGET" => {
                let hash = self.read(arg(args, 0)?, Value::hash)?;
                let values = args[1..]
                    .iter()
                    .map(|f| RespValue::BulkString(hash.and_then(|h| h.get(f).cloned())))
                    .collect();
                Ok(RespValue::array(values))
            }
            "SADD" => {
                let set = self.write(arg(args, 0)?, || Value::Set(HashSet::new()), Value::set_mut)?;
                integer(args[1..].iter().filter(|m| set.insert(m.to_string())).count())
            }
            "SREM" => {
                let key = arg(args, 0)?;
                let removed = match self.entries.get_mut(key) {
                    Some(entry) => {
                        let set = entry.value.set_mut().ok_or(WRONGTYPE)?;
                        args[1..].iter().filter(|m| set.remove(*m)).count()
                    }
                    None => 0,
                };
                self.drop_if_empty(key);
                integer(removed)
            }
            "SMEMBERS" => {
                let members = self.read(arg(args, 0)?, Value::set)?.cloned().unwrap_or_default();
                strings(members)
            }
            "ZADD" => self.zadd(args),
            "ZRANGE" => self.zrange(args),
            "ZINCRBY" => {
                let delta: f64 = parse_num(arg(args, 1)?, "increment")?;
                let member = arg(args, 2)?.to_string();
                let zset = self.write(arg(args, 0)?, || Value::ZSet(HashMap::new()), Value::zset_mut)?;
                let score = zset.entry(member).or_insert(0.0);
                *score += delta;
                Ok(RespValue::bulk(format_score(*score)))
            }
            "ZREM" => {
                let key = arg(args, 0)?;
                let removed = match self.entries.get_mut(key) {
                    Some(entry) => {
                        let zset = entry.value.zset_mut().ok_or(WRONGTYPE)?;
                        args[1..].iter().filter(|m| zset.remove(*m).is_some()).count()
                    }
                    None => 0,
                };
                self.drop_if_empty(key);
                integer(removed)
            }
            "ZRANDMEMBER" => {
                let count: i64 = parse_num(arg(args, 1)?, "count")?;
                let members: Vec<String> = self
                    .read(arg(args, 0)?, Value::zset)?
                    .map(|z| z.keys().cloned().collect())
                    .unwrap_or_default();
                let mut rng = rand::thread_rng();
                let picked: Vec<String> = if count >= 0 {
                    members.into_iter().choose_multiple(&mut rng, count as usize)
                } else if members.is_empty() {
                    Vec::new()
                } else {
                    (0..count.unsigned_abs())
                        .filter_map(|_| members.choose(&mut rng).cloned())
                        .collect()
                };
                strings(picked)
            }
            "PFADD" => {
                let key = arg(args, 0)?;
                let created = !self.entries.contains_key(key);
                let registers = self.write(key, || Value::Hll(Registers::new()), Value::hll_mut)?;
                let mut changed = created;
                for item in &args[1..] {
                    changed |= registers.add(item);
                }
                integer(changed as usize)
            }
            "PFCOUNT" => {
                let mut merged = Registers::new();
                for key in args {
                    if let Some(registers) = self.read(key, Value::hll)? {
                        merged.merge(registers);
                    }
                }
                Ok(RespValue::Integer(merged.count() as i64))
            }
            "PFMERGE" => {
                let dest = arg(args, 0)?;
                let mut merged = Registers::new();
                for key in args {
                    if let Some(registers) = self.read(key, Value::hll)? {
                        merged.merge(registers);
                    }
                }
                let target = self.write(dest, || Value::Hll(Registers::new()), Value::hll_mut)?;
                *target = merged;
                ok()
            }
            "FT._LIST" => strings(self.indexes.keys().cloned()),
            "FT.DROPINDEX" => match self.indexes.remove(arg(args, 0)?) {
                Some(_) => ok(),
                None => Err("Unknown Index name".to_string()),
            },
            "FT.CREATE" => self.ft_create(args),
            "FT.SEARCH" => self.ft_search(args),
            other => Err(format!("ERR unknown command '{}'", other)),
        }
    }

    fn set(&mut self, args: &[String]) -> Reply {
        let key = arg(args, 0)?;
        let value = arg(args, 1)?;
        let expires_at = match args.get(2).map(|s| s.to_uppercase()) {
            Some(flag) if flag == "EX" => {
                let seconds: u64 = parse_num(arg(args, 3)?, "expire time")?;
                if seconds == 0 {
                    return Err("ERR invalid expire time in 'set' command".to_string());
                }
                Some(Instant::now() + Duration::from_secs(seconds))
            }
            Some(_) => return Err("ERR syntax error".to_string()),
            None => None,
        };
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        ok()
    }

    fn hset(&mut self, args: &[String]) -> Reply {
        let pairs = args.get(1..).unwrap_or_default();
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err("ERR wrong number of arguments for 'hset' command".to_string());
        }
        let hash = self.write(arg(args, 0)?, || Value::Hash(HashMap::new()), Value::hash_mut)?;
        let created = pairs
            .chunks(2)
            .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
            .count();
        integer(created)
    }

    fn zadd(&mut self, args: &[String]) -> Reply {
        let key = arg(args, 0)?;
        let mut rest = &args[1..];
        let only_new = rest.first().is_some_and(|a| a.eq_ignore_ascii_case("NX"));
        if only_new {
            rest = &rest[1..];
        }
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err("ERR syntax error".to_string());
        }
        let pairs = rest
            .chunks(2)
            .map(|pair| Ok((parse_num::<f64>(&pair[0], "score")?, pair[1].clone())))
            .collect::<std::result::Result<Vec<_>, String>>()?;

        let zset = self.write(key, || Value::ZSet(HashMap::new()), Value::zset_mut)?;
        let mut added = 0;
        for (score, member) in pairs {
            match zset.get_mut(&member) {
                Some(_) if only_new => {}
                Some(existing) => *existing = score,
                None => {
                    zset.insert(member, score);
                    added += 1;
                }
            }
        }
        integer(added)
    }

    fn zrange(&mut self, args: &[String]) -> Reply {
        let start: i64 = parse_num(arg(args, 1)?, "start")?;
        let stop: i64 = parse_num(arg(args, 2)?, "stop")?;
        let mut reverse = false;
        let mut with_scores = false;
        for flag in &args[3..] {
            match flag.to_uppercase().as_str() {
                "REV" => reverse = true,
                "WITHSCORES" => with_scores = true,
                _ => return Err("ERR syntax error".to_string()),
            }
        }

        let mut ranked: Vec<(String, f64)> = self
            .read(arg(args, 0)?, Value::zset)?
            .map(|z| z.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        if reverse {
            ranked.reverse();
        }

        let len = ranked.len() as i64;
        let from = if start < 0 { (len + start).max(0) } else { start };
        let to = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if from > to || from >= len {
            return strings(Vec::new());
        }

        let mut out = Vec::new();
        for (member, score) in ranked.into_iter().skip(from as usize).take((to - from + 1) as usize) {
            out.push(member);
            if with_scores {
                out.push(format_score(score));
            }
        }
        strings(out)
    }

    fn ft_create(&mut self, args: &[String]) -> Reply {
        let index = arg(args, 0)?.to_string();
        if self.indexes.contains_key(&index) {
            return Err("Index already exists".to_string());
        }

        let mut prefixes = Vec::new();
        let mut fields = Vec::new();
        let mut i = 1;
        while i < args.len() {
            match args[i].to_uppercase().as_str() {
                "ON" => {
                    if !arg(args, i + 1)?.eq_ignore_ascii_case("HASH") {
                        return Err("Only HASH indexes are supported".to_string());
                    }
                    i += 2;
                }
                "PREFIX" => {
                    let n: usize = parse_num(arg(args, i + 1)?, "prefix count")?;
                    for j in 0..n {
                        prefixes.push(arg(args, i + 2 + j)?.to_string());
                    }
                    i += 2 + n;
                }
                "SCHEMA" => {
                    i += 1;
                    while i < args.len() {
                        let name = args[i].clone();
                        let store = match arg(args, i + 1)?.to_uppercase().as_str() {
                            "TEXT" => FieldType::Text,
                            "TAG" => FieldType::Tag,
                            "NUMERIC" => FieldType::Numeric,
                            "GEO" => FieldType::Geo,
                            other => return Err(format!("Invalid field type for field `{}`: {}", name, other)),
                        };
                        i += 2;
                        if args.get(i).is_some_and(|a| a.eq_ignore_ascii_case("SORTABLE")) {
                            i += 1;
                        }
                        fields.push((name, store));
                    }
                }
                other => return Err(format!("Unknown argument `{}`", other)),
            }
        }

        if prefixes.is_empty() {
            prefixes.push(String::new());
        }
        self.indexes.insert(index, IndexSpec { prefixes, fields });
        ok()
    }

    fn ft_search(&self, args: &[String]) -> Reply {
        let spec = self
            .indexes
            .get(arg(args, 0)?)
            .ok_or_else(|| "Unknown Index name".to_string())?;
        let query = arg(args, 1)?;

        let mut offset = 0usize;
        let mut limit = 10usize;
        let mut returned: Option<Vec<String>> = None;
        let mut i = 2;
        while i < args.len() {
            match args[i].to_uppercase().as_str() {
                "LIMIT" => {
                    offset = parse_num(arg(args, i + 1)?, "offset")?;
                    limit = parse_num(arg(args, i + 2)?, "limit")?;
                    i += 3;
                }
                "RETURN" => {
                    let n: usize = parse_num(arg(args, i + 1)?, "return count")?;
                    let fields = (0..n)
                        .map(|j| arg(args, i + 2 + j).map(str::to_string))
                        .collect::<std::result::Result<Vec<_>, String>>()?;
                    returned = Some(fields);
                    i += 2 + n;
                }
                other => return Err(format!("Unknown argument `{}`", other)),
            }
        }

        let mut matched: Vec<(&String, &HashMap<String, String>)> = self
            .entries
            .iter()
            .filter(|(key, _)| spec.prefixes.iter().any(|p| key.starts_with(p.as_str())))
            .filter_map(|(key, entry)| entry.value.hash().map(|h| (key, h)))
            .filter(|(_, hash)| matches_query(spec, hash, query))
            .collect();
        matched.sort_by(|a, b| a.0.cmp(b.0));

        let mut reply = vec![RespValue::Integer(matched.len() as i64)];
        for (key, hash) in matched.into_iter().skip(offset).take(limit) {
            let flat: Vec<String> = match &returned {
                Some(fields) => fields
                    .iter()
                    .filter_map(|f| hash.get(f).map(|v| [f.clone(), v.clone()]))
                    .flatten()
                    .collect(),
                None => hash.iter().flat_map(|(f, v)| [f.clone(), v.clone()]).collect(),
            };
            reply.push(RespValue::bulk(key.clone()));
            reply.push(RespValue::array(flat.into_iter().map(RespValue::bulk).collect()));
        }
        Ok(RespValue::array(reply))
    }
}

fn matches_query(spec: &IndexSpec, hash: &HashMap<String, String>, query: &str) -> bool {
    let query = query.trim();
    if query == "*" || query.is_empty() {
        return true;
    }
    query.split_whitespace().all(|term| match term.strip_prefix('@') {
        Some(clause) => {
            let Some((field, wanted)) = clause.split_once(':') else {
                return false;
            };
            let wanted = wanted.trim_start_matches('{').trim_end_matches('}');
            hash.get(field).is_some_and(|v| v.eq_ignore_ascii_case(wanted))
        }
        None => {
            let term = term.to_lowercase();
            spec.fields
                .iter()
                .filter(|(_, store)| *store == FieldType::Text)
                .filter_map(|(name, _)| hash.get(name))
                .any(|v| v.to_lowercase().split_whitespace().any(|word| word == term))
        }
    })
}

/// Wire client backed by an in-process store.
#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<MemoryState>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`CacheError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Commands received so far, oldest first.
    pub fn history(&self) -> Vec<Command> {
        self.state.lock().history.clone()
    }

    pub fn last_command(&self) -> Option<Command> {
        self.state.lock().history.last().cloned()
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }
}

#[async_trait]
impl WireClient for MemoryClient {
    async fn call(&self, command: &Command) -> Result<RespValue> {
        let mut state = self.state.lock();
        state.history.push(command.clone());
        if state.offline {
            return Err(CacheError::Offline);
        }
        match state.execute(command) {
            Ok(reply) => reject_error(reply),
            Err(msg) => Err(CacheError::Server(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{hash, hyperloglog, key, search, zset};

    fn run(client: &MemoryClient, cmd: Command) -> Result<RespValue> {
        block_on(client.call(&cmd))
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn test_string_and_expiry_flags() {
        let client = MemoryClient::new();
        run(&client, key::set("a", "1", None)).unwrap();
        assert_eq!(run(&client, key::get("a")).unwrap(), RespValue::bulk("1"));
        assert_eq!(run(&client, key::get("b")).unwrap(), RespValue::null());
        assert!(run(&client, Command::new("SET").args(["a", "1", "PX", "5"])).is_err());
    }

    #[test]
    fn test_wrong_type() {
        let client = MemoryClient::new();
        run(&client, key::set("a", "1", None)).unwrap();
        let err = run(&client, hash::hget("a", "f")).unwrap_err();
        assert_eq!(err, CacheError::Server(WRONGTYPE.to_string()));
    }

    #[test]
    fn test_zrange_bounds() {
        let client = MemoryClient::new();
        let members: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, m)| zset::ScoredMember::new(*m, i as f64))
            .collect();
        run(&client, zset::zadd("z", &members, false)).unwrap();
        let reply = run(&client, zset::zrange("z", 1, 100, zset::SortOrder::LowToHigh, false)).unwrap();
        assert_eq!(reply, RespValue::array(["b", "c", "d"].map(RespValue::bulk).to_vec()));
        let reply = run(&client, zset::zrange("z", 0, -3, zset::SortOrder::HighToLow, false)).unwrap();
        assert_eq!(reply, RespValue::array(["d", "c"].map(RespValue::bulk).to_vec()));
        let reply = run(&client, zset::zrange("z", 5, 9, zset::SortOrder::LowToHigh, false)).unwrap();
        assert_eq!(reply, RespValue::array(vec![]));
    }

    #[test]
    fn test_hll_estimate_and_merge() {
        let client = MemoryClient::new();
        let first: Vec<String> = (0..1000).map(|i| format!("visitor-{}", i)).collect();
        let second: Vec<String> = (500..1500).map(|i| format!("visitor-{}", i)).collect();
        run(&client, hyperloglog::pfadd("day1", &first)).unwrap();
        run(&client, hyperloglog::pfadd("day2", &second)).unwrap();
        run(&client, hyperloglog::pfmerge("both", &["day1".to_string(), "day2".to_string()])).unwrap();

        let RespValue::Integer(n) = run(&client, hyperloglog::pfcount("both")).unwrap() else {
            panic!("expected integer");
        };
        assert!((1450..=1550).contains(&n), "estimate {} out of range", n);
    }

    #[test]
    fn test_search_query_forms() {
        let client = MemoryClient::new();
        let schema = vec![
            search::SchemaField::new("name", FieldType::Text),
            search::SchemaField::new("role", FieldType::Tag),
        ];
        run(&client, search::ft_create("idx", "u:", &schema)).unwrap();
        run(&client, hash::hset("u:1", [("name", "Jo Smith"), ("role", "admin")])).unwrap();
        run(&client, hash::hset("u:2", [("name", "Al Smith"), ("role", "staff")])).unwrap();
        run(&client, hash::hset("other:3", [("name", "Jo"), ("role", "admin")])).unwrap();

        let count = |query: &str| match run(&client, search::ft_search("idx", query, 0, 10, None)).unwrap() {
            RespValue::Array(Some(items)) => items[0].clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(count("*"), RespValue::Integer(2));
        assert_eq!(count("smith"), RespValue::Integer(2));
        assert_eq!(count("@role:{admin}"), RespValue::Integer(1));
        assert_eq!(count("smith @role:staff"), RespValue::Integer(1));
        assert_eq!(count("nobody"), RespValue::Integer(0));

        assert!(run(&client, search::ft_create("idx", "u:", &schema)).is_err());
        assert!(run(&client, search::ft_dropindex("missing")).is_err());
    }

    #[test]
    fn test_offline_and_history() {
        let client = MemoryClient::new();
        client.set_offline(true);
        assert_eq!(run(&client, key::get("a")).unwrap_err(), CacheError::Offline);
        client.set_offline(false);
        run(&client, key::get("a")).unwrap();
        assert_eq!(client.history().len(), 2);
        assert_eq!(client.last_command(), Some(key::get("a")));
    }
}
