//! RESP encoding and decoding.
//!
//! Requests go out as arrays of bulk strings; replies are parsed
//! incrementally from a byte buffer so a partial read simply yields `None`.

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<String>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn bulk(s: impl Into<String>) -> Self {
        RespValue::BulkString(Some(s.into()))
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    pub fn null() -> Self {
        RespValue::BulkString(None)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }

    pub fn serialize(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::Integer(i) => format!(":{}\r\n", i),
            RespValue::BulkString(val) => match val {
                Some(s) => format!("${}\r\n{}\r\n", s.len(), s),
                None => "$-1\r\n".to_string(),
            },
            RespValue::Array(val) => match val {
                Some(arr) => {
                    let mut res = format!("*{}\r\n", arr.len());
                    for v in arr {
                        res.push_str(&v.serialize());
                    }
                    res
                }
                None => "*-1\r\n".to_string(),
            },
        }
    }

    /// Encode a command name and its arguments as a RESP request.
    pub fn encode_request(name: &str, args: &[String]) -> String {
        let mut out = format!("*{}\r\n${}\r\n{}\r\n", args.len() + 1, name.len(), name);
        for arg in args {
            out.push_str(&format!("${}\r\n{}\r\n", arg.len(), arg));
        }
        out
    }
}

/// Largest bulk string accepted from the store (512 MiB, the store's own cap).
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

fn utf8(bytes: &[u8]) -> Result<String, String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| format!("reply is not valid UTF-8: {}", e))
}

// Returns the line before the first CRLF and the bytes consumed including it.
fn read_line(buffer: &[u8]) -> Result<Option<(String, usize)>, String> {
    match buffer.windows(2).position(|w| w == b"\r\n") {
        Some(pos) => Ok(Some((utf8(&buffer[..pos])?, pos + 2))),
        None => Ok(None),
    }
}

fn parse_int(buffer: &[u8]) -> Result<Option<(i64, usize)>, String> {
    match read_line(buffer)? {
        Some((line, len)) => line
            .parse::<i64>()
            .map(|val| Some((val, len)))
            .map_err(|e| format!("invalid integer '{}': {}", line, e)),
        None => Ok(None),
    }
}

/// Parse one reply from the front of `buffer`.
///
/// Returns the value and the number of bytes it occupied, `Ok(None)` when
/// more data is needed, or an error for malformed input.
pub fn parse(buffer: &[u8]) -> Result<Option<(RespValue, usize)>, String> {
    if buffer.is_empty() {
        return Ok(None);
    }

    match buffer[0] {
        b'+' => Ok(read_line(&buffer[1..])?.map(|(line, len)| (RespValue::SimpleString(line), len + 1))),
        b'-' => Ok(read_line(&buffer[1..])?.map(|(line, len)| (RespValue::Error(line), len + 1))),
        b':' => Ok(parse_int(&buffer[1..])?.map(|(val, len)| (RespValue::Integer(val), len + 1))),
        b'$' => {
            let Some((len_val, len_bytes)) = parse_int(&buffer[1..])? else {
                return Ok(None);
            };
            let start = 1 + len_bytes;
            if len_val < 0 {
                return Ok(Some((RespValue::BulkString(None), start)));
            }
            if len_val > MAX_BULK_LEN {
                return Err(format!("bulk length {} exceeds {}", len_val, MAX_BULK_LEN));
            }
            let str_len = len_val as usize;
            if buffer.len() < start + str_len + 2 {
                return Ok(None);
            }
            if &buffer[start + str_len..start + str_len + 2] != b"\r\n" {
                return Err("bulk string not terminated by CRLF".to_string());
            }
            let s = utf8(&buffer[start..start + str_len])?;
            Ok(Some((RespValue::BulkString(Some(s)), start + str_len + 2)))
        }
        b'*' => {
            let Some((count, len_bytes)) = parse_int(&buffer[1..])? else {
                return Ok(None);
            };
            let mut pos = 1 + len_bytes;
            if count < 0 {
                return Ok(Some((RespValue::Array(None), pos)));
            }

            // The count comes from the wire; grow as items actually arrive.
            let mut items = Vec::new();
            for _ in 0..count {
                match parse(&buffer[pos..])? {
                    Some((item, len)) => {
                        items.push(item);
                        pos += len;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), pos)))
        }
        other => Err(format!("unknown reply type byte 0x{:02x}", other)),
    }
}
