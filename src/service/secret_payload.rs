//! 密钥载荷解析
//!
//! 支持的存储编码：
//! - 纯文本助记词
//! - `{"mnemonic": "..."}`
//! - `{"parts": ["...", "..."]}`，按数组顺序拼接
//! - `{"mnemonic_share_1": "...", "mnemonic_share_2": "..."}`，按序号升序拼接
//! - `{"ciphertext": "<base64>"}`，先解密再按以上规则解析
//!
//! 错误信息只包含条目名和字段名，不包含载荷内容

use base64::Engine;
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};

/// 默认分片字段前缀
pub const DEFAULT_SHARE_PREFIX: &str = "mnemonic_share_";

/// 解析结果
pub enum ParsedPayload {
    /// 已重组的助记词
    Phrase(Zeroizing<String>),
    /// 加密信封中的密文（nonce + ciphertext）
    Encrypted(Zeroizing<Vec<u8>>),
}

impl std::fmt::Debug for ParsedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsedPayload::Phrase(_) => f.write_str("Phrase(***)"),
            ParsedPayload::Encrypted(ct) => write!(f, "Encrypted({} bytes)", ct.len()),
        }
    }
}

/// 解析原始载荷
pub fn parse_payload(
    secret_name: &str,
    raw: &str,
    share_prefix: &str,
) -> WalletResult<ParsedPayload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(unavailable(secret_name));
    }

    if !trimmed.starts_with('{') {
        return Ok(ParsedPayload::Phrase(Zeroizing::new(trimmed.to_string())));
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|_| malformed(secret_name, "payload is not valid JSON"))?;
    let Value::Object(fields) = value else {
        return Err(malformed(secret_name, "payload is not a JSON object"));
    };

    if let Some(ciphertext) = fields.get("ciphertext") {
        let encoded = ciphertext
            .as_str()
            .ok_or_else(|| malformed(secret_name, "ciphertext must be a string"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| malformed(secret_name, "ciphertext is not valid base64"))?;
        return Ok(ParsedPayload::Encrypted(Zeroizing::new(bytes)));
    }

    let phrase = if let Some(mnemonic) = fields.get("mnemonic") {
        mnemonic
            .as_str()
            .ok_or_else(|| malformed(secret_name, "mnemonic must be a string"))?
            .trim()
            .to_string()
    } else if let Some(parts) = fields.get("parts") {
        join_parts(secret_name, parts)?
    } else {
        join_shares(secret_name, &fields, share_prefix)?
    };

    let phrase = Zeroizing::new(phrase);
    if phrase.trim().is_empty() {
        return Err(unavailable(secret_name));
    }
    Ok(ParsedPayload::Phrase(phrase))
}

fn join_parts(secret_name: &str, parts: &Value) -> WalletResult<String> {
    let parts = parts
        .as_array()
        .ok_or_else(|| malformed(secret_name, "parts must be an array"))?;
    if parts.is_empty() {
        return Err(malformed(secret_name, "parts is empty"));
    }

    let mut phrase = String::new();
    for part in parts {
        let part = part
            .as_str()
            .ok_or_else(|| malformed(secret_name, "parts must contain only strings"))?;
        phrase.push_str(part);
    }
    Ok(phrase)
}

/// 分片必须从 1 开始连续编号，缺片视为载荷损坏
fn join_shares(
    secret_name: &str,
    fields: &Map<String, Value>,
    share_prefix: &str,
) -> WalletResult<String> {
    let mut shares: Vec<(u32, &str)> = Vec::new();
    for (key, value) in fields {
        let Some(suffix) = key.strip_prefix(share_prefix) else {
            continue;
        };
        let ordinal: u32 = suffix.parse().map_err(|_| {
            malformed(secret_name, &format!("share field {:?} has no numeric suffix", key))
        })?;
        let share = value.as_str().ok_or_else(|| {
            malformed(secret_name, &format!("share field {:?} must be a string", key))
        })?;
        shares.push((ordinal, share));
    }

    if shares.is_empty() {
        return Err(malformed(
            secret_name,
            "expected one of: mnemonic, parts, ciphertext, or share fields",
        ));
    }

    shares.sort_by_key(|(ordinal, _)| *ordinal);
    for (expected, (ordinal, _)) in (1u32..).zip(shares.iter()) {
        if *ordinal != expected {
            return Err(malformed(
                secret_name,
                &format!("share {} missing", expected),
            ));
        }
    }

    Ok(shares.into_iter().map(|(_, share)| share).collect())
}

fn unavailable(secret_name: &str) -> WalletError {
    WalletError::SecretUnavailable {
        secret_name: secret_name.to_string(),
    }
}

fn malformed(secret_name: &str, reason: &str) -> WalletError {
    WalletError::SecretMalformed {
        secret_name: secret_name.to_string(),
        reason: reason.to_string(),
    }
}
