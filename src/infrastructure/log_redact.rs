//! 日志脱敏
//! 地址、哈希等字段进日志前统一截断；助记词与私钥永远不进日志

/// 可脱敏trait
pub trait SensitiveRedact {
    fn redact(&self) -> String;
}

/// 脱敏十六进制字符串（显示前缀和后缀）
pub fn redact_hex_string(hex: &str, show_chars: usize) -> String {
    if hex.len() <= show_chars * 2 {
        return "*".repeat(hex.len());
    }

    let prefix = &hex[..show_chars];
    let suffix = &hex[hex.len() - show_chars..];
    format!("{}...{}", prefix, suffix)
}

/// 脱敏地址（显示前6位和后4位）
pub fn redact_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return "*".repeat(address.len());
    }

    let prefix = &address[..6];
    let suffix = &address[address.len() - 4..];
    format!("{}...{}", prefix, suffix)
}

impl SensitiveRedact for crate::domain::derivation::KeyPair {
    fn redact(&self) -> String {
        format!(
            "KeyPair {{ address: {}, public_key: {}, path: {} }}",
            redact_address(&self.address),
            redact_hex_string(&self.public_key, 8),
            self.path
        )
    }
}

impl SensitiveRedact for crate::service::evm_signer::SignedPayload {
    fn redact(&self) -> String {
        format!(
            "SignedPayload {{ signed_raw_tx: {}, tx_hash: {} }}",
            redact_hex_string(&self.signed_raw_tx, 10),
            self.tx_hash.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hex_string() {
        let hex = "0x1234567890abcdef1234567890abcdef12345678";
        let redacted = redact_hex_string(hex, 10);
        assert_eq!(redacted, "0x12345678...ef12345678");
        assert_eq!(redact_hex_string("0xabcd", 10), "******");
    }

    #[test]
    fn test_redact_address() {
        let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bFd2";
        let redacted = redact_address(address);
        assert_eq!(redacted, "0x742d...bFd2");
        assert_eq!(redact_address("0x12"), "****");
    }

    #[test]
    fn test_redact_key_pair() {
        let key_pair = crate::domain::derivation::KeyPair {
            public_key: "ab".repeat(64),
            address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            path: "m/44'/60'/0'/0/0".to_string(),
        };
        let redacted = key_pair.redact();
        assert!(redacted.contains("0xf39F...2266"));
        assert!(redacted.contains("m/44'/60'/0'/0/0"));
        assert!(!redacted.contains(&key_pair.public_key));
    }
}
