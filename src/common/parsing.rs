// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::account::Credential;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use std::str::FromStr;

pub fn parse_boolish(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_address_hex(s: &str) -> Option<Address> {
    Address::from_str(strip_0x(s.trim())).ok()
}

/// A 32-byte hex private key, with or without `0x`.
pub fn parse_private_key(raw: &str) -> Result<Credential, AppError> {
    let body = strip_0x(raw.trim());
    let bytes = hex::decode(body).map_err(|_| AppError::Validation {
        field: "private_key".into(),
        message: "not valid hex".into(),
    })?;
    if bytes.len() != 32 {
        return Err(AppError::Validation {
            field: "private_key".into(),
            message: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }
    Ok(Credential::new(format!("0x{body}")))
}

/// Proxy lines are `user:pass@host:port`; an `http://` prefix is accepted.
/// Returns the URL form reqwest expects.
pub fn parse_proxy(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let invalid = || AppError::Validation {
        field: "proxy".into(),
        message: format!("expected user:pass@host:port, got '{trimmed}'"),
    };

    let (creds, host_port) = body.split_once('@').ok_or_else(invalid)?;
    let (user, pass) = creds.split_once(':').ok_or_else(invalid)?;
    let (host, port) = host_port.rsplit_once(':').ok_or_else(invalid)?;
    if user.is_empty() || pass.is_empty() || host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }

    let url = format!("http://{body}");
    url::Url::parse(&url).map_err(|_| invalid())?;
    Ok(url)
}

pub fn parse_settlement_address(raw: &str) -> Result<Address, AppError> {
    parse_address_hex(raw).ok_or_else(|| AppError::InvalidAddress(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_boolish_rejects_invalid_values() {
        assert_eq!(parse_boolish("true"), Some(true));
        assert_eq!(parse_boolish("OFF"), Some(false));
        assert_eq!(parse_boolish("tru"), None);
    }

    #[test]
    fn private_keys_need_32_bytes() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        assert_eq!(
            parse_private_key(key).unwrap().expose(),
            format!("0x{key}")
        );
        assert!(parse_private_key("0xdeadbeef").is_err());
        assert!(parse_private_key("zz").is_err());
    }

    #[test]
    fn proxies_are_normalized_to_http_urls() {
        assert_eq!(
            parse_proxy("user:pw@10.0.0.1:8080").unwrap(),
            "http://user:pw@10.0.0.1:8080"
        );
        assert_eq!(
            parse_proxy("http://user:pw@proxy.local:3128").unwrap(),
            "http://user:pw@proxy.local:3128"
        );
        assert!(parse_proxy("10.0.0.1:8080").is_err());
        assert!(parse_proxy("user:pw@host:notaport").is_err());
    }

    #[test]
    fn settlement_addresses_are_validated() {
        assert!(parse_settlement_address("0x0000000000000000000000000000000000000001").is_ok());
        assert!(matches!(
            parse_settlement_address("0x1234"),
            Err(AppError::InvalidAddress(_))
        ));
    }
}
