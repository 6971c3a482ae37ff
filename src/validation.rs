//! Request field validation shared by handlers.

use crate::error::AppError;
use uuid::Uuid;

/// Validate an EVM wallet address and return it lowercased.
///
/// Accepts `0x` followed by exactly 40 hex digits (any case).
pub fn normalize_wallet_address(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{field} is required")));
    }
    if !is_prefixed_hex(value, 40) {
        return Err(AppError::InvalidRequest(format!(
            "{field} must be a 0x-prefixed 20-byte hex address"
        )));
    }
    Ok(value.to_ascii_lowercase())
}

/// Validate a transaction hash (`0x` + 64 hex digits) and return it lowercased.
pub fn normalize_transaction_hash(value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(
            "transaction_hash is required".to_string(),
        ));
    }
    if !is_prefixed_hex(value, 64) {
        return Err(AppError::InvalidRequest(
            "transaction_hash must be a 0x-prefixed 32-byte hex string".to_string(),
        ));
    }
    Ok(value.to_ascii_lowercase())
}

/// Parse a plan id supplied as a string field.
pub fn parse_plan_id(value: &str) -> Result<Uuid, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest("plan_id is required".to_string()));
    }
    Uuid::parse_str(value)
        .map_err(|_| AppError::InvalidRequest("plan_id must be a UUID".to_string()))
}

/// Trim an optional string, mapping blank values to `None`.
pub fn optional_trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    let Some(hex_part) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    else {
        return false;
    };
    hex_part.len() == digits && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_addresses_are_lowercased() {
        let wallet = normalize_wallet_address(
            "wallet_address",
            " 0xAbCdEf0123456789abcdef0123456789ABCDEF01 ",
        )
        .unwrap();
        assert_eq!(wallet, "0xabcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn short_or_non_hex_wallets_are_rejected() {
        assert!(normalize_wallet_address("w", "0x1234").is_err());
        assert!(normalize_wallet_address("w", "0xZZcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(normalize_wallet_address("w", "abcdef0123456789abcdef0123456789abcdef0123").is_err());
    }

    #[test]
    fn empty_wallet_reports_required_field() {
        match normalize_wallet_address("customer_wallet", "  ") {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, "customer_wallet is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn transaction_hash_needs_32_bytes() {
        let hash = format!("0x{}", "Ab".repeat(32));
        assert_eq!(
            normalize_transaction_hash(&hash).unwrap(),
            format!("0x{}", "ab".repeat(32))
        );
        assert!(normalize_transaction_hash("0xabc").is_err());
    }

    #[test]
    fn plan_ids_must_be_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_plan_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_plan_id("plan-1"),
            Err(AppError::InvalidRequest(msg)) if msg == "plan_id must be a UUID"
        ));
        assert!(parse_plan_id("").is_err());
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(optional_trimmed(Some("   ".into())), None);
        assert_eq!(optional_trimmed(Some(" Acme ".into())), Some("Acme".into()));
        assert_eq!(optional_trimmed(None), None);
    }
}
