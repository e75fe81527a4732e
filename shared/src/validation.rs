//! Validation utilities for order intake and carryover months

use validator::ValidationError;

use crate::models::CreateOrderInput;

// ============================================================================
// Order Validations
// ============================================================================

/// Cross-field rules: each chosen dish needs its expiry, and at least one
/// dish must be chosen
pub fn validate_order_refs(input: &CreateOrderInput) -> Result<(), ValidationError> {
    if !input.okazu.is_empty() && input.okazu_expiry.is_empty() {
        return Err(order_error("okazu_expiry_required", "okazu_expiry required"));
    }
    if !input.gohan.is_empty() && input.gohan_expiry.is_empty() {
        return Err(order_error("gohan_expiry_required", "gohan_expiry required"));
    }
    if input.okazu.is_empty() && input.gohan.is_empty() {
        return Err(order_error("dish_required", "okazu or gohan required"));
    }
    Ok(())
}

fn order_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

// ============================================================================
// Carryover Validations
// ============================================================================

/// Validate a `YYYY-MM` month label
pub fn validate_month_label(month: &str) -> Result<(), &'static str> {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return Err("Month must be formatted YYYY-MM");
    }
    if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
        return Err("Month must be formatted YYYY-MM");
    }
    let m: u32 = month[5..].parse().map_err(|_| "Month must be formatted YYYY-MM")?;
    if !(1..=12).contains(&m) {
        return Err("Month must be between 01 and 12");
    }
    Ok(())
}
