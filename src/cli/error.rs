// Error handling utilities for consistent error messages and exit codes

use std::process;
use crate::models::LeadId;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that a lead ID is valid (positive integer)
pub fn validate_lead_id(id_str: &str) -> Result<LeadId, String> {
    id_str.trim().parse::<i64>()
        .map_err(|_| format!("Invalid lead ID: '{}'. Lead ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(LeadId(id))
            } else {
                Err(format!("Invalid lead ID: {}. Lead ID must be positive.", id))
            }
        })
}

/// Validate a stage colour (`#rgb` or `#rrggbb`)
pub fn validate_color(color: &str) -> Result<(), String> {
    let hex = color.strip_prefix('#')
        .ok_or_else(|| format!("Invalid colour: '{}'. Use a hex colour such as #3b82f6.", color))?;
    if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(format!("Invalid colour: '{}'. Use a hex colour such as #3b82f6.", color))
    }
}

/// Validate a phone number: digits with optional `+`, spaces, dashes and parentheses
pub fn validate_phone(phone: &str) -> Result<(), String> {
    validate_non_empty(phone, "Phone number")?;
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')');
    if !phone.chars().all(allowed) {
        return Err(format!("Invalid phone number: '{}'. Use digits, spaces and an optional leading +.", phone));
    }
    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 7 {
        return Err(format!("Invalid phone number: '{}'. Too few digits.", phone));
    }
    Ok(())
}
