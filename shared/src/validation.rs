//! Validation helpers shared between event appliers and handlers

use rust_decimal::Decimal;

/// Validate an event quantity that must be strictly positive (arrivals,
/// returns, sale lines).
pub fn validate_positive_quantity(count: Decimal) -> Result<(), &'static str> {
    if count <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an event quantity that may be zero (disposals accept a zero
/// count as a no-op write-off).
pub fn validate_non_negative_quantity(count: Decimal) -> Result<(), &'static str> {
    if count < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate a purchase or retail price.
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate a required free-text field (invoice number, cause, name).
pub fn validate_required_text(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Field cannot be empty");
    }
    Ok(())
}

/// Validate a user login (3-50 characters, no whitespace).
pub fn validate_login(login: &str) -> Result<(), &'static str> {
    if login.len() < 3 || login.len() > 50 {
        return Err("Login must be 3-50 characters");
    }
    if login.chars().any(char::is_whitespace) {
        return Err("Login cannot contain whitespace");
    }
    Ok(())
}

/// Validate email format (basic check).
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate a password (5-24 characters).
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 5 || password.len() > 24 {
        return Err("Password must be 5-24 characters");
    }
    Ok(())
}
