//! Validation utilities for the stock management platform

use rust_decimal::Decimal;

// ============================================================================
// Account Validations
// ============================================================================

/// Minimum password length for agent and supplier accounts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

/// Validate that a password and its confirmation match
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password != confirmation {
        return Err("Passwords do not match");
    }
    validate_password(password)
}

/// Usernames: 3-150 characters of letters, digits and `@.+-_`
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(3..=150).contains(&len) {
        return Err("Username must be between 3 and 150 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err("Username may only contain letters, digits and @.+-_");
    }
    Ok(())
}

/// Loose international phone check: 6 to 15 digits, with optional `+`,
/// spaces, dots, dashes and parentheses
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || " +-.()".contains(c))
    {
        return Err("Invalid phone number format");
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(6..=15).contains(&digits) {
        return Err("Invalid phone number format");
    }
    Ok(())
}

// ============================================================================
// Catalogue Validations
// ============================================================================

/// Product and supplier names: non-blank, at most 100 characters
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.chars().count() > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// Prices may be zero but never negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Stock quantities are whole units, never negative
pub fn validate_stock_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Supplier Codes
// ============================================================================

/// Derive a supplier code from a display name: lowercase ASCII, words joined
/// by single dashes. Accented Latin letters fold to their base letter.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

fn fold_accent(c: char) -> impl Iterator<Item = char> {
    let folded: &'static str = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'œ' | 'Œ' => "oe",
        'æ' | 'Æ' => "ae",
        _ => "",
    };
    let passthrough = if folded.is_empty() { Some(c) } else { None };
    folded.chars().chain(passthrough)
}

/// Supplier codes are the slugs produced by [`slugify`], 1-64 characters
pub fn validate_supplier_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() || code.len() > 64 {
        return Err("Supplier code must be between 1 and 64 characters");
    }
    if code.starts_with('-') || code.ends_with('-') || code.contains("--") {
        return Err("Supplier code has misplaced dashes");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Supplier code must be lowercase letters, digits and dashes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ops@example.com").is_ok());
        assert!(validate_email("ops@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert_eq!(
            validate_password_confirmation("secret1", "secret2"),
            Err("Passwords do not match")
        );
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jean.dupont").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("+33 6 12 34 56 78").is_ok());
        assert!(validate_phone("(221) 77-123-4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Société Générale  Fournitures"), "societe-generale-fournitures");
        assert_eq!(slugify("  ACME -- Widgets_Ltd "), "acme-widgets-ltd");
        assert_eq!(slugify("Bœuf & Cie"), "boeuf-cie");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_output_is_valid_code() {
        for name in ["Café du Marché", "Dépôt 42", "Nord-Sud Import"] {
            assert!(validate_supplier_code(&slugify(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }
}
