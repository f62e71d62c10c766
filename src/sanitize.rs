/// Input sanitizers shared by the record mutation pipeline.

/// Remove all non-digit characters from a phone number.
///
/// Returns `None` when nothing usable remains, so callers can treat a
/// blank or garbage phone field as missing.
pub fn sanitize_phone(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Check that an email address is plausibly well-formed.
///
/// This is a syntax check, not a deliverability check: exactly one `@`,
/// a non-empty local part, and a domain with at least one interior dot.
pub fn email_is_valid(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = match parts.next() {
        Some(l) if !l.is_empty() => l,
        _ => return false,
    };
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };
    if local.contains('@') || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain.len() >= 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_phone_strips_punctuation() {
        assert_eq!(
            sanitize_phone("(864) 918-9255"),
            Some("8649189255".to_string())
        );
        assert_eq!(sanitize_phone("1-800-555-3333"), Some("18005553333".to_string()));
    }

    #[test]
    fn test_sanitize_phone_empty_is_none() {
        assert_eq!(sanitize_phone(""), None);
        assert_eq!(sanitize_phone("ext."), None);
    }

    #[test]
    fn test_email_validation() {
        assert!(email_is_valid("jd@sacredheart.org"));
        assert!(email_is_valid("duwayne@theroc-johnson.com"));
        assert!(!email_is_valid("not-an-email"));
        assert!(!email_is_valid("@nobody.com"));
        assert!(!email_is_valid("spaces in@side.com"));
        assert!(!email_is_valid("two@@ats.com"));
        assert!(!email_is_valid("trailing@dot."));
    }
}
