//! Reusable field filters used by [`Normalize`](super::Normalize) impls

/// Trim surrounding whitespace in place
pub fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trim and lowercase in place
pub fn trim_lowercase(value: &mut String) {
    *value = value.trim().to_lowercase();
}

/// Trim an optional string in place
pub fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim(v);
    }
}

/// Trim and lowercase an optional string in place
pub fn trim_lowercase_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim_lowercase(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        let mut value = "  Vases  ".to_string();
        trim(&mut value);
        assert_eq!(value, "Vases");
    }

    #[test]
    fn test_trim_lowercase() {
        let mut value = " Alice@Example.COM ".to_string();
        trim_lowercase(&mut value);
        assert_eq!(value, "alice@example.com");
    }

    #[test]
    fn test_optional_filters() {
        let mut none: Option<String> = None;
        trim_opt(&mut none);
        assert!(none.is_none());

        let mut some = Some(" ADMIN ".to_string());
        trim_lowercase_opt(&mut some);
        assert_eq!(some.as_deref(), Some("admin"));
    }
}
