use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Phone numbers are kept permissive: digits with the usual separators,
/// at least 7 digits overall.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 7
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

/// Field-level checks for applicant creation. Returns the first problem found.
pub fn validate_new_applicant(
    name: &str,
    email: &str,
    phone: &str,
    resume_ref: &str,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }
    if !is_valid_email(email) {
        return Err("Please provide a valid email address".to_string());
    }
    if !is_valid_phone(phone) {
        return Err("Please provide a valid phone number".to_string());
    }
    if resume_ref.trim().is_empty() {
        return Err("Resume reference is required".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("jane.doe@example.com"));
    }

    #[test]
    fn test_email_without_domain_dot_rejected() {
        assert!(!is_valid_email("jane@example"));
    }

    #[test]
    fn test_email_with_spaces_rejected() {
        assert!(!is_valid_email("jane doe@example.com"));
    }

    #[test]
    fn test_email_missing_at_rejected() {
        assert!(!is_valid_email("jane.example.com"));
    }

    #[test]
    fn test_valid_phone_with_separators() {
        assert!(is_valid_phone("+966 (11) 462-7000"));
    }

    #[test]
    fn test_phone_too_short_rejected() {
        assert!(!is_valid_phone("12345"));
    }

    #[test]
    fn test_phone_with_letters_rejected() {
        assert!(!is_valid_phone("555-CALL-NOW"));
    }

    #[test]
    fn test_validate_new_applicant_happy_path() {
        assert!(validate_new_applicant("Jane Doe", "jane@example.com", "0114627000", "s3://resumes/jane.pdf").is_ok());
    }

    #[test]
    fn test_validate_new_applicant_blank_name() {
        let err = validate_new_applicant("  ", "jane@example.com", "0114627000", "ref").unwrap_err();
        assert_eq!(err, "Name is required");
    }

    #[test]
    fn test_validate_new_applicant_missing_resume() {
        let err = validate_new_applicant("Jane", "jane@example.com", "0114627000", "").unwrap_err();
        assert_eq!(err, "Resume reference is required");
    }
}
