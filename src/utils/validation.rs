use std::borrow::Cow;

use validator::ValidationError;

pub const BLANK: &str = "This field may not be blank.";
pub const REQUIRED: &str = "This field is required.";

/// Reject strings that are empty once surrounding whitespace is ignored.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", BLANK));
    }
    Ok(())
}

/// Validation error carrying a ready-to-display message.
pub fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Human-readable text for a validation error, falling back to its code.
pub fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("Invalid value ({}).", error.code),
    }
}

/// Split a deserializer message such as ``tickets[0]: missing field `seat` at line 1 column 35``
/// (optionally behind an extractor prefix) into a field path and a message.
pub fn field_error_from_detail(text: &str) -> (String, String) {
    // Extractor rejections read "Failed to deserialize ...: <detail>"
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail
        .rfind(" at line ")
        .map_or(detail, |at| &detail[..at]);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(char::is_whitespace) => (Some(path), message),
        _ => (None, detail),
    };

    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'));

    match (path, missing) {
        (Some(path), Some(name)) => (format!("{}.{}", path, name), REQUIRED.to_string()),
        (None, Some(name)) => (name.to_string(), REQUIRED.to_string()),
        (Some(path), None) => (path.to_string(), message.to_string()),
        (None, None) => ("non_field_errors".to_string(), message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("Odesa").is_ok());
        let err = not_blank("   ").unwrap_err();
        assert_eq!(describe(&err), BLANK);
    }

    #[test]
    fn describe_falls_back_to_code() {
        assert_eq!(describe(&ValidationError::new("range")), "Invalid value (range).");
    }

    #[test]
    fn missing_nested_field_is_keyed_by_path() {
        let (field, message) = field_error_from_detail(
            "Failed to deserialize the JSON body into the target type: \
             tickets[0]: missing field `seat` at line 1 column 35",
        );
        assert_eq!(field, "tickets[0].seat");
        assert_eq!(message, REQUIRED);
    }

    #[test]
    fn missing_top_level_field_is_keyed_by_name() {
        let (field, message) = field_error_from_detail(
            "Failed to deserialize the JSON body into the target type: \
             missing field `name` at line 1 column 2",
        );
        assert_eq!(field, "name");
        assert_eq!(message, REQUIRED);
    }

    #[test]
    fn type_mismatch_keeps_deserializer_message() {
        let (field, message) = field_error_from_detail(
            "Failed to deserialize query string: page: invalid digit found in string",
        );
        assert_eq!(field, "page");
        assert_eq!(message, "invalid digit found in string");
    }
}
