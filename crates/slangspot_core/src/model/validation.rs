//! Field-level validation shared by all form inputs.
//!
//! # Responsibility
//! - Collect every field error of a submission instead of stopping at the
//!   first one, so the caller can re-render the form in one pass.
//! - Provide small normalizers for text, choice and file-path fields.
//!
//! # Invariants
//! - Blank optional text is normalized to `None`.
//! - Length limits count characters, not bytes.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_CHOICE: &str = "Select a valid choice.";

/// Image extensions accepted for cover images, avatars and featured images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
/// Audio extensions accepted for expression recordings.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// Field-name keyed validation messages for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns `value` when no error has been recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Shorthand for a single-field error set.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for FormErrors {}

/// Trims a required text field and checks its length.
pub fn required_text(
    errors: &mut FormErrors,
    field: &str,
    value: &str,
    max_chars: Option<usize>,
) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, MSG_REQUIRED);
        return String::new();
    }
    check_max_chars(errors, field, trimmed, max_chars);
    trimmed.to_string()
}

/// Trims an optional text field; blank input becomes `None`.
pub fn optional_text(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&str>,
    max_chars: Option<usize>,
) -> Option<String> {
    let trimmed = value.map(str::trim).filter(|value| !value.is_empty())?;
    check_max_chars(errors, field, trimmed, max_chars);
    Some(trimmed.to_string())
}

/// Parses a required enumeration field with the given parser.
pub fn required_choice<T>(
    errors: &mut FormErrors,
    field: &str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, MSG_REQUIRED);
        return None;
    }
    let parsed = parse(trimmed);
    if parsed.is_none() {
        errors.add(field, MSG_INVALID_CHOICE);
    }
    parsed
}

/// Validates an optional stored file path by extension.
pub fn optional_file_path(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&str>,
    allowed_extensions: &[&str],
) -> Option<String> {
    let path = optional_text(errors, field, value, Some(255))?;
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !allowed_extensions.contains(&extension.as_str()) {
        errors.add(
            field,
            format!(
                "Unsupported file format. Use: {}.",
                allowed_extensions.join(", ")
            ),
        );
    }
    Some(path)
}

/// Interprets an HTML checkbox value.
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn check_max_chars(errors: &mut FormErrors, field: &str, value: &str, max_chars: Option<usize>) {
    if let Some(max) = max_chars {
        let count = value.chars().count();
        if count > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {count})."),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        checkbox, optional_file_path, optional_text, required_text, FormErrors, IMAGE_EXTENSIONS,
        MSG_REQUIRED,
    };

    #[test]
    fn required_text_reports_blank_values() {
        let mut errors = FormErrors::new();
        let value = required_text(&mut errors, "title", "   ", Some(10));
        assert!(value.is_empty());
        assert_eq!(errors.messages("title"), [MSG_REQUIRED.to_string()]);
    }

    #[test]
    fn required_text_counts_characters_not_bytes() {
        let mut errors = FormErrors::new();
        required_text(&mut errors, "title", "ñññññ", Some(5));
        assert!(errors.is_empty());
        required_text(&mut errors, "title", "ññññññ", Some(5));
        assert!(errors.contains("title"));
    }

    #[test]
    fn optional_text_drops_blank_input() {
        let mut errors = FormErrors::new();
        assert_eq!(optional_text(&mut errors, "notes", Some("  "), None), None);
        assert_eq!(
            optional_text(&mut errors, "notes", Some(" hola "), None).as_deref(),
            Some("hola")
        );
    }

    #[test]
    fn file_path_extension_is_case_insensitive() {
        let mut errors = FormErrors::new();
        optional_file_path(&mut errors, "cover", Some("cover.PNG"), IMAGE_EXTENSIONS);
        assert!(errors.is_empty());
        optional_file_path(&mut errors, "cover", Some("cover.bmp"), IMAGE_EXTENSIONS);
        assert!(errors.contains("cover"));
    }

    #[test]
    fn checkbox_accepts_html_values() {
        assert!(checkbox(Some("on")));
        assert!(checkbox(Some("true")));
        assert!(!checkbox(Some("off")));
        assert!(!checkbox(None));
    }

    #[test]
    fn display_joins_all_messages() {
        let mut errors = FormErrors::single("content", "too short");
        errors.add("title", "missing");
        assert_eq!(errors.to_string(), "content: too short; title: missing");
    }
}
