//! Personal practice notes, visible only to their owner.

use crate::model::record::{RecordMeta, UserId};
use crate::model::validation::{required_choice, required_text, FormErrors};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeDifficulty {
    Easy,
    Medium,
    Hard,
}

impl PracticeDifficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Fácil",
            Self::Medium => "Medio",
            Self::Hard => "Difícil",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeForm {
    pub title: String,
    pub content: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeFields {
    pub title: String,
    pub content: String,
    pub difficulty: PracticeDifficulty,
}

impl PracticeForm {
    pub fn validate(&self) -> Result<PracticeFields, FormErrors> {
        let mut errors = FormErrors::new();
        let title = required_text(&mut errors, "title", &self.title, Some(TITLE_MAX_CHARS));
        let content = required_text(&mut errors, "content", &self.content, None);
        let difficulty = required_choice(
            &mut errors,
            "difficulty",
            &self.difficulty,
            PracticeDifficulty::parse,
        );
        match difficulty {
            Some(difficulty) if errors.is_empty() => Ok(PracticeFields {
                title,
                content,
                difficulty,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub user_id: UserId,
    #[serde(flatten)]
    pub fields: PracticeFields,
}

impl Practice {
    pub fn new(user_id: UserId, fields: PracticeFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            user_id,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PracticeDifficulty, PracticeForm};

    #[test]
    fn practice_form_parses_difficulty() {
        let form = PracticeForm {
            title: "Verbos".to_string(),
            content: "Conjugar 'chambear'".to_string(),
            difficulty: "hard".to_string(),
        };
        assert_eq!(form.validate().unwrap().difficulty, PracticeDifficulty::Hard);
    }

    #[test]
    fn practice_form_rejects_lesson_difficulty_names() {
        let form = PracticeForm {
            title: "Verbos".to_string(),
            content: "x".to_string(),
            difficulty: "beginner".to_string(),
        };
        assert!(form.validate().unwrap_err().contains("difficulty"));
    }
}
