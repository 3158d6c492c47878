//! Lesson and expression domain model.
//!
//! # Responsibility
//! - Define lessons (owned by an author) and their child expressions.
//! - Validate lesson/expression form input into typed field sets.
//!
//! # Invariants
//! - Expression ownership is derived from its lesson's author.
//! - Stored video URLs are always YouTube embed URLs.

use crate::model::record::{RecordId, RecordMeta, UserId};
use crate::model::validation::{
    optional_file_path, optional_text, required_choice, required_text, FormErrors,
    AUDIO_EXTENSIONS, IMAGE_EXTENSIONS,
};
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 200;
const EXPRESSION_TEXT_MAX_CHARS: usize = 200;
const YOUTUBE_EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Principiante",
            Self::Intermediate => "Intermedio",
            Self::Advanced => "Avanzado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonCategory {
    Slang,
    Proverb,
}

impl LessonCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slang => "slang",
            Self::Proverb => "proverb",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slang" => Some(Self::Slang),
            "proverb" => Some(Self::Proverb),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Slang => "Slang",
            Self::Proverb => "Proverbio",
        }
    }
}

/// Spanish-speaking countries a lesson can be attributed to.
///
/// Serialized as the ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Ar,
    Bo,
    Cl,
    Co,
    Cr,
    Cu,
    Do,
    Ec,
    Sv,
    Gt,
    Hn,
    Mx,
    Ni,
    Pa,
    Py,
    Pe,
    Pr,
    Es,
    Uy,
    Ve,
}

impl Country {
    pub const ALL: [Country; 20] = [
        Self::Ar,
        Self::Bo,
        Self::Cl,
        Self::Co,
        Self::Cr,
        Self::Cu,
        Self::Do,
        Self::Ec,
        Self::Sv,
        Self::Gt,
        Self::Hn,
        Self::Mx,
        Self::Ni,
        Self::Pa,
        Self::Py,
        Self::Pe,
        Self::Pr,
        Self::Es,
        Self::Uy,
        Self::Ve,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Ar => "AR",
            Self::Bo => "BO",
            Self::Cl => "CL",
            Self::Co => "CO",
            Self::Cr => "CR",
            Self::Cu => "CU",
            Self::Do => "DO",
            Self::Ec => "EC",
            Self::Sv => "SV",
            Self::Gt => "GT",
            Self::Hn => "HN",
            Self::Mx => "MX",
            Self::Ni => "NI",
            Self::Pa => "PA",
            Self::Py => "PY",
            Self::Pe => "PE",
            Self::Pr => "PR",
            Self::Es => "ES",
            Self::Uy => "UY",
            Self::Ve => "VE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ar => "Argentina",
            Self::Bo => "Bolivia",
            Self::Cl => "Chile",
            Self::Co => "Colombia",
            Self::Cr => "Costa Rica",
            Self::Cu => "Cuba",
            Self::Do => "República Dominicana",
            Self::Ec => "Ecuador",
            Self::Sv => "El Salvador",
            Self::Gt => "Guatemala",
            Self::Hn => "Honduras",
            Self::Mx => "México",
            Self::Ni => "Nicaragua",
            Self::Pa => "Panamá",
            Self::Py => "Paraguay",
            Self::Pe => "Perú",
            Self::Pr => "Puerto Rico",
            Self::Es => "España",
            Self::Uy => "Uruguay",
            Self::Ve => "Venezuela",
        }
    }

    /// Parses a country code, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        let code = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|country| country.code() == code)
    }
}

/// Raw lesson form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonForm {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub category: String,
    pub country: String,
    pub video_url: Option<String>,
    pub cultural_notes: Option<String>,
    pub cover_image: Option<String>,
}

/// Validated, editable lesson fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonFields {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: LessonCategory,
    pub country: Country,
    pub video_url: Option<String>,
    pub cultural_notes: Option<String>,
    pub cover_image: Option<String>,
}

impl LessonForm {
    /// Validates every field and normalizes the video URL.
    pub fn validate(&self) -> Result<LessonFields, FormErrors> {
        let mut errors = FormErrors::new();
        let title = required_text(&mut errors, "title", &self.title, Some(TITLE_MAX_CHARS));
        let description = required_text(&mut errors, "description", &self.description, None);
        let difficulty =
            required_choice(&mut errors, "difficulty", &self.difficulty, Difficulty::parse);
        let category =
            required_choice(&mut errors, "category", &self.category, LessonCategory::parse);
        let country = required_choice(&mut errors, "country", &self.country, Country::parse);
        let video_url = optional_text(&mut errors, "video_url", self.video_url.as_deref(), None)
            .and_then(|url| match normalize_video_url(&url) {
                Ok(normalized) => Some(normalized),
                Err(message) => {
                    errors.add("video_url", message);
                    None
                }
            });
        let cultural_notes =
            optional_text(&mut errors, "cultural_notes", self.cultural_notes.as_deref(), None);
        let cover_image = optional_file_path(
            &mut errors,
            "cover_image",
            self.cover_image.as_deref(),
            IMAGE_EXTENSIONS,
        );

        match (difficulty, category, country) {
            (Some(difficulty), Some(category), Some(country)) if errors.is_empty() => {
                Ok(LessonFields {
                    title,
                    description,
                    difficulty,
                    category,
                    country,
                    video_url,
                    cultural_notes,
                    cover_image,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub author_id: UserId,
    #[serde(flatten)]
    pub fields: LessonFields,
}

impl Lesson {
    pub fn new(author_id: UserId, fields: LessonFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            author_id,
            fields,
        }
    }
}

/// Raw expression form submission. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionForm {
    pub text: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionFields {
    pub text: Option<String>,
    pub meaning: Option<String>,
    pub example: Option<String>,
    pub audio: Option<String>,
}

impl ExpressionForm {
    pub fn validate(&self) -> Result<ExpressionFields, FormErrors> {
        let mut errors = FormErrors::new();
        let fields = ExpressionFields {
            text: optional_text(
                &mut errors,
                "text",
                self.text.as_deref(),
                Some(EXPRESSION_TEXT_MAX_CHARS),
            ),
            meaning: optional_text(&mut errors, "meaning", self.meaning.as_deref(), None),
            example: optional_text(&mut errors, "example", self.example.as_deref(), None),
            audio: optional_file_path(&mut errors, "audio", self.audio.as_deref(), AUDIO_EXTENSIONS),
        };
        errors.into_result(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub lesson_id: Option<RecordId>,
    #[serde(flatten)]
    pub fields: ExpressionFields,
}

impl Expression {
    pub fn new(lesson_id: Option<RecordId>, fields: ExpressionFields) -> Self {
        Self {
            meta: RecordMeta::new(),
            lesson_id,
            fields,
        }
    }
}

/// Rewrites a YouTube watch/share URL into its embed form.
pub fn normalize_video_url(url: &str) -> Result<String, &'static str> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("Enter a valid URL.");
    }
    if !url.contains("youtube.com") && !url.contains("youtu.be") {
        return Err("Please enter a valid YouTube URL.");
    }
    if url.contains(YOUTUBE_EMBED_PREFIX) {
        return Ok(url.to_string());
    }
    let video_id = url
        .split_once("watch?v=")
        .or_else(|| url.split_once("youtu.be/"))
        .map(|(_, rest)| rest.split(['&', '?', '#']).next().unwrap_or(rest));

    match video_id {
        Some(id) if !id.is_empty() => Ok(format!("{YOUTUBE_EMBED_PREFIX}{id}")),
        Some(_) => Err("Please enter a valid YouTube URL."),
        None => Ok(url.to_string()),
    }
}
