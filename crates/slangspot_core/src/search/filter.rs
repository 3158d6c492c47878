//! Typed list filters and their SQL composition.
//!
//! # Responsibility
//! - Turn raw query-string parameters into typed filters.
//! - Compose filter, free-text, sort and pagination clauses onto a
//!   repository-provided `SELECT`.
//!
//! # Invariants
//! - Blank text and unset filters add no clause.
//! - Filter values that do not parse are treated as unset.
//! - Unknown sort keys fall back to [`SortKey::Recent`].
//! - Every ordering ends with a `rowid` tiebreaker so pages are stable.

use crate::model::lesson::{Country, Difficulty, LessonCategory};
use crate::repo::common::normalize_limit;
use crate::search::query::SqlQuery;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

pub const LESSONS_DEFAULT_LIMIT: u32 = 20;
pub const FORUM_DEFAULT_LIMIT: u32 = 20;
pub const BLOG_DEFAULT_LIMIT: u32 = 6;
pub const LIST_LIMIT_MAX: u32 = 100;

/// Raw list parameters as they arrive in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub country: Option<String>,
    pub difficulty: Option<String>,
    /// Alias of `difficulty`.
    pub level: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl SearchParams {
    /// Free text with surrounding whitespace removed; `None` when blank.
    pub fn text(&self) -> Option<String> {
        non_blank(self.q.as_deref())
    }

    fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|raw| raw.trim().parse().ok())
    }

    fn offset(&self) -> u32 {
        self.offset
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Recent,
    Oldest,
    Title,
    /// Likes plus comments; forum posts only.
    Popular,
}

impl SortKey {
    /// Parses a sort key; unknown or unsupported keys select `Recent`.
    pub fn parse(value: Option<&str>, allow_popular: bool) -> Self {
        match value.map(str::trim) {
            Some("oldest") => Self::Oldest,
            Some("title") => Self::Title,
            Some("popular") if allow_popular => Self::Popular,
            _ => Self::Recent,
        }
    }

    fn order_clause(self, alias: &str, popularity: Option<&str>) -> String {
        match (self, popularity) {
            (Self::Oldest, _) => format!("{alias}.created_at ASC, {alias}.rowid ASC"),
            (Self::Title, _) => format!("{alias}.title COLLATE NOCASE ASC, {alias}.rowid ASC"),
            (Self::Popular, Some(score)) => {
                format!("{score} DESC, {alias}.created_at DESC, {alias}.rowid DESC")
            }
            (Self::Recent, _) | (Self::Popular, None) => {
                format!("{alias}.created_at DESC, {alias}.rowid DESC")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFilter {
    pub text: Option<String>,
    pub country: Option<Country>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<LessonCategory>,
    pub sort: SortKey,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl LessonFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        let difficulty = non_blank(params.difficulty.as_deref())
            .or_else(|| non_blank(params.level.as_deref()));
        Self {
            text: params.text(),
            country: params.country.as_deref().and_then(Country::parse),
            difficulty: difficulty.as_deref().and_then(Difficulty::parse),
            category: params
                .category
                .as_deref()
                .map(str::trim)
                .and_then(LessonCategory::parse),
            sort: SortKey::parse(params.sort.as_deref(), false),
            limit: params.limit(),
            offset: params.offset(),
        }
    }

    /// Composes the lesson list query. `select` must alias lessons as `l`
    /// and end in a `WHERE` condition.
    pub fn compose(&self, select: &str) -> SqlQuery {
        let mut query = SqlQuery::new(select);
        if let Some(country) = self.country {
            query.and_where("l.country = ?", [Value::Text(country.code().to_string())]);
        }
        if let Some(difficulty) = self.difficulty {
            query.and_where(
                "l.difficulty = ?",
                [Value::Text(difficulty.as_str().to_string())],
            );
        }
        if let Some(category) = self.category {
            query.and_where("l.category = ?", [Value::Text(category.as_str().to_string())]);
        }
        if let Some(text) = self.text.as_deref() {
            query.and_any_like(
                &[
                    "unicode_lower(l.title) LIKE ? ESCAPE '\\'",
                    "unicode_lower(l.description) LIKE ? ESCAPE '\\'",
                ],
                text,
            );
        }
        query.order_by(&self.sort.order_clause("l", None));
        query.paginate(
            normalize_limit(self.limit, LESSONS_DEFAULT_LIMIT, LIST_LIMIT_MAX),
            self.offset,
        );
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub text: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: SortKey,
    pub limit: Option<u32>,
    pub offset: u32,
}

const POST_POPULARITY: &str = "((SELECT COUNT(*) FROM forum_post_likes pl WHERE pl.post_id = p.id) \
     + (SELECT COUNT(*) FROM comments pc WHERE pc.post_id = p.id AND pc.status = 'active'))";

impl PostFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            text: params.text(),
            category: non_blank(params.category.as_deref()),
            tag: non_blank(params.tag.as_deref()).map(|tag| tag.to_lowercase()),
            sort: SortKey::parse(params.sort.as_deref(), true),
            limit: params.limit(),
            offset: params.offset(),
        }
    }

    /// Composes the forum list query. `select` must alias posts as `p`.
    pub fn compose(&self, select: &str) -> SqlQuery {
        let mut query = SqlQuery::new(select);
        if let Some(slug) = self.category.as_deref() {
            query.and_where(
                "EXISTS (SELECT 1 FROM categories fc WHERE fc.id = p.category_id AND fc.slug = ?)",
                [Value::Text(slug.to_string())],
            );
        }
        if let Some(tag) = self.tag.as_deref() {
            query.and_where(
                "EXISTS (
                    SELECT 1 FROM forum_post_tags ft
                    INNER JOIN tags t ON t.id = ft.tag_id
                    WHERE ft.post_id = p.id AND t.name = ? COLLATE NOCASE
                )",
                [Value::Text(tag.to_string())],
            );
        }
        if let Some(text) = self.text.as_deref() {
            query.and_any_like(
                &[
                    "unicode_lower(p.title) LIKE ? ESCAPE '\\'",
                    "unicode_lower(p.content) LIKE ? ESCAPE '\\'",
                    "EXISTS (
                        SELECT 1 FROM forum_post_tags st
                        INNER JOIN tags s ON s.id = st.tag_id
                        WHERE st.post_id = p.id AND unicode_lower(s.name) LIKE ? ESCAPE '\\'
                    )",
                ],
                text,
            );
        }
        query.order_by(&self.sort.order_clause("p", Some(POST_POPULARITY)));
        query.paginate(
            normalize_limit(self.limit, FORUM_DEFAULT_LIMIT, LIST_LIMIT_MAX),
            self.offset,
        );
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    pub text: Option<String>,
    pub category: Option<String>,
    pub sort: SortKey,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl BlogFilter {
    pub fn from_params(params: &SearchParams) -> Self {
        Self {
            text: params.text(),
            category: non_blank(params.category.as_deref()),
            sort: SortKey::parse(params.sort.as_deref(), false),
            limit: params.limit(),
            offset: params.offset(),
        }
    }

    /// Composes the published-blog list query. `select` must alias blog
    /// posts as `b`.
    pub fn compose(&self, select: &str) -> SqlQuery {
        let mut query = SqlQuery::new(select);
        query.and_where("b.is_published = 1", []);
        if let Some(category) = self.category.as_deref() {
            query.and_where("b.category = ?", [Value::Text(category.to_string())]);
        }
        if let Some(text) = self.text.as_deref() {
            query.and_any_like(
                &[
                    "unicode_lower(b.title) LIKE ? ESCAPE '\\'",
                    "unicode_lower(b.content) LIKE ? ESCAPE '\\'",
                    "unicode_lower(b.excerpt) LIKE ? ESCAPE '\\'",
                ],
                text,
            );
        }
        query.order_by(&self.sort.order_clause("b", None));
        query.paginate(
            normalize_limit(self.limit, BLOG_DEFAULT_LIMIT, LIST_LIMIT_MAX),
            self.offset,
        );
        query
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{BlogFilter, LessonFilter, PostFilter, SearchParams, SortKey};
    use crate::model::lesson::{Country, Difficulty};

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let mut params = SearchParams::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "q" => params.q = value,
                "country" => params.country = value,
                "difficulty" => params.difficulty = value,
                "level" => params.level = value,
                "category" => params.category = value,
                "tag" => params.tag = value,
                "sort" => params.sort = value,
                "limit" => params.limit = value,
                "offset" => params.offset = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn level_is_an_alias_of_difficulty() {
        let filter = LessonFilter::from_params(&params(&[("level", "advanced")]));
        assert_eq!(filter.difficulty, Some(Difficulty::Advanced));
    }

    #[test]
    fn unknown_filter_values_are_ignored() {
        let filter = LessonFilter::from_params(&params(&[
            ("country", "US"),
            ("difficulty", "expert"),
            ("sort", "random"),
        ]));
        assert_eq!(filter.country, None);
        assert_eq!(filter.difficulty, None);
        assert_eq!(filter.sort, SortKey::Recent);

        let query = filter.compose("SELECT l.id FROM lessons l WHERE l.status = 'active'");
        assert!(!query.sql().contains("l.country"));
    }

    #[test]
    fn blank_text_adds_no_clause() {
        let filter = LessonFilter::from_params(&params(&[("q", "   "), ("country", "co")]));
        assert_eq!(filter.text, None);
        assert_eq!(filter.country, Some(Country::Co));
        let query = filter.compose("SELECT l.id FROM lessons l WHERE l.status = 'active'");
        assert!(!query.sql().contains("LIKE"));
    }

    #[test]
    fn popular_sort_is_forum_only() {
        assert_eq!(
            LessonFilter::from_params(&params(&[("sort", "popular")])).sort,
            SortKey::Recent
        );
        let filter = PostFilter::from_params(&params(&[("sort", "popular")]));
        assert_eq!(filter.sort, SortKey::Popular);
        let query = filter.compose("SELECT p.id FROM forum_posts p WHERE p.status = 'active'");
        assert!(query.sql().contains("forum_post_likes"));
    }

    #[test]
    fn blog_list_defaults_to_six_published_rows() {
        let query = BlogFilter::default().compose("SELECT b.id FROM blog_posts b WHERE 1");
        assert!(query.sql().contains("b.is_published = 1"));
        assert_eq!(
            query.bind_values().last(),
            Some(&rusqlite::types::Value::Integer(6))
        );
    }
}
