//! Results of mutating use-cases.

use crate::model::record::{RecordId, UserId};
use serde::Serialize;

/// Where the caller should send the user after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum RedirectTarget {
    LessonList,
    LessonDetail(RecordId),
    ForumIndex,
    ForumCategories,
    PostDetail(RecordId),
    BlogList,
    BlogDetail(String),
    PracticeList,
    PracticeDetail(RecordId),
    Profile,
    PublicProfile(UserId),
    Notifications,
}

/// A stored record plus its success redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved<T> {
    pub record: T,
    pub redirect: RedirectTarget,
}

impl<T> Saved<T> {
    pub fn new(record: T, redirect: RedirectTarget) -> Self {
        Self { record, redirect }
    }
}
