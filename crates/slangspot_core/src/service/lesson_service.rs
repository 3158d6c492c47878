//! Lesson and expression use-cases.
//!
//! # Responsibility
//! - Orchestrate fetch, permission check, validation and persistence for
//!   lessons and their expressions.
//! - Resolve the success redirect of each mutation.
//!
//! # Invariants
//! - Permission is checked before validation, so a denied actor learns
//!   nothing about form rules.
//! - Creating an expression requires edit permission on its lesson.

use crate::model::lesson::{Expression, ExpressionForm, Lesson, LessonForm};
use crate::model::record::{EntityKind, RecordId};
use crate::model::user::User;
use crate::permission::{can_delete, can_edit, Capability, ExpressionOwnership};
use crate::repo::lesson_repo::LessonRepository;
use crate::search::{LessonFilter, SearchParams};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::log_soft_delete;
use crate::service::outcome::{RedirectTarget, Saved};
use serde::Serialize;

/// Lesson detail page model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub expressions: Vec<Expression>,
    /// Whether the viewer may edit the lesson (and add expressions).
    pub can_edit: bool,
}

pub struct LessonService<R: LessonRepository> {
    repo: R,
}

impl<R: LessonRepository> LessonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists active lessons matching the parsed list parameters.
    pub fn list_lessons(&self, params: &SearchParams) -> ServiceResult<Vec<Lesson>> {
        Ok(self.repo.list_lessons(&LessonFilter::from_params(params))?)
    }

    pub fn lesson_detail(&self, viewer: Option<&User>, id: RecordId) -> ServiceResult<LessonDetail> {
        let lesson = self.active_lesson(id)?;
        let expressions = self.repo.list_expressions(id)?;
        let can_edit = viewer.is_some_and(|viewer| can_edit(viewer, &lesson));
        Ok(LessonDetail {
            lesson,
            expressions,
            can_edit,
        })
    }

    pub fn create_lesson(&self, actor: &User, form: &LessonForm) -> ServiceResult<Saved<Lesson>> {
        let fields = form.validate()?;
        let lesson = Lesson::new(actor.id, fields);
        let id = self.repo.create_lesson(&lesson)?;
        let stored = self.read_back_lesson(id, "created lesson not found in read-back")?;
        Ok(Saved::new(stored, RedirectTarget::LessonDetail(id)))
    }

    pub fn update_lesson(
        &self,
        actor: &User,
        id: RecordId,
        form: &LessonForm,
    ) -> ServiceResult<Saved<Lesson>> {
        let mut lesson = self.active_lesson(id)?;
        if !can_edit(actor, &lesson) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::Lesson));
        }
        lesson.fields = form.validate()?;
        lesson.meta.touch();
        self.repo.update_lesson(&lesson)?;
        let stored = self.read_back_lesson(id, "updated lesson not found in read-back")?;
        Ok(Saved::new(stored, RedirectTarget::LessonDetail(id)))
    }

    pub fn delete_lesson(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let lesson = self.active_lesson(id)?;
        if !can_delete(actor, &lesson) {
            return Err(ServiceError::forbidden(Capability::Delete, EntityKind::Lesson));
        }
        self.repo.soft_delete_lesson(id)?;
        log_soft_delete(EntityKind::Lesson, id);
        Ok(RedirectTarget::LessonList)
    }

    pub fn create_expression(
        &self,
        actor: &User,
        lesson_id: RecordId,
        form: &ExpressionForm,
    ) -> ServiceResult<Saved<Expression>> {
        let lesson = self.active_lesson(lesson_id)?;
        if !can_edit(actor, &lesson) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::Lesson));
        }
        let expression = Expression::new(Some(lesson_id), form.validate()?);
        let id = self.repo.create_expression(&expression)?;
        let stored = self
            .repo
            .get_expression(id, false)?
            .ok_or(ServiceError::InconsistentState(
                "created expression not found in read-back",
            ))?;
        Ok(Saved::new(stored, RedirectTarget::LessonDetail(lesson_id)))
    }

    pub fn update_expression(
        &self,
        actor: &User,
        id: RecordId,
        form: &ExpressionForm,
    ) -> ServiceResult<Saved<Expression>> {
        let mut expression = self.active_expression(id)?;
        let lesson = self.parent_lesson(&expression)?;
        let ownership = ExpressionOwnership {
            expression: &expression,
            lesson: lesson.as_ref(),
        };
        if !can_edit(actor, &ownership) {
            return Err(ServiceError::forbidden(
                Capability::Edit,
                EntityKind::Expression,
            ));
        }
        expression.fields = form.validate()?;
        expression.meta.touch();
        self.repo.update_expression(&expression)?;
        let redirect = expression_redirect(&expression);
        let stored = self
            .repo
            .get_expression(id, false)?
            .ok_or(ServiceError::InconsistentState(
                "updated expression not found in read-back",
            ))?;
        Ok(Saved::new(stored, redirect))
    }

    pub fn delete_expression(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let expression = self.active_expression(id)?;
        let lesson = self.parent_lesson(&expression)?;
        let ownership = ExpressionOwnership {
            expression: &expression,
            lesson: lesson.as_ref(),
        };
        if !can_delete(actor, &ownership) {
            return Err(ServiceError::forbidden(
                Capability::Delete,
                EntityKind::Expression,
            ));
        }
        self.repo.soft_delete_expression(id)?;
        log_soft_delete(EntityKind::Expression, id);
        Ok(expression_redirect(&expression))
    }

    fn active_lesson(&self, id: RecordId) -> ServiceResult<Lesson> {
        self.repo
            .get_lesson(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Lesson, id))
    }

    fn active_expression(&self, id: RecordId) -> ServiceResult<Expression> {
        self.repo
            .get_expression(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Expression, id))
    }

    /// Ownership survives a soft-deleted lesson, so deleted parents count.
    fn parent_lesson(&self, expression: &Expression) -> ServiceResult<Option<Lesson>> {
        match expression.lesson_id {
            Some(lesson_id) => Ok(self.repo.get_lesson(lesson_id, true)?),
            None => Ok(None),
        }
    }

    fn read_back_lesson(&self, id: RecordId, details: &'static str) -> ServiceResult<Lesson> {
        self.repo
            .get_lesson(id, false)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}

fn expression_redirect(expression: &Expression) -> RedirectTarget {
    match expression.lesson_id {
        Some(lesson_id) => RedirectTarget::LessonDetail(lesson_id),
        None => RedirectTarget::LessonList,
    }
}
