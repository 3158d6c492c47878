//! Practice use-cases. Practices are private to their owner.

use crate::model::practice::{Practice, PracticeForm};
use crate::model::record::{EntityKind, RecordId};
use crate::model::user::User;
use crate::permission::{can_delete, can_edit, Capability};
use crate::repo::practice_repo::PracticeRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::log_soft_delete;
use crate::service::outcome::{RedirectTarget, Saved};

pub struct PracticeService<P: PracticeRepository> {
    repo: P,
}

impl<P: PracticeRepository> PracticeService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    /// The actor's own active practices, newest first.
    pub fn list_own(
        &self,
        actor: &User,
        limit: Option<u32>,
        offset: u32,
    ) -> ServiceResult<Vec<Practice>> {
        Ok(self.repo.list_practices(actor.id, limit, offset)?)
    }

    /// Viewing requires the same ownership as editing.
    pub fn practice_detail(&self, actor: &User, id: RecordId) -> ServiceResult<Practice> {
        let practice = self.active(id)?;
        if !can_edit(actor, &practice) {
            return Err(ServiceError::Forbidden {
                message: "You do not have permission to view this practice.".to_string(),
            });
        }
        Ok(practice)
    }

    pub fn create_practice(
        &self,
        actor: &User,
        form: &PracticeForm,
    ) -> ServiceResult<Saved<Practice>> {
        let practice = Practice::new(actor.id, form.validate()?);
        self.repo.create_practice(&practice)?;
        Ok(Saved::new(practice, RedirectTarget::PracticeList))
    }

    pub fn update_practice(
        &self,
        actor: &User,
        id: RecordId,
        form: &PracticeForm,
    ) -> ServiceResult<Saved<Practice>> {
        let mut practice = self.active(id)?;
        if !can_edit(actor, &practice) {
            return Err(ServiceError::forbidden(Capability::Edit, EntityKind::Practice));
        }
        practice.fields = form.validate()?;
        practice.meta.touch();
        self.repo.update_practice(&practice)?;
        Ok(Saved::new(practice, RedirectTarget::PracticeList))
    }

    pub fn delete_practice(&self, actor: &User, id: RecordId) -> ServiceResult<RedirectTarget> {
        let practice = self.active(id)?;
        if !can_delete(actor, &practice) {
            return Err(ServiceError::forbidden(Capability::Delete, EntityKind::Practice));
        }
        self.repo.soft_delete_practice(id)?;
        log_soft_delete(EntityKind::Practice, id);
        Ok(RedirectTarget::PracticeList)
    }

    fn active(&self, id: RecordId) -> ServiceResult<Practice> {
        self.repo
            .get_practice(id, false)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Practice, id))
    }
}
