use super::{clean_text, ExternalEntity};
use crate::sync::{ExternalUser, ResolverContext, SyncEntity, SyncRecord, TransformError, UserRecord};
use crate::utils::names::split_display_name;

impl ExternalEntity for ExternalUser {
    const ENTITY: SyncEntity = SyncEntity::User;

    fn external_id(&self) -> &str {
        &self.id
    }

    /// Users are linked by email, so a user without one cannot be mapped.
    fn transform(self, _context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        let email = clean_text(self.email.as_deref())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                TransformError::new(SyncEntity::User, Some(self.id.as_str()), "user has no email")
            })?;

        let mut first_name = clean_text(self.first_name.as_deref());
        let mut last_name = clean_text(self.last_name.as_deref());
        if first_name.is_none() && last_name.is_none() {
            if let Some(display_name) = clean_text(self.display_name.as_deref()) {
                let (first, last) = split_display_name(&display_name);
                first_name = Some(first).filter(|s| !s.is_empty());
                last_name = Some(last).filter(|s| !s.is_empty());
            }
        }

        Ok(SyncRecord::User(UserRecord {
            external_id: self.id,
            email,
            first_name,
            last_name,
        }))
    }
}
