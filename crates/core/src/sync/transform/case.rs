use super::{clean_text, ExternalEntity};
use crate::sync::{
    CaseRecord, CaseStatus, ExternalMatter, ResolverContext, SyncEntity, SyncRecord,
    TransformError,
};
use crate::utils::dates::parse_optional_date;

/// Map an external matter status onto the internal vocabulary.
///
/// `closed` becomes `completed`, `open` and `active` become `active`, and
/// anything else (including no status) is `pending`. Case-insensitive.
pub fn map_case_status(status: Option<&str>) -> CaseStatus {
    match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("closed") => CaseStatus::Completed,
        Some("open") | Some("active") => CaseStatus::Active,
        _ => CaseStatus::Pending,
    }
}

impl ExternalEntity for ExternalMatter {
    const ENTITY: SyncEntity = SyncEntity::Case;

    fn external_id(&self) -> &str {
        &self.id
    }

    fn transform(self, _context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        let case_number = clean_text(self.number.as_deref());
        let title = clean_text(self.display_name.as_deref())
            .or_else(|| case_number.clone())
            .ok_or_else(|| {
                TransformError::new(
                    SyncEntity::Case,
                    Some(self.id.as_str()),
                    "matter has neither a display name nor a number",
                )
            })?;

        Ok(SyncRecord::Case(CaseRecord {
            status: map_case_status(self.status.as_deref()),
            title,
            case_number,
            description: clean_text(self.notes.as_deref()),
            practice_area: clean_text(self.practice_area.as_deref()),
            open_date: parse_optional_date(self.open_date.as_deref()),
            close_date: parse_optional_date(self.close_date.as_deref()),
            external_id: self.id,
        }))
    }
}
