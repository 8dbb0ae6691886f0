use super::{clean_text, ExternalEntity};
use crate::sync::{
    ExternalTask, ResolverContext, SyncEntity, SyncRecord, TaskRecord, TaskStatus, TransformError,
};
use crate::utils::dates::parse_optional_date;

const DEFAULT_TASK_PRIORITY: &str = "normal";
const UNTITLED_TASK: &str = "Untitled task";

/// Exactly `Completed` is completed; everything else, including no status, is pending.
pub fn map_task_status(status: Option<&str>) -> TaskStatus {
    match status {
        Some("Completed") => TaskStatus::Completed,
        _ => TaskStatus::Pending,
    }
}

/// Lower-cased priority, `normal` when absent or blank.
pub fn map_task_priority(priority: Option<&str>) -> String {
    clean_text(priority)
        .map(|p| p.to_lowercase())
        .unwrap_or_else(|| DEFAULT_TASK_PRIORITY.to_string())
}

impl ExternalEntity for ExternalTask {
    const ENTITY: SyncEntity = SyncEntity::Task;

    fn external_id(&self) -> &str {
        &self.id
    }

    fn references(&self) -> Vec<(SyncEntity, &str)> {
        let mut refs = Vec::new();
        if let Some(matter) = &self.matter_ref {
            refs.push((SyncEntity::Case, matter.id.as_str()));
        }
        if let Some(user) = self.assigned_to_users.first() {
            refs.push((SyncEntity::User, user.id.as_str()));
        }
        refs
    }

    fn transform(self, context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        Ok(SyncRecord::Task(TaskRecord {
            title: clean_text(self.subject.as_deref()).unwrap_or_else(|| UNTITLED_TASK.to_string()),
            description: clean_text(self.notes.as_deref()),
            status: map_task_status(self.status.as_deref()),
            priority: map_task_priority(self.priority.as_deref()),
            due_date: parse_optional_date(self.due_date.as_deref()),
            case_id: context.resolve_ref(SyncEntity::Case, self.matter_ref.as_ref()),
            assigned_user_id: context.resolve_ref(SyncEntity::User, self.assigned_to_users.first()),
            external_id: self.id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform_task(value: serde_json::Value, context: &ResolverContext) -> TaskRecord {
        let task: ExternalTask = serde_json::from_value(value).expect("task");
        match task.transform(context).expect("transform") {
            SyncRecord::Task(record) => record,
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(map_task_status(Some("Completed")), TaskStatus::Completed);
        assert_eq!(map_task_status(Some("NotCompleted")), TaskStatus::Pending);
        assert_eq!(map_task_status(Some("In Progress")), TaskStatus::Pending);
        assert_eq!(map_task_status(Some("completed")), TaskStatus::Pending);
        assert_eq!(map_task_status(Some("COMPLETED")), TaskStatus::Pending);
        assert_eq!(map_task_status(Some(" Completed ")), TaskStatus::Pending);
        assert_eq!(map_task_status(None), TaskStatus::Pending);
    }

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(map_task_priority(Some("High")), "high");
        assert_eq!(map_task_priority(Some(" ")), "normal");
        assert_eq!(map_task_priority(None), "normal");
    }

    #[test]
    fn resolved_references_become_internal_ids() {
        let mut context = ResolverContext::empty();
        context.insert(SyncEntity::Case, "m-1", 11);
        context.insert(SyncEntity::User, "u-1", 3);

        let record = transform_task(
            serde_json::json!({
                "id": "t-1",
                "subject": "File motion",
                "status": "Completed",
                "matter_ref": { "id": "m-1" },
                "assigned_to_users": [{ "id": "u-1" }, { "id": "u-2" }]
            }),
            &context,
        );

        assert_eq!(record.case_id, Some(11));
        assert_eq!(record.assigned_user_id, Some(3));
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.priority, "normal");
    }

    #[test]
    fn unresolved_case_reference_is_null_not_dropped() {
        let record = transform_task(
            serde_json::json!({
                "id": "t-2",
                "subject": "Call client",
                "matter_ref": { "id": "m-unknown" }
            }),
            &ResolverContext::empty(),
        );

        assert_eq!(record.external_id, "t-2");
        assert_eq!(record.case_id, None);
        assert_eq!(record.status, TaskStatus::Pending);
    }

    #[test]
    fn references_include_case_and_first_assignee() {
        let task: ExternalTask = serde_json::from_value(serde_json::json!({
            "id": "t-3",
            "matter_ref": { "id": "m-9" },
            "assigned_to_users": [{ "id": "u-7" }]
        }))
        .expect("task");

        assert_eq!(
            task.references(),
            vec![(SyncEntity::Case, "m-9"), (SyncEntity::User, "u-7")]
        );
    }
}
