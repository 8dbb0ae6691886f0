use super::{clean_text, ExternalEntity};
use crate::sync::{
    ContactKind, ContactRecord, ExternalContact, ExternalRef, ResolverContext, SyncEntity,
    SyncRecord, TransformError,
};
use crate::utils::names::{is_organization_name, split_display_name};

/// Classify a contact's account reference.
///
/// Returns the company name when the account is an organization, `None`
/// (an individual) otherwise or when there is no account.
pub fn classify_account(account: Option<&ExternalRef>) -> (ContactKind, Option<String>) {
    let name = account.and_then(|a| clean_text(a.display_name.as_deref()));
    match name {
        Some(name) if is_organization_name(&name) => (ContactKind::Organization, Some(name)),
        _ => (ContactKind::Individual, None),
    }
}

impl ExternalEntity for ExternalContact {
    const ENTITY: SyncEntity = SyncEntity::Contact;

    fn external_id(&self) -> &str {
        &self.id
    }

    fn transform(self, _context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        let first = clean_text(self.first_name.as_deref());
        let last = clean_text(self.last_name.as_deref());
        let (first_name, last_name) = if first.is_some() || last.is_some() {
            (first.unwrap_or_default(), last.unwrap_or_default())
        } else {
            split_display_name(self.display_name.as_deref().unwrap_or_default())
        };
        let (kind, company) = classify_account(self.account_ref.as_ref());

        Ok(SyncRecord::Contact(ContactRecord {
            first_name,
            last_name,
            email: clean_text(self.email.as_deref()).map(|e| e.to_lowercase()),
            phone: clean_text(self.phone_mobile.as_deref())
                .or_else(|| clean_text(self.phone_work.as_deref())),
            company,
            kind,
            external_id: self.id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform_contact(value: serde_json::Value) -> ContactRecord {
        let contact: ExternalContact = serde_json::from_value(value).expect("contact");
        match contact.transform(&ResolverContext::empty()).expect("transform") {
            SyncRecord::Contact(record) => record,
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn organization_account_populates_company() {
        let record = transform_contact(serde_json::json!({
            "id": "c-1",
            "display_name": "Wile Coyote",
            "account_ref": { "id": "a-1", "display_name": "Acme LLC" }
        }));

        assert_eq!(record.kind, ContactKind::Organization);
        assert_eq!(record.company.as_deref(), Some("Acme LLC"));
        assert_eq!(record.first_name, "Wile");
        assert_eq!(record.last_name, "Coyote");
    }

    #[test]
    fn person_account_is_individual() {
        let record = transform_contact(serde_json::json!({
            "id": "c-2",
            "display_name": "John Smith",
            "account_ref": { "id": "a-2", "display_name": "John Smith" }
        }));

        assert_eq!(record.kind, ContactKind::Individual);
        assert_eq!(record.company, None);
    }

    #[test]
    fn discrete_name_fields_win_over_display_name() {
        let record = transform_contact(serde_json::json!({
            "id": "c-3",
            "display_name": "Dr. J. R. Smith",
            "first_name": "Jane",
            "email": " Jane@Example.COM ",
            "phone_work": "555-0100"
        }));

        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.last_name, "");
        assert_eq!(record.email.as_deref(), Some("jane@example.com"));
        assert_eq!(record.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn single_token_display_name_is_first_name() {
        let record = transform_contact(serde_json::json!({ "id": "c-4", "display_name": "Prince" }));
        assert_eq!(record.first_name, "Prince");
        assert_eq!(record.last_name, "");
    }

    #[test]
    fn classify_without_account_is_individual() {
        assert_eq!(classify_account(None), (ContactKind::Individual, None));
    }
}
