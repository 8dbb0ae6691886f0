use rust_decimal::Decimal;

use super::{clean_text, ExternalEntity};
use crate::sync::{
    ExternalInvoice, InvoiceRecord, InvoiceStatus, ResolverContext, SyncEntity, SyncRecord,
    TransformError,
};
use crate::utils::dates::parse_optional_date;
use crate::utils::money::{minor_units_to_decimal, optional_minor_units};

/// Nothing outstanding is paid; otherwise any payment makes it partial.
pub fn derive_invoice_status(paid: Decimal, outstanding: Decimal) -> InvoiceStatus {
    if outstanding.is_zero() {
        InvoiceStatus::Paid
    } else if paid > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Unpaid
    }
}

impl ExternalEntity for ExternalInvoice {
    const ENTITY: SyncEntity = SyncEntity::Invoice;

    fn external_id(&self) -> &str {
        &self.id
    }

    fn references(&self) -> Vec<(SyncEntity, &str)> {
        let mut refs = Vec::new();
        if let Some(matter) = &self.matter_ref {
            refs.push((SyncEntity::Case, matter.id.as_str()));
        }
        if let Some(contact) = &self.contact_ref {
            refs.push((SyncEntity::Contact, contact.id.as_str()));
        }
        refs
    }

    fn transform(self, context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        let total = optional_minor_units(self.total);
        let paid = optional_minor_units(self.total_paid);
        let outstanding = match self.total_outstanding {
            Some(value) => minor_units_to_decimal(value),
            None => (total - paid).max(Decimal::ZERO),
        };

        Ok(SyncRecord::Invoice(InvoiceRecord {
            invoice_number: clean_text(self.invoice_number.as_deref()),
            issue_date: parse_optional_date(self.issue_date.as_deref()),
            due_date: parse_optional_date(self.due_date.as_deref()),
            subtotal: optional_minor_units(self.subtotal),
            tax: optional_minor_units(self.tax),
            discount: optional_minor_units(self.discount),
            total,
            paid,
            outstanding,
            status: derive_invoice_status(paid, outstanding),
            case_id: context.resolve_ref(SyncEntity::Case, self.matter_ref.as_ref()),
            contact_id: context.resolve_ref(SyncEntity::Contact, self.contact_ref.as_ref()),
            external_id: self.id,
        }))
    }
}
