use rust_decimal::Decimal;

use super::{clean_text, ExternalEntity};
use crate::sync::{
    ExpenseRecord, ExternalExpense, ResolverContext, SyncEntity, SyncRecord, TransformError,
};
use crate::utils::dates::parse_optional_date;
use crate::utils::money::{minor_units_to_decimal, optional_minor_units};

impl ExternalEntity for ExternalExpense {
    const ENTITY: SyncEntity = SyncEntity::Expense;

    fn external_id(&self) -> &str {
        &self.id
    }

    fn references(&self) -> Vec<(SyncEntity, &str)> {
        let mut refs = Vec::new();
        if let Some(matter) = &self.matter_ref {
            refs.push((SyncEntity::Case, matter.id.as_str()));
        }
        if let Some(user) = &self.user_ref {
            refs.push((SyncEntity::User, user.id.as_str()));
        }
        refs
    }

    fn transform(self, context: &ResolverContext) -> Result<SyncRecord, TransformError> {
        let quantity = self
            .qty
            .filter(|qty| !qty.is_zero())
            .unwrap_or(Decimal::ONE);
        let price = optional_minor_units(self.price);
        let amount = match self.amount {
            Some(value) => minor_units_to_decimal(value),
            None => price.checked_mul(quantity).ok_or_else(|| {
                TransformError::new(
                    SyncEntity::Expense,
                    Some(self.id.as_str()),
                    "price times quantity overflows",
                )
            })?,
        };

        Ok(SyncRecord::Expense(ExpenseRecord {
            description: clean_text(self.description.as_deref()),
            expense_date: parse_optional_date(self.date.as_deref()),
            quantity,
            price,
            amount,
            is_billable: self.is_billable.unwrap_or(true),
            case_id: context.resolve_ref(SyncEntity::Case, self.matter_ref.as_ref()),
            user_id: context.resolve_ref(SyncEntity::User, self.user_ref.as_ref()),
            external_id: self.id,
        }))
    }
}
