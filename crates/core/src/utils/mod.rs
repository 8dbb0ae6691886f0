//! Small parsing helpers used by the record transformers.

pub mod dates;
pub mod money;
pub mod names;
