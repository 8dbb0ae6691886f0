//! Synchronized matter tables: cases, contacts, users, tasks, invoices, expenses.

pub mod model;
mod repository;

pub use repository::SyncRecordRepository;
