pub mod age_gate;
pub use age_gate::{AgeGate, AgeVerdict, Profile};

pub mod backup;
pub use backup::{BackupService, ExportDocument, ImportError, ImportMode, ImportSummary};

pub mod catalog;
pub use catalog::{CatalogError, CatalogService, DetailOutcome, LookupPath};

pub mod logs;
pub use logs::LogBook;

pub mod reconcile;
pub use reconcile::{IdResolver, Resolution, UnresolvedReason};
