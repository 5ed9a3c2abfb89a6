// src/lib.rs
//! Biweekly payroll periods, hours reconciliation and CSV export for the
//! nursery admin backend.

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod payroll_client;
pub mod period;
pub mod period_generator;
pub mod period_picker;
pub mod reconcile;


pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::PayrollError;
pub use export::{build_export_text, export_file_name};
pub use payroll_client::{Lookup, PayrollApiClient, PayrollSummary, SavePayload};
pub use period::{parse_period_id, Period};
pub use period_generator::{build_biweekly_periods, BiweeklySchedule};
pub use period_picker::pick_current_period;
pub use reconcile::{compute_totals, hydrate_row, round2, PayrollRow, PayrollTotals, RawRow};
