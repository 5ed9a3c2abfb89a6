// src/reconcile.rs
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One employee's summary row as decoded from the backend. Every field is kept
/// as raw JSON so that one malformed row cannot fail the whole summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    #[serde(default)]
    pub employee_id: Value,
    #[serde(default)]
    pub employee_name: Value,
    #[serde(default)]
    pub total_hours: Value,
    #[serde(default)]
    pub cash_hourly_rate: Value,
    #[serde(default)]
    pub hours_paid: Value,
    #[serde(default)]
    pub notes: Value,
}

/// Reconciled payroll line. `balance` and `cash_paid` are derived and only
/// change through the setters, which recompute them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRow {
    employee_id: String,
    employee_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    total_hours: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    cash_hourly_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    hours_paid: Decimal,
    notes: String,
    #[serde(with = "rust_decimal::serde::float")]
    balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    cash_paid: Decimal,
}

/// What gets written back on save. Derived fields never leave the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRow {
    pub employee_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub hours_paid: Decimal,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_hours: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_bal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cash_paid: Decimal,
}

/// Rounds to cents, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Numbers and numeric strings become decimals; anything else is `None`.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn text_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl PayrollRow {
    pub fn new(
        employee_id: impl Into<String>,
        employee_name: impl Into<String>,
        total_hours: Decimal,
        cash_hourly_rate: Option<Decimal>,
        hours_paid: Decimal,
        notes: impl Into<String>,
    ) -> Self {
        let mut row = Self {
            employee_id: employee_id.into(),
            employee_name: employee_name.into(),
            total_hours,
            cash_hourly_rate,
            hours_paid,
            notes: notes.into(),
            balance: Decimal::ZERO,
            cash_paid: Decimal::ZERO,
        };
        row.recompute();
        row
    }

    fn recompute(&mut self) {
        self.balance = match self.total_hours.checked_sub(self.hours_paid) {
            Some(balance) => round2(balance),
            None => {
                warn!(
                    "Balance overflow for employee {} ({} h worked, {} h paid), using 0",
                    self.employee_id, self.total_hours, self.hours_paid
                );
                Decimal::ZERO
            }
        };
        self.cash_paid = match self.cash_hourly_rate {
            Some(rate) => match self.hours_paid.checked_mul(rate) {
                Some(amount) => round2(amount),
                None => {
                    warn!(
                        "Cash pay overflow for employee {} ({} h at {}), using 0",
                        self.employee_id, self.hours_paid, rate
                    );
                    Decimal::ZERO
                }
            },
            None => Decimal::ZERO,
        };
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn total_hours(&self) -> Decimal {
        self.total_hours
    }

    pub fn cash_hourly_rate(&self) -> Option<Decimal> {
        self.cash_hourly_rate
    }

    pub fn hours_paid(&self) -> Decimal {
        self.hours_paid
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// `total_hours - hours_paid`, rounded to cents. Negative means overpaid.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn cash_paid(&self) -> Decimal {
        self.cash_paid
    }

    pub fn set_hours_paid(&mut self, hours_paid: Decimal) {
        self.hours_paid = hours_paid;
        self.recompute();
    }

    pub fn set_cash_hourly_rate(&mut self, rate: Option<Decimal>) {
        self.cash_hourly_rate = rate;
        self.recompute();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn to_save_row(&self) -> SaveRow {
        SaveRow {
            employee_id: self.employee_id.clone(),
            hours_paid: self.hours_paid,
            notes: self.notes.clone(),
        }
    }
}

/// Turns a backend row into a reconciled one. Never fails: unreadable hours
/// count as 0 and an unreadable rate as "no rate".
pub fn hydrate_row(raw: &RawRow) -> PayrollRow {
    let total_hours = decimal_from_value(&raw.total_hours).unwrap_or(Decimal::ZERO);
    let hours_paid = decimal_from_value(&raw.hours_paid).unwrap_or(Decimal::ZERO);
    let cash_hourly_rate = decimal_from_value(&raw.cash_hourly_rate);

    PayrollRow::new(
        text_from_value(&raw.employee_id),
        text_from_value(&raw.employee_name),
        total_hours,
        cash_hourly_rate,
        hours_paid,
        text_from_value(&raw.notes),
    )
}

pub fn hydrate_rows(raw_rows: &[RawRow]) -> Vec<PayrollRow> {
    raw_rows.iter().map(hydrate_row).collect()
}

fn checked_total(mut values: impl Iterator<Item = Decimal>, what: &str) -> Decimal {
    values
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .unwrap_or_else(|| {
            warn!("Payroll {} total overflows, using 0", what);
            Decimal::ZERO
        })
}

/// Sums the raw hours first and rounds the balance once; the per-row rounded
/// balances are not summed. A total that overflows is reported as 0.
pub fn compute_totals(rows: &[PayrollRow]) -> PayrollTotals {
    let total_hours = checked_total(rows.iter().map(|r| r.total_hours), "hours");
    let total_paid = checked_total(rows.iter().map(|r| r.hours_paid), "hours paid");
    let total_cash_paid = checked_total(rows.iter().map(|r| r.cash_paid), "cash paid");
    let total_bal = match total_hours.checked_sub(total_paid) {
        Some(balance) => round2(balance),
        None => {
            warn!(
                "Payroll balance total overflows ({} h worked, {} h paid), using 0",
                total_hours, total_paid
            );
            Decimal::ZERO
        }
    };

    PayrollTotals {
        total_hours,
        total_paid,
        total_bal,
        total_cash_paid,
    }
}
