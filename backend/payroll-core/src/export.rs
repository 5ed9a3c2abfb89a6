// src/export.rs
use rust_decimal::Decimal;
use tracing::error;

use crate::period::{Period, DATE_FORMAT};
use crate::reconcile::PayrollRow;

pub const PERIOD_HEADER: [&str; 3] = ["start", "end", "label"];
pub const EMPLOYEE_HEADER: [&str; 8] = [
    "employeeId",
    "employeeName",
    "totalHours",
    "cashHourlyRate",
    "hoursPaid",
    "balance",
    "cashPaid",
    "notes",
];

/// File name offered for a period's export.
pub fn export_file_name(period: &Period) -> String {
    format!("payroll_{}.csv", period.id)
}

/// Exported records are one line each, so line breaks in notes become spaces.
fn single_line(notes: &str) -> String {
    notes.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn write_block<I, R>(records: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        for record in records {
            wtr.write_record(record)?;
        }
        wtr.flush()?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn period_block(period: &Period) -> Result<String, csv::Error> {
    let start = period
        .start_date()
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    let end = period
        .end_date()
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    write_block([
        PERIOD_HEADER.map(String::from).to_vec(),
        vec![start, end, period.label.clone()],
    ])
}

fn employee_block(rows: &[PayrollRow]) -> Result<String, csv::Error> {
    let header = EMPLOYEE_HEADER.map(String::from).to_vec();
    let records = rows.iter().map(|row| {
        vec![
            row.employee_id().to_string(),
            row.employee_name().to_string(),
            row.total_hours().normalize().to_string(),
            row.cash_hourly_rate().map(money).unwrap_or_default(),
            row.hours_paid().normalize().to_string(),
            money(row.balance()),
            money(row.cash_paid()),
            single_line(row.notes()),
        ]
    });
    write_block(std::iter::once(header).chain(records))
}

/// CSV text for one period: a period header/value pair, a blank line, then
/// the employee table. An empty row list still yields both headers.
pub fn build_export_text(rows: &[PayrollRow], period: &Period) -> String {
    let blocks = period_block(period).and_then(|head| Ok((head, employee_block(rows)?)));
    match blocks {
        Ok((head, table)) => format!("{}\n{}", head, table),
        Err(e) => {
            // Writing into memory does not fail in practice.
            error!("Failed to build export for period {}: {}", period.id, e);
            String::new()
        }
    }
}
