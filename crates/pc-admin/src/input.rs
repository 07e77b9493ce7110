//! CSV input readers.
//!
//! Inputs are plain CSV files with a header row. Blank cells are skipped.

use std::path::Path;

use crate::error::{Error, ErrorKind, Result};
use crate::types::AzureSubscription;

/// Read every non-blank value of `column`, in file order.
pub fn read_column(path: impl AsRef<Path>, column: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(format!(
                "{} has no column named {column}",
                path.display()
            )))
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(index).map(str::trim).filter(|v| !v.is_empty()) {
            values.push(value.to_string());
        }
    }

    tracing::debug!(path = %path.display(), column, count = values.len(), "read input column");
    Ok(values)
}

/// Read `subscription_id` / `prisma_name` rows.
pub fn read_azure_subscriptions(path: impl AsRef<Path>) -> Result<Vec<AzureSubscription>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut subscriptions = Vec::new();
    for row in reader.deserialize::<AzureSubscription>() {
        let row = row?;
        if row.subscription_id.is_empty() {
            continue;
        }
        subscriptions.push(row);
    }

    tracing::debug!(path = %path.display(), count = subscriptions.len(), "read subscriptions");
    Ok(subscriptions)
}
