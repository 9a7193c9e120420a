use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;
use tracing::debug;

use crate::error::{Result, SpyError};
use crate::models::Transaction;

/// Maps each distinct description to an integer code. Codes follow the sorted
/// order of the distinct descriptions seen in one batch, so identical
/// descriptions share a code; the numbers mean nothing across batches.
#[derive(Debug, Clone, Default)]
pub struct MerchantEncoder {
    codes: HashMap<String, usize>,
}

impl MerchantEncoder {
    pub fn fit(rows: &[Transaction]) -> Self {
        let distinct: BTreeSet<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, desc)| (desc.to_string(), code))
            .collect();
        Self { codes }
    }

    pub fn code(&self, description: &str) -> Option<usize> {
        self.codes.get(description).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Build the `(rows x 2)` feature matrix: column 0 is the merchant code,
/// column 1 the amount.
pub fn encode_features(rows: &[Transaction]) -> Result<Array2<f64>> {
    let encoder = MerchantEncoder::fit(rows);
    let mut data = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        let code = encoder
            .code(&row.description)
            .ok_or_else(|| SpyError::Other(format!("unencoded merchant: {}", row.description)))?;
        data.push(code as f64);
        data.push(row.amount);
    }
    debug!(rows = rows.len(), merchants = encoder.len(), "encoded features");
    Array2::from_shape_vec((rows.len(), 2), data).map_err(|e| SpyError::Other(e.to_string()))
}
