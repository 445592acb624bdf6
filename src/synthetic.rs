//! Synthetic credit-card transactions for demos and tests

use crate::error::Result;
use crate::types::{Table, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp1, StandardNormal};
use tracing::info;

/// Number of anonymized `V*` components
pub const ANONYMIZED_FEATURES: usize = 28;
/// Fraud label column of generated tables
pub const LABEL_COLUMN: &str = "Class";

const SECONDS_PER_DAY: u32 = 86_400;
const MEAN_AMOUNT: f64 = 100.0;

/// Generator settings
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub rows: usize,
    /// Probability that a row is labelled fraud
    pub fraud_ratio: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 5000,
            fraud_ratio: 0.02,
            seed: 42,
        }
    }
}

/// Column header of generated tables
pub fn columns() -> Vec<String> {
    let mut columns = vec!["Time".to_string(), "Amount".to_string()];
    columns.extend((1..=ANONYMIZED_FEATURES).map(|i| format!("V{}", i)));
    columns.extend(
        [LABEL_COLUMN, "Hour", "DayOfWeek", "IsWeekend", "AmountCategory"]
            .iter()
            .map(|c| c.to_string()),
    );
    columns
}

/// Bucket an amount into Low / Medium / High / VeryHigh
pub fn amount_category(amount: f64) -> &'static str {
    if amount <= 50.0 {
        "Low"
    } else if amount <= 200.0 {
        "Medium"
    } else if amount <= 500.0 {
        "High"
    } else {
        "VeryHigh"
    }
}

/// Generate a shuffled, imbalanced transactions table.
///
/// Labels are drawn independently of the features, so the table exercises
/// the pipeline without being learnable.
pub fn generate_transactions(config: &SyntheticConfig) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut rows: Vec<Vec<Value>> = (0..config.rows)
        .map(|_| {
            let time = rng.gen_range(0..SECONDS_PER_DAY);
            let amount = (rng.sample::<f64, _>(Exp1) * MEAN_AMOUNT * 100.0).round() / 100.0;

            let mut row = Vec::with_capacity(ANONYMIZED_FEATURES + 7);
            row.push(Value::Number(f64::from(time)));
            row.push(Value::Number(amount));
            for _ in 0..ANONYMIZED_FEATURES {
                row.push(Value::Number(rng.sample(StandardNormal)));
            }

            let fraud = rng.gen_bool(config.fraud_ratio);
            let day = rng.gen_range(0..7u32);
            row.push(Value::Number(if fraud { 1.0 } else { 0.0 }));
            row.push(Value::Number(f64::from(time / 3600 % 24)));
            row.push(Value::Number(f64::from(day)));
            row.push(Value::Number(if day >= 5 { 1.0 } else { 0.0 }));
            row.push(amount_category(amount).into());
            row
        })
        .collect();

    rows.shuffle(&mut rng);

    let table = Table::from_rows(columns(), rows)?;

    info!(
        rows = table.len(),
        seed = config.seed,
        "Synthetic transactions generated"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SyntheticConfig {
        SyntheticConfig {
            rows: 500,
            fraud_ratio: 0.1,
            seed: 7,
        }
    }

    #[test]
    fn test_shape_and_header() {
        let table = generate_transactions(&small()).unwrap();
        assert_eq!(table.len(), 500);
        assert_eq!(table.columns().len(), 35);
        assert_eq!(table.columns()[2], "V1");
        assert_eq!(table.columns()[29], "V28");
        assert_eq!(table.columns()[34], "AmountCategory");
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let first = generate_transactions(&small()).unwrap();
        let second = generate_transactions(&small()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_engineered_columns_consistent() {
        let table = generate_transactions(&small()).unwrap();
        let labels = table.labels("Class").unwrap();
        let positives = labels.iter().filter(|&&y| y == 1).count();
        assert!(positives > 20 && positives < 90, "positives = {}", positives);

        for row in table.rows() {
            let time = row[0].as_number().unwrap();
            let amount = row[1].as_number().unwrap();
            let hour = row[31].as_number().unwrap();
            let day = row[32].as_number().unwrap();
            let weekend = row[33].as_number().unwrap();

            assert!((0.0..86_400.0).contains(&time));
            assert!(amount >= 0.0);
            assert_eq!(hour, (time / 3600.0).floor() % 24.0);
            assert_eq!(weekend, if day >= 5.0 { 1.0 } else { 0.0 });
            assert_eq!(row[34], Value::from(amount_category(amount)));
        }
    }

    #[test]
    fn test_amount_category_bounds() {
        assert_eq!(amount_category(0.0), "Low");
        assert_eq!(amount_category(50.0), "Low");
        assert_eq!(amount_category(50.01), "Medium");
        assert_eq!(amount_category(200.0), "Medium");
        assert_eq!(amount_category(500.0), "High");
        assert_eq!(amount_category(500.01), "VeryHigh");
    }
}
