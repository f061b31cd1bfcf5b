//! Fallback generation driven only by column names.
//!
//! Used when a job brings neither source rows nor a catalogue dataset, so
//! there is nothing to profile. Each value is chosen by the first keyword
//! the column name contains.

use crate::core::generator::FIRST_NAMES;
use crate::core::stats::round_to;
use crate::domain::model::{Dataset, Record};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

pub struct HeuristicGenerator {
    rng: StdRng,
    data_type: String,
}

impl HeuristicGenerator {
    pub fn new(data_type: impl Into<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            data_type: data_type.into(),
        }
    }

    /// `missing_data` is the percent chance that one random column of a
    /// record is nulled.
    pub fn generate(&mut self, columns: &[String], record_count: usize, missing_data: f64) -> Dataset {
        let mut records = Vec::with_capacity(record_count);
        for index in 0..record_count {
            let mut record = Record::new();
            for column in columns {
                let value = self.value_for(column, index);
                record.insert(column.clone(), value);
            }

            if !columns.is_empty() && self.rng.gen::<f64>() < missing_data / 100.0 {
                let victim = &columns[self.rng.gen_range(0..columns.len())];
                record.insert(victim.clone(), Value::Null);
            }
            records.push(record);
        }

        tracing::debug!(
            "Generated {} heuristic records for data type '{}'",
            record_count,
            self.data_type
        );
        Dataset::new(columns.to_vec(), records)
    }

    fn value_for(&mut self, column: &str, index: usize) -> Value {
        let name = column.to_lowercase();

        if name.contains("id") {
            let prefix: String = self.data_type.chars().take(3).collect();
            return json!(format!("SYN_{}_{:08}", prefix.to_uppercase(), index + 1));
        }
        if name.contains("name") {
            return json!(FIRST_NAMES[index % FIRST_NAMES.len()]);
        }
        if name.contains("email") {
            return json!(format!("user{:06}@example.com", index + 1));
        }
        if name.contains("age") {
            return json!(self.rng.gen_range(18..98));
        }
        if name.contains("amount") || name.contains("price") {
            return json!(round_to(self.rng.gen::<f64>() * 10_000.0 + 100.0, 2));
        }
        if name.contains("date") || name.contains("time") {
            let days_ago = self.rng.gen_range(0..365);
            let date = Utc::now().date_naive() - Duration::days(days_ago);
            return json!(date.format("%Y-%m-%d").to_string());
        }
        json!(format!("{}_{:06}", column, index + 1))
    }
}
