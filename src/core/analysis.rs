//! Dataset profiling: per-column types and distributions plus dataset-level
//! quality, bias and privacy scores.

use crate::core::{patterns, stats, values};
use crate::domain::model::{
    ColumnProfile, ColumnType, CorrelationMatrix, Dataset, DatasetAnalysis, Distribution,
    Sensitivity,
};
use crate::utils::error::{Result, SynthError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Leading records used to profile each column.
pub const PROFILE_SAMPLE_SIZE: usize = 1000;

/// Share of values that must agree before a column takes a type.
const TYPE_THRESHOLD: f64 = 0.8;
const MAX_CATEGORIES: f64 = 20.0;

pub fn analyze(dataset: &Dataset) -> Result<DatasetAnalysis> {
    if dataset.is_empty() {
        return Err(SynthError::processing("No data to analyze"));
    }

    let columns = profile_columns(dataset);
    let null_percentage = null_percentage(dataset);
    let duplicate_percentage = duplicate_percentage(dataset);
    let outlier_percentage = outlier_percentage(dataset, &columns);
    let bias_score = bias_score(dataset, &columns);
    let privacy_score = privacy_score(&columns);
    let correlations = correlations(dataset, &columns);
    let quality_score = quality_score(null_percentage, duplicate_percentage, outlier_percentage);

    tracing::debug!(
        records = dataset.len(),
        columns = columns.len(),
        quality_score,
        "Dataset analysed"
    );

    Ok(DatasetAnalysis {
        total_records: dataset.len(),
        total_columns: columns.len(),
        columns,
        null_percentage,
        duplicate_percentage,
        outlier_percentage,
        bias_score,
        privacy_score,
        correlations,
        quality_score,
    })
}

fn profile_columns(dataset: &Dataset) -> Vec<ColumnProfile> {
    let sample = &dataset.records[..dataset.len().min(PROFILE_SAMPLE_SIZE)];

    dataset
        .columns
        .iter()
        .map(|name| {
            let present: Vec<&Value> = sample
                .iter()
                .map(|r| r.value(name))
                .filter(|v| !v.is_null())
                .collect();
            let column_type = infer_column_type(&present);
            let nullable = present.len() < sample.len();
            let unique = distinct_count(&present) == present.len();

            let distribution = match column_type {
                ColumnType::Number => distribution(&numeric(present.iter().copied())),
                _ => None,
            };
            let patterns = match column_type {
                ColumnType::String => Some(patterns::detect_patterns(&present)),
                _ => None,
            };

            ColumnProfile {
                name: name.clone(),
                column_type,
                nullable,
                unique,
                distribution,
                patterns,
                sensitivity: patterns::assess_sensitivity(name, &present),
            }
        })
        .collect()
}

pub fn infer_column_type(values: &[&Value]) -> ColumnType {
    if values.is_empty() {
        return ColumnType::String;
    }
    let total = values.len() as f64;
    let share = |pred: fn(&Value) -> bool| values.iter().filter(|v| pred(v)).count() as f64 / total;

    if share(|v| values::as_number(v).is_some()) > TYPE_THRESHOLD {
        return ColumnType::Number;
    }
    if share(values::is_boolean_like) > TYPE_THRESHOLD {
        return ColumnType::Boolean;
    }
    if share(values::is_date_like) > TYPE_THRESHOLD {
        return ColumnType::Date;
    }
    if distinct_count(values) as f64 <= MAX_CATEGORIES.min(total * 0.1) {
        return ColumnType::Categorical;
    }
    ColumnType::String
}

fn distribution(values: &[f64]) -> Option<Distribution> {
    let sorted = stats::sorted(values);
    Some(Distribution {
        mean: stats::mean(&sorted)?,
        median: stats::quantile_sorted(&sorted, 0.5)?,
        standard_deviation: stats::standard_deviation(&sorted)?,
        min: *sorted.first()?,
        max: *sorted.last()?,
        quartiles: [
            stats::quantile_sorted(&sorted, 0.25)?,
            stats::quantile_sorted(&sorted, 0.5)?,
            stats::quantile_sorted(&sorted, 0.75)?,
        ],
    })
}

fn null_percentage(dataset: &Dataset) -> f64 {
    let total_cells = dataset.len() * dataset.columns.len();
    if total_cells == 0 {
        return 0.0;
    }
    let empty_cells = dataset
        .records
        .iter()
        .map(|r| {
            dataset
                .columns
                .iter()
                .filter(|c| values::is_empty_cell(r.value(c)))
                .count()
        })
        .sum::<usize>();
    empty_cells as f64 / total_cells as f64 * 100.0
}

fn duplicate_percentage(dataset: &Dataset) -> f64 {
    if dataset.is_empty() {
        return 0.0;
    }
    let unique_rows: HashSet<String> = dataset
        .records
        .iter()
        .map(|r| Value::Object(r.data.clone()).to_string())
        .collect();
    (dataset.len() - unique_rows.len()) as f64 / dataset.len() as f64 * 100.0
}

/// Share of numeric values outside the 1.5·IQR fences of their column.
fn outlier_percentage(dataset: &Dataset, columns: &[ColumnProfile]) -> f64 {
    let mut outliers = 0usize;
    let mut total = 0usize;

    for column in columns.iter().filter(|c| c.column_type == ColumnType::Number) {
        let values = numeric(dataset.column_values(&column.name));
        let sorted = stats::sorted(&values);
        let (Some(q1), Some(q3)) = (
            stats::quantile_sorted(&sorted, 0.25),
            stats::quantile_sorted(&sorted, 0.75),
        ) else {
            continue;
        };
        let iqr = q3 - q1;
        let (lower, upper) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        outliers += values.iter().filter(|v| **v < lower || **v > upper).count();
        total += values.len();
    }

    if total == 0 {
        0.0
    } else {
        outliers as f64 / total as f64 * 100.0
    }
}

/// Mean absolute skewness of category counts across categorical columns, scaled to 0..=100.
pub fn bias_score<'a>(
    dataset: &Dataset,
    columns: impl IntoIterator<Item = &'a ColumnProfile>,
) -> f64 {
    let categorical: Vec<&ColumnProfile> = columns
        .into_iter()
        .filter(|c| c.column_type == ColumnType::Categorical)
        .collect();
    if categorical.is_empty() {
        return 0.0;
    }

    let total: f64 = categorical
        .iter()
        .map(|column| {
            let counts = category_counts(dataset.column_values(&column.name));
            match stats::variance(&counts) {
                Some(v) if v > 0.0 => stats::sample_skewness(&counts).map(f64::abs).unwrap_or(0.0),
                _ => 0.0,
            }
        })
        .sum();

    (total / categorical.len() as f64 * 20.0).min(100.0)
}

fn privacy_score(columns: &[ColumnProfile]) -> f64 {
    let high = columns.iter().filter(|c| c.sensitivity == Sensitivity::High).count();
    let medium = columns.iter().filter(|c| c.sensitivity == Sensitivity::Medium).count();

    let mut score = 100.0 - high as f64 * 15.0 - medium as f64 * 5.0;
    if columns
        .iter()
        .any(|c| c.unique && c.name.to_lowercase().contains("id"))
    {
        score -= 20.0;
    }
    score.max(0.0)
}

/// Pairwise Pearson correlation over rows where both columns are numeric.
fn correlations(dataset: &Dataset, columns: &[ColumnProfile]) -> CorrelationMatrix {
    let numeric_columns: Vec<&str> = columns
        .iter()
        .filter(|c| c.column_type == ColumnType::Number)
        .map(|c| c.name.as_str())
        .collect();

    let mut matrix: CorrelationMatrix = BTreeMap::new();
    for a in &numeric_columns {
        let row = matrix.entry(a.to_string()).or_default();
        for b in &numeric_columns {
            let value = if a == b {
                1.0
            } else {
                let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
                    .records
                    .iter()
                    .filter_map(|r| Some((values::as_number(r.value(a))?, values::as_number(r.value(b))?)))
                    .unzip();
                stats::sample_correlation(&xs, &ys).unwrap_or(0.0)
            };
            row.insert(b.to_string(), value);
        }
    }
    matrix
}

fn quality_score(null_percentage: f64, duplicate_percentage: f64, outlier_percentage: f64) -> f64 {
    (100.0 - null_percentage * 2.0 - duplicate_percentage * 3.0 - outlier_percentage * 1.5).max(0.0)
}

pub(crate) fn numeric<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<f64> {
    values.filter_map(values::as_number).collect()
}

/// Distinct non-null values in first-seen order.
pub(crate) fn distinct_values<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<&'a Value> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_null())
        .filter(|v| seen.insert(values::identity_key(v)))
        .collect()
}

fn distinct_count(values: &[&Value]) -> usize {
    values
        .iter()
        .map(|v| values::identity_key(v))
        .collect::<HashSet<_>>()
        .len()
}

fn category_counts<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<f64> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values.filter(|v| !v.is_null()) {
        let key = values::identity_key(value);
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }
    order.iter().map(|k| counts[k] as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Pattern, Record};
    use serde_json::json;

    fn dataset(rows: Vec<Value>) -> Dataset {
        Dataset::from_records(
            rows.into_iter()
                .map(|v| match v {
                    Value::Object(map) => Record::from(map),
                    _ => panic!("expected object"),
                })
                .collect(),
        )
    }

    fn customers() -> Dataset {
        let segments = ["gold", "silver", "bronze"];
        let rows = (0..40)
            .map(|i| {
                json!({
                    "customer_id": format!("C{:03}", i),
                    "email": format!("user{}@example.com", i),
                    "age": 20 + (i % 30),
                    "spend": 100.0 + i as f64 * 2.5,
                    "segment": segments[if i < 30 { 0 } else { 1 + i % 2 }],
                    "joined": format!("2023-01-{:02}", 1 + i % 28),
                    "vip": i % 3 == 0,
                })
            })
            .collect();
        dataset(rows)
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = analyze(&Dataset::default()).unwrap_err();
        assert_eq!(err.to_string(), "Data processing error: No data to analyze");
    }

    #[test]
    fn test_column_types_and_profiles() {
        let analysis = analyze(&customers()).unwrap();
        assert_eq!(analysis.total_records, 40);
        assert_eq!(analysis.total_columns, 7);

        let kind = |name: &str| analysis.column(name).unwrap().column_type;
        assert_eq!(kind("customer_id"), ColumnType::String);
        assert_eq!(kind("email"), ColumnType::String);
        assert_eq!(kind("age"), ColumnType::Number);
        assert_eq!(kind("spend"), ColumnType::Number);
        assert_eq!(kind("segment"), ColumnType::Categorical);
        assert_eq!(kind("joined"), ColumnType::Date);
        assert_eq!(kind("vip"), ColumnType::Boolean);

        let email = analysis.column("email").unwrap();
        assert!(email.has_pattern(Pattern::Email));
        assert_eq!(email.sensitivity, Sensitivity::High);
        assert!(email.unique);

        let spend = analysis.column("spend").unwrap();
        let dist = spend.distribution.as_ref().unwrap();
        assert_eq!(dist.min, 100.0);
        assert_eq!(dist.max, 197.5);
        assert!((dist.mean - 148.75).abs() < 1e-9);
        assert!(spend.patterns.is_none());
    }

    #[test]
    fn test_privacy_score_penalties() {
        let analysis = analyze(&customers()).unwrap();
        // email is high (-15), age is medium (-5), customer_id is a unique id (-20).
        assert_eq!(analysis.privacy_score, 60.0);
    }

    #[test]
    fn test_null_and_duplicate_percentages() {
        let data = dataset(vec![
            json!({"a": 1, "b": ""}),
            json!({"a": 1, "b": ""}),
            json!({"a": null, "b": "x"}),
            json!({"a": 2}),
        ]);
        let analysis = analyze(&data).unwrap();
        // 4 empty cells out of 8: two "", one null, one missing.
        assert_eq!(analysis.null_percentage, 50.0);
        assert_eq!(analysis.duplicate_percentage, 25.0);
        assert_eq!(
            analysis.quality_score,
            (100.0 - 50.0 * 2.0 - 25.0 * 3.0 - analysis.outlier_percentage * 1.5).max(0.0)
        );
        assert!(analysis.column("a").unwrap().nullable);
    }

    #[test]
    fn test_outliers_use_iqr_fences() {
        let mut rows: Vec<Value> = (1..=19).map(|i| json!({"v": i})).collect();
        rows.push(json!({"v": 1000}));
        let analysis = analyze(&dataset(rows)).unwrap();
        assert_eq!(analysis.outlier_percentage, 5.0);
    }

    #[test]
    fn test_correlations_are_pairwise() {
        let rows = (0..10)
            .map(|i| json!({"x": i, "y": i * 2, "z": 10 - i}))
            .collect();
        let analysis = analyze(&dataset(rows)).unwrap();
        let corr = &analysis.correlations;
        assert_eq!(corr["x"]["x"], 1.0);
        assert!((corr["x"]["y"] - 1.0).abs() < 1e-9);
        assert!((corr["x"]["z"] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bias_score_reflects_skewed_categories() {
        let analysis = analyze(&customers()).unwrap();
        // Counts 30/5/5 give skewness sqrt(3); scaled by 20.
        assert!((analysis.bias_score - 3f64.sqrt() * 20.0).abs() < 1e-9);

        let balanced = dataset(
            (0..30)
                .map(|i| json!({"k": (["a", "b", "c"][i % 3])}))
                .collect(),
        );
        assert_eq!(analyze(&balanced).unwrap().bias_score, 0.0);
    }

    #[test]
    fn test_numeric_strings_count_as_numbers() {
        let rows = (0..10).map(|i| json!({"n": i.to_string()})).collect();
        let analysis = analyze(&dataset(rows)).unwrap();
        let column = analysis.column("n").unwrap();
        assert_eq!(column.column_type, ColumnType::Number);
        assert_eq!(column.distribution.as_ref().unwrap().max, 9.0);
    }
}
