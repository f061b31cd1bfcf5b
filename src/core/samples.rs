//! Built-in sample datasets for trying generation without an upload.

use crate::core::stats::round_to;
use crate::domain::model::{Dataset, Record};
use crate::utils::error::{Result, SynthError};
use chrono::{Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct SampleDataset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub columns: &'static [&'static str],
    /// Nominal size shown in the catalogue; generation takes its own count.
    pub record_count: usize,
    pub category: &'static str,
}

pub const SAMPLE_DATASETS: &[SampleDataset] = &[
    SampleDataset {
        id: "customer_demographics",
        name: "Customer Demographics",
        description: "Sample customer data with demographics and preferences",
        columns: &[
            "customer_id", "first_name", "last_name", "email", "age", "gender", "city", "country",
            "income", "segment",
        ],
        record_count: 10_000,
        category: "Customer Data",
    },
    SampleDataset {
        id: "financial_transactions",
        name: "Financial Transactions",
        description: "Sample financial transaction data",
        columns: &[
            "transaction_id", "account_id", "amount", "currency", "merchant", "category",
            "timestamp", "status",
        ],
        record_count: 50_000,
        category: "Financial Data",
    },
    SampleDataset {
        id: "healthcare_records",
        name: "Healthcare Records",
        description: "Sample healthcare patient data (anonymized)",
        columns: &[
            "patient_id", "age", "gender", "diagnosis", "treatment", "admission_date",
            "discharge_date", "cost",
        ],
        record_count: 25_000,
        category: "Healthcare Data",
    },
    SampleDataset {
        id: "ecommerce_orders",
        name: "E-commerce Orders",
        description: "Sample e-commerce order and product data",
        columns: &[
            "order_id", "customer_id", "product_id", "quantity", "price", "discount", "order_date",
            "shipping_address",
        ],
        record_count: 75_000,
        category: "E-commerce Data",
    },
    SampleDataset {
        id: "iot_sensors",
        name: "IoT Sensors",
        description: "Sample IoT sensor data with device metrics and environmental readings",
        columns: &[
            "sensor_id", "device_type", "location", "timestamp", "temperature", "humidity",
            "pressure", "battery_level", "signal_strength", "status",
        ],
        record_count: 100_000,
        category: "IoT Data",
    },
];

const FIRST_NAMES: &[&str] = &["John", "Jane", "Mike", "Sarah", "David", "Lisa", "Alex", "Emma"];
const LAST_NAMES: &[&str] = &["Smith", "Johnson", "Williams", "Brown", "Jones"];
const GENDERS: &[&str] = &["Male", "Female", "Other"];
const CITIES: &[&str] = &["New York", "Los Angeles", "Chicago", "Houston", "Phoenix"];
const COUNTRIES: &[&str] = &["USA", "Canada", "UK", "Germany", "France"];
const DEVICE_TYPES: &[&str] = &[
    "Temperature Sensor",
    "Humidity Sensor",
    "Pressure Sensor",
    "Motion Detector",
    "Air Quality Monitor",
    "Smart Thermostat",
];
const LOCATIONS: &[&str] = &[
    "Building A - Floor 1",
    "Building A - Floor 2",
    "Building B - Floor 1",
    "Building B - Floor 2",
    "Warehouse",
    "Parking Lot",
    "Server Room",
    "Conference Room",
];
const STATUSES: &[&str] = &["Online", "Offline", "Maintenance", "Error"];

pub fn find_sample(id: &str) -> Option<&'static SampleDataset> {
    SAMPLE_DATASETS.iter().find(|d| d.id == id)
}

/// Generates `record_count` rows of a catalogue dataset.
pub fn generate_sample_data(id: &str, record_count: usize, seed: Option<u64>) -> Result<Dataset> {
    let dataset = find_sample(id)
        .ok_or_else(|| SynthError::validation(format!("Dataset not found: {}", id)))?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let now = Utc::now();

    let records = (0..record_count)
        .map(|i| {
            let mut record = Record::new();
            for column in dataset.columns {
                record.insert(*column, sample_value(column, i, &mut rng, now));
            }
            record
        })
        .collect();

    tracing::debug!("Generated {} rows of sample dataset {}", record_count, id);
    Ok(Dataset::new(
        dataset.columns.iter().map(|c| c.to_string()).collect(),
        records,
    ))
}

fn sample_value(
    column: &str,
    index: usize,
    rng: &mut StdRng,
    now: chrono::DateTime<Utc>,
) -> Value {
    let pick = |rng: &mut StdRng, items: &[&str]| json!(items[rng.gen_range(0..items.len())]);

    match column {
        "customer_id" | "account_id" | "transaction_id" | "patient_id" | "order_id"
        | "product_id" | "sensor_id" => {
            let prefix = column.split('_').next().unwrap_or(column).to_uppercase();
            json!(format!("{}_{:06}", prefix, index + 1))
        }
        "first_name" => pick(rng, FIRST_NAMES),
        "last_name" => pick(rng, LAST_NAMES),
        "email" => json!(format!("user{}@example.com", index + 1)),
        "age" => json!(rng.gen_range(18..83)),
        "gender" => pick(rng, GENDERS),
        "city" => pick(rng, CITIES),
        "country" => pick(rng, COUNTRIES),
        "income" => json!(rng.gen_range(30_000..150_000)),
        "amount" | "price" => json!(round_to(10.0 + rng.gen::<f64>() * 1000.0, 2)),
        "device_type" => pick(rng, DEVICE_TYPES),
        "location" => pick(rng, LOCATIONS),
        "timestamp" => {
            let hours_ago = rng.gen_range(0..24 * 7);
            json!((now - Duration::hours(hours_ago)).to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        "temperature" => json!(round_to(15.0 + rng.gen::<f64>() * 25.0, 1)),
        "humidity" => json!(round_to(30.0 + rng.gen::<f64>() * 50.0, 1)),
        "pressure" => json!(round_to(980.0 + rng.gen::<f64>() * 50.0, 1)),
        "battery_level" => json!((rng.gen::<f64>() * 100.0).round() as i64),
        "signal_strength" => json!((-30.0 - rng.gen::<f64>() * 70.0).round() as i64),
        "status" => pick(rng, STATUSES),
        _ => json!(format!("Sample_{}_{}", column, index + 1)),
    }
}
