use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column names in on-disk order.
pub const HEADER: [&str; 3] = ["Name", "Age", "City"];

/// One row of the fixed `Name,Age,City` schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "City")]
    pub city: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("field `{field}` must not be empty")]
    EmptyField { field: &'static str },
    #[error("field `Age` must be zero or greater, got {age}")]
    NegativeAge { age: i64 },
}

impl Record {
    pub fn new(name: impl Into<String>, age: i64, city: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            city: city.into(),
        }
    }

    /// Check field constraints. Whitespace-only text counts as empty.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.name.trim().is_empty() {
            return Err(RecordError::EmptyField { field: HEADER[0] });
        }
        if self.age < 0 {
            return Err(RecordError::NegativeAge { age: self.age });
        }
        if self.city.trim().is_empty() {
            return Err(RecordError::EmptyField { field: HEADER[2] });
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.age, self.city)
    }
}

/// Rows written when a dataset is created for the first time.
pub fn default_seed() -> Vec<Record> {
    vec![
        Record::new("Alice", 25, "New York"),
        Record::new("Bob", 30, "Los Angeles"),
        Record::new("Charlie", 35, "Chicago"),
    ]
}

/// Row appended on each later run when the caller supplies nothing else.
pub fn default_append() -> Record {
    Record::new("Waqas", 28, "SampleCity")
}
