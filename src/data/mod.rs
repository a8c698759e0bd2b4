//! Vehicle records and the named-column `Dataset` the engine consumes.
//!
//! A `Dataset` is a thin column store: every column is either numeric or
//! categorical, all columns share one row count. The engine only ever reads
//! a dataset; row subsets are produced as copies.

use crate::error::{AppraiserError, Result};
use crate::primitives::Vector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field value of a vehicle record.
///
/// Deserializes from a plain JSON number or string, so a flat
/// `{"brand": "audi", "horsepower": 102}` mapping becomes a `Record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric measurement (power, engine size, weight, price...)
    Numeric(f64),
    /// Categorical label (brand, fuel type, body style...)
    Categorical(String),
}

impl Value {
    /// Interprets the value as a number.
    ///
    /// Categorical text is parsed, so `"102"` is accepted where a form
    /// submitted everything as strings. Returns `None` when the text does not
    /// parse or the number is not finite.
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        let v = match self {
            Value::Numeric(v) => *v,
            Value::Categorical(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }

    /// Interprets the value as a category label.
    ///
    /// Numbers are rendered with their shortest display form.
    #[must_use]
    pub fn as_category(&self) -> String {
        match self {
            Value::Numeric(v) => v.to_string(),
            Value::Categorical(s) => s.clone(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Categorical(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Categorical(s)
    }
}

/// One vehicle observation: field name to value.
///
/// # Examples
///
/// ```
/// use appraiser::data::Record;
///
/// let car = Record::new()
///     .with("brand", "toyota")
///     .with("horsepower", 92.0);
/// assert!(car.get("brand").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A typed dataset column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric column
    Numeric(Vector<f64>),
    /// Categorical column
    Categorical(Vec<String>),
}

impl Column {
    /// Number of rows in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// True when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for numeric columns.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    fn value(&self, idx: usize) -> Value {
        match self {
            Column::Numeric(v) => Value::Numeric(v[idx]),
            Column::Categorical(v) => Value::Categorical(v[idx].clone()),
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        match self {
            Column::Numeric(v) => Column::Numeric(v.select(indices)),
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// An ordered collection of vehicle records sharing one schema.
///
/// # Examples
///
/// ```
/// use appraiser::data::{Column, Dataset};
/// use appraiser::primitives::Vector;
///
/// let ds = Dataset::new(vec![
///     ("brand".to_string(), Column::Categorical(vec!["audi".into(), "bmw".into()])),
///     ("price".to_string(), Column::Numeric(Vector::from_slice(&[13950.0, 16430.0]))),
/// ])
/// .expect("columns are consistent");
/// assert_eq!(ds.shape(), (2, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Dataset {
    /// Creates a dataset from named columns.
    ///
    /// Zero-row datasets are allowed here; operations that need rows reject
    /// them with [`AppraiserError::EmptyInput`].
    ///
    /// # Errors
    ///
    /// Returns an error if there are no columns, column lengths differ, or a
    /// name is empty or duplicated.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let Some((_, first)) = columns.first() else {
            return Err(AppraiserError::configuration(
                "columns",
                "dataset must have at least one column",
            ));
        };
        let n_rows = first.len();

        for (name, col) in &columns {
            if name.is_empty() {
                return Err(AppraiserError::configuration(
                    "columns",
                    "column names cannot be empty",
                ));
            }
            if col.len() != n_rows {
                return Err(AppraiserError::DimensionMismatch {
                    expected: format!("{n_rows} rows"),
                    actual: format!("{} rows in column '{name}'", col.len()),
                });
            }
        }

        let mut names: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(AppraiserError::configuration(
                dup[0],
                "duplicate column name",
            ));
        }

        Ok(Self { columns, n_rows })
    }

    /// Builds a dataset from row records.
    ///
    /// The first record fixes the column set and each column's kind; every
    /// other record must carry the same fields. A numeric column accepts text
    /// that parses as a number.
    ///
    /// # Errors
    ///
    /// Returns [`AppraiserError::EmptyInput`] for no records, and a
    /// configuration error when records disagree on fields or kinds.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| AppraiserError::empty_input("Dataset::from_records"))?;

        let mut columns = Vec::with_capacity(first.len());
        for (name, proto) in first.iter() {
            let column = match proto {
                Value::Numeric(_) => {
                    let mut values = Vec::with_capacity(records.len());
                    for (row, record) in records.iter().enumerate() {
                        let v = record
                            .get(name)
                            .and_then(Value::as_numeric)
                            .ok_or_else(|| {
                                AppraiserError::configuration(
                                    name,
                                    format!("row {row}: missing or non-numeric value"),
                                )
                            })?;
                        values.push(v);
                    }
                    Column::Numeric(Vector::from_vec(values))
                }
                Value::Categorical(_) => {
                    let mut values = Vec::with_capacity(records.len());
                    for (row, record) in records.iter().enumerate() {
                        let v = record.get(name).ok_or_else(|| {
                            AppraiserError::configuration(name, format!("row {row}: missing value"))
                        })?;
                        values.push(v.as_category());
                    }
                    Column::Categorical(values)
                }
            };
            columns.push((name.to_string(), column));
        }

        if let Some((row, extra)) = records.iter().enumerate().find_map(|(row, r)| {
            r.iter()
                .find(|(name, _)| first.get(name).is_none())
                .map(|(name, _)| (row, name.to_string()))
        }) {
            return Err(AppraiserError::configuration(
                extra,
                format!("row {row}: field not present in the first record"),
            ));
        }

        Self::new(columns)
    }

    /// Returns the shape as (`n_rows`, `n_cols`).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// True when the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Returns the column names in dataset order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Names of numeric columns, in dataset order.
    #[must_use]
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Names of categorical columns, in dataset order.
    #[must_use]
    pub fn categorical_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, c)| !c.is_numeric())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Returns a column by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the column doesn't exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| AppraiserError::configuration(name, "column not present in dataset"))
    }

    /// Returns a numeric column by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the column is missing or categorical.
    pub fn numeric(&self, name: &str) -> Result<&Vector<f64>> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(AppraiserError::configuration(
                name,
                "expected a numeric column, found categorical",
            )),
        }
    }

    /// Returns a categorical column by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the column is missing or numeric.
    pub fn categorical(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Categorical(v) => Ok(v),
            Column::Numeric(_) => Err(AppraiserError::configuration(
                name,
                "expected a categorical column, found numeric",
            )),
        }
    }

    /// Returns an iterator over columns as (name, column) pairs.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Reassembles row `idx` as a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds.
    pub fn record(&self, idx: usize) -> Result<Record> {
        if idx >= self.n_rows {
            return Err(AppraiserError::dimension_mismatch("row index <", self.n_rows, idx));
        }
        Ok(self
            .columns
            .iter()
            .map(|(n, c)| (n.clone(), c.value(idx)))
            .collect())
    }

    /// Copies the rows at `indices` into a new dataset.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.select(indices)))
                .collect(),
            n_rows: indices.len(),
        }
    }

    /// Adds a new column, returning the augmented copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the length doesn't match or the name already exists.
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push((name.into(), column));
        Self::new(columns)
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
