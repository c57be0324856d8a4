use crate::csv_reader::CsvData;
use std::collections::HashSet;

/// Storage type of a column, resolved once when the dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// Every cell is present and parses as an integer.
    Integer,
    /// Every non-empty cell parses as a float (integers with gaps land here).
    Float,
    /// Every non-empty cell is `true` or `false`.
    Boolean,
    /// Anything else.
    Text,
    /// No non-empty cells at all.
    Empty,
}

impl DeclaredType {
    /// Infer the type of a column from its cells.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen_value = false;
        let mut seen_gap = false;
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;

        for cell in cells {
            if cell.is_empty() {
                seen_gap = true;
                continue;
            }
            seen_value = true;
            if all_int && cell.parse::<i64>().is_err() {
                all_int = false;
            }
            if all_float && cell.parse::<f64>().is_err() {
                all_float = false;
            }
            if all_bool && !is_bool_literal(cell) {
                all_bool = false;
            }
        }

        if !seen_value {
            DeclaredType::Empty
        } else if all_int && !seen_gap {
            DeclaredType::Integer
        } else if all_float {
            DeclaredType::Float
        } else if all_bool {
            DeclaredType::Boolean
        } else {
            DeclaredType::Text
        }
    }
}

fn is_bool_literal(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false")
}

/// A named column and its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub declared: DeclaredType,
}

/// Ordered column schema of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Build a schema from `(name, type)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, DeclaredType)>) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, declared)| ColumnSchema {
                    name: name.to_string(),
                    declared,
                })
                .collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A loaded table: schema plus string cells.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from parsed CSV, resolving the column types once.
    pub fn from_csv(csv: CsvData) -> Self {
        let columns = csv
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnSchema {
                name: name.clone(),
                declared: DeclaredType::infer(csv.rows.iter().map(|row| row[idx].as_str())),
            })
            .collect();

        Self {
            schema: Schema::new(columns),
            rows: csv.rows,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.columns.iter().position(|c| c.name == name)
    }

    /// Raw cells of a column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Cells of a column parsed as numbers; empty cells become `None`.
    ///
    /// Returns `Err` with the first offending cell when a non-empty cell is not numeric.
    pub fn numeric_column(&self, name: &str) -> Option<Result<Vec<Option<f64>>, String>> {
        let cells = self.column(name)?;
        Some(
            cells
                .into_iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Ok(None)
                    } else {
                        cell.parse::<f64>().map(Some).map_err(|_| cell.to_string())
                    }
                })
                .collect(),
        )
    }

    /// Number of distinct non-empty values in a column.
    pub fn distinct_count(&self, name: &str) -> Option<usize> {
        let cells = self.column(name)?;
        Some(
            cells
                .into_iter()
                .filter(|c| !c.is_empty())
                .collect::<HashSet<_>>()
                .len(),
        )
    }
}
