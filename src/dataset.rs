//! Column-typed, row-aligned tabular data.

use crate::error::DatasetError;

/// Cell tokens treated as missing values
const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "NULL", "null", "None",
];

/// A single column of values
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    /// Infer a column type from raw text cells.
    /// Numeric if every non-null cell parses as `f64`, text otherwise.
    pub fn infer(cells: Vec<Option<String>>) -> Self {
        let cells: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| c.filter(|s| !is_null_token(s)))
            .collect();

        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|c| match c {
                None => Some(None),
                Some(s) => s.trim().parse::<f64>().ok().map(Some),
            })
            .collect();

        match parsed {
            Some(values) => Column::Numeric(values),
            None => Column::Text(cells),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v[row].is_none(),
            Column::Text(v) => v[row].is_none(),
        }
    }

    /// String key for a cell, used for label grouping
    pub fn key(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v[row].map(|x| x.to_string()),
            Column::Text(v) => v[row].clone(),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

fn is_null_token(s: &str) -> bool {
    NULL_TOKENS.contains(&s.trim())
}

/// Ordered collection of equally long named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset from named columns, rejecting ragged input
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Self, DatasetError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != rows {
                return Err(DatasetError::RaggedColumn {
                    name: name.clone(),
                    len: column.len(),
                    expected: rows,
                });
            }
        }
        Ok(Self {
            names,
            columns,
            rows,
        })
    }

    /// Build a dataset from row-major text records, inferring column types
    pub fn from_records(
        names: Vec<String>,
        records: Vec<Vec<Option<String>>>,
    ) -> Result<Self, DatasetError> {
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(records.len()); names.len()];
        for record in records {
            for (col, cell) in cells.iter_mut().zip(record) {
                col.push(cell);
            }
        }
        let columns = cells.into_iter().map(Column::infer).collect();
        Self::new(names, columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DatasetError::MissingColumn {
                name: name.to_string(),
                available: self.names.clone(),
            })
    }

    /// Look up a numeric column by name
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], DatasetError> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Text(_) => Err(DatasetError::NotNumeric(name.to_string())),
        }
    }

    /// Per-row label keys for a column (numeric or text)
    pub fn label_keys(&self, name: &str) -> Result<Vec<Option<String>>, DatasetError> {
        let column = self.column(name)?;
        Ok((0..self.rows).map(|r| column.key(r)).collect())
    }

    /// Keep only the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        }
    }

    /// Keep rows where the numeric column equals `target`
    pub fn filter_eq(&self, name: &str, target: f64) -> Result<Self, DatasetError> {
        let values = self.numeric(name)?;
        let rows: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(target))
            .map(|(i, _)| i)
            .collect();
        Ok(self.take_rows(&rows))
    }

    /// Keep rows where none of the named columns is null
    pub fn drop_nulls(&self, names: &[&str]) -> Result<Self, DatasetError> {
        let columns = names
            .iter()
            .map(|n| self.column(n))
            .collect::<Result<Vec<_>, _>>()?;
        let rows: Vec<usize> = (0..self.rows)
            .filter(|&r| columns.iter().all(|c| !c.is_null(r)))
            .collect();
        Ok(self.take_rows(&rows))
    }

    /// Keep at most the first `n` rows
    pub fn head(&self, n: usize) -> Self {
        if n >= self.rows {
            return self.clone();
        }
        let rows: Vec<usize> = (0..n).collect();
        self.take_rows(&rows)
    }
}
