//! In-memory string table.
//!
//! Every cell is a nullable string. Identifiers are never parsed as numbers,
//! so leading zeros and typed codes ("Batch 001") survive untouched.
//! Row order is insertion order and is preserved by every operation except
//! [`Table::inner_join`], which emits rows in left-then-right key order.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::TableError;

pub type Cell = Option<String>;

/// Trimmed string form of a cell. Null normalizes to the empty string.
pub fn normalize(value: Option<&str>) -> &str {
    value.map(str::trim).unwrap_or("")
}

/// Normalized identifier, or `None` when the cell is null or blank.
/// Blank identifiers never join, seed, or group anything.
pub fn normalized_key(value: Option<&str>) -> Option<&str> {
    let trimmed = normalize(value);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    /// Position of this row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value by column name. `None` when the column is absent or the cell is null.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.table.value(self.index, column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.table.has_column(column)
    }
}

impl Table {
    /// Create an empty table with the given column set.
    pub fn new<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from a header list and row-major values.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Create a table from named columns. All columns must have the same length.
    pub fn from_columns(columns: Vec<(String, Vec<Cell>)>) -> Result<Self, TableError> {
        let expected = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        for (name, values) in &columns {
            if values.len() != expected {
                return Err(TableError::ColumnLength {
                    column: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }

        let mut table = Self::new(columns.iter().map(|(name, _)| name.clone()))?;
        let mut iters: Vec<_> = columns.into_iter().map(|(_, values)| values.into_iter()).collect();
        for _ in 0..expected {
            let row: Vec<Cell> = iters.iter_mut().map(|it| it.next().flatten()).collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Append a row. Its width must equal the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_ref(&self, index: usize) -> Option<RowRef<'_>> {
        (index < self.rows.len()).then_some(RowRef { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    /// Cell by row index and column index.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.cell(row, col)
    }

    /// All values of one column, top to bottom. `None` when the column is absent.
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| row[col].as_deref()))
    }

    /// Indices of rows satisfying `pred`, in table order.
    pub fn matching_rows<F>(&self, mut pred: F) -> Vec<usize>
    where
        F: FnMut(RowRef<'_>) -> bool,
    {
        self.rows().filter(|r| pred(*r)).map(|r| r.index).collect()
    }

    /// Rows satisfying `pred`, in table order.
    pub fn filter_rows<F>(&self, pred: F) -> Table
    where
        F: FnMut(RowRef<'_>) -> bool,
    {
        let indices = self.matching_rows(pred);
        self.select_rows(&indices)
    }

    /// Copy the given rows, in the order given. Out-of-range indices are ignored.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Keep only the requested columns that exist, in requested order.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let mut seen = HashSet::new();
        let picked: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let idx = self.column_index(name)?;
                seen.insert(idx).then(|| (name.to_string(), idx))
            })
            .collect();

        Table {
            columns: picked.iter().map(|(name, _)| name.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(_, idx)| row[*idx].clone()).collect())
                .collect(),
        }
    }

    /// Copy of this table with `column` rewritten row by row.
    /// The column is appended when absent; `f` then sees `None` for every row.
    pub fn assign<F>(&self, column: &str, mut f: F) -> Table
    where
        F: FnMut(RowRef<'_>) -> Cell,
    {
        let mut out = self.clone();
        let col = match self.column_index(column) {
            Some(col) => col,
            None => {
                out.columns.push(column.to_string());
                for row in &mut out.rows {
                    row.push(None);
                }
                out.columns.len() - 1
            }
        };
        for r in self.rows() {
            out.rows[r.index][col] = f(r);
        }
        out
    }

    /// Copy of this table with `column` set to `value` on every row.
    pub fn assign_literal(&self, column: &str, value: &str) -> Table {
        self.assign(column, |_| Some(value.to_string()))
    }

    /// Inner join on the normalized `key` column.
    ///
    /// The key column appears once; other columns present on both sides get
    /// `suffixes.0` / `suffixes.1`. Rows are emitted in left order, and for
    /// each left row, in right order of its matches. Rows with a blank key,
    /// or whose key is missing from either table, are dropped.
    pub fn inner_join(&self, right: &Table, key: &str, suffixes: (&str, &str)) -> Result<Table, TableError> {
        let (Some(left_key), Some(right_key)) = (self.column_index(key), right.column_index(key)) else {
            return Table::new([key]);
        };

        let mut right_index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            if let Some(k) = normalized_key(row[right_key].as_deref()) {
                right_index.entry(k).or_default().push(i);
            }
        }

        let left_names: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let right_names: HashSet<&str> = right.columns.iter().map(String::as_str).collect();

        let mut columns = vec![key.to_string()];
        let left_cols: Vec<usize> = (0..self.columns.len()).filter(|&i| i != left_key).collect();
        let right_cols: Vec<usize> = (0..right.columns.len()).filter(|&i| i != right_key).collect();
        for &i in &left_cols {
            let name = &self.columns[i];
            if right_names.contains(name.as_str()) {
                columns.push(format!("{name}{}", suffixes.0));
            } else {
                columns.push(name.clone());
            }
        }
        for &i in &right_cols {
            let name = &right.columns[i];
            if left_names.contains(name.as_str()) {
                columns.push(format!("{name}{}", suffixes.1));
            } else {
                columns.push(name.clone());
            }
        }

        let mut joined = Table::new(columns)?;
        for row in &self.rows {
            let Some(k) = normalized_key(row[left_key].as_deref()) else {
                continue;
            };
            let Some(matches) = right_index.get(k) else {
                continue;
            };
            for &ri in matches {
                let right_row = &right.rows[ri];
                let mut out = Vec::with_capacity(joined.width());
                out.push(Some(k.to_string()));
                out.extend(left_cols.iter().map(|&i| row[i].clone()));
                out.extend(right_cols.iter().map(|&i| right_row[i].clone()));
                joined.rows.push(out);
            }
        }
        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
            .collect()
    }

    fn sample() -> Table {
        Table::from_rows(
            ["Material Bank SKU", "Family Id", "Color Name"],
            vec![
                cells(&["0012", "F1", "Red"]),
                cells(&["0013", "F1", ""]),
                cells(&["0020", "F2", "Blue"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Table::new(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("A".into()));
    }

    #[test]
    fn rejects_wrong_row_width() {
        let mut t = Table::new(["A", "B"]).unwrap();
        let err = t.push_row(cells(&["x"])).unwrap_err();
        assert!(matches!(err, TableError::RowWidth { expected: 2, found: 1, .. }));
    }

    #[test]
    fn from_columns_checks_lengths() {
        let err = Table::from_columns(vec![
            ("A".into(), cells(&["1", "2"])),
            ("B".into(), cells(&["1"])),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::ColumnLength { .. }));

        let t = Table::from_columns(vec![
            ("A".into(), cells(&["1", "2"])),
            ("B".into(), cells(&["x", ""])),
        ])
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, "B"), Some("x"));
        assert_eq!(t.value(1, "B"), None);
    }

    #[test]
    fn leading_zeros_preserved() {
        let t = sample();
        assert_eq!(t.value(0, "Material Bank SKU"), Some("0012"));
    }

    #[test]
    fn filter_preserves_order() {
        let t = sample();
        let f = t.filter_rows(|r| r.get("Family Id") == Some("F1"));
        assert_eq!(f.len(), 2);
        assert_eq!(f.value(0, "Material Bank SKU"), Some("0012"));
        assert_eq!(f.value(1, "Material Bank SKU"), Some("0013"));
    }

    #[test]
    fn project_skips_absent_and_keeps_requested_order() {
        let t = sample();
        let p = t.project(&["Color Name", "Nope", "Material Bank SKU", "Color Name"]);
        assert_eq!(p.columns(), &["Color Name".to_string(), "Material Bank SKU".to_string()]);
        assert_eq!(p.value(2, "Color Name"), Some("Blue"));
    }

    #[test]
    fn assign_copies_and_appends() {
        let t = sample();
        let out = t.assign_literal("Admin Notes", "note");
        assert!(!t.has_column("Admin Notes"));
        assert_eq!(out.width(), 4);
        assert_eq!(out.value(1, "Admin Notes"), Some("note"));

        let out = t.assign("Color Name", |r| r.get("Color Name").map(str::to_uppercase));
        assert_eq!(out.value(0, "Color Name"), Some("RED"));
        assert_eq!(out.value(1, "Color Name"), None);
        assert_eq!(t.value(0, "Color Name"), Some("Red"));
    }

    #[test]
    fn inner_join_suffixes_overlap_only() {
        let left = Table::from_rows(
            ["sku", "name", "only_left"],
            vec![cells(&["1", "a", "x"]), cells(&["2", "b", "y"]), cells(&[" 3 ", "c", "z"])],
        )
        .unwrap();
        let right = Table::from_rows(
            ["name", "sku"],
            vec![cells(&["C", "3"]), cells(&["A", "1"]), cells(&["Q", "9"])],
        )
        .unwrap();
        let j = left.inner_join(&right, "sku", ("_L", "_R")).unwrap();
        assert_eq!(
            j.columns(),
            &["sku", "name_L", "only_left", "name_R"].map(String::from)
        );
        assert_eq!(j.len(), 2);
        assert_eq!(j.value(0, "sku"), Some("1"));
        assert_eq!(j.value(0, "name_R"), Some("A"));
        assert_eq!(j.value(1, "sku"), Some("3"));
        assert_eq!(j.value(1, "name_L"), Some("c"));
    }

    #[test]
    fn inner_join_expands_duplicate_keys() {
        let left = Table::from_rows(["k", "v"], vec![cells(&["1", "a"])]).unwrap();
        let right = Table::from_rows(["k", "v"], vec![cells(&["1", "x"]), cells(&["1", "y"])]).unwrap();
        let j = left.inner_join(&right, "k", ("_A", "_B")).unwrap();
        assert_eq!(j.len(), 2);
        assert_eq!(j.value(1, "v_B"), Some("y"));
    }

    #[test]
    fn blank_keys_never_join() {
        let left = Table::from_rows(["k", "v"], vec![cells(&["", "a"])]).unwrap();
        let right = Table::from_rows(["k", "v"], vec![vec![Some("  ".into()), Some("b".into())]]).unwrap();
        let j = left.inner_join(&right, "k", ("_A", "_B")).unwrap();
        assert!(j.is_empty());
    }

    #[test]
    fn normalize_trims_and_maps_null() {
        assert_eq!(normalize(Some("  SKU1 ")), "SKU1");
        assert_eq!(normalize(None), "");
        assert_eq!(normalized_key(Some("   ")), None);
        assert_eq!(normalized_key(Some(" 007")), Some("007"));
    }
}
