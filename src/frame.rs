//! Tabular view of a titled table and its CSV export.
//!
//! A [`DataFrame`] uses the first row of a table as column names and the
//! remaining rows as data. Repeated column names are made unique the way
//! pandas does it (`a, a, a.1` → `a, a.1, a.1.1`), so CSV readers that key
//! on header names never silently merge two columns.

use crate::error::ExtractError;
use crate::output::TitledTable;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Characters that are unsafe in file names on at least one platform.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap());

/// A rectangular table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataFrame {
    /// Header from the first row, data from the rest.
    ///
    /// Data rows are padded with `""` or truncated to the header width.
    pub fn from_table(table: &TitledTable) -> Self {
        let Some((header, body)) = table.rows.split_first() else {
            return Self {
                columns: Vec::new(),
                rows: Vec::new(),
            };
        };

        let width = header.len();
        let rows = body
            .iter()
            .map(|row| {
                let mut row: Vec<String> = row.iter().take(width).cloned().collect();
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            columns: dedup_columns(header),
            rows,
        }
    }

    /// CSV text: header line, then one line per row, `\n` line endings.
    ///
    /// Fields are quoted only when they contain a delimiter, quote or newline.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Make column names unique by suffixing repeats with `.1`, `.2`, ….
///
/// A suffixed name that collides with a later original name is suffixed
/// again, so the result never contains duplicates.
pub fn dedup_columns(names: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let mut col = name.clone();
        let mut cur = counts.get(&col).copied().unwrap_or(0);
        while cur > 0 {
            counts.insert(col.clone(), cur + 1);
            col = format!("{col}.{cur}");
            cur = counts.get(&col).copied().unwrap_or(0);
        }
        counts.insert(col.clone(), cur + 1);
        out.push(col);
    }
    out
}

/// Download name for a table: spaces become underscores, `.csv` appended.
pub fn csv_file_name(title: &str) -> String {
    format!("{}.csv", title.replace(' ', "_"))
}

/// Title shown for the `idx`-th table; empty titles become `Untitled table {idx}`.
pub fn display_title(table: &TitledTable, idx: usize) -> String {
    if table.title.trim().is_empty() {
        format!("Untitled table {idx}")
    } else {
        table.title.clone()
    }
}

/// Download name for the `idx`-th table, using [`display_title`].
pub fn table_file_name(table: &TitledTable, idx: usize) -> String {
    csv_file_name(&display_title(table, idx))
}

/// A name that is safe to create on disk.
///
/// Path separators, reserved and control characters become `_`. Empty
/// results (and `.`/`..`) fall back to `fallback`.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(name, "_");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// CSV bytes for a titled table.
pub fn table_csv(table: &TitledTable) -> Result<String, ExtractError> {
    DataFrame::from_table(table)
        .to_csv()
        .map_err(|e| ExtractError::CsvFailed {
            title: table.title.clone(),
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn table(rows: &[&[&str]]) -> TitledTable {
        TitledTable {
            page: 5,
            title: "Absolute Maximum Ratings".into(),
            rows: rows.iter().map(|r| names(r)).collect(),
        }
    }

    #[test]
    fn dedup_suffixes_repeats() {
        assert_eq!(dedup_columns(&names(&["a", "a"])), names(&["a", "a.1"]));
        assert_eq!(
            dedup_columns(&names(&["", "", "Unit"])),
            names(&["", ".1", "Unit"])
        );
    }

    #[test]
    fn dedup_avoids_collision_with_existing_suffix() {
        assert_eq!(
            dedup_columns(&names(&["a", "a", "a.1"])),
            names(&["a", "a.1", "a.1.1"])
        );
    }

    #[test]
    fn dedup_keeps_unique_names() {
        let cols = names(&["Parameter", "Min", "Max", "Unit"]);
        assert_eq!(dedup_columns(&cols), cols);
    }

    #[test]
    fn frame_pads_and_truncates_rows() {
        let df = DataFrame::from_table(&table(&[
            &["Parameter", "Max", "Unit"],
            &["VIN", "42"],
            &["IOUT", "3", "A", "extra"],
        ]));
        assert_eq!(df.rows[0], names(&["VIN", "42", ""]));
        assert_eq!(df.rows[1], names(&["IOUT", "3", "A"]));
    }

    #[test]
    fn csv_has_header_then_rows() {
        let df = DataFrame::from_table(&table(&[
            &["Parameter", "Max"],
            &["VIN", "42"],
            &["Note", "a, b"],
        ]));
        assert_eq!(df.to_csv().unwrap(), "Parameter,Max\nVIN,42\nNote,\"a, b\"\n");
    }

    #[test]
    fn csv_of_header_only_table() {
        let df = DataFrame::from_table(&table(&[&["Pin", "Name"]]));
        assert_eq!(df.to_csv().unwrap(), "Pin,Name\n");
    }

    #[test]
    fn csv_quotes_multiline_cells() {
        let df = DataFrame::from_table(&table(&[&["Parameter", "Conditions"], &["VOUT", "IOUT=1A\nTA=25C"]]));
        assert_eq!(
            df.to_csv().unwrap(),
            "Parameter,Conditions\nVOUT,\"IOUT=1A\nTA=25C\"\n"
        );
    }

    #[test]
    fn csv_file_name_replaces_spaces() {
        assert_eq!(
            csv_file_name("Electrical Characteristics (cont.)"),
            "Electrical_Characteristics_(cont.).csv"
        );
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_file_name("I/O_Ratings.csv", "table.csv"), "I_O_Ratings.csv");
        assert_eq!(sanitize_file_name("a\\b:c", "x"), "a_b_c");
        assert_eq!(sanitize_file_name("..", "table.csv"), "table.csv");
        assert_eq!(sanitize_file_name("   ", "table.csv"), "table.csv");
    }

    #[test]
    fn empty_title_gets_placeholder() {
        let mut t = table(&[&["Pin"]]);
        assert_eq!(display_title(&t, 3), "Absolute Maximum Ratings");
        t.title = "  ".into();
        assert_eq!(display_title(&t, 3), "Untitled table 3");
        assert_eq!(table_file_name(&t, 3), "Untitled_table_3.csv");
    }
}
