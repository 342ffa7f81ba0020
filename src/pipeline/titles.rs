//! Pairing detected tables with the caption line printed above them.
//!
//! Datasheets rarely tag their tables, but they almost always print a
//! heading ("Absolute Maximum Ratings", "Electrical Characteristics") on the
//! line right above the header row. The title of a table is therefore the
//! page-text line immediately before the first line that contains the
//! table's first cell. Tables for which that line is missing or blank are
//! not reported.

use crate::output::TitledTable;
use crate::pipeline::tables::Grid;
use tracing::debug;

/// Replace missing cells with `""` and drop rows that have no cells at all.
pub fn clean_table(rows: &Grid) -> Vec<Vec<String>> {
    rows.iter()
        .filter(|row| !row.is_empty())
        .map(|row| row.iter().map(|cell| cell.clone().unwrap_or_default()).collect())
        .collect()
}

/// Title for a table whose first cell reads `first_cell`.
///
/// Only the first line containing `first_cell` is considered. Returns
/// `None` when the first cell is empty, when no line contains it, when the
/// match is the first line of the page, or when the preceding line is blank.
pub fn find_title(lines: &[&str], first_cell: &str) -> Option<String> {
    if first_cell.is_empty() {
        return None;
    }
    let idx = lines.iter().position(|line| line.contains(first_cell))?;
    if idx == 0 {
        return None;
    }
    let title = lines[idx - 1].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Clean the tables of one page and keep the ones with a title.
///
/// With `keep_untitled`, tables without a title are kept with an empty
/// title instead of being skipped.
pub fn titled_tables(
    page_num: usize,
    lines: &[&str],
    tables: &[Grid],
    keep_untitled: bool,
) -> Vec<TitledTable> {
    let mut kept = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        let rows = clean_table(table);
        let first_cell = rows
            .first()
            .and_then(|row| row.first())
            .map(String::as_str)
            .unwrap_or("");

        match find_title(lines, first_cell) {
            Some(title) => {
                debug!("Page {}: table {} titled {:?}", page_num, i, title);
                kept.push(TitledTable {
                    page: page_num,
                    title,
                    rows,
                });
            }
            None if keep_untitled => kept.push(TitledTable {
                page: page_num,
                title: String::new(),
                rows,
            }),
            None => debug!(
                "Page {}: table {} skipped, no title above {:?}",
                page_num, i, first_cell
            ),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[Option<&str>]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
            .collect()
    }

    const PAGE: &[&str] = &[
        "ACME TPS-42 Buck Converter",
        "  Absolute Maximum Ratings  ",
        "Parameter Min Max Unit",
        "VIN 0 42 V",
        "",
        "Parameter Typ Unit",
    ];

    #[test]
    fn title_is_trimmed_line_above_first_match() {
        assert_eq!(
            find_title(PAGE, "Parameter").as_deref(),
            Some("Absolute Maximum Ratings")
        );
    }

    #[test]
    fn only_first_matching_line_counts() {
        // "Parameter" also appears below a blank line; the first hit wins.
        assert!(find_title(PAGE, "Parameter").is_some());
        assert_eq!(find_title(PAGE, "Typ"), None);
    }

    #[test]
    fn match_on_first_line_has_no_title() {
        assert_eq!(find_title(PAGE, "ACME"), None);
    }

    #[test]
    fn missing_or_empty_first_cell_has_no_title() {
        assert_eq!(find_title(PAGE, "Thermal"), None);
        assert_eq!(find_title(PAGE, ""), None);
        assert_eq!(find_title(&[], "Parameter"), None);
    }

    #[test]
    fn substring_match_inside_a_line() {
        assert_eq!(find_title(PAGE, "42 V").as_deref(), Some("Parameter Min Max Unit"));
    }

    #[test]
    fn clean_table_fills_gaps_and_drops_empty_rows() {
        let rows = grid(&[&[Some("A"), None], &[], &[Some(""), Some("2")]]);
        assert_eq!(
            clean_table(&rows),
            vec![vec!["A".to_string(), String::new()], vec![String::new(), "2".to_string()]]
        );
    }

    #[test]
    fn titled_tables_skips_untitled() {
        let tables = vec![
            grid(&[&[Some("Parameter"), Some("Max")], &[Some("VIN"), Some("42")]]),
            grid(&[&[None, Some("Typ")]]),
        ];
        let kept = titled_tables(7, PAGE, &tables, false);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].page, 7);
        assert_eq!(kept[0].title, "Absolute Maximum Ratings");
        assert_eq!(kept[0].rows[1], vec!["VIN".to_string(), "42".to_string()]);
    }

    #[test]
    fn keep_untitled_retains_with_empty_title() {
        let tables = vec![grid(&[&[None, Some("Typ")]])];
        let kept = titled_tables(7, PAGE, &tables, true);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "");
    }

    #[test]
    fn page_without_text_yields_nothing() {
        let tables = vec![grid(&[&[Some("Parameter")], &[Some("VIN")]])];
        assert!(titled_tables(5, &[], &tables, false).is_empty());
    }
}
