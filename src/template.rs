use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z]+)").expect("hardcoded regex pattern"));
static PERIOD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\s*\.)+").expect("hardcoded regex pattern"));
static EDGE_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.|\.$").expect("hardcoded regex pattern"));

/// Expands a location template against one row of a sheet.
///
/// Placeholders take the form `$<LETTERS>`; the letters name a column by its
/// spreadsheet position (`$A` is the first column). Out-of-range references
/// and empty cells substitute as empty strings, after which runs of periods
/// left behind by empty substitutions are collapsed and edge periods trimmed.
/// Returns `None` when the template itself is empty.
pub fn expand(template: &str, columns: &[String], row: &[Option<String>]) -> Option<String> {
    if template.is_empty() {
        return None;
    }

    let expanded = PLACEHOLDER.replace_all(template, |captures: &regex::Captures<'_>| {
        let letters = &captures[1];
        let index = column_index(letters);
        if index >= columns.len() {
            warn!(
                column = letters,
                index,
                available = columns.len(),
                "template column reference is out of range"
            );
            return String::new();
        }
        match row.get(index).and_then(Option::as_deref) {
            Some(value) => value.trim().to_string(),
            None => String::new(),
        }
    });

    let collapsed = PERIOD_RUN.replace_all(&expanded, ".");
    Some(EDGE_PERIOD.replace_all(&collapsed, "").into_owned())
}

/// Maps a column-letter reference to a zero-based index. Multi-letter
/// references use the usual spreadsheet base-26 scheme (`AA` follows `Z`),
/// which lands them on the out-of-range path for any ordinary sheet.
fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .fold(0usize, |acc, letter| {
            acc * 26 + usize::from(letter - b'A') + 1
        })
        .saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|value| value.map(str::to_string))
            .collect()
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let result = expand("Bldg A", &columns(&["Device"]), &row(&[Some("sw01")]));
        assert_eq!(result.as_deref(), Some("Bldg A"));
    }

    #[test]
    fn empty_template_expands_to_none() {
        assert_eq!(expand("", &columns(&["Device"]), &row(&[Some("sw01")])), None);
    }

    #[test]
    fn placeholders_substitute_trimmed_column_values() {
        let columns = columns(&["Device Name", "Site", "Room", "Row", "Rack"]);
        let row = row(&[
            Some("sw01"),
            Some(" CA2 "),
            Some("RDC"),
            Some("Core"),
            Some("Net"),
        ]);
        let result = expand("$B.$C.$D.$E", &columns, &row);
        assert_eq!(result.as_deref(), Some("CA2.RDC.Core.Net"));
    }

    #[test]
    fn missing_cells_substitute_empty_and_periods_collapse() {
        let columns = columns(&["Device Name", "Site", "Room", "Row"]);
        let row = row(&[Some("sw01"), Some("CA2"), None, Some("Core")]);
        let result = expand("$B.$C.$D", &columns, &row);
        assert_eq!(result.as_deref(), Some("CA2.Core"));
    }

    #[test]
    fn out_of_range_reference_substitutes_empty_without_residual_syntax() {
        let columns = columns(&["Device Name"]);
        let row = row(&[Some("sw01")]);
        let result = expand("$B.$ZZ.$A", &columns, &row).unwrap();
        assert!(!result.contains('$'));
        assert_eq!(result, "sw01");
    }

    #[test]
    fn period_runs_collapse_and_edges_trim() {
        let columns = columns(&["A"]);
        let row = row(&[None]);
        assert_eq!(
            expand("a..b", &columns, &row).as_deref(),
            Some("a.b")
        );
        assert_eq!(
            expand(".a.b.", &columns, &row).as_deref(),
            Some("a.b")
        );
        assert_eq!(
            expand("a. . .b", &columns, &row).as_deref(),
            Some("a.b")
        );
    }

    #[test]
    fn multi_letter_reference_maps_past_single_letters() {
        assert_eq!(column_index("A"), 0);
        assert_eq!(column_index("Z"), 25);
        assert_eq!(column_index("AA"), 26);
    }
}
