use csv::{ReaderBuilder, Trim};

use crate::error::{DataError, InputError};
use crate::input::{coerce_text, PredictionInput};

/// Header names treated as a row label instead of a feature.
const LABEL_COLUMNS: [&str; 2] = ["name", "student"];

/// One CSV row, parsed independently of its neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub label: Option<String>,
    pub input: Result<PredictionInput, InputError>,
}

/// Parses batch CSV text whose header row holds feature names.
///
/// Cells are numbers or yes/no answers; empty cells are left out of the row's
/// input. A bad cell only fails its own row.
pub fn parse_batch(text: &str) -> Result<Vec<BatchRow>, DataError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(DataError::MissingHeader);
    }
    let label_column = headers
        .iter()
        .position(|header| LABEL_COLUMNS.iter().any(|label| header.eq_ignore_ascii_case(label)));

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;

        let label = label_column
            .and_then(|column| record.get(column))
            .filter(|cell| !cell.is_empty())
            .map(str::to_string);

        let mut input = PredictionInput::new();
        let mut failure = None;
        for (column, (header, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if Some(column) == label_column || header.is_empty() || cell.is_empty() {
                continue;
            }
            match coerce_text(cell) {
                Ok(value) => input.insert(header, value),
                Err(_) => {
                    failure = Some(InputError::Unsupported {
                        field: header.to_string(),
                        value: cell.to_string(),
                    });
                    break;
                }
            }
        }

        rows.push(BatchRow {
            row: index + 1,
            label,
            input: match failure {
                Some(err) => Err(err),
                None => Ok(input),
            },
        });
    }

    if rows.is_empty() {
        return Err(DataError::Empty);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_with_labels_and_flags() {
        let csv = "name,Age_at_enrollment,Scholarship_holder,Admission_grade\n\
                   Denis Lemayian,19,Yes,130.5\n\
                   Saitoti Smith,27,No,\n";

        let rows = parse_batch(csv).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].label.as_deref(), Some("Denis Lemayian"));
        let first = rows[0].input.as_ref().unwrap();
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            vec![("Age_at_enrollment", 19.0), ("Scholarship_holder", 1.0), ("Admission_grade", 130.5)]
        );

        let second = rows[1].input.as_ref().unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second.get("Admission_grade"), None);
    }

    #[test]
    fn test_bad_cell_only_fails_its_row() {
        let csv = "Gender,Debtor\n1,No\nx,Yes\n0,1\n";
        let rows = parse_batch(csv).unwrap();

        assert!(rows[0].input.is_ok());
        assert_eq!(
            rows[1].input,
            Err(InputError::Unsupported {
                field: "Gender".to_string(),
                value: "x".to_string()
            })
        );
        assert!(rows[2].input.is_ok());
    }

    #[test]
    fn test_failed_rows_can_be_cloned() {
        let rows = parse_batch("Debtor\nmaybe\n").unwrap();
        let copy = rows.clone();

        assert_eq!(copy, rows);
        assert!(copy[0].input.is_err());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let rows = parse_batch("a,b,c\n1\n").unwrap();
        assert_eq!(rows[0].input.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse_batch("a,b\n"), Err(DataError::Empty)));
    }
}
