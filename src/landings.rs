use std::io::BufRead;

use serde::Serialize;
use thiserror::Error;

/// One parsed catch-ticket row. Pollock in metric tons, chinook as the
/// recorded (possibly fractional, observer-extrapolated) count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landing {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub ticket: String,
    pub vessel: String,
    pub coop: String,
    pub pollock: f64,
    pub chinook: f64,
}

#[derive(Debug, Error)]
pub enum LandingsError {
    #[error("failed to read landings data: {0}")]
    Io(#[from] std::io::Error),

    #[error("landings file is empty")]
    Empty,

    #[error("line {line}: expected {expected} fields, found {found}")]
    MissingFields { line: usize, expected: usize, found: usize },

    #[error("line {line}: bad {field} value {value:?}")]
    BadField { line: usize, field: &'static str, value: String },

    #[error("line {line}: bad date {value:?} (want month/day[/year])")]
    BadDate { line: usize, value: String },
}

/// Column layout of the catch-ticket extract. The port column is carried
/// through ingestion but unused by the simulation.
const COLUMNS: usize = 8;

/// Read a headered catch-ticket CSV into landings, in file order.
/// Parsing stops at the first blank line (trailing padding in the extracts).
pub fn read_landings<R: BufRead>(reader: R) -> Result<Vec<Landing>, LandingsError> {
    let mut lines = reader.lines();

    // Header row names the columns; only its presence matters here.
    match lines.next() {
        Some(header) => {
            header?;
        }
        None => return Err(LandingsError::Empty),
    }

    let mut out = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        let lineno = i + 2; // 1-based, after the header
        if line.trim().is_empty() {
            break;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < COLUMNS {
            return Err(LandingsError::MissingFields {
                line: lineno,
                expected: COLUMNS,
                found: fields.len(),
            });
        }

        let year: i32 = parse_num(fields[0], lineno, "year")?;
        let (month, day) = parse_date(fields[1], lineno)?;
        let pollock: f64 = parse_num(fields[6], lineno, "pollock")?;
        let chinook: f64 = parse_num(fields[7], lineno, "chinook")?;

        out.push(Landing {
            year,
            month,
            day,
            ticket: fields[2].to_string(),
            vessel: fields[3].to_string(),
            coop: fields[4].to_string(),
            pollock,
            chinook,
        });
    }

    if out.is_empty() {
        return Err(LandingsError::Empty);
    }
    Ok(out)
}

fn parse_num<T: std::str::FromStr>(
    value: &str,
    line: usize,
    field: &'static str,
) -> Result<T, LandingsError> {
    value.parse().map_err(|_| LandingsError::BadField {
        line,
        field,
        value: value.to_string(),
    })
}

/// Dates arrive as `month/day` or `month/day/year`; the year column is
/// authoritative, so a trailing date-year is ignored.
fn parse_date(value: &str, line: usize) -> Result<(u32, u32), LandingsError> {
    let mut parts = value.split('/');
    let month = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let day = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    match (month, day) {
        (Some(m), Some(d)) if (1..=12).contains(&m) && (1..=31).contains(&d) => Ok((m, d)),
        _ => Err(LandingsError::BadDate { line, value: value.to_string() }),
    }
}
