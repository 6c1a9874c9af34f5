use std::io::{self, Write};

use serde::Serialize;

use crate::app::OfficeInfo;
use crate::query::Table;
use crate::registry::OfficeListing;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_offices(result: &OfficeListing) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_office(result: &OfficeInfo) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_table(result: &Table) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Fixed-width plain-text rendering with a header rule. Empty cells stay
/// empty (unmatched observation columns in a left join).
pub fn render_table(table: &Table) -> String {
    let columns = table.columns();
    let rows = table.rows();

    let mut widths: Vec<usize> = columns.iter().map(|name| name.len()).collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            if index < widths.len() {
                widths[index] = widths[index].max(cell.len());
            }
        }
    }

    let mut out = String::new();
    render_row(&mut out, columns.iter().map(|name| name.to_string()), &widths);
    render_row(
        &mut out,
        widths.iter().map(|width| "-".repeat(*width)),
        &widths,
    );
    for row in rows {
        render_row(&mut out, row.into_iter(), &widths);
    }
    out
}

fn render_row<I: Iterator<Item = String>>(out: &mut String, cells: I, widths: &[usize]) {
    let rendered: Vec<String> = cells
        .enumerate()
        .map(|(index, cell)| {
            let width = widths.get(index).copied().unwrap_or(0);
            format!("{cell:<width$}")
        })
        .collect();
    out.push_str(rendered.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LausSummaryRow;

    #[test]
    fn renders_header_and_rows() {
        let table = Table::LausSummary(vec![LausSummaryRow {
            period: chrono::NaiveDate::from_ymd_opt(2023, 8, 31).unwrap(),
            civilian_labor_force: 3000,
            employed: 2800,
            unemployed: 200,
            unemployment_rate: 200.0 / 3000.0 * 100.0,
        }]);
        let rendered = render_table(&table);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("period"));
        assert!(lines[2].contains("2023-08-31"));
        assert!(lines[2].contains("6.67"));
    }
}
