use crate::utils::error::{CrmError, Result};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
}

/// 主控台表格：一列標題加上欄數相同的資料列
#[derive(Debug, Clone)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.header.len() {
            return Err(CrmError::validation(
                "table.row",
                format!(
                    "Row has {} columns, header has {}",
                    row.len(),
                    self.header.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, title)| {
                self.rows
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(title.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let format_line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_line(&self.header));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            lines.push(format_line(row));
        }
        lines.join("\n")
    }

    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => {
                writeln!(out, "{}", self.render())?;
                if self.is_empty() {
                    writeln!(out, "(no records)")?;
                }
            }
            OutputFormat::Csv => self.write_csv(&mut *out)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pads_columns() {
        let mut table = Table::new(["Name", "Phone"]);
        table.push_row(["Contoso Ltd", "555-0100"]).unwrap();
        table.push_row(["A", ""]).unwrap();

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Name         Phone");
        assert_eq!(lines[1], "-----------  --------");
        assert_eq!(lines[2], "Contoso Ltd  555-0100");
        assert_eq!(lines[3], "A");
    }

    #[test]
    fn test_push_row_rejects_column_mismatch() {
        let mut table = Table::new(["Name", "Phone"]);
        let err = table.push_row(["only one"]).unwrap_err();
        assert!(err.is_validation());
        assert!(table.is_empty());
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let mut table = Table::new(["Name", "City"]);
        table.push_row(["Fabrikam, Inc.", "Redmond"]).unwrap();

        let mut out = Vec::new();
        table.write_to(&mut out, OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Name,City\n\"Fabrikam, Inc.\",Redmond\n");
    }
}
