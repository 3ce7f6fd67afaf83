use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Column {
    label: &'static str,
    align: Align,
}

/// Column-aligned listing for `user list` and `project show` style output.
/// Counters and phase numbers go in right-aligned columns.
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(mut self, label: &'static str) -> Self {
        self.columns.push(Column {
            label,
            align: Align::Left,
        });
        self
    }

    pub fn numeric(mut self, label: &'static str) -> Self {
        self.columns.push(Column {
            label,
            align: Align::Right,
        });
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.label.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        self.emit(&mut out, &widths, |i| self.columns[i].label.to_string());
        self.emit(&mut out, &widths, |i| "-".repeat(widths[i]));
        for row in &self.rows {
            self.emit(&mut out, &widths, |i| {
                row.get(i).cloned().unwrap_or_default()
            });
        }
        out
    }

    fn emit(&self, out: &mut String, widths: &[usize], cell: impl Fn(usize) -> String) {
        let line: Vec<String> = (0..self.columns.len())
            .map(|i| {
                let text = cell(i);
                let pad = widths[i].saturating_sub(text.chars().count());
                match self.columns[i].align {
                    Align::Left => format!("{}{}", text, " ".repeat(pad)),
                    Align::Right => format!("{}{}", " ".repeat(pad), text),
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_to_widest_cell() {
        let mut table = Table::new().column("ID").column("NAME");
        table.row(vec!["u1".into(), "Ana".into()]);
        table.row(vec!["u2".into(), "João Completo".into()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "ID  NAME");
        assert_eq!(lines[1], "--  -------------");
        assert_eq!(lines[2], "u1  Ana");
        assert_eq!(lines[3], "u2  João Completo");
    }

    #[test]
    fn numeric_columns_are_right_aligned() {
        let mut table = Table::new().column("PHASE").numeric("CLIENTS");
        table.row(vec!["Diagnóstico".into(), "2".into()]);
        table.row(vec!["Suporte".into(), "14".into()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], "Diagnóstico        2");
        assert_eq!(lines[3], "Suporte           14");
    }

    #[test]
    fn short_rows_leave_trailing_columns_blank() {
        let mut table = Table::new().column("A").column("B");
        table.row(vec!["only".into()]);
        assert_eq!(table.render().lines().last(), Some("only"));
    }
}
