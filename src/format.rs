//! Aligned column output for record listings

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Collects rows, then writes them with every column padded to its widest cell.
#[derive(Debug)]
pub struct Columns {
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Columns {
    /// One entry per column; rows shorter than this leave the tail empty.
    pub fn new(aligns: &[Align]) -> Self {
        Self {
            aligns: aligns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.rows.push(row.into_iter().collect());
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.aligns.len()];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        widths
    }

    /// Write all rows. Trailing padding is stripped from each line.
    pub fn flush<W: Write>(self, out: &mut W) -> io::Result<()> {
        let widths = self.widths();

        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                if i > 0 {
                    line.push(' ');
                }
                let pad = widths[i].saturating_sub(cell.chars().count());
                match self.aligns[i] {
                    Align::Left => {
                        line.push_str(cell);
                        line.push_str(&" ".repeat(pad));
                    }
                    Align::Right => {
                        line.push_str(&" ".repeat(pad));
                        line.push_str(cell);
                    }
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(columns: Columns) -> String {
        let mut out = Vec::new();
        columns.flush(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_alignment() {
        let mut columns = Columns::new(&[Align::Right, Align::Left, Align::Left]);
        columns.push(["1:".to_string(), "Alpha".to_string(), "(active)".to_string()]);
        columns.push(["12:".to_string(), "Be".to_string(), "(paused)".to_string()]);

        assert_eq!(
            render(columns),
            " 1: Alpha (active)\n12: Be    (paused)\n"
        );
    }

    #[test]
    fn test_trailing_space_trimmed() {
        let mut columns = Columns::new(&[Align::Left, Align::Left]);
        columns.push(["long name".to_string(), String::new()]);
        columns.push(["x".to_string(), String::new()]);
        assert_eq!(render(columns), "long name\nx\n");
    }

    #[test]
    fn test_empty() {
        let columns = Columns::new(&[Align::Left]);
        assert_eq!(render(columns), "");
    }

    #[test]
    fn test_width_counts_characters() {
        let mut columns = Columns::new(&[Align::Left, Align::Left]);
        columns.push(["café".to_string(), "x".to_string()]);
        columns.push(["cafe".to_string(), "y".to_string()]);
        assert_eq!(render(columns), "café x\ncafe y\n");
    }
}
