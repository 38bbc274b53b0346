use std::io::{self, Write};

use crate::table::TidyTable;

pub struct TableOutput;

impl TableOutput {
    pub fn print_tsv(table: &TidyTable) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", table.column_names().join("\t"))?;
        for row in 0..table.len() {
            for column in &table.dimensions {
                write!(stdout, "{}\t", column.data.get(row).unwrap_or_default())?;
            }
            let value = match table.values[row] {
                Some(value) => value.to_string(),
                None => String::new(),
            };
            writeln!(stdout, "{}\t{}", table.time[row], value)?;
        }
        Ok(())
    }

    pub fn print_json(table: &TidyTable) -> io::Result<()> {
        let json = serde_json::to_string_pretty(table).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
