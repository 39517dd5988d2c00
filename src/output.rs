// File writers and console table previews.
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("cannot open {} for writing", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Print up to `max_rows` rows as a markdown table, the way all the report
/// previews render on the console.
pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Tabled, Clone, PartialEq, Debug)]
    struct Row {
        name: String,
        value: u64,
    }

    #[test]
    fn csv_and_json_round_trip_through_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            Row {
                name: "a".into(),
                value: 1,
            },
            Row {
                name: "b".into(),
                value: 2,
            },
        ];

        let csv_path = dir.path().join("out/reports/rows.csv");
        write_csv(&csv_path, &rows).unwrap();
        let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
        let back: Vec<Row> = rdr.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(back, rows);

        let json_path = dir.path().join("out/rows.json");
        write_json(&json_path, &rows).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        let back: Vec<Row> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rows);
    }
}
