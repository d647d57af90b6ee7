//! Writes one grid in every supported format and reads each file back.
//!
//! Run with: cargo run --example format_tour -p tabula-sheet

use tabula_sheet::{read_path, save, CellValue, ReadOptions, WriteOptions, SUPPORTED_FORMATS};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Format Tour ===\n");

    let temp_dir = env::temp_dir();

    let grid = vec![
        vec![CellValue::from("item"), CellValue::from("qty"), CellValue::from("price")],
        vec![CellValue::from("bolt"), CellValue::Int(12), CellValue::Float(0.25)],
        vec![CellValue::from("nut"), CellValue::Int(40), CellValue::Null],
        vec![CellValue::from("total"), CellValue::Null, CellValue::formula("=B2*C2")],
    ];

    for format in SUPPORTED_FORMATS {
        let path = temp_dir.join(format!("tabula_tour.{format}"));
        save(&grid, &path, &WriteOptions::default())?;
        let restored = read_path(&path, &ReadOptions::default())?;

        println!("--- {format} ({:?}) ---", format.family());
        for row in &restored {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:?}")).collect();
            println!("  {}", cells.join(" | "));
        }
        println!();

        std::fs::remove_file(&path)?;
    }

    println!("=== Tour Complete ===");
    Ok(())
}
