use crate::config::{load_config, GlobalConfig, ReadConfig};
use crate::converter::{convert_field, convert_row_to_text, Converted, ConverterRegistry};
use crate::error::{SheetError, SheetResult};
use crate::excel::SheetReader;
use crate::types::{CellData, CellValue, Row};
use chrono::NaiveDateTime;
use colored::Colorize;
use serde_json::{json, Map, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

fn read_config(config: Option<&Path>) -> SheetResult<ReadConfig> {
    match config {
        Some(path) => {
            debug!(path = %path.display(), "loading read config");
            load_config(path)
        }
        None => Ok(ReadConfig::default()),
    }
}

/// Read `sheet` and switch `global` to 1904 dates when the workbook uses them.
fn read_sheet(file: &Path, sheet: Option<&str>, global: &mut GlobalConfig) -> SheetResult<Vec<Row>> {
    let mut reader = SheetReader::open(file)?;
    let rows = reader.read_rows(sheet)?;
    if reader.uses_1904_dates() && !global.use_1904_windowing {
        debug!(path = %file.display(), "workbook uses the 1904 date system");
        global.use_1904_windowing = true;
    }
    Ok(rows)
}

/// Execute the text command
pub fn text(
    file: PathBuf,
    sheet: Option<String>,
    config: Option<PathBuf>,
    skip: usize,
) -> SheetResult<()> {
    eprintln!("{}", "📄 Sheetbind - Text projection".bold().green());
    eprintln!("   File: {}", file.display());

    let mut read_config = read_config(config.as_deref())?;
    let sheet = sheet.or_else(|| read_config.sheet.clone());
    let registry = ConverterRegistry::with_defaults();
    let rows = read_sheet(&file, sheet.as_deref(), &mut read_config.global)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut written = 0;
    for (idx, row) in rows.iter().enumerate().skip(skip) {
        let text_row = convert_row_to_text(row, &registry, &read_config.global).map_err(|e| {
            SheetError::Row {
                row: idx + 1,
                source: e,
            }
        })?;
        writeln!(out, "{}", serde_json::to_string(&text_row)?)?;
        written += 1;
    }

    eprintln!("{} {} rows", "✅ Converted".bold().green(), written);
    Ok(())
}

/// Execute the bind command
pub fn bind(file: PathBuf, config: PathBuf, sheet: Option<String>) -> SheetResult<()> {
    eprintln!("{}", "🔗 Sheetbind - Typed binding".bold().green());
    eprintln!("   File:   {}", file.display());
    eprintln!("   Config: {}", config.display());

    let mut read_config = load_config(&config)?;
    if read_config.columns.is_empty() {
        return Err(SheetError::Config(format!(
            "{} declares no columns to bind",
            config.display()
        )));
    }
    let fields = read_config.descriptors()?;
    let sheet = sheet.or_else(|| read_config.sheet.clone());
    let registry = ConverterRegistry::with_defaults();
    let rows = read_sheet(&file, sheet.as_deref(), &mut read_config.global)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut written = 0;
    for (idx, row) in rows.iter().enumerate().skip(read_config.header_rows) {
        let mut record = Map::new();
        for (column, field) in &fields {
            let cell = row.get(column).cloned().unwrap_or(CellValue::Empty);
            if cell.is_empty() && field.converter().is_none() {
                record.insert(field.name().to_string(), Value::Null);
                continue;
            }
            let value = convert_field(&cell, Some(field), &registry, &read_config.global)
                .map_err(|e| SheetError::Row {
                    row: idx + 1,
                    source: e,
                })?;
            record.insert(field.name().to_string(), render_value(&value));
        }
        writeln!(out, "{}", Value::Object(record))?;
        written += 1;
    }

    eprintln!("{} {} rows", "✅ Bound".bold().green(), written);
    Ok(())
}

/// Execute the types command
pub fn types() -> SheetResult<()> {
    let registry = ConverterRegistry::with_defaults();
    println!("{}", "🔎 Built-in converters".bold().green());
    for key in registry.keys() {
        println!("   {} <- {}", key.target.name().bright_blue(), key.kind);
    }
    Ok(())
}

/// Render a converted value for JSON output.
fn render_value(value: &Converted) -> Value {
    render_plain(value.as_ref()).unwrap_or_else(|| {
        render_container(value.as_ref()).unwrap_or_else(|| json!("<opaque>"))
    })
}

fn render_plain(value: &(dyn std::any::Any + Send + Sync)) -> Option<Value> {
    if let Some(s) = value.downcast_ref::<String>() {
        return Some(json!(s));
    }
    if let Some(n) = value.downcast_ref::<f64>() {
        return Some(json!(n));
    }
    if let Some(n) = value.downcast_ref::<i64>() {
        return Some(json!(n));
    }
    if let Some(b) = value.downcast_ref::<bool>() {
        return Some(json!(b));
    }
    if let Some(dt) = value.downcast_ref::<NaiveDateTime>() {
        return Some(json!(dt.format("%Y-%m-%dT%H:%M:%S").to_string()));
    }
    None
}

fn render_container(value: &(dyn std::any::Any + Send + Sync)) -> Option<Value> {
    fn cell_json<T>(data: &CellData<T>, rendered: Value) -> Value {
        json!({ "kind": data.kind().as_str(), "data": rendered })
    }

    if let Some(d) = value.downcast_ref::<CellData<String>>() {
        return Some(cell_json(d, json!(d.data)));
    }
    if let Some(d) = value.downcast_ref::<CellData<f64>>() {
        return Some(cell_json(d, json!(d.data)));
    }
    if let Some(d) = value.downcast_ref::<CellData<i64>>() {
        return Some(cell_json(d, json!(d.data)));
    }
    if let Some(d) = value.downcast_ref::<CellData<bool>>() {
        return Some(cell_json(d, json!(d.data)));
    }
    if let Some(d) = value.downcast_ref::<CellData<NaiveDateTime>>() {
        let text = d.data.format("%Y-%m-%dT%H:%M:%S").to_string();
        return Some(cell_json(d, json!(text)));
    }
    None
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
