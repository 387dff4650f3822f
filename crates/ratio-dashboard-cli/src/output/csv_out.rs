use serde_json::{Map, Value};
use std::io::{self, Write};

/// Flattened cells of one CSV row, as `(column, text)` pairs.
type FlatRow = Vec<(String, String)>;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(value, stdout.lock()) {
        tracing::warn!(error = %e, "failed to write CSV output");
    }
}

/// Objects of named row lists (grouped views, waterfalls, the full report)
/// are written as one block per section: a `# name` line, then a header and
/// its rows. Anything else is a single `field,value` or header-and-rows block.
pub fn write_csv<W: Write>(value: &Value, writer: W) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let body = match value {
        Value::Object(map) => map.get("result").unwrap_or(value),
        _ => value,
    };
    match body {
        Value::Object(map) if map.values().any(Value::is_array) => write_sections(&mut wtr, "", map)?,
        Value::Object(map) => write_fields(&mut wtr, map)?,
        Value::Array(rows) => write_rows(&mut wtr, rows)?,
        other => wtr.write_record([cell(other)])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_sections<W: Write>(
    wtr: &mut csv::Writer<W>,
    prefix: &str,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    for (name, section) in map {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match section {
            Value::Object(inner) if inner.values().any(Value::is_array) => {
                write_sections(wtr, &path, inner)?
            }
            Value::Object(inner) => {
                wtr.write_record([format!("# {path}")])?;
                write_fields(wtr, inner)?;
            }
            Value::Array(rows) => {
                wtr.write_record([format!("# {path}")])?;
                write_rows(wtr, rows)?;
            }
            scalar => wtr.write_record([format!("# {path}"), cell(scalar)])?,
        }
    }
    Ok(())
}

fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &cell(val)])?;
    }
    Ok(())
}

/// Arrays of objects get a header built from every key seen, in first-seen
/// order. Plain values are written one per line.
fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    if !rows.iter().any(Value::is_object) {
        for item in rows {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    }

    let flat: Vec<FlatRow> = rows.iter().flat_map(flatten_row).collect();
    let mut headers: Vec<&str> = Vec::new();
    for row in &flat {
        for (column, _) in row {
            if !headers.contains(&column.as_str()) {
                headers.push(column);
            }
        }
    }

    wtr.write_record(&headers)?;
    for row in &flat {
        let record: Vec<&str> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(column, _)| column == h)
                    .map(|(_, text)| text.as_str())
                    .unwrap_or_default()
            })
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}

fn flatten_row(item: &Value) -> Vec<FlatRow> {
    match item {
        Value::Object(map) => expand(map, ""),
        other => vec![vec![("value".to_string(), cell(other))]],
    }
}

/// Nested objects become dotted columns. A nested array of objects repeats
/// the surrounding fields once per element, so waterfall steps land one per
/// row next to their company and year.
fn expand(map: &Map<String, Value>, prefix: &str) -> Vec<FlatRow> {
    let mut rows: Vec<FlatRow> = vec![Vec::new()];
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let parts: Vec<FlatRow> = match value {
            Value::Object(inner) => expand(inner, &column),
            Value::Array(items) if items.iter().any(Value::is_object) => items
                .iter()
                .flat_map(|item| match item {
                    Value::Object(inner) => expand(inner, &column),
                    other => vec![vec![(column.clone(), cell(other))]],
                })
                .collect(),
            other => vec![vec![(column, cell(other))]],
        };

        let mut next = Vec::with_capacity(rows.len() * parts.len());
        for row in &rows {
            for part in &parts {
                let mut combined = row.clone();
                combined.extend(part.iter().cloned());
                next.push(combined);
            }
        }
        rows = next;
    }
    rows
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("; "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", cell(v)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut out = Vec::new();
        write_csv(value, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_named_sections_get_their_own_header() {
        let groups = json!({
            "liquidity": [
                { "company": "FASING", "metric": "Current Ratio", "value": "1.2" },
                { "company": "FEERUM", "metric": "Current Ratio", "value": "0.9" }
            ],
            "leverage": [],
            "profitability_insights": ["FASING: strong efficiency"]
        });
        assert_eq!(
            render(&groups),
            "# liquidity\n\
             company,metric,value\n\
             FASING,Current Ratio,1.2\n\
             FEERUM,Current Ratio,0.9\n\
             # leverage\n\
             # profitability_insights\n\
             FASING: strong efficiency\n"
        );
    }

    #[test]
    fn test_nested_rows_are_flattened_not_embedded() {
        let waterfall = json!({
            "waterfalls": [{
                "company": "FEERUM",
                "year": "2024",
                "steps": [
                    { "label": "Operating Cash Flow", "value": "40", "measure": "relative" },
                    { "label": "Net Cash Flow", "value": "-3", "measure": "total" }
                ]
            }]
        });
        let text = render(&waterfall);
        assert_eq!(
            text,
            "# waterfalls\n\
             company,year,steps.label,steps.value,steps.measure\n\
             FEERUM,2024,Operating Cash Flow,40,relative\n\
             FEERUM,2024,Net Cash Flow,-3,total\n"
        );
        assert!(!text.contains('['));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_result_sections_nest_by_path() {
        let report = json!({
            "result": {
                "alerts": {
                    "critical": [{ "company": "FASING", "message": "low cover" }],
                    "strengths": []
                },
                "kpis": []
            },
            "warnings": ["ignored here"]
        });
        assert_eq!(
            render(&report),
            "# alerts.critical\n\
             company,message\n\
             FASING,low cover\n\
             # alerts.strengths\n\
             # kpis\n"
        );
    }

    #[test]
    fn test_flat_result_is_field_value() {
        let lookup = json!({
            "result": { "display": "1.20", "value": "1.2", "delta": null }
        });
        assert_eq!(render(&lookup), "field,value\ndisplay,1.20\nvalue,1.2\ndelta,\n");
    }

    #[test]
    fn test_top_level_array_uses_union_of_keys() {
        let rows = json!([
            { "company": "FASING", "2024": "1.2" },
            { "company": "FEERUM", "2023": "0.8" }
        ]);
        assert_eq!(render(&rows), "company,2024,2023\nFASING,1.2,\nFEERUM,,0.8\n");
    }
}
