use serde_json::Value;

/// Print just the key answer from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object. Lists of strings (alert
/// messages, company names) are printed one per line.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["display", "path", "companies", "critical"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    print_lines(val);
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    print_lines(result_obj);
}

fn print_lines(value: &Value) {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => {
            for item in items {
                println!("{}", format_minimal(item));
            }
        }
        _ => println!("{}", format_minimal(value)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
