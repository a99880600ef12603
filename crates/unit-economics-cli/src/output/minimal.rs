use serde_json::Value;

use super::{format_scalar, primary_series};

/// Key answer fields, in priority order.
const PRIORITY_KEYS: [&str; 6] = [
    "net_margin",
    "final_active_users",
    "break_even",
    "required_conversions",
    "most_profitable",
    "gross_profit",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known answer fields first, then the last row of the
/// result's series (the furthest projection point), then the first field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", format_scalar(result));
        return;
    };

    for key in PRIORITY_KEYS {
        match map.get(key) {
            Some(Value::Null) | None => continue,
            Some(Value::Object(inner)) => {
                // nested answer, e.g. break_even.required_conversions
                if let Some(v) = inner.get("required_conversions").filter(|v| !v.is_null()) {
                    println!("{}", format_scalar(v));
                    return;
                }
            }
            Some(v) => {
                println!("{}", format_scalar(v));
                return;
            }
        }
    }

    if let Some((_, rows)) = primary_series(map) {
        if let Some(Value::Object(last)) = rows.last() {
            for key in ["gross_profit", "net_margin", "active_users"] {
                if let Some(v) = last.get(key) {
                    println!("{}", format_scalar(v));
                    return;
                }
            }
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_scalar(val));
    }
}
