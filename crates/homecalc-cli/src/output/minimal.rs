use serde_json::Value;

/// Headline figure of each calculator, in lookup order
const HEADLINE_KEYS: [&str; 5] = [
    "monthly_payment",
    "base_payment",
    "net_salary",
    "final_balance",
    "total_cost",
];

/// Print only the headline figure, for piping into other tools.
///
/// Falls back to the first field of the result when none of the known
/// headline keys is present.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", scalar(result));
        return;
    };

    let headline = HEADLINE_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()));

    match (headline, map.iter().next()) {
        (Some(val), _) => println!("{}", scalar(val)),
        (None, Some((key, val))) => println!("{}: {}", key, scalar(val)),
        (None, None) => {}
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
