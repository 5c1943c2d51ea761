pub fn escape_json(s: &str) -> String {
    s.replace('"', "\\\"")
}

pub fn field_to_bson(field: &str, infer: bool) -> bson::Bson {
    if !infer {
        return bson::Bson::String(field.to_string());
    }
    if let Ok(i) = field.parse::<i64>() {
        return bson::Bson::Int64(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return bson::Bson::Double(f);
    }
    match field.to_lowercase().as_str() {
        "true" => bson::Bson::Boolean(true),
        "false" => bson::Bson::Boolean(false),
        _ => bson::Bson::String(field.to_string()),
    }
}
