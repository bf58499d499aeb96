//! Field-name translation between the remote store and in-memory records.
//!
//! The hosted database names columns in snake_case (`offer_page_id`), while
//! records inside the kernel serialize with camelCase keys (`offerPageId`).
//! Every key crossing the backend boundary goes through this module.

use serde_json::{Map, Value};

/// Convert a camelCase key to snake_case (`offerPageId` -> `offer_page_id`).
pub fn to_snake_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a snake_case key to camelCase (`offer_page_id` -> `offerPageId`).
///
/// An underscore is only consumed when a lowercase letter follows it, so
/// keys such as `item_2` or `_private` pass through unchanged.
pub fn to_camel_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_'
            && !out.is_empty()
            && let Some(next) = chars.peek().copied()
            && next.is_ascii_lowercase()
        {
            chars.next();
            out.push(next.to_ascii_uppercase());
            continue;
        }
        out.push(ch);
    }
    out
}

/// Deep-convert all object keys in `value` to snake_case.
pub fn to_snake_case(value: Value) -> Value {
    map_keys(value, &to_snake_key)
}

/// Deep-convert all object keys in `value` to camelCase.
pub fn to_camel_case(value: Value) -> Value {
    map_keys(value, &to_camel_key)
}

fn map_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (convert(&k), map_keys(v, convert)))
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| map_keys(v, convert)).collect())
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_key_conversion() {
        assert_eq!(to_snake_key("offerPageId"), "offer_page_id");
        assert_eq!(to_snake_key("isActive"), "is_active");
        assert_eq!(to_snake_key("id"), "id");
        assert_eq!(to_snake_key("monthlyMin"), "monthly_min");
    }

    #[test]
    fn camel_key_conversion() {
        assert_eq!(to_camel_key("offer_page_id"), "offerPageId");
        assert_eq!(to_camel_key("is_test"), "isTest");
        assert_eq!(to_camel_key("slug"), "slug");
    }

    #[test]
    fn camel_key_keeps_non_letter_underscores() {
        assert_eq!(to_camel_key("item_2"), "item_2");
        assert_eq!(to_camel_key("_private"), "_private");
        assert_eq!(to_camel_key("trailing_"), "trailing_");
    }

    #[test]
    fn deep_conversion_touches_keys_only() {
        let remote = json!({
            "offer_page_id": "P1",
            "type": "pricing_table",
            "display": { "items": [{ "pricing_note": "per_person" }] }
        });

        let local = to_camel_case(remote.clone());
        assert_eq!(
            local,
            json!({
                "offerPageId": "P1",
                "type": "pricing_table",
                "display": { "items": [{ "pricingNote": "per_person" }] }
            })
        );
        assert_eq!(to_snake_case(local), remote);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(to_camel_case(json!(42)), json!(42));
        assert_eq!(to_snake_case(json!("someValue")), json!("someValue"));
        assert_eq!(to_snake_case(Value::Null), Value::Null);
    }
}
