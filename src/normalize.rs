//! Load-time normalization of double-encoded JSON.
//!
//! Content that went through the persistence layer can come back with nested
//! values stored as strings containing JSON, e.g.
//!
//! ```json
//! { "sections": "[{\"type\":\"text\",\"data\":\"{\\\"title\\\":\\\"A\\\"}\"}]" }
//! ```
//!
//! Normalization is applied once, where data enters the crate
//! ([`crate::document::ContentDocument::from_json`],
//! [`crate::store::SiteStore::from_json`]). Everything past that boundary
//! assumes already-structured values.
//!
//! Decoding follows the schema: only positions that hold an object or an
//! array are candidates.
//!
//! | Position | Expected |
//! |----------|----------|
//! | site file, `contents`, each menu table | object |
//! | table `rows`, document `sections` | array |
//! | each row, each section, section `data` | object |
//! | `heroImages`, `images` | array of objects |
//! | list `items` | array (items themselves stay strings) |
//!
//! Titles, text content, list items and every other string the user wrote
//! are never touched, so a page titled `[2024]` stays a string.

use serde_json::{Map, Value};

const MENU_TABLES: [&str; 3] = ["menus", "megaMenus", "subMegaMenus"];

/// Normalize a whole site file.
pub fn normalize_site(value: Value) -> Value {
    map_object(decode_structured(value), |site| {
        for table in MENU_TABLES {
            update(site, table, |t| normalize_table(t, decode_structured));
        }
        update(site, "contents", |t| normalize_table(t, normalize_document));
    })
}

/// Normalize one content document.
pub fn normalize_document(value: Value) -> Value {
    map_object(decode_structured(value), |doc| {
        update(doc, "sections", |sections| {
            map_array(decode_structured(sections), normalize_section)
        });
    })
}

/// Decode a string holding a JSON object or array, repeatedly for values
/// encoded more than once. Anything else is returned unchanged.
pub fn decode_structured(value: Value) -> Value {
    let mut value = value;
    while let Value::String(s) = &value {
        match decode_embedded(s) {
            Some(inner) => value = inner,
            None => break,
        }
    }
    value
}

fn normalize_table(table: Value, row: fn(Value) -> Value) -> Value {
    map_object(decode_structured(table), |t| {
        update(t, "rows", |rows| map_array(decode_structured(rows), row));
    })
}

fn normalize_section(value: Value) -> Value {
    map_object(decode_structured(value), |section| {
        let tag = section
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();
        update(section, "data", |data| {
            map_object(decode_structured(data), |data| match tag.as_str() {
                "heroSlider" => update(data, "heroImages", |slides| {
                    map_array(decode_structured(slides), decode_structured)
                }),
                "imageGrid" => update(data, "images", |tiles| {
                    map_array(decode_structured(tiles), decode_structured)
                }),
                "list" => update(data, "items", decode_structured),
                _ => {}
            })
        });
    })
}

fn update(map: &mut Map<String, Value>, key: &str, f: impl FnOnce(Value) -> Value) {
    if let Some(slot) = map.get_mut(key) {
        *slot = f(slot.take());
    }
}

fn map_object(value: Value, f: impl FnOnce(&mut Map<String, Value>)) -> Value {
    match value {
        Value::Object(mut map) => {
            f(&mut map);
            Value::Object(map)
        }
        other => other,
    }
}

fn map_array(value: Value, f: impl Fn(Value) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(f).collect()),
        other => other,
    }
}

fn looks_like_json(s: &str) -> bool {
    (s.starts_with('{') && s.ends_with('}')) || (s.starts_with('[') && s.ends_with(']'))
}

/// Decode one level of embedding, including a JSON string that itself wraps
/// an object or array (`"\"{...}\""`).
fn decode_embedded(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if looks_like_json(trimmed) {
        return serde_json::from_str(trimmed).ok();
    }
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(trimmed) {
            if looks_like_json(inner.trim()) {
                return serde_json::from_str(inner.trim()).ok();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with(sections: Value) -> Value {
        json!({"id": 1, "title": "About", "sections": sections})
    }

    #[test]
    fn plain_document_untouched() {
        let value = doc_with(json!([{"type": "text", "data": {"title": "A", "content": "B"}}]));
        assert_eq!(normalize_document(value.clone()), value);
    }

    #[test]
    fn scalar_looking_strings_stay_strings() {
        assert_eq!(decode_structured(json!("42")), json!("42"));
        assert_eq!(decode_structured(json!("true")), json!("true"));
        assert_eq!(decode_structured(json!("\"quoted\"")), json!("\"quoted\""));
    }

    #[test]
    fn embedded_data_is_decoded() {
        let value = doc_with(json!([{"type": "text", "data": "{\"title\":\"A\",\"content\":\"B\"}"}]));
        assert_eq!(
            normalize_document(value),
            doc_with(json!([{"type": "text", "data": {"title": "A", "content": "B"}}]))
        );
    }

    #[test]
    fn embedded_sections_are_decoded_recursively() {
        let inner = json!([{"type": "text", "data": "{\"title\":\"A\"}"}]).to_string();
        assert_eq!(
            normalize_document(doc_with(json!(inner))),
            doc_with(json!([{"type": "text", "data": {"title": "A"}}]))
        );
    }

    #[test]
    fn triple_encoded_data_is_decoded() {
        let once = json!({"heading": "Hi"}).to_string();
        let twice = Value::String(once).to_string();
        let value = doc_with(json!([{"type": "hero", "data": twice}]));
        assert_eq!(
            normalize_document(value),
            doc_with(json!([{"type": "hero", "data": {"heading": "Hi"}}]))
        );
    }

    #[test]
    fn nested_payload_lists_are_decoded() {
        let slides = json!([json!({"heading": "One"}).to_string()]).to_string();
        let items = json!(["a", "[b]"]).to_string();
        let value = doc_with(json!([
            {"type": "heroSlider", "data": {"heroImages": slides}},
            {"type": "list", "data": {"title": "L", "items": items}}
        ]));
        assert_eq!(
            normalize_document(value),
            doc_with(json!([
                {"type": "heroSlider", "data": {"heroImages": [{"heading": "One"}]}},
                {"type": "list", "data": {"title": "L", "items": ["a", "[b]"]}}
            ]))
        );
    }

    #[test]
    fn user_text_that_looks_like_json_is_kept() {
        let value = json!({
            "id": 1,
            "title": "[2024]",
            "sections": [
                {"type": "text", "data": {"title": "{}", "content": "{\"ok\": true}"}},
                {"type": "list", "data": {"title": "[1, 2]", "items": ["[]", "{\"a\": 1}"]}},
                {"type": "hero", "data": {"heading": "[\"x\"]"}}
            ]
        });
        assert_eq!(normalize_document(value.clone()), value);
    }

    #[test]
    fn site_tables_are_decoded() {
        let rows = json!([doc_with(json!("[]"))]).to_string();
        let site = json!({
            "menus": json!({"nextId": 2, "rows": [{"id": 1, "title": "[Home]", "path": "/"}]}).to_string(),
            "contents": {"nextId": 2, "rows": rows}
        });
        assert_eq!(
            normalize_site(site),
            json!({
                "menus": {"nextId": 2, "rows": [{"id": 1, "title": "[Home]", "path": "/"}]},
                "contents": {"nextId": 2, "rows": [doc_with(json!([]))]}
            })
        );
    }

    #[test]
    fn bracketed_text_that_is_not_json_is_kept() {
        assert_eq!(
            decode_structured(json!("[draft] needs review")),
            json!("[draft] needs review")
        );
    }

    #[test]
    fn whitespace_around_embedded_json_is_tolerated() {
        assert_eq!(decode_structured(json!("  {\"a\": 1}\n")), json!({"a": 1}));
    }
}
