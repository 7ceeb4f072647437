//! Lookups on raw JSON documents that treat `null` as absent

use serde_json::Value;

/// Value under `key`, or `None` when the key is missing or holds `null`
pub fn value_or_absent<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    document.get(key).filter(|value| !value.is_null())
}

/// Value at a dotted `path` (e.g. `"report.location"`), or `None` when any
/// segment is missing or the final value is `null`
pub fn value_at_path_or_absent<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| value_or_absent(current, segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_absent() {
        let doc = json!({"shape": null, "location": "Austin, TX"});
        assert_eq!(value_or_absent(&doc, "shape"), None);
        assert_eq!(value_or_absent(&doc, "missing"), None);
        assert_eq!(value_or_absent(&doc, "location"), Some(&json!("Austin, TX")));
    }

    #[test]
    fn non_objects_have_no_keys() {
        assert_eq!(value_or_absent(&json!([1, 2]), "id"), None);
        assert_eq!(value_or_absent(&json!("text"), "id"), None);
    }

    #[test]
    fn dotted_paths() {
        let doc = json!({"report": {"location": "Reno", "shape": null}});
        assert_eq!(
            value_at_path_or_absent(&doc, "report.location"),
            Some(&json!("Reno"))
        );
        assert_eq!(value_at_path_or_absent(&doc, "report.shape"), None);
        assert_eq!(value_at_path_or_absent(&doc, "report.missing.deeper"), None);
        assert_eq!(value_at_path_or_absent(&doc, "report"), doc.get("report"));
    }
}
