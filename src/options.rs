use serde_json::{Map, Value};

/// Read-only view over a loosely typed option bag.
///
/// Anything that is not a JSON object reads as an empty bag. A field whose
/// JSON type does not fit the accessor reads as absent, the same as a field
/// that was never given.
#[derive(Debug, Clone, Copy)]
pub struct OptionBag<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> OptionBag<'a> {
    pub fn new(options: &'a Value) -> Self {
        Self {
            map: options.as_object(),
        }
    }

    pub fn empty() -> OptionBag<'static> {
        OptionBag { map: None }
    }

    pub fn is_empty(&self) -> bool {
        self.map.map(Map::is_empty).unwrap_or(true)
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.and_then(|map| map.get(name))
    }

    /// Follows nested objects, e.g. `["data", "target", "files"]`.
    pub fn path(&self, path: &[&str]) -> Option<&'a Value> {
        let (first, rest) = path.split_first()?;
        let mut cursor = self.get(first)?;
        for segment in rest {
            cursor = cursor.as_object()?.get(*segment)?;
        }
        Some(cursor)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Integral numbers only; `13.0` is accepted, `13.5` is not.
    pub fn integer(&self, name: &str) -> Option<i64> {
        let value = self.get(name)?;
        if let Some(int) = value.as_i64() {
            return Some(int);
        }
        let float = value.as_f64()?;
        (float.fract() == 0.0 && float.abs() < i64::MAX as f64).then_some(float as i64)
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn array(&self, name: &str) -> Option<&'a [Value]> {
        self.get(name).and_then(Value::as_array).map(Vec::as_slice)
    }
}

impl<'a> From<&'a Value> for OptionBag<'a> {
    fn from(options: &'a Value) -> Self {
        Self::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_bags_read_as_empty() {
        for value in [json!(null), json!(3), json!("key"), json!([1, 2])] {
            let bag = OptionBag::new(&value);
            assert!(bag.is_empty());
            assert!(bag.get("key").is_none());
        }
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let value = json!({ "key": 5, "deltaY": "200", "elementScroll": "yes" });
        let bag = OptionBag::new(&value);
        assert_eq!(bag.text("key"), None);
        assert_eq!(bag.number("deltaY"), None);
        assert_eq!(bag.flag("elementScroll"), None);
        assert!(!bag.is_empty());
    }

    #[test]
    fn integer_accepts_integral_floats_only() {
        let value = json!({ "a": 13, "b": 13.0, "c": 13.5, "d": -2 });
        let bag = OptionBag::new(&value);
        assert_eq!(bag.integer("a"), Some(13));
        assert_eq!(bag.integer("b"), Some(13));
        assert_eq!(bag.integer("c"), None);
        assert_eq!(bag.integer("d"), Some(-2));
    }

    #[test]
    fn path_walks_nested_objects() {
        let value = json!({ "data": { "target": { "files": [{ "file": "a" }] } } });
        let bag = OptionBag::new(&value);
        let files = bag
            .path(&["data", "target", "files"])
            .and_then(Value::as_array)
            .expect("files array");
        assert_eq!(files.len(), 1);
        assert!(bag.path(&["data", "missing", "files"]).is_none());
        assert!(bag.path(&["data", "target", "files", "0"]).is_none());
        assert!(bag.path(&[]).is_none());
    }
}
