use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How an attribute value is matched against the live UI tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    /// Full string equality
    Exact,
    /// Substring match
    Contains,
    /// Prefix match
    StartsWith,
    /// Regular-expression match
    Matches,
}

/// An attribute value in one of the forms the UI tree exposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Free-form text (text, content-desc, resource-id, class, ...)
    Text(String),
    /// Boolean widget flag (checkable, clickable, enabled, ...)
    Flag(bool),
    /// Zero-based counter (index, instance)
    Number(i64),
}

impl AttrValue {
    /// Literal string form as it appears in predicates and selector calls
    pub fn render(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Flag(b) => b.to_string(),
            AttrValue::Number(n) => n.to_string(),
        }
    }

    /// Whether this value carries no usable information
    pub fn is_blank(&self) -> bool {
        match self {
            AttrValue::Text(s) => s.trim().is_empty() || s == "null",
            _ => false,
        }
    }

    /// The value form a tree dump would use for this attribute: boolean
    /// flags become [`AttrValue::Flag`], everything else stays text
    pub fn typed(name: &str, raw: &str) -> AttrValue {
        if AttributeMap::is_flag_attribute(name) {
            match raw {
                "true" => return AttrValue::Flag(true),
                "false" => return AttrValue::Flag(false),
                _ => {}
            }
        }
        AttrValue::Text(raw.to_string())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value)
    }
}

/// A value paired with the mode it is matched under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMatch {
    /// The expected value
    pub value: AttrValue,
    /// How the value is compared
    pub mode: MatchMode,
}

impl AttributeMatch {
    /// Exact-mode match for any value form
    pub fn exact(value: impl Into<AttrValue>) -> Self {
        Self { value: value.into(), mode: MatchMode::Exact }
    }

    /// Match with an explicit mode
    pub fn with_mode(value: impl Into<AttrValue>, mode: MatchMode) -> Self {
        Self { value: value.into(), mode }
    }
}

/// Attribute names whose values are boolean widget flags
pub const FLAG_ATTRIBUTES: [&str; 11] = [
    "checkable",
    "checked",
    "clickable",
    "enabled",
    "focusable",
    "focused",
    "long-clickable",
    "scrollable",
    "selected",
    "password",
    "displayed",
];

/// Ordered mapping from semantic attribute names to match conditions.
///
/// Insertion order is significant: it determines the order in which
/// predicate fragments are emitted when the map is translated to another
/// notation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeMap {
    entries: IndexMap<String, AttributeMatch>,
}

impl AttributeMap {
    /// Create an empty AttributeMap
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Insert or replace a match condition for an attribute
    pub fn set(&mut self, name: impl Into<String>, matcher: AttributeMatch) {
        self.entries.insert(name.into(), matcher);
    }

    /// Builder method: add a match condition for an attribute
    pub fn with(mut self, name: impl Into<String>, matcher: AttributeMatch) -> Self {
        self.set(name, matcher);
        self
    }

    /// Builder method: exact text match
    pub fn text(self, value: impl Into<String>) -> Self {
        self.with("text", AttributeMatch::exact(value.into()))
    }

    /// Builder method: substring text match
    pub fn text_contains(self, value: impl Into<String>) -> Self {
        self.with("text", AttributeMatch::with_mode(value.into(), MatchMode::Contains))
    }

    /// Builder method: exact content-desc match
    pub fn description(self, value: impl Into<String>) -> Self {
        self.with("content-desc", AttributeMatch::exact(value.into()))
    }

    /// Builder method: exact resource-id match
    pub fn resource_id(self, value: impl Into<String>) -> Self {
        self.with("resource-id", AttributeMatch::exact(value.into()))
    }

    /// Builder method: exact widget class match
    pub fn class(self, value: impl Into<String>) -> Self {
        self.with("class", AttributeMatch::exact(value.into()))
    }

    /// Builder method: boolean widget flag
    pub fn flag(self, name: impl Into<String>, value: bool) -> Self {
        self.with(name, AttributeMatch::exact(value))
    }

    /// Builder method: zero-based position among siblings
    pub fn index(self, value: i64) -> Self {
        self.with("index", AttributeMatch::exact(value))
    }

    /// Builder method: zero-based occurrence in the whole tree
    pub fn instance(self, value: i64) -> Self {
        self.with("instance", AttributeMatch::exact(value))
    }

    /// Get the match condition for an attribute
    pub fn get(&self, name: &str) -> Option<&AttributeMatch> {
        self.entries.get(name)
    }

    /// Iterate over (name, match) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeMatch)> {
        self.entries.iter()
    }

    /// Number of attribute conditions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no conditions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this map without blank or "null" valued entries.
    ///
    /// Tree dumps report missing attributes as the literal string "null";
    /// carrying those into a translated locator would match nothing.
    pub fn stripped(&self) -> AttributeMap {
        let entries = self
            .entries
            .iter()
            .filter(|(_, m)| !m.value.is_blank())
            .map(|(k, m)| (k.clone(), m.clone()))
            .collect();
        AttributeMap { entries }
    }

    /// Whether the map still discriminates anything after stripping
    pub fn is_discriminating(&self) -> bool {
        !self.stripped().is_empty()
    }

    /// Whether the named attribute is a boolean widget flag
    pub fn is_flag_attribute(name: &str) -> bool {
        FLAG_ATTRIBUTES.contains(&name)
    }
}

impl FromIterator<(String, AttributeMatch)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, AttributeMatch)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let map = AttributeMap::new()
            .text("Submit")
            .class("android.widget.Button")
            .flag("enabled", true);

        let names: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["text", "class", "enabled"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = AttributeMap::new().text("Old").class("Button");
        map.set("text", AttributeMatch::exact("New"));

        let names: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["text", "class"]);
        assert_eq!(map.get("text").unwrap().value, AttrValue::Text("New".to_string()));
    }

    #[test]
    fn test_stripped_drops_null_and_blank() {
        let map = AttributeMap::new()
            .text("null")
            .description("  ")
            .resource_id("com.app:id/ok")
            .flag("enabled", true);

        let stripped = map.stripped();
        assert_eq!(stripped.len(), 2);
        assert!(stripped.get("text").is_none());
        assert!(stripped.get("content-desc").is_none());
        assert!(stripped.get("resource-id").is_some());
        assert!(stripped.get("enabled").is_some());
    }

    #[test]
    fn test_discriminating() {
        assert!(!AttributeMap::new().is_discriminating());
        assert!(!AttributeMap::new().text("null").is_discriminating());
        assert!(AttributeMap::new().text("OK").is_discriminating());
    }

    #[test]
    fn test_attr_value_render() {
        assert_eq!(AttrValue::Text("OK".to_string()).render(), "OK");
        assert_eq!(AttrValue::Flag(true).render(), "true");
        assert_eq!(AttrValue::Flag(false).render(), "false");
        assert_eq!(AttrValue::Number(4).render(), "4");
    }

    #[test]
    fn test_flag_attribute_lookup() {
        assert!(AttributeMap::is_flag_attribute("clickable"));
        assert!(AttributeMap::is_flag_attribute("long-clickable"));
        assert!(!AttributeMap::is_flag_attribute("text"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let map = AttributeMap::new().text("Submit").flag("checked", false).index(2);

        let json = serde_json::to_string(&map).unwrap();
        let back: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
