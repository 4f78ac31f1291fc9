//! Pure translation between the three locator notations.
//!
//! XPath is the canonical intermediate form: it is the only notation that
//! can express structural axes, so every composition in
//! [`crate::dom`] funnels through [`to_xpath`]. Translation is computed on
//! every call and never cached.

use crate::error::{AutomationError, Operand, Result};
use crate::locator::parse;
use crate::locator::{AttrValue, AttributeMap, AttributeMatch, Locator, MatchMode, UiSelectorExpr, XPathExpr};

/// Target-notation names used in translation errors
pub(crate) const NOTATION_UI_SELECTOR: &str = "UiSelector";
pub(crate) const NOTATION_ATTRIBUTES: &str = "attribute-map";

/// `(attribute, mode) -> UiSelector method` translation table.
///
/// A pair missing from this table has no selector-DSL equivalent and must
/// fail loudly rather than silently drop the condition.
const UI_METHOD_TABLE: &[(&str, MatchMode, &str)] = &[
    ("text", MatchMode::Exact, "text"),
    ("text", MatchMode::Contains, "textContains"),
    ("text", MatchMode::StartsWith, "textStartsWith"),
    ("text", MatchMode::Matches, "textMatches"),
    ("content-desc", MatchMode::Exact, "description"),
    ("content-desc", MatchMode::Contains, "descriptionContains"),
    ("content-desc", MatchMode::StartsWith, "descriptionStartsWith"),
    ("content-desc", MatchMode::Matches, "descriptionMatches"),
    ("resource-id", MatchMode::Exact, "resourceId"),
    ("resource-id", MatchMode::Matches, "resourceIdMatches"),
    ("package", MatchMode::Exact, "packageName"),
    ("package", MatchMode::Matches, "packageNameMatches"),
    ("class", MatchMode::Exact, "className"),
    ("class", MatchMode::Matches, "classNameMatches"),
    ("checkable", MatchMode::Exact, "checkable"),
    ("checked", MatchMode::Exact, "checked"),
    ("clickable", MatchMode::Exact, "clickable"),
    ("enabled", MatchMode::Exact, "enabled"),
    ("focusable", MatchMode::Exact, "focusable"),
    ("focused", MatchMode::Exact, "focused"),
    ("long-clickable", MatchMode::Exact, "longClickable"),
    ("scrollable", MatchMode::Exact, "scrollable"),
    ("selected", MatchMode::Exact, "selected"),
    ("password", MatchMode::Exact, "password"),
    ("index", MatchMode::Exact, "index"),
    ("instance", MatchMode::Exact, "instance"),
];

/// UiSelector method for an attribute/mode pair, if one exists
pub(crate) fn ui_method(attribute: &str, mode: MatchMode) -> Option<&'static str> {
    UI_METHOD_TABLE
        .iter()
        .find(|(attr, m, _)| *attr == attribute && *m == mode)
        .map(|(_, _, method)| *method)
}

/// Attribute/mode pair for a UiSelector method, if one exists
pub(crate) fn ui_method_reverse(method: &str) -> Option<(&'static str, MatchMode)> {
    UI_METHOD_TABLE
        .iter()
        .find(|(_, _, m)| *m == method)
        .map(|(attr, mode, _)| (*attr, *mode))
}

/// Translate a locator to an XPath expression
pub fn to_xpath(locator: &Locator) -> Result<XPathExpr> {
    match locator {
        Locator::Attributes(map) => Ok(attribute_map_to_xpath(map)),
        Locator::XPath(xpath) => Ok(xpath.stripped()),
        Locator::UiSelector(expr) => {
            let map = parse::ui_selector_to_attribute_map(expr, Operand::Source)?;
            Ok(attribute_map_to_xpath(&map))
        }
    }
}

/// Translate to XPath, requiring at least one discriminating condition.
///
/// Composition callers use this entry point: a wildcard operand would make
/// the composed query match everything, which is never what a hierarchy
/// query means. The error names the failing side so composed queries stay
/// debuggable.
pub fn to_xpath_required(locator: &Locator, operand: Operand) -> Result<XPathExpr> {
    let discriminating = match locator {
        Locator::Attributes(map) => map.is_discriminating(),
        Locator::XPath(xpath) => {
            let stripped = xpath.stripped();
            let trimmed = stripped.as_str().trim();
            !trimmed.is_empty() && trimmed != "//*" && trimmed != "//" && trimmed != "*"
        }
        Locator::UiSelector(expr) => {
            !parse::ui_selector_to_attribute_map(expr, operand)?.is_empty()
        }
    };
    if !discriminating {
        return Err(AutomationError::ResolvingLocator {
            operand,
            reason: "locator is empty after stripping null and blank conditions".to_string(),
        });
    }
    to_xpath(locator)
}

/// Translate a locator to a UiSelector expression
pub fn to_ui_selector(locator: &Locator) -> Result<UiSelectorExpr> {
    match locator {
        Locator::Attributes(map) => attribute_map_to_ui_selector(map),
        Locator::UiSelector(expr) => Ok(expr.clone()),
        Locator::XPath(xpath) => {
            let map = parse::xpath_to_attribute_map(xpath, Operand::Source)?;
            attribute_map_to_ui_selector(&map)
        }
    }
}

/// Translate a locator to attribute conditions
pub fn to_attribute_map(locator: &Locator) -> Result<AttributeMap> {
    match locator {
        Locator::Attributes(map) => Ok(map.stripped()),
        Locator::XPath(xpath) => parse::xpath_to_attribute_map(xpath, Operand::Source),
        Locator::UiSelector(expr) => parse::ui_selector_to_attribute_map(expr, Operand::Source),
    }
}

/// Attribute conditions rendered as a single-node XPath expression
pub(crate) fn attribute_map_to_xpath(map: &AttributeMap) -> XPathExpr {
    let stripped = map.stripped();

    // An exact class condition becomes the node test; anything else keeps
    // the wildcard and matches class as an ordinary predicate.
    let class_as_node_test = matches!(
        stripped.get("class"),
        Some(AttributeMatch { value: AttrValue::Text(_), mode: MatchMode::Exact })
    );
    let node_test = if class_as_node_test {
        stripped.get("class").map(|m| m.value.render()).unwrap_or_else(|| "*".to_string())
    } else {
        "*".to_string()
    };

    let mut xpath = format!("//{node_test}");
    for (name, matcher) in stripped.iter() {
        if class_as_node_test && name == "class" {
            continue;
        }
        xpath.push_str(&xpath_predicate(name, matcher));
    }
    XPathExpr::new(xpath)
}

/// One predicate fragment for a single attribute condition
fn xpath_predicate(name: &str, matcher: &AttributeMatch) -> String {
    // Positional conditions have dedicated XPath forms; both counters are
    // zero-based in the attribute map and one-based in XPath.
    if let AttrValue::Number(n) = matcher.value {
        if name == "index" {
            return format!("[position()={}]", n + 1);
        }
        if name == "instance" {
            return format!("[{}]", n + 1);
        }
    }

    let value = matcher.value.render();
    match matcher.mode {
        MatchMode::Exact => format!("[@{name}='{value}']"),
        MatchMode::Contains => format!("[contains(@{name}, '{value}')]"),
        MatchMode::StartsWith => format!("[starts-with(@{name}, '{value}')]"),
        MatchMode::Matches => format!("[matches(@{name}, '{value}')]"),
    }
}

/// Attribute conditions rendered as a UiSelector call chain
pub(crate) fn attribute_map_to_ui_selector(map: &AttributeMap) -> Result<UiSelectorExpr> {
    let stripped = map.stripped();
    let mut expr = String::from("new UiSelector()");
    for (name, matcher) in stripped.iter() {
        let method = ui_method(name, matcher.mode).ok_or_else(|| {
            AutomationError::UnsupportedNotation {
                attribute: format!("{name} ({:?})", matcher.mode),
                notation: NOTATION_UI_SELECTOR,
            }
        })?;
        let arg = match &matcher.value {
            AttrValue::Text(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            AttrValue::Flag(b) => b.to_string(),
            AttrValue::Number(n) => n.to_string(),
        };
        expr.push_str(&format!(".{method}({arg})"));
    }
    Ok(UiSelectorExpr::new(expr))
}
