//! Parsers that re-derive attribute conditions from the other notations.
//!
//! Only the single-node subset each notation can faithfully express is
//! accepted. Axis vocabulary (parent, following-sibling, ancestor, nested
//! selectors) has no attribute-map equivalent and fails loudly instead of
//! being dropped.

use crate::error::{AutomationError, Operand, Result};
use crate::locator::convert::{NOTATION_ATTRIBUTES, ui_method_reverse};
use crate::locator::{AttrValue, AttributeMap, AttributeMatch, MatchMode, UiSelectorExpr, XPathExpr};

fn resolving(operand: Operand, reason: impl Into<String>) -> AutomationError {
    AutomationError::ResolvingLocator { operand, reason: reason.into() }
}

fn unsupported(token: impl Into<String>) -> AutomationError {
    AutomationError::UnsupportedNotation { attribute: token.into(), notation: NOTATION_ATTRIBUTES }
}

/// XPath axis tokens that cannot be represented as attribute conditions
const AXIS_TOKENS: [&str; 6] = [
    "following-sibling::",
    "preceding-sibling::",
    "ancestor::",
    "descendant::",
    "parent::",
    "/..",
];

/// Parse a single-node XPath expression back into attribute conditions
pub(crate) fn xpath_to_attribute_map(xpath: &XPathExpr, operand: Operand) -> Result<AttributeMap> {
    let stripped = xpath.stripped();
    let expr = stripped.as_str().trim();
    if expr.is_empty() {
        return Err(resolving(operand, "empty XPath expression"));
    }

    for token in AXIS_TOKENS {
        if expr.contains(token) {
            return Err(unsupported(token.trim_matches(['/', ':'])));
        }
    }

    let rest = expr.strip_prefix("//").unwrap_or(expr);
    let node_end = rest.find('[').unwrap_or(rest.len());
    let (node_test, predicates) = rest.split_at(node_end);
    if node_test.contains('/') {
        return Err(unsupported("nested path"));
    }

    let mut map = AttributeMap::new();
    if !node_test.is_empty() && node_test != "*" {
        map.set("class", AttributeMatch::exact(node_test));
    }
    for predicate in split_predicates(predicates, operand)? {
        let (name, matcher) = parse_predicate(&predicate, operand)?;
        map.set(name, matcher);
    }
    Ok(map)
}

/// Split `[a][b][c]` into its bracketed segments, respecting quotes
fn split_predicates(s: &str, operand: Operand) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in s.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ']' => {
                if depth == 0 {
                    return Err(resolving(operand, format!("unbalanced ']' in predicates: {s}")));
                }
                depth -= 1;
                if depth == 0 {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
            c if depth > 0 => current.push(c),
            c if c.is_whitespace() => {}
            c => {
                return Err(resolving(operand, format!("unexpected '{c}' outside predicate")));
            }
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(resolving(operand, format!("unterminated predicate in: {s}")));
    }
    Ok(segments)
}

/// Parse one predicate body (the text between a `[` `]` pair)
fn parse_predicate(predicate: &str, operand: Operand) -> Result<(String, AttributeMatch)> {
    let p = predicate.trim();

    for (prefix, mode) in [
        ("contains(", MatchMode::Contains),
        ("starts-with(", MatchMode::StartsWith),
        ("matches(", MatchMode::Matches),
    ] {
        if let Some(inner) = p.strip_prefix(prefix) {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| resolving(operand, format!("missing ')' in predicate: {p}")))?;
            return parse_predicate_function(inner, mode, operand);
        }
    }

    if let Some(body) = p.strip_prefix('@') {
        let eq = body
            .find('=')
            .ok_or_else(|| resolving(operand, format!("expected '=' in predicate: {p}")))?;
        let name = body[..eq].trim();
        let value = parse_quoted(body[eq + 1..].trim(), operand)?;
        return Ok((name.to_string(), AttributeMatch::exact(AttrValue::typed(name, &value))));
    }

    if let Some(pos) = p.strip_prefix("position()=") {
        let n: i64 = pos
            .trim()
            .parse()
            .map_err(|_| resolving(operand, format!("invalid position in predicate: {p}")))?;
        return Ok(("index".to_string(), AttributeMatch::exact(n - 1)));
    }

    if let Ok(n) = p.parse::<i64>() {
        return Ok(("instance".to_string(), AttributeMatch::exact(n - 1)));
    }

    Err(unsupported(p))
}

/// Parse the inside of `contains(@attr, 'value')` style predicates
fn parse_predicate_function(
    inner: &str,
    mode: MatchMode,
    operand: Operand,
) -> Result<(String, AttributeMatch)> {
    let comma = inner
        .find(',')
        .ok_or_else(|| resolving(operand, format!("expected ',' in predicate function: {inner}")))?;
    let attr = inner[..comma].trim();
    let name = attr
        .strip_prefix('@')
        .ok_or_else(|| resolving(operand, format!("expected '@attribute' in: {inner}")))?;
    let value = parse_quoted(inner[comma + 1..].trim(), operand)?;
    Ok((name.to_string(), AttributeMatch::with_mode(value, mode)))
}

/// Unwrap a `'...'` or `"..."` literal
fn parse_quoted(s: &str, operand: Operand) -> Result<String> {
    let mut chars = s.chars();
    let quote = chars
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| resolving(operand, format!("expected quoted value, got: {s}")))?;
    let body: String = chars.collect();
    body.strip_suffix(quote)
        .map(str::to_string)
        .ok_or_else(|| resolving(operand, format!("unterminated quote in: {s}")))
}

/// Parse a UiSelector call chain back into attribute conditions
pub(crate) fn ui_selector_to_attribute_map(
    expr: &UiSelectorExpr,
    operand: Operand,
) -> Result<AttributeMap> {
    let s = expr.as_str().trim().trim_end_matches(';').trim();
    let rest = s.strip_prefix("new UiSelector()").unwrap_or(s);

    let mut map = AttributeMap::new();
    let mut chars = rest.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }
        if chars.next() != Some('.') {
            return Err(resolving(operand, format!("expected '.' in selector chain: {s}")));
        }

        let mut method = String::new();
        while let Some(&c) = chars.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            method.push(c);
            chars.next();
        }
        if chars.next() != Some('(') {
            return Err(resolving(operand, format!("expected '(' after '{method}'")));
        }

        // Fail on unknown methods before touching the argument, so nested
        // selectors inside childSelector()/fromParent() are never half-read.
        let (attr, mode) = ui_method_reverse(&method).ok_or_else(|| unsupported(&method))?;

        let raw = read_call_argument(&mut chars)
            .ok_or_else(|| resolving(operand, format!("unterminated argument for '{method}'")))?;
        let value = parse_selector_argument(raw.trim(), operand)?;
        map.set(attr, AttributeMatch::with_mode(value, mode));
    }
    Ok(map)
}

/// Consume characters up to the matching `)`, honoring quotes and nesting
fn read_call_argument(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut arg = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in chars.by_ref() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            arg.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                arg.push(c);
            }
            '(' => {
                depth += 1;
                arg.push(c);
            }
            ')' => {
                if depth == 0 {
                    return Some(arg);
                }
                depth -= 1;
                arg.push(c);
            }
            c => arg.push(c),
        }
    }
    None
}

/// A selector call argument: a quoted string, a boolean, or an integer
fn parse_selector_argument(raw: &str, operand: Operand) -> Result<AttrValue> {
    if let Some(body) = raw.strip_prefix('"') {
        let body = body
            .strip_suffix('"')
            .ok_or_else(|| resolving(operand, format!("unterminated string: {raw}")))?;
        return Ok(AttrValue::Text(body.replace("\\\"", "\"").replace("\\\\", "\\")));
    }
    match raw {
        "true" => return Ok(AttrValue::Flag(true)),
        "false" => return Ok(AttrValue::Flag(false)),
        _ => {}
    }
    raw.parse::<i64>()
        .map(AttrValue::Number)
        .map_err(|_| resolving(operand, format!("unsupported selector argument: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xpath_map(expr: &str) -> AttributeMap {
        xpath_to_attribute_map(&XPathExpr::new(expr), Operand::Source).unwrap()
    }

    fn selector_map(expr: &str) -> AttributeMap {
        ui_selector_to_attribute_map(&UiSelectorExpr::new(expr), Operand::Source).unwrap()
    }

    #[test]
    fn test_xpath_node_test_becomes_class() {
        let map = xpath_map("//android.widget.Button[@text='OK']");
        assert_eq!(
            map.get("class").unwrap().value,
            AttrValue::Text("android.widget.Button".to_string())
        );
        assert_eq!(map.get("text").unwrap().value, AttrValue::Text("OK".to_string()));
    }

    #[test]
    fn test_xpath_wildcard_has_no_class() {
        let map = xpath_map("//*[@text='OK']");
        assert!(map.get("class").is_none());
    }

    #[test]
    fn test_xpath_function_predicates() {
        let map = xpath_map("//*[contains(@text, 'Sub')][starts-with(@content-desc, 'ro')]");
        assert_eq!(map.get("text").unwrap().mode, MatchMode::Contains);
        assert_eq!(map.get("content-desc").unwrap().mode, MatchMode::StartsWith);
    }

    #[test]
    fn test_xpath_flag_and_positional_predicates() {
        let map = xpath_map("//CheckBox[@checked='true'][position()=3][2]");
        assert_eq!(map.get("checked").unwrap().value, AttrValue::Flag(true));
        assert_eq!(map.get("index").unwrap().value, AttrValue::Number(2));
        assert_eq!(map.get("instance").unwrap().value, AttrValue::Number(1));
    }

    #[test]
    fn test_xpath_quoted_bracket_is_not_a_delimiter() {
        let map = xpath_map("//*[@text='a]b']");
        assert_eq!(map.get("text").unwrap().value, AttrValue::Text("a]b".to_string()));
    }

    #[test]
    fn test_xpath_axis_tokens_rejected() {
        for expr in [
            "//A/following-sibling::B",
            "//A/ancestor::*",
            "//A/..",
            "//A/B",
        ] {
            let err = xpath_to_attribute_map(&XPathExpr::new(expr), Operand::Source).unwrap_err();
            assert!(
                matches!(err, AutomationError::UnsupportedNotation { .. }),
                "{expr} should be unsupported, got {err:?}"
            );
        }
    }

    #[test]
    fn test_xpath_empty_rejected() {
        let err = xpath_to_attribute_map(&XPathExpr::new("  "), Operand::Target).unwrap_err();
        match err {
            AutomationError::ResolvingLocator { operand, .. } => {
                assert_eq!(operand, Operand::Target)
            }
            other => panic!("expected ResolvingLocator, got {other:?}"),
        }
    }

    #[test]
    fn test_selector_chain_parsing() {
        let map = selector_map("new UiSelector().text(\"OK\").className(\"Button\").enabled(true).instance(1)");
        let names: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["text", "class", "enabled", "instance"]);
        assert_eq!(map.get("enabled").unwrap().value, AttrValue::Flag(true));
        assert_eq!(map.get("instance").unwrap().value, AttrValue::Number(1));
    }

    #[test]
    fn test_selector_mode_suffixes() {
        let map = selector_map("new UiSelector().textContains(\"Sub\").descriptionMatches(\".*row\")");
        assert_eq!(map.get("text").unwrap().mode, MatchMode::Contains);
        assert_eq!(map.get("content-desc").unwrap().mode, MatchMode::Matches);
    }

    #[test]
    fn test_selector_without_prefix() {
        let map = selector_map(".text(\"OK\")");
        assert_eq!(map.get("text").unwrap().value, AttrValue::Text("OK".to_string()));
    }

    #[test]
    fn test_selector_escaped_quotes() {
        let map = selector_map("new UiSelector().text(\"say \\\"hi\\\"\")");
        assert_eq!(map.get("text").unwrap().value, AttrValue::Text("say \"hi\"".to_string()));
    }

    #[test]
    fn test_selector_nested_axis_method_rejected() {
        let err = ui_selector_to_attribute_map(
            &UiSelectorExpr::new("new UiSelector().childSelector(new UiSelector().text(\"x\"))"),
            Operand::Source,
        )
        .unwrap_err();
        match err {
            AutomationError::UnsupportedNotation { attribute, .. } => {
                assert_eq!(attribute, "childSelector")
            }
            other => panic!("expected UnsupportedNotation, got {other:?}"),
        }
    }

    #[test]
    fn test_selector_bare_constructor_is_empty() {
        let map = selector_map("new UiSelector()");
        assert!(map.is_empty());
    }

    #[test]
    fn test_selector_round_trip_through_emitter() {
        use crate::locator::convert::attribute_map_to_ui_selector;

        let source = "new UiSelector().textStartsWith(\"Wi\").className(\"android.widget.Switch\").checked(false)";
        let map = selector_map(source);
        let emitted = attribute_map_to_ui_selector(&map).unwrap();
        assert_eq!(emitted.as_str(), source);
    }
}
