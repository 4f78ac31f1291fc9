//! Locator model and notation translation.
//!
//! Elements are addressed in one of three interchangeable notations:
//! - [`AttributeMap`]: ordered semantic attribute conditions
//! - [`XPathExpr`]: path expressions, the only notation that can express
//!   structural axes (parent, following-sibling, ancestor)
//! - [`UiSelectorExpr`]: the chained-call selector DSL of the on-device
//!   automator
//!
//! A [`Locator`] holds exactly one canonical notation at rest; translation
//! is performed on demand by [`convert`] and never cached, so a locator
//! can not go stale against a tree that changed between calls.

pub mod attributes;
pub mod convert;
mod parse;

pub use attributes::{AttrValue, AttributeMap, AttributeMatch, MatchMode};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Predicates produced from "null" attribute values in tree dumps
static NULL_PREDICATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[@[\w\-]+='null'\]").expect("static pattern"));

/// An opaque XPath expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPathExpr(String);

impl XPathExpr {
    /// Wrap a raw XPath string
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// The expression as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the raw expression
    pub fn into_string(self) -> String {
        self.0
    }

    /// Copy of this expression without `[@attr='null']` predicates
    pub fn stripped(&self) -> XPathExpr {
        XPathExpr(NULL_PREDICATE.replace_all(&self.0, "").into_owned())
    }
}

impl std::fmt::Display for XPathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for XPathExpr {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An opaque UiSelector chained-call expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSelectorExpr(String);

impl UiSelectorExpr {
    /// Wrap a raw selector DSL string
    pub fn new(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    /// The expression as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the raw expression
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UiSelectorExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UiSelectorExpr {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An element locator in one of the three supported notations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notation", content = "value", rename_all = "camelCase")]
pub enum Locator {
    /// Ordered attribute conditions
    Attributes(AttributeMap),
    /// Path expression
    XPath(XPathExpr),
    /// On-device selector DSL
    UiSelector(UiSelectorExpr),
}

impl Locator {
    /// Locator from attribute conditions
    pub fn attributes(map: AttributeMap) -> Self {
        Locator::Attributes(map)
    }

    /// Locator from a raw XPath string
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(XPathExpr::new(expr))
    }

    /// Locator from a raw UiSelector DSL string
    pub fn ui_selector(expr: impl Into<String>) -> Self {
        Locator::UiSelector(UiSelectorExpr::new(expr))
    }

    /// Copy of this locator with blank and "null" valued conditions removed
    pub fn normalized(&self) -> Locator {
        match self {
            Locator::Attributes(map) => Locator::Attributes(map.stripped()),
            Locator::XPath(xpath) => Locator::XPath(xpath.stripped()),
            Locator::UiSelector(expr) => Locator::UiSelector(expr.clone()),
        }
    }
}

impl From<AttributeMap> for Locator {
    fn from(map: AttributeMap) -> Self {
        Locator::Attributes(map)
    }
}

impl From<XPathExpr> for Locator {
    fn from(expr: XPathExpr) -> Self {
        Locator::XPath(expr)
    }
}

impl From<UiSelectorExpr> for Locator {
    fn from(expr: UiSelectorExpr) -> Self {
        Locator::UiSelector(expr)
    }
}
