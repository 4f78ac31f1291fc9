//! Element-relationship queries over the live UI tree.
//!
//! This module builds derived locators for hierarchical relationships
//! (parent, sibling, cousin, ancestor) by composing XPath fragments. The
//! single-match operations are pure locator arithmetic; the enumerating
//! operations additionally consult a [`TreeInspector`], the injected
//! capability that evaluates an XPath against the current tree snapshot
//! and hands back the matching nodes' attributes.

pub mod navigator;

pub use navigator::{
    DomNavigator, child_locator, cousin_locator, parent_locator, sibling_locator,
    siblings_locator,
};

use crate::error::Result;
use crate::locator::XPathExpr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tag of the synthetic root element a tree dump wraps the UI in
pub const ROOT_MARKER: &str = "hierarchy";

/// A node extracted from a tree snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Element tag (the widget class for real nodes)
    pub tag: String,

    /// Raw attribute values in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl TreeNode {
    /// Create a node with no attributes
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), attributes: IndexMap::new() }
    }

    /// Builder method: add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Capability to evaluate an XPath against the current UI tree snapshot.
///
/// Parsing the snapshot and running the match is external to this crate;
/// implementations typically fetch the page source from the remote driver
/// and run an XML/XPath engine over it.
pub trait TreeInspector {
    /// All nodes currently matching the expression, in document order
    fn nodes_matching(&self, xpath: &XPathExpr) -> Result<Vec<TreeNode>>;
}
