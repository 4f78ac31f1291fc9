use crate::dom::{ROOT_MARKER, TreeInspector, TreeNode};
use crate::error::{Operand, Result};
use crate::locator::convert::to_xpath_required;
use crate::locator::{AttrValue, AttributeMap, AttributeMatch, Locator, XPathExpr};

/// Strip leading slashes so a fragment can be re-anchored under a scope
fn relative_fragment(xpath: &str) -> &str {
    xpath.trim_start_matches('/')
}

fn child_xpath(parent: &Locator, child: &Locator) -> Result<XPathExpr> {
    let parent_xpath = to_xpath_required(parent, Operand::Source)?;
    let child_xpath = to_xpath_required(child, Operand::Target)?;
    let composed = format!(
        "{}//{}",
        parent_xpath.as_str(),
        relative_fragment(child_xpath.as_str())
    );
    log::debug!("composed child locator: {composed}");
    Ok(XPathExpr::new(composed))
}

fn siblings_xpath(current: &Locator, target: &Locator) -> Result<XPathExpr> {
    let current_xpath = to_xpath_required(current, Operand::Source)?;
    let target_xpath = to_xpath_required(target, Operand::Target)?;
    let composed = format!(
        "{}/following-sibling::{}",
        current_xpath.as_str(),
        relative_fragment(target_xpath.as_str())
    );
    log::debug!("composed sibling locator: {composed}");
    Ok(XPathExpr::new(composed))
}

fn cousin_xpath(current: &Locator, target: &Locator, depth_to_parent: usize) -> Result<XPathExpr> {
    let current_xpath = to_xpath_required(current, Operand::Source)?;
    let target_xpath = to_xpath_required(target, Operand::Target)?;
    let ascent = "/..".repeat(depth_to_parent + 1);
    let composed = format!(
        "{}{}//{}",
        current_xpath.as_str(),
        ascent,
        relative_fragment(target_xpath.as_str())
    );
    log::debug!("composed cousin locator: {composed}");
    Ok(XPathExpr::new(composed))
}

fn ancestors_xpath(current: &Locator) -> Result<XPathExpr> {
    let xpath = to_xpath_required(current, Operand::Source)?;
    Ok(XPathExpr::new(format!("{}/ancestor::*", xpath.as_str())))
}

/// Locator for a descendant of `parent` matching `child`
pub fn child_locator(parent: &Locator, child: &Locator) -> Result<Locator> {
    child_xpath(parent, child).map(Locator::XPath)
}

/// Locator for the direct parent of `current`
pub fn parent_locator(current: &Locator) -> Result<Locator> {
    let xpath = to_xpath_required(current, Operand::Source)?;
    Ok(Locator::xpath(format!("{}/..", xpath.as_str())))
}

/// Locator for the first following sibling of `current` matching `target`
pub fn sibling_locator(current: &Locator, target: &Locator) -> Result<Locator> {
    let xpath = siblings_xpath(current, target)?;
    Ok(Locator::xpath(format!("{}[1]", xpath.as_str())))
}

/// Locator for all following siblings of `current` matching `target`
pub fn siblings_locator(current: &Locator, target: &Locator) -> Result<Locator> {
    siblings_xpath(current, target).map(Locator::XPath)
}

/// Locator for elements matching `target` under an ancestor of `current`.
///
/// `depth_to_parent` counts extra ascent levels beyond the direct parent:
/// depth 0 scopes the search under the grandparent, depth 1 under the
/// great-grandparent, and so on.
pub fn cousin_locator(current: &Locator, target: &Locator, depth_to_parent: usize) -> Result<Locator> {
    cousin_xpath(current, target, depth_to_parent).map(Locator::XPath)
}

/// Relationship queries that enumerate matches in the live tree.
///
/// The one-match operations are re-exposed here for symmetry; only the
/// plural operations touch the injected inspector.
pub struct DomNavigator<I> {
    inspector: I,
}

impl<I: TreeInspector> DomNavigator<I> {
    /// Create a navigator around a tree-snapshot capability
    pub fn new(inspector: I) -> Self {
        Self { inspector }
    }

    /// The underlying inspector
    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    /// Locator for a descendant of `parent` matching `child`
    pub fn child(&self, parent: &Locator, child: &Locator) -> Result<Locator> {
        child_locator(parent, child)
    }

    /// Locator for the direct parent of `current`
    pub fn parent(&self, current: &Locator) -> Result<Locator> {
        parent_locator(current)
    }

    /// Every ancestor of `current`, nearest the root first.
    ///
    /// The synthetic root wrapper of the tree dump is not a real element
    /// and is dropped when it shows up as the outermost match.
    pub fn parents(&self, current: &Locator) -> Result<Vec<Locator>> {
        let xpath = ancestors_xpath(current)?;
        let mut nodes = self.inspector.nodes_matching(&xpath)?;
        if nodes.first().is_some_and(|n| n.tag == ROOT_MARKER) {
            nodes.remove(0);
        }
        Ok(nodes.into_iter().map(node_locator).collect())
    }

    /// Locator for the first following sibling of `current` matching `target`
    pub fn sibling(&self, current: &Locator, target: &Locator) -> Result<Locator> {
        sibling_locator(current, target)
    }

    /// All following siblings of `current` matching `target`
    pub fn siblings(&self, current: &Locator, target: &Locator) -> Result<Vec<Locator>> {
        let xpath = siblings_xpath(current, target)?;
        let nodes = self.inspector.nodes_matching(&xpath)?;
        Ok(nodes.into_iter().map(node_locator).collect())
    }

    /// Locator for the first cousin of `current` matching `target`
    pub fn cousin(&self, current: &Locator, target: &Locator, depth_to_parent: usize) -> Result<Locator> {
        cousin_locator(current, target, depth_to_parent)
    }

    /// All cousins of `current` matching `target` under the ascended scope
    pub fn cousins(
        &self,
        current: &Locator,
        target: &Locator,
        depth_to_parent: usize,
    ) -> Result<Vec<Locator>> {
        let xpath = cousin_xpath(current, target, depth_to_parent)?;
        let nodes = self.inspector.nodes_matching(&xpath)?;
        Ok(nodes.into_iter().map(node_locator).collect())
    }
}

/// Rebuild a standalone attribute locator from an enumerated node.
///
/// Blank and "null" attribute values are stripped so the derived locator
/// only carries conditions that can actually match.
fn node_locator(node: TreeNode) -> Locator {
    let mut map = AttributeMap::new();
    for (name, raw) in &node.attributes {
        map.set(name.clone(), AttributeMatch::exact(AttrValue::typed(name, raw)));
    }
    Locator::Attributes(map.stripped())
}
