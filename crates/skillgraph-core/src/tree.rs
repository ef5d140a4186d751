//! Trees returned by the external generator, and their validation.
//!
//! A generator hands back nested `{name, isCore, children}` nodes. Before any
//! of it is persisted the tree is flattened in pre-order; a node that fails
//! validation is dropped together with its whole subtree and reported as a
//! [`TreeAnomaly`], so no link is ever written for a node that was not.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One node of a generated tree, as the generator emits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
  #[serde(default)]
  pub name:     Option<String>,
  /// A core node is a declared leaf; it must not carry children.
  #[serde(default)]
  pub is_core:  bool,
  #[serde(default)]
  pub children: Vec<TreeNode>,
}

impl TreeNode {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn core(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), is_core: true, children: Vec::new() }
  }

  pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
    self.children = children;
    self
  }

  /// Check this node in isolation and return its trimmed name.
  pub fn validate(&self, parent: Option<&str>) -> Result<&str> {
    let name = self
      .name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .ok_or_else(|| Error::MissingNodeName { parent: parent.map(str::to_owned) })?;
    if self.is_core && !self.children.is_empty() {
      return Err(Error::CoreNodeWithChildren(name.to_owned()));
    }
    Ok(name)
  }

  /// Number of nodes in this subtree, including `self`.
  pub fn size(&self) -> usize {
    let mut count = 0;
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      count += 1;
      stack.extend(node.children.iter());
    }
    count
  }
}

/// A validated node with a reference to its parent by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
  pub name:    String,
  pub parent:  Option<String>,
  pub is_core: bool,
  pub depth:   usize,
}

/// A subtree rejected during flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeAnomaly {
  /// Name of the parent the subtree hung from, if any.
  pub parent:        Option<String>,
  pub reason:        String,
  /// Nodes dropped, the offending node included.
  pub skipped_nodes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedTree {
  pub nodes:     Vec<FlatNode>,
  pub anomalies: Vec<TreeAnomaly>,
}

/// Flatten `root` in pre-order, dropping invalid subtrees.
pub fn flatten(root: &TreeNode) -> FlattenedTree {
  let mut out = FlattenedTree::default();
  let mut stack: Vec<(&TreeNode, Option<String>, usize)> = vec![(root, None, 0)];

  while let Some((node, parent, depth)) = stack.pop() {
    let name = match node.validate(parent.as_deref()) {
      Ok(name) => name.to_owned(),
      Err(e) => {
        out.anomalies.push(TreeAnomaly {
          parent,
          reason: e.to_string(),
          skipped_nodes: node.size(),
        });
        continue;
      }
    };

    // Reverse so the first child is popped first.
    for child in node.children.iter().rev() {
      stack.push((child, Some(name.clone()), depth + 1));
    }
    out.nodes.push(FlatNode { name, parent, is_core: node.is_core, depth });
  }

  out
}
