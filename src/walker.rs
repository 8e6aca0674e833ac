//! Depth-first discovery of class-like elements in a package tree.

use crate::model::ModelNode;

/// Lazy pre-order iterator over the class-like elements below a root.
///
/// Only packages are descended into. The tree is assumed acyclic.
#[derive(Debug, Clone)]
pub struct ClassElements<'a> {
    stack: Vec<std::slice::Iter<'a, ModelNode>>,
}

impl<'a> Iterator for ClassElements<'a> {
    type Item = &'a ModelNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(level) = self.stack.last_mut() {
            match level.next() {
                Some(node) if node.is_package() => self.stack.push(node.children.iter()),
                Some(node) if node.is_class_like() => return Some(node),
                Some(_) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Walk the children of `root` (usually the model container) and yield every
/// class-like element in document order.
pub fn class_elements(root: &ModelNode) -> ClassElements<'_> {
    ClassElements {
        stack: vec![root.children.iter()],
    }
}
