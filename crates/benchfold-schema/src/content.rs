//! The view the interpreter has of a content document.
//!
//! Both concrete syntaxes are walked through [`ContentNode`], so the
//! interpretation algorithm exists once.

use benchfold_kernel::Literal;

pub trait ContentNode: Copy {
    /// The node reached from this one by `key`.
    fn child(&self, key: &str) -> Option<Self>;

    /// Elements of an array-like node, in document order. `item_key` names
    /// the item scope; syntaxes that tag items by name filter on it.
    fn items(&self, item_key: &str) -> Vec<Self>;

    /// Named members of an object-like node, in document order.
    fn members(&self) -> Vec<(String, Self)>;

    /// The node's own scalar value.
    fn literal(&self) -> Option<Literal>;

    fn contains(&self, key: &str) -> bool {
        self.child(key).is_some()
    }
}
