//! Drop strategies: what happens to the visual tree when a drop completes.

use serde::{Deserialize, Serialize};

use crate::viewport::{ElementId, Viewport};

/// The tree mutation a drop target performs after an uncanceled drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropStrategy {
    /// Leave the tree alone; listeners react to `dropped` themselves.
    #[default]
    Default,
    /// Move the dragged element to the end of the target.
    Append,
    /// Move the dragged element to the start of the target.
    Prepend,
    /// Move the dragged element to the child slot under the pointer.
    ///
    /// The index names a child as the list stood before the dragged element
    /// was detached, so a resident child dropped onto a later sibling lands
    /// just before it. This differs from indexing the list after removal,
    /// which would land one slot further.
    Insert,
}

impl DropStrategy {
    /// Apply the strategy.
    ///
    /// `index` is the insertion index among the target's children, `None`
    /// when there was no child under the pointer (treated as append).
    pub fn apply<V: Viewport + ?Sized>(
        self,
        viewport: &mut V,
        dragged: ElementId,
        target: ElementId,
        index: Option<usize>,
    ) {
        match self {
            Self::Default => {}
            Self::Append => {
                viewport.remove(dragged);
                viewport.append_child(target, dragged);
            }
            Self::Prepend => {
                viewport.remove(dragged);
                match viewport.children(target).first() {
                    Some(&first) => viewport.insert_before(target, dragged, first),
                    None => viewport.append_child(target, dragged),
                }
            }
            Self::Insert => {
                if index.is_none() && viewport.parent(dragged) == Some(target) {
                    return;
                }
                // Resolved against the children as they were before the move.
                let reference = index.and_then(|i| viewport.children(target).get(i).copied());
                if reference == Some(dragged) {
                    return;
                }
                viewport.remove(dragged);
                match reference {
                    Some(reference) => viewport.insert_before(target, dragged, reference),
                    None => viewport.append_child(target, dragged),
                }
            }
        }
    }
}
