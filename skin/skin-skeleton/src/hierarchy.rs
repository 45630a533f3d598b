//! Parents-first ordering of a surface attachment graph.

use tracing::warn;

use crate::error::{SkeletonError, SkeletonResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Order surface indices so that every surface comes after its parent.
///
/// `parents[i]` is the parent of surface `i`, or `None` for a root. A parent
/// index outside `0..parents.len()` is treated as no parent. Disconnected
/// forests are fine.
///
/// The order is deterministic: surfaces are visited in ascending index, and
/// each one's not-yet-emitted ancestor chain is emitted root first.
///
/// # Errors
///
/// Returns [`SkeletonError::CyclicAttachment`] naming a surface on the cycle
/// if the graph is cyclic (including a surface that is its own parent). No
/// partial order is produced.
///
/// # Example
///
/// ```
/// use skin_skeleton::hierarchy_order;
///
/// let order = hierarchy_order(&[Some(2), None, Some(1)]).unwrap();
/// assert_eq!(order, vec![1, 2, 0]);
///
/// assert!(hierarchy_order(&[Some(1), Some(0)]).is_err());
/// ```
pub fn hierarchy_order(parents: &[Option<usize>]) -> SkeletonResult<Vec<usize>> {
    let count = parents.len();
    let mut marks = vec![Mark::Unvisited; count];
    let mut order = Vec::with_capacity(count);
    let mut chain = Vec::new();

    let parent_of = |node: usize| -> Option<usize> {
        match parents[node] {
            Some(parent) if parent < count => Some(parent),
            Some(parent) => {
                warn!(surface = node, parent, "Surface parent index out of range, treating as root");
                None
            }
            None => None,
        }
    };

    for start in 0..count {
        if marks[start] == Mark::Done {
            continue;
        }

        // Walk up until we reach a root or an already emitted surface.
        chain.clear();
        let mut current = Some(start);
        while let Some(node) = current {
            match marks[node] {
                Mark::Done => break,
                Mark::Visiting => return Err(SkeletonError::CyclicAttachment { surface: node }),
                Mark::Unvisited => {
                    marks[node] = Mark::Visiting;
                    chain.push(node);
                    current = parent_of(node);
                }
            }
        }

        for &node in chain.iter().rev() {
            marks[node] = Mark::Done;
            order.push(node);
        }
    }

    Ok(order)
}
