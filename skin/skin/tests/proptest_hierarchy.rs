//! Property-based tests for hierarchy ordering and skeleton merging.
//!
//! Run with: cargo test -p skin -- proptest

use std::sync::Arc;

use proptest::prelude::*;
use skin::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Acyclic parent arrays: every node's parent is drawn from the nodes before
/// it in a random relabelling, so parents may have higher indices.
fn arb_forest(max_nodes: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
    (1..=max_nodes).prop_flat_map(|n| {
        let labels = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        let picks = prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), n);
        (labels, picks).prop_map(|(labels, picks)| {
            let mut parents = vec![None; labels.len()];
            for (rank, pick) in picks.into_iter().enumerate() {
                if rank == 0 {
                    continue;
                }
                if let Some(pick) = pick {
                    parents[labels[rank]] = Some(labels[pick.index(rank)]);
                }
            }
            parents
        })
    })
}

/// A forest with one edge redirected to close a cycle.
fn arb_cyclic(max_nodes: usize) -> impl Strategy<Value = Vec<Option<usize>>> {
    (arb_forest(max_nodes), any::<prop::sample::Index>()).prop_map(|(mut parents, pick)| {
        let node = pick.index(parents.len());
        // Point `node` at its deepest descendant along first children, or
        // itself when it has none.
        let mut tail = node;
        while let Some(child) = (0..parents.len()).find(|&c| parents[c] == Some(tail)) {
            tail = child;
        }
        parents[node] = Some(tail);
        parents
    })
}

fn single(id: u64) -> Arc<Skeleton> {
    let field = Arc::new(SphereField::new(1.0).unwrap());
    Arc::new(Skeleton::single(Arc::new(Bone::new(BoneId::new(id), field))))
}

fn slots_for(parents: &[Option<usize>], present: &[bool]) -> SurfaceSlots {
    let mut slots = SurfaceSlots::new();
    for (i, parent) in parents.iter().enumerate() {
        let skeleton = present[i].then(|| single(i as u64));
        slots.set(i, skeleton, *parent).unwrap();
    }
    slots
}

// =============================================================================
// Property Tests: Hierarchy Order
// =============================================================================

proptest! {
    /// The order is a permutation with every parent before its child.
    #[test]
    fn order_puts_parents_first(parents in arb_forest(24)) {
        let order = hierarchy_order(&parents).unwrap();

        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..parents.len()).collect::<Vec<_>>());

        let mut rank = vec![0; parents.len()];
        for (r, &node) in order.iter().enumerate() {
            rank[node] = r;
        }
        for (child, parent) in parents.iter().enumerate() {
            if let Some(parent) = *parent {
                prop_assert!(rank[parent] < rank[child]);
            }
        }
    }

    /// The same input always gives the same order.
    #[test]
    fn order_is_deterministic(parents in arb_forest(24)) {
        prop_assert_eq!(hierarchy_order(&parents).unwrap(), hierarchy_order(&parents).unwrap());
    }

    /// Any cycle is rejected, naming a node on it.
    #[test]
    fn cycles_are_rejected(parents in arb_cyclic(24)) {
        let err = hierarchy_order(&parents).unwrap_err();
        let SkeletonError::CyclicAttachment { surface } = err else {
            return Err(TestCaseError::fail("expected a cycle"));
        };

        // Following parents from the reported surface returns to it
        let mut current = parents[surface];
        let mut steps = 0;
        while let Some(node) = current {
            if node == surface {
                break;
            }
            current = parents[node];
            steps += 1;
            prop_assert!(steps <= parents.len());
        }
        prop_assert_eq!(current, Some(surface));
    }
}

// =============================================================================
// Property Tests: Merge
// =============================================================================

proptest! {
    /// Merged parents precede children and every present surface
    /// contributes exactly one bone.
    #[test]
    fn merge_keeps_parents_first(
        (parents, present) in arb_forest(16).prop_flat_map(|parents| {
            let n = parents.len();
            (Just(parents), prop::collection::vec(any::<bool>(), n))
        })
    ) {
        let slots = slots_for(&parents, &present);
        let merged = merge_skeletons(&slots).unwrap();
        let expected = present.iter().filter(|&&p| p).count();

        match merged {
            None => prop_assert_eq!(expected, 0),
            Some(skeleton) => {
                prop_assert_eq!(skeleton.bone_count(), expected);
                for (position, parent) in skeleton.parents().iter().enumerate() {
                    if let Some(parent) = *parent {
                        prop_assert!(parent < position);
                    }
                }
            }
        }
    }

    /// A bone's merged parent is the bone of its surface's parent, when that
    /// surface has one.
    #[test]
    fn merge_attaches_to_parent_surface(parents in arb_forest(16)) {
        let present = vec![true; parents.len()];
        let skeleton = merge_skeletons(&slots_for(&parents, &present)).unwrap().unwrap();

        for (surface, parent) in parents.iter().enumerate() {
            let id = BoneId::new(surface as u64);
            let expected = parent.map(|p| BoneId::new(p as u64));
            prop_assert_eq!(skeleton.parent(id), expected);
        }
    }

    /// Merging a cyclic graph never produces a skeleton.
    #[test]
    fn merge_rejects_cycles(parents in arb_cyclic(16)) {
        let present = vec![true; parents.len()];
        let result = merge_skeletons(&slots_for(&parents, &present));
        prop_assert!(result.is_err_and(|e| e.is_cycle()));
    }
}
