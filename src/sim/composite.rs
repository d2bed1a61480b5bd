//! Composite body parts: ownership of children
//!
//! A part belongs to at most one composite at a time. Moving a part between
//! composites is a remove followed by an add; `reparent` does both while
//! keeping the part where it is in the world.

use super::body_part::{PartId, PartKind};
use super::body_tree::BodyTree;
use super::error::BossError;

impl BodyTree {
    /// Append `child` to the end of `parent`'s children
    pub fn add_body_part(&mut self, parent: PartId, child: PartId) -> Result<(), BossError> {
        if let Some(owner) = self.parent(child) {
            return Err(BossError::AlreadyParented { part: child, parent: owner });
        }
        if self.is_or_contains_part(child, parent, true) {
            return Err(BossError::Cycle { part: child, parent });
        }
        match &mut self.part_mut(parent).kind {
            PartKind::Composite(children) => children.push(child),
            _ => return Err(BossError::NotComposite(parent)),
        }
        self.part_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent` without destroying it.
    ///
    /// The part stays registered and can be added somewhere else.
    pub fn remove_body_part(&mut self, parent: PartId, child: PartId) -> Result<(), BossError> {
        let PartKind::Composite(children) = &mut self.part_mut(parent).kind else {
            return Err(BossError::NotComposite(parent));
        };
        let Some(pos) = children.iter().position(|c| *c == child) else {
            return Err(BossError::NotAChild { part: child, parent });
        };
        children.remove(pos);
        self.part_mut(child).parent = None;
        Ok(())
    }

    /// Depth-first search under `root` for the composite whose direct
    /// children include `target`
    pub fn search_for_parent(&self, root: PartId, target: PartId) -> Option<PartId> {
        let children = self.children(root);
        if children.contains(&target) {
            return Some(root);
        }
        children
            .iter()
            .find_map(|child| self.search_for_parent(*child, target))
    }

    /// Whether `id` is `target` or has it among its children
    /// (any depth when `recursive`)
    pub fn is_or_contains_part(&self, id: PartId, target: PartId, recursive: bool) -> bool {
        if id == target {
            return true;
        }
        let children = self.children(id);
        if recursive {
            children
                .iter()
                .any(|child| self.is_or_contains_part(*child, target, true))
        } else {
            children.contains(&target)
        }
    }

    /// Index of `child` within `parent`'s children
    pub fn child_position(&self, parent: PartId, child: PartId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    /// Move `child` under `new_parent`, keeping its world transform
    pub fn reparent(&mut self, child: PartId, new_parent: PartId) -> Result<(), BossError> {
        let world = self.world_transform(child);
        if let Some(old_parent) = self.parent(child) {
            self.remove_body_part(old_parent, child)?;
        }
        self.add_body_part(new_parent, child)?;
        self.set_world_transform(child, world);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use proptest::prelude::*;

    use super::*;
    use crate::sim::bounds::BoundingLines;

    fn sample_tree() -> (BodyTree, PartId, PartId, PartId, PartId) {
        let mut tree = BodyTree::new();
        let root = tree.create_composite("root");
        let arm = tree.create_composite("arm");
        let hand = tree.create_basic("hand", BoundingLines::rect(0.5, 0.5));
        let head = tree.create_basic("head", BoundingLines::rect(1.0, 1.0));
        tree.add_body_part(root, arm).unwrap();
        tree.add_body_part(arm, hand).unwrap();
        tree.add_body_part(root, head).unwrap();
        (tree, root, arm, hand, head)
    }

    #[test]
    fn test_search_for_parent_finds_nearest_owner() {
        let (tree, root, arm, hand, head) = sample_tree();
        assert_eq!(tree.search_for_parent(root, hand), Some(arm));
        assert_eq!(tree.search_for_parent(root, head), Some(root));
        assert_eq!(tree.search_for_parent(arm, head), None);
        assert_eq!(tree.search_for_parent(root, root), None);
    }

    #[test]
    fn test_is_or_contains_recursive_vs_direct() {
        let (tree, root, arm, hand, _) = sample_tree();
        assert!(tree.is_or_contains_part(root, hand, true));
        assert!(!tree.is_or_contains_part(root, hand, false));
        assert!(tree.is_or_contains_part(arm, hand, false));
        assert!(tree.is_or_contains_part(hand, hand, false));
    }

    #[test]
    fn test_add_rejects_second_owner_and_cycles() {
        let (mut tree, root, arm, hand, head) = sample_tree();
        assert_eq!(
            tree.add_body_part(root, hand),
            Err(BossError::AlreadyParented { part: hand, parent: arm })
        );
        assert_eq!(tree.add_body_part(head, hand).unwrap_err(), BossError::AlreadyParented {
            part: hand,
            parent: arm
        });

        tree.remove_body_part(root, arm).unwrap();
        assert_eq!(tree.add_body_part(hand, arm), Err(BossError::Cycle { part: arm, parent: hand }));
    }

    #[test]
    fn test_add_to_leaf_fails() {
        let mut tree = BodyTree::new();
        let leaf = tree.create_basic("leaf", BoundingLines::new());
        let other = tree.create_basic("other", BoundingLines::new());
        assert_eq!(tree.add_body_part(leaf, other), Err(BossError::NotComposite(leaf)));
    }

    #[test]
    fn test_remove_non_child_fails() {
        let (mut tree, root, _, hand, _) = sample_tree();
        assert_eq!(
            tree.remove_body_part(root, hand),
            Err(BossError::NotAChild { part: hand, parent: root })
        );
    }

    #[test]
    fn test_reparent_keeps_world_position() {
        let (mut tree, root, arm, hand, _) = sample_tree();
        let graveyard = tree.create_composite("graveyard");
        tree.add_body_part(root, graveyard).unwrap();

        tree.translate(arm, Vec3::new(-6.0, 1.0, 0.0));
        tree.rotate_z(arm, 30.0);
        tree.translate(graveyard, Vec3::new(2.0, 2.0, 0.0));
        let before = tree.generate_world_aabb(hand);

        tree.reparent(hand, graveyard).unwrap();
        assert_eq!(tree.parent(hand), Some(graveyard));
        assert!(tree.children(arm).is_empty());

        let after = tree.generate_world_aabb(hand);
        assert!((before.min - after.min).length() < 1e-3);
        assert!((before.max - after.max).length() < 1e-3);

        // The hand no longer follows the arm
        tree.translate(arm, Vec3::new(50.0, 0.0, 0.0));
        let moved = tree.generate_world_aabb(hand);
        assert!((moved.center() - after.center()).length() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_add_then_remove_round_trips(count in 1usize..6, pick in 0usize..6) {
            let mut tree = BodyTree::new();
            let composite = tree.create_composite("composite");
            let parts: Vec<PartId> = (0..count)
                .map(|_| tree.create_basic("piece", BoundingLines::rect(0.5, 0.5)))
                .collect();
            for p in &parts {
                tree.add_body_part(composite, *p).unwrap();
            }

            let target = parts[pick % count];
            tree.remove_body_part(composite, target).unwrap();

            prop_assert!(!tree.is_or_contains_part(composite, target, true));
            // Still registered and intact, owned by nobody
            prop_assert_eq!(tree.parent(target), None);
            prop_assert_eq!(tree.part(target).local_bounds().len(), 4);
            // Remaining order is preserved
            let expected: Vec<PartId> = parts.iter().copied().filter(|p| *p != target).collect();
            prop_assert_eq!(tree.children(composite), expected.as_slice());
        }
    }
}
