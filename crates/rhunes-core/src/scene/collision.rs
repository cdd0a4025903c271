//! Pairwise collision sweep.
//!
//! Every unordered pair of the collision collection is tested, so the sweep
//! is O(n²) in the number of colliders. Scenes are expected to hold few of
//! them.

use crate::ider::EntityId;
use crate::math::Rect;

/// Every pair `(a, b)` of `colliders`, with `a` listed before `b`, whose
/// rectangles overlap. Entries without a rectangle never collide.
pub fn overlapping_pairs(colliders: &[(EntityId, Option<Rect>)]) -> Vec<(EntityId, EntityId)> {
    let mut pairs = Vec::new();
    for (i, (a, rect_a)) in colliders.iter().enumerate() {
        let Some(rect_a) = rect_a else {
            continue;
        };
        for (b, rect_b) in &colliders[i + 1..] {
            let Some(rect_b) = rect_b else {
                continue;
            };
            if rect_a.overlaps(rect_b) {
                pairs.push((*a, *b));
            }
        }
    }
    pairs
}
