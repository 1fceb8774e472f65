//! Distribution of a container's extent among its children.
//!
//! These helpers work on plain `f32` extents; the layout engine converts to
//! and from [Pt](crate::Pt) around them.

use super::{Alignment, SizePolicy};

const EPSILON: f32 = 1e-4;

/// One child as seen by the distribution along the container's primary axis
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoxItem {
    pub preferred: f32,
    pub policy: SizePolicy,
    pub stretch: u32,
}

impl BoxItem {
    pub fn new(preferred: f32, policy: SizePolicy, stretch: u32) -> BoxItem {
        BoxItem {
            preferred: preferred.max(0.0),
            policy,
            stretch,
        }
    }

    /// The extent the child starts from before surplus or deficit is applied
    fn basis(&self) -> f32 {
        match self.policy {
            SizePolicy::Ignored => 0.0,
            _ => self.preferred,
        }
    }
}

/// Assign an extent to every item so that the extents plus the spacing between
/// them never exceed `available`.
///
/// Surplus goes to expanding items by stretch weight, or to ignored items when
/// nothing expands. A deficit is taken from `Preferred`, `Maximum` and
/// `Ignored` items first, then from `Expanding` ones; the remaining items are
/// only clipped, uniformly, once everything else is exhausted.
pub fn distribute(items: &[BoxItem], available: f32, spacing: f32) -> Vec<f32> {
    if items.is_empty() {
        return Vec::new();
    }

    let gaps = spacing.max(0.0) * (items.len() - 1) as f32;
    let space = (available - gaps).max(0.0);
    let mut sizes: Vec<f32> = items.iter().map(BoxItem::basis).collect();
    let total: f32 = sizes.iter().sum();

    if total <= space {
        let mut receivers = members(items, |p| p.expands());
        if receivers.is_empty() {
            receivers = members(items, |p| p == SizePolicy::Ignored);
        }
        grow(&mut sizes, items, &receivers, space - total);
        return sizes;
    }

    let mut deficit = total - space;
    for tier in [
        members(items, SizePolicy::shrinks_first),
        members(items, |p| p == SizePolicy::Expanding),
    ] {
        deficit = shrink(&mut sizes, items, &tier, deficit);
        if deficit <= EPSILON {
            return sizes;
        }
    }

    // only items holding their preferred extent are left; clip them uniformly
    let held = members(items, SizePolicy::holds_preferred);
    let held_total: f32 = held.iter().map(|&i| sizes[i]).sum();
    if held_total > 0.0 {
        let scale = ((held_total - deficit) / held_total).clamp(0.0, 1.0);
        for i in held {
            sizes[i] *= scale;
        }
    }
    sizes
}

fn members<F: Fn(SizePolicy) -> bool>(items: &[BoxItem], filter: F) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| filter(item.policy))
        .map(|(i, _)| i)
        .collect()
}

/// Stretch weights of the given members; all-zero weights count as equal
fn weights(items: &[BoxItem], members: &[usize]) -> Vec<f32> {
    let weights: Vec<f32> = members.iter().map(|&i| items[i].stretch as f32).collect();
    if weights.iter().all(|w| *w <= 0.0) {
        vec![1.0; members.len()]
    } else {
        weights
    }
}

fn grow(sizes: &mut [f32], items: &[BoxItem], members: &[usize], amount: f32) {
    if members.is_empty() || amount <= 0.0 {
        return;
    }
    let weights = weights(items, members);
    let total: f32 = weights.iter().sum();
    for (&i, w) in members.iter().zip(weights) {
        sizes[i] += amount * w / total;
    }
}

/// Take up to `amount` from the members by stretch weight, never below zero.
/// Returns what could not be taken.
fn shrink(sizes: &mut [f32], items: &[BoxItem], members: &[usize], mut amount: f32) -> f32 {
    loop {
        let active: Vec<usize> = members.iter().copied().filter(|&i| sizes[i] > 0.0).collect();
        if active.is_empty() || amount <= EPSILON {
            return amount.max(0.0);
        }

        let weights = weights(items, &active);
        let total: f32 = weights.iter().sum();
        let mut taken = 0.0;
        for (&i, w) in active.iter().zip(weights) {
            let cut = (amount * w / total).min(sizes[i]);
            sizes[i] -= cut;
            taken += cut;
        }
        amount -= taken;
        if taken <= EPSILON {
            return amount.max(0.0);
        }
    }
}

/// Offset and extent of a child across the container's primary axis
pub fn cross_extent(
    policy: SizePolicy,
    preferred: f32,
    available: f32,
    alignment: Alignment,
) -> (f32, f32) {
    let available = available.max(0.0);
    let extent = match policy {
        SizePolicy::Fixed => preferred.min(available),
        SizePolicy::Maximum if alignment != Alignment::Stretch => preferred.min(available),
        _ => available,
    }
    .max(0.0);

    let offset = match alignment {
        Alignment::Start | Alignment::Stretch => 0.0,
        Alignment::Center => (available - extent) / 2.0,
        Alignment::End => available - extent,
    };
    (offset, extent)
}

/// Offsets of consecutive extents separated by `spacing`, starting at zero
pub fn offsets(sizes: &[f32], spacing: f32) -> Vec<f32> {
    let mut cursor = 0.0;
    sizes
        .iter()
        .map(|size| {
            let at = cursor;
            cursor += size + spacing.max(0.0);
            at
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use SizePolicy::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn ignored_items_share_when_nothing_expands() {
        let items = vec![BoxItem::new(40.0, Ignored, 10); 3];
        let sizes = distribute(&items, 300.0, 0.0);
        assert!(sizes.iter().all(|s| close(*s, 100.0)), "{sizes:?}");

        let sizes = distribute(&items, 300.0, 6.0);
        assert!(sizes.iter().all(|s| close(*s, 96.0)), "{sizes:?}");
    }

    #[test]
    fn surplus_goes_to_expanding_by_weight() {
        let items = vec![
            BoxItem::new(50.0, Preferred, 10),
            BoxItem::new(50.0, Expanding, 10),
            BoxItem::new(50.0, MinimumExpanding, 30),
            BoxItem::new(50.0, Ignored, 10),
        ];
        let sizes = distribute(&items, 230.0, 0.0);
        assert!(close(sizes[0], 50.0));
        assert!(close(sizes[1], 70.0));
        assert!(close(sizes[2], 110.0));
        assert!(close(sizes[3], 0.0));
    }

    #[test]
    fn preferred_items_keep_their_size_with_room_to_spare() {
        let items = vec![BoxItem::new(50.0, Preferred, 10), BoxItem::new(20.0, Fixed, 10)];
        assert_eq!(distribute(&items, 500.0, 10.0), vec![50.0, 20.0]);
    }

    #[test]
    fn deficit_shrinks_preferred_before_expanding() {
        let items = vec![
            BoxItem::new(100.0, Preferred, 10),
            BoxItem::new(100.0, Expanding, 10),
            BoxItem::new(100.0, Fixed, 10),
        ];
        let sizes = distribute(&items, 250.0, 0.0);
        assert!(close(sizes[0], 50.0), "{sizes:?}");
        assert!(close(sizes[1], 100.0));
        assert!(close(sizes[2], 100.0));

        let sizes = distribute(&items, 150.0, 0.0);
        assert!(close(sizes[0], 0.0), "{sizes:?}");
        assert!(close(sizes[1], 50.0));
        assert!(close(sizes[2], 100.0));
    }

    #[test]
    fn held_items_are_clipped_last() {
        let items = vec![
            BoxItem::new(100.0, Fixed, 10),
            BoxItem::new(50.0, Minimum, 10),
            BoxItem::new(30.0, Maximum, 10),
        ];
        let sizes = distribute(&items, 75.0, 0.0);
        assert!(close(sizes[2], 0.0));
        assert!(close(sizes[0], 50.0), "{sizes:?}");
        assert!(close(sizes[1], 25.0));
    }

    #[test]
    fn shrink_respects_weights_and_floors() {
        let items = vec![BoxItem::new(10.0, Preferred, 30), BoxItem::new(100.0, Preferred, 10)];
        let sizes = distribute(&items, 60.0, 0.0);
        // the light item bottoms out, the rest is taken from the heavy one
        assert!(close(sizes[0], 0.0), "{sizes:?}");
        assert!(close(sizes[1], 60.0));
    }

    #[test]
    fn cross_axis_placement() {
        assert_eq!(cross_extent(Fixed, 20.0, 100.0, Alignment::Center), (40.0, 20.0));
        assert_eq!(cross_extent(Maximum, 20.0, 100.0, Alignment::End), (80.0, 20.0));
        assert_eq!(cross_extent(Maximum, 20.0, 100.0, Alignment::Stretch), (0.0, 100.0));
        assert_eq!(cross_extent(Preferred, 20.0, 100.0, Alignment::Center), (0.0, 100.0));
        assert_eq!(cross_extent(Fixed, 200.0, 100.0, Alignment::Start), (0.0, 100.0));
    }

    #[test]
    fn offsets_include_spacing() {
        assert_eq!(offsets(&[10.0, 20.0, 5.0], 2.0), vec![0.0, 12.0, 34.0]);
    }

    fn any_policy() -> impl Strategy<Value = SizePolicy> {
        prop_oneof![
            Just(Fixed),
            Just(Minimum),
            Just(Maximum),
            Just(Preferred),
            Just(Expanding),
            Just(MinimumExpanding),
            Just(Ignored),
        ]
    }

    fn any_item() -> impl Strategy<Value = BoxItem> {
        (0.0f32..500.0, any_policy(), 0u32..40)
            .prop_map(|(preferred, policy, stretch)| BoxItem::new(preferred, policy, stretch))
    }

    proptest! {
        #[test]
        fn extents_and_spacing_fit(
            items in prop::collection::vec(any_item(), 1..8),
            available in 0.0f32..2000.0,
            spacing in 0.0f32..10.0,
        ) {
            let gaps = spacing * (items.len() - 1) as f32;
            prop_assume!(gaps <= available);

            let sizes = distribute(&items, available, spacing);
            prop_assert_eq!(sizes.len(), items.len());
            prop_assert!(sizes.iter().all(|s| *s >= 0.0));
            let used: f32 = sizes.iter().sum::<f32>() + gaps;
            prop_assert!(used <= available + 0.05, "used {} of {}", used, available);
        }
    }
}
