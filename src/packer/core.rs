use crate::error::{LayoutError, Result};
use crate::geometry::{Bounds, Point, Rect, overlaps};

/// A candidate anchor point at which the next item may be placed.
pub type Slot = Point;

/// Pass-local view of one item. Built fresh from the item source at the
/// start of every pass and discarded when the pass ends; the packer writes
/// `pos` when the item is committed.
#[derive(Debug, Clone)]
pub struct PassItem {
    pub id: String,
    pub fixed: f64,
    pub flex: f64,
    pub hidden: bool,
    pub pos: Point,
}

impl PassItem {
    pub fn new(id: impl Into<String>, fixed: f64, flex: f64, hidden: bool) -> Self {
        Self {
            id: id.into(),
            fixed,
            flex,
            hidden,
            pos: Point::ZERO,
        }
    }

    /// Rectangle this item occupies once placed, in (fixed, flex) space.
    pub fn occupied(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y,
            self.pos.x + self.fixed,
            self.pos.y + self.flex,
        )
    }
}

/// Greedy slot/barrier packer.
///
/// Owns the placement frontier (`slots`) and the claimed space
/// (`barriers`); both are rebuilt by `begin_pass` and never survive a
/// pass boundary. Items must be offered in input order: the packer fills
/// the topmost, then leftmost, viable gap for each one.
#[derive(Debug, Default)]
pub struct Packer {
    slots: Vec<Slot>,
    barriers: Vec<Bounds>,
    gutter: f64,
    container_fixed: f64,
    origin: Slot,
    swept: usize,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all pass state: one seed slot at the padding offset and the
    /// sentinel wall just past the container's fixed extent.
    pub fn begin_pass(&mut self, padding: Point, gutter: f64, container_fixed: f64) {
        self.origin = padding;
        self.slots = vec![padding];
        self.barriers = vec![Bounds::wall_at(container_fixed + gutter)];
        self.gutter = gutter;
        self.container_fixed = container_fixed;
        self.swept = 0;
    }

    /// The seed slot of the current pass (the container padding offset).
    pub fn origin(&self) -> Slot {
        self.origin
    }

    /// Slots discarded so far this pass because a placement swallowed them.
    pub fn swept(&self) -> usize {
        self.swept
    }

    /// Place one item at the best viable slot, updating the frontier.
    ///
    /// Viability is checked lazily per slot: the item's footprint, offset
    /// to the slot and inflated by the gutter, must clear every barrier.
    /// Among viable slots the smallest flex coordinate wins, ties broken
    /// by the smallest fixed coordinate.
    pub fn place(&mut self, item: &mut PassItem) -> Result<()> {
        let footprint = Rect::sized(item.fixed, item.flex);

        let viable: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                !self
                    .barriers
                    .iter()
                    .any(|barrier| overlaps(footprint, *barrier, self.gutter, **slot))
            })
            .map(|(idx, _)| idx)
            .collect();

        let best = viable.into_iter().min_by(|&a, &b| {
            let (sa, sb) = (self.slots[a], self.slots[b]);
            sa.y.total_cmp(&sb.y).then(sa.x.total_cmp(&sb.x))
        });

        let Some(idx) = best else {
            return Err(LayoutError::NoViableSlot {
                id: item.id.clone(),
                fixed: item.fixed,
                flex: item.flex,
            });
        };

        let slot = self.slots.remove(idx);
        item.pos = slot;
        let occupied = item.occupied();

        // Anchors inside the committed rectangle are solid space now.
        let before = self.slots.len();
        self.slots
            .retain(|s| !overlaps(occupied, Bounds::at(*s), 0.0, Point::ZERO));
        self.swept += before - self.slots.len();

        let right = slot.x + item.fixed + self.gutter;
        if right < self.container_fixed {
            self.slots.push(Slot::new(right, slot.y));
        }
        // The below slot is never bounded: the flex axis is the growth axis.
        self.slots
            .push(Slot::new(slot.x, slot.y + item.flex + self.gutter));

        self.barriers.push(occupied.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_all(
        packer: &mut Packer,
        sizes: &[(f64, f64)],
    ) -> Result<Vec<Point>> {
        let mut out = Vec::new();
        for (i, &(fixed, flex)) in sizes.iter().enumerate() {
            let mut item = PassItem::new(format!("item-{i}"), fixed, flex, false);
            packer.place(&mut item)?;
            out.push(item.pos);
        }
        Ok(out)
    }

    #[test]
    fn fills_the_gap_beside_the_first_item() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 0.0, 100.0);

        let positions =
            place_all(&mut packer, &[(50.0, 50.0), (50.0, 30.0), (50.0, 50.0)]).unwrap();

        assert_eq!(positions[0], Point::new(0.0, 0.0));
        // Beside item 1, not below it.
        assert_eq!(positions[1], Point::new(50.0, 0.0));
        // The slot under the shorter item 2 is the topmost gap.
        assert_eq!(positions[2], Point::new(50.0, 30.0));
    }

    #[test]
    fn equal_flex_ties_break_toward_the_smaller_fixed_coordinate() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 0.0, 100.0);

        let positions =
            place_all(&mut packer, &[(50.0, 50.0), (50.0, 50.0), (50.0, 30.0)]).unwrap();

        assert_eq!(positions[0], Point::new(0.0, 0.0));
        assert_eq!(positions[1], Point::new(50.0, 0.0));
        // Both rows end at flex 50; the left slot wins the tie.
        assert_eq!(positions[2], Point::new(0.0, 50.0));
    }

    #[test]
    fn gutter_separates_rows_and_columns() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 10.0, 100.0);

        let positions =
            place_all(&mut packer, &[(40.0, 40.0), (40.0, 40.0), (40.0, 40.0)]).unwrap();

        assert_eq!(positions[0], Point::new(0.0, 0.0));
        assert_eq!(positions[1], Point::new(50.0, 0.0));
        assert_eq!(positions[2], Point::new(0.0, 50.0));
    }

    #[test]
    fn committed_items_never_overlap() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 4.0, 300.0);

        let sizes: Vec<(f64, f64)> = (0..12)
            .map(|i| (40.0 + (i % 4) as f64 * 20.0, 30.0 + (i % 3) as f64 * 25.0))
            .collect();

        let mut placed: Vec<PassItem> = Vec::new();
        for (i, &(fixed, flex)) in sizes.iter().enumerate() {
            let mut item = PassItem::new(format!("item-{i}"), fixed, flex, false);
            packer.place(&mut item).unwrap();
            placed.push(item);
        }

        for a in &placed {
            for b in &placed {
                if a.id == b.id {
                    continue;
                }
                assert!(
                    !overlaps(
                        Rect::sized(a.fixed, a.flex),
                        b.occupied().into(),
                        4.0,
                        a.pos
                    ),
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn placements_respect_the_fixed_axis_bound() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 4.0, 250.0);

        for i in 0..10 {
            let mut item = PassItem::new(format!("item-{i}"), 70.0, 35.0, false);
            packer.place(&mut item).unwrap();
            assert!(item.pos.x + item.fixed <= 250.0);
        }
    }

    #[test]
    fn oversized_item_has_no_viable_slot() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 0.0, 100.0);

        let mut item = PassItem::new("wide", 150.0, 20.0, false);
        let err = packer.place(&mut item).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::NoViableSlot { id, .. } if id == "wide"
        ));
    }

    #[test]
    fn seed_slot_starts_at_the_padding_offset() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::new(8.0, 12.0), 0.0, 100.0);

        let mut item = PassItem::new("first", 20.0, 20.0, false);
        packer.place(&mut item).unwrap();
        assert_eq!(item.pos, Point::new(8.0, 12.0));
    }

    #[test]
    fn full_width_items_stack_down_the_flex_axis() {
        let mut packer = Packer::new();
        packer.begin_pass(Point::ZERO, 0.0, 100.0);

        // An exactly container-wide item fits, but earns no right-of slot:
        // that anchor would sit on the container edge, not inside it.
        let positions = place_all(&mut packer, &[(100.0, 40.0), (100.0, 40.0)]).unwrap();
        assert_eq!(positions[0], Point::new(0.0, 0.0));
        assert_eq!(positions[1], Point::new(0.0, 40.0));
    }
}
