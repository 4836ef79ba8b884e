//! Bounded search volumes around a work origin.

use cobbleworkers_types::BlockPos;

/// An axis-aligned box of blocks centered on an origin.
///
/// Spans `radius` blocks horizontally and `height` blocks vertically in
/// each direction, so a radius of 8 and height of 5 covers 17 x 11 x 17.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBox {
    /// Center of the box.
    pub origin: BlockPos,
    /// Horizontal half-extent.
    pub radius: i32,
    /// Vertical half-extent.
    pub height: i32,
}

impl ScanBox {
    /// Construct a box. Negative extents are treated as zero.
    pub const fn new(origin: BlockPos, radius: i32, height: i32) -> Self {
        Self {
            origin,
            radius: if radius < 0 { 0 } else { radius },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Whether a position lies inside the box.
    pub fn contains(&self, pos: BlockPos) -> bool {
        within(pos.x, self.origin.x, self.radius)
            && within(pos.y, self.origin.y, self.height)
            && within(pos.z, self.origin.z, self.radius)
    }

    /// Every position in the box, ordered by `(x, y, z)`.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let r = self.radius;
        let h = self.height;
        (-r..=r).flat_map(move |dx| {
            (-h..=h).flat_map(move |dy| (-r..=r).map(move |dz| self.origin.offset(dx, dy, dz)))
        })
    }
}

fn within(value: i32, center: i32, extent: i32) -> bool {
    let delta = i64::from(value).saturating_sub(i64::from(center)).abs();
    delta <= i64::from(extent)
}
