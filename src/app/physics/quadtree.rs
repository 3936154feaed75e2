use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

pub(super) type CellId = usize;
pub(super) const ROOT: CellId = 0;

/// Axis-aligned square region of the plane.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    /// Smallest padded square covering every point. `None` for an empty set.
    fn covering(points: impl Iterator<Item = Vec2>) -> Option<Self> {
        let mut bounds: Option<(Vec2, Vec2)> = None;
        for point in points {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(point), max.max(point)),
                None => (point, point),
            });
        }

        let (min, max) = bounds?;
        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two squares, zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(sign(1), sign(2)),
            half_extent: quarter,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Cell {
    pub(super) square: Square,
    pub(super) center_of_mass: Vec2,
    /// Bodies below this cell; every body carries the same charge.
    pub(super) mass: f32,
    depth: usize,
    start: usize,
    end: usize,
    children: [Option<CellId>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Cell outline exported for the debug overlay.
pub(in crate::app) struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Flat Barnes-Hut tree. Cells live in one arena and reference their bodies
/// as a contiguous run of `order`, which is permuted during the build so every
/// subtree's bodies are adjacent.
pub(super) struct Quadtree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

impl Quadtree {
    /// Builds over every finite position. Non-finite bodies are left out of
    /// the tree; `None` when no finite body remains.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let order = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect::<Vec<_>>();
        let square = Square::covering(order.iter().map(|&index| positions[index]))?;

        let mut tree = Self {
            cells: Vec::with_capacity(order.len() / LEAF_CAPACITY * 2 + 1),
            order,
        };
        let root = tree.push_cell(square, 0, 0, tree.order.len(), positions);
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            tree.split(id, positions, &mut pending);
        }
        Some(tree)
    }

    pub(super) fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }

    pub(super) fn members(&self, id: CellId) -> &[usize] {
        let cell = &self.cells[id];
        &self.order[cell.start..cell.end]
    }

    pub(super) fn children(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.cells[id].children.iter().flatten().copied()
    }

    pub(super) fn child(&self, id: CellId, quadrant: usize) -> Option<CellId> {
        self.cells[id].children[quadrant]
    }

    pub(super) fn export_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.extend(self.cells.iter().map(|cell| QuadtreeCell {
            center: cell.square.center,
            half_extent: cell.square.half_extent,
            depth: cell.depth,
            is_leaf: cell.is_leaf(),
        }));
    }

    fn push_cell(
        &mut self,
        square: Square,
        depth: usize,
        start: usize,
        end: usize,
        positions: &[Vec2],
    ) -> CellId {
        let members = &self.order[start..end];
        let mass = members.len() as f32;
        let center_of_mass = if members.is_empty() {
            square.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        self.cells.push(Cell {
            square,
            center_of_mass,
            mass,
            depth,
            start,
            end,
            children: [None; 4],
        });
        self.cells.len() - 1
    }

    fn split(&mut self, id: CellId, positions: &[Vec2], pending: &mut Vec<CellId>) {
        let Cell {
            square,
            depth,
            start,
            end,
            ..
        } = self.cells[id];
        if depth >= MAX_DEPTH || end - start <= LEAF_CAPACITY {
            return;
        }

        let run = &mut self.order[start..end];
        run.sort_by_key(|&index| square.quadrant(positions[index]));

        let mut counts = [0usize; 4];
        for &index in run.iter() {
            counts[square.quadrant(positions[index])] += 1;
        }
        // Coincident or near-coincident bodies stay together in one leaf.
        if counts.iter().filter(|&&count| count > 0).count() <= 1 {
            return;
        }

        let mut child_start = start;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.push_cell(
                square.child(quadrant),
                depth + 1,
                child_start,
                child_start + count,
                positions,
            );
            self.cells[id].children[quadrant] = Some(child);
            pending.push(child);
            child_start += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sets_stay_a_single_leaf() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 5.0), vec2(-3.0, 8.0)];
        let tree = Quadtree::build(&positions).expect("finite points build a tree");

        assert!(tree.cell(ROOT).is_leaf());
        assert_eq!(tree.cell(ROOT).mass, 3.0);
        assert_eq!(tree.members(ROOT).len(), 3);
    }

    #[test]
    fn large_sets_split_and_keep_mass() {
        let positions = (0..64)
            .map(|index| vec2((index % 8) as f32 * 40.0, (index / 8) as f32 * 40.0))
            .collect::<Vec<_>>();
        let tree = Quadtree::build(&positions).expect("finite points build a tree");

        let root = tree.cell(ROOT);
        assert!(!root.is_leaf());
        let child_mass = tree.children(ROOT).map(|child| tree.cell(child).mass).sum::<f32>();
        assert_eq!(child_mass, 64.0);
        assert!(positions.iter().all(|point| root.square.contains(*point)));

        for child in tree.children(ROOT) {
            let square = tree.cell(child).square;
            assert!(
                tree.members(child)
                    .iter()
                    .all(|&index| square.contains(positions[index]))
            );
        }

        let mut cells = Vec::new();
        tree.export_cells(&mut cells);
        assert!(cells.len() > 1);
        assert_eq!(cells[0].depth, 0);
        assert!(cells.iter().skip(1).all(|cell| cell.depth >= 1));
    }

    #[test]
    fn coincident_bodies_share_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let tree = Quadtree::build(&positions).expect("finite points build a tree");
        assert!(tree.cell(ROOT).is_leaf());
        assert_eq!(tree.members(ROOT).len(), 20);
    }

    #[test]
    fn non_finite_points_are_left_out() {
        let positions = vec![vec2(f32::NAN, 0.0), vec2(1.0, 1.0), vec2(f32::INFINITY, 2.0)];
        let tree = Quadtree::build(&positions).expect("one finite point remains");
        assert_eq!(tree.members(ROOT), &[1]);

        assert!(Quadtree::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(Quadtree::build(&[]).is_none());
    }
}
