use eframe::egui::{Vec2, vec2};

use super::quadtree::{CellId, Quadtree, ROOT};

const MIN_CHARGE_DISTANCE_SQ: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn charge_between(point: Vec2, source: Vec2, scaled_charge: f32) -> Vec2 {
    let delta = source - point;
    let distance_sq = delta.length_sq().max(MIN_CHARGE_DISTANCE_SQ);
    delta * (scaled_charge / distance_sq)
}

/// Barnes-Hut charge on body `index`, walked with an explicit stack. A
/// negative `scaled_charge` repels.
pub(super) fn charge_on_body(
    tree: &Quadtree,
    index: usize,
    positions: &[Vec2],
    scaled_charge: f32,
    theta: f32,
    stack: &mut Vec<CellId>,
) -> Vec2 {
    let point = positions[index];
    let mut total = Vec2::ZERO;

    stack.clear();
    stack.push(ROOT);
    while let Some(id) = stack.pop() {
        let cell = tree.cell(id);
        if cell.mass <= 0.0 {
            continue;
        }

        if cell.is_leaf() {
            for &other in tree.members(id) {
                if other != index {
                    total += charge_between(point, positions[other], scaled_charge);
                }
            }
            continue;
        }

        let distance = (cell.center_of_mass - point).length().max(0.01);
        if !cell.square.contains(point) && cell.square.side() / distance < theta {
            total += charge_between(point, cell.center_of_mass, scaled_charge * cell.mass);
        } else {
            stack.extend(tree.children(id));
        }
    }
    total
}

fn separate_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    deltas: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = radii[from] + radii[to];
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };

    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let from_share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    let push = direction * ((min_distance - distance) * strength);
    deltas[from] += push * from_share;
    deltas[to] -= push * (1.0 - from_share);
}

/// Pairwise overlap resolution between the bodies of cells `a` and `b`
/// (`a == b` for pairs inside one cell), pruning cells too far apart to touch.
pub(super) fn resolve_collisions(
    tree: &Quadtree,
    a: CellId,
    b: CellId,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let (cell_a, cell_b) = (tree.cell(a), tree.cell(b));
    if cell_a.square.gap_sq(cell_b.square) > params.max_distance_sq {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        let members_a = tree.members(a);
        if a == b {
            for (offset, &from) in members_a.iter().enumerate() {
                for &to in &members_a[offset + 1..] {
                    separate_pair(from, to, positions, radii, params.strength, deltas);
                }
            }
        } else {
            for &from in members_a {
                for &to in tree.members(b) {
                    separate_pair(from, to, positions, radii, params.strength, deltas);
                }
            }
        }
        return;
    }

    if a == b {
        for first in 0..4 {
            let Some(child_a) = tree.child(a, first) else {
                continue;
            };
            resolve_collisions(tree, child_a, child_a, positions, radii, params, deltas);
            for second in first + 1..4 {
                if let Some(child_b) = tree.child(a, second) {
                    resolve_collisions(tree, child_a, child_b, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    // Descend into the larger internal cell so both sides shrink together.
    let split_a = !cell_a.is_leaf()
        && (cell_b.is_leaf() || cell_a.square.half_extent >= cell_b.square.half_extent);
    if split_a {
        for child in tree.children(a) {
            resolve_collisions(tree, child, b, positions, radii, params, deltas);
        }
    } else {
        for child in tree.children(b) {
            resolve_collisions(tree, a, child, positions, radii, params, deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_charge_pushes_bodies_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = Quadtree::build(&positions).expect("tree");
        let mut stack = Vec::new();

        let left = charge_on_body(&tree, 0, &positions, -400.0, 0.9, &mut stack);
        let right = charge_on_body(&tree, 1, &positions, -400.0, 0.9, &mut stack);

        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-4);
    }

    #[test]
    fn overlapping_pair_is_split_by_radius() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let radii = vec![20.0, 10.0];
        let tree = Quadtree::build(&positions).expect("tree");
        let mut deltas = vec![Vec2::ZERO; 2];

        resolve_collisions(
            &tree,
            ROOT,
            ROOT,
            &positions,
            &radii,
            CollisionParams {
                strength: 1.0,
                max_distance_sq: 60.0 * 60.0,
            },
            &mut deltas,
        );

        let total_push = deltas[1].x - deltas[0].x;
        assert!((total_push - 20.0).abs() < 1e-3);
        assert!(deltas[1].x > -deltas[0].x, "smaller body moves further");
    }

    #[test]
    fn separated_pair_is_untouched() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let radii = vec![20.0, 20.0];
        let tree = Quadtree::build(&positions).expect("tree");
        let mut deltas = vec![Vec2::ZERO; 2];

        resolve_collisions(
            &tree,
            ROOT,
            ROOT,
            &positions,
            &radii,
            CollisionParams {
                strength: 1.0,
                max_distance_sq: 80.0 * 80.0,
            },
            &mut deltas,
        );

        assert_eq!(deltas, vec![Vec2::ZERO; 2]);
    }

    #[test]
    fn distant_cluster_is_approximated_by_its_center_of_mass() {
        let mut positions = vec![vec2(0.0, 0.0)];
        positions.extend((0..36).map(|index| {
            vec2(1000.0 + (index % 6) as f32 * 100.0, 1000.0 + (index / 6) as f32 * 100.0)
        }));
        let tree = Quadtree::build(&positions).expect("tree");
        let mut stack = Vec::new();

        let approximate = charge_on_body(&tree, 0, &positions, -100.0, 0.9, &mut stack);
        let exact = positions[1..]
            .iter()
            .fold(Vec2::ZERO, |sum, &other| sum + charge_between(positions[0], other, -100.0));

        assert!(approximate.x < 0.0 && approximate.y < 0.0);
        assert!((approximate - exact).length() < exact.length() * 0.1);
    }
}
