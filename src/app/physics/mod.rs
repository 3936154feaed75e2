mod forces;
mod quadtree;

use eframe::egui::Vec2;

use forces::{CollisionParams, charge_on_body, resolve_collisions};
pub(in crate::app) use quadtree::QuadtreeCell;
use quadtree::{Quadtree, ROOT};

const BARNES_HUT_THETA: f32 = 0.9;
pub(in crate::app) const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Force parameters for one view mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutParams {
    pub link_distance: f32,
    pub link_stiffness: f32,
    pub charge: f32,
    pub center_strength: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    pub radial_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub max_coordinate: f32,
}

impl LayoutParams {
    pub(in crate::app) fn overview() -> Self {
        Self {
            link_distance: 120.0,
            charge: -400.0,
            radial_strength: 0.3,
            ..Self::detail()
        }
    }

    pub(in crate::app) fn detail() -> Self {
        Self {
            link_distance: 80.0,
            link_stiffness: 0.5,
            charge: -200.0,
            center_strength: 0.1,
            collision_padding: 10.0,
            collision_strength: 1.0,
            radial_strength: 0.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            max_coordinate: 50_000.0,
        }
    }

    pub(in crate::app) fn with_max_coordinate(mut self, max_coordinate: f32) -> Self {
        self.max_coordinate = max_coordinate;
        self
    }
}

#[derive(Clone, Debug)]
pub(in crate::app) struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Held under the pointer while dragged; the body ignores forces meanwhile.
    pub pinned: Option<Vec2>,
    pub size: f32,
    pub radial_target_y: Option<f32>,
}

impl Body {
    pub(in crate::app) fn new(position: Vec2, size: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            pinned: None,
            size,
            radial_target_y: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Link {
    pub source: usize,
    pub target: usize,
    pub strength: f32,
}

#[derive(Default)]
struct PhysicsScratch {
    deltas: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    stack: Vec<usize>,
}

/// Owns every body position of the active view. Positions only change through
/// `step`, `pin`, and `release`.
pub(in crate::app) struct Simulation {
    bodies: Vec<Body>,
    links: Vec<Link>,
    link_bias: Vec<f32>,
    params: LayoutParams,
    alpha: f32,
    alpha_target: f32,
    scratch: PhysicsScratch,
}

impl Simulation {
    pub(in crate::app) fn new(bodies: Vec<Body>, links: Vec<Link>, params: LayoutParams) -> Self {
        let body_count = bodies.len();
        let links = links
            .into_iter()
            .filter(|link| {
                link.source < body_count && link.target < body_count && link.source != link.target
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; body_count];
        for link in &links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }
        let link_bias = links
            .iter()
            .map(|link| {
                let source = degree[link.source] as f32;
                source / (source + degree[link.target] as f32)
            })
            .collect();

        Self {
            bodies,
            links,
            link_bias,
            params,
            alpha: 1.0,
            alpha_target: 0.0,
            scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).map(|body| body.position)
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.alpha >= self.params.alpha_min || self.alpha_target >= self.params.alpha_min
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        let limit = self.params.max_coordinate;
        if let Some(body) = self.bodies.get_mut(index) {
            let position = clamp_position(position, limit);
            body.pinned = Some(position);
            body.position = position;
            body.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn set_radial_target(&mut self, index: usize, target_y: Option<f32>) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.radial_target_y = target_y;
        }
    }

    pub(in crate::app) fn release(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pinned = None;
        }
    }

    pub(in crate::app) fn quadtree_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = self
            .bodies
            .iter()
            .map(|body| body.position)
            .collect::<Vec<_>>();
        if let Some(tree) = Quadtree::build(&positions) {
            tree.export_cells(cells);
        }
    }

    /// Advances one relaxation tick. Returns whether the layout is still hot.
    pub(in crate::app) fn step(&mut self) -> bool {
        if self.bodies.is_empty() || !self.is_running() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;

        self.apply_links(alpha);
        self.apply_charge_and_collision(alpha);

        for body in &mut self.bodies {
            if let Some(target_y) = body.radial_target_y
                && params.radial_strength > 0.0
            {
                body.velocity.y += (target_y - body.position.y) * params.radial_strength * alpha;
            }
        }

        for body in &mut self.bodies {
            if let Some(pin) = body.pinned {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            body.velocity *= 1.0 - params.velocity_decay;
            body.position += body.velocity;
        }

        self.apply_centering();

        for body in &mut self.bodies {
            if !body.position.is_finite() || !body.velocity.is_finite() {
                body.position = body.pinned.unwrap_or(Vec2::ZERO);
                body.velocity = Vec2::ZERO;
            }
            body.position = clamp_position(body.position, params.max_coordinate);
        }

        self.is_running()
    }

    fn apply_links(&mut self, alpha: f32) {
        let distance = self.params.link_distance;
        let stiffness = self.params.link_stiffness;

        for (link, &bias) in self.links.iter().zip(&self.link_bias) {
            let source = &self.bodies[link.source];
            let target = &self.bodies[link.target];
            let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
            if delta.length_sq() <= 1e-12 {
                delta = Vec2::new(1e-3, 1e-3);
            }

            let length = delta.length();
            let pull = delta * ((length - distance) / length * alpha * stiffness * link.strength);

            self.bodies[link.target].velocity -= pull * bias;
            self.bodies[link.source].velocity += pull * (1.0 - bias);
        }
    }

    fn apply_charge_and_collision(&mut self, alpha: f32) {
        let body_count = self.bodies.len();
        if body_count < 2 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.deltas.clear();
        scratch.deltas.resize(body_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();

        let mut max_radius = 0.0_f32;
        for body in &self.bodies {
            let radius = body.size.max(0.0) + self.params.collision_padding;
            scratch.positions.push(body.position);
            scratch.radii.push(radius);
            max_radius = max_radius.max(radius);
        }

        let Some(tree) = Quadtree::build(&scratch.positions) else {
            return;
        };

        let scaled_charge = self.params.charge * alpha;
        for (index, delta) in scratch.deltas.iter_mut().enumerate() {
            if scratch.positions[index].is_finite() {
                *delta += charge_on_body(
                    &tree,
                    index,
                    &scratch.positions,
                    scaled_charge,
                    BARNES_HUT_THETA,
                    &mut scratch.stack,
                );
            }
        }

        let max_distance = max_radius * 2.0;
        if max_distance > 0.0 && self.params.collision_strength > 0.0 {
            resolve_collisions(
                &tree,
                ROOT,
                ROOT,
                &scratch.positions,
                &scratch.radii,
                CollisionParams {
                    strength: self.params.collision_strength,
                    max_distance_sq: max_distance * max_distance,
                },
                &mut scratch.deltas,
            );
        }

        for (body, delta) in self.bodies.iter_mut().zip(&scratch.deltas) {
            body.velocity += *delta;
        }
    }

    fn apply_centering(&mut self) {
        let mut centroid = Vec2::ZERO;
        let mut free = 0usize;
        for body in self.bodies.iter().filter(|body| body.pinned.is_none()) {
            centroid += body.position;
            free += 1;
        }
        if free == 0 {
            return;
        }

        centroid /= free as f32;
        if !centroid.is_finite() {
            return;
        }

        let shift = centroid * self.params.center_strength;
        for body in self.bodies.iter_mut().filter(|body| body.pinned.is_none()) {
            body.position -= shift;
        }
    }
}

fn clamp_position(position: Vec2, limit: f32) -> Vec2 {
    Vec2::new(
        position.x.clamp(-limit, limit),
        position.y.clamp(-limit, limit),
    )
}
