use std::collections::VecDeque;

use eframe::egui::{Vec2, vec2};
use log::{debug, warn};

use crate::concept::{ConceptGraph, neighborhood, overview};
use crate::config::Settings;

use super::activation::ActivationSync;
use super::graph::{LayoutSeed, ViewGraph};
use super::physics::{DRAG_ALPHA_TARGET, LayoutParams};
use super::viewport::Viewport;

const DEFAULT_VIEWPORT_SIZE: Vec2 = vec2(1280.0, 800.0);
const RESIZE_REHEAT_ALPHA: f32 = 0.1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum ViewMode {
    Overview,
    Detail { focus_id: String },
}

impl ViewMode {
    pub(in crate::app) fn focus_id(&self) -> Option<&str> {
        match self {
            Self::Overview => None,
            Self::Detail { focus_id } => Some(focus_id),
        }
    }
}

/// Gestures captured by the canvas and panels, applied once per tick.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum GraphCommand {
    Click { node_id: String },
    DragStart { node_id: String, world: Vec2 },
    DragMove { world: Vec2 },
    DragEnd,
    Pan(Vec2),
    /// `anchor` is the pointer offset from the canvas center.
    ZoomAt { anchor: Vec2, factor: f32 },
    ZoomIn,
    ZoomOut,
    ResetView,
    BackToOverview,
    Select(Option<String>),
}

/// Requests flowing back out to the host playback clock.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum SessionEvent {
    NodeClicked { node_id: String, seek_to: Option<f64> },
    SeekRequested(f64),
}

struct DragState {
    index: usize,
}

/// Owns the current snapshot and everything derived from it: view mode,
/// selection, active layout, camera and activation flags.
pub(in crate::app) struct GraphSession {
    graph: ConceptGraph,
    mode: ViewMode,
    selected: Option<String>,
    view: ViewGraph,
    viewport: Viewport,
    activation: ActivationSync,
    commands: VecDeque<GraphCommand>,
    events: Vec<SessionEvent>,
    drag: Option<DragState>,
    /// Last canvas size reported by `tick`; `None` until the first frame.
    viewport_size: Option<Vec2>,
    /// Canvas size the overview hub circle was laid out for.
    hub_size: Vec2,
    now: f64,
    revision: u64,
    first_order_threshold: f32,
    carry_positions: bool,
    max_coordinate: f32,
}

impl GraphSession {
    pub(in crate::app) fn new(graph: ConceptGraph, settings: &Settings) -> Self {
        let mut session = Self {
            graph: ConceptGraph::default(),
            mode: ViewMode::Overview,
            selected: None,
            view: empty_view(),
            viewport: Viewport::new(settings.layout.focus_duration_secs),
            activation: ActivationSync::new(settings.sync.activation_window_secs),
            commands: VecDeque::new(),
            events: Vec::new(),
            drag: None,
            viewport_size: None,
            hub_size: DEFAULT_VIEWPORT_SIZE,
            now: 0.0,
            revision: 0,
            first_order_threshold: settings.graph.first_order_size_threshold,
            carry_positions: settings.layout.carry_positions,
            max_coordinate: settings.layout.max_coordinate,
        };
        session.load(graph);
        session
    }

    /// Replaces the snapshot wholesale and returns to a fresh overview.
    pub(in crate::app) fn load(&mut self, graph: ConceptGraph) {
        self.graph = graph;
        self.mode = ViewMode::Overview;
        self.selected = None;
        self.drag = None;
        self.commands.clear();
        self.events.clear();
        self.viewport.reset();
        self.rebuild_view(false);
        debug!(
            "session loaded snapshot with {} concepts, overview shows {}",
            self.graph.node_count(),
            self.view.nodes.len()
        );
    }

    pub(in crate::app) fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    pub(in crate::app) fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub(in crate::app) fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub(in crate::app) fn view(&self) -> &ViewGraph {
        &self.view
    }

    pub(in crate::app) fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub(in crate::app) fn activation(&self) -> &ActivationSync {
        &self.activation
    }

    pub(in crate::app) fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub(in crate::app) fn enqueue(&mut self, command: GraphCommand) {
        self.commands.push_back(command);
    }

    pub(in crate::app) fn request_seek(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.events.push(SessionEvent::SeekRequested(seconds.max(0.0)));
        }
    }

    pub(in crate::app) fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Host clock push. Returns whether any activation flag flipped.
    pub(in crate::app) fn set_clock(&mut self, seconds: f64) -> bool {
        self.activation.apply_clock(seconds, &mut self.view.nodes)
    }

    pub(in crate::app) fn set_activation_window(&mut self, window_secs: f64) -> bool {
        self.activation.set_window(window_secs);
        self.activation.refresh(&mut self.view.nodes)
    }

    /// Applies queued gestures, advances the camera and, when `step_layout`
    /// is set, one relaxation step. Returns whether another frame is needed.
    pub(in crate::app) fn tick(&mut self, now: f64, viewport_size: Vec2, step_layout: bool) -> bool {
        self.now = now;
        if viewport_size.x > 0.0 && viewport_size.y > 0.0 {
            self.resize(viewport_size);
        }

        while let Some(command) = self.commands.pop_front() {
            self.apply(command);
        }

        let animating = self.viewport.advance(now);
        let layout_hot = step_layout && self.view.simulation.step();
        animating || layout_hot || self.drag.is_some()
    }

    fn resize(&mut self, viewport_size: Vec2) {
        let first_frame = self.viewport_size.is_none();
        self.viewport_size = Some(viewport_size);
        if self.mode != ViewMode::Overview || viewport_size == self.hub_size {
            return;
        }

        if first_frame {
            // Nothing has been shown yet, so seed the hub for the real canvas.
            self.rebuild_view(false);
        } else if self.view.retarget_hub(viewport_size) {
            let simulation = &mut self.view.simulation;
            simulation.reheat(simulation.alpha().max(RESIZE_REHEAT_ALPHA));
        }
        self.hub_size = viewport_size;
    }

    fn canvas_size(&self) -> Vec2 {
        self.viewport_size.unwrap_or(DEFAULT_VIEWPORT_SIZE)
    }

    fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::Click { node_id } => self.click(node_id),
            GraphCommand::DragStart { node_id, world } => {
                let Some(index) = self.view.index_of(&node_id) else {
                    return;
                };
                let simulation = &mut self.view.simulation;
                simulation.pin(index, world);
                simulation.set_alpha_target(DRAG_ALPHA_TARGET);
                simulation.reheat(simulation.alpha().max(DRAG_ALPHA_TARGET));
                self.drag = Some(DragState { index });
            }
            GraphCommand::DragMove { world } => {
                if let Some(drag) = &self.drag {
                    self.view.simulation.pin(drag.index, world);
                }
            }
            GraphCommand::DragEnd => {
                if let Some(drag) = self.drag.take() {
                    self.view.simulation.release(drag.index);
                    self.view.simulation.set_alpha_target(0.0);
                }
            }
            GraphCommand::Pan(delta) => self.viewport.pan_by(delta),
            GraphCommand::ZoomAt { anchor, factor } => self.viewport.zoom_about(anchor, factor),
            GraphCommand::ZoomIn => self.viewport.zoom_in(),
            GraphCommand::ZoomOut => self.viewport.zoom_out(),
            GraphCommand::ResetView => {
                self.viewport.reset();
                self.view.simulation.reheat(1.0);
            }
            GraphCommand::BackToOverview => {
                if matches!(self.mode, ViewMode::Detail { .. }) {
                    self.enter_overview();
                }
            }
            GraphCommand::Select(selected) => {
                self.selected = selected.filter(|id| self.graph.contains(id));
            }
        }
    }

    fn click(&mut self, node_id: String) {
        if self.drag.is_some() {
            return;
        }

        let Some(node) = self.graph.node(&node_id) else {
            warn!("clicked concept '{node_id}' is not part of the snapshot");
            self.enter_overview();
            return;
        };

        self.events.push(SessionEvent::NodeClicked {
            node_id: node_id.clone(),
            seek_to: node.seek_target(),
        });
        self.selected = Some(node_id.clone());
        self.enter_detail(node_id);
    }

    fn enter_overview(&mut self) {
        if self.mode != ViewMode::Overview {
            debug!("view mode -> overview");
        }
        self.mode = ViewMode::Overview;
        self.drag = None;
        self.viewport.reset();
        self.rebuild_view(self.carry_positions);
    }

    fn enter_detail(&mut self, focus_id: String) {
        if self.mode.focus_id() != Some(focus_id.as_str()) {
            if neighborhood(&self.graph, &focus_id).is_empty() {
                warn!("focus concept '{focus_id}' missing, falling back to overview");
                self.enter_overview();
                return;
            }

            debug!("view mode -> detail({focus_id})");
            self.mode = ViewMode::Detail { focus_id };
            self.drag = None;
            self.rebuild_view(self.carry_positions);
        }

        let Some(focus) = self
            .mode
            .focus_id()
            .and_then(|focus_id| self.view.index_of(focus_id))
        else {
            return;
        };
        let world = self.view.position(focus);
        self.viewport.focus_on(world, self.canvas_size(), self.now);
    }

    fn rebuild_view(&mut self, carry_positions: bool) {
        let prior = carry_positions.then(|| self.view.positions_by_id());
        self.revision += 1;

        let canvas_size = self.canvas_size();
        let (concepts, params, seed) = match &self.mode {
            ViewMode::Overview => {
                self.hub_size = canvas_size;
                (
                    overview(&self.graph, self.first_order_threshold),
                    LayoutParams::overview(),
                    LayoutSeed::Hub {
                        viewport_size: canvas_size,
                    },
                )
            }
            ViewMode::Detail { focus_id } => (
                neighborhood(&self.graph, focus_id),
                LayoutParams::detail(),
                LayoutSeed::Focus { focus_id },
            ),
        };

        self.view = ViewGraph::build(
            &concepts,
            params.with_max_coordinate(self.max_coordinate),
            seed,
            prior.as_ref(),
            self.revision,
        );
        self.activation.refresh(&mut self.view.nodes);
        debug!(
            "layout restarted with {} nodes and {} edges (revision {})",
            self.view.nodes.len(),
            self.view.edges.len(),
            self.revision
        );
    }
}

fn empty_view() -> ViewGraph {
    ViewGraph::build(
        &Default::default(),
        LayoutParams::overview(),
        LayoutSeed::Hub {
            viewport_size: DEFAULT_VIEWPORT_SIZE,
        },
        None,
        0,
    )
}
