use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use scatterview_core::{
    CancellationToken, EffectiveKeys, LegendEntry, Row, SharedRow, SourceError, cluster_label,
};
use scatterview_events::{Event, EventBus, TooltipInfo};
use scatterview_pipeline::{
    FieldRequest, ModelSnapshot, ScatterModel, Vec2, estimate_tooltip_size, format_tooltip,
    place_tooltip,
};
use serde::Serialize;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, warn};

pub mod hover;
pub mod renderer;
pub mod scheduler;
pub mod selection;
pub mod settings;
pub mod source;

pub use hover::{HoverCommand, HoverMachine, HoverPhase};
pub use renderer::{
    ColorBy, DrawFuture, Renderer, RendererEvent, RendererEventKind, RendererHandler,
    RendererOptions, SubscriptionId,
};
pub use scheduler::{DrawPhase, DrawScheduler, PointList};
pub use selection::ClusterSelection;
pub use settings::{HoverTiming, ScatterConfig};
pub use source::{MemoryRowSource, RowSource, RowsFuture};

use selection::{LegendKey, LegendTracker, PaletteTracker};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Scatter controller requires a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Drawing surface size as last reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
        }
    }
}

/// Internal state dump for diagnostics. Only produced with `debug` enabled.
#[derive(Debug, Clone, Serialize)]
pub struct DebugSnapshot {
    pub source_url: String,
    pub keys: EffectiveKeys,
    pub row_count: usize,
    pub valid_count: usize,
    pub palette: Vec<String>,
    pub legend: Vec<LegendEntry>,
    pub draw_phase: DrawPhase,
    pub renders_started: u64,
    pub hover: HoverPhase,
    pub load_generation: u64,
    pub loading: bool,
    pub surface: SurfaceSize,
    pub renderer_attached: bool,
}

struct PendingLoad {
    generation: u64,
    url: String,
    cancel: CancellationToken,
}

struct ControllerState {
    config: ScatterConfig,
    surface: SurfaceSize,
    renderer: Option<Arc<dyn Renderer>>,
    subscriptions: Vec<SubscriptionId>,
    model: ScatterModel,
    snapshot: ModelSnapshot,
    points: PointList,
    scheduler: DrawScheduler,
    /// Bumped whenever the renderer is unbound; completions from an older
    /// renderer must not settle the current scheduler.
    draw_epoch: u64,
    hover: HoverMachine,
    hover_timer: Option<AbortHandle>,
    pointer: Vec2,
    palette: PaletteTracker,
    legend: LegendTracker,
    load: Option<PendingLoad>,
    load_generation: u64,
    selected_cluster: String,
    destroyed: bool,
}

impl ControllerState {
    fn field_request(&self) -> FieldRequest<'_> {
        FieldRequest {
            x_field: Some(self.config.x_field.as_str()),
            y_field: Some(self.config.y_field.as_str()),
            cluster_field: &self.config.cluster_field,
        }
    }

    fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            width: self.surface.width,
            height: self.surface.height,
            pixel_ratio: self.surface.pixel_ratio,
            point_size: self.config.point_size,
            color_by: ColorBy::Category,
            point_color: self.snapshot.palette.hex_colors(),
        }
    }

    /// Queue `points` for drawing. `true` when the caller must spawn a pass.
    fn queue_draw(&mut self, points: PointList) -> bool {
        self.renderer.is_some() && self.scheduler.request(points)
    }

    fn cancel_hover_timer(&mut self) {
        if let Some(timer) = self.hover_timer.take() {
            timer.abort();
        }
    }
}

struct Shared {
    state: Mutex<ControllerState>,
    events: EventBus,
    source: Arc<dyn RowSource>,
    runtime: Handle,
}

/// Orchestrates loading, the render pipeline, draw scheduling, hover and
/// selection for one scatter view.
///
/// Cheap to clone; all clones drive the same view. Renderer methods are never
/// called while the internal lock is held, so renderers may call back into
/// the controller synchronously.
#[derive(Clone)]
pub struct ScatterController {
    shared: Arc<Shared>,
}

impl ScatterController {
    /// Create a controller on the current tokio runtime and start loading
    /// `config.source_url` if it is set.
    pub fn new(
        config: ScatterConfig,
        source: Arc<dyn RowSource>,
    ) -> Result<Self, ControllerError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(config, source, runtime))
    }

    pub fn with_runtime(
        mut config: ScatterConfig,
        source: Arc<dyn RowSource>,
        runtime: Handle,
    ) -> Self {
        let model = ScatterModel::default();
        let snapshot = model.recompute(&FieldRequest {
            cluster_field: &config.cluster_field,
            ..FieldRequest::default()
        });
        let hover = HoverMachine::new(config.hover);
        let source_url = std::mem::take(&mut config.source_url);
        let state = ControllerState {
            config,
            surface: SurfaceSize::default(),
            renderer: None,
            subscriptions: Vec::new(),
            model,
            snapshot,
            points: Arc::from(Vec::new()),
            scheduler: DrawScheduler::new(),
            draw_epoch: 0,
            hover,
            hover_timer: None,
            pointer: Vec2::default(),
            palette: PaletteTracker::default(),
            legend: LegendTracker::default(),
            load: None,
            load_generation: 0,
            selected_cluster: String::new(),
            destroyed: false,
        };
        let controller = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                events: EventBus::new(),
                source,
                runtime,
            }),
        };
        // Detached; hosts that need to await the first load call `reload`.
        drop(controller.set_source_url(source_url));
        controller
    }

    fn from_weak(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    /// Host notifications. Intended for a single consumer.
    pub fn events(&self) -> Receiver<Event> {
        self.shared.events.receiver()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn config(&self) -> ScatterConfig {
        self.shared.state.lock().config.clone()
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Point the view at a new data source.
    ///
    /// Any in-flight load is cancelled and its result discarded. A blank url
    /// clears the view. Returns the load task, or `None` when nothing was
    /// started.
    pub fn set_source_url(&self, url: impl Into<String>) -> Option<JoinHandle<()>> {
        let url = url.into();
        {
            let state = self.shared.state.lock();
            if state.destroyed || state.config.source_url == url {
                return None;
            }
        }
        self.start_load(url)
    }

    /// Fetch the current source again.
    pub fn reload(&self) -> Option<JoinHandle<()>> {
        let url = {
            let state = self.shared.state.lock();
            if state.destroyed {
                return None;
            }
            state.config.source_url.clone()
        };
        self.start_load(url)
    }

    fn start_load(&self, url: String) -> Option<JoinHandle<()>> {
        let started = {
            let mut state = self.shared.state.lock();
            if let Some(previous) = state.load.take() {
                debug!(url = %previous.url, generation = previous.generation, "Cancelling load");
                previous.cancel.cancel();
            }
            state.config.source_url = url.clone();
            state.load_generation += 1;
            if url.trim().is_empty() {
                None
            } else {
                let cancel = CancellationToken::new();
                state.load = Some(PendingLoad {
                    generation: state.load_generation,
                    url: url.clone(),
                    cancel: cancel.clone(),
                });
                Some((state.load_generation, cancel))
            }
        };

        let Some((generation, cancel)) = started else {
            self.apply_rows(Vec::new());
            return None;
        };

        let fetch = self.shared.source.fetch_rows(&url, cancel);
        let weak = self.downgrade();
        Some(self.shared.runtime.spawn(async move {
            let result = fetch.await;
            if let Some(controller) = Self::from_weak(&weak) {
                controller.finish_load(generation, result);
            }
        }))
    }

    fn finish_load(&self, generation: u64, result: Result<Vec<Row>, SourceError>) {
        let rows = {
            let mut state = self.shared.state.lock();
            let current = state
                .load
                .as_ref()
                .is_some_and(|load| load.generation == generation);
            if !current || state.destroyed {
                debug!(generation, "Discarding stale load result");
                return;
            }
            let Some(load) = state.load.take() else {
                return;
            };
            match result {
                Ok(rows) => rows,
                Err(err) if err.is_cancelled() => {
                    debug!(url = %load.url, "Load cancelled");
                    return;
                }
                Err(err) => {
                    warn!(url = %load.url, error = %err, "Failed to load rows; showing empty view");
                    self.shared.events.publish(Event::LoadFailed {
                        error: err.to_string(),
                    });
                    Vec::new()
                }
            }
        };
        self.apply_rows(rows);
    }

    fn apply_rows(&self, rows: Vec<Row>) {
        let row_count = rows.len();
        let model = ScatterModel::new(rows.into_iter().map(Arc::new).collect());
        {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return;
            }
            state.model = model;
        }
        self.recompute();
        let valid_count = self.shared.state.lock().snapshot.projection.valid_count();
        self.shared.events.publish(Event::DataLoaded {
            row_count,
            valid_count,
        });
    }

    // ---------------------------------------------------------------------
    // Field configuration
    // ---------------------------------------------------------------------

    pub fn set_x_field(&self, field: impl Into<String>) {
        let field = field.into();
        self.update_fields(|config| replace(&mut config.x_field, field));
    }

    pub fn set_y_field(&self, field: impl Into<String>) {
        let field = field.into();
        self.update_fields(|config| replace(&mut config.y_field, field));
    }

    pub fn set_cluster_field(&self, field: impl Into<String>) {
        let field = field.into();
        self.update_fields(|config| replace(&mut config.cluster_field, field));
    }

    fn update_fields(&self, apply: impl FnOnce(&mut ScatterConfig) -> bool) {
        let changed = {
            let mut state = self.shared.state.lock();
            !state.destroyed && apply(&mut state.config)
        };
        if changed {
            self.recompute();
        }
    }

    pub fn set_point_size(&self, size: f32) {
        if !size.is_finite() || size <= 0.0 {
            debug!(size, "Ignoring invalid point size");
            return;
        }
        let pending = {
            let mut state = self.shared.state.lock();
            if state.destroyed || state.config.point_size == size {
                return;
            }
            state.config.point_size = size;
            state.renderer.clone().map(|r| (r, state.renderer_options()))
        };
        if let Some((renderer, options)) = pending {
            renderer.configure(&options);
        }
    }

    pub fn set_hover_timing(&self, timing: HoverTiming) {
        let mut state = self.shared.state.lock();
        state.config.hover = timing;
        state.hover.set_timing(timing);
    }

    pub fn set_debug(&self, enabled: bool) {
        self.shared.state.lock().config.debug = enabled;
    }

    /// Record a new surface size; the renderer is reconfigured and redrawn
    /// only when it actually changed. Zero-sized surfaces are ignored.
    pub fn resize(&self, width: u32, height: u32, pixel_ratio: f32) {
        if width == 0 || height == 0 {
            debug!(width, height, "Ignoring zero-sized surface");
            return;
        }
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        let surface = SurfaceSize {
            width,
            height,
            pixel_ratio,
        };
        let (pending, needs_pass) = {
            let mut state = self.shared.state.lock();
            if state.destroyed || state.surface == surface {
                return;
            }
            state.surface = surface;
            let pending = state.renderer.clone().map(|r| (r, state.renderer_options()));
            let points = state.points.clone();
            (pending, state.queue_draw(points))
        };
        if let Some((renderer, options)) = pending {
            renderer.configure(&options);
        }
        if needs_pass {
            self.spawn_draw_pass();
        }
    }

    // ---------------------------------------------------------------------
    // Pipeline
    // ---------------------------------------------------------------------

    /// Run the full pipeline over the current rows and push the results.
    pub fn recompute(&self) {
        let mut hide_tooltip = false;
        let (legend, palette_push, needs_pass) = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            if state.destroyed {
                return;
            }

            let snapshot = state.model.recompute(&state.field_request());
            let points: PointList = snapshot.projection.points.iter().copied().collect();

            if state.hover.hovered_index().is_some() {
                state.cancel_hover_timer();
                hide_tooltip = matches!(state.hover.phase(), HoverPhase::Shown { .. });
                state.hover.pointer_out();
            }

            let palette_changed = state.palette.changed(snapshot.palette.key());
            let legend_key = LegendKey::new(snapshot.palette.key(), &snapshot.projection.legend);
            let legend = state.legend.update(legend_key, &snapshot.projection.legend);

            state.snapshot = snapshot;
            state.points = points.clone();

            let palette_push = if palette_changed {
                state.renderer.clone().map(|r| (r, state.renderer_options()))
            } else {
                None
            };
            (legend, palette_push, state.queue_draw(points))
        };

        if hide_tooltip {
            self.shared.events.publish(Event::TooltipHide);
        }
        if let Some(entries) = legend {
            debug!(clusters = entries.len(), "Legend changed");
            self.shared.events.publish(Event::ClustersChanged { entries });
        }
        if let Some((renderer, options)) = palette_push {
            debug!(colors = options.point_color.len(), "Pushing palette to renderer");
            renderer.configure(&options);
        }
        if needs_pass {
            self.spawn_draw_pass();
        }
    }

    // ---------------------------------------------------------------------
    // Drawing
    // ---------------------------------------------------------------------

    /// Queue `points` for drawing. Bursts collapse into one render with the
    /// latest list; at most one render is in flight.
    pub fn request_draw(&self, points: PointList) {
        let needs_pass = {
            let mut state = self.shared.state.lock();
            !state.destroyed && state.queue_draw(points)
        };
        if needs_pass {
            self.spawn_draw_pass();
        }
    }

    /// Queue the current point list again.
    pub fn redraw(&self) {
        let points = self.shared.state.lock().points.clone();
        self.request_draw(points);
    }

    fn spawn_draw_pass(&self) {
        self.shared.runtime.spawn(run_draw_passes(self.downgrade()));
    }

    // ---------------------------------------------------------------------
    // Renderer wiring
    // ---------------------------------------------------------------------

    /// Bind a renderer, replacing any previous one. The renderer is
    /// configured with the current surface and palette and handed the
    /// current points.
    pub fn attach_renderer(&self, renderer: Arc<dyn Renderer>) {
        if self.shared.state.lock().destroyed {
            return;
        }
        self.detach_renderer();

        let subscriptions: Vec<SubscriptionId> = RendererEventKind::ALL
            .iter()
            .map(|&kind| {
                let weak = self.downgrade();
                let handler: RendererHandler = Arc::new(move |event: &RendererEvent| {
                    if let Some(controller) = Self::from_weak(&weak) {
                        controller.handle_renderer_event(event);
                    }
                });
                renderer.subscribe(kind, handler)
            })
            .collect();

        let (options, needs_pass) = {
            let mut state = self.shared.state.lock();
            state.renderer = Some(renderer.clone());
            state.subscriptions = subscriptions;
            state.palette.reset();
            let key = state.snapshot.palette.key();
            state.palette.changed(key);
            let points = state.points.clone();
            (state.renderer_options(), state.queue_draw(points))
        };
        renderer.configure(&options);
        if needs_pass {
            self.spawn_draw_pass();
        }
    }

    /// Unbind the current renderer without destroying it.
    pub fn detach_renderer(&self) -> Option<Arc<dyn Renderer>> {
        let (renderer, subscriptions, hide_tooltip) = {
            let mut state = self.shared.state.lock();
            let renderer = state.renderer.take()?;
            state.scheduler.clear();
            state.draw_epoch += 1;
            state.cancel_hover_timer();
            let hide_tooltip = matches!(state.hover.phase(), HoverPhase::Shown { .. });
            state.hover.pointer_out();
            (renderer, std::mem::take(&mut state.subscriptions), hide_tooltip)
        };
        for id in subscriptions {
            renderer.unsubscribe(id);
        }
        if hide_tooltip {
            self.shared.events.publish(Event::TooltipHide);
        }
        Some(renderer)
    }

    /// Entry point for renderer callbacks.
    pub fn handle_renderer_event(&self, event: &RendererEvent) {
        match event {
            RendererEvent::Select { indices } => {
                let events = {
                    let state = self.shared.state.lock();
                    selection::selection_events(indices, &state.snapshot.projection.valid_rows)
                };
                for event in events {
                    self.shared.events.publish(event);
                }
            }
            RendererEvent::Deselect => {
                for event in selection::deselection_events() {
                    self.shared.events.publish(event);
                }
            }
            RendererEvent::PointOver { index } | RendererEvent::Hover { index: Some(index) } => {
                self.pointer_over(*index);
            }
            RendererEvent::PointOut | RendererEvent::Hover { index: None } => {
                self.pointer_out();
            }
            RendererEvent::MouseMove { x, y } => {
                self.shared.state.lock().pointer = Vec2::new(*x, *y);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Hover
    // ---------------------------------------------------------------------

    fn pointer_over(&self, index: usize) {
        let hide = {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return;
            }
            let valid_count = state.snapshot.projection.valid_count();
            let was_shown = matches!(state.hover.phase(), HoverPhase::Shown { .. });
            let command = state.hover.pointer_over(index, valid_count, Instant::now());
            self.apply_hover(&mut state, command, was_shown)
        };
        if hide {
            self.shared.events.publish(Event::TooltipHide);
        }
    }

    fn pointer_out(&self) {
        let hide = {
            let mut state = self.shared.state.lock();
            if state.hover.phase() == HoverPhase::Idle {
                return;
            }
            let was_shown = matches!(state.hover.phase(), HoverPhase::Shown { .. });
            let command = state.hover.pointer_out();
            self.apply_hover(&mut state, command, was_shown)
        };
        if hide {
            self.shared.events.publish(Event::TooltipHide);
        }
    }

    /// Swap timers for `command` under the same lock that produced it, so the
    /// installed timer always belongs to the machine's current generation.
    /// Returns `true` when a visible tooltip must be hidden.
    fn apply_hover(
        &self,
        state: &mut ControllerState,
        command: HoverCommand,
        was_shown: bool,
    ) -> bool {
        match command {
            HoverCommand::Keep => false,
            HoverCommand::Hide => {
                state.cancel_hover_timer();
                was_shown
            }
            HoverCommand::Schedule { generation, delay } => {
                state.cancel_hover_timer();
                let weak = self.downgrade();
                let timer = self.shared.runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(controller) = Self::from_weak(&weak) {
                        controller.show_tooltip(generation);
                    }
                });
                state.hover_timer = Some(timer.abort_handle());
                false
            }
        }
    }

    fn show_tooltip(&self, generation: u64) {
        let event = {
            let mut state = self.shared.state.lock();
            let Some(index) = state.hover.fire(generation, Instant::now()) else {
                return;
            };
            state.hover_timer = None;
            let Some(row) = state.snapshot.projection.row(index).cloned() else {
                return;
            };
            let lines = format_tooltip(&row, &state.config.tooltip);
            let title = tooltip_title(&row, index, &state.snapshot.keys.cluster_key);
            let size = estimate_tooltip_size(&title, &lines);
            let bounds = Vec2::new(state.surface.width as f32, state.surface.height as f32);
            let position = place_tooltip(state.pointer, size, bounds, state.config.tooltip.offset_px);
            Event::TooltipShow {
                info: TooltipInfo { title, lines },
                x: position.x,
                y: position.y,
            }
        };
        self.shared.events.publish(event);
    }

    // ---------------------------------------------------------------------
    // Cluster selection
    // ---------------------------------------------------------------------

    pub fn set_selected_cluster_name(&self, name: impl Into<String>) {
        self.shared.state.lock().selected_cluster = name.into();
    }

    pub fn selected_cluster_name(&self) -> String {
        self.shared.state.lock().selected_cluster.clone()
    }

    /// Select every valid point of the stored cluster name.
    pub fn select_cluster(&self) -> ClusterSelection {
        let name = self.selected_cluster_name();
        self.select_cluster_by_name(&name)
    }

    /// Select every valid point labeled `name`; unknown or empty clusters
    /// clear the selection.
    pub fn select_cluster_by_name(&self, name: &str) -> ClusterSelection {
        let (renderer, selection) = {
            let state = self.shared.state.lock();
            let Some(renderer) = state.renderer.clone() else {
                return ClusterSelection::Ignore;
            };
            let selection = selection::cluster_selection(
                name,
                &state.snapshot.palette,
                &state.snapshot.projection,
            );
            (renderer, selection)
        };
        match &selection {
            ClusterSelection::Ignore => {}
            ClusterSelection::Deselect => renderer.deselect(),
            ClusterSelection::Select(indices) => renderer.select(indices),
        }
        selection
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn effective_keys(&self) -> EffectiveKeys {
        self.shared.state.lock().snapshot.keys.clone()
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.shared.state.lock().snapshot.projection.legend.clone()
    }

    pub fn valid_rows(&self) -> Vec<SharedRow> {
        self.shared.state.lock().snapshot.projection.valid_rows.clone()
    }

    /// Valid-row indices labeled `name`; empty for unknown clusters.
    pub fn cluster_members(&self, name: &str) -> Vec<usize> {
        let state = self.shared.state.lock();
        state
            .snapshot
            .projection
            .indices_for_label(&state.snapshot.palette, name.trim())
            .to_vec()
    }

    pub fn points(&self) -> PointList {
        self.shared.state.lock().points.clone()
    }

    pub fn draw_phase(&self) -> DrawPhase {
        self.shared.state.lock().scheduler.phase()
    }

    pub fn hover_phase(&self) -> HoverPhase {
        self.shared.state.lock().hover.phase()
    }

    pub fn debug_snapshot(&self) -> Option<DebugSnapshot> {
        let state = self.shared.state.lock();
        if !state.config.debug {
            return None;
        }
        Some(DebugSnapshot {
            source_url: state.config.source_url.clone(),
            keys: state.snapshot.keys.clone(),
            row_count: state.model.rows().len(),
            valid_count: state.snapshot.projection.valid_count(),
            palette: state.snapshot.palette.hex_colors(),
            legend: state.snapshot.projection.legend.clone(),
            draw_phase: state.scheduler.phase(),
            renders_started: state.scheduler.renders_started(),
            hover: state.hover.phase(),
            load_generation: state.load_generation,
            loading: state.load.is_some(),
            surface: state.surface,
            renderer_attached: state.renderer.is_some(),
        })
    }

    /// Tear down: cancel the load and hover timer, drop pending draws and
    /// destroy the renderer. Further calls are no-ops.
    pub fn destroy(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return;
            }
            if let Some(load) = state.load.take() {
                load.cancel.cancel();
            }
        }
        let renderer = self.detach_renderer();
        self.shared.state.lock().destroyed = true;
        if let Some(renderer) = renderer {
            renderer.destroy();
        }
        debug!("Scatter controller destroyed");
    }
}

fn replace(slot: &mut String, value: String) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn tooltip_title(row: &Row, index: usize, cluster_key: &str) -> String {
    match cluster_label(row.get(cluster_key)) {
        Some(label) => format!("Point {index} ({cluster_key}: {label})"),
        None => format!("Point {index}"),
    }
}

/// Run queued draw passes until the scheduler has nothing left.
///
/// Each pass starts after a yield so requests made in the same turn collapse
/// into it.
async fn run_draw_passes(shared: Weak<Shared>) {
    loop {
        tokio::task::yield_now().await;
        let Some(controller) = ScatterController::from_weak(&shared) else {
            return;
        };
        let (renderer, points, epoch) = {
            let mut state = controller.shared.state.lock();
            let Some(points) = state.scheduler.begin() else {
                return;
            };
            let Some(renderer) = state.renderer.clone() else {
                state.scheduler.clear();
                return;
            };
            (renderer, points, state.draw_epoch)
        };

        debug!(points = points.len(), "Drawing");
        if let Err(err) = renderer.draw(points).await {
            warn!(error = %err, "Draw failed");
        }

        let again = {
            let mut state = controller.shared.state.lock();
            if state.draw_epoch != epoch {
                debug!(epoch, "Ignoring draw completion from a detached renderer");
                return;
            }
            state.scheduler.finish()
        };
        if !again {
            return;
        }
    }
}
