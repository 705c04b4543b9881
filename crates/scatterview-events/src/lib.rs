use crossbeam_channel::{Receiver, Sender, unbounded};
use scatterview_core::LegendEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SELECTED_POINT: &str = "selected-point";
pub const SELECTED_POINTS: &str = "selected-points";
pub const CLUSTERS_CHANGED: &str = "clusters-changed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipInfo {
    pub title: String,
    /// Pre-formatted `key: value` lines, elision note last.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Selection
    /// Exactly one row selected, or `None` when the selection is not a single point.
    SelectedPoint {
        row: Option<Value>,
    },
    SelectedPoints {
        rows: Vec<Value>,
    },

    // Legend
    ClustersChanged {
        entries: Vec<LegendEntry>,
    },

    // Tooltip
    TooltipShow {
        info: TooltipInfo,
        x: f32,
        y: f32,
    },
    TooltipHide,

    // Data
    DataLoaded {
        row_count: usize,
        valid_count: usize,
    },
    LoadFailed {
        error: String,
    },
}

impl Event {
    /// Host-facing notification name, for the three public channels.
    pub fn host_name(&self) -> Option<&'static str> {
        match self {
            Event::SelectedPoint { .. } => Some(SELECTED_POINT),
            Event::SelectedPoints { .. } => Some(SELECTED_POINTS),
            Event::ClustersChanged { .. } => Some(CLUSTERS_CHANGED),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Drain everything queued so far without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for processing events in the host's event loop.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Trait for hosts that respond to component notifications.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
