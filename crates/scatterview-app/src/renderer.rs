//! Capability interface of the external point renderer.

use crate::scheduler::PointList;
use scatterview_core::RendererError;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type DrawFuture = Pin<Box<dyn Future<Output = Result<(), RendererError>> + Send + 'static>>;

/// Callback registered for one renderer event kind.
pub type RendererHandler = Arc<dyn Fn(&RendererEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RendererEventKind {
    Select,
    Deselect,
    PointOver,
    PointOut,
    Hover,
    MouseMove,
}

impl RendererEventKind {
    pub const ALL: [RendererEventKind; 6] = [
        RendererEventKind::Select,
        RendererEventKind::Deselect,
        RendererEventKind::PointOver,
        RendererEventKind::PointOut,
        RendererEventKind::Hover,
        RendererEventKind::MouseMove,
    ];
}

impl fmt::Display for RendererEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Deselect => "deselect",
            Self::PointOver => "pointover",
            Self::PointOut => "pointout",
            Self::Hover => "hover",
            Self::MouseMove => "mousemove",
        };
        f.write_str(name)
    }
}

/// Events reported back by the renderer. Indices refer to the point list of
/// the last draw.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    Select { indices: Vec<usize> },
    Deselect,
    PointOver { index: usize },
    PointOut,
    /// Combined hover report; `None` means the pointer is over no point.
    Hover { index: Option<usize> },
    /// Pointer position in surface pixels.
    MouseMove { x: f32, y: f32 },
}

impl RendererEvent {
    pub fn kind(&self) -> RendererEventKind {
        match self {
            Self::Select { .. } => RendererEventKind::Select,
            Self::Deselect => RendererEventKind::Deselect,
            Self::PointOver { .. } => RendererEventKind::PointOver,
            Self::PointOut => RendererEventKind::PointOut,
            Self::Hover { .. } => RendererEventKind::Hover,
            Self::MouseMove { .. } => RendererEventKind::MouseMove,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorBy {
    /// Color points by their palette index.
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RendererOptions {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub point_size: f32,
    pub color_by: ColorBy,
    /// `#rrggbb` per palette slot.
    pub point_color: Vec<String>,
}

/// GPU-backed drawing and picking engine.
///
/// Implementations may invoke subscribed handlers synchronously from any
/// method, including `select` and `deselect`.
pub trait Renderer: Send + Sync {
    fn configure(&self, options: &RendererOptions);

    /// Never called again before the returned future settles.
    fn draw(&self, points: PointList) -> DrawFuture;

    fn select(&self, indices: &[usize]);

    fn deselect(&self);

    fn subscribe(&self, kind: RendererEventKind, handler: RendererHandler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);

    fn destroy(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds_match_wire_names() {
        let names: Vec<String> = RendererEventKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            vec!["select", "deselect", "pointover", "pointout", "hover", "mousemove"]
        );
        assert_eq!(
            RendererEvent::MouseMove { x: 1.0, y: 2.0 }.kind(),
            RendererEventKind::MouseMove
        );
    }
}
