pub mod inference;
pub mod model;
pub mod palette;
pub mod projection;
pub mod tooltip;

pub use inference::{AxisInference, X_CANDIDATES, Y_CANDIDATES, infer_axes, resolve_key};
pub use model::{FieldRequest, ModelSnapshot, ScatterModel};
pub use palette::{
    CLUSTER_CANDIDATES, ClusterPalette, Color, DEFAULT_CLUSTER_FIELD, PaletteKey,
    choose_best_cluster_key, collect_labels, hsv_to_rgb, palette_colors,
};
pub use projection::{Projection, project_rows};
pub use tooltip::{
    TooltipLimits, Vec2, estimate_tooltip_size, format_tooltip, place_tooltip,
};
