use crate::inference::{AxisInference, resolve_key};
use crate::palette::ClusterPalette;
use crate::projection::{Projection, project_rows};
use scatterview_core::{EffectiveKeys, SharedRow};
use std::sync::Arc;
use tracing::debug;

/// Field names requested by the host. Blank or absent fields fall back to
/// inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRequest<'a> {
    pub x_field: Option<&'a str>,
    pub y_field: Option<&'a str>,
    pub cluster_field: &'a str,
}

/// Everything one pipeline pass produces.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub keys: EffectiveKeys,
    pub palette: ClusterPalette,
    pub projection: Projection,
}

/// One loaded row set plus its cached axis inference.
///
/// Inference runs once per row set; every other stage re-runs in full on
/// each [`ScatterModel::recompute`].
#[derive(Debug, Clone)]
pub struct ScatterModel {
    rows: Arc<[SharedRow]>,
    axes: AxisInference,
}

impl Default for ScatterModel {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ScatterModel {
    pub fn new(rows: Vec<SharedRow>) -> Self {
        let axes = AxisInference::from_rows(&rows);
        Self {
            rows: rows.into(),
            axes,
        }
    }

    pub fn rows(&self) -> &[SharedRow] {
        &self.rows
    }

    pub fn axes(&self) -> &AxisInference {
        &self.axes
    }

    pub fn effective_keys(
        &self,
        request: &FieldRequest<'_>,
        palette: &ClusterPalette,
    ) -> EffectiveKeys {
        let first = self.rows.first().map(|row| row.as_ref());
        EffectiveKeys {
            x_key: resolve_key(request.x_field, first, self.axes.x_key()),
            y_key: resolve_key(request.y_field, first, self.axes.y_key()),
            cluster_key: palette.cluster_key().to_string(),
        }
    }

    pub fn recompute(&self, request: &FieldRequest<'_>) -> ModelSnapshot {
        let palette = ClusterPalette::build(&self.rows, request.cluster_field);
        let keys = self.effective_keys(request, &palette);
        let projection = project_rows(&self.rows, &keys, &palette);
        debug!(
            keys = %keys,
            rows = self.rows.len(),
            valid = projection.valid_count(),
            clusters = palette.len(),
            "Pipeline pass complete"
        );
        ModelSnapshot {
            keys,
            palette,
            projection,
        }
    }
}
