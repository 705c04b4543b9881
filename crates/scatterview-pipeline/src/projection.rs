use crate::palette::ClusterPalette;
use scatterview_core::{EffectiveKeys, LegendEntry, Point, SharedRow, cluster_label, coerce_number};

/// Output of one full pass over the row set.
///
/// `points[i]` is always derived from `valid_rows[i]`; selection, hover and
/// cluster lookups rely on that alignment.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub points: Vec<Point>,
    pub valid_rows: Vec<SharedRow>,
    /// Valid-row indices per palette slot.
    pub members: Vec<Vec<usize>>,
    pub legend: Vec<LegendEntry>,
}

impl Projection {
    pub fn valid_count(&self) -> usize {
        self.valid_rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&SharedRow> {
        self.valid_rows.get(index)
    }

    /// Valid-row indices carrying `label`, empty when the label is unknown.
    pub fn indices_for_label(&self, palette: &ClusterPalette, label: &str) -> &[usize] {
        palette
            .index_of(label)
            .and_then(|slot| self.members.get(slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Project rows into renderable points.
///
/// Rows whose x or y does not coerce to a finite number are dropped. Rows
/// with an unusable cluster value take the palette's first label.
pub fn project_rows(
    rows: &[SharedRow],
    keys: &EffectiveKeys,
    palette: &ClusterPalette,
) -> Projection {
    let mut points = Vec::with_capacity(rows.len());
    let mut valid_rows = Vec::with_capacity(rows.len());
    let mut members = vec![Vec::new(); palette.len()];

    for row in rows {
        let x = row.get(&keys.x_key).and_then(coerce_number);
        let y = row.get(&keys.y_key).and_then(coerce_number);
        let (Some(x), Some(y)) = (x, y) else {
            continue;
        };

        let slot = cluster_label(row.get(&keys.cluster_key))
            .and_then(|label| palette.index_of(&label))
            .unwrap_or(0);

        let valid_index = valid_rows.len();
        valid_rows.push(row.clone());
        points.push(Point::new(x, y, slot));
        if let Some(bucket) = members.get_mut(slot) {
            bucket.push(valid_index);
        }
    }

    let legend = palette
        .labels()
        .iter()
        .zip(palette.colors())
        .zip(&members)
        .map(|((name, color), bucket)| LegendEntry {
            name: name.clone(),
            color: color.to_hex(),
            count: bucket.len(),
        })
        .collect();

    Projection {
        points,
        valid_rows,
        members,
        legend,
    }
}
