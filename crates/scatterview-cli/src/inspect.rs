use crate::source::FileRowSource;
use anyhow::{Context, Result, bail};
use clap::Args;
use scatterview_app::{ScatterConfig, ScatterController};
use scatterview_core::{EffectiveKeys, LegendEntry};
use scatterview_events::Event;
use scatterview_pipeline::format_tooltip;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct InspectArgs {
    /// JSON array or newline-delimited JSON file of row objects
    pub path: PathBuf,

    /// JSON file with scatter settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub x_field: Option<String>,

    #[arg(long)]
    pub y_field: Option<String>,

    #[arg(long)]
    pub cluster_field: Option<String>,

    /// Print tooltip lines for this valid-row index
    #[arg(long)]
    pub tooltip: Option<usize>,

    /// Print valid-row indices belonging to this cluster
    #[arg(long)]
    pub cluster: Option<String>,

    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub source: String,
    pub keys: EffectiveKeys,
    pub row_count: usize,
    pub valid_count: usize,
    pub legend: Vec<LegendEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<TooltipReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TooltipReport {
    pub index: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub name: String,
    pub indices: Vec<usize>,
}

fn load_config(path: &Path) -> Result<ScatterConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn resolve_config(args: &InspectArgs) -> Result<ScatterConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ScatterConfig::default(),
    };
    if let Some(field) = &args.x_field {
        config.x_field = field.clone();
    }
    if let Some(field) = &args.y_field {
        config.y_field = field.clone();
    }
    if let Some(field) = &args.cluster_field {
        config.cluster_field = field.clone();
    }
    // The row file argument is the source; loading is driven below.
    config.source_url.clear();
    Ok(config)
}

pub async fn run(args: &InspectArgs) -> Result<InspectReport> {
    let config = resolve_config(args)?;
    let source = args.path.to_string_lossy().into_owned();

    let controller = ScatterController::new(config.clone(), Arc::new(FileRowSource))?;
    let load = controller
        .set_source_url(source.clone())
        .context("No row file given")?;
    load.await.context("Row loading task failed")?;

    let mut row_count = 0;
    for event in controller.event_bus().drain() {
        match event {
            Event::LoadFailed { error } => bail!("Failed to load {source}: {error}"),
            Event::DataLoaded { row_count: count, .. } => row_count = count,
            _ => {}
        }
    }

    let valid_rows = controller.valid_rows();
    let tooltip = match args.tooltip {
        Some(index) => {
            let row = valid_rows.get(index).with_context(|| {
                format!("No valid row at index {index} ({} valid rows)", valid_rows.len())
            })?;
            Some(TooltipReport {
                index,
                lines: format_tooltip(row, &config.tooltip),
            })
        }
        None => None,
    };
    let cluster = args.cluster.as_ref().map(|name| ClusterReport {
        name: name.clone(),
        indices: controller.cluster_members(name),
    });

    let report = InspectReport {
        source,
        keys: controller.effective_keys(),
        row_count,
        valid_count: valid_rows.len(),
        legend: controller.legend(),
        tooltip,
        cluster,
    };
    info!(
        keys = %report.keys,
        rows = report.row_count,
        valid = report.valid_count,
        clusters = report.legend.len(),
        "Inspected row file"
    );
    controller.destroy();
    Ok(report)
}
