//! Stacked cell-type proportions per sample.

use pv_common::ProportionTable;

use super::{html_escape, Panel};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, Series, SeriesKind};

/// Categorical palette for cell types, cycled when there are more.
const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// One bar per sample, one stacked segment per cell type.
///
/// Cell types are stacked by mean proportion, largest at the bottom.
pub fn proportions_panel(table: &ProportionTable) -> Panel {
    if table.is_empty() {
        return Panel::unavailable("Proportion table is empty");
    }
    let samples = table.samples();
    let cell_types = table.mean_by_cell_type();

    let mut chart = ChartSpec::new(
        "proportions",
        ChartKind::StackedBar,
        "Deconvolved cell-type proportions",
        Axis::category("Sample", samples.iter().map(|s| s.to_string()).collect()),
        Axis::value("Proportion").with_range(0.0, 1.0),
    );

    for (i, (cell, mean)) in cell_types.iter().enumerate() {
        let points = samples
            .iter()
            .enumerate()
            .map(|(x, sample)| {
                let value = table.proportion(sample, cell);
                DataPoint::new(
                    x as f64,
                    value,
                    format!(
                        "<b>{}</b><br>{}: {:.1}%<br>mean {:.1}%",
                        html_escape(sample),
                        html_escape(cell),
                        value * 100.0,
                        mean * 100.0
                    ),
                )
            })
            .collect();
        chart = chart.with_series(
            Series::new(cell.clone(), SeriesKind::Bar, points)
                .with_color(PALETTE[i % PALETTE.len()])
                .stacked("proportion"),
        );
    }

    let notes = vec![format!(
        "{} samples, {} cell types",
        samples.len(),
        cell_types.len()
    )];
    Panel::ready(vec![chart], notes)
}
