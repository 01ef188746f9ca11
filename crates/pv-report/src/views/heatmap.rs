//! Effect-size heatmaps.

use pv_common::names::{canonical_key, format_signature_name};
use pv_common::{BmiGroup, EffectTable, Selection, SignatureEffectRecord, StablSelection};

use super::{html_escape, Panel};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, Series, SeriesKind};
use crate::color::DivergingScale;
use crate::config::ReportLimits;

/// Marker appended to STABL-selected rows.
pub const STABL_MARKER: &str = "★";

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
    }
}

fn tooltip(rec: &SignatureEffectRecord) -> String {
    format!(
        "<b>{}</b> in {}<br>{}: {:.3} [{:.3}, {:.3}]<br>R-hat {:.3}, ESS {:.0}",
        html_escape(&rec.signature_name),
        html_escape(&rec.cell_type),
        rec.bmi_group,
        rec.effect_size,
        rec.credible_interval_low,
        rec.credible_interval_high,
        rec.r_hat,
        rec.ess,
    )
}

/// Keep the top `limit` names, forcing `keep` in when it would be cut.
fn top_rows(ranked: Vec<String>, limit: usize, keep: Option<&str>) -> Vec<String> {
    let keep_key = keep.map(canonical_key);
    let mut rows: Vec<String> = ranked.iter().take(limit).cloned().collect();
    if let Some(key) = keep_key {
        if !rows.iter().any(|r| canonical_key(r) == key) {
            if let Some(found) = ranked.iter().find(|r| canonical_key(r) == key) {
                rows.truncate(limit.saturating_sub(1));
                rows.push(found.clone());
            }
        }
    }
    rows
}

/// Signature × BMI group grid for the selected cell type.
///
/// Rows are ranked by mean |effect| across groups; columns follow
/// Normal, Overweight, Obese.
pub fn cell_type_heatmap(
    effects: &EffectTable,
    stabl: Option<&StablSelection>,
    selection: &Selection,
    limits: &ReportLimits,
) -> Panel {
    let Some(cell) = selection.cell_type.as_deref() else {
        return Panel::unavailable("No cell types in this compartment");
    };

    let mut ranked: Vec<(String, f64)> = effects
        .signatures_for(cell)
        .into_iter()
        .map(|sig| {
            let values: Vec<f64> = BmiGroup::ALL
                .iter()
                .filter_map(|g| effects.get(cell, &sig, *g))
                .map(|r| r.effect_size)
                .collect();
            let score = mean_abs(&values);
            (sig, score)
        })
        .collect();
    if ranked.is_empty() {
        return Panel::unavailable(format!("No effect estimates for {}", cell));
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let total = ranked.len();
    let rows = top_rows(
        ranked.into_iter().map(|(sig, _)| sig).collect(),
        limits.max_heatmap_rows,
        selection.signature.as_deref(),
    );

    let cells: Vec<(usize, &SignatureEffectRecord)> = rows
        .iter()
        .enumerate()
        .flat_map(|(row, sig)| {
            BmiGroup::ALL
                .into_iter()
                .filter_map(move |g| effects.get(cell, sig, g))
                .map(move |rec| (row, rec))
        })
        .collect();
    let scale = DivergingScale::from_values(cells.iter().map(|(_, r)| r.effect_size));
    let selected = selection.signature.as_deref().map(canonical_key);

    let points: Vec<DataPoint> = cells
        .iter()
        .map(|(row, rec)| {
            let mut point = DataPoint::new(rec.bmi_group.index() as f64, *row as f64, tooltip(rec))
                .with_value(rec.effect_size)
                .with_color(scale.color(rec.effect_size).hex())
                .highlighted(selected.as_deref() == Some(canonical_key(&rec.signature_name).as_str()));
            point.intensity = Some(scale.intensity(rec.effect_size));
            point
        })
        .collect();

    let labels: Vec<String> = rows
        .iter()
        .map(|sig| {
            let name = format_signature_name(sig, limits.max_signature_name_len);
            if stabl.is_some_and(|s| s.contains(cell, sig)) {
                format!("{} {}", name, STABL_MARKER)
            } else {
                name
            }
        })
        .collect();

    let chart = ChartSpec::new(
        "heatmap",
        ChartKind::Heatmap,
        format!("BMI effects in {}", cell),
        Axis::category(
            "BMI group",
            BmiGroup::ALL.iter().map(|g| g.label().to_string()).collect(),
        ),
        Axis::category("Signature", labels),
    )
    .with_subtitle("Posterior mean effect size")
    .with_series(Series::new("Effect size", SeriesKind::Heatmap, points))
    .with_color_scale(scale);

    let mut notes = Vec::new();
    if rows.len() < total {
        notes.push(format!(
            "Showing {} of {} signatures ranked by mean |effect|",
            rows.len(),
            total
        ));
    }
    if stabl.is_some_and(|s| !s.is_empty()) {
        notes.push(format!("{} marks STABL-selected features", STABL_MARKER));
    }
    Panel::ready(vec![chart], notes)
}

/// Cell type × signature grid for the test group of the selected comparison.
pub fn overview_heatmap(
    effects: &EffectTable,
    stabl: Option<&StablSelection>,
    selection: &Selection,
    limits: &ReportLimits,
) -> Panel {
    let (group, _) = selection.comparison.groups();
    let cell_types = effects.cell_types();
    if cell_types.is_empty() {
        return Panel::unavailable("No cell types in this compartment");
    }

    let mut ranked: Vec<(String, f64)> = effects
        .signatures()
        .into_iter()
        .map(|sig| {
            let values: Vec<f64> = cell_types
                .iter()
                .filter_map(|cell| effects.get(cell, &sig, group))
                .map(|r| r.effect_size)
                .collect();
            let score = mean_abs(&values);
            (sig, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let total = ranked.len();
    let rows = top_rows(
        ranked.into_iter().map(|(sig, _)| sig).collect(),
        limits.max_heatmap_rows,
        selection.signature.as_deref(),
    );

    let mut cells = Vec::new();
    for (row, sig) in rows.iter().enumerate() {
        for (col, cell) in cell_types.iter().enumerate() {
            if let Some(rec) = effects.get(cell, sig, group) {
                cells.push((col, row, rec));
            }
        }
    }
    if cells.is_empty() {
        return Panel::unavailable(format!("No effect estimates for the {} group", group));
    }
    let scale = DivergingScale::from_values(cells.iter().map(|(_, _, r)| r.effect_size));
    let selected_cell = selection.cell_type.as_deref().map(canonical_key);

    let points: Vec<DataPoint> = cells
        .iter()
        .map(|(col, row, rec)| {
            let marked = stabl.is_some_and(|s| s.contains(&rec.cell_type, &rec.signature_name));
            let mut tip = tooltip(rec);
            if marked {
                tip.push_str(&format!("<br>{} STABL-selected", STABL_MARKER));
            }
            let mut point = DataPoint::new(*col as f64, *row as f64, tip)
                .with_value(rec.effect_size)
                .with_color(scale.color(rec.effect_size).hex())
                .highlighted(
                    selected_cell.as_deref() == Some(canonical_key(&rec.cell_type).as_str()),
                );
            point.intensity = Some(scale.intensity(rec.effect_size));
            point
        })
        .collect();

    let labels = rows
        .iter()
        .map(|sig| format_signature_name(sig, limits.max_signature_name_len))
        .collect();
    let chart = ChartSpec::new(
        "overview",
        ChartKind::Heatmap,
        format!("Effect sizes in the {} group", group),
        Axis::category("Cell type", cell_types),
        Axis::category("Signature", labels),
    )
    .with_subtitle(selection.comparison.label())
    .with_series(Series::new(group.label(), SeriesKind::Heatmap, points))
    .with_color_scale(scale);

    let mut notes = Vec::new();
    if rows.len() < total {
        notes.push(format!(
            "Showing {} of {} signatures ranked by mean |effect|",
            rows.len(),
            total
        ));
    }
    Panel::ready(vec![chart], notes)
}
