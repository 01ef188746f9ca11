//! Forest plot of effect sizes with 95% credible intervals.

use pv_common::names::{canonical_key, format_signature_name};
use pv_common::{EffectTable, Selection, SignatureEffectRecord};

use super::{html_escape, Panel};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, ReferenceLine, Series, SeriesKind};
use crate::config::ReportLimits;

fn tooltip(rec: &SignatureEffectRecord) -> String {
    let mut tip = format!(
        "<b>{}</b><br>{}: {:.3} (95% CrI {:.3} to {:.3})",
        html_escape(&rec.signature_name),
        rec.bmi_group,
        rec.effect_size,
        rec.credible_interval_low,
        rec.credible_interval_high,
    );
    if rec.excludes_zero() {
        tip.push_str("<br>Interval excludes zero");
    }
    tip
}

/// Effect sizes of the two groups in the selected comparison.
///
/// Rows are the selected cell type's signatures ranked by the largest
/// |effect| in either group.
pub fn forest_plot(effects: &EffectTable, selection: &Selection, limits: &ReportLimits) -> Panel {
    let Some(cell) = selection.cell_type.as_deref() else {
        return Panel::unavailable("No cell types in this compartment");
    };
    let (test, reference) = selection.comparison.groups();

    let mut ranked: Vec<(String, f64)> = effects
        .signatures_for(cell)
        .into_iter()
        .filter_map(|sig| {
            let max = [test, reference]
                .into_iter()
                .filter_map(|g| effects.get(cell, &sig, g))
                .map(|r| r.effect_size.abs())
                .reduce(f64::max)?;
            Some((sig, max))
        })
        .collect();
    if ranked.is_empty() {
        return Panel::unavailable(format!(
            "No {} or {} estimates for {}",
            test, reference, cell
        ));
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let total = ranked.len();

    let selected = selection.signature.as_deref().map(canonical_key);
    let mut rows: Vec<String> = ranked
        .iter()
        .take(limits.max_forest_rows)
        .map(|(sig, _)| sig.clone())
        .collect();
    if let Some(key) = &selected {
        let shown = rows.iter().any(|r| canonical_key(r) == *key);
        if !shown {
            if let Some((sig, _)) = ranked.iter().find(|(s, _)| canonical_key(s) == *key) {
                rows.truncate(limits.max_forest_rows.saturating_sub(1));
                rows.push(sig.clone());
            }
        }
    }

    let mut chart = ChartSpec::new(
        "forest",
        ChartKind::Forest,
        format!("{} in {}", selection.comparison.label(), cell),
        Axis::value("Effect size (95% credible interval)"),
        Axis::category(
            "Signature",
            rows.iter()
                .map(|s| format_signature_name(s, limits.max_signature_name_len))
                .collect(),
        ),
    )
    .with_reference_line(ReferenceLine::x(0.0, "No effect").with_color("#6b7280"));

    for group in [test, reference] {
        let points: Vec<DataPoint> = rows
            .iter()
            .enumerate()
            .filter_map(|(row, sig)| {
                let rec = effects.get(cell, sig, group)?;
                Some(
                    DataPoint::new(rec.effect_size, row as f64, tooltip(rec))
                        .with_interval(rec.credible_interval_low, rec.credible_interval_high)
                        .highlighted(selected.as_deref() == Some(canonical_key(sig).as_str())),
                )
            })
            .collect();
        chart = chart.with_series(
            Series::new(group.label(), SeriesKind::ScatterWithError, points)
                .with_color(group.color()),
        );
    }

    let mut notes = vec!["Points are posterior means; bars are 95% credible intervals".to_string()];
    if rows.len() < total {
        notes.push(format!(
            "Showing {} of {} signatures ranked by max |effect|",
            rows.len(),
            total
        ));
    }
    Panel::ready(vec![chart], notes)
}
