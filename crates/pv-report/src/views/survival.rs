//! Hazard ratios from the survival models.

use pv_common::names::format_signature_name;
use pv_common::{Selection, SurvivalRecord, SurvivalTable};

use super::{html_escape, Panel};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, ReferenceLine, Series, SeriesKind};
use crate::config::ReportConfig;

const UNSTRATIFIED_COLOR: &str = "#3b82f6";

fn row_label(rec: &SurvivalRecord, max_len: usize) -> String {
    let name = match rec.signature() {
        Some(sig) => format_signature_name(sig, max_len),
        None => rec.cell_type().to_string(),
    };
    match rec.stratum {
        Some(group) => format!("{} ({})", name, group),
        None => name,
    }
}

fn tooltip(rec: &SurvivalRecord) -> String {
    let mut tip = format!(
        "<b>{}</b><br>HR {:.2} (95% CI {:.2} to {:.2})<br>p = {:.3}",
        html_escape(&rec.feature),
        rec.hazard_ratio,
        rec.ci_low,
        rec.ci_high,
        rec.p_value,
    );
    if let (Some(n), Some(events)) = (rec.n, rec.events) {
        tip.push_str(&format!("<br>n = {}, events = {}", n, events));
    }
    tip
}

/// Hazard ratio with confidence interval on a log axis.
///
/// Shows the selected cell type's features, or every feature when none
/// belong to it. Significant rows get a `*`.
pub fn survival_panel(table: &SurvivalTable, selection: &Selection, config: &ReportConfig) -> Panel {
    if table.is_empty() {
        return Panel::unavailable("Survival table is empty");
    }
    let max_len = config.limits.max_signature_name_len;

    let mut notes = Vec::new();
    let matching = selection
        .cell_type
        .as_deref()
        .map(|cell| table.for_cell_type(cell))
        .unwrap_or_default();
    let (records, scope): (Vec<&SurvivalRecord>, String) = if matching.is_empty() {
        if let Some(cell) = &selection.cell_type {
            notes.push(format!(
                "No survival features for {}; showing all features",
                cell
            ));
        }
        (table.records().iter().collect(), "all features".to_string())
    } else {
        let scope = selection.cell_type.clone().unwrap_or_default();
        (matching, scope)
    };

    let labels: Vec<String> = records
        .iter()
        .map(|rec| {
            let label = row_label(rec, max_len);
            if rec.is_significant(config.significance) {
                format!("{} *", label)
            } else {
                label
            }
        })
        .collect();

    let points: Vec<DataPoint> = records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            let color = rec
                .stratum
                .map(|g| g.color())
                .unwrap_or(UNSTRATIFIED_COLOR);
            let on_selected = match (rec.signature(), selection.signature.as_deref()) {
                (Some(sig), Some(wanted)) => pv_common::names::same_name(sig, wanted),
                _ => false,
            };
            DataPoint::new(rec.hazard_ratio, row as f64, tooltip(rec))
                .with_interval(rec.ci_low, rec.ci_high)
                .with_color(color)
                .highlighted(on_selected)
        })
        .collect();

    let chart = ChartSpec::new(
        "survival",
        ChartKind::Forest,
        format!("Survival associations: {}", scope),
        Axis::log("Hazard ratio (95% CI)"),
        Axis::category("Feature", labels),
    )
    .with_series(Series::new("Hazard ratio", SeriesKind::ScatterWithError, points))
    .with_reference_line(ReferenceLine::x(1.0, "HR = 1").with_color("#6b7280"));

    notes.push(format!("* p < {}", config.significance));
    Panel::ready(vec![chart], notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_common::BmiGroup;

    fn rec(feature: &str, hr: f64, p: f64, stratum: Option<BmiGroup>) -> SurvivalRecord {
        SurvivalRecord {
            feature: feature.into(),
            hazard_ratio: hr,
            p_value: p,
            ci_low: hr * 0.8,
            ci_high: hr * 1.25,
            stratum,
            n: Some(140),
            events: Some(90),
        }
    }

    fn table() -> SurvivalTable {
        SurvivalTable::new(
            "survival.csv",
            vec![
                rec("Macrophage||Glycolysis_Signature", 1.6, 0.01, Some(BmiGroup::Obese)),
                rec("Macrophage||OXPHOS", 0.9, 0.4, None),
                rec("Fibroblast", 1.2, 0.2, None),
            ],
        )
        .unwrap()
    }

    fn selection(cell: &str) -> Selection {
        Selection {
            compartment: "immune_fine".into(),
            cell_type: Some(cell.into()),
            signature: Some("Glycolysis_Signature".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_to_selected_cell_type() {
        let panel = survival_panel(&table(), &selection("macrophage"), &ReportConfig::default());
        let chart = &panel.charts()[0];
        assert_eq!(
            chart.y_axis.categories,
            vec!["Glycolysis (Obese) *", "OXPHOS"]
        );
        assert_eq!(chart.x_axis.scale, crate::chart::ScaleKind::Log);
        assert_eq!(chart.reference_lines[0].value, 1.0);
        let points = &chart.series[0].points;
        assert!(points[0].highlight);
        assert_eq!(points[0].color.as_deref(), Some(BmiGroup::Obese.color()));
        assert!(points[0].tooltip.contains("n = 140"));
    }

    #[test]
    fn test_falls_back_to_all_features() {
        let panel = survival_panel(&table(), &selection("B cell"), &ReportConfig::default());
        let Panel::Ready { charts, notes, .. } = &panel else {
            panic!("expected ready panel");
        };
        assert_eq!(charts[0].point_count(), 3);
        assert!(notes[0].contains("showing all features"));
    }

    #[test]
    fn test_empty_table_is_unavailable() {
        let table = SurvivalTable::new("survival.csv", vec![]).unwrap();
        let panel = survival_panel(&table, &selection("TAM"), &ReportConfig::default());
        assert!(!panel.is_ready());
    }
}
