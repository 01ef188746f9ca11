//! MCMC convergence diagnostics: R-hat, ESS, the HMC energy trace and,
//! when raw draws were exported, per-parameter trace, rank and
//! autocorrelation plots.

use pv_common::names::format_signature_name;
use pv_common::{EffectTable, EnergyTable, PosteriorDrawTable, Selection};
use serde::Serialize;

use super::{html_escape, Panel, Source};
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, ReferenceLine, Series, SeriesKind};
use crate::config::ReportLimits;

/// R-hat below this is excellent.
pub const RHAT_EXCELLENT: f64 = 1.01;
/// R-hat below this is acceptable.
pub const RHAT_ACCEPTABLE: f64 = 1.05;
/// Minimum effective sample size considered adequate.
pub const ESS_TARGET: f64 = 400.0;
/// E-BFMI below this suggests poor exploration.
pub const BFMI_LOW: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RhatStatus {
    Excellent,
    Acceptable,
    Poor,
}

impl RhatStatus {
    pub fn from_r_hat(r_hat: f64) -> Self {
        if r_hat < RHAT_EXCELLENT {
            RhatStatus::Excellent
        } else if r_hat < RHAT_ACCEPTABLE {
            RhatStatus::Acceptable
        } else {
            RhatStatus::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RhatStatus::Excellent => "Excellent",
            RhatStatus::Acceptable => "Acceptable",
            RhatStatus::Poor => "Poor",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RhatStatus::Excellent => "#22c55e",
            RhatStatus::Acceptable => "#eab308",
            RhatStatus::Poor => "#ef4444",
        }
    }
}

/// Worst-case diagnostics of one signature model across BMI groups.
#[derive(Debug, Clone, PartialEq)]
struct ModelDiagnostics {
    signature: String,
    max_r_hat: f64,
    min_ess: f64,
}

fn model_diagnostics(effects: &EffectTable, cell: &str) -> Vec<ModelDiagnostics> {
    effects
        .signatures_for(cell)
        .into_iter()
        .filter_map(|sig| {
            let records: Vec<_> = effects
                .for_cell_type(cell)
                .filter(|r| pv_common::names::same_name(&r.signature_name, &sig))
                .collect();
            let max_r_hat = records.iter().map(|r| r.r_hat).reduce(f64::max)?;
            let min_ess = records.iter().map(|r| r.ess).reduce(f64::min)?;
            Some(ModelDiagnostics {
                signature: sig,
                max_r_hat,
                min_ess,
            })
        })
        .collect()
}

/// Every `step`-th draw so that at most `max_points` remain; the last draw is kept.
pub fn downsample<T: Copy>(series: &[T], max_points: usize) -> Vec<T> {
    if max_points == 0 || series.len() <= max_points {
        return series.to_vec();
    }
    let step = series.len().div_ceil(max_points);
    let mut out: Vec<T> = series.iter().step_by(step).copied().collect();
    if (series.len() - 1) % step != 0 {
        if out.len() == max_points {
            out.pop();
        }
        if let Some(last) = series.last() {
            out.push(*last);
        }
    }
    out
}

fn energy_chart(energy: &EnergyTable, limits: &ReportLimits) -> (ChartSpec, Vec<String>) {
    let mut chart = ChartSpec::new(
        "diagnostics-energy",
        ChartKind::Line,
        "HMC energy trace",
        Axis::value("Draw"),
        Axis::value("Energy"),
    );
    for (chain, series) in energy.chains() {
        let points = downsample(series, limits.max_energy_points)
            .into_iter()
            .map(|(draw, e)| {
                DataPoint::new(
                    draw as f64,
                    e,
                    format!("Chain {}<br>Draw {}: {:.2}", chain, draw, e),
                )
            })
            .collect();
        chart = chart.with_series(Series::new(format!("Chain {}", chain), SeriesKind::Line, points));
    }

    let notes = energy
        .summaries()
        .into_iter()
        .map(|s| match s.bfmi {
            Some(bfmi) if bfmi < BFMI_LOW => format!(
                "Chain {}: E-BFMI {:.2} (low, below {:.1})",
                s.chain, bfmi, BFMI_LOW
            ),
            Some(bfmi) => format!("Chain {}: E-BFMI {:.2}", s.chain, bfmi),
            None => format!("Chain {}: E-BFMI not available ({} draws)", s.chain, s.draws),
        })
        .collect();
    (chart, notes)
}

/// R-hat and ESS per signature model of the selected cell type, plus the
/// energy trace and posterior draw plots when those were exported.
pub fn diagnostics_panel(
    effects: &EffectTable,
    energy: Source<'_, EnergyTable>,
    draws: Source<'_, PosteriorDrawTable>,
    selection: &Selection,
    limits: &ReportLimits,
) -> Panel {
    let Some(cell) = selection.cell_type.as_deref() else {
        return Panel::unavailable("No cell types in this compartment");
    };
    let models = model_diagnostics(effects, cell);
    if models.is_empty() {
        return Panel::unavailable(format!("No models for {}", cell));
    }

    let labels: Vec<String> = models
        .iter()
        .map(|m| format_signature_name(&m.signature, limits.max_signature_name_len))
        .collect();

    let r_hat_points = models
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let status = RhatStatus::from_r_hat(m.max_r_hat);
            DataPoint::new(
                i as f64,
                m.max_r_hat,
                format!(
                    "<b>{}</b><br>max R-hat {:.4} ({})",
                    html_escape(&m.signature),
                    m.max_r_hat,
                    status.label()
                ),
            )
            .with_color(status.color())
        })
        .collect();
    let r_hat = ChartSpec::new(
        "diagnostics-rhat",
        ChartKind::Bar,
        format!("R-hat by signature model in {}", cell),
        Axis::category("Signature", labels.clone()),
        Axis::value("max R-hat"),
    )
    .with_series(Series::new("R-hat", SeriesKind::Bar, r_hat_points))
    .with_reference_line(ReferenceLine::y(RHAT_EXCELLENT, "1.01").with_color("#22c55e"))
    .with_reference_line(ReferenceLine::y(RHAT_ACCEPTABLE, "1.05").with_color("#ef4444"));

    let ess_points = models
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let color = if m.min_ess >= ESS_TARGET { "#3b82f6" } else { "#ef4444" };
            DataPoint::new(
                i as f64,
                m.min_ess,
                format!("<b>{}</b><br>min ESS {:.0}", html_escape(&m.signature), m.min_ess),
            )
            .with_color(color)
        })
        .collect();
    let ess = ChartSpec::new(
        "diagnostics-ess",
        ChartKind::Bar,
        format!("Effective sample size in {}", cell),
        Axis::category("Signature", labels),
        Axis::value("min ESS"),
    )
    .with_series(Series::new("ESS", SeriesKind::Bar, ess_points))
    .with_reference_line(ReferenceLine::y(ESS_TARGET, "ESS 400"));

    let poor = models
        .iter()
        .filter(|m| RhatStatus::from_r_hat(m.max_r_hat) == RhatStatus::Poor)
        .count();
    let mut notes = vec![format!(
        "{} of {} models have R-hat below {}",
        models
            .iter()
            .filter(|m| RhatStatus::from_r_hat(m.max_r_hat) == RhatStatus::Excellent)
            .count(),
        models.len(),
        RHAT_EXCELLENT
    )];
    if poor > 0 {
        notes.push(format!("{} models have R-hat of {} or more", poor, RHAT_ACCEPTABLE));
    }

    let mut charts = vec![r_hat, ess];
    match energy {
        Ok(table) if !table.is_empty() => {
            let (chart, energy_notes) = energy_chart(table, limits);
            charts.push(chart);
            notes.extend(energy_notes);
        }
        Ok(_) => notes.push("Energy trace is empty".to_string()),
        Err(reason) => notes.push(format!("Energy trace unavailable: {}", reason)),
    }
    match draws {
        Ok(table) if !table.is_empty() => {
            let (draw_charts, draw_notes) = super::draws::posterior_draw_charts(table, cell, limits);
            charts.extend(draw_charts);
            notes.extend(draw_notes);
        }
        Ok(_) => notes.push("Posterior draws are empty".to_string()),
        Err(reason) => notes.push(format!("Posterior draw plots unavailable: {}", reason)),
    }
    Panel::ready(charts, notes)
}
