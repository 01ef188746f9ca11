//! Per-parameter MCMC plots from raw posterior draws: trace, rank histogram
//! and autocorrelation.

use pv_common::{ParameterDraws, PosteriorDrawTable};

use super::diagnostics::downsample;
use crate::chart::{Axis, ChartKind, ChartSpec, DataPoint, ReferenceLine, Series, SeriesKind};
use crate::config::ReportLimits;

/// Chain colours, cycled when there are more chains.
const CHAIN_COLORS: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

fn chain_color(i: usize) -> &'static str {
    CHAIN_COLORS[i % CHAIN_COLORS.len()]
}

fn trace_chart(idx: usize, param: &ParameterDraws, limits: &ReportLimits) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("diagnostics-trace-{}", idx),
        ChartKind::Line,
        format!("Trace: {}", param.name),
        Axis::value("Iteration"),
        Axis::value("Value"),
    );
    for (i, (chain, values)) in param.chains.iter().enumerate() {
        let indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
        let points = downsample(&indexed, limits.max_energy_points)
            .into_iter()
            .map(|(it, v)| {
                DataPoint::new(
                    it as f64,
                    v,
                    format!("Chain {}<br>Iteration {}: {:.3}", chain, it, v),
                )
            })
            .collect();
        chart = chart.with_series(
            Series::new(format!("Chain {}", chain), SeriesKind::Line, points).with_color(chain_color(i)),
        );
    }
    chart
}

fn rank_chart(idx: usize, param: &ParameterDraws, limits: &ReportLimits) -> ChartSpec {
    let hist = param.rank_histograms(limits.rank_bins);
    let bins = limits.rank_bins.max(1);
    let mut chart = ChartSpec::new(
        format!("diagnostics-rank-{}", idx),
        ChartKind::Bar,
        format!("Rank plot: {}", param.name),
        Axis::category("Rank bin", (1..=bins).map(|b| b.to_string()).collect()),
        Axis::value("Frequency"),
    );
    for (i, (chain, counts)) in hist.iter().enumerate() {
        let points = counts
            .iter()
            .enumerate()
            .map(|(b, n)| {
                DataPoint::new(
                    b as f64,
                    *n as f64,
                    format!("Chain {}<br>Rank bin {}: {}", chain, b + 1, n),
                )
            })
            .collect();
        chart = chart.with_series(
            Series::new(format!("Chain {}", chain), SeriesKind::Bar, points).with_color(chain_color(i)),
        );
    }
    chart
}

fn autocorrelation_chart(idx: usize, param: &ParameterDraws, limits: &ReportLimits) -> ChartSpec {
    let mut chart = ChartSpec::new(
        format!("diagnostics-acf-{}", idx),
        ChartKind::Line,
        format!("Autocorrelation: {}", param.name),
        Axis::value("Lag"),
        Axis::value("Autocorrelation").with_range(-0.2, 1.1),
    );
    for (i, chain) in param.chains.keys().enumerate() {
        let points = param
            .autocorrelation(*chain, limits.max_acf_lag)
            .into_iter()
            .map(|(lag, r)| {
                DataPoint::new(
                    lag as f64,
                    r,
                    format!("Chain {}<br>Lag {}: {:.3}", chain, lag, r),
                )
            })
            .collect();
        chart = chart.with_series(
            Series::new(format!("Chain {}", chain), SeriesKind::Line, points).with_color(chain_color(i)),
        );
    }
    let n = param.draws_per_chain();
    if n > 0 {
        let band = 1.96 / (n as f64).sqrt();
        chart = chart
            .with_reference_line(ReferenceLine::y(band, format!("+{:.3}", band)).with_color("#9ca3af"))
            .with_reference_line(ReferenceLine::y(-band, format!("-{:.3}", band)).with_color("#9ca3af"));
    }
    chart
}

/// Trace, rank and autocorrelation charts for the parameters of one cell type.
///
/// Parameters are matched to the cell type by name; when none matches, the
/// first parameters of the table are shown.
pub fn posterior_draw_charts(
    table: &PosteriorDrawTable,
    cell: &str,
    limits: &ReportLimits,
) -> (Vec<ChartSpec>, Vec<String>) {
    let params = table.for_cell_type(cell);
    let shown: Vec<_> = params.iter().take(limits.max_trace_parameters).collect();

    let mut charts = Vec::with_capacity(shown.len() * 3);
    for (idx, param) in shown.iter().enumerate() {
        charts.push(trace_chart(idx, param, limits));
        charts.push(rank_chart(idx, param, limits));
        charts.push(autocorrelation_chart(idx, param, limits));
    }

    let mut notes = vec![format!(
        "Posterior draws: {} of {} parameters shown ({})",
        shown.len(),
        params.len(),
        shown
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    )];
    let short: Vec<_> = shown
        .iter()
        .filter(|p| p.draws_per_chain() < 2)
        .map(|p| p.name.clone())
        .collect();
    if !short.is_empty() {
        notes.push(format!(
            "Too few draws for autocorrelation: {}",
            short.join(", ")
        ));
    }
    (charts, notes)
}
