//! Page generator.

use chrono::{DateTime, Utc};
use pv_common::{
    BmiComparison, Catalog, PlotKind, Selection, SelectionCorrection,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::chart::ChartSpec;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::views::{html_escape, render_panels, Panel, PanelView, ViewSources};

/// Everything one page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub generator_version: String,
    pub title: String,
    pub catalog: Catalog,
    pub selection: Selection,
    /// Requested values that were replaced by defaults.
    pub corrections: Vec<SelectionCorrection>,
    /// Gene counts of the selected cell type's signatures, when the catalog has them.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub gene_counts: BTreeMap<String, usize>,
    pub panels: Vec<PanelView>,
}

impl ReportData {
    /// Tab shown first: the selected plot kind when it has a tab.
    pub fn active_panel(&self) -> Option<PlotKind> {
        self.panels
            .iter()
            .find(|p| p.kind == self.selection.plot_kind)
            .or_else(|| self.panels.first())
            .map(|p| p.kind)
    }

    pub fn panel(&self, kind: PlotKind) -> Option<&PanelView> {
        self.panels.iter().find(|p| p.kind == kind)
    }

    /// Every chart on the page.
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.panels.iter().flat_map(|p| p.panel.charts())
    }
}

/// Query string (without `?`) reproducing a selection with a given plot kind.
pub fn query_string(selection: &Selection, plot: PlotKind) -> String {
    let pairs = selection
        .query_pairs()
        .into_iter()
        .map(|(k, v)| if k == "plot" { (k, plot.slug().to_string()) } else { (k, v) });
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// JSON safe to place inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--"))
}

fn chart_height(chart: &ChartSpec) -> usize {
    match chart.y_axis.categories.len() {
        0 => 380,
        rows => (rows * 24 + 170).clamp(320, 1400),
    }
}

/// Page generator.
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn default_config() -> Self {
        Self::new(ReportConfig::default())
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Render every enabled view for a selection.
    pub fn build(
        &self,
        catalog: &Catalog,
        selection: &Selection,
        corrections: &[SelectionCorrection],
        sources: &ViewSources<'_>,
    ) -> ReportData {
        let panels = render_panels(sources, selection, &self.config);
        debug!(
            panels = panels.len(),
            ready = panels.iter().filter(|p| p.panel.is_ready()).count(),
            "Views rendered"
        );

        let gene_counts = match (&sources.signatures, selection.cell_type.as_deref()) {
            (Ok(sigs), Some(cell)) => catalog
                .compartment(&selection.compartment)
                .and_then(|c| c.cell_type(cell))
                .map(|entry| {
                    entry
                        .signatures
                        .iter()
                        .filter_map(|s| sigs.gene_count(cell, s).map(|n| (s.clone(), n)))
                        .collect()
                })
                .unwrap_or_default(),
            _ => BTreeMap::new(),
        };

        let compartment_label = catalog
            .compartment(&selection.compartment)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| selection.compartment.clone());
        let title = self
            .config
            .title
            .clone()
            .unwrap_or_else(|| format!("PAAD Obesity Results: {}", compartment_label));

        ReportData {
            schema_version: self.config.schema_version.clone(),
            generated_at: Utc::now(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            title,
            catalog: catalog.clone(),
            selection: selection.clone(),
            corrections: corrections.to_vec(),
            gene_counts,
            panels,
        }
    }

    /// Generate the HTML page.
    pub fn generate(&self, data: &ReportData) -> Result<String> {
        if data.panels.is_empty() {
            return Err(ReportError::MissingData("no panels to render".to_string()));
        }
        self.render_html(data)
    }

    fn render_html(&self, data: &ReportData) -> Result<String> {
        let html = self.generate_html(data)?;

        let output = if cfg!(debug_assertions) {
            html
        } else {
            let cfg = minify_html::Cfg {
                minify_js: true,
                minify_css: true,
                ..Default::default()
            };
            String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).unwrap_or(html)
        };

        info!(
            event = "view.rendered",
            bytes = output.len(),
            title = %data.title,
            plot = %data.selection.plot_kind,
            "Page generated"
        );

        Ok(output)
    }

    fn chart_options(&self, data: &ReportData) -> Value {
        let mut options = Map::new();
        for chart in data.charts() {
            options.insert(
                chart.id.clone(),
                json!({
                    "option": chart.to_echarts(),
                    "resetOnDoubleClick": chart.interactions.reset_on_double_click,
                }),
            );
        }
        Value::Object(options)
    }

    fn generate_html(&self, data: &ReportData) -> Result<String> {
        let theme_class = self.config.theme.css_class();
        let cdn_base = &self.config.cdn_config.base_url;
        let libs = &self.config.cdn_config.libraries;

        let mut cdn_styles = String::new();
        let mut cdn_scripts = String::new();

        if let Some(lib) = libs.get("tailwindcss") {
            cdn_styles.push_str(&format!(
                r#"<link rel="stylesheet" href="{}" integrity="{}" crossorigin="anonymous">"#,
                lib.url(cdn_base, "tailwindcss"),
                lib.sri
            ));
        }
        if let Some(lib) = libs.get("echarts") {
            cdn_scripts.push_str(&format!(
                r#"<script src="{}" integrity="{}" crossorigin="anonymous"></script>"#,
                lib.url(cdn_base, "echarts"),
                lib.sri
            ));
        }

        let active = data.active_panel().unwrap_or_default();

        Ok(format!(
            r##"<!DOCTYPE html>
<html lang="en" class="{theme_class}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="generator" content="pv-report {version}">
    <meta name="robots" content="noindex, nofollow">
    {cdn_styles}
    <style>{style}</style>
</head>
<body>
    <div class="max-w-7xl mx-auto px-4 py-8">
        <header class="mb-6">
            <h1 class="text-3xl font-bold mb-2">{title}</h1>
            <p class="text-sm" style="color: var(--text-secondary)">
                Generated: {generated_at} | Compartment: {compartment}
            </p>
        </header>

        {notices}

        {selectors}

        <nav class="flex border-b mb-6 no-print" style="border-color: var(--border-color)">
            {tab_buttons}
        </nav>

        <main>
            {tab_contents}
        </main>

        <footer class="mt-8 pt-4 border-t text-sm text-center" style="border-color: var(--border-color); color: var(--text-secondary)">
            <p>PAAD Obesity Results Viewer v{version}</p>
        </footer>
    </div>

    {cdn_scripts}
    <script>
        const REPORT_DATA = {data_json};
        const CHART_OPTIONS = {options_json};
        const ECHARTS_THEME = {echarts_theme};
        const ACTIVE_TAB = "{active}";
        {script}
    </script>
</body>
</html>"##,
            theme_class = theme_class,
            title = html_escape(&data.title),
            version = env!("CARGO_PKG_VERSION"),
            cdn_styles = cdn_styles,
            style = PAGE_STYLE,
            generated_at = data.generated_at.format("%Y-%m-%d %H:%M UTC"),
            compartment = html_escape(&data.selection.compartment),
            notices = self.generate_notices(data),
            selectors = self.generate_selectors(data),
            tab_buttons = self.generate_tab_buttons(data, active),
            tab_contents = self.generate_tab_contents(data, active),
            cdn_scripts = cdn_scripts,
            data_json = script_json(data)?,
            options_json = script_json(&self.chart_options(data))?,
            echarts_theme = script_json(&self.config.theme.echarts_theme())?,
            active = active.slug(),
            script = PAGE_SCRIPT,
        ))
    }

    fn generate_notices(&self, data: &ReportData) -> String {
        data.corrections
            .iter()
            .map(|c| {
                format!(
                    r#"<div class="notice" role="status">{}</div>"#,
                    html_escape(&c.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n        ")
    }

    fn generate_selectors(&self, data: &ReportData) -> String {
        let selection = &data.selection;
        let option = |value: &str, label: &str, selected: bool| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                html_escape(value),
                if selected { " selected" } else { "" },
                html_escape(label)
            )
        };

        let compartment = data.catalog.compartment(&selection.compartment);
        let compartments: String = data
            .catalog
            .compartments()
            .iter()
            .map(|c| option(&c.key, &c.label, c.key == selection.compartment))
            .collect();

        let cell_entry = compartment
            .zip(selection.cell_type.as_deref())
            .and_then(|(c, cell)| c.cell_type(cell));
        let cell_types: String = compartment
            .map(|c| {
                c.cell_types
                    .iter()
                    .map(|ct| {
                        option(
                            &ct.name,
                            &ct.name,
                            Some(ct.name.as_str()) == selection.cell_type.as_deref(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        let signatures: String = cell_entry
            .map(|ct| {
                ct.signatures
                    .iter()
                    .map(|s| {
                        let label = match data.gene_counts.get(s) {
                            Some(n) => format!("{} ({} genes)", s, n),
                            None => s.clone(),
                        };
                        option(s, &label, Some(s.as_str()) == selection.signature.as_deref())
                    })
                    .collect()
            })
            .unwrap_or_default();
        let comparisons: String = BmiComparison::ALL
            .iter()
            .map(|c| option(c.slug(), c.label(), *c == selection.comparison))
            .collect();

        format!(
            r##"<form id="selection-form" class="card selectors no-print" method="get" action="">
            <label>Compartment <select name="compartment" id="sel-compartment">{compartments}</select></label>
            <label>Cell type <select name="cell_type" id="sel-cell-type">{cell_types}</select></label>
            <label>Signature <select name="signature" id="sel-signature">{signatures}</select></label>
            <label>BMI comparison <select name="comparison" id="sel-comparison">{comparisons}</select></label>
            <input type="hidden" name="plot" id="sel-plot" value="{plot}">
            <button type="submit" class="update-btn">Update</button>
        </form>"##,
            compartments = compartments,
            cell_types = cell_types,
            signatures = signatures,
            comparisons = comparisons,
            plot = selection.plot_kind.slug(),
        )
    }

    fn generate_tab_buttons(&self, data: &ReportData, active: PlotKind) -> String {
        data.panels
            .iter()
            .map(|p| {
                format!(
                    r#"<a class="tab-btn{active}" data-tab="{slug}" href="?{href}">{label}</a>"#,
                    active = if p.kind == active { " active" } else { "" },
                    slug = p.kind.slug(),
                    href = html_escape(&query_string(&data.selection, p.kind)),
                    label = html_escape(&p.title),
                )
            })
            .collect::<Vec<_>>()
            .join("\n            ")
    }

    fn generate_tab_contents(&self, data: &ReportData, active: PlotKind) -> String {
        data.panels
            .iter()
            .map(|p| {
                let body = match &p.panel {
                    Panel::Ready {
                        charts,
                        tables,
                        notes,
                    } => {
                        let charts_html: String = charts
                            .iter()
                            .map(|c| {
                                format!(
                                    r#"<div class="card"><div id="chart-{id}" class="chart" data-chart="{id}" style="height: {height}px"></div></div>"#,
                                    id = html_escape(&c.id),
                                    height = chart_height(c),
                                )
                            })
                            .collect();
                        let notes_html = if notes.is_empty() {
                            String::new()
                        } else {
                            format!(
                                r#"<ul class="notes">{}</ul>"#,
                                notes
                                    .iter()
                                    .map(|n| format!("<li>{}</li>", html_escape(n)))
                                    .collect::<String>()
                            )
                        };
                        let tables_html: String = tables
                            .iter()
                            .map(|t| {
                                format!(
                                    r#"<div class="card"><h3 class="text-lg font-semibold">{title}</h3>{table}</div>"#,
                                    title = html_escape(&t.title),
                                    table = t.to_html(),
                                )
                            })
                            .collect();
                        format!("{}{}{}", charts_html, tables_html, notes_html)
                    }
                    Panel::Unavailable { reason } => format!(
                        r#"<div class="card unavailable"><h3 class="text-lg font-semibold">Data unavailable</h3><p>{}</p></div>"#,
                        html_escape(reason)
                    ),
                };
                format!(
                    r#"<section id="tab-{slug}" class="tab-content{active}">{body}</section>"#,
                    slug = p.kind.slug(),
                    active = if p.kind == active { " active" } else { "" },
                    body = body,
                )
            })
            .collect::<Vec<_>>()
            .join("\n            ")
    }
}

const PAGE_STYLE: &str = r#"
        :root {
            --bg-primary: #ffffff;
            --bg-secondary: #f9fafb;
            --text-primary: #111827;
            --text-secondary: #6b7280;
            --border-color: #e5e7eb;
            --accent-color: #a44a4a;
        }
        .dark {
            --bg-primary: #111827;
            --bg-secondary: #1f2937;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --border-color: #374151;
            --accent-color: #f87171;
        }
        @media (prefers-color-scheme: dark) {
            :root:not(.light) {
                --bg-primary: #111827;
                --bg-secondary: #1f2937;
                --text-primary: #f9fafb;
                --text-secondary: #9ca3af;
                --border-color: #374151;
                --accent-color: #f87171;
            }
        }
        body {
            background-color: var(--bg-primary);
            color: var(--text-primary);
            font-family: ui-sans-serif, system-ui, sans-serif;
            line-height: 1.5;
        }
        .card {
            background-color: var(--bg-secondary);
            border: 1px solid var(--border-color);
            border-radius: 0.5rem;
            padding: 1.25rem;
            margin-bottom: 1rem;
        }
        .selectors {
            display: flex;
            flex-wrap: wrap;
            gap: 1rem;
            align-items: end;
        }
        .selectors label {
            display: flex;
            flex-direction: column;
            font-size: 0.875rem;
            color: var(--text-secondary);
        }
        .selectors select {
            min-width: 12rem;
            padding: 0.25rem 0.5rem;
            border: 1px solid var(--border-color);
            border-radius: 0.25rem;
            background-color: var(--bg-primary);
            color: var(--text-primary);
        }
        .update-btn {
            padding: 0.375rem 1rem;
            border-radius: 0.25rem;
            background-color: var(--accent-color);
            color: #ffffff;
        }
        .notice {
            border-left: 4px solid #eab308;
            background-color: var(--bg-secondary);
            padding: 0.5rem 1rem;
            margin-bottom: 0.5rem;
            font-size: 0.875rem;
        }
        .tab-btn {
            padding: 0.75rem 1.5rem;
            border-bottom: 2px solid transparent;
            cursor: pointer;
            transition: all 0.2s;
        }
        .tab-btn:hover {
            background-color: var(--bg-secondary);
        }
        .tab-btn.active {
            border-bottom-color: var(--accent-color);
            color: var(--accent-color);
        }
        .tab-content {
            display: none;
        }
        .tab-content.active {
            display: block;
        }
        .unavailable {
            border-left: 4px solid #ef4444;
        }
        .data-table {
            width: 100%;
            border-collapse: collapse;
            font-size: 0.875rem;
        }
        .data-table th, .data-table td {
            text-align: left;
            padding: 0.375rem 0.75rem;
            border-bottom: 1px solid var(--border-color);
        }
        .data-table tr.selected {
            background-color: var(--bg-primary);
            font-weight: 600;
        }
        .notes {
            font-size: 0.875rem;
            color: var(--text-secondary);
            list-style: disc;
            padding-left: 1.5rem;
        }
        @media print {
            .no-print { display: none !important; }
            body { font-size: 10pt; }
            .card { page-break-inside: avoid; }
            .tab-content { display: block; }
        }
"#;

const PAGE_SCRIPT: &str = r#"
        const charts = {};

        function errorBar(params, api) {
            const y = api.value(2);
            const low = api.coord([api.value(0), y]);
            const high = api.coord([api.value(1), y]);
            const cap = 4;
            const style = { stroke: api.visual('color'), lineWidth: 1.5 };
            return {
                type: 'group',
                children: [
                    { type: 'line', shape: { x1: low[0], y1: low[1], x2: high[0], y2: high[1] }, style: style },
                    { type: 'line', shape: { x1: low[0], y1: low[1] - cap, x2: low[0], y2: low[1] + cap }, style: style },
                    { type: 'line', shape: { x1: high[0], y1: high[1] - cap, x2: high[0], y2: high[1] + cap }, style: style },
                ],
            };
        }

        function prepare(option) {
            if (option.tooltip) {
                option.tooltip.formatter = p => (p.data && p.data.tooltip) || p.seriesName;
            }
            (option.series || []).forEach(s => {
                if (s.renderItem === 'errorBar') {
                    s.renderItem = errorBar;
                    s.tooltip = { show: false };
                }
            });
            return option;
        }

        function initCharts(tabId) {
            if (typeof echarts === 'undefined') return;
            document.querySelectorAll('#tab-' + tabId + ' .chart').forEach(el => {
                const id = el.dataset.chart;
                if (charts[id]) {
                    charts[id].resize();
                    return;
                }
                const spec = CHART_OPTIONS[id];
                if (!spec) return;
                const chart = echarts.init(el, ECHARTS_THEME);
                chart.setOption(prepare(spec.option));
                if (spec.resetOnDoubleClick) {
                    chart.getZr().on('dblclick', () => {
                        chart.dispatchAction({ type: 'restore' });
                    });
                }
                charts[id] = chart;
            });
        }

        function switchTab(tabId) {
            document.querySelectorAll('.tab-btn').forEach(btn => {
                btn.classList.toggle('active', btn.dataset.tab === tabId);
            });
            document.querySelectorAll('.tab-content').forEach(content => {
                content.classList.toggle('active', content.id === 'tab-' + tabId);
            });
            const plot = document.getElementById('sel-plot');
            if (plot) plot.value = tabId;
            if (window.history && window.location.protocol !== 'file:') {
                const url = new URL(window.location.href);
                url.searchParams.set('plot', tabId);
                window.history.replaceState(null, '', url);
            }
            initCharts(tabId);
        }

        document.querySelectorAll('.tab-btn').forEach(btn => {
            btn.addEventListener('click', event => {
                event.preventDefault();
                switchTab(btn.dataset.tab);
            });
        });

        const form = document.getElementById('selection-form');
        const dependents = {
            'sel-compartment': ['sel-cell-type', 'sel-signature'],
            'sel-cell-type': ['sel-signature'],
            'sel-signature': [],
            'sel-comparison': [],
        };
        Object.keys(dependents).forEach(id => {
            const select = document.getElementById(id);
            if (!select || !form) return;
            select.addEventListener('change', () => {
                dependents[id].forEach(dep => {
                    const el = document.getElementById(dep);
                    if (el) el.disabled = true;
                });
                form.submit();
            });
        });

        window.addEventListener('resize', () => {
            Object.values(charts).forEach(c => c.resize());
        });

        switchTab(ACTIVE_TAB);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::ViewSources;
    use pv_common::{BmiGroup, CompartmentEntry, EffectTable, SignatureEffectRecord};

    fn effects() -> EffectTable {
        let rec = |sig: &str, group, v: f64| SignatureEffectRecord {
            cell_type: "Macrophage".into(),
            signature_name: sig.into(),
            bmi_group: group,
            effect_size: v,
            credible_interval_low: v - 0.1,
            credible_interval_high: v + 0.1,
            r_hat: 1.0,
            ess: 800.0,
        };
        EffectTable::new(
            "effects.csv",
            vec![
                rec("Glycolysis", BmiGroup::Normal, 0.1),
                rec("OXPHOS", BmiGroup::Obese, -0.2),
            ],
        )
        .unwrap()
    }

    fn page(generator: &ReportGenerator, corrections: &[SelectionCorrection]) -> ReportData {
        let table = effects();
        let catalog = Catalog::new(vec![CompartmentEntry::from_effects(
            "immune_fine",
            "Immune Fine",
            Some(&table),
        )]);
        let selection = Selection::initial(&catalog);
        let sources = ViewSources {
            effects: Ok(&table),
            proportions: Err("proportions.csv not found".into()),
            survival: Err("survival.csv not found".into()),
            energy: Err("energy.csv not found".into()),
            draws: Err("posterior_draws.csv not found".into()),
            signatures: Err("signatures.json not found".into()),
            stabl: None,
        };
        generator.build(&catalog, &selection, corrections, &sources)
    }

    #[test]
    fn test_default_title_names_compartment() {
        let generator = ReportGenerator::default_config();
        let data = page(&generator, &[]);
        assert_eq!(data.title, "PAAD Obesity Results: Immune Fine");
        let html = generator.generate(&data).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("PAAD Obesity Results: Immune Fine"));
    }

    #[test]
    fn test_query_string_overrides_plot() {
        let selection = Selection {
            compartment: "immune_fine".into(),
            cell_type: Some("CD8 T".into()),
            signature: Some("IFN-γ".into()),
            ..Default::default()
        };
        let qs = query_string(&selection, PlotKind::Forest);
        assert_eq!(
            qs,
            "compartment=immune_fine&cell_type=CD8+T&signature=IFN-%CE%B3&comparison=obese_vs_normal&plot=forest"
        );
    }

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let json = script_json(&json!({"name": "</script><!--"})).unwrap();
        assert!(!json.contains("</script>"));
        assert!(!json.contains("<!--"));
    }

    #[test]
    fn test_corrections_become_notices() {
        let generator = ReportGenerator::default_config();
        let correction = SelectionCorrection {
            field: pv_common::SelectionField::CellType,
            requested: "NK <cell>".into(),
            fallback: Some("Macrophage".into()),
        };
        let html = generator
            .generate(&page(&generator, &[correction]))
            .unwrap();
        assert!(html.contains(r#"<div class="notice" role="status">"#));
        assert!(html.contains("NK &lt;cell&gt;"));
    }

    #[test]
    fn test_empty_page_is_an_error() {
        let generator = ReportGenerator::default_config();
        let mut data = page(&generator, &[]);
        data.panels.clear();
        assert!(matches!(
            generator.generate(&data),
            Err(ReportError::MissingData(_))
        ));
    }
}
