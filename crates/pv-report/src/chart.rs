//! Chart descriptions.
//!
//! A [`ChartSpec`] is what a view produces: axes, encoded values, reference
//! lines and the interactive affordances the page wires up. It is plain data;
//! [`ChartSpec::to_echarts`] turns it into an ECharts option object.

use serde::Serialize;
use serde_json::{json, Value};

use crate::color::DivergingScale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Heatmap,
    Forest,
    Bar,
    StackedBar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    Category,
    Value,
    Log,
}

impl ScaleKind {
    fn echarts_type(&self) -> &'static str {
        match self {
            ScaleKind::Category => "category",
            ScaleKind::Value => "value",
            ScaleKind::Log => "log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub scale: ScaleKind,
    /// Category names; index `i` is the coordinate `i`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Axis {
    pub fn category(label: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            label: label.into(),
            scale: ScaleKind::Category,
            categories,
            min: None,
            max: None,
        }
    }

    pub fn value(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scale: ScaleKind::Value,
            categories: Vec::new(),
            min: None,
            max: None,
        }
    }

    pub fn log(label: impl Into<String>) -> Self {
        Self {
            scale: ScaleKind::Log,
            ..Self::value(label)
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    fn to_echarts(&self) -> Value {
        let mut axis = json!({
            "type": self.scale.echarts_type(),
            "name": self.label,
            "nameLocation": "middle",
            "nameGap": 32,
        });
        if !self.categories.is_empty() {
            axis["data"] = json!(self.categories);
        }
        if let Some(min) = self.min {
            axis["min"] = json!(min);
        }
        if let Some(max) = self.max {
            axis["max"] = json!(max);
        }
        axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Heatmap,
    Bar,
    /// Point estimate with a horizontal interval.
    ScatterWithError,
    Line,
}

/// One encoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    /// Cell value for heatmaps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Interval bounds along x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// Colour strength in `[0, 1]` for colour-encoded points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Hover text (HTML, already escaped).
    pub tooltip: String,
    /// Part of the current selection.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub highlight: bool,
}

impl DataPoint {
    pub fn new(x: f64, y: f64, tooltip: impl Into<String>) -> Self {
        Self {
            x,
            y,
            value: None,
            low: None,
            high: None,
            intensity: None,
            color: None,
            tooltip: tooltip.into(),
            highlight: false,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_interval(mut self, low: f64, high: f64) -> Self {
        self.low = Some(low);
        self.high = Some(high);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn highlighted(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    fn to_echarts(&self, kind: SeriesKind) -> Value {
        let value = match kind {
            SeriesKind::Heatmap => json!([self.x, self.y, self.value]),
            _ => json!([self.x, self.y]),
        };
        let mut item = json!({ "value": value, "tooltip": self.tooltip });
        let mut style = serde_json::Map::new();
        if let Some(color) = &self.color {
            style.insert("color".into(), json!(color));
        }
        if self.highlight {
            style.insert("borderColor".into(), json!("#111827"));
            style.insert("borderWidth".into(), json!(2));
        }
        if !style.is_empty() {
            item["itemStyle"] = Value::Object(style);
        }
        item
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub kind: SeriesKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Bars sharing a stack name are stacked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub points: Vec<DataPoint>,
}

impl Series {
    pub fn new(name: impl Into<String>, kind: SeriesKind, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            kind,
            color: None,
            stack: None,
            points,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn stacked(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    fn to_echarts(&self, reference_lines: &[ReferenceLine]) -> Vec<Value> {
        let data: Vec<Value> = self.points.iter().map(|p| p.to_echarts(self.kind)).collect();
        let mut main = match self.kind {
            SeriesKind::Heatmap => json!({
                "type": "heatmap",
                "label": { "show": true, "formatter": "{@[2]}" },
            }),
            SeriesKind::Bar => json!({ "type": "bar" }),
            SeriesKind::ScatterWithError => json!({ "type": "scatter", "symbolSize": 9 }),
            SeriesKind::Line => json!({ "type": "line", "showSymbol": false, "sampling": "lttb" }),
        };
        main["name"] = json!(self.name);
        main["data"] = Value::Array(data);
        if let Some(color) = &self.color {
            main["itemStyle"] = json!({ "color": color });
        }
        if let Some(stack) = &self.stack {
            main["stack"] = json!(stack);
        }
        if !reference_lines.is_empty() {
            main["markLine"] = json!({
                "silent": true,
                "symbol": "none",
                "data": reference_lines.iter().map(ReferenceLine::to_echarts).collect::<Vec<_>>(),
            });
        }

        let mut out = vec![main];
        if self.kind == SeriesKind::ScatterWithError {
            // Drawn by the page's `errorBar` render function.
            let bars: Vec<Value> = self
                .points
                .iter()
                .filter_map(|p| match (p.low, p.high) {
                    (Some(low), Some(high)) => Some(json!([low, high, p.y])),
                    _ => None,
                })
                .collect();
            let mut errors = json!({
                "type": "custom",
                "name": self.name,
                "renderItem": "errorBar",
                "encode": { "x": [0, 1], "y": 2 },
                "data": bars,
                "z": 1,
            });
            if let Some(color) = &self.color {
                errors["itemStyle"] = json!({ "color": color });
            }
            out.push(errors);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAxis {
    X,
    Y,
}

/// A constant line, e.g. zero effect or HR = 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub axis: LineAxis,
    pub value: f64,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ReferenceLine {
    pub fn x(value: f64, label: impl Into<String>) -> Self {
        Self {
            axis: LineAxis::X,
            value,
            label: label.into(),
            color: None,
        }
    }

    pub fn y(value: f64, label: impl Into<String>) -> Self {
        Self {
            axis: LineAxis::Y,
            value,
            label: label.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    fn to_echarts(&self) -> Value {
        let key = match self.axis {
            LineAxis::X => "xAxis",
            LineAxis::Y => "yAxis",
        };
        let mut line = json!({
            "name": self.label,
            "label": { "formatter": self.label },
            "lineStyle": { "type": "dashed" },
        });
        line[key] = json!(self.value);
        if let Some(color) = &self.color {
            line["lineStyle"]["color"] = json!(color);
        }
        line
    }
}

/// Interactive affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interactions {
    pub hover_tooltip: bool,
    /// Zoom by dragging a box.
    pub box_zoom: bool,
    /// Pan by dragging the plot area.
    pub drag_pan: bool,
    pub reset_on_double_click: bool,
}

impl Default for Interactions {
    fn default() -> Self {
        Self {
            hover_tooltip: true,
            box_zoom: true,
            drag_pan: true,
            reset_on_double_click: true,
        }
    }
}

/// A complete chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// DOM-safe identifier, unique within a page.
    pub id: String,
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scale: Option<DivergingScale>,
    pub interactions: Interactions,
}

impl ChartSpec {
    pub fn new(
        id: impl Into<String>,
        kind: ChartKind,
        title: impl Into<String>,
        x_axis: Axis,
        y_axis: Axis,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            subtitle: None,
            x_axis,
            y_axis,
            series: Vec::new(),
            reference_lines: Vec::new(),
            color_scale: None,
            interactions: Interactions::default(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_reference_line(mut self, line: ReferenceLine) -> Self {
        self.reference_lines.push(line);
        self
    }

    pub fn with_color_scale(mut self, scale: DivergingScale) -> Self {
        self.color_scale = Some(scale);
        self
    }

    /// Number of encoded points across all series.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// ECharts option object.
    ///
    /// Function-valued options (tooltip formatter, error-bar renderer,
    /// double-click reset) are attached by the page script.
    pub fn to_echarts(&self) -> Value {
        let category_x = self.x_axis.scale == ScaleKind::Category;
        let category_y = self.y_axis.scale == ScaleKind::Category;

        let mut series = Vec::new();
        for (i, s) in self.series.iter().enumerate() {
            let lines: &[ReferenceLine] = if i == 0 { &self.reference_lines } else { &[] };
            series.extend(s.to_echarts(lines));
        }

        let mut option = json!({
            "title": { "text": self.title, "left": "center" },
            "grid": { "left": 180, "right": 40, "top": 70, "bottom": 70 },
            "xAxis": self.x_axis.to_echarts(),
            "yAxis": self.y_axis.to_echarts(),
            "series": series,
            "animation": false,
        });
        if let Some(subtitle) = &self.subtitle {
            option["title"]["subtext"] = json!(subtitle);
        }
        if self.series.len() > 1 {
            option["legend"] = json!({ "top": 40 });
        }
        if self.interactions.hover_tooltip {
            option["tooltip"] = json!({ "trigger": "item", "confine": true });
        }
        if self.interactions.box_zoom {
            option["toolbox"] = json!({
                "feature": {
                    "dataZoom": {},
                    "restore": {},
                },
            });
        }
        if self.interactions.drag_pan {
            let mut zooms = Vec::new();
            if !category_x || self.kind == ChartKind::StackedBar {
                zooms.push(json!({ "type": "inside", "xAxisIndex": 0 }));
            }
            if !category_y || self.kind == ChartKind::Heatmap {
                zooms.push(json!({ "type": "inside", "yAxisIndex": 0 }));
            }
            option["dataZoom"] = Value::Array(zooms);
        }
        if let Some(scale) = &self.color_scale {
            let max = if scale.max_abs > 0.0 { scale.max_abs } else { 1.0 };
            option["visualMap"] = json!({
                "min": -max,
                "max": max,
                "dimension": 2,
                "calculable": true,
                "orient": "horizontal",
                "left": "center",
                "bottom": 0,
                "inRange": { "color": scale.stops() },
            });
        }
        option
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> ChartSpec {
        ChartSpec::new(
            "forest",
            ChartKind::Forest,
            "Forest",
            Axis::value("Effect size"),
            Axis::category("Signature", vec!["OXPHOS".into()]),
        )
        .with_series(
            Series::new(
                "Obese",
                SeriesKind::ScatterWithError,
                vec![DataPoint::new(0.4, 0.0, "OXPHOS").with_interval(0.1, 0.7)],
            )
            .with_color("#a44a4a"),
        )
        .with_reference_line(ReferenceLine::x(0.0, "No effect"))
    }

    #[test]
    fn test_interactions_default_on() {
        let i = Interactions::default();
        assert!(i.hover_tooltip && i.box_zoom && i.drag_pan && i.reset_on_double_click);
    }

    #[test]
    fn test_error_series_emitted_for_intervals() {
        let option = forest().to_echarts();
        let series = option["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["type"], "scatter");
        assert_eq!(series[1]["type"], "custom");
        assert_eq!(series[1]["renderItem"], "errorBar");
        assert_eq!(series[1]["data"][0], json!([0.1, 0.7, 0.0]));
        assert_eq!(series[0]["markLine"]["data"][0]["xAxis"], 0.0);
    }

    #[test]
    fn test_affordances_map_to_echarts() {
        let option = forest().to_echarts();
        assert_eq!(option["tooltip"]["trigger"], "item");
        assert!(option["toolbox"]["feature"]["dataZoom"].is_object());
        assert_eq!(option["dataZoom"][0]["xAxisIndex"], 0);

        let mut chart = forest();
        chart.interactions = Interactions {
            hover_tooltip: false,
            box_zoom: false,
            drag_pan: false,
            reset_on_double_click: false,
        };
        let option = chart.to_echarts();
        assert!(option.get("tooltip").is_none());
        assert!(option.get("toolbox").is_none());
        assert!(option.get("dataZoom").is_none());
    }

    #[test]
    fn test_heatmap_point_encodes_value_and_style() {
        let point = DataPoint::new(2.0, 1.0, "tip")
            .with_value(0.6)
            .with_color("#b2182b")
            .highlighted(true);
        let item = point.to_echarts(SeriesKind::Heatmap);
        assert_eq!(item["value"], json!([2.0, 1.0, 0.6]));
        assert_eq!(item["itemStyle"]["color"], "#b2182b");
        assert_eq!(item["itemStyle"]["borderWidth"], 2);
    }

    #[test]
    fn test_spec_serialization_skips_empty_fields() {
        let json = serde_json::to_value(forest()).unwrap();
        assert!(json.get("color_scale").is_none());
        assert_eq!(json["x_axis"]["scale"], "value");
        assert!(json["x_axis"].get("categories").is_none());
        assert_eq!(json["series"][0]["points"][0]["low"], 0.1);
        assert!(json["series"][0]["points"][0].get("highlight").is_none());
    }
}
