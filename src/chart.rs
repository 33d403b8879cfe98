use std::str::FromStr;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::FigureConfig;
use crate::labels::{AxisRange, BarLabel, LabelOptions, compute_labels, draw_bar_labels};
use crate::prelude::*;
use crate::table::Table;

/// Something the saver can render onto any backend.
pub trait Figure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        config: &FigureConfig,
    ) -> Result<()>;
}

// tab10 palette
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub fn series_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendPlacement {
    UpperLeft,
    UpperCenter,
    #[default]
    UpperRight,
    MiddleLeft,
    Center,
    MiddleRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
    /// A single row above the plotting area.
    Above,
    Hidden,
}

impl LegendPlacement {
    fn series_label_position(&self) -> Option<SeriesLabelPosition> {
        use LegendPlacement::*;
        match self {
            UpperLeft => Some(SeriesLabelPosition::UpperLeft),
            UpperCenter => Some(SeriesLabelPosition::UpperMiddle),
            UpperRight => Some(SeriesLabelPosition::UpperRight),
            MiddleLeft => Some(SeriesLabelPosition::MiddleLeft),
            Center => Some(SeriesLabelPosition::MiddleMiddle),
            MiddleRight => Some(SeriesLabelPosition::MiddleRight),
            LowerLeft => Some(SeriesLabelPosition::LowerLeft),
            LowerCenter => Some(SeriesLabelPosition::LowerMiddle),
            LowerRight => Some(SeriesLabelPosition::LowerRight),
            Above | Hidden => None,
        }
    }
}

impl FromStr for LegendPlacement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "upper left" => Ok(LegendPlacement::UpperLeft),
            "upper center" => Ok(LegendPlacement::UpperCenter),
            "upper right" => Ok(LegendPlacement::UpperRight),
            "middle left" | "center left" => Ok(LegendPlacement::MiddleLeft),
            "center" => Ok(LegendPlacement::Center),
            "middle right" | "center right" => Ok(LegendPlacement::MiddleRight),
            "lower left" => Ok(LegendPlacement::LowerLeft),
            "lower center" => Ok(LegendPlacement::LowerCenter),
            "lower right" => Ok(LegendPlacement::LowerRight),
            "above" | "over figure" => Ok(LegendPlacement::Above),
            "none" => Ok(LegendPlacement::Hidden),
            _ => Err(Error::UnsupportedLegend(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub mask: Vec<bool>,
    pub options: LabelOptions,
}

/// Pixel offsets of the chart regions.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    margin: f64,
    title_row: f64,
    /// Top edge of the plotting area.
    top: f64,
    /// Left edge of the plotting area.
    left: f64,
    x_area: f64,
}

/// Grouped bar chart: one group per table row, one coloured bar per series.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub table: Table,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub legend: LegendPlacement,
    pub labels: Option<LabelSpec>,
    /// Space above the tallest bar, as a fraction of its height.
    pub headroom: f64,
}

impl BarChart {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            title: None,
            xlabel: None,
            ylabel: None,
            legend: LegendPlacement::default(),
            labels: None,
            headroom: 0.15,
        }
    }

    /// Value axis from `min(0, lowest value)` to the highest value, both
    /// widened by the headroom. Non-finite values are left out.
    pub fn y_range(&self) -> AxisRange {
        let min = self.table.min_value() * (1.0 + self.headroom);
        let max = self.table.max_value() * (1.0 + self.headroom);
        AxisRange {
            min,
            max: if max > min { max } else { min + 1.0 },
        }
    }

    /// Splits the canvas height into title, legend and label rows above the
    /// plotting area. The label row is sized so that over-figure labels,
    /// which sit `offset_fraction` of the plot height above it, stay on the
    /// canvas.
    fn layout(&self, height: u32, font_px: f64) -> Layout {
        let margin = font_px * 0.5;
        let title_row = if self.title.is_some() { font_px * 1.4 } else { 0.0 };
        let legend_row = if self.legend == LegendPlacement::Above {
            font_px * 1.6
        } else {
            0.0
        };
        let x_area = if self.xlabel.is_some() {
            font_px * 3.0
        } else {
            font_px * 1.6
        };
        let header = margin + title_row + legend_row;
        let label_row = match &self.labels {
            // In-bar labels may still be promoted over the figure.
            Some(spec) if self.needs_label_row() => {
                let f = spec.options.offset_fraction.max(0.0);
                let free = (height as f64 - header - x_area - margin).max(0.0);
                (f * free + font_px * 1.1) / (1.0 + f)
            }
            _ => 0.0,
        };
        Layout {
            margin,
            title_row,
            top: header + label_row,
            left: margin + font_px * 3.5,
            x_area,
        }
    }

    fn label_anchors(&self, axis: &AxisRange) -> Result<Vec<BarLabel>> {
        match &self.labels {
            Some(spec) => compute_labels(&self.table.bars(), &spec.mask, axis, &spec.options),
            None => Ok(Vec::new()),
        }
    }

    fn needs_label_row(&self) -> bool {
        self.labels
            .as_ref()
            .is_some_and(|spec| spec.mask.iter().any(|m| *m))
    }

    fn draw_legend_above<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        layout: &Layout,
        font_px: f64,
    ) -> Result<()> {
        let style = TextStyle::from(("sans-serif", font_px).into_font())
            .pos(Pos::new(HPos::Left, VPos::Center));
        let swatch = (font_px * 0.8) as i32;
        let y = (layout.margin + layout.title_row + font_px * 0.8) as i32;
        let mut x = layout.margin as i32;
        for (idx, name) in self.table.columns.iter().enumerate() {
            root.draw(&Rectangle::new(
                [(x, y - swatch / 2), (x + swatch, y + swatch / 2)],
                series_color(idx).filled(),
            ))
            .map_err(plot_err)?;
            x += swatch + swatch / 2;
            root.draw(&Text::new(name.clone(), (x, y), style.clone()))
                .map_err(plot_err)?;
            let (width, _) = root.estimate_text_size(name, &style).map_err(plot_err)?;
            x += width as i32 + swatch;
        }
        Ok(())
    }
}

impl Figure for BarChart {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        config: &FigureConfig,
    ) -> Result<()> {
        let font_px = config.font_px();
        let axis = self.y_range();
        // Labels are validated before anything is drawn.
        let labels = self.label_anchors(&axis)?;

        root.fill(&WHITE).map_err(plot_err)?;

        let (width, height) = root.dim_in_pixel();
        let layout = self.layout(height, font_px);
        let font = ("sans-serif", font_px).into_font();
        if let Some(title) = &self.title {
            let style = TextStyle::from(font.clone()).pos(Pos::new(HPos::Center, VPos::Top));
            root.draw(&Text::new(
                title.clone(),
                ((width / 2) as i32, layout.margin as i32),
                style,
            ))
            .map_err(plot_err)?;
        }

        let groups = self.table.index.len().max(1) as f64;
        let mut chart = ChartBuilder::on(root)
            .margin(layout.margin as u32)
            .margin_top(layout.top as u32)
            .x_label_area_size(layout.x_area as u32)
            .y_label_area_size((layout.left - layout.margin) as u32)
            .build_cartesian_2d(0f64..groups, axis.min..axis.max)
            .map_err(plot_err)?;

        let no_x_ticks = |_: &f64| String::new();
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .light_line_style(WHITE)
            .bold_line_style(BLACK.mix(0.15))
            .x_label_formatter(&no_x_ticks)
            .label_style(font.clone())
            .axis_desc_style(font.clone());
        if let Some(xlabel) = &self.xlabel {
            mesh.x_desc(xlabel.as_str());
        }
        if let Some(ylabel) = &self.ylabel {
            mesh.y_desc(ylabel.as_str());
        }
        mesh.draw().map_err(plot_err)?;

        let group_style = TextStyle::from(font.clone()).pos(Pos::new(HPos::Center, VPos::Top));
        for (group, name) in self.table.index.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(group as f64 + 0.5, axis.min));
            root.draw(&Text::new(
                name.clone(),
                (px, py + (font_px * 0.3) as i32),
                group_style.clone(),
            ))
            .map_err(plot_err)?;
        }

        let bars = self.table.bars();
        let n_groups = self.table.index.len();
        let swatch = (font_px * 0.4) as i32;
        for (series, name) in self.table.columns.iter().enumerate() {
            let color = series_color(series);
            let series_bars = &bars[series * n_groups..(series + 1) * n_groups];
            chart
                .draw_series(
                    series_bars
                        .iter()
                        .filter(|bar| bar.height.is_finite())
                        .map(|bar| {
                            Rectangle::new(
                                [(bar.x, 0.0), (bar.x + bar.width, bar.height)],
                                color.filled(),
                            )
                        }),
                )
                .map_err(plot_err)?
                .label(name.as_str())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - swatch), (x + 2 * swatch, y + swatch)], color.filled())
                });
        }

        if let Some(position) = self.legend.series_label_position() {
            chart
                .configure_series_labels()
                .position(position)
                .margin((font_px * 0.3) as u32)
                .border_style(BLACK.mix(0.3))
                .background_style(WHITE.mix(0.8))
                .label_font(font.clone())
                .draw()
                .map_err(plot_err)?;
        } else if self.legend == LegendPlacement::Above {
            self.draw_legend_above(root, &layout, font_px)?;
        }

        draw_bar_labels(root, &chart, &labels, font_px * 0.8)
    }
}
