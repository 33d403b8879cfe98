//! Value labels above bars.
//!
//! A mask holds one entry per block of contiguous bars. The mask is
//! broadcast by block (`full[i] == mask[i / factor]`), never interleaved.

use std::str::FromStr;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Left edge in data coordinates.
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

impl Bar {
    pub fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Visible range of the value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Every label sits at the same height above the plotting area.
    #[default]
    OverFigure,
    /// Labels sit on top of their bar unless that collides with the axis top.
    InBar,
}

impl FromStr for LabelMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "over" | "over-figure" => Ok(LabelMode::OverFigure),
            "in-bar" | "bar" => Ok(LabelMode::InBar),
            other => Err(Error::InvalidValue(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelOptions {
    pub mode: LabelMode,
    /// The printed value is rounded to this many decimal places and then
    /// written in its shortest form, so `2.0` stays `2.0` at any precision.
    pub precision: usize,
    pub suffix: String,
    /// Over-figure offset as a fraction of the axis span.
    pub offset_fraction: f64,
    /// In-bar labels closer than this fraction of the span to the axis top
    /// are moved over the figure.
    pub tolerance_fraction: f64,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            mode: LabelMode::OverFigure,
            precision: 1,
            suffix: "x".to_string(),
            offset_fraction: 0.10,
            tolerance_fraction: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

pub fn expand_mask(mask: &[bool], bar_count: usize) -> Result<Vec<bool>> {
    if mask.is_empty() || bar_count % mask.len() != 0 {
        return Err(Error::MaskMismatch {
            bars: bar_count,
            mask: mask.len(),
        });
    }
    let factor = bar_count / mask.len();
    Ok((0..bar_count).map(|i| mask[i / factor]).collect())
}

fn label_y(bar: &Bar, axis: &AxisRange, opts: &LabelOptions) -> f64 {
    let offset = opts.offset_fraction * axis.span();
    let over_figure = axis.max + offset;
    match opts.mode {
        LabelMode::OverFigure => over_figure,
        LabelMode::InBar => {
            let y = bar.height + offset / 2.0;
            let tolerance = opts.tolerance_fraction * axis.span();
            if y >= axis.max - tolerance {
                over_figure
            } else {
                y
            }
        }
    }
}

fn label_text(height: f64, opts: &LabelOptions) -> String {
    let scale = 10f64.powi(opts.precision.min(15) as i32);
    let rounded = (height * scale).round() / scale;
    format!("{:?}{}", rounded, opts.suffix)
}

/// Computes the labels of the bars selected by `mask`.
///
/// The mask is validated before anything is produced, so a mismatch never
/// yields a partial set of labels. Bars without a finite height get none.
pub fn compute_labels(
    bars: &[Bar],
    mask: &[bool],
    axis: &AxisRange,
    opts: &LabelOptions,
) -> Result<Vec<BarLabel>> {
    let full_mask = expand_mask(mask, bars.len())?;
    Ok(bars
        .iter()
        .zip(full_mask)
        .filter(|(bar, selected)| *selected && bar.height.is_finite())
        .map(|(bar, _)| BarLabel {
            x: bar.center(),
            y: label_y(bar, axis, opts),
            text: label_text(bar.height, opts),
        })
        .collect())
}

/// Draws labels centred on their anchor. Text goes onto the root area so
/// labels above the plotting area are not clipped.
pub fn draw_bar_labels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    labels: &[BarLabel],
    font_px: f64,
) -> Result<()> {
    let style = TextStyle::from(("sans-serif", font_px).into_font())
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    for label in labels {
        let anchor = chart.backend_coord(&(label.x, label.y));
        root.draw(&Text::new(label.text.clone(), anchor, style.clone()))
            .map_err(plot_err)?;
    }
    Ok(())
}
