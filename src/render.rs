use crate::{min_and_max, suitable_uptime_fmt, FanLogError, FanSeries, TimestampLabels};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const PLOT_WIDTH: u32 = 3000;
pub const PLOT_HEIGHT: u32 = 1500;

const STEELBLUE: RGBColor = RGBColor(70, 130, 180);
const DARKSEAGREEN: RGBColor = RGBColor(143, 188, 143);
const DARKORANGE: RGBColor = RGBColor(255, 140, 0);
const INDIGO: RGBColor = RGBColor(75, 0, 130);
const GRID: RGBColor = RGBColor(150, 150, 150);

const LINE_WIDTH: u32 = 2;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// axis bounds and drawn points stay within this, plotters tick computation overflows near i64::MAX
const AXIS_LIMIT: i64 = i64::MAX / 16;

fn clamp_axis(v: i64) -> i64 {
    v.clamp(-AXIS_LIMIT, AXIS_LIMIT)
}

/// range of the values with a 10% margin on each side, never empty
fn padded_range(lo: i64, hi: i64) -> std::ops::Range<i64> {
    let (lo, hi) = (clamp_axis(lo), clamp_axis(hi));
    let margin = ((hi - lo) / 10).max(1);
    (lo - margin)..(hi + margin)
}

fn x_labeller(series: &FanSeries, labels: TimestampLabels) -> (Box<dyn Fn(&i64) -> String>, String) {
    match labels {
        TimestampLabels::Raw => (Box::new(|x: &i64| x.to_string()), "Timestamp".to_string()),
        TimestampLabels::Uptime => {
            let (first, last) = min_and_max(&series.timestamp[..]).unwrap_or((0, 0));
            let xfmt = suitable_uptime_fmt(chrono::Duration::milliseconds(last.saturating_sub(first)));
            (
                Box::new(move |x: &i64| xfmt.format(*x)),
                format!("Timestamp [{}]", xfmt.desc()),
            )
        }
    }
}

/// draws the given channels over the timestamp on one panel
fn draw_panel(
    area: &Panel,
    series: &FanSeries,
    labels: TimestampLabels,
    y_desc: &str,
    channels: &[(&str, &[i64], RGBColor)],
) -> Result<(), Box<dyn std::error::Error>> {
    let (xmin, xmax) = min_and_max(&series.timestamp[..]).ok_or("empty series")?;
    let (mut ymin, mut ymax) = (i64::MAX, i64::MIN);
    for (_, values, _) in channels {
        if let Some((lo, hi)) = min_and_max(&values[..]) {
            ymin = ymin.min(lo);
            ymax = ymax.max(hi);
        }
    }
    let (x_fmt, x_desc) = x_labeller(series, labels);

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(120)
        .build_cartesian_2d(padded_range(xmin, xmax), padded_range(ymin, ymax))?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(GRID.stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 28))
        .x_labels(14)
        .x_label_formatter(&|x: &i64| x_fmt(x))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    for (label, values, color) in channels {
        let color = *color;
        chart
            .draw_series(LineSeries::new(
                series
                    .timestamp
                    .iter()
                    .zip(values.iter())
                    .map(|(x, y)| (clamp_axis(*x), clamp_axis(*y))),
                color.stroke_width(LINE_WIDTH),
            ))?
            .label(*label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(LINE_WIDTH))
            });
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 28))
        .draw()?;
    Ok(())
}

impl FanSeries {
    /// plots the fan report to png: pwm, setpoint and rpm on top, the gap below
    pub fn plot_png(&self, fout: &Path, labels: TimestampLabels) -> Result<(), FanLogError> {
        if self.is_empty() {
            return Err(FanLogError::EmptySeries {
                fan_id: self.fan_id,
            });
        }
        self.draw_report(fout, labels)
            .map_err(|e| FanLogError::Render {
                path: fout.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn draw_report(
        &self,
        fout: &Path,
        labels: TimestampLabels,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(fout, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(&format!("REPORT FAN {}", self.fan_id), ("sans-serif", 40))?;
        let panels = root.split_evenly((2, 1));
        draw_panel(
            &panels[0],
            self,
            labels,
            "Value",
            &[
                ("tfs: PWM-Signal to fan", &self.pwm[..], STEELBLUE),
                ("ssf: Setpoint speed fan", &self.setpoint[..], DARKSEAGREEN),
                ("rpm: Revolutions per minute", &self.rpm[..], DARKORANGE),
            ],
        )?;
        draw_panel(
            &panels[1],
            self,
            labels,
            "Gap between rpm and ssf",
            &[("GAP = rpm - ssf", &self.gap[..], INDIGO)],
        )?;
        root.present()?;
        Ok(())
    }
}
