//! Terminal rendering of the progress chart.

use chrono::NaiveDate;
use std::io::{self, Write};
use weightlog_core::{format_user_date, ChartSpec};

const ACTUAL_MARK: char = 'o';
const PROJECTION_MARK: char = '.';
const GOAL_MARK: char = '-';
const AXIS_GUTTER: usize = 8;

/// Fixed-size character grid plotter.
#[derive(Debug, Clone, Copy)]
pub struct TextChart {
    width: usize,
    height: usize,
}

impl Default for TextChart {
    fn default() -> Self {
        Self::new(60, 15)
    }
}

impl TextChart {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
        }
    }

    pub fn render(&self, spec: &ChartSpec, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", spec.title)?;

        let dates = spec
            .actual
            .points
            .iter()
            .chain(&spec.projection.points)
            .map(|(date, _)| *date);
        let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
            writeln!(out, "(nothing to plot)")?;
            return Ok(());
        };

        let goal = spec.goal_line.weight;
        let (mut low, mut high) = spec
            .actual
            .points
            .iter()
            .chain(&spec.projection.points)
            .fold((goal, goal), |(low, high), (_, weight)| {
                (low.min(*weight), high.max(*weight))
            });
        if high - low < f64::EPSILON {
            low -= 0.5;
            high += 0.5;
        }

        let scale = Scale {
            first,
            span_days: (last - first).num_days().max(1) as f64,
            low,
            high,
            width: self.width,
            height: self.height,
        };

        let mut grid = vec![vec![' '; self.width]; self.height];
        let goal_row = scale.row(goal);
        grid[goal_row].iter_mut().for_each(|cell| *cell = GOAL_MARK);
        for (date, weight) in &spec.projection.points {
            grid[scale.row(*weight)][scale.column(*date)] = PROJECTION_MARK;
        }
        for (date, weight) in &spec.actual.points {
            grid[scale.row(*weight)][scale.column(*date)] = ACTUAL_MARK;
        }

        for (index, row) in grid.iter().enumerate() {
            let label = match index {
                0 => format!("{high:.1}"),
                i if i == self.height - 1 => format!("{low:.1}"),
                i if i == goal_row => format!("{goal:.1}"),
                _ => String::new(),
            };
            let line: String = row.iter().collect();
            writeln!(out, "{label:>AXIS_GUTTER$}|{}", line.trim_end())?;
        }

        writeln!(out, "{:>AXIS_GUTTER$}+{}", "", "-".repeat(self.width))?;
        let first_label = format_user_date(first);
        let last_label = format_user_date(last);
        let gap = self
            .width
            .saturating_sub(first_label.len() + last_label.len())
            .max(1);
        writeln!(
            out,
            "{:>AXIS_GUTTER$} {first_label}{}{last_label}",
            "",
            " ".repeat(gap)
        )?;
        writeln!(out, "x: {}  y: {}", spec.x_label, spec.y_label)?;
        writeln!(
            out,
            "{ACTUAL_MARK} {}   {PROJECTION_MARK} {}   {GOAL_MARK} {}",
            spec.actual.label, spec.projection.label, spec.goal_line.label
        )?;
        writeln!(out, "{}", spec.caption)
    }
}

struct Scale {
    first: NaiveDate,
    span_days: f64,
    low: f64,
    high: f64,
    width: usize,
    height: usize,
}

impl Scale {
    fn column(&self, date: NaiveDate) -> usize {
        let ratio = (date - self.first).num_days() as f64 / self.span_days;
        ((ratio * (self.width - 1) as f64).round() as usize).min(self.width - 1)
    }

    fn row(&self, weight: f64) -> usize {
        let ratio = (self.high - weight) / (self.high - self.low);
        ((ratio * (self.height - 1) as f64).round() as usize).min(self.height - 1)
    }
}
