use crate::estimator::EstimationResult;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

/// Everything the polar view shows for one frame.
#[derive(Debug, Clone, Default)]
pub struct PolarView {
    /// Where the source really is, if known (simulations only).
    pub true_bearing: Option<f64>,
    /// The latest estimate, if one has come back yet.
    pub estimate: Option<EstimationResult>,
    /// Free-form status shown under the plot.
    pub status: String,
}

/// Points along the front half of the unit circle, from -90° (left) through
/// broadside to +90° (right).
pub fn semicircle(n: usize) -> Vec<(f64, f64)> {
    let steps = n.max(2) - 1;
    (0..=steps)
        .map(|i| -90.0 + 180.0 * i as f64 / steps as f64)
        .map(|deg: f64| {
            let rad = deg.to_radians();
            (rad.sin(), rad.cos())
        })
        .collect()
}

/// A segment from the array center to the unit circle at `degrees`.
/// Broadside points up the y axis, positive angles lean right.
pub fn bearing_line(degrees: f64) -> [(f64, f64); 2] {
    let rad = degrees.to_radians();
    [(0.0, 0.0), (rad.sin(), rad.cos())]
}

/// Draws the polar plot and a status block into `area`.
pub fn render_polar(f: &mut Frame, area: Rect, view: &PolarView) {
    let [plot_area, text_area] = split(area);

    let arc = semicircle(61);
    let truth = view.true_bearing.map(bearing_line);
    let estimate = view
        .estimate
        .and_then(|e| e.angle_degrees)
        .map(bearing_line);

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::DarkGray))
        .data(&arc)];
    if let Some(points) = &truth {
        datasets.push(
            Dataset::default()
                .name("Source")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(points),
        );
    }
    if let Some(points) = &estimate {
        datasets.push(
            Dataset::default()
                .name("Estimate")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))
                .data(points),
        );
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Direction of Arrival ".magenta().bold())
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::White))
                .bounds([-1.1, 1.1])
                .labels(
                    ["LEFT", "CENTER", "RIGHT"]
                        .iter()
                        .cloned()
                        .map(Span::from)
                        .collect(),
                ),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::White))
                .bounds([0.0, 1.1]),
        );
    f.render_widget(chart, plot_area);

    let paragraph =
        Paragraph::new(status_lines(view)).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, text_area);
}

fn split(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(5)])
        .split(area);
    [chunks[0], chunks[1]]
}

fn status_lines(view: &PolarView) -> Vec<Line<'static>> {
    let estimate = match &view.estimate {
        Some(result) if result.is_valid() => {
            Line::styled(result.to_string(), Style::default().fg(Color::Green))
        }
        Some(result) => {
            Line::styled(result.to_string(), Style::default().fg(Color::Red))
        }
        None => Line::from("Waiting for the first estimate..."),
    };
    let truth = match view.true_bearing {
        Some(bearing) => Line::from(format!("Source at {:.1}°", bearing)),
        None => Line::from(""),
    };
    vec![estimate, truth, Line::from(view.status.clone())]
}
