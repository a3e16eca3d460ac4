use std::path::Path;

use eyre::ensure;
use plotters::{coord::Shift, prelude::*};

use crate::metrics::ScaleMetrics;

/// The width in pixels to allocate for each panel of the chart
static PANEL_WIDTH: usize = 700;

/// The height in pixels to allocate for each panel of the chart
static PANEL_HEIGHT: usize = 600;

/// Render the two-panel scale chart, GET on the left and POST on the right
pub fn plot_results(result: &ScaleMetrics, path: &Path) -> eyre::Result<()> {
    ensure!(
        !result.n_clusters.is_empty(),
        "No batches to plot: run the scale test with at least one batch size"
    );

    let root_drawing_area = BitMapBackend::new(
        path,
        ((PANEL_WIDTH * 2) as u32, PANEL_HEIGHT as u32),
    )
    .into_drawing_area();

    root_drawing_area.fill(&WHITE)?;

    let panels = root_drawing_area.split_evenly((1, 2));

    graph_timings(
        "GET Request Performance",
        result.n_clusters.as_slice(),
        &result.get_average,
        &result.get_min,
        &result.get_max,
        &result.get_std,
        BLUE,
        &panels[0],
    )?;
    graph_timings(
        "POST Request Performance",
        result.n_clusters.as_slice(),
        &result.post_average,
        &result.post_min,
        &result.post_max,
        &result.post_std,
        // Orange
        RGBColor(255, 165, 0),
        &panels[1],
    )?;

    root_drawing_area.present()?;

    Ok(())
}

/// Log-axis bounds covering every tested batch size, whatever order the
/// sizes were given in
fn axis_range(sizes: &[usize]) -> (f64, f64) {
    let x_min = sizes.iter().copied().min().unwrap_or(1) as f64;
    // Keep the log axis non-degenerate when only one batch size was tested
    let x_max = (sizes.iter().copied().max().unwrap_or(1) as f64).max(x_min * 10.);
    (x_min, x_max)
}

/// Draw one panel: average line with point markers, a shaded min-max band,
/// and std-dev error bars, over a log-scale batch-size axis
fn graph_timings<T: DrawingBackend>(
    title: &str,
    sizes: &[usize],
    average: &[f64],
    min: &[f64],
    max: &[f64],
    std: &[f64],
    color: RGBColor,
    drawing_area: &DrawingArea<T, Shift>,
) -> eyre::Result<()>
where
    T::ErrorType: 'static,
{
    let (x_min, x_max) = axis_range(sizes);

    let y_max = max
        .iter()
        .zip(std)
        .map(|(m, s)| m + s)
        .fold(f64::EPSILON, f64::max);

    let mut chart = ChartBuilder::on(drawing_area)
        .caption(title, ("Sans", 20))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .margin(10)
        .build_cartesian_2d((x_min..x_max).log_scale(), 0f64..y_max * 1.1)?;

    chart
        .configure_mesh()
        .axis_desc_style(("Sans", 15))
        .x_desc("Number of Clusters")
        .y_desc("Time (seconds)")
        .light_line_style(&TRANSPARENT)
        .draw()?;

    // Shaded min-max band: the max curve followed by the min curve reversed
    let mut band: Vec<(f64, f64)> = sizes
        .iter()
        .zip(max)
        .map(|(&n, &t)| (n as f64, t))
        .collect();
    band.extend(sizes.iter().zip(min).map(|(&n, &t)| (n as f64, t)).rev());

    chart
        .draw_series(std::iter::once(Polygon::new(band, &color.mix(0.2))))?
        .label("Min-Max Range")
        .legend(move |(x, y)| {
            Rectangle::new([(x - 5, y - 5), (x + 5, y + 5)], color.mix(0.2).filled())
        });

    // Average line with point markers
    let averages: Vec<(f64, f64)> = sizes
        .iter()
        .zip(average)
        .map(|(&n, &t)| (n as f64, t))
        .collect();

    chart
        .draw_series(LineSeries::new(
            averages.iter().copied(),
            color.stroke_width(2),
        ))?
        .label("Average")
        .legend(move |(x, y)| PathElement::new(vec![(x - 5, y), (x + 5, y)], color));
    chart.draw_series(
        averages
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
    )?;

    // Std-dev error bars centered on the averages
    chart
        .draw_series(sizes.iter().zip(average).zip(std).map(|((&n, &avg), &std)| {
            ErrorBar::new_vertical(n as f64, avg - std, avg, avg + std, RED.mix(0.5).filled(), 10)
        }))?
        .label("Std Dev")
        .legend(|(x, y)| PathElement::new(vec![(x - 5, y), (x + 5, y)], RED.mix(0.5).filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}
