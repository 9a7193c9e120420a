//! SVG chart rendering for the spending summaries. Every chart is a pure
//! function of report data; nothing here touches the transaction table.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use svg::node::element::path::Data;
use svg::node::element::{Circle, Line, Path as SvgPath, Rectangle, Text};
use svg::Document;
use tracing::info;

use crate::error::Result;
use crate::fmt::{money, percent, truncate};
use crate::reports::{CategoryTotal, MerchantTotal, MonthTotal, SpendingReport, TrendPoint};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 80.0;

const PALETTE: [&str; 9] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f",
];

pub const CATEGORY_PIE: &str = "category_pie.svg";
pub const CATEGORY_BARS: &str = "category_bars.svg";
pub const MONTHLY_BARS: &str = "monthly_spending.svg";
pub const CUMULATIVE_LINE: &str = "cumulative_spending.svg";
pub const TOP_MERCHANTS: &str = "top_merchants.svg";

fn label(x: f64, y: f64, content: &str, size: u32, anchor: &str) -> Text {
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("font-family", "sans-serif")
        .set("font-size", size)
        .set("text-anchor", anchor)
        .add(svg::node::Text::new(content))
}

fn canvas(title: &str) -> Document {
    Document::new()
        .set("viewBox", (0, 0, WIDTH as i32, HEIGHT as i32))
        .set("width", WIDTH)
        .set("height", HEIGHT)
        .add(
            Rectangle::new()
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", "white"),
        )
        .add(label(WIDTH / 2.0, 32.0, title, 20, "middle"))
}

fn axis_line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", "black")
        .set("stroke-width", 1)
}

/// Value range for an axis, always including zero and never empty.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi - lo <= f64::EPSILON {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn vertical_bars(title: &str, labels: &[String], values: &[f64], color: &str, y_desc: &str) -> Document {
    let mut doc = canvas(title);
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let (lo, hi) = value_range(values.iter().copied());
    let to_y = |v: f64| MARGIN_TOP + (hi - v) / (hi - lo) * plot_h;
    let zero_y = to_y(0.0);

    doc = doc
        .add(axis_line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, MARGIN_TOP + plot_h))
        .add(axis_line(MARGIN_LEFT, zero_y, MARGIN_LEFT + plot_w, zero_y))
        .add(label(MARGIN_LEFT - 6.0, to_y(hi) + 4.0, &money(hi), 11, "end"))
        .add(label(MARGIN_LEFT - 6.0, to_y(lo) + 4.0, &money(lo), 11, "end"))
        .add(
            label(20.0, MARGIN_TOP + plot_h / 2.0, y_desc, 12, "middle")
                .set("transform", format!("rotate(-90 20 {})", MARGIN_TOP + plot_h / 2.0)),
        );

    if values.is_empty() {
        return doc;
    }
    let slot = plot_w / values.len() as f64;
    let bar_w = slot * 0.7;
    for (i, (name, &v)) in labels.iter().zip(values).enumerate() {
        let x = MARGIN_LEFT + i as f64 * slot + (slot - bar_w) / 2.0;
        let (top, bottom) = if v >= 0.0 { (to_y(v), zero_y) } else { (zero_y, to_y(v)) };
        let center = x + bar_w / 2.0;
        let label_y = MARGIN_TOP + plot_h + 16.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", top)
                    .set("width", bar_w)
                    .set("height", (bottom - top).max(0.5))
                    .set("fill", color)
                    .set("stroke", "black"),
            )
            .add(
                label(center, label_y, &truncate(name, 16), 11, "end")
                    .set("transform", format!("rotate(-30 {center} {label_y})")),
            );
    }
    doc
}

/// Horizontal bars, one row per category, largest first.
pub fn category_bars(categories: &[CategoryTotal]) -> Document {
    let mut doc = canvas("Spending by Category");
    let left = 140.0;
    let plot_w = WIDTH - left - MARGIN_RIGHT - 60.0;
    let plot_h = HEIGHT - MARGIN_TOP - 40.0;
    let (lo, hi) = value_range(categories.iter().map(|c| c.total));
    let to_x = |v: f64| left + (v - lo) / (hi - lo) * plot_w;
    let zero_x = to_x(0.0);

    doc = doc
        .add(axis_line(zero_x, MARGIN_TOP, zero_x, MARGIN_TOP + plot_h))
        .add(label(left + plot_w / 2.0, HEIGHT - 12.0, "Total Amount Spent ($)", 12, "middle"));

    if categories.is_empty() {
        return doc;
    }
    let slot = plot_h / categories.len() as f64;
    let bar_h = slot * 0.7;
    for (i, cat) in categories.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * slot + (slot - bar_h) / 2.0;
        let (start, end) = if cat.total >= 0.0 {
            (zero_x, to_x(cat.total))
        } else {
            (to_x(cat.total), zero_x)
        };
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", start)
                    .set("y", y)
                    .set("width", (end - start).max(0.5))
                    .set("height", bar_h)
                    .set("fill", "skyblue")
                    .set("stroke", "black"),
            )
            .add(label(left - 8.0, y + bar_h / 2.0 + 4.0, cat.category.label(), 12, "end"))
            .add(label(end + 6.0, y + bar_h / 2.0 + 4.0, &money(cat.total), 11, "start"));
    }
    doc
}

pub fn monthly_bars(months: &[MonthTotal]) -> Document {
    let labels: Vec<String> = months.iter().map(|m| m.month.clone()).collect();
    let values: Vec<f64> = months.iter().map(|m| m.total).collect();
    vertical_bars("Total Spending by Month", &labels, &values, "orange", "Amount ($)")
}

pub fn top_merchant_bars(merchants: &[MerchantTotal]) -> Document {
    let labels: Vec<String> = merchants.iter().map(|m| m.description.clone()).collect();
    let values: Vec<f64> = merchants.iter().map(|m| m.total).collect();
    let title = format!("Top {} Merchants by Total Spend", merchants.len());
    vertical_bars(&title, &labels, &values, "green", "Amount ($)")
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Share of spend per category. Slices need a positive total; refunds and
/// net-negative categories are left out of the pie.
pub fn category_pie(categories: &[CategoryTotal]) -> Document {
    let mut doc = canvas("Spending Distribution by Category");
    let slices: Vec<&CategoryTotal> = categories.iter().filter(|c| c.total > 0.0).collect();
    let sum: f64 = slices.iter().map(|c| c.total).sum();
    if slices.is_empty() {
        return doc;
    }

    let (cx, cy, r) = (300.0, 280.0, 180.0);
    if slices.len() == 1 {
        doc = doc.add(
            Circle::new()
                .set("cx", cx)
                .set("cy", cy)
                .set("r", r)
                .set("fill", PALETTE[0])
                .set("stroke", "white"),
        );
    } else {
        // start at twelve o'clock, clockwise
        let mut angle = -PI / 2.0;
        for (i, slice) in slices.iter().enumerate() {
            let sweep = slice.total / sum * 2.0 * PI;
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if sweep > PI { 1 } else { 0 };
            let d = format!("M {cx} {cy} L {x0:.3} {y0:.3} A {r} {r} 0 {large} 1 {x1:.3} {y1:.3} Z");
            doc = doc.add(
                SvgPath::new()
                    .set("d", d)
                    .set("fill", PALETTE[i % PALETTE.len()])
                    .set("stroke", "white"),
            );
            angle = end;
        }
    }

    for (i, slice) in slices.iter().enumerate() {
        let y = 120.0 + i as f64 * 24.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", 540.0)
                    .set("y", y - 12.0)
                    .set("width", 14)
                    .set("height", 14)
                    .set("fill", PALETTE[i % PALETTE.len()]),
            )
            .add(label(
                562.0,
                y,
                &format!("{} ({})", slice.category.label(), percent(slice.total, sum)),
                13,
                "start",
            ));
    }
    doc
}

// ---------------------------------------------------------------------------
// Cumulative line
// ---------------------------------------------------------------------------

pub fn cumulative_line(trend: &[TrendPoint]) -> Document {
    let mut doc = canvas("Cumulative Spending Over Time");
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let (lo, hi) = value_range(trend.iter().map(|p| p.cumulative));
    let to_y = |v: f64| MARGIN_TOP + (hi - v) / (hi - lo) * plot_h;

    doc = doc
        .add(axis_line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, MARGIN_TOP + plot_h))
        .add(axis_line(MARGIN_LEFT, MARGIN_TOP + plot_h, MARGIN_LEFT + plot_w, MARGIN_TOP + plot_h))
        .add(label(MARGIN_LEFT - 6.0, to_y(hi) + 4.0, &money(hi), 11, "end"))
        .add(label(MARGIN_LEFT - 6.0, to_y(lo) + 4.0, &money(lo), 11, "end"));

    let (Some(first), Some(last)) = (trend.first(), trend.last()) else {
        return doc;
    };
    let span = (last.date - first.date).num_days().max(1) as f64;
    let to_x = |p: &TrendPoint| MARGIN_LEFT + (p.date - first.date).num_days() as f64 / span * plot_w;

    let mut data = Data::new().move_to((to_x(first), to_y(first.cumulative)));
    for p in &trend[1..] {
        data = data.line_to((to_x(p), to_y(p.cumulative)));
    }
    doc = doc.add(
        SvgPath::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", "purple")
            .set("stroke-width", 2),
    );
    for p in trend {
        doc = doc.add(
            Circle::new()
                .set("cx", to_x(p))
                .set("cy", to_y(p.cumulative))
                .set("r", 3)
                .set("fill", "purple"),
        );
    }
    let axis_y = MARGIN_TOP + plot_h + 18.0;
    doc.add(label(MARGIN_LEFT, axis_y, &first.date.to_string(), 11, "start"))
        .add(label(MARGIN_LEFT + plot_w, axis_y, &last.date.to_string(), 11, "end"))
}

/// Write all five charts into `dir`, returning the written paths.
pub fn write_charts(report: &SpendingReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let charts = [
        (CATEGORY_PIE, category_pie(&report.categories)),
        (CATEGORY_BARS, category_bars(&report.categories)),
        (MONTHLY_BARS, monthly_bars(&report.months)),
        (CUMULATIVE_LINE, cumulative_line(&report.trend)),
        (TOP_MERCHANTS, top_merchant_bars(&report.merchants)),
    ];
    let mut written = Vec::with_capacity(charts.len());
    for (name, doc) in charts {
        let path = dir.join(name);
        svg::save(&path, &doc)?;
        info!(path = %path.display(), "wrote chart");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Category;
    use crate::models::Transaction;
    use crate::reports::build_report;
    use chrono::NaiveDate;

    fn report() -> SpendingReport {
        let rows: Vec<Transaction> = [
            ("2024-01-01", "Uber Eats Order", 15.50, Category::Food),
            ("2024-01-03", "Amazon.com", 42.00, Category::Shopping),
            ("2024-02-01", "Netflix", 12.99, Category::Entertainment),
            ("2024-02-03", "Amazon refund", -20.00, Category::Shopping),
        ]
        .iter()
        .map(|(d, desc, amt, cat)| {
            let mut t = Transaction::new(
                NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                *desc,
                *amt,
            );
            t.category = Some(*cat);
            t.cluster = Some(0);
            t
        })
        .collect();
        build_report(&rows, 5)
    }

    fn count(doc: &Document, needle: &str) -> usize {
        doc.to_string().matches(needle).count()
    }

    #[test]
    fn test_pie_has_one_slice_per_positive_category() {
        let doc = category_pie(&report().categories);
        assert_eq!(count(&doc, "<path"), 3);
        assert!(doc.to_string().contains("Spending Distribution by Category"));
    }

    #[test]
    fn test_pie_skips_negative_categories() {
        let cats = vec![
            CategoryTotal { category: Category::Food, total: 10.0, count: 1 },
            CategoryTotal { category: Category::Other, total: -5.0, count: 1 },
        ];
        let doc = category_pie(&cats);
        // a lone positive slice is drawn as a full circle
        assert_eq!(count(&doc, "<path"), 0);
        assert_eq!(count(&doc, "<circle"), 1);
        assert!(!doc.to_string().contains("Other"));
    }

    #[test]
    fn test_bar_charts_draw_a_bar_per_item() {
        let r = report();
        // one background rect per canvas plus one per bar
        assert_eq!(count(&category_bars(&r.categories), "<rect"), 1 + r.categories.len());
        assert_eq!(count(&monthly_bars(&r.months), "<rect"), 1 + r.months.len());
        assert_eq!(count(&top_merchant_bars(&r.merchants), "<rect"), 1 + r.merchants.len());
    }

    #[test]
    fn test_cumulative_line_marks_every_date() {
        let r = report();
        let doc = cumulative_line(&r.trend);
        assert_eq!(count(&doc, "<circle"), r.trend.len());
        assert!(doc.to_string().contains("2024-02-03"));
    }

    #[test]
    fn test_empty_report_still_renders() {
        let empty = build_report(&[], 5);
        for doc in [
            category_pie(&empty.categories),
            category_bars(&empty.categories),
            monthly_bars(&empty.months),
            cumulative_line(&empty.trend),
            top_merchant_bars(&empty.merchants),
        ] {
            assert!(doc.to_string().contains("<svg"));
        }
    }

    #[test]
    fn test_write_charts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_charts(&report(), &dir.path().join("charts")).unwrap();
        assert_eq!(paths.len(), 5);
        for p in &paths {
            assert!(p.exists());
        }
    }
}
