use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table, TableState,
    },
    Frame,
};

use crate::cli::export::default_export_path;
use crate::cli::ClusterArgs;
use crate::error::{Result, SpyError};
use crate::export::export_to_path;
use crate::fmt::{money, truncate};
use crate::models::TransactionTable;
use crate::pipeline::analyze_path;
use crate::reports::{build_report, SpendingReport, TrendPoint};
use crate::settings::Settings;
use crate::tui::{
    amount_span, category_color, run_view, View, ViewAction, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE, STATUS_STYLE,
};

const PAGE: usize = 10;

#[derive(Clone, Copy, PartialEq, Debug)]
enum ChartPage {
    Categories,
    Trends,
}

struct Dashboard {
    title: String,
    table: TransactionTable,
    report: SpendingReport,
    n_clusters: usize,
    state: TableState,
    page: ChartPage,
    export_path: PathBuf,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(title: String, table: TransactionTable, n_clusters: usize, top_n: usize, export_path: PathBuf) -> Self {
        let report = build_report(&table.rows, top_n);
        let selected = if table.is_empty() { None } else { Some(0) };
        Self {
            title,
            table,
            report,
            n_clusters,
            state: TableState::default().with_selected(selected),
            page: ChartPage::Categories,
            export_path,
            status_message: None,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.table.is_empty() {
            return;
        }
        let last = self.table.len() - 1;
        let current = self.state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.state.select(Some(next));
    }

    fn export(&mut self) {
        self.status_message = Some(match export_to_path(&self.table, &self.export_path) {
            Ok(()) => format!("Wrote {}", self.export_path.display()),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    fn draw_transactions(&mut self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .table
            .rows
            .iter()
            .map(|t| {
                let category = t.category.map(|c| {
                    Span::styled(c.label(), Style::default().fg(category_color(c)))
                });
                Row::new(vec![
                    Cell::from(t.date.to_string()),
                    Cell::from(truncate(&t.description, 40)),
                    Cell::from(amount_span(t.amount)),
                    Cell::from(category.unwrap_or_default()),
                    Cell::from(t.cluster.map(|c| c.to_string()).unwrap_or_default()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(13),
            Constraint::Length(7),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Date", "Description", "Amount", "Category", "Cluster"]).style(HEADER_STYLE))
            .row_highlight_style(SELECTED_STYLE)
            .block(Block::default().title("Categorized Transactions").borders(Borders::ALL));
        frame.render_stateful_widget(table, area, &mut self.state);
    }

    fn draw_category_bars(&self, frame: &mut Frame, area: Rect) {
        let bars: Vec<Bar> = self
            .report
            .categories
            .iter()
            .map(|c| {
                Bar::default()
                    .label(Line::from(c.category.label()))
                    .value(c.total.max(0.0).round() as u64)
                    .text_value(money(c.total))
                    .style(Style::default().fg(category_color(c.category)))
            })
            .collect();
        let chart = BarChart::default()
            .block(Block::default().title("Spending by Category").borders(Borders::ALL))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_monthly_bars(&self, frame: &mut Frame, area: Rect) {
        let bars: Vec<Bar> = self
            .report
            .months
            .iter()
            .map(|m| {
                Bar::default()
                    .label(Line::from(m.month.as_str()))
                    .value(m.total.max(0.0).round() as u64)
                    .text_value(money(m.total))
                    .style(Style::default().fg(Color::Rgb(242, 142, 43)))
            })
            .collect();
        let chart = BarChart::default()
            .block(Block::default().title("Total Spending by Month").borders(Borders::ALL))
            .bar_width(9)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_cumulative(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Cumulative Spending").borders(Borders::ALL);
        let (Some(first), Some(last)) = (self.report.trend.first(), self.report.trend.last()) else {
            frame.render_widget(block, area);
            return;
        };
        let day = |p: &TrendPoint| (p.date - first.date).num_days() as f64;
        let cumulative: Vec<(f64, f64)> =
            self.report.trend.iter().map(|p| (day(p), p.cumulative)).collect();
        let daily: Vec<(f64, f64)> = self.report.trend.iter().map(|p| (day(p), p.daily)).collect();
        let x_max = (last.date - first.date).num_days().max(1) as f64;
        let (y_min, y_max) = cumulative
            .iter()
            .chain(&daily)
            .fold((0.0_f64, 0.0_f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        let y_max = if y_max - y_min <= f64::EPSILON { y_min + 1.0 } else { y_max };

        let datasets = vec![
            Dataset::default()
                .name("cumulative")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Magenta))
                .data(&cumulative),
            Dataset::default()
                .name("daily")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Cyan))
                .data(&daily),
        ];
        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .bounds([0.0, x_max])
                    .labels(vec![
                        Span::styled(first.date.to_string(), FOOTER_STYLE),
                        Span::styled(last.date.to_string(), FOOTER_STYLE),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Span::styled(money(y_min), FOOTER_STYLE),
                        Span::styled(money(y_max), FOOTER_STYLE),
                    ]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_top_merchants(&self, frame: &mut Frame, area: Rect) {
        let name_width = self
            .report
            .merchants
            .iter()
            .map(|m| m.description.chars().count().min(28))
            .max()
            .unwrap_or(10);
        let lines: Vec<Line> = self
            .report
            .merchants
            .iter()
            .map(|m| {
                Line::from(vec![
                    Span::raw(format!(" {:<width$}  ", truncate(&m.description, 28), width = name_width)),
                    amount_span(m.total),
                    Span::styled(format!("  ×{}", m.count), FOOTER_STYLE),
                ])
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().title("Top Merchants").borders(Borders::ALL)),
            area,
        );
    }
}

impl View for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, table_area, charts_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(14),
            Constraint::Length(1),
        ])
        .areas(area);

        let header = Line::from(vec![
            Span::styled(format!(" SpendingSpy: {}  ", self.title), HEADER_STYLE),
            Span::raw(format!("{} transactions  ", self.table.len())),
            Span::raw("total "),
            amount_span(self.table.total()),
            Span::raw(format!("  {} clusters", self.n_clusters)),
        ]);
        frame.render_widget(Paragraph::new(header), header_area);

        self.draw_transactions(frame, table_area);

        let [left, right] = Layout::horizontal([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .areas(charts_area);
        match self.page {
            ChartPage::Categories => {
                self.draw_category_bars(frame, left);
                self.draw_monthly_bars(frame, right);
            }
            ChartPage::Trends => {
                self.draw_cumulative(frame, left);
                self.draw_top_merchants(frame, right);
            }
        }

        let hints = match &self.status_message {
            Some(msg) => Paragraph::new(format!(" {msg}")).style(STATUS_STYLE),
            None => Paragraph::new(" Up/Down=scroll  Tab=charts  e=export CSV  q=quit")
                .style(FOOTER_STYLE.add_modifier(Modifier::ITALIC)),
        };
        frame.render_widget(hints, hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Close,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(PAGE as isize),
            KeyCode::PageUp => self.move_selection(-(PAGE as isize)),
            KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::End => self.move_selection(isize::MAX),
            KeyCode::Tab => {
                self.page = match self.page {
                    ChartPage::Categories => ChartPage::Trends,
                    ChartPage::Trends => ChartPage::Categories,
                };
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        ViewAction::Continue
    }
}

pub fn run(file: &Path, cluster: &ClusterArgs, settings: &Settings) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        return Err(SpyError::Other(
            "the dashboard needs an interactive terminal; try `spendingspy analyze`".into(),
        ));
    }
    let analysis = analyze_path(file, &settings.keyword_table(), &cluster.params(settings))?;
    let title = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    let mut dashboard = Dashboard::new(
        title,
        analysis.table,
        analysis.model.n_clusters,
        settings.top_merchants,
        default_export_path(settings),
    );
    run_view(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::KeywordTable;
    use crate::cluster::ClusterParams;
    use crate::pipeline::analyze_stream;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::io::Cursor;

    fn dashboard(export_path: PathBuf) -> Dashboard {
        let mut cursor = Cursor::new(
            b"date,description,amount\n\
              2024-01-01,Uber Eats Order,15.50\n\
              2024-01-03,Amazon.com,42.00\n\
              2024-02-01,Netflix,12.99\n"
                .to_vec(),
        );
        let analysis =
            analyze_stream(&mut cursor, &KeywordTable::default(), &ClusterParams::default())
                .unwrap();
        Dashboard::new(
            "sample.csv".into(),
            analysis.table,
            analysis.model.n_clusters,
            5,
            export_path,
        )
    }

    fn render(d: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| d.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_renders_table_and_charts() {
        let mut d = dashboard(PathBuf::from("unused.csv"));
        let screen = render(&mut d);
        assert!(screen.contains("SpendingSpy: sample.csv"));
        assert!(screen.contains("Uber Eats Order"));
        assert!(screen.contains("Spending by Category"));
        assert!(screen.contains("Total Spending by Month"));
    }

    #[test]
    fn test_tab_switches_chart_page() {
        let mut d = dashboard(PathBuf::from("unused.csv"));
        d.handle_key(KeyCode::Tab);
        assert_eq!(d.page, ChartPage::Trends);
        let screen = render(&mut d);
        assert!(screen.contains("Cumulative Spending"));
        assert!(screen.contains("Top Merchants"));
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut d = dashboard(PathBuf::from("unused.csv"));
        d.handle_key(KeyCode::End);
        assert_eq!(d.state.selected(), Some(2));
        d.handle_key(KeyCode::Down);
        assert_eq!(d.state.selected(), Some(2));
        d.handle_key(KeyCode::Home);
        assert_eq!(d.state.selected(), Some(0));
        d.handle_key(KeyCode::Up);
        assert_eq!(d.state.selected(), Some(0));
    }

    #[test]
    fn test_export_key_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categorized_output.csv");
        let mut d = dashboard(path.clone());
        d.handle_key(KeyCode::Char('e'));
        assert!(path.exists());
        assert!(d.status_message.as_deref().unwrap().starts_with("Wrote"));
    }

    #[test]
    fn test_quit_keys_close() {
        let mut d = dashboard(PathBuf::from("unused.csv"));
        assert!(matches!(d.handle_key(KeyCode::Char('q')), ViewAction::Close));
        assert!(matches!(d.handle_key(KeyCode::Esc), ViewAction::Close));
    }
}
