use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::{DefaultTerminal, Frame};

use crate::categorizer::Category;
use crate::error::Result;
use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const STATUS_STYLE: Style = Style::new().fg(Color::Yellow);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Amount as a colored span: red for spend, green for money coming back.
/// Exports use positive numbers for spend, so positive is red here.
pub fn amount_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_POS_STYLE
    } else {
        AMOUNT_NEG_STYLE
    };
    Span::styled(money(amount), style)
}

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Food => Color::Rgb(242, 142, 43),
        Category::Groceries => Color::Rgb(89, 161, 79),
        Category::Rent => Color::Rgb(225, 87, 89),
        Category::Entertainment => Color::Rgb(176, 122, 161),
        Category::Utilities => Color::Rgb(118, 183, 178),
        Category::Transport => Color::Rgb(78, 121, 167),
        Category::Shopping => Color::Rgb(237, 201, 72),
        Category::Travel => Color::Rgb(255, 157, 167),
        Category::Other => Color::Gray,
    }
}

pub enum ViewAction {
    Continue,
    Close,
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Ctrl-C closes any view; key releases and repeats are ignored.
fn dispatch(view: &mut dyn View, key: KeyEvent) -> ViewAction {
    if key.kind != KeyEventKind::Press {
        return ViewAction::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return ViewAction::Close;
    }
    view.handle_key(key.code)
}

fn event_loop(terminal: &mut DefaultTerminal, view: &mut dyn View) -> Result<()> {
    loop {
        terminal.draw(|frame| view.draw(frame))?;
        if let Event::Key(key) = event::read()? {
            if let ViewAction::Close = dispatch(view, key) {
                return Ok(());
            }
        }
    }
}

/// Run an interactive view until it asks to close. The terminal is restored on
/// exit and on panic.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, view);
    ratatui::restore();
    result
}
