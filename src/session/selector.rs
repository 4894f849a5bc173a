use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;

/// Show a selection UI over session summaries; returns the chosen index
pub fn select_session(title: &str, summaries: Vec<String>) -> Result<Option<usize>> {
    if summaries.is_empty() {
        println!("No saved sessions.");
        return Ok(None);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut selector = SessionSelector {
        title: title.to_string(),
        summaries,
        selected: 0,
    };

    let result = run_selector(&mut terminal, &mut selector);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

struct SessionSelector {
    title: String,
    summaries: Vec<String>,
    selected: usize,
}

impl SessionSelector {
    fn handle_key(&mut self, code: KeyCode) -> Option<Option<usize>> {
        let last = self.summaries.len().saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(None),
            KeyCode::Enter => return Some(Some(self.selected)),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = last,
            _ => {}
        }
        None
    }
}

fn run_selector(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    selector: &mut SessionSelector,
) -> Result<Option<usize>> {
    loop {
        terminal.draw(|f| render_selector(f, selector))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(choice) = selector.handle_key(key.code) {
                return Ok(choice);
            }
        }
    }
}

fn render_selector(f: &mut Frame, selector: &SessionSelector) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new(selector.title.as_str())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" askgpt - Sessions "));
    f.render_widget(title, chunks[0]);

    let items: Vec<ListItem> = selector
        .summaries
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            let style = if i == selector.selected {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let label = if summary.is_empty() { "(new session)" } else { summary.as_str() };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>3}  ", i), style.fg(Color::Gray)),
                Span::styled(label.to_string(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Most recent first "),
    );
    f.render_widget(list, chunks[1]);

    let help = vec![Line::from(vec![
        Span::raw("Up/k: Up  Down/j: Down  "),
        Span::styled("Enter", Style::default().fg(Color::Green)),
        Span::raw(": Select  "),
        Span::styled("q/Esc", Style::default().fg(Color::Red)),
        Span::raw(": Cancel"),
    ])];
    let help_widget = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help_widget, chunks[2]);
}
