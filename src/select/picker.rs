// Full-screen list picker drawn on stderr
use super::Chooser;
use crate::error::{AwswError, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io::{self, IsTerminal, Stderr};

/// Chooser that takes over the terminal until the operator picks or aborts.
///
/// Drawing happens on stderr so stdout stays clean for `eval "$(awsw login)"`.
pub struct TerminalPicker;

impl Chooser for TerminalPicker {
    fn choose(&self, prompt: &str, options: &[String]) -> Result<Option<usize>> {
        if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
            return Err(AwswError::Terminal(format!(
                "{} needs an interactive terminal; pass --account/--role to select by name",
                prompt.trim_end_matches(':')
            )));
        }

        // Declared before the terminal so it is dropped after it
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;

        let mut state = PickerState::new(options);
        run_picker(&mut terminal, prompt, &mut state)
    }
}

/// Raw mode and alternate screen for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // From here on any early return restores the terminal
        let guard = TerminalGuard;
        execute!(io::stderr(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::debug!("Failed to leave raw mode: {}", e);
        }
        if let Err(e) = execute!(io::stderr(), LeaveAlternateScreen, cursor::Show) {
            tracing::debug!("Failed to restore screen: {}", e);
        }
    }
}

fn run_picker(
    terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    prompt: &str,
    state: &mut PickerState<'_>,
) -> Result<Option<usize>> {
    loop {
        terminal.draw(|f| draw(f, prompt, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(outcome) = state.handle_key(key) {
                return Ok(outcome);
            }
        }
    }
}

fn draw(f: &mut Frame, prompt: &str, state: &mut PickerState<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let filter = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(state.filter.as_str()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(prompt.to_string()));
    f.render_widget(filter, chunks[0]);

    let items: Vec<ListItem> = state
        .visible
        .iter()
        .map(|&i| ListItem::new(state.options[i].as_str()))
        .collect();
    let title = format!("{}/{}", state.visible.len(), state.options.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, chunks[1], &mut state.list_state);

    let help = Paragraph::new("type to filter  ↑/↓ move  Enter select  Esc cancel")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

/// Filter text, visible rows and cursor of the picker
struct PickerState<'a> {
    options: &'a [String],
    filter: String,
    /// Indexes into `options` that pass the filter, in original order
    visible: Vec<usize>,
    list_state: ListState,
}

impl<'a> PickerState<'a> {
    fn new(options: &'a [String]) -> Self {
        let mut state = Self {
            options,
            filter: String::new(),
            visible: Vec::new(),
            list_state: ListState::default(),
        };
        state.refilter();
        state
    }

    fn refilter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.list_state
            .select(if self.visible.is_empty() { None } else { Some(0) });
    }

    fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        self.list_state.select(Some(next as usize));
    }

    /// `Some(outcome)` ends the picker
    fn handle_key(&mut self, key: KeyEvent) -> Option<Option<usize>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return Some(None),
            KeyCode::Char('c') if ctrl => return Some(None),
            KeyCode::Enter => {
                let picked = self
                    .list_state
                    .selected()
                    .and_then(|row| self.visible.get(row).copied());
                // Enter on an empty filtered list does nothing
                return picked.map(Some);
            }
            KeyCode::Up => self.move_by(-1),
            KeyCode::Char('p') if ctrl => self.move_by(-1),
            KeyCode::Down | KeyCode::Tab => self.move_by(1),
            KeyCode::Char('n') if ctrl => self.move_by(1),
            KeyCode::Backspace => {
                self.filter.pop();
                self.refilter();
            }
            KeyCode::Char(c) if !ctrl => {
                self.filter.push(c);
                self.refilter();
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn options() -> Vec<String> {
        vec![
            "Audit (333)".to_string(),
            "Dev (111)".to_string(),
            "Prod (222)".to_string(),
        ]
    }

    #[test]
    fn test_enter_picks_highlighted_row() {
        let options = options();
        let mut state = PickerState::new(&options);

        assert_eq!(state.handle_key(key(KeyCode::Down)), None);
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Some(Some(1)));
    }

    #[test]
    fn test_navigation_wraps() {
        let options = options();
        let mut state = PickerState::new(&options);

        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Some(Some(2)));
    }

    #[test]
    fn test_filter_maps_back_to_original_index() {
        let options = options();
        let mut state = PickerState::new(&options);

        for c in "prod".chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(state.visible, vec![2]);
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Some(Some(2)));
    }

    #[test]
    fn test_enter_with_no_matches_keeps_running() {
        let options = options();
        let mut state = PickerState::new(&options);

        state.handle_key(key(KeyCode::Char('x')));
        assert!(state.visible.is_empty());
        assert_eq!(state.handle_key(key(KeyCode::Enter)), None);

        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn test_guard_restores_without_terminal() {
        // Dropping must never panic, even when raw mode was never entered
        drop(TerminalGuard);
    }

    #[test]
    fn test_escape_and_ctrl_c_abort() {
        let options = options();
        let mut state = PickerState::new(&options);
        assert_eq!(state.handle_key(key(KeyCode::Esc)), Some(None));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(state.handle_key(ctrl_c), Some(None));
    }
}
