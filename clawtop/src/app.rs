//! App state and main loop: input handling, dispatching refreshes, updating history, and drawing.

use std::{collections::VecDeque, io, time::Duration};

use chrono::Utc;
use clawtop_core::{Applied, RefreshOutcome, RefreshState, Refresher};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::{
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::config::{faster, slower};
use crate::filters::{describe, guess_primary_model, reduce, FilterAction, Filters};
use crate::history::{push_capped, CPU_HISTORY};
use crate::ui::{
    crons::{crons_height, draw_crons},
    events::draw_events,
    header::{draw_filter_line, draw_header, HeaderInfo},
    host::draw_host,
    sessions::{draw_sessions, session_lines},
    tokens::draw_tokens,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    RefreshNow,
    Faster,
    Slower,
    Filter(FilterAction),
}

pub fn command_for_key(k: &KeyEvent) -> Option<Command> {
    if k.kind == KeyEventKind::Release {
        return None;
    }
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(Command::Quit);
    }
    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        KeyCode::Char('r') => Some(Command::RefreshNow),
        KeyCode::Char('+') => Some(Command::Faster),
        KeyCode::Char('-') => Some(Command::Slower),
        KeyCode::Char(c) => FilterAction::from_key(c).map(Command::Filter),
        _ => None,
    }
}

fn ticker(every: Duration) -> Interval {
    let mut t = interval_at(Instant::now() + every, every);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

pub struct App {
    refresher: Refresher,
    refresh_every: Duration,
    filters: Filters,
    // guessed once, from the first successful snapshot
    primary_model: Option<String>,

    // CPU history (0..100)
    cpu_hist: VecDeque<u64>,

    should_quit: bool,
}

impl App {
    pub fn new(refresher: Refresher, refresh_every: Duration) -> Self {
        Self {
            refresher,
            refresh_every,
            filters: Filters::default(),
            primary_model: None,
            cpu_hist: VecDeque::with_capacity(CPU_HISTORY),
            should_quit: false,
        }
    }

    pub fn refresher(&self) -> &Refresher {
        &self.refresher
    }

    pub fn refresh_every(&self) -> Duration {
        self.refresh_every
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    pub fn primary_model(&self) -> Option<&str> {
        self.primary_model.as_deref()
    }

    pub fn cpu_history(&self) -> &VecDeque<u64> {
        &self.cpu_hist
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply the state part of a command. Refreshing and re-arming the ticker are the loop's job.
    pub fn apply_command(&mut self, cmd: Command) {
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::RefreshNow => {}
            Command::Faster => self.refresh_every = faster(self.refresh_every),
            Command::Slower => self.refresh_every = slower(self.refresh_every),
            Command::Filter(a) => self.filters = reduce(self.filters, a),
        }
    }

    pub fn on_outcome(&mut self, out: RefreshOutcome) -> Applied {
        let applied = self.refresher.apply(out);
        if applied == Applied::Updated {
            if let Some(snap) = self.refresher.snapshot() {
                let v = snap.host.cpu_percent.clamp(0.0, 100.0).round() as u64;
                push_capped(&mut self.cpu_hist, v, CPU_HISTORY);
                if self.primary_model.is_none() {
                    self.primary_model = guess_primary_model(&snap.sessions);
                    if let Some(m) = &self.primary_model {
                        info!(model = %m, "primary model");
                    }
                }
            }
        }
        applied
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<RefreshOutcome>();
        let mut events = EventStream::new();
        let mut tick = ticker(self.refresh_every);

        self.refresher.dispatch(&tx);

        loop {
            terminal.draw(|f| self.draw(f))?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                _ = tick.tick() => {
                    self.refresher.dispatch(&tx);
                }
                Some(out) = rx.recv() => {
                    self.on_outcome(out);
                }
                maybe = events.next() => match maybe {
                    Some(Ok(Event::Key(k))) => {
                        let Some(cmd) = command_for_key(&k) else { continue };
                        self.apply_command(cmd);
                        match cmd {
                            Command::RefreshNow => {
                                self.refresher.dispatch(&tx);
                            }
                            Command::Faster | Command::Slower => {
                                debug!(every_ms = self.refresh_every.as_millis() as u64, "refresh rate changed");
                                tick = ticker(self.refresh_every);
                            }
                            _ => {}
                        }
                    }
                    // resize and the rest just redraw
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }

        Ok(())
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let now = Utc::now();
        let snap = self.refresher.snapshot();

        // Root rows: header, filter line, body
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        draw_header(
            f,
            rows[0],
            &HeaderInfo {
                hostname: snap.as_deref().map(|s| s.host.hostname.as_str()),
                refresh_every: self.refresh_every,
                last_update: self.refresher.last_update(),
                refreshing: self.refresher.state() == RefreshState::Refreshing,
                error: self.refresher.last_error(),
                now,
            },
        );
        draw_filter_line(f, rows[1], &describe(&self.filters, self.primary_model()));

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // host
                Constraint::Length(4), // tokens
                Constraint::Min(3),    // sessions + subagents
            ])
            .split(body[0]);

        let crons: &[_] = snap.as_deref().map(|s| s.crons.as_slice()).unwrap_or(&[]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(crons_height(crons))])
            .split(body[1]);

        draw_host(f, left[0], snap.as_deref().map(|s| &s.host), &self.cpu_hist);
        draw_tokens(
            f,
            left[1],
            snap.as_deref().map(|s| s.token_samples.as_slice()).unwrap_or(&[]),
        );
        let lines = match snap.as_deref() {
            Some(s) => session_lines(
                &s.sessions,
                &s.subagents,
                &self.filters.sessions,
                self.primary_model(),
                now,
            ),
            None => Vec::new(),
        };
        draw_sessions(f, left[2], lines);

        draw_events(
            f,
            right[0],
            snap.as_deref().map(|s| s.events.as_slice()).unwrap_or(&[]),
            &self.filters.events,
        );
        draw_crons(f, right[1], crons, now);
    }
}
