//! TUI Shell - Terminal UI implementation
//!
//! Maps terminal events to core Events and executes Effects

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossterm::{
    clipboard::CopyToClipboard,
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::{Effect, Event, SessionMachine};

pub mod executor;
pub mod mapper;
pub mod renderer;

pub use executor::EffectExecutor;
use mapper::EventMapper;
use renderer::Renderer;

/// Owns the terminal and drives the session machine
pub struct TuiShell {
    machine: SessionMachine,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    executor: EffectExecutor,
    mapper: EventMapper,
    renderer: Renderer,
    /// completed async work
    results: mpsc::UnboundedReceiver<Event>,
    tick: Duration,
    should_exit: bool,
    abort: Option<String>,
    restored: bool,
}

impl TuiShell {
    pub fn new(
        machine: SessionMachine,
        executor: EffectExecutor,
        results: mpsc::UnboundedReceiver<Event>,
        renderer: Renderer,
        tick: Duration,
    ) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            machine,
            terminal,
            executor,
            mapper: EventMapper::new(),
            renderer,
            results,
            tick,
            should_exit: false,
            abort: None,
            restored: false,
        })
    }

    /// Run until the session asks to exit. An abort restores the terminal
    /// and comes back as an error.
    pub async fn run(&mut self) -> Result<()> {
        let effects = self.machine.start();
        self.execute_all(effects);

        while !self.should_exit {
            let machine = &self.machine;
            let renderer = &mut self.renderer;
            self.terminal
                .draw(|f| renderer.render(f, machine.session()))?;

            if event::poll(self.tick)? {
                let event = self.mapper.map_event(event::read()?);
                self.apply(event);
            }

            while let Ok(event) = self.results.try_recv() {
                self.apply(event);
            }

            // idle lock fires even without input
            self.apply(Event::Tick);
        }

        self.cleanup()?;
        match self.abort.take() {
            Some(reason) => Err(anyhow!(reason)),
            None => Ok(()),
        }
    }

    fn apply(&mut self, event: Event) {
        let effects = self.machine.update(event, Instant::now());
        self.execute_all(effects);
    }

    fn execute_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Exit => {
                info!("exiting");
                self.should_exit = true;
            }
            Effect::Abort(reason) => {
                self.should_exit = true;
                self.abort = Some(reason);
            }
            Effect::CopyToClipboard(text) => {
                if let Err(e) = copy_to_clipboard(self.terminal.backend_mut(), &text) {
                    warn!("clipboard copy failed: {}", e);
                }
            }
            other => self.executor.execute(other),
        }
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for TuiShell {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// osc52 clipboard write, works over ssh
fn copy_to_clipboard(out: &mut impl Write, text: &str) -> io::Result<()> {
    execute!(out, CopyToClipboard::to_clipboard_from(text))
}
