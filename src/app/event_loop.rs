use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{debug, trace};

use crate::app::{App, Model, update};

impl App {
    /// Run the main event loop and return the final field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<String> {
        let text = match &self.file_path {
            Some(path) if path.exists() => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
            _ => None,
        };
        let mut model = Model::new(
            self.file_path.clone(),
            text,
            self.readonly,
            self.autofocus,
            self.options,
        );

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; jinja-field requires an interactive terminal")?;
        let result = execute!(stdout(), EnableBracketedPaste, EnableMouseCapture)
            .map_err(anyhow::Error::from)
            .and_then(|()| Self::event_loop(&mut terminal, &mut model));

        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
        ratatui::restore();

        result.map(|()| model.value())
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            // The field mounts on its first draw, so draw before reading input.
            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(250))? {
                if Self::dispatch(&event::read()?, model) {
                    needs_render = true;
                }

                // Coalesce key repeat bursts and pastes into a single render.
                let mut drained = 0_u32;
                while !model.should_quit && event::poll(Duration::from_millis(0))? {
                    if Self::dispatch(&event::read()?, model) {
                        drained += 1;
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    trace!(drained, "drained events");
                }
            }
        }
        Ok(())
    }

    fn dispatch(event: &event::Event, model: &mut Model) -> bool {
        let Some(msg) = Self::handle_event(event, model) else {
            return false;
        };
        debug!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, &side_msg);
        true
    }
}
