use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::error::{AppError, Result};
use crate::ui;

type Backend = CrosstermBackend<Stdout>;

/// Owns the terminal while the browser is on screen.
pub struct Tui {
    terminal: Terminal<Backend>,
    mouse_enabled: bool,
}

impl Tui {
    /// Enter raw mode and the alternate screen, with mouse capture if asked.
    pub fn new(enable_mouse: bool) -> Result<Self> {
        terminal::enable_raw_mode().map_err(terminal_error)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(terminal_error)?;
        if enable_mouse {
            execute!(stdout, EnableMouseCapture).map_err(terminal_error)?;
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        tracing::debug!(mouse = enable_mouse, "terminal initialized");
        Ok(Self {
            terminal,
            mouse_enabled: enable_mouse,
        })
    }

    /// Draw one frame of the app.
    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }

    /// Leave the alternate screen and give the terminal back to the shell.
    pub fn restore(&mut self) -> Result<()> {
        if self.mouse_enabled {
            execute!(self.terminal.backend_mut(), DisableMouseCapture).map_err(terminal_error)?;
        }
        terminal::disable_raw_mode().map_err(terminal_error)?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
        self.terminal.show_cursor()?;
        tracing::debug!("terminal restored");
        Ok(())
    }
}

fn terminal_error(e: io::Error) -> AppError {
    AppError::Terminal(e.to_string())
}

/// Restore the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        tracing::error!("panic: {}", panic_info);
        original_hook(panic_info);
    }));
}
