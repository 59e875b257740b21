//! Terminal implementation of `InteractionAdapter`
//!
//! Prompts use dialoguer with a compact theme, the remote refresh gets an
//! indicatif spinner, and the bounded cleanup confirmation polls the keyboard
//! through crossterm in raw mode. Everything is written to stderr; stdout is
//! reserved for output meant for scripts.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use console::Style;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use dialoguer::theme::Theme;
use dialoguer::{Confirm, FuzzySelect, Input};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use twigs_core::interaction::{
    InteractionAdapter, InteractionError, InteractionResult, ProgressHandle,
};

use crate::colors::COLORS;

/// Set once Ctrl+C arrives outside a prompt
static CANCELLED: AtomicBool = AtomicBool::new(false);

fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Install the Ctrl+C handler (idempotent)
fn setup_ctrl_c_handler() {
    static HANDLER_SET: AtomicBool = AtomicBool::new(false);

    if HANDLER_SET.swap(true, Ordering::SeqCst) {
        return;
    }

    if let Err(e) = ctrlc::set_handler(move || {
        CANCELLED.store(true, Ordering::SeqCst);
        // Restore the cursor dialoguer may have hidden
        let _ = console::Term::stderr().show_cursor();
        eprintln!();
    }) {
        tracing::warn!(error = %e, "could not install Ctrl+C handler");
    }
}

/// Compact `? prompt` theme
struct TwigsTheme {
    prompt_style: Style,
    active_style: Style,
    inactive_style: Style,
    hint_style: Style,
}

impl TwigsTheme {
    fn new() -> Self {
        Self {
            prompt_style: Style::new().cyan().bold(),
            active_style: Style::new().cyan(),
            inactive_style: Style::new(),
            hint_style: Style::new().dim(),
        }
    }

    fn prompt(&self, prompt: &str) -> console::StyledObject<String> {
        self.prompt_style.apply_to(format!("? {}", prompt))
    }
}

impl Theme for TwigsTheme {
    fn format_prompt(&self, f: &mut dyn FmtWrite, prompt: &str) -> std::fmt::Result {
        write!(f, "{}", self.prompt(prompt))
    }

    fn format_input_prompt(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        default: Option<&str>,
    ) -> std::fmt::Result {
        match default {
            Some(d) => write!(
                f,
                "{} {} ",
                self.prompt(prompt),
                self.hint_style.apply_to(format!("[{}]", d))
            ),
            None => write!(f, "{} ", self.prompt(prompt)),
        }
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        sel: &str,
    ) -> std::fmt::Result {
        write!(f, "{} {}", self.prompt(prompt), self.active_style.apply_to(sel))
    }

    fn format_confirm_prompt(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        default: Option<bool>,
    ) -> std::fmt::Result {
        let hint = match default {
            Some(true) => "(Y/n)",
            Some(false) => "(y/N)",
            None => "(y/n)",
        };
        write!(f, "{} {} ", self.prompt(prompt), self.hint_style.apply_to(hint))
    }

    fn format_confirm_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        selection: Option<bool>,
    ) -> std::fmt::Result {
        let answer = match selection {
            Some(true) => "yes",
            Some(false) => "no",
            None => "?",
        };
        write!(f, "{} {}", self.prompt(prompt), self.active_style.apply_to(answer))
    }

    fn format_select_prompt(&self, f: &mut dyn FmtWrite, prompt: &str) -> std::fmt::Result {
        write!(f, "{}", self.prompt(prompt))
    }

    fn format_select_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        sel: &str,
    ) -> std::fmt::Result {
        write!(f, "{} {}", self.prompt(prompt), self.active_style.apply_to(sel))
    }

    fn format_select_prompt_item(
        &self,
        f: &mut dyn FmtWrite,
        text: &str,
        active: bool,
    ) -> std::fmt::Result {
        if active {
            write!(
                f,
                "{} {}",
                self.active_style.apply_to(">"),
                self.active_style.apply_to(text)
            )
        } else {
            write!(f, "  {}", self.inactive_style.apply_to(text))
        }
    }
}

/// Key pressed while a bounded confirmation waits
fn key_answer(code: KeyCode, modifiers: KeyModifiers) -> Option<InteractionResult<bool>> {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Err(InteractionError::Cancelled))
        }
        KeyCode::Esc => Some(Err(InteractionError::Cancelled)),
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Ok(true)),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => Some(Ok(false)),
        _ => None,
    }
}

fn terminal_error(err: std::io::Error) -> InteractionError {
    InteractionError::Io(err.to_string())
}

/// Block for a y/n key until `timeout` runs out; raw mode must be on
fn wait_for_answer(timeout: Duration) -> InteractionResult<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(InteractionError::Timeout);
        }
        if !event::poll(remaining).map_err(terminal_error)? {
            continue;
        }
        if let Event::Key(key) = event::read().map_err(terminal_error)? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(answer) = key_answer(key.code, key.modifiers) {
                return answer;
            }
        }
    }
}

/// Terminal adapter
pub struct CliAdapter {
    is_tty: bool,
    quiet: bool,
    progress_counter: AtomicU64,
    active_progress: Arc<Mutex<HashMap<u64, ProgressBar>>>,
}

impl CliAdapter {
    pub fn new(quiet: bool) -> Self {
        Self::with_tty(std::io::stdin().is_terminal(), quiet)
    }

    pub fn with_tty(is_tty: bool, quiet: bool) -> Self {
        setup_ctrl_c_handler();
        Self {
            is_tty,
            quiet,
            progress_counter: AtomicU64::new(0),
            active_progress: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check_cancelled(&self) -> InteractionResult<()> {
        if is_cancelled() {
            Err(InteractionError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn require_tty(&self) -> InteractionResult<()> {
        if !self.is_tty {
            Err(InteractionError::NonTty)
        } else {
            Ok(())
        }
    }

    fn convert_dialoguer_error(err: dialoguer::Error) -> InteractionError {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                InteractionError::Cancelled
            }
            dialoguer::Error::IO(e) => InteractionError::Io(e.to_string()),
        }
    }

    fn emit(&self, line: std::fmt::Arguments<'_>) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
        let _ = stderr.flush();
    }
}

impl InteractionAdapter for CliAdapter {
    fn is_interactive(&self) -> bool {
        self.is_tty
    }

    fn ask_select(&self, prompt: &str, options: &[String]) -> InteractionResult<usize> {
        self.require_tty()?;
        self.check_cancelled()?;

        if options.is_empty() {
            return Err(InteractionError::InvalidInput(
                "options cannot be empty".to_string(),
            ));
        }

        let theme = TwigsTheme::new();
        FuzzySelect::with_theme(&theme)
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(Self::convert_dialoguer_error)?
            .ok_or(InteractionError::Cancelled)
    }

    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool> {
        self.require_tty()?;
        self.check_cancelled()?;

        let theme = TwigsTheme::new();
        Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()
            .map_err(Self::convert_dialoguer_error)?
            .ok_or(InteractionError::Cancelled)
    }

    fn ask_confirm_timeout(&self, prompt: &str, timeout: Duration) -> InteractionResult<bool> {
        self.require_tty()?;
        self.check_cancelled()?;

        let theme = TwigsTheme::new();
        let mut rendered = String::new();
        let _ = theme.format_confirm_prompt(&mut rendered, prompt, Some(false));
        eprint!("{}", rendered);
        let _ = std::io::stderr().flush();

        terminal::enable_raw_mode().map_err(terminal_error)?;
        let answer = wait_for_answer(timeout);
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "could not leave raw mode");
        }

        let echoed = match &answer {
            Ok(true) => "yes",
            Ok(false) => "no",
            Err(InteractionError::Timeout) => "timed out",
            Err(_) => "cancelled",
        };
        eprintln!("{}", echoed);
        answer
    }

    fn ask_text(&self, prompt: &str, default: Option<&str>) -> InteractionResult<String> {
        self.require_tty()?;
        self.check_cancelled()?;

        let theme = TwigsTheme::new();
        let mut input: Input<String> = Input::with_theme(&theme).with_prompt(prompt);
        if let Some(d) = default {
            input = input.default(d.to_string());
        }

        input.interact_text().map_err(Self::convert_dialoguer_error)
    }

    fn start_progress(&self, message: &str) -> ProgressHandle {
        let id = self.progress_counter.fetch_add(1, Ordering::SeqCst);

        let pb = if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]")
        {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut progress_map) = self.active_progress.lock() {
            progress_map.insert(id, pb);
        }

        ProgressHandle::new(id, message)
    }

    fn end_progress(&self, handle: ProgressHandle, success: bool) {
        let Ok(mut progress_map) = self.active_progress.lock() else {
            return;
        };
        let Some(pb) = progress_map.remove(&handle.id()) else {
            return;
        };
        let elapsed = format!("{:.1}s", pb.elapsed().as_secs_f64());
        pb.finish_and_clear();

        let msg = handle.message();
        if success {
            if !self.quiet {
                self.emit(format_args!(
                    "{} {} [{}]",
                    "✓".style(COLORS.success),
                    msg,
                    elapsed
                ));
            }
        } else {
            self.emit(format_args!(
                "{} {} [{}]",
                "✗".style(COLORS.fail),
                msg.style(COLORS.fail),
                elapsed
            ));
        }
    }

    fn print_info(&self, message: &str) {
        if !self.quiet {
            self.emit(format_args!("{}", message));
        }
    }

    fn print_warning(&self, message: &str) {
        self.emit(format_args!(
            "{} {}",
            "warning:".style(COLORS.warning),
            message.style(COLORS.warning)
        ));
    }

    fn print_error(&self, message: &str) {
        self.emit(format_args!(
            "{} {}",
            "error:".style(COLORS.fail),
            message
        ));
    }

    fn print_success(&self, message: &str) {
        if !self.quiet {
            self.emit(format_args!(
                "{} {}",
                "✓".style(COLORS.success),
                message.style(COLORS.success)
            ));
        }
    }

    fn print_header(&self, message: &str) {
        if !self.quiet {
            self.emit(format_args!("{}", message.style(COLORS.active)));
        }
    }
}
