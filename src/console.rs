//! Line-oriented user interaction
//!
//! All prompts and user-facing output go through [`Console`], so the
//! credential resolver, the selection driver and the run driver can be fed
//! scripted input in tests and real stdin/stdout in the binary.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, BufRead, IsTerminal, Write};

/// Prompting and output surface used by the interactive parts of a run
pub trait Console {
    /// Print a line of output
    fn say(&mut self, line: &str) -> io::Result<()>;

    /// Ask a question and return the trimmed answer, or `None` at end of input
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`Console::ask`], but the answer should not be echoed
    fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Ask a yes/no question; anything but "y"/"yes" is a no
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self
            .ask(prompt)?
            .map(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false))
    }
}

/// [`Console`] over any reader/writer pair
pub struct LineConsole<R, W> {
    input: R,
    output: W,
    hide_secrets: bool,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
    /// Create a console that echoes secrets like any other answer
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// Consume the console and return the writer
    pub fn into_output(self) -> W {
        self.output
    }

    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl LineConsole<io::StdinLock<'static>, io::Stdout> {
    /// Console on the process's stdin/stdout
    ///
    /// Secrets are read without echo when stdin is a terminal.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let hide_secrets = stdin.is_terminal();
        Self {
            input: stdin.lock(),
            output: io::stdout(),
            hide_secrets,
        }
    }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        self.read_answer()
    }

    fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.hide_secrets {
            return self.ask(prompt);
        }

        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let answer = read_hidden_line()?;
        // Enter is swallowed in raw mode
        writeln!(self.output)?;
        Ok(answer.map(|secret| secret.trim().to_string()))
    }
}

/// Keeps the terminal in raw mode for as long as it lives
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read one line from the terminal without echoing it
///
/// Esc, Ctrl-C and Ctrl-D on an empty line abort with `None`.
fn read_hidden_line() -> io::Result<Option<String>> {
    let _raw = RawModeGuard::enable()?;
    let mut buffer = String::new();

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return Ok(Some(buffer)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if ctrl => return Ok(None),
            KeyCode::Char('d') if ctrl && buffer.is_empty() => return Ok(None),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) if !ctrl => buffer.push(c),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ask_trims_answer_and_echoes_prompt() {
        let mut console = LineConsole::new(Cursor::new("  octocat \n"), Vec::new());

        let answer = console.ask("Username: ").unwrap();
        assert_eq!(answer.as_deref(), Some("octocat"));

        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output, "Username: ");
    }

    #[test]
    fn test_ask_returns_none_at_eof() {
        let mut console = LineConsole::new(Cursor::new(""), Vec::new());
        assert_eq!(console.ask("Anything? ").unwrap(), None);
        assert_eq!(console.ask_secret("Token: ").unwrap(), None);
    }

    #[test]
    fn test_confirm_accepts_only_yes() {
        let mut console = LineConsole::new(Cursor::new("YES\ny\nno\nsure\n"), Vec::new());
        assert!(console.confirm("? ").unwrap());
        assert!(console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
        assert!(!console.confirm("? ").unwrap());
        // EOF
        assert!(!console.confirm("? ").unwrap());
    }

    #[test]
    fn test_say_writes_line() {
        let mut console = LineConsole::new(Cursor::new(""), Vec::new());
        console.say("hello").unwrap();
        console.say("world").unwrap();
        assert_eq!(String::from_utf8(console.into_output()).unwrap(), "hello\nworld\n");
    }
}
