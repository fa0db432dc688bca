//! Interactive input.
//!
//! The controller asks for input only through [`Prompter`].  `None` from
//! either method means the user cancelled, which ends the session.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// One choice of a [`Prompter::select`] question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    /// The value handed back when chosen.
    pub value: &'static str,
    /// What the user sees.
    pub label: &'static str,
}

impl SelectOption {
    /// Creates a new option.
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// Source of interactive answers.
pub trait Prompter {
    /// Ask the user to pick one of `options`; returns the chosen value.
    fn select(&mut self, message: &str, options: &[SelectOption]) -> Option<String>;

    /// Ask for free text.  `placeholder` hints at the current value.
    fn text(&mut self, message: &str, placeholder: Option<&str>) -> Option<String>;
}

/// Resolves a typed answer to an option.
///
/// Accepts a 1-based index or an option value; an empty answer picks the
/// first option.
pub fn pick_option<'a>(options: &'a [SelectOption], answer: &str) -> Option<&'a SelectOption> {
    let answer = answer.trim();
    if answer.is_empty() {
        return options.first();
    }
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| options.get(i));
    }
    options.iter().find(|option| option.value == answer)
}

/// A [`Prompter`] reading from the terminal with rustyline.
pub struct RustylinePrompter {
    editor: DefaultEditor,
    use_color: bool,
}

impl RustylinePrompter {
    /// Creates a prompter on the controlling terminal.
    pub fn new(use_color: bool) -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            use_color,
        })
    }

    fn heading(&self, message: &str) -> String {
        if self.use_color {
            format!("\x1b[1m{message}\x1b[0m")
        } else {
            message.to_string()
        }
    }

    fn read(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(err) => {
                tracing::error!(error = %err, "failed to read input");
                None
            }
        }
    }
}

impl Prompter for RustylinePrompter {
    fn select(&mut self, message: &str, options: &[SelectOption]) -> Option<String> {
        println!("{}", self.heading(message));
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {}", i + 1, option.label);
        }
        loop {
            let answer = self.read("> ")?;
            if let Some(option) = pick_option(options, &answer) {
                return Some(option.value.to_string());
            }
            println!("Enter a number between 1 and {}.", options.len());
        }
    }

    fn text(&mut self, message: &str, placeholder: Option<&str>) -> Option<String> {
        println!("{}", self.heading(message));
        if let Some(placeholder) = placeholder {
            if self.use_color {
                println!("\x1b[2m  ({placeholder})\x1b[0m");
            } else {
                println!("  ({placeholder})");
            }
        }
        self.read("> ")
    }
}
