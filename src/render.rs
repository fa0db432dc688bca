//! Output rendering for the assistant.
//!
//! This module provides the [`Renderer`] trait and a plain-text
//! implementation that optionally styles its output with ANSI escapes.

use std::io::{self, Stdout, Write};

use crate::types::{ImageDescriptor, MessageRole};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for hints).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for inverse video (used for banners).
const ANSI_INVERSE: &str = "\x1b[7m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for blue text (used for links).
const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for cyan text (used for user turns).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Text shown as the clickable part of an image link.
const IMAGE_LINK_TEXT: &str = "Click here to view the generated image in your browser";

/// Trait for rendering assistant output.
///
/// The controller only talks to this trait, so tests can record output and
/// the binary can print it.
pub trait Renderer {
    /// Print the opening banner.
    fn print_intro(&mut self, title: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print the answer to a text prompt.
    fn print_answer(&mut self, answer: &str);

    /// Print a generated image.
    fn print_image(&mut self, image: &ImageDescriptor);

    /// Print one entry of a resumed transcript.
    fn print_transcript_entry(&mut self, role: MessageRole, content: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print the goodbye message.
    ///
    /// `save_result` is what saving the history reported, if anything.
    /// `flags` is the flag reference as `(flag, description)` pairs.
    fn print_goodbye(&mut self, save_result: Option<&str>, flags: &[(String, &'static str)]);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn style(&self, code: &str, text: &str) -> String {
        style(self.use_color, code, text)
    }

    fn emit(&mut self, text: &str) {
        let mut out = self.stdout.lock();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_intro(&mut self, title: &str) {
        let banner = self.style(ANSI_INVERSE, &format!(" {title} "));
        self.emit(&format!("\n{banner}\n"));
    }

    fn print_info(&mut self, info: &str) {
        let line = self.style(ANSI_DIM, info);
        self.emit(&line);
    }

    fn print_answer(&mut self, answer: &str) {
        let label = self.style(ANSI_BOLD, "Answer:");
        self.emit(&format!("{label}\n{answer}\n"));
    }

    fn print_image(&mut self, image: &ImageDescriptor) {
        let label = self.style(ANSI_BOLD, "Response:");
        let mut body = format_image(image, self.use_color);
        body.insert_str(0, &format!("{label}\n"));
        self.emit(&body);
    }

    fn print_transcript_entry(&mut self, role: MessageRole, content: &str) {
        let label = match role {
            MessageRole::User => self.style(ANSI_CYAN, "You:"),
            MessageRole::Assistant => self.style(ANSI_BOLD, "Answer:"),
            MessageRole::System => self.style(ANSI_DIM, "System:"),
        };
        self.emit(&format!("{label}\n{content}\n"));
    }

    fn print_error(&mut self, error: &str) {
        let line = self.style(ANSI_RED, error);
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{line}");
    }

    fn print_goodbye(&mut self, save_result: Option<&str>, flags: &[(String, &'static str)]) {
        let text = goodbye_message(save_result, flags, self.use_color);
        self.emit(&text);
    }
}

fn style(use_color: bool, code: &str, text: &str) -> String {
    if use_color {
        format!("{code}{text}{ANSI_RESET}")
    } else {
        text.to_string()
    }
}

/// Wraps `text` in an OSC 8 hyperlink to `url`.
///
/// Without color the URL is printed in parentheses instead, since terminals
/// that cannot style text are unlikely to render hyperlinks either.
pub fn hyperlink(text: &str, url: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b]8;;{url}\x1b\\{ANSI_BLUE}{text}{ANSI_RESET}\x1b]8;;\x1b\\")
    } else {
        format!("{text} ({url})")
    }
}

/// The body printed for a generated image.
pub fn format_image(image: &ImageDescriptor, use_color: bool) -> String {
    let mut body = match image.url.as_deref() {
        Some(url) => {
            let mut link = hyperlink(IMAGE_LINK_TEXT, url, use_color);
            link.push('\n');
            link.push_str(&style(use_color, ANSI_DIM, "   command + click on a mac"));
            link
        }
        None => "The image was returned inline and has no URL.".to_string(),
    };
    if let Some(revised) = image.revised_prompt.as_deref() {
        body.push_str(&format!("\nRevised Prompt: {revised}"));
    }
    body
}

/// The text printed when the assistant exits.
pub fn goodbye_message(
    save_result: Option<&str>,
    flags: &[(String, &'static str)],
    use_color: bool,
) -> String {
    let mut msg = format!(
        "Thanks for using {}\n",
        style(use_color, ANSI_BOLD, "Your Terminal AI Assistant!")
    );
    if let Some(result) = save_result {
        msg.push_str(&format!("\n{result}\n"));
    }
    msg.push_str("\nAvailable flags:");
    let width = flags.iter().map(|(flag, _)| flag.len()).max().unwrap_or(0) + 8;
    for (flag, description) in flags {
        let padded = format!("{flag:<width$}");
        msg.push_str(&format!("\n{}{description}", style(use_color, ANSI_BOLD, &padded)));
    }
    msg.push_str(&format!("\n\n{}", style(use_color, ANSI_INVERSE, " Good Bye ")));
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> Vec<(String, &'static str)> {
        vec![
            ("--help or -h".to_string(), "show this help message"),
            ("--image or -i".to_string(), "create an image"),
        ]
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn goodbye_without_color() {
        let msg = goodbye_message(Some("History saved to file: /tmp/x.json"), &flags(), false);
        assert_eq!(
            msg,
            "Thanks for using Your Terminal AI Assistant!\n\
             \nHistory saved to file: /tmp/x.json\n\
             \nAvailable flags:\
             \n--help or -h         show this help message\
             \n--image or -i        create an image\
             \n\n Good Bye "
        );
    }

    #[test]
    fn goodbye_skips_missing_save_result() {
        let msg = goodbye_message(None, &flags(), false);
        assert!(!msg.contains("History"));
        assert!(msg.contains("Available flags:"));
    }

    #[test]
    fn image_with_revised_prompt() {
        let image = ImageDescriptor::from_url("https://img.example/1.png")
            .with_revised_prompt("a tall lighthouse");
        let body = format_image(&image, false);
        assert_eq!(
            body,
            "Click here to view the generated image in your browser (https://img.example/1.png)\n   command + click on a mac\nRevised Prompt: a tall lighthouse"
        );
    }

    #[test]
    fn colored_link_is_osc8() {
        let link = hyperlink("view", "https://img.example/1.png", true);
        assert!(link.starts_with("\x1b]8;;https://img.example/1.png\x1b\\"));
        assert!(link.ends_with("\x1b]8;;\x1b\\"));
    }
}
