// terminal.rs - Stdout page view and stdin command parsing for the younote binary
use crate::error::UnknownLanguage;
use crate::render::SummaryCard;
use crate::types::{ChatEntry, ChatRole, Language, Theme};
use crate::view::{LoadingTarget, PageView};
use std::io::Write;
use std::sync::Mutex;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

pub const HELP_TEXT: &str = "\
Commands:
  <query> | /search <query>   summarize a YouTube URL or search query
  /chat <question>            ask about the summarized video (alias /ask)
  /theme                      toggle light/dark theme
  /lang <en|fr>               switch interface language
  /audio                      generate the audio overview for the current video
  /help                       show this help
  /quit                       exit";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Chat(String),
    Theme,
    Language(Language),
    Audio,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Search(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "search" | "s" => Command::Search(arg.to_string()),
            "chat" | "ask" => Command::Chat(arg.to_string()),
            "theme" => Command::Theme,
            "lang" | "language" => match arg.parse::<Language>() {
                Ok(language) => Command::Language(language),
                Err(UnknownLanguage(tag)) => {
                    Command::Invalid(format!("Unknown language '{}'. Use en or fr.", tag))
                }
            },
            "audio" => Command::Audio,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("Unknown command '/{}'. Type /help.", other)),
        }
    }
}

#[derive(Debug, Default)]
struct Screen {
    theme: Theme,
    placeholder: String,
    search_enabled: bool,
    loading: Option<LoadingTarget>,
}

/// [`PageView`] that prints to a terminal.
///
/// Loading indicators are redrawn in place on the current line; everything
/// else is appended as new lines.
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
    screen: Mutex<Screen>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            screen: Mutex::new(Screen {
                search_enabled: true,
                ..Screen::default()
            }),
        }
    }

    fn accent(&self) -> &'static str {
        match self.screen.lock().unwrap_or_else(|e| e.into_inner()).theme {
            Theme::Dark => "\x1b[36m",
            Theme::Light => "\x1b[34m",
        }
    }

    fn write_raw(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }

    /// Clear an in-place loading line before printing something else
    fn clear_loading_line(&self) {
        let loading = self.screen.lock().unwrap_or_else(|e| e.into_inner()).loading;
        if loading.is_some() {
            self.write_raw("\r\x1b[2K");
        }
    }

    pub fn print_line(&self, text: &str) {
        self.clear_loading_line();
        self.write_raw(&format!("{}\n", text));
    }

    pub fn print_help(&self) {
        self.print_line(HELP_TEXT);
    }

    pub fn prompt(&self) {
        let (placeholder, enabled) = {
            let screen = self.screen.lock().unwrap_or_else(|e| e.into_inner());
            (screen.placeholder.clone(), screen.search_enabled)
        };
        let marker = if enabled { "" } else { " (busy)" };
        self.write_raw(&format!("{}{}> ", placeholder, marker));
    }
}

impl<W: Write + Send> PageView for TerminalView<W> {
    fn apply_theme(&self, theme: Theme) {
        self.screen.lock().unwrap_or_else(|e| e.into_inner()).theme = theme;
        self.print_line(&format!("{}Theme: {}{}", self.accent(), theme, RESET));
    }

    fn set_query_placeholder(&self, text: &str) {
        self.screen.lock().unwrap_or_else(|e| e.into_inner()).placeholder = text.to_string();
    }

    fn mark_language_active(&self, _previous: Option<Language>, current: Language) {
        let selectors: Vec<String> = Language::ALL
            .iter()
            .map(|lang| {
                if *lang == current {
                    format!("[{}]", lang)
                } else {
                    lang.to_string()
                }
            })
            .collect();
        self.print_line(&format!("Language: {}", selectors.join(" ")));
    }

    fn set_search_enabled(&self, enabled: bool) {
        self.screen.lock().unwrap_or_else(|e| e.into_inner()).search_enabled = enabled;
    }

    fn clear_query_input(&self) {}

    fn clear_chat_input(&self) {}

    fn show_loading(&self, target: LoadingTarget) {
        self.screen.lock().unwrap_or_else(|e| e.into_inner()).loading = Some(target);
    }

    fn set_loading_dots(&self, target: LoadingTarget, dots: usize) {
        let label = match target {
            LoadingTarget::Summary => "Summarizing",
            LoadingTarget::Chat => "Thinking",
        };
        self.write_raw(&format!("\r\x1b[2K{}{}", label, ".".repeat(dots)));
    }

    fn hide_loading(&self, target: LoadingTarget) {
        let mut screen = self.screen.lock().unwrap_or_else(|e| e.into_inner());
        if screen.loading == Some(target) {
            screen.loading = None;
            drop(screen);
            self.write_raw("\r\x1b[2K");
        }
    }

    fn clear_result(&self) {}

    fn show_message(&self, message: &str) {
        self.print_line(message);
    }

    fn render_summary(&self, card: &SummaryCard) {
        let accent = self.accent();
        let text = card.to_text();
        let mut lines = text.lines();
        let heading = lines.next().unwrap_or_default();
        let body: Vec<&str> = lines.collect();
        self.print_line(&format!("{}{}{}{}\n{}", BOLD, accent, heading, RESET, body.join("\n")));
    }

    fn append_chat_entry(&self, entry: &ChatEntry) {
        let line = match entry.role {
            ChatRole::User => format!("{}you ›{} {}", self.accent(), RESET, entry.text),
            ChatRole::Bot => format!("  {}", entry.text),
        };
        self.print_line(&line);
    }

    fn scroll_chat_to_latest(&self) {}

    fn notify(&self, message: &str) {
        self.print_line(&format!("{}! {}{}", BOLD, message, RESET));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  never gonna give you up "), Command::Search("never gonna give you up".into()));
        assert_eq!(Command::parse("/search cats"), Command::Search("cats".into()));
        assert_eq!(Command::parse("/ask who is speaking?"), Command::Chat("who is speaking?".into()));
        assert_eq!(Command::parse("/theme"), Command::Theme);
        assert_eq!(Command::parse("/lang FR"), Command::Language(Language::Fr));
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert!(matches!(Command::parse("/lang de"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/dance"), Command::Invalid(_)));
    }

    #[test]
    fn test_language_marker_brackets_active_selector() {
        let buffer = Buffer::default();
        let view = TerminalView::new(buffer.clone());
        view.mark_language_active(Some(Language::En), Language::Fr);
        assert!(buffer.contents().contains("Language: en [fr]"));
    }

    #[test]
    fn test_chat_entries_and_notices_are_printed() {
        let buffer = Buffer::default();
        let view = TerminalView::new(buffer.clone());
        view.append_chat_entry(&ChatEntry::user("why?"));
        view.append_chat_entry(&ChatEntry::bot("because"));
        view.notify("Please summarize a video first.");

        let out = buffer.contents();
        assert!(out.contains("why?"));
        assert!(out.contains("  because\n"));
        assert!(out.contains("Please summarize a video first."));
    }

    #[test]
    fn test_hide_loading_only_clears_matching_target() {
        let buffer = Buffer::default();
        let view = TerminalView::new(buffer.clone());
        view.show_loading(LoadingTarget::Summary);
        view.set_loading_dots(LoadingTarget::Summary, 3);
        view.hide_loading(LoadingTarget::Chat);
        assert_eq!(buffer.contents(), "\r\x1b[2KSummarizing...");

        view.hide_loading(LoadingTarget::Summary);
        assert!(buffer.contents().ends_with("\r\x1b[2K"));
    }
}
