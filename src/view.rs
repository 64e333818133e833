// view.rs - The page surface the controller renders into
use crate::render::SummaryCard;
use crate::types::{ChatEntry, Language, Theme};

/// Which loading indicator an update refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingTarget {
    Summary,
    Chat,
}

/// Everything the page controller can change on screen.
///
/// Implementations are called from spawned tasks, so they take `&self` and
/// handle their own interior mutability.
pub trait PageView: Send + Sync {
    fn apply_theme(&self, theme: Theme);
    fn set_query_placeholder(&self, text: &str);
    /// Move the active marker. `previous` is `None` only for the initial marking.
    fn mark_language_active(&self, previous: Option<Language>, current: Language);

    fn set_search_enabled(&self, enabled: bool);
    fn clear_query_input(&self);
    fn clear_chat_input(&self);

    fn show_loading(&self, target: LoadingTarget);
    fn set_loading_dots(&self, target: LoadingTarget, dots: usize);
    fn hide_loading(&self, target: LoadingTarget);

    /// Empty and hide the result area and the chat container
    fn clear_result(&self);
    /// Reveal the result area with a plain message in it
    fn show_message(&self, message: &str);
    /// Reveal the result area and chat container with a rendered summary
    fn render_summary(&self, card: &SummaryCard);

    fn append_chat_entry(&self, entry: &ChatEntry);
    fn scroll_chat_to_latest(&self);

    /// Blocking notice, the equivalent of `alert()`
    fn notify(&self, message: &str);
}
