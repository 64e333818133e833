#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use younote::render::SummaryCard;
use younote::{
    ApiError, ChatEntry, ClientConfig, KeyValueStore, Language, LoadingTarget, MemoryStore, PageController,
    PageView, SummaryBackend, SummaryRecord, Theme,
};

#[derive(Debug, Clone)]
pub enum Failure {
    Status(u16, &'static str),
    Other,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Failure::Status(status, reason) => ApiError::Status {
                status,
                reason: reason.to_string(),
            },
            Failure::Other => ApiError::InvalidUrl("connection refused".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Scripted<T> {
    delay: Duration,
    result: Result<T, Failure>,
}

/// Backend with per-query scripted answers and a call log
#[derive(Default)]
pub struct FakeBackend {
    summaries: Mutex<HashMap<String, Scripted<SummaryRecord>>>,
    chats: Mutex<VecDeque<Scripted<String>>>,
    summarize_calls: Mutex<Vec<String>>,
    chat_calls: Mutex<Vec<(String, String)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(self, query: &str, delay_ms: u64, record: SummaryRecord) -> Self {
        self.summaries.lock().unwrap().insert(
            query.to_string(),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: Ok(record),
            },
        );
        self
    }

    pub fn with_summary_failure(self, query: &str, delay_ms: u64, failure: Failure) -> Self {
        self.summaries.lock().unwrap().insert(
            query.to_string(),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                result: Err(failure),
            },
        );
        self
    }

    pub fn with_chat_answer(self, delay_ms: u64, answer: &str) -> Self {
        self.chats.lock().unwrap().push_back(Scripted {
            delay: Duration::from_millis(delay_ms),
            result: Ok(answer.to_string()),
        });
        self
    }

    pub fn with_chat_failure(self, delay_ms: u64, failure: Failure) -> Self {
        self.chats.lock().unwrap().push_back(Scripted {
            delay: Duration::from_millis(delay_ms),
            result: Err(failure),
        });
        self
    }

    pub fn summarize_calls(&self) -> Vec<String> {
        self.summarize_calls.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> Vec<(String, String)> {
        self.chat_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryBackend for FakeBackend {
    async fn summarize(&self, query: &str) -> Result<SummaryRecord, ApiError> {
        self.summarize_calls.lock().unwrap().push(query.to_string());
        let scripted = self
            .summaries
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_else(|| Scripted {
                delay: Duration::ZERO,
                result: Err(Failure::Status(404, "Not Found")),
            });

        tokio::time::sleep(scripted.delay).await;
        scripted.result.map_err(Failure::into_error)
    }

    async fn chat(&self, video_id: &str, question: &str) -> Result<String, ApiError> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((video_id.to_string(), question.to_string()));
        let scripted = self.chats.lock().unwrap().pop_front().unwrap_or_else(|| Scripted {
            delay: Duration::ZERO,
            result: Ok(format!("answer to {}", question)),
        });

        tokio::time::sleep(scripted.delay).await;
        scripted.result.map_err(Failure::into_error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Theme(Theme),
    Placeholder(String),
    LanguageMarked(Option<Language>, Language),
    SearchEnabled(bool),
    QueryCleared,
    ChatInputCleared,
    LoadingShown(LoadingTarget),
    LoadingDots(LoadingTarget, usize),
    LoadingHidden(LoadingTarget),
    ResultCleared,
    Message(String),
    Summary(SummaryCard),
    Chat(ChatEntry),
    ChatScrolled,
    Notice(String),
}

/// View that records every call in order
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<SummaryCard> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Summary(card) => Some(card),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Notice(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn chat_entries(&self) -> Vec<ChatEntry> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Chat(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    pub fn themes(&self) -> Vec<Theme> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Theme(theme) => Some(theme),
                _ => None,
            })
            .collect()
    }

    /// Whether the indicator for `target` is currently shown
    pub fn loading_visible(&self, target: LoadingTarget) -> bool {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::LoadingShown(t) if t == target => Some(true),
                ViewEvent::LoadingHidden(t) if t == target => Some(false),
                _ => None,
            })
            .last()
            .unwrap_or(false)
    }

    pub fn max_dots(&self, target: LoadingTarget) -> usize {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::LoadingDots(t, dots) if t == target => Some(dots),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl PageView for RecordingView {
    fn apply_theme(&self, theme: Theme) {
        self.push(ViewEvent::Theme(theme));
    }

    fn set_query_placeholder(&self, text: &str) {
        self.push(ViewEvent::Placeholder(text.to_string()));
    }

    fn mark_language_active(&self, previous: Option<Language>, current: Language) {
        self.push(ViewEvent::LanguageMarked(previous, current));
    }

    fn set_search_enabled(&self, enabled: bool) {
        self.push(ViewEvent::SearchEnabled(enabled));
    }

    fn clear_query_input(&self) {
        self.push(ViewEvent::QueryCleared);
    }

    fn clear_chat_input(&self) {
        self.push(ViewEvent::ChatInputCleared);
    }

    fn show_loading(&self, target: LoadingTarget) {
        self.push(ViewEvent::LoadingShown(target));
    }

    fn set_loading_dots(&self, target: LoadingTarget, dots: usize) {
        self.push(ViewEvent::LoadingDots(target, dots));
    }

    fn hide_loading(&self, target: LoadingTarget) {
        self.push(ViewEvent::LoadingHidden(target));
    }

    fn clear_result(&self) {
        self.push(ViewEvent::ResultCleared);
    }

    fn show_message(&self, message: &str) {
        self.push(ViewEvent::Message(message.to_string()));
    }

    fn render_summary(&self, card: &SummaryCard) {
        self.push(ViewEvent::Summary(card.clone()));
    }

    fn append_chat_entry(&self, entry: &ChatEntry) {
        self.push(ViewEvent::Chat(entry.clone()));
    }

    fn scroll_chat_to_latest(&self) {
        self.push(ViewEvent::ChatScrolled);
    }

    fn notify(&self, message: &str) {
        self.push(ViewEvent::Notice(message.to_string()));
    }
}

pub fn record(video_id: &str, summary: &str) -> SummaryRecord {
    SummaryRecord {
        video_id: video_id.to_string(),
        summary: summary.to_string(),
        sentiment: Some("Positive".to_string()),
        thumbnail: None,
        url: Some(format!("https://www.youtube.com/watch?v={}", video_id)),
        title: None,
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        base_url: "http://younote.test".to_string(),
        summarize_timeout: Duration::from_secs(240),
        debounce: Duration::from_millis(300),
        loading_tick: Duration::from_millis(300),
        state_dir: PathBuf::from("unused"),
    }
}

pub struct Harness {
    pub controller: PageController,
    pub backend: Arc<FakeBackend>,
    pub view: Arc<RecordingView>,
    pub local: Arc<MemoryStore>,
    pub session: Arc<MemoryStore>,
}

impl Harness {
    /// Must run inside a tokio runtime
    pub fn new(backend: FakeBackend) -> Self {
        Self::with_stores(backend, MemoryStore::new(), MemoryStore::new())
    }

    pub fn with_stores(backend: FakeBackend, local: MemoryStore, session: MemoryStore) -> Self {
        let backend = Arc::new(backend);
        let view = Arc::new(RecordingView::default());
        let local = Arc::new(local);
        let session = Arc::new(session);
        let controller = PageController::new(
            backend.clone(),
            view.clone(),
            local.clone(),
            session.clone(),
            &test_config(),
        );
        Self {
            controller,
            backend,
            view,
            local,
            session,
        }
    }

    pub fn saved_summary(&self) -> Option<SummaryRecord> {
        self.session
            .get(younote::storage::SUMMARY_STATE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
