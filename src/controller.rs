// src/controller.rs
//! Page controller for the YouNote summary page.
//!
//! Binds the page's input events (search, language, theme, chat) to the
//! summarize and chat endpoints and renders the results through a [`PageView`].
//! Every summarize submission bumps a generation counter; a response is only
//! rendered or persisted while its generation is still the latest. Chat
//! requests go out as soon as they are dispatched and carry a sequence number;
//! a transcript task appends the answers in the order questions were asked.

use crate::api_client::{audio_overview_path, SummaryBackend};
use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::loading::LoadingAnimation;
use crate::render::SummaryCard;
use crate::storage::{KeyValueStore, SUMMARY_STATE_KEY, THEME_KEY};
use crate::types::{ChatEntry, Language, SubmitSource, SummaryRecord, Theme};
use crate::view::{LoadingTarget, PageView};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const VALIDATION_MESSAGE: &str = "Please enter a valid YouTube URL or search query.";
pub const SUMMARIZE_FIRST_NOTICE: &str = "Please summarize a video first.";

/// Mutable page state owned by the controller
#[derive(Debug)]
struct ControllerState {
    /// Identity of the most recent search submission
    generation: u64,
    /// Set while the latest search is on the wire; button clicks are ignored
    /// until it settles
    request_pending: bool,
    search_enabled: bool,
    active_request: Option<CancellationToken>,
    theme: Theme,
    /// `None` until the language selectors are marked at startup
    language: Option<Language>,
    current_video_id: Option<String>,
    transcript: Vec<ChatEntry>,
    /// Sequence number for the next chat question
    next_chat_seq: u64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            generation: 0,
            request_pending: false,
            search_enabled: true,
            active_request: None,
            theme: Theme::default(),
            language: None,
            current_video_id: None,
            transcript: Vec::new(),
            next_chat_seq: 0,
        }
    }
}

type SharedState = Arc<Mutex<ControllerState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug)]
enum ChatEvent {
    Asked(ChatEntry),
    Answered { seq: u64, entry: ChatEntry },
}

struct Inner {
    backend: Arc<dyn SummaryBackend>,
    view: Arc<dyn PageView>,
    local_store: Arc<dyn KeyValueStore>,
    session_store: Arc<dyn KeyValueStore>,
    summarize_timeout: Duration,
    loading_tick: Duration,
    state: SharedState,
    /// Orders summary output sections (clear, render, persist) between runs
    output_gate: Mutex<()>,
    summarize_debounce: Debouncer,
    chat_debounce: Debouncer,
    chat_tx: mpsc::UnboundedSender<ChatEvent>,
}

impl Inner {
    fn output_gate(&self) -> MutexGuard<'_, ()> {
        self.output_gate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cheap-to-clone handle on the page controller.
#[derive(Clone)]
pub struct PageController {
    inner: Arc<Inner>,
}

impl PageController {
    /// Build the controller and spawn its chat transcript task.
    /// Must be called from within a tokio runtime.
    pub fn new(
        backend: Arc<dyn SummaryBackend>,
        view: Arc<dyn PageView>,
        local_store: Arc<dyn KeyValueStore>,
        session_store: Arc<dyn KeyValueStore>,
        config: &ClientConfig,
    ) -> Self {
        let state: SharedState = Arc::new(Mutex::new(ControllerState::default()));
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_chat_transcript(
            view.clone(),
            state.clone(),
            config.loading_tick,
            chat_rx,
        ));

        Self {
            inner: Arc::new(Inner {
                backend,
                view,
                local_store,
                session_store,
                summarize_timeout: config.summarize_timeout,
                loading_tick: config.loading_tick,
                state,
                output_gate: Mutex::new(()),
                summarize_debounce: Debouncer::new(config.debounce),
                chat_debounce: Debouncer::new(config.debounce),
                chat_tx,
            }),
        }
    }

    /// Page load: apply the stored theme, recover the last summary and mark
    /// the initial language.
    pub fn start(&self) {
        let stored = match self.inner.local_store.get(THEME_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read theme preference: {}", e);
                None
            }
        };
        let theme = Theme::from_stored(stored.as_deref());
        lock(&self.inner.state).theme = theme;
        self.inner.view.apply_theme(theme);
        info!(theme = %theme, "🎨 Theme applied");

        self.restore_summary();
        self.toggle_language(Language::En);
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = lock(&self.inner.state);
            state.theme = state.theme.toggled();
            state.theme
        };

        self.inner.view.apply_theme(theme);
        if let Err(e) = self.inner.local_store.set(THEME_KEY, theme.as_str()) {
            warn!(theme = %theme, "Failed to persist theme preference: {}", e);
        }
        debug!(theme = %theme, "Theme toggled");
        theme
    }

    pub fn toggle_language(&self, language: Language) {
        let previous = lock(&self.inner.state).language.replace(language);
        self.inner.view.set_query_placeholder(language.search_placeholder());
        self.inner.view.mark_language_active(previous, language);
        debug!(language = %language, "Language selected");
    }

    /// Handle a search submission. Returns the generation assigned to it, or
    /// `None` when the submission was rejected.
    pub fn submit_search(&self, query: &str, source: SubmitSource) -> Option<u64> {
        let query = query.trim();
        if query.is_empty() {
            // A request already on the wire keeps its indicator
            self.inner.view.show_message(VALIDATION_MESSAGE);
            return None;
        }

        let _gate = self.inner.output_gate();
        let generation = {
            let mut state = lock(&self.inner.state);
            if source == SubmitSource::Button && (!state.search_enabled || state.request_pending) {
                debug!(pending = state.request_pending, "Search button is disabled, ignoring click");
                return None;
            }
            state.search_enabled = false;
            state.generation += 1;
            state.generation
        };
        self.inner.view.set_search_enabled(false);

        let controller = self.clone();
        let query = query.to_string();
        self.inner.summarize_debounce.trigger(async move {
            controller.run_summarize(query, generation).await;
        });

        debug!(generation, ?source, "Search submission scheduled");
        Some(generation)
    }

    async fn run_summarize(&self, query: String, generation: u64) {
        let inner = &self.inner;
        let token = CancellationToken::new();
        if !self.begin_summarize(generation, &token) {
            return;
        }

        let animation = LoadingAnimation::start(inner.view.clone(), LoadingTarget::Summary, inner.loading_tick);
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!(request_id = %request_id, generation, query = %query, "🔎 Summarize request started");

        let timeout = inner.summarize_timeout;
        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = tokio::time::timeout(timeout, inner.backend.summarize(&query)) => {
                Some(result.unwrap_or_else(|_| Err(ApiError::TimedOut(timeout))))
            }
        };
        animation.stop();

        let Some(result) = outcome else {
            debug!(request_id = %request_id, generation, "Summarize request cancelled by a newer search");
            return;
        };
        self.finish_summarize(generation, result, request_id, started);
    }

    /// Claim the page for `generation`. Returns false when a newer search
    /// already superseded it.
    fn begin_summarize(&self, generation: u64, token: &CancellationToken) -> bool {
        let inner = &self.inner;
        let _gate = inner.output_gate();
        {
            let mut state = lock(&inner.state);
            if state.generation != generation {
                debug!(generation, latest = state.generation, "Skipping superseded search");
                return false;
            }
            if let Some(previous) = state.active_request.replace(token.clone()) {
                previous.cancel();
            }
            state.request_pending = true;
            state.current_video_id = None;
        }

        inner.view.clear_result();
        inner.view.clear_query_input();
        if let Err(e) = inner.session_store.remove(SUMMARY_STATE_KEY) {
            warn!("Failed to clear saved summary: {}", e);
        }
        true
    }

    fn finish_summarize(
        &self,
        generation: u64,
        result: Result<SummaryRecord, ApiError>,
        request_id: Uuid,
        started: Instant,
    ) {
        let inner = &self.inner;
        // Held until the output is on screen so a newer submission lands after it
        let _gate = inner.output_gate();
        {
            let mut state = lock(&inner.state);
            if state.generation != generation {
                debug!(
                    request_id = %request_id,
                    generation,
                    latest = state.generation,
                    "Discarding stale summarize response"
                );
                return;
            }

            state.active_request = None;
            state.request_pending = false;
            state.search_enabled = true;
            if let Ok(record) = &result {
                state.current_video_id = Some(record.video_id.clone());
            }
        }

        inner.view.hide_loading(LoadingTarget::Summary);
        match result {
            Ok(record) => {
                info!(
                    request_id = %request_id,
                    generation,
                    video_id = %record.video_id,
                    elapsed_ms = %started.elapsed().as_millis(),
                    "✅ Summary rendered"
                );
                inner.view.render_summary(&SummaryCard::from_record(&record));
                self.persist_summary(&record);
            }
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    generation,
                    status = ?e.status(),
                    elapsed_ms = %started.elapsed().as_millis(),
                    "Summarize request failed: {}",
                    e
                );
                inner.view.show_message(&e.user_message());
            }
        }
        inner.view.set_search_enabled(true);
    }

    fn persist_summary(&self, record: &SummaryRecord) {
        let saved = serde_json::to_string(record)
            .map_err(crate::error::StorageError::from)
            .and_then(|raw| self.inner.session_store.set(SUMMARY_STATE_KEY, &raw));
        if let Err(e) = saved {
            warn!(video_id = %record.video_id, "Failed to save summary state: {}", e);
        }
    }

    fn restore_summary(&self) {
        let raw = match self.inner.session_store.get(SUMMARY_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!("Failed to read saved summary: {}", e);
                return;
            }
        };

        let record: SummaryRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding unreadable saved summary: {}", e);
                if let Err(e) = self.inner.session_store.remove(SUMMARY_STATE_KEY) {
                    warn!("Failed to clear saved summary: {}", e);
                }
                return;
            }
        };

        lock(&self.inner.state).current_video_id = Some(record.video_id.clone());
        self.inner.view.render_summary(&SummaryCard::from_record(&record));
        info!(video_id = %record.video_id, "♻️ Restored saved summary");
    }

    /// Handle a chat submission. Returns whether the question was scheduled.
    pub fn send_chat(&self, question: &str) -> bool {
        if lock(&self.inner.state).current_video_id.is_none() {
            self.inner.view.notify(SUMMARIZE_FIRST_NOTICE);
            return false;
        }

        let question = question.trim();
        if question.is_empty() {
            return false;
        }

        let controller = self.clone();
        let question = question.to_string();
        self.inner.chat_debounce.trigger(async move {
            controller.dispatch_chat(question);
        });
        true
    }

    fn dispatch_chat(&self, question: String) {
        let inner = &self.inner;
        let (video_id, seq) = {
            let mut state = lock(&inner.state);
            let Some(video_id) = state.current_video_id.clone() else {
                drop(state);
                inner.view.notify(SUMMARIZE_FIRST_NOTICE);
                return;
            };
            let seq = state.next_chat_seq;
            state.next_chat_seq += 1;
            // Queued under the lock so questions reach the transcript in sequence order
            if inner.chat_tx.send(ChatEvent::Asked(ChatEntry::user(question.clone()))).is_err() {
                error!("Chat transcript task is gone, dropping question");
                return;
            }
            (video_id, seq)
        };
        inner.view.clear_chat_input();
        debug!(video_id = %video_id, seq, "💬 Chat question sent");

        let backend = inner.backend.clone();
        let answers = inner.chat_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let entry = match backend.chat(&video_id, &question).await {
                Ok(answer) => {
                    debug!(
                        video_id = %video_id,
                        seq,
                        elapsed_ms = %started.elapsed().as_millis(),
                        "Chat answer received"
                    );
                    ChatEntry::bot(answer)
                }
                Err(e) => {
                    warn!(video_id = %video_id, seq, status = ?e.status(), "Chat request failed: {}", e);
                    ChatEntry::bot(format!("Error: {}", e))
                }
            };
            if answers.send(ChatEvent::Answered { seq, entry }).is_err() {
                debug!(seq, "Chat transcript closed before the answer arrived");
            }
        });
    }

    pub fn generation(&self) -> u64 {
        lock(&self.inner.state).generation
    }

    pub fn is_request_pending(&self) -> bool {
        lock(&self.inner.state).request_pending
    }

    pub fn is_search_enabled(&self) -> bool {
        lock(&self.inner.state).search_enabled
    }

    pub fn current_video_id(&self) -> Option<String> {
        lock(&self.inner.state).current_video_id.clone()
    }

    pub fn theme(&self) -> Theme {
        lock(&self.inner.state).theme
    }

    pub fn language(&self) -> Option<Language> {
        lock(&self.inner.state).language
    }

    pub fn transcript(&self) -> Vec<ChatEntry> {
        lock(&self.inner.state).transcript.clone()
    }

    /// Link to the audio overview of the current video
    pub fn audio_overview_link(&self) -> Option<String> {
        self.current_video_id().map(|id| audio_overview_path(&id))
    }
}

fn append_chat_entry(state: &SharedState, view: &dyn PageView, entry: ChatEntry) {
    lock(state).transcript.push(entry.clone());
    view.append_chat_entry(&entry);
    view.scroll_chat_to_latest();
}

/// Sole writer of the chat transcript. Answers that arrive early are held
/// until every earlier question has been answered.
async fn run_chat_transcript(
    view: Arc<dyn PageView>,
    state: SharedState,
    loading_tick: Duration,
    mut events: mpsc::UnboundedReceiver<ChatEvent>,
) {
    let mut next_answer: u64 = 0;
    let mut held: BTreeMap<u64, ChatEntry> = BTreeMap::new();
    let mut awaiting: usize = 0;
    let mut animation: Option<LoadingAnimation> = None;

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::Asked(entry) => {
                append_chat_entry(&state, view.as_ref(), entry);
                awaiting += 1;
                if animation.is_none() {
                    animation = Some(LoadingAnimation::start(view.clone(), LoadingTarget::Chat, loading_tick));
                }
            }
            ChatEvent::Answered { seq, entry } => {
                held.insert(seq, entry);
                while let Some(entry) = held.remove(&next_answer) {
                    append_chat_entry(&state, view.as_ref(), entry);
                    next_answer += 1;
                    awaiting = awaiting.saturating_sub(1);
                }
                if !held.is_empty() {
                    debug!(waiting_for = next_answer, held = held.len(), "Holding chat answers for an earlier question");
                }

                if awaiting == 0 {
                    if let Some(animation) = animation.take() {
                        animation.stop();
                    }
                    view.hide_loading(LoadingTarget::Chat);
                }
            }
        }
    }
    debug!("Chat transcript task stopped");
}
