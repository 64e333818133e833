// render.rs - Summary card derived from a summary record
use crate::api_client::audio_overview_path;
use crate::types::SummaryRecord;

pub const SUMMARY_HEADING: &str = "Summary";
pub const SENTIMENT_FALLBACK: &str = "N/A";

/// What the result area shows for one summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub heading: &'static str,
    pub title: Option<String>,
    pub summary: String,
    pub sentiment: String,
    pub thumbnail: Option<String>,
    /// "Watch Video" target
    pub watch_url: Option<String>,
    /// "Audio Overview" target, always present
    pub audio_overview_path: String,
}

impl SummaryCard {
    pub fn from_record(record: &SummaryRecord) -> Self {
        Self {
            heading: SUMMARY_HEADING,
            title: non_empty(record.title.as_deref()),
            summary: record.summary.clone(),
            sentiment: non_empty(record.sentiment.as_deref())
                .unwrap_or_else(|| SENTIMENT_FALLBACK.to_string()),
            thumbnail: non_empty(record.thumbnail.as_deref()),
            watch_url: non_empty(record.url.as_deref()),
            audio_overview_path: audio_overview_path(&record.video_id),
        }
    }

    /// Plain-text layout used by the terminal front-end
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!("== {} ==", self.heading)];
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        lines.push(String::new());
        lines.push(self.summary.clone());
        lines.push(String::new());
        lines.push(format!("Sentiment: {}", self.sentiment));
        if let Some(thumbnail) = &self.thumbnail {
            lines.push(format!("Thumbnail: {}", thumbnail));
        }
        if let Some(url) = &self.watch_url {
            lines.push(format!("Watch Video: {}", url));
        }
        lines.push(format!("Audio Overview: {}", self.audio_overview_path));
        lines.join("\n")
    }
}

// Empty strings from the server render the same as missing fields
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}
