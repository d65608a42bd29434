//! Session configuration.
//!
//! Everything the engine needs is read once from a JSON file (camelCase
//! keys) at startup and never mutated afterwards. Every field has a default,
//! so a partial file is valid. Problems are reported as [`ConfigWarning`]s
//! instead of errors: a misconfigured session still runs, it just looks less
//! convincing.

use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default config file path.
pub fn default_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("live-sim")
        .join("config.json")
}

/// Complete session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveConfig {
    pub video: VideoConfig,
    pub chat: ChatConfig,
    pub cta: CtaConfig,
    pub reactions: ReactionsConfig,
    /// The comment script replayed by the chat scheduler.
    pub comments: Vec<Comment>,
    /// Seed for the session RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Which third-party mechanism delivers the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderKind {
    /// Hosted player driven through the provider's client library.
    #[default]
    #[serde(alias = "youtube")]
    Hosted,
    /// Embed markup: structure first, scripts appended after.
    #[serde(alias = "panda")]
    FramedEmbed,
    /// Embed markup with a wrapper div + iframe, scripts go to the head.
    #[serde(alias = "vimeo")]
    WrappedEmbed,
    /// Markup assigned wholesale, scripts swapped for live copies in place.
    #[serde(alias = "vturb")]
    InjectedScript,
    /// A plain media file URL.
    #[serde(alias = "direct")]
    DirectFile,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::FramedEmbed => "framedEmbed",
            Self::WrappedEmbed => "wrappedEmbed",
            Self::InjectedScript => "injectedScript",
            Self::DirectFile => "directFile",
        }
    }

    /// Whether the variant can report elapsed playback time.
    pub fn reports_elapsed(&self) -> bool {
        matches!(self, Self::Hosted | Self::DirectFile)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoConfig {
    pub kind: ProviderKind,
    /// Video id / URL for hosted and direct providers, raw markup otherwise.
    pub source: String,
    pub viewers: ViewerConfig,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Hosted,
            source: String::new(),
            viewers: ViewerConfig::default(),
        }
    }
}

/// Inclusive integer range. An inverted range collapses to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: i64,
    pub max: i64,
}

impl CountRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    /// Effective `(low, high)` bounds.
    pub fn bounds(&self) -> (i64, i64) {
        if self.is_inverted() {
            (self.min, self.min)
        } else {
            (self.min, self.max)
        }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        let (low, high) = self.bounds();
        value.clamp(low, high)
    }

    pub fn contains(&self, value: i64) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&value)
    }
}

/// Inclusive horizontal span in percent of the surface width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanRange {
    pub min: f64,
    pub max: f64,
}

impl SpanRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds limited to `[0, 100]`, inverted spans collapse to `min`.
    pub fn bounds(&self) -> (f64, f64) {
        let low = self.min.clamp(0.0, 100.0);
        let high = self.max.clamp(0.0, 100.0);
        if low > high { (low, low) } else { (low, high) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub initial_count: i64,
    pub drop_enabled: bool,
    pub before_drop: CountRange,
    pub after_drop: CountRange,
    pub drop_time_seconds: f64,
    pub update_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_count: 2402,
            drop_enabled: true,
            before_drop: CountRange::new(2500, 3000),
            after_drop: CountRange::new(100, 120),
            drop_time_seconds: 10.0,
            update_interval_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    pub visible_count: usize,
    pub interval_seconds: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            visible_count: 5,
            interval_seconds: 1.0,
            looping: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CtaConfig {
    pub enabled: bool,
    pub delay_seconds: f64,
    /// Button label, passed through to the presentation layer.
    pub text: String,
    /// Button target, passed through to the presentation layer.
    pub link: String,
}

impl Default for CtaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_seconds: 20.0,
            text: "Tap the button!".into(),
            link: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactionsConfig {
    /// Ambient emission on a fixed cadence. Manual taps work regardless.
    pub enabled: bool,
    pub interval_ms: u64,
    pub ambient_range: SpanRange,
    pub tap_range: SpanRange,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 500,
            ambient_range: SpanRange::new(0.0, 100.0),
            tap_range: SpanRange::new(20.0, 80.0),
        }
    }
}

/// One scripted chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub message: String,
}

impl Comment {
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
        }
    }
}

const SAMPLE_COMMENTS: &[(&str, &str)] = &[
    ("Maria Santos", "Hello from Lisbon!"),
    ("James Carter", "Audio is clear on my side"),
    ("Aiko Tanaka", "Just joined, what did I miss?"),
    ("Lucas Ferreira", "Great explanation so far"),
    ("Priya Nair", "Watching with my sister"),
    ("Tom Becker", "Will there be a replay?"),
    ("Sofia Rossi", "The slides are easy to follow"),
    ("Daniel Kim", "Can you repeat the last part?"),
    ("Emma Dubois", "Thanks for doing this live"),
    ("Omar Haddad", "Taking notes over here"),
    ("Grace Wilson", "Hi everyone"),
    ("Mateo Alvarez", "Good evening from Buenos Aires"),
];

/// A non-fatal configuration problem.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    InvertedRange { field: &'static str, min: i64, max: i64 },
    InvertedSpan { field: &'static str },
    EmptyScript,
    ZeroInterval { field: &'static str },
    NegativeTime { field: &'static str, value: f64 },
    EmptySource { kind: ProviderKind },
    NonPositiveInitialCount(i64),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedRange { field, min, max } => {
                write!(f, "{field}: min {min} > max {max}, using {min}")
            }
            Self::InvertedSpan { field } => write!(f, "{field}: min > max, using min"),
            Self::EmptyScript => write!(f, "comments: script is empty, chat stays idle"),
            Self::ZeroInterval { field } => write!(f, "{field}: zero interval, timer disabled"),
            Self::NegativeTime { field, value } => {
                write!(f, "{field}: negative time {value}, treated as 0")
            }
            Self::EmptySource { kind } => {
                write!(f, "video.source: empty for {kind} provider, nothing will be mounted")
            }
            Self::NonPositiveInitialCount(n) => {
                write!(f, "video.viewers.initialCount: {n} raised to 1")
            }
        }
    }
}

impl LiveConfig {
    /// Defaults plus a demo video and a short neutral comment script.
    pub fn sample() -> Self {
        Self {
            video: VideoConfig {
                source: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
                ..VideoConfig::default()
            },
            comments: SAMPLE_COMMENTS
                .iter()
                .map(|(user, message)| Comment::new(*user, *message))
                .collect(),
            ..Self::default()
        }
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default path, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        let path = default_path();
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("No usable config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Collect every degradation the engine will apply to this config.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let viewers = &self.video.viewers;

        for (field, range) in [
            ("video.viewers.beforeDrop", viewers.before_drop),
            ("video.viewers.afterDrop", viewers.after_drop),
        ] {
            if range.is_inverted() {
                warnings.push(ConfigWarning::InvertedRange { field, min: range.min, max: range.max });
            }
        }
        for (field, span) in [
            ("reactions.ambientRange", self.reactions.ambient_range),
            ("reactions.tapRange", self.reactions.tap_range),
        ] {
            if span.min > span.max {
                warnings.push(ConfigWarning::InvertedSpan { field });
            }
        }
        if viewers.initial_count < 1 {
            warnings.push(ConfigWarning::NonPositiveInitialCount(viewers.initial_count));
        }
        if self.comments.is_empty() {
            warnings.push(ConfigWarning::EmptyScript);
        }
        if viewers.update_interval_ms == 0 {
            warnings.push(ConfigWarning::ZeroInterval { field: "video.viewers.updateIntervalMs" });
        }
        if self.chat.interval_seconds <= 0.0 {
            warnings.push(ConfigWarning::ZeroInterval { field: "chat.intervalSeconds" });
        }
        if self.reactions.enabled && self.reactions.interval_ms == 0 {
            warnings.push(ConfigWarning::ZeroInterval { field: "reactions.intervalMs" });
        }
        for (field, value) in [
            ("video.viewers.dropTimeSeconds", viewers.drop_time_seconds),
            ("cta.delaySeconds", self.cta.delay_seconds),
        ] {
            if value < 0.0 {
                warnings.push(ConfigWarning::NegativeTime { field, value });
            }
        }
        if self.video.source.trim().is_empty() {
            warnings.push(ConfigWarning::EmptySource { kind: self.video.kind });
        }
        warnings
    }

    /// Log every warning from [`validate`](Self::validate).
    pub fn log_warnings(&self) -> usize {
        let warnings = self.validate();
        for w in &warnings {
            tracing::warn!("config: {w}");
        }
        warnings.len()
    }
}

/// Convert a seconds value from config into whole milliseconds.
/// Negative and non-finite values become 0.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

fn id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?:youtube\.com/watch\?v=|youtu\.be/)([A-Za-z0-9_-]{11})",
            r"youtube\.com/shorts/([A-Za-z0-9_-]{11})",
            r"youtube\.com/embed/([A-Za-z0-9_-]{11})",
            r"youtube\.com/v/([A-Za-z0-9_-]{11})",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Extract a hosted-player video id from a bare id or any of the common URL
/// shapes. Unrecognised input is returned unchanged.
pub fn extract_video_id(input: &str) -> String {
    static BARE_ID: OnceLock<Option<Regex>> = OnceLock::new();
    let input = input.trim();
    if input.is_empty() {
        return String::new();
    }
    let bare = BARE_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").ok());
    if bare.as_ref().is_some_and(|re| re.is_match(input)) {
        return input.to_string();
    }
    id_patterns()
        .iter()
        .find_map(|re| re.captures(input).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| input.to_string())
}
