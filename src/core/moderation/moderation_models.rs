// Moderation domain models - data structures for content screening.
//
// These are pure domain types with no HTTP or storage dependencies.
// The api layer serializes these directly as JSON responses.

use serde::{Deserialize, Serialize};

/// Thematic signal a category check can report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Violence,
    AdultContent,
    HateSpeech,
    Spam,
    Copyright,
}

impl ContentCategory {
    /// The flag type a detection in this category reports as.
    pub fn flag_type(&self) -> FlagType {
        match self {
            ContentCategory::Violence => FlagType::Violence,
            ContentCategory::AdultContent => FlagType::AdultContent,
            ContentCategory::HateSpeech => FlagType::HateSpeech,
            ContentCategory::Spam => FlagType::Spam,
            ContentCategory::Copyright => FlagType::Copyright,
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentCategory::Violence => write!(f, "violence"),
            ContentCategory::AdultContent => write!(f, "adult_content"),
            ContentCategory::HateSpeech => write!(f, "hate_speech"),
            ContentCategory::Spam => write!(f, "spam"),
            ContentCategory::Copyright => write!(f, "copyright"),
        }
    }
}

/// Kind of violation a flag reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    /// Custom blocklist hits, disallowed content types, harmful prompts.
    Inappropriate,
    Violence,
    HateSpeech,
    AdultContent,
    Spam,
    Copyright,
}

/// Severity bucket for a detected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Bucket a confidence score into a severity.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            Severity::High
        } else if confidence > 0.4 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// A detected thematic signal. Recorded whether or not the detection was
/// strong enough to produce a flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ContentCategory,
    pub confidence: f64,
    pub severity: Severity,
}

/// A reported policy violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    /// Always in [0, 1].
    pub confidence: f64,
    pub description: String,
    /// Optional remediation hint for the author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Outcome of screening one piece of content. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub is_approved: bool,
    /// 1.0 when nothing was flagged, otherwise max(0.1, 1 - mean flag confidence).
    pub confidence: f64,
    pub categories: Vec<CategoryScore>,
    pub flags: Vec<Flag>,
    /// Free-text improvement suggestions (structural and quality checks).
    pub suggestions: Vec<String>,
    pub requires_review: bool,
}

/// Distinguishes a clean verdict from a fail-open default. When the filter
/// configuration cannot be loaded the service still answers, but callers can
/// see the result was degraded rather than earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum ModerationOutcome {
    Clean(ModerationResult),
    Degraded(ModerationResult),
}

#[allow(dead_code)]
impl ModerationOutcome {
    pub fn result(&self) -> &ModerationResult {
        match self {
            ModerationOutcome::Clean(r) | ModerationOutcome::Degraded(r) => r,
        }
    }

    pub fn into_result(self) -> ModerationResult {
        match self {
            ModerationOutcome::Clean(r) | ModerationOutcome::Degraded(r) => r,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ModerationOutcome::Degraded(_))
    }
}

/// Audience gate stored alongside the filters. The delivery side reads this;
/// the screening engine itself does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeRestriction {
    #[default]
    All,
    Teen,
    Mature,
}

impl AgeRestriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRestriction::All => "all",
            AgeRestriction::Teen => "teen",
            AgeRestriction::Mature => "mature",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(AgeRestriction::All),
            "teen" => Some(AgeRestriction::Teen),
            "mature" => Some(AgeRestriction::Mature),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgeRestriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime-adjustable filter configuration. One logical instance per
/// deployment, read by every check and replaced wholesale by admin updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub violence_filter: bool,
    pub adult_content_filter: bool,
    pub hate_speech_filter: bool,
    pub spam_filter: bool,
    pub copyright_filter: bool,
    /// Lowers the bar for turning a detected category into a blocking flag.
    pub strict_mode: bool,
    /// Case-insensitive substring matches; any hit blocks outright.
    pub custom_blocked_words: Vec<String>,
    pub custom_blocked_phrases: Vec<String>,
    /// Content type labels `moderate_text` accepts.
    pub allowed_content_types: Vec<String>,
    pub age_restriction: AgeRestriction,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            violence_filter: true,
            adult_content_filter: true,
            hate_speech_filter: true,
            spam_filter: true,
            copyright_filter: true,
            strict_mode: false,
            custom_blocked_words: Vec::new(),
            custom_blocked_phrases: Vec::new(),
            allowed_content_types: vec![
                "story".to_string(),
                "prompt".to_string(),
                "comment".to_string(),
            ],
            age_restriction: AgeRestriction::All,
        }
    }
}

impl FilterConfig {
    /// Whether the filter for a category is switched on.
    pub fn category_enabled(&self, category: ContentCategory) -> bool {
        match category {
            ContentCategory::Violence => self.violence_filter,
            ContentCategory::AdultContent => self.adult_content_filter,
            ContentCategory::HateSpeech => self.hate_speech_filter,
            ContentCategory::Spam => self.spam_filter,
            ContentCategory::Copyright => self.copyright_filter,
        }
    }

    /// Shallow-merge a partial update; `None` fields keep their value.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(v) = update.violence_filter {
            self.violence_filter = v;
        }
        if let Some(v) = update.adult_content_filter {
            self.adult_content_filter = v;
        }
        if let Some(v) = update.hate_speech_filter {
            self.hate_speech_filter = v;
        }
        if let Some(v) = update.spam_filter {
            self.spam_filter = v;
        }
        if let Some(v) = update.copyright_filter {
            self.copyright_filter = v;
        }
        if let Some(v) = update.strict_mode {
            self.strict_mode = v;
        }
        if let Some(v) = update.custom_blocked_words {
            self.custom_blocked_words = v;
        }
        if let Some(v) = update.custom_blocked_phrases {
            self.custom_blocked_phrases = v;
        }
        if let Some(v) = update.allowed_content_types {
            self.allowed_content_types = v;
        }
        if let Some(v) = update.age_restriction {
            self.age_restriction = v;
        }
    }
}

/// Partial filter update sent by admins. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterUpdate {
    pub violence_filter: Option<bool>,
    pub adult_content_filter: Option<bool>,
    pub hate_speech_filter: Option<bool>,
    pub spam_filter: Option<bool>,
    pub copyright_filter: Option<bool>,
    pub strict_mode: Option<bool>,
    pub custom_blocked_words: Option<Vec<String>>,
    pub custom_blocked_phrases: Option<Vec<String>>,
    pub allowed_content_types: Option<Vec<String>>,
    pub age_restriction: Option<AgeRestriction>,
}

/// A story submitted for full screening. Mirrors the payload the story
/// editor sends on publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<StoryNode>,
    #[serde(default)]
    pub branches: Vec<StoryBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryNode {
    pub content: String,
    #[serde(default)]
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBranch {
    pub label: String,
    #[serde(default)]
    pub branch_type: Option<String>,
}

impl StoryPayload {
    /// Everything a reader can see, joined for a single screening pass.
    pub fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.nodes.len() + self.branches.len());
        parts.push(self.title.as_str());
        if let Some(description) = &self.description {
            parts.push(description.as_str());
        }
        for node in &self.nodes {
            parts.push(node.content.as_str());
        }
        for branch in &self.branches {
            parts.push(branch.label.as_str());
        }
        parts.join("\n")
    }

    /// Sum of node content lengths, in characters.
    pub fn total_content_chars(&self) -> usize {
        self.nodes.iter().map(|n| n.content.chars().count()).sum()
    }
}
