// Content moderation service - core screening logic for the What-If platform.
//
// This service handles:
// - Keyword/phrase screening across the policy categories
// - Custom blocklist enforcement
// - Story- and prompt-specific checks
// - Aggregation into an approve / review decision
//
// NO HTTP dependencies here - just pure domain logic.

use async_trait::async_trait;
use thiserror::Error;

use super::moderation_models::{
    CategoryScore, ContentCategory, FilterConfig, FilterUpdate, Flag, FlagType, ModerationOutcome,
    ModerationResult, Severity, StoryPayload,
};
use super::moderation_rules::{CategoryRules, RuleSet};

/// Stories shorter than this read as unfinished; longer than the max they
/// should be split.
const MIN_STORY_CHARS: usize = 50;
const MAX_STORY_CHARS: usize = 50_000;

/// Prompt length band the quality checks accept.
const MIN_PROMPT_CHARS: usize = 10;
const MAX_PROMPT_CHARS: usize = 500;

/// Confidence assigned to harmful-instruction hits in prompts.
const HARMFUL_PROMPT_CONFIDENCE: f64 = 0.9;

/// Inappropriate flags above this confidence block approval outright.
const BLOCKING_CONFIDENCE: f64 = 0.8;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting the filter configuration.
///
/// Following the same pattern as the other domain stores: the core defines
/// the contract, infra provides SQLite and in-memory implementations.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Load the current filter configuration.
    async fn load(&self) -> Result<FilterConfig, ModerationError>;

    /// Replace the stored filter configuration.
    async fn save(&self, config: FilterConfig) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Screens user-submitted text against the configured content policies.
///
/// The `moderate_*` entry points load the configuration through the store and
/// fail open when that read fails; the `screen*` functions are the pure
/// engine and take the configuration explicitly.
pub struct ModerationService<S: FilterStore> {
    store: S,
    rules: RuleSet,
}

impl<S: FilterStore> ModerationService<S> {
    /// Create a service with the default rule tables.
    pub fn new(store: S) -> Self {
        Self {
            store,
            rules: RuleSet::default(),
        }
    }

    /// Create a service with custom rule tables (localized deployments).
    #[allow(dead_code)]
    pub fn with_rules(store: S, rules: RuleSet) -> Self {
        Self { store, rules }
    }

    /// Screen free-form text declared as `content_type`.
    pub async fn moderate_text(&self, content: &str, content_type: &str) -> ModerationOutcome {
        match self.store.load().await {
            Ok(config) => ModerationOutcome::Clean(self.screen(&config, content, content_type)),
            Err(err) => Self::degrade(err),
        }
    }

    /// Screen a full story payload: every reader-visible field is scanned,
    /// then structural suggestions are appended.
    pub async fn moderate_story(&self, story: &StoryPayload) -> ModerationOutcome {
        match self.store.load().await {
            Ok(config) => ModerationOutcome::Clean(self.screen_story(&config, story)),
            Err(err) => Self::degrade(err),
        }
    }

    /// Screen a what-if prompt, with optional surrounding context.
    pub async fn moderate_prompt(
        &self,
        prompt: &str,
        context: Option<&str>,
    ) -> ModerationOutcome {
        match self.store.load().await {
            Ok(config) => ModerationOutcome::Clean(self.screen_prompt(&config, prompt, context)),
            Err(err) => Self::degrade(err),
        }
    }

    /// Current filter configuration (a copy).
    pub async fn get_filters(&self) -> Result<FilterConfig, ModerationError> {
        self.store.load().await
    }

    /// Shallow-merge a partial update into the stored configuration and
    /// return the merged result. Storage faults propagate here - the admin
    /// surface should see them, unlike the fail-open moderation path.
    pub async fn update_filters(
        &self,
        update: FilterUpdate,
    ) -> Result<FilterConfig, ModerationError> {
        let mut config = self.store.load().await?;
        config.apply(update);
        self.store.save(config.clone()).await?;
        tracing::info!(strict_mode = config.strict_mode, "moderation filters updated");
        Ok(config)
    }

    // ========================================================================
    // PURE SCREENING ENGINE
    // ========================================================================

    /// Run the category checks and custom blocklist over `content`.
    pub fn screen(
        &self,
        config: &FilterConfig,
        content: &str,
        content_type: &str,
    ) -> ModerationResult {
        let mut result = ModerationResult {
            is_approved: true,
            confidence: 1.0,
            categories: Vec::new(),
            flags: Vec::new(),
            suggestions: Vec::new(),
            requires_review: false,
        };

        // Disallowed content types are rejected before any scanning.
        if !config.allowed_content_types.iter().any(|t| t == content_type) {
            result.flags.push(Flag {
                flag_type: FlagType::Inappropriate,
                confidence: 1.0,
                description: format!("Content type '{content_type}' is not accepted"),
                suggestion: Some(format!(
                    "Allowed content types: {}",
                    config.allowed_content_types.join(", ")
                )),
            });
            Self::finalize(&mut result, config.strict_mode);
            return result;
        }

        let lowered = content.to_lowercase();

        for rules in &self.rules.categories {
            if !config.category_enabled(rules.category) {
                continue;
            }
            if let Some((score, flag)) = Self::check_category(rules, &lowered, config.strict_mode) {
                result.categories.push(score);
                if let Some(flag) = flag {
                    result.flags.push(flag);
                }
            }
        }

        Self::check_custom_terms(config, &lowered, &mut result.flags);

        Self::finalize(&mut result, config.strict_mode);
        result
    }

    /// Screen a story and append structural suggestions.
    pub fn screen_story(&self, config: &FilterConfig, story: &StoryPayload) -> ModerationResult {
        let mut result = self.screen(config, &story.combined_text(), "story");

        if story.title.trim().chars().count() < 3 {
            result
                .suggestions
                .push("Give the story a longer, more descriptive title".to_string());
        }
        if story.nodes.is_empty() {
            result
                .suggestions
                .push("Add at least one story node before publishing".to_string());
        }
        let total = story.total_content_chars();
        if total < MIN_STORY_CHARS {
            result.suggestions.push(format!(
                "Stories under {MIN_STORY_CHARS} characters read as unfinished; expand the opening node"
            ));
        } else if total > MAX_STORY_CHARS {
            result.suggestions.push(format!(
                "Story exceeds {MAX_STORY_CHARS} characters; consider splitting it into parts"
            ));
        }

        Self::finalize(&mut result, config.strict_mode);
        result
    }

    /// Screen a prompt: keyword screen over prompt plus context, quality
    /// suggestions on the prompt itself, and the harmful-instruction check.
    pub fn screen_prompt(
        &self,
        config: &FilterConfig,
        prompt: &str,
        context: Option<&str>,
    ) -> ModerationResult {
        let scanned = match context {
            Some(context) => format!("{prompt}\n{context}"),
            None => prompt.to_string(),
        };
        let mut result = self.screen(config, &scanned, "prompt");

        let trimmed = prompt.trim();
        let length = trimmed.chars().count();
        if length < MIN_PROMPT_CHARS {
            result.suggestions.push(format!(
                "Expand the prompt to at least {MIN_PROMPT_CHARS} characters; very short prompts produce thin stories"
            ));
        } else if length > MAX_PROMPT_CHARS {
            result.suggestions.push(format!(
                "Shorten the prompt to under {MAX_PROMPT_CHARS} characters"
            ));
        }
        if !trimmed.contains('?') {
            result
                .suggestions
                .push("Phrase the prompt as a question ending with '?'".to_string());
        }
        if !trimmed.to_lowercase().starts_with("what if") {
            result
                .suggestions
                .push("Start the prompt with \"What if\" to fit the platform format".to_string());
        }

        let lowered = scanned.to_lowercase();
        for phrase in &self.rules.harmful_instruction_phrases {
            if lowered.contains(phrase.as_str()) {
                result.flags.push(Flag {
                    flag_type: FlagType::Inappropriate,
                    confidence: HARMFUL_PROMPT_CONFIDENCE,
                    description: "Prompt requests instructions for causing harm".to_string(),
                    suggestion: Some(
                        "Rework the prompt into a fictional scenario without real-world instructions"
                            .to_string(),
                    ),
                });
            }
        }

        Self::finalize(&mut result, config.strict_mode);
        result
    }

    // ========================================================================
    // CHECK HELPERS
    // ========================================================================

    /// Run one category's rule table over the lowercased text.
    ///
    /// Returns the category score (when at least one pattern matched) and the
    /// flag, if the detection cleared the reporting bar.
    fn check_category(
        rules: &CategoryRules,
        lowered: &str,
        strict_mode: bool,
    ) -> Option<(CategoryScore, Option<Flag>)> {
        let mut confidence = 0.0;
        let mut hits = 0usize;
        for rule in rules.keywords.iter().chain(rules.phrases.iter()) {
            if lowered.contains(rule.pattern.as_str()) {
                confidence += rule.weight;
                hits += 1;
            }
        }
        if hits == 0 {
            return None;
        }

        let confidence = confidence.min(rules.confidence_cap);
        let severity = rules
            .severity_override
            .unwrap_or_else(|| Severity::from_confidence(confidence));
        let score = CategoryScore {
            category: rules.category,
            confidence,
            severity,
        };

        let flag = if rules.always_flag || confidence > rules.report_threshold || strict_mode {
            Some(Flag {
                flag_type: rules.category.flag_type(),
                confidence,
                description: format!(
                    "{} ({hits} matching {})",
                    Self::flag_description(rules.category),
                    if hits == 1 { "term" } else { "terms" }
                ),
                suggestion: Some(Self::flag_suggestion(rules.category).to_string()),
            })
        } else {
            None
        };

        Some((score, flag))
    }

    /// Custom blocklist: every matching word or phrase blocks outright.
    fn check_custom_terms(config: &FilterConfig, lowered: &str, flags: &mut Vec<Flag>) {
        for term in config
            .custom_blocked_words
            .iter()
            .chain(config.custom_blocked_phrases.iter())
        {
            if lowered.contains(term.to_lowercase().as_str()) {
                flags.push(Flag {
                    flag_type: FlagType::Inappropriate,
                    confidence: 1.0,
                    description: format!("Blocked term '{term}' is not allowed"),
                    suggestion: Some(format!("Remove '{term}' from the text")),
                });
            }
        }
    }

    /// Recompute the aggregate fields from the current flags and suggestions.
    /// Idempotent, so entry points that append flags re-run it.
    fn finalize(result: &mut ModerationResult, strict_mode: bool) {
        result.confidence = if result.flags.is_empty() {
            1.0
        } else {
            let mean = result.flags.iter().map(|f| f.confidence).sum::<f64>()
                / result.flags.len() as f64;
            (1.0 - mean).max(0.1)
        };

        let hate_flagged = result
            .flags
            .iter()
            .any(|f| f.flag_type == FlagType::HateSpeech);
        let blocked = result.flags.iter().any(|f| {
            f.flag_type == FlagType::Inappropriate && f.confidence > BLOCKING_CONFIDENCE
        });
        result.is_approved =
            !(hate_flagged || blocked || (strict_mode && !result.flags.is_empty()));

        result.requires_review = !result.flags.is_empty()
            || result.confidence < 0.7
            || !result.suggestions.is_empty();
    }

    fn flag_description(category: ContentCategory) -> &'static str {
        match category {
            ContentCategory::Violence => "Violent content detected",
            ContentCategory::AdultContent => "Adult content detected",
            ContentCategory::HateSpeech => "Hate speech detected",
            ContentCategory::Spam => "Spam-like content detected",
            ContentCategory::Copyright => "Potential copyrighted material detected",
        }
    }

    fn flag_suggestion(category: ContentCategory) -> &'static str {
        match category {
            ContentCategory::Violence => "Consider toning down the violent descriptions",
            ContentCategory::AdultContent => {
                "Remove explicit material or target a mature audience"
            }
            ContentCategory::HateSpeech => "Remove hateful or discriminatory language",
            ContentCategory::Spam => "Remove promotional language",
            ContentCategory::Copyright => {
                "Replace copyrighted names with original characters and settings"
            }
        }
    }

    /// Fail open: screening stays available even when the configuration is
    /// unreadable, but the result is marked degraded and routed to review.
    fn degrade(err: ModerationError) -> ModerationOutcome {
        tracing::error!("filter configuration unavailable, failing open: {err}");
        ModerationOutcome::Degraded(ModerationResult {
            is_approved: true,
            confidence: 0.5,
            categories: Vec::new(),
            flags: Vec::new(),
            suggestions: vec![
                "Automatic screening was unavailable; manual review is recommended".to_string(),
            ],
            requires_review: true,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::RwLock;

    /// In-memory store for testing
    #[derive(Default)]
    struct MemoryStore {
        config: RwLock<FilterConfig>,
    }

    #[async_trait]
    impl FilterStore for MemoryStore {
        async fn load(&self) -> Result<FilterConfig, ModerationError> {
            Ok(self.config.read().unwrap().clone())
        }

        async fn save(&self, config: FilterConfig) -> Result<(), ModerationError> {
            *self.config.write().unwrap() = config;
            Ok(())
        }
    }

    /// Store that always fails, for the fail-open path.
    struct BrokenStore;

    #[async_trait]
    impl FilterStore for BrokenStore {
        async fn load(&self) -> Result<FilterConfig, ModerationError> {
            Err(ModerationError::StorageError("connection refused".to_string()))
        }

        async fn save(&self, _config: FilterConfig) -> Result<(), ModerationError> {
            Err(ModerationError::StorageError("connection refused".to_string()))
        }
    }

    fn service() -> ModerationService<MemoryStore> {
        ModerationService::new(MemoryStore::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn clean_story_text_is_approved() {
        let service = service();

        let outcome = service
            .moderate_text("What if the detective discovers a clue?", "story")
            .await;

        assert!(!outcome.is_degraded());
        let result = outcome.result();
        assert!(result.is_approved);
        assert!(result.flags.is_empty());
        assert!(result.categories.is_empty());
        assert_close(result.confidence, 1.0);
        assert!(!result.requires_review);
    }

    #[tokio::test]
    async fn hate_speech_is_always_blocked() {
        let service = service();

        let outcome = service
            .moderate_text("I hate you, you racist pig", "story")
            .await;

        let result = outcome.result();
        assert!(!result.is_approved);
        assert!(result
            .flags
            .iter()
            .any(|f| f.flag_type == FlagType::HateSpeech));
        let hate_score = result
            .categories
            .iter()
            .find(|c| c.category == ContentCategory::HateSpeech)
            .expect("hate speech category should be recorded");
        assert_eq!(hate_score.severity, Severity::Critical);
        assert!(result.requires_review);
    }

    #[tokio::test]
    async fn disallowed_content_type_is_rejected() {
        let service = service();

        let outcome = service
            .moderate_text("A perfectly pleasant sentence.", "poem")
            .await;

        let result = outcome.result();
        assert!(!result.is_approved);
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].flag_type, FlagType::Inappropriate);
        assert!(result.requires_review);
    }

    #[tokio::test]
    async fn identical_input_yields_identical_results() {
        let service = service();

        let first = service
            .moderate_text("The pirates fight over the treasure", "story")
            .await;
        let second = service
            .moderate_text("The pirates fight over the treasure", "story")
            .await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn below_threshold_detection_records_category_without_flag() {
        let service = service();

        let outcome = service.moderate_text("a fight breaks out", "story").await;

        let result = outcome.result();
        assert!(result.is_approved);
        assert!(result.flags.is_empty());
        let violence = result
            .categories
            .iter()
            .find(|c| c.category == ContentCategory::Violence)
            .expect("violence category should be recorded");
        assert_close(violence.confidence, 0.1);
        assert_eq!(violence.severity, Severity::Low);
    }

    #[tokio::test]
    async fn strict_mode_flags_low_confidence_detections() {
        let service = service();
        service
            .update_filters(FilterUpdate {
                strict_mode: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = service.moderate_text("a fight breaks out", "story").await;

        let result = outcome.result();
        assert!(result
            .categories
            .iter()
            .any(|c| c.category == ContentCategory::Violence));
        let flag = result
            .flags
            .iter()
            .find(|f| f.flag_type == FlagType::Violence)
            .expect("strict mode should flag the detection");
        assert!(flag.confidence < 0.5);
        // Strict mode also turns any flag into a rejection.
        assert!(!result.is_approved);
    }

    #[tokio::test]
    async fn custom_blocklist_always_blocks() {
        let service = service();
        service
            .update_filters(FilterUpdate {
                custom_blocked_words: Some(vec!["zorblax".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = service
            .moderate_text("The wizard Zorblax appears in a puff of smoke", "story")
            .await;

        let result = outcome.result();
        assert!(!result.is_approved);
        let flag = result
            .flags
            .iter()
            .find(|f| f.flag_type == FlagType::Inappropriate)
            .expect("blocked term should be flagged");
        assert_close(flag.confidence, 1.0);
        // A single full-confidence flag drives the aggregate to the floor.
        assert_close(result.confidence, 0.1);
    }

    #[tokio::test]
    async fn disabled_category_filter_skips_the_check() {
        let service = service();
        service
            .update_filters(FilterUpdate {
                violence_filter: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = service.moderate_text("a fight breaks out", "story").await;

        let result = outcome.result();
        assert!(result.categories.is_empty());
        assert!(result.is_approved);
    }

    #[tokio::test]
    async fn update_filters_merges_partial_config() {
        let service = service();

        let merged = service
            .update_filters(FilterUpdate {
                strict_mode: Some(true),
                spam_filter: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(merged.strict_mode);
        assert!(!merged.spam_filter);
        // Untouched fields keep their defaults.
        assert!(merged.violence_filter);
        assert_eq!(merged.allowed_content_types.len(), 3);

        let fetched = service.get_filters().await.unwrap();
        assert_eq!(fetched, merged);
    }

    #[tokio::test]
    async fn fail_open_returns_degraded_approval() {
        let service = ModerationService::new(BrokenStore);

        let outcome = service.moderate_text("anything at all", "story").await;

        assert!(outcome.is_degraded());
        let result = outcome.result();
        assert!(result.is_approved);
        assert_close(result.confidence, 0.5);
        assert!(result.flags.is_empty());
        assert_eq!(result.suggestions.len(), 1);
        assert!(result.requires_review);
    }

    #[tokio::test]
    async fn story_screening_covers_branch_labels() {
        let service = service();

        let story = StoryPayload {
            title: "The crossroads".to_string(),
            description: Some("An interactive tale of choices".to_string()),
            nodes: vec![crate::core::moderation::StoryNode {
                content: "You stand at a quiet crossroads at dusk, wondering which path leads home."
                    .to_string(),
                node_type: None,
            }],
            branches: vec![crate::core::moderation::StoryBranch {
                label: "Follow the racist mob".to_string(),
                branch_type: None,
            }],
        };

        let outcome = service.moderate_story(&story).await;

        let result = outcome.result();
        assert!(!result.is_approved);
        assert!(result
            .flags
            .iter()
            .any(|f| f.flag_type == FlagType::HateSpeech));
    }

    #[tokio::test]
    async fn story_structural_suggestions_are_appended() {
        let service = service();

        let story = StoryPayload {
            title: "Hi".to_string(),
            description: None,
            nodes: Vec::new(),
            branches: Vec::new(),
        };

        let outcome = service.moderate_story(&story).await;

        let result = outcome.result();
        assert!(result.is_approved);
        assert!(result.suggestions.iter().any(|s| s.contains("title")));
        assert!(result.suggestions.iter().any(|s| s.contains("node")));
        assert!(result.suggestions.iter().any(|s| s.contains("unfinished")));
        assert!(result.requires_review);
    }

    #[tokio::test]
    async fn prompt_quality_suggestions_are_appended() {
        let service = service();

        let outcome = service.moderate_prompt("tell me a story", None).await;

        let result = outcome.result();
        assert!(result.is_approved);
        assert!(result.flags.is_empty());
        assert!(result.suggestions.iter().any(|s| s.contains('?')));
        assert!(result.suggestions.iter().any(|s| s.contains("What if")));
        assert!(result.requires_review);
    }

    #[tokio::test]
    async fn well_formed_prompt_has_no_quality_suggestions() {
        let service = service();

        let outcome = service
            .moderate_prompt("What if the moon suddenly vanished one night?", None)
            .await;

        let result = outcome.result();
        assert!(result.is_approved);
        assert!(result.suggestions.is_empty());
        assert!(!result.requires_review);
    }

    #[tokio::test]
    async fn harmful_prompt_instructions_are_rejected() {
        let service = service();

        let outcome = service
            .moderate_prompt("What if someone explained how to make a bomb?", None)
            .await;

        let result = outcome.result();
        assert!(!result.is_approved);
        let flag = result
            .flags
            .iter()
            .find(|f| f.flag_type == FlagType::Inappropriate)
            .expect("harmful instructions should be flagged");
        assert_close(flag.confidence, 0.9);
    }

    #[tokio::test]
    async fn prompt_context_joins_the_keyword_screen() {
        let service = service();

        let outcome = service
            .moderate_prompt(
                "What if the kingdom fell?",
                Some("The usurper is a violent supremacist"),
            )
            .await;

        let result = outcome.result();
        assert!(result
            .flags
            .iter()
            .any(|f| f.flag_type == FlagType::HateSpeech));
        assert!(!result.is_approved);
    }

    #[test]
    fn severity_buckets_follow_the_fixed_thresholds() {
        assert_eq!(Severity::from_confidence(0.8), Severity::High);
        assert_eq!(Severity::from_confidence(0.7), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.5), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.4), Severity::Low);
        assert_eq!(Severity::from_confidence(0.1), Severity::Low);
    }
}
