// Rule tables for the screening pipeline.
//
// The tables are plain data so deployments can swap or localize them without
// touching the engine. Weights, caps and reporting thresholds are the tuning
// constants carried over from production moderation.

use serde::{Deserialize, Serialize};

use super::moderation_models::{ContentCategory, Severity};

/// A single pattern and the confidence weight one hit contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stored lowercase; matching is case-insensitive substring search.
    pub pattern: String,
    pub weight: f64,
}

impl Rule {
    pub fn new(pattern: &str, weight: f64) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            weight,
        }
    }
}

/// Screening rules for one content category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRules {
    pub category: ContentCategory,
    /// Single-token patterns.
    pub keywords: Vec<Rule>,
    /// Multi-word patterns; typically weighted heavier than keywords.
    pub phrases: Vec<Rule>,
    /// Upper bound on the category confidence.
    pub confidence_cap: f64,
    /// Minimum confidence before a detection becomes a flag. Ignored when
    /// `always_flag` is set or strict mode is on.
    pub report_threshold: f64,
    /// Fixed severity; `None` buckets severity from confidence.
    pub severity_override: Option<Severity>,
    /// Flag every detection regardless of confidence.
    pub always_flag: bool,
}

impl CategoryRules {
    fn new(category: ContentCategory, cap: f64, threshold: f64) -> Self {
        Self {
            category,
            keywords: Vec::new(),
            phrases: Vec::new(),
            confidence_cap: cap,
            report_threshold: threshold,
            severity_override: None,
            always_flag: false,
        }
    }

    fn keywords(mut self, weight: f64, patterns: &[&str]) -> Self {
        self.keywords = patterns.iter().map(|p| Rule::new(p, weight)).collect();
        self
    }

    fn phrases(mut self, weight: f64, patterns: &[&str]) -> Self {
        self.phrases = patterns.iter().map(|p| Rule::new(p, weight)).collect();
        self
    }

    fn always_flag(mut self, severity: Severity) -> Self {
        self.always_flag = true;
        self.severity_override = Some(severity);
        self
    }
}

/// The full rule set the moderation engine runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub categories: Vec<CategoryRules>,
    /// Phrases that read as instructions for real-world harm. Any occurrence
    /// in a prompt is flagged outright.
    pub harmful_instruction_phrases: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryRules::new(ContentCategory::Violence, 0.9, 0.5)
                    .keywords(
                        0.1,
                        &[
                            "kill", "murder", "stab", "shoot", "strangle", "massacre",
                            "torture", "mutilate", "behead", "gore", "fight", "assault",
                        ],
                    )
                    .phrases(
                        0.3,
                        &[
                            "beat to death",
                            "burn them alive",
                            "slit their throat",
                            "shoot up the",
                            "bathed in blood",
                        ],
                    ),
                CategoryRules::new(ContentCategory::AdultContent, 0.9, 0.6)
                    .keywords(
                        0.15,
                        &["nude", "naked", "erotic", "porn", "xxx", "fetish", "orgasm"],
                    )
                    .phrases(
                        0.35,
                        &["sexually explicit", "graphic sex", "adults only content"],
                    ),
                CategoryRules::new(ContentCategory::HateSpeech, 0.95, 0.0)
                    .keywords(
                        0.2,
                        &[
                            "racist",
                            "bigot",
                            "nazi",
                            "supremacist",
                            "sexist",
                            "homophobic",
                        ],
                    )
                    .phrases(
                        0.4,
                        &[
                            "go back to your country",
                            "your kind does not belong",
                            "ethnic cleansing",
                            "racial purity",
                        ],
                    )
                    .always_flag(Severity::Critical),
                CategoryRules::new(ContentCategory::Spam, 0.8, 0.5)
                    .keywords(
                        0.1,
                        &[
                            "viagra", "casino", "lottery", "jackpot", "giveaway",
                            "crypto", "subscribe",
                        ],
                    )
                    .phrases(
                        0.25,
                        &[
                            "buy now",
                            "click here",
                            "free money",
                            "limited time offer",
                            "make money fast",
                            "dm me for",
                        ],
                    ),
                CategoryRules::new(ContentCategory::Copyright, 0.85, 0.6)
                    .keywords(
                        0.15,
                        &[
                            "hogwarts",
                            "voldemort",
                            "pokemon",
                            "batman",
                            "skywalker",
                            "wakanda",
                        ],
                    )
                    .phrases(
                        0.3,
                        &[
                            "harry potter",
                            "star wars",
                            "lord of the rings",
                            "game of thrones",
                            "marvel universe",
                        ],
                    ),
            ],
            harmful_instruction_phrases: [
                "how to make a bomb",
                "how to make explosives",
                "how to poison",
                "how to hurt someone",
                "ways to kill",
                "how to hack into",
                "kill yourself",
                "how to self harm",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }
}
