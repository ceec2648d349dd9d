//! Answer generation strategies.
//!
//! `ask` can be backed either by a hosted chat model or by a rule book of
//! prepared answers. The rule book needs no credentials and no network,
//! which keeps the pipeline demonstrable offline; it is the default.

use crate::error::ChatError;
use crate::models::{Config, LlmInfo, StrategyKind};
use crate::services::chat::ChatClient;

/// Generated answer plus backend usage, when a backend was involved.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub answer: String,
    pub llm: Option<LlmInfo>,
}

struct Rule {
    keywords: &'static [&'static str],
    answer: &'static str,
}

/// Prepared answers keyed by query keywords, for the documentation set
/// this tool ships against (live-broadcast group messaging docs).
const RULES: &[Rule] = &[
    Rule {
        keywords: &["member", "limit", "capacity", "size"],
        answer: "**Live-broadcast (AVChatRoom) groups have no member cap.** Any number of \
users may join, and joining requires no approval. The trade-off is that the member list \
is not fully maintained: only a recent window of members is visible, and member-change \
notifications are sampled rather than delivered per user.",
    },
    Rule {
        keywords: &["history", "offline", "roaming", "stored"],
        answer: "**Message history is not kept for live-broadcast groups.** Members only \
receive messages sent while they are online and joined; there is no roaming or offline \
push for this group type. If history matters, use a community or work group instead, or \
persist messages yourself via server-side callbacks.",
    },
    Rule {
        keywords: &["callback", "webhook", "event"],
        answer: "**Server-side callbacks fire before and after group message delivery.** \
The before-send callback can reject or rewrite a message, the after-send callback is \
fire-and-forget and suited to archiving or moderation pipelines. Callbacks are configured \
per app and apply to all groups of the enabled types.",
    },
    Rule {
        keywords: &["mute", "ban", "silence", "shutup"],
        answer: "**Muting works per member or for the whole group.** A muted member's \
messages are rejected at send time with a dedicated error code. Whole-group muting still \
lets group owners and administrators speak, which is the usual setup for announcement \
channels during a broadcast.",
    },
];

const FALLBACK: &str = "The retrieved documentation does not contain a prepared answer \
for this question.";

/// Answers a query against assembled context.
pub enum AnswerStrategy {
    Remote(ChatClient),
    RuleBased,
}

impl AnswerStrategy {
    /// Build the strategy the configuration selects. Only the remote
    /// strategy needs credentials, so rule-based construction cannot fail.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        match config.generation.strategy {
            StrategyKind::Remote => Ok(Self::Remote(ChatClient::new(&config.chat)?)),
            StrategyKind::RuleBased => Ok(Self::RuleBased),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Remote(_) => StrategyKind::Remote,
            Self::RuleBased => StrategyKind::RuleBased,
        }
    }

    /// Produce an answer for `query` grounded in `context`.
    ///
    /// The rule-based arm never fails; remote failures propagate so the
    /// caller can record them in the run report instead of aborting.
    pub async fn answer(&self, query: &str, context: &str) -> Result<GenerationOutcome, ChatError> {
        match self {
            Self::Remote(client) => {
                let outcome = client.complete(query, context).await?;
                Ok(GenerationOutcome {
                    answer: outcome.answer,
                    llm: Some(outcome.llm),
                })
            }
            Self::RuleBased => Ok(GenerationOutcome {
                answer: rule_based_answer(query),
                llm: None,
            }),
        }
    }
}

fn rule_based_answer(query: &str) -> String {
    let lowered = query.to_lowercase();
    for rule in RULES {
        if rule.keywords.iter().any(|kw| lowered.contains(kw)) {
            return rule.answer.to_string();
        }
    }
    format!("{} (asked: \"{}\")", FALLBACK, query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_dispatch_is_case_insensitive() {
        let answer = rule_based_answer("Is there a MEMBER limit?");
        assert!(answer.contains("no member cap"));
    }

    #[test]
    fn test_fallback_interpolates_query() {
        let answer = rule_based_answer("what color is the sky");
        assert!(answer.contains("what color is the sky"));
        assert!(answer.contains(FALLBACK));
    }

    #[tokio::test]
    async fn test_rule_based_strategy_answers_without_backend() {
        let strategy = AnswerStrategy::RuleBased;
        let outcome = strategy
            .answer("do groups keep message history?", "## ctx\n\nbody\n\n")
            .await
            .unwrap();
        assert!(outcome.answer.contains("history"));
        assert!(outcome.llm.is_none());
    }

    #[test]
    fn test_from_config_defaults_to_rule_based() {
        let config = Config::default();
        let strategy = AnswerStrategy::from_config(&config).unwrap();
        assert_eq!(strategy.kind(), StrategyKind::RuleBased);
    }
}
