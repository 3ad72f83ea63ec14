//! LLM analysis: prompts, the chat client, pacing, and the per-commit loop.

pub mod analyze;
pub mod client;
pub mod prompt;
pub mod rate;

pub use analyze::{AnalysisRecord, Sleeper, TokioSleeper, analyze_commits, score_commits};
pub use client::{ChatClient, ChatReply, HttpChatClient, LlmSettings};
pub use prompt::{system_prompt, truncate_patch, user_prompt};
pub use rate::RateController;
