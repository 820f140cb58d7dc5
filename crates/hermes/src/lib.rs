//! Hermes - carries questions to the stars and answers back.
//!
//! Wraps the `urania` engine with everything a chat product needs around it:
//! chart and conversation storage, place lookup, prompt rendering, the LLM
//! narrator and a Telegram bot.

pub mod bot;
pub mod locale;
pub mod location;
pub mod narrative;
pub mod oracle;
pub mod prompt;
pub mod session;
pub mod store;
pub mod telegram;

pub use bot::{chart_summary, local_to_utc, Bot};
pub use locale::{BotText, Dialect, Locale};
pub use location::{LocationError, LocationResolver, OpenMeteoResolver, ResolvedPlace};
pub use narrative::{ChatCompletionsNarrator, NarrativeError, NarrativeGenerator, NarratorConfig};
pub use oracle::{Oracle, OracleError, Reading};
pub use prompt::{PromptBuilder, PromptContext, Voice};
pub use session::{MemorySessionStore, Session, SessionInputError, Step};
pub use store::{
    ChartStore, ConversationStore, ConversationTurn, DocumentStore, MemoryStore, Role, StoreError,
};
pub use telegram::{TelegramClient, TelegramError};
