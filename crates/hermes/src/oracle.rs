//! The question-answering pipeline.
//!
//! `interpret` loads the user's chart, computes transits for now, keeps the
//! ones relevant to the question, renders a prompt with the recent
//! conversation and asks the narrator. Both sides of the exchange are then
//! appended to the conversation log.

use crate::narrative::{NarrativeError, NarrativeGenerator};
use crate::prompt::{PromptBuilder, Voice};
use crate::store::{ChartStore, ConversationStore, ConversationTurn, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use urania::{
    compute_natal_chart, filter_relevant, BirthData, EphemerisError, EphemerisProvider,
    NatalChart, TransitEngine, TransitError, TransitSnapshot,
};

pub const DEFAULT_HISTORY_TURNS: usize = 6;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("No natal chart stored for user {0}")]
    ChartNotFound(String),
    #[error(transparent)]
    Transit(#[from] TransitError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error("Ephemeris worker stopped: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Transits for a user plus, when a question was asked, the narrator's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub transits: Vec<TransitSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

pub struct Oracle<P> {
    engine: Arc<TransitEngine<P>>,
    charts: Arc<dyn ChartStore>,
    conversations: Arc<dyn ConversationStore>,
    narrator: Arc<dyn NarrativeGenerator>,
    history_turns: usize,
}

impl<P: EphemerisProvider + 'static> Oracle<P> {
    pub fn new(
        provider: P,
        charts: Arc<dyn ChartStore>,
        conversations: Arc<dyn ConversationStore>,
        narrator: Arc<dyn NarrativeGenerator>,
    ) -> Self {
        Self {
            engine: Arc::new(TransitEngine::new(provider)),
            charts,
            conversations,
            narrator,
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Run ephemeris work on the blocking pool; the provider calls are synchronous.
    async fn on_engine<T, F>(&self, work: F) -> Result<T, OracleError>
    where
        T: Send + 'static,
        F: FnOnce(&TransitEngine<P>) -> Result<T, OracleError> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || work(&engine)).await?
    }

    /// Cast and store the natal chart for `user_id`, replacing any previous one.
    pub async fn create_chart(
        &self,
        user_id: &str,
        birth: &BirthData,
    ) -> Result<NatalChart, OracleError> {
        let birth = birth.clone();
        let chart = self
            .on_engine(move |engine| Ok(compute_natal_chart(engine.provider(), &birth)?))
            .await?;
        self.charts.save_chart(user_id, &chart).await?;
        log::info!(
            "stored natal chart for {user_id} ({} planets)",
            chart.planets.as_ref().map_or(0, Vec::len)
        );
        Ok(chart)
    }

    pub async fn chart(&self, user_id: &str) -> Result<NatalChart, OracleError> {
        self.charts
            .load_chart(user_id)
            .await?
            .ok_or_else(|| OracleError::ChartNotFound(user_id.to_string()))
    }

    pub async fn has_chart(&self, user_id: &str) -> Result<bool, OracleError> {
        Ok(self.charts.load_chart(user_id).await?.is_some())
    }

    /// All transit snapshots for the user's chart at the current instant.
    pub async fn transits(&self, user_id: &str) -> Result<Vec<TransitSnapshot>, OracleError> {
        self.transits_at(user_id, Utc::now()).await
    }

    pub async fn transits_at(
        &self,
        user_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<Vec<TransitSnapshot>, OracleError> {
        let chart = self.chart(user_id).await?;
        self.on_engine(move |engine| Ok(engine.compute_transits(&chart, instant)?))
            .await
    }

    /// Answer `question` for the user.
    ///
    /// The returned transits are the relevant subset the narrator saw.
    pub async fn interpret(
        &self,
        user_id: &str,
        question: &str,
        voice: Voice,
    ) -> Result<Reading, OracleError> {
        self.interpret_at(user_id, question, voice, Utc::now()).await
    }

    pub async fn interpret_at(
        &self,
        user_id: &str,
        question: &str,
        voice: Voice,
        instant: DateTime<Utc>,
    ) -> Result<Reading, OracleError> {
        let chart = self.chart(user_id).await?;
        let (chart, all) = self
            .on_engine(move |engine| {
                let all = engine.compute_transits(&chart, instant)?;
                Ok((chart, all))
            })
            .await?;
        let relevant = filter_relevant(&all, question, &chart);
        log::debug!(
            "{user_id}: {} of {} transits relevant to the question",
            relevant.len(),
            all.len()
        );

        let history = self
            .conversations
            .recent_turns(user_id, self.history_turns)
            .await?;
        let prompt = PromptBuilder::new(voice).build(&chart, &relevant, &history, question);
        let answer = self.narrator.generate(&prompt).await?;

        self.conversations
            .append_turn(user_id, &ConversationTurn::user(question.trim()))
            .await?;
        self.conversations
            .append_turn(user_id, &ConversationTurn::assistant(answer.as_str()))
            .await?;

        Ok(Reading {
            transits: relevant,
            interpretation: Some(answer),
        })
    }
}
