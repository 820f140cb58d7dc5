//! Chat front end: onboarding through the session state machine, then
//! questions for the oracle.

use crate::locale::{BotText, Locale};
use crate::location::LocationResolver;
use crate::oracle::{Oracle, OracleError};
use crate::prompt::Voice;
use crate::session::{MemorySessionStore, Session, Step};
use crate::telegram::TelegramClient;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use urania::{BirthData, Body, EphemerisProvider, NatalChart, Sign};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Bot<P> {
    oracle: Arc<Oracle<P>>,
    resolver: Arc<dyn LocationResolver>,
    sessions: MemorySessionStore,
}

impl<P: EphemerisProvider + 'static> Bot<P> {
    pub fn new(oracle: Arc<Oracle<P>>, resolver: Arc<dyn LocationResolver>) -> Self {
        Self {
            oracle,
            resolver,
            sessions: MemorySessionStore::new(),
        }
    }

    /// Handle one incoming text and return the replies to send, in order.
    ///
    /// `language_hint` is the client's language code, used when a user with a
    /// stored chart writes without an onboarding session in memory.
    pub async fn handle_message(
        &self,
        chat_id: i64,
        text: &str,
        language_hint: Option<&str>,
    ) -> Vec<String> {
        let text = text.trim();
        let user_id = chat_id.to_string();

        if text.starts_with("/start") {
            return vec![self.sessions.reset(chat_id).await.prompt()];
        }

        let mut session = match self.sessions.get(chat_id).await {
            Some(session) => session,
            None => match self.oracle.has_chart(&user_id).await {
                Ok(true) => {
                    let locale = language_hint.and_then(Locale::from_code).unwrap_or_default();
                    Session::completed(locale, None)
                }
                Ok(false) => Session::new(),
                Err(e) => {
                    log::error!("chat {chat_id}: chart lookup failed: {e}");
                    return vec![Locale::default().text(BotText::AnswerFailed).to_string()];
                }
            },
        };

        if session.is_done() {
            let replies = self.answer(chat_id, &user_id, &session, text).await;
            if replies.is_empty() {
                // Chart vanished from the store; onboard again
                return vec![self.sessions.reset(chat_id).await.prompt()];
            }
            self.sessions.put(chat_id, session).await;
            return replies;
        }

        let replies = match session.advance(text) {
            Err(e) => {
                log::debug!("chat {chat_id}: rejected input at {:?}: {e}", session.step);
                vec![session.error_text(&e).to_string(), session.prompt()]
            }
            Ok(Step::Done) => self.finish_onboarding(chat_id, &user_id, &mut session).await,
            Ok(_) => vec![session.prompt()],
        };
        self.sessions.put(chat_id, session).await;
        replies
    }

    async fn answer(&self, chat_id: i64, user_id: &str, session: &Session, question: &str) -> Vec<String> {
        let voice = Voice::new(session.locale, session.dialect);
        match self.oracle.interpret(user_id, question, voice).await {
            Ok(reading) => vec![reading
                .interpretation
                .unwrap_or_else(|| session.locale.text(BotText::AnswerFailed).to_string())],
            Err(OracleError::ChartNotFound(_)) => Vec::new(),
            Err(e) => {
                log::error!("chat {chat_id}: interpretation failed: {e}");
                vec![session.locale.text(BotText::AnswerFailed).to_string()]
            }
        }
    }

    async fn finish_onboarding(
        &self,
        chat_id: i64,
        user_id: &str,
        session: &mut Session,
    ) -> Vec<String> {
        let locale = session.locale;
        let place = session.place.clone().unwrap_or_default();

        let resolved = match self.resolver.resolve(&place).await {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("chat {chat_id}: could not resolve {place:?}: {e}");
                session.retry_place();
                return vec![locale.text(BotText::PlaceNotFound).to_string(), session.prompt()];
            }
        };

        let instant = session
            .local_birth()
            .and_then(|local| local_to_utc(local, resolved.utc_offset_minutes));
        let Some(instant) = instant else {
            log::warn!("chat {chat_id}: birth time not representable, restarting onboarding");
            *session = Session::new();
            return vec![locale.text(BotText::InvalidDate).to_string(), session.prompt()];
        };

        let birth = BirthData {
            instant,
            location: resolved.location,
            place_name: Some(resolved.name),
        };
        match self.oracle.create_chart(user_id, &birth).await {
            Ok(chart) => vec![
                locale.text(BotText::ChartReady).to_string(),
                chart_summary(&chart, locale),
            ],
            Err(e) => {
                log::error!("chat {chat_id}: natal chart failed: {e}");
                session.retry_place();
                vec![locale.text(BotText::ChartFailed).to_string()]
            }
        }
    }

    /// Long-poll Telegram forever, answering messages one at a time.
    // TODO: handle chats concurrently once sessions are locked per chat id
    pub async fn run(&self, client: &TelegramClient) {
        log::info!("telegram: polling for updates");
        let mut offset = None;
        loop {
            let updates = match client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    log::warn!("telegram: getUpdates failed: {e}");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text.as_deref() else {
                    continue;
                };
                let hint = message
                    .from
                    .as_ref()
                    .and_then(|u| u.language_code.as_deref());
                for reply in self.handle_message(message.chat.id, text, hint).await {
                    if let Err(e) = client.send_message(message.chat.id, &reply).await {
                        log::warn!("telegram: reply to chat {} failed: {e}", message.chat.id);
                    }
                }
            }
        }
    }
}

/// Interpret a wall-clock time at a fixed UTC offset.
pub fn local_to_utc(local: NaiveDateTime, offset_minutes: i32) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(offset_minutes.checked_mul(60)?)?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// One line naming the Sun sign, Moon sign and rising sign.
pub fn chart_summary(chart: &NatalChart, locale: Locale) -> String {
    let mut parts = Vec::with_capacity(3);
    for body in [Body::Sun, Body::Moon] {
        if let Some(lon) = chart.planet(body).and_then(|p| p.longitude) {
            parts.push(format!(
                "{}: {}",
                locale.body_name(body),
                locale.sign_name(Sign::from_longitude(lon))
            ));
        }
    }
    parts.push(format!(
        "{}: {}",
        locale.prompt_labels().ascendant,
        locale.sign_name(Sign::from_longitude(chart.ascendant))
    ));
    parts.join(" · ")
}
