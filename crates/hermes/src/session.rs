//! Onboarding state machine for chat users.
//!
//! A session walks `Language -> Dialect -> BirthDay -> BirthMonth ->
//! BirthYear -> BirthHour -> BirthMinute -> Place -> Done`. The dialect step
//! is only visited when Arabic was chosen.

use crate::locale::{BotText, Dialect, Locale, LANGUAGE_MENU};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

pub const MIN_BIRTH_YEAR: i32 = 1800;
pub const MAX_BIRTH_YEAR: i32 = 2399;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Language,
    Dialect,
    BirthDay,
    BirthMonth,
    BirthYear,
    BirthHour,
    BirthMinute,
    Place,
    Done,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionInputError {
    #[error("unrecognised language {0:?}")]
    UnknownLanguage(String),
    #[error("unrecognised dialect {0:?}")]
    UnknownDialect(String),
    #[error("{field} must be a number between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{day:02}/{month:02}/{year} is not a calendar date")]
    InvalidDate { day: u32, month: u32, year: i32 },
    #[error("place name is empty")]
    EmptyPlace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub step: Step,
    pub locale: Locale,
    pub dialect: Option<Dialect>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub place: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            step: Step::Language,
            locale: Locale::default(),
            dialect: None,
            day: None,
            month: None,
            year: None,
            hour: None,
            minute: None,
            place: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session for a user whose chart already exists.
    pub fn completed(locale: Locale, dialect: Option<Dialect>) -> Self {
        Self {
            step: Step::Done,
            locale,
            dialect,
            ..Self::default()
        }
    }

    pub fn is_done(&self) -> bool {
        self.step == Step::Done
    }

    /// Feed one user message to the current step and return the new step.
    ///
    /// On error the session stays on the same step, except for an impossible
    /// date, which clears day, month and year and returns to `BirthDay`.
    /// A `Done` session ignores input.
    pub fn advance(&mut self, input: &str) -> Result<Step, SessionInputError> {
        let input = input.trim();
        self.step = match self.step {
            Step::Language => {
                self.locale = Locale::from_code(input)
                    .ok_or_else(|| SessionInputError::UnknownLanguage(input.to_string()))?;
                if self.locale == Locale::Ar {
                    Step::Dialect
                } else {
                    Step::BirthDay
                }
            }
            Step::Dialect => {
                let dialect = Dialect::from_code(input)
                    .ok_or_else(|| SessionInputError::UnknownDialect(input.to_string()))?;
                self.dialect = Some(dialect);
                Step::BirthDay
            }
            Step::BirthDay => {
                self.day = Some(parse_in_range(input, "day", 1, 31)? as u32);
                Step::BirthMonth
            }
            Step::BirthMonth => {
                self.month = Some(parse_in_range(input, "month", 1, 12)? as u32);
                Step::BirthYear
            }
            Step::BirthYear => {
                let year = parse_in_range(
                    input,
                    "year",
                    MIN_BIRTH_YEAR as i64,
                    MAX_BIRTH_YEAR as i64,
                )? as i32;
                let (day, month) = (self.day.unwrap_or(1), self.month.unwrap_or(1));
                if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                    self.day = None;
                    self.month = None;
                    self.year = None;
                    self.step = Step::BirthDay;
                    return Err(SessionInputError::InvalidDate { day, month, year });
                }
                self.year = Some(year);
                Step::BirthHour
            }
            Step::BirthHour => {
                self.hour = Some(parse_in_range(input, "hour", 0, 23)? as u32);
                Step::BirthMinute
            }
            Step::BirthMinute => {
                self.minute = Some(parse_in_range(input, "minute", 0, 59)? as u32);
                Step::Place
            }
            Step::Place => {
                if input.is_empty() {
                    return Err(SessionInputError::EmptyPlace);
                }
                self.place = Some(input.to_string());
                Step::Done
            }
            Step::Done => Step::Done,
        };
        Ok(self.step)
    }

    /// Return to the place step, e.g. after the place could not be found.
    pub fn retry_place(&mut self) {
        self.place = None;
        self.step = Step::Place;
    }

    /// Birth date and time as given, in the birthplace's local time.
    pub fn local_birth(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)?
            .and_hms_opt(self.hour?, self.minute?, 0)
    }

    /// Question to ask for the current step.
    pub fn prompt(&self) -> String {
        let text = match self.step {
            Step::Language => return LANGUAGE_MENU.to_string(),
            Step::Dialect => {
                return format!("{}\n{}", self.locale.text(BotText::AskDialect), Dialect::menu())
            }
            Step::BirthDay => BotText::AskDay,
            Step::BirthMonth => BotText::AskMonth,
            Step::BirthYear => BotText::AskYear,
            Step::BirthHour => BotText::AskHour,
            Step::BirthMinute => BotText::AskMinute,
            Step::Place => BotText::AskPlace,
            Step::Done => BotText::ChartReady,
        };
        self.locale.text(text).to_string()
    }

    /// Localized complaint for a rejected answer.
    pub fn error_text(&self, err: &SessionInputError) -> &'static str {
        match err {
            SessionInputError::InvalidDate { .. } => self.locale.text(BotText::InvalidDate),
            _ => self.locale.text(BotText::InvalidNumber),
        }
    }
}

fn parse_in_range(
    input: &str,
    field: &'static str,
    min: i64,
    max: i64,
) -> Result<i64, SessionInputError> {
    input
        .parse::<i64>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or(SessionInputError::OutOfRange { field, min, max })
}

/// Sessions keyed by chat id.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: i64) -> Option<Session> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    pub async fn put(&self, chat_id: i64, session: Session) {
        self.sessions.write().await.insert(chat_id, session);
    }

    /// Start over with a fresh session.
    pub async fn reset(&self, chat_id: i64) -> Session {
        let session = Session::new();
        self.put(chat_id, session.clone()).await;
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(session: &mut Session, inputs: &[&str]) {
        for input in inputs {
            session.advance(input).unwrap();
        }
    }

    #[test]
    fn test_english_flow_skips_dialect() {
        let mut session = Session::new();

        assert_eq!(session.advance("English"), Ok(Step::BirthDay));
        feed(&mut session, &["14", "7", "1990", "6"]);
        assert_eq!(session.advance("05"), Ok(Step::Place));
        assert_eq!(session.advance(" Lyon "), Ok(Step::Done));

        assert_eq!(session.place.as_deref(), Some("Lyon"));
        let birth = session.local_birth().unwrap();
        assert_eq!(birth.to_string(), "1990-07-14 06:05:00");
    }

    #[test]
    fn test_arabic_flow_asks_dialect() {
        let mut session = Session::new();

        assert_eq!(session.advance("3"), Ok(Step::Dialect));
        assert!(session.prompt().contains("5. الخليجية"));
        assert_eq!(session.advance("egyptian"), Ok(Step::BirthDay));
        assert_eq!(session.dialect, Some(Dialect::Egyptian));
        assert_eq!(session.locale, Locale::Ar);
    }

    #[test]
    fn test_rejected_input_keeps_step() {
        let mut session = Session::new();
        assert!(matches!(
            session.advance("klingon"),
            Err(SessionInputError::UnknownLanguage(_))
        ));
        assert_eq!(session.step, Step::Language);

        feed(&mut session, &["fr"]);
        assert_eq!(
            session.advance("32"),
            Err(SessionInputError::OutOfRange {
                field: "day",
                min: 1,
                max: 31
            })
        );
        assert!(session.advance("twelve").is_err());
        assert_eq!(session.step, Step::BirthDay);
        assert_eq!(session.prompt(), "Quel jour du mois êtes-vous né(e) ? (1-31)");
    }

    #[test]
    fn test_impossible_date_restarts_at_day() {
        let mut session = Session::new();
        feed(&mut session, &["en", "31", "2"]);

        let err = session.advance("2001").unwrap_err();

        assert_eq!(
            err,
            SessionInputError::InvalidDate {
                day: 31,
                month: 2,
                year: 2001
            }
        );
        assert_eq!(session.step, Step::BirthDay);
        assert_eq!((session.day, session.month, session.year), (None, None, None));
        assert_eq!(session.error_text(&err), Locale::En.text(BotText::InvalidDate));
    }

    #[test]
    fn test_leap_day_accepted() {
        let mut session = Session::new();
        feed(&mut session, &["en", "29", "2"]);
        assert_eq!(session.advance("2000"), Ok(Step::BirthHour));
    }

    #[test]
    fn test_done_ignores_input() {
        let mut session = Session::completed(Locale::Fr, None);
        assert_eq!(session.advance("anything"), Ok(Step::Done));
        assert!(session.local_birth().is_none());
    }

    #[tokio::test]
    async fn test_store_keyed_by_chat() {
        let store = MemorySessionStore::new();
        assert!(store.get(1).await.is_none());

        let mut session = store.reset(1).await;
        session.advance("fr").unwrap();
        store.put(1, session).await;

        assert_eq!(store.get(1).await.map(|s| s.step), Some(Step::BirthDay));
        assert!(store.get(2).await.is_none());
        assert_eq!(store.reset(1).await.step, Step::Language);
    }
}
