//! Renders a chart, its relevant transits and the recent conversation into
//! the two messages sent to the narrator.

use crate::locale::{Dialect, Locale, PromptLabels};
use crate::store::{ConversationTurn, Role};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use urania::{DegreeMinute, NatalChart, Sign, TransitSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    pub system: String,
    pub user: String,
}

/// Language settings for one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Voice {
    pub locale: Locale,
    #[serde(default)]
    pub dialect: Option<Dialect>,
}

impl Voice {
    pub fn new(locale: Locale, dialect: Option<Dialect>) -> Self {
        // Dialects only qualify Arabic
        let dialect = if locale == Locale::Ar { dialect } else { None };
        Self { locale, dialect }
    }
}

pub struct PromptBuilder {
    voice: Voice,
}

impl PromptBuilder {
    pub fn new(voice: Voice) -> Self {
        Self { voice }
    }

    pub fn build(
        &self,
        chart: &NatalChart,
        transits: &[TransitSnapshot],
        history: &[ConversationTurn],
        question: &str,
    ) -> PromptContext {
        let labels = self.voice.locale.prompt_labels();
        let mut user = String::new();

        let _ = writeln!(user, "## {}", labels.natal_header);
        self.render_natal(&mut user, chart, labels);

        let _ = writeln!(user, "\n## {}", labels.transits_header);
        for snapshot in transits {
            self.render_transit(&mut user, snapshot, labels);
        }

        if !history.is_empty() {
            let _ = writeln!(user, "\n## {}", labels.history_header);
            for turn in history {
                let who = match turn.role {
                    Role::User => labels.user,
                    Role::Assistant => labels.assistant,
                };
                let _ = writeln!(user, "{who}: {}", turn.content.trim());
            }
        }

        let _ = writeln!(user, "\n## {}", labels.question_header);
        user.push_str(question.trim());

        PromptContext {
            system: self.system_prompt(),
            user,
        }
    }

    fn system_prompt(&self) -> String {
        let language = match (self.voice.locale, self.voice.dialect) {
            (Locale::Ar, Some(dialect)) => format!("Arabic, written in {}", dialect.instruction()),
            (locale, _) => locale.language_name().to_string(),
        };
        format!(
            "You are a warm, grounded astrologer answering questions in a chat. \
             Base your answer only on the natal chart and the transits provided. \
             Favour applying aspects and slow planets, mention timing when the question asks for it, \
             and keep the answer under 200 words without headings or lists. \
             Never claim certainty about health, legal or financial outcomes. \
             Answer in {language}."
        )
    }

    fn render_natal(&self, out: &mut String, chart: &NatalChart, labels: &PromptLabels) {
        let locale = self.voice.locale;
        let asc_sign = Sign::from_longitude(chart.ascendant);
        let _ = writeln!(
            out,
            "- {}: {} {}",
            labels.ascendant,
            DegreeMinute::from_longitude(chart.ascendant),
            locale.sign_name(asc_sign)
        );

        for planet in chart.planets.iter().flatten() {
            let Some(longitude) = planet.longitude else {
                continue;
            };
            let sign = planet.sign.unwrap_or_else(|| Sign::from_longitude(longitude));
            let house = planet
                .house
                .or_else(|| urania::geometry::house_of(longitude, chart.house_cusps()));
            let _ = write!(
                out,
                "- {}: {} {}",
                locale.body_name(planet.name),
                DegreeMinute::from_longitude(longitude),
                locale.sign_name(sign)
            );
            match house {
                Some(h) => {
                    let _ = write!(out, ", {} {h}", labels.house);
                }
                None => {
                    let _ = write!(out, ", {}", labels.unknown_house);
                }
            }
            if planet.retrograde {
                let _ = write!(out, " ({})", labels.retrograde);
            }
            out.push('\n');
        }
    }

    fn render_transit(&self, out: &mut String, snapshot: &TransitSnapshot, labels: &PromptLabels) {
        let locale = self.voice.locale;
        let body = &snapshot.body;
        let _ = write!(
            out,
            "- {}: {} {}",
            locale.body_name(body.name),
            DegreeMinute::from_longitude(body.longitude),
            locale.sign_name(snapshot.current_sign)
        );
        match snapshot.current_house {
            Some(h) => {
                let _ = write!(out, ", {} {h}", labels.house);
            }
            None => {
                let _ = write!(out, ", {}", labels.unknown_house);
            }
        }
        if let Some(ruler) = &snapshot.house_ruler {
            let _ = write!(out, " ({} {})", labels.ruled_by, locale.ruler_name(ruler));
        }
        if body.retrograde {
            let _ = write!(out, ", {}", labels.retrograde);
        }
        out.push('\n');

        if snapshot.aspects.is_empty() {
            let _ = writeln!(out, "  - {}", labels.no_aspects);
        }
        for aspect in &snapshot.aspects {
            let motion = if aspect.applying {
                labels.applying
            } else {
                labels.separating
            };
            let _ = write!(
                out,
                "  - {} {} {:.1}°, {motion}",
                locale.aspect_name(aspect.kind),
                locale.body_name(aspect.with_body),
                aspect.orb_deviation
            );
            if let Some(h) = aspect.natal_house {
                let _ = write!(out, ", {} {h}", labels.house);
            }
            out.push('\n');
        }
    }
}
