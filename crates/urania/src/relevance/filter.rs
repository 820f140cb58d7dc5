use crate::chart::NatalChart;
use crate::ephemeris::Body;
use crate::relevance::keywords::KeywordDictionary;
use crate::transit::TransitSnapshot;

/// Maximum results when the question spans a period of time
pub const TEMPORAL_LIMIT: usize = 7;
/// Maximum results from keyword scoring
pub const SCORED_LIMIT: usize = 5;
/// Maximum results from the generic fallback
pub const FALLBACK_LIMIT: usize = 3;
/// Houses a travel question falls back to
pub const TRAVEL_HOUSES: [u8; 3] = [3, 4, 9];

const PLANET_KEYWORD_POINTS: i32 = 3;
const HOUSE_KEYWORD_POINTS: i32 = 2;

/// Slowest body first; outer planets frame long periods.
const SLOWNESS_ORDER: [Body; 10] = [
    Body::Pluto,
    Body::Neptune,
    Body::Uranus,
    Body::Saturn,
    Body::Jupiter,
    Body::Mars,
    Body::Sun,
    Body::Venus,
    Body::Mercury,
    Body::Moon,
];

fn slowness_rank(body: Body) -> usize {
    SLOWNESS_ORDER
        .iter()
        .position(|b| *b == body)
        .unwrap_or(SLOWNESS_ORDER.len())
}

/// Narrows transit snapshots to those a question is about.
pub struct RelevanceFilter<'a> {
    keywords: &'a KeywordDictionary,
}

impl RelevanceFilter<'static> {
    pub fn new() -> Self {
        Self {
            keywords: KeywordDictionary::builtin(),
        }
    }
}

impl Default for RelevanceFilter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> RelevanceFilter<'a> {
    pub fn with_keywords(keywords: &'a KeywordDictionary) -> Self {
        Self { keywords }
    }

    /// Snapshots relevant to `question`, most relevant first.
    ///
    /// 1. Period questions: aspected snapshots, slowest body first, up to 7.
    /// 2. Otherwise keyword scoring, best 5 with a positive score.
    /// 3. Nothing scored: travel questions get every snapshot touching
    ///    houses 3, 4 or 9; anything else gets the first 3 aspected ones.
    pub fn filter(
        &self,
        snapshots: &[TransitSnapshot],
        question: &str,
        chart: &NatalChart,
    ) -> Vec<TransitSnapshot> {
        let question = question.to_lowercase();

        if self.keywords.is_temporal(&question) {
            let mut selected: Vec<TransitSnapshot> =
                snapshots.iter().filter(|s| s.has_aspects()).cloned().collect();
            selected.sort_by_key(|s| slowness_rank(s.body.name));
            selected.truncate(TEMPORAL_LIMIT);
            log::debug!("relevance: period question, {} transits", selected.len());
            return selected;
        }

        let mut scored: Vec<TransitSnapshot> = snapshots
            .iter()
            .filter_map(|s| {
                let score = self.score(s, &question, chart);
                (score > 0).then(|| TransitSnapshot {
                    relevance_score: Some(score),
                    ..s.clone()
                })
            })
            .collect();

        if !scored.is_empty() {
            // stable: equal scores keep builder order
            scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
            scored.truncate(SCORED_LIMIT);
            log::debug!("relevance: {} scored transits", scored.len());
            return scored;
        }

        if self.keywords.is_travel(&question) {
            // TODO: confirm with product whether travel answers should be capped like the other branches
            let selected: Vec<TransitSnapshot> = snapshots
                .iter()
                .filter(|s| touches_houses(s, &TRAVEL_HOUSES))
                .cloned()
                .collect();
            log::debug!("relevance: travel fallback, {} transits", selected.len());
            return selected;
        }

        snapshots
            .iter()
            .filter(|s| s.has_aspects())
            .take(FALLBACK_LIMIT)
            .cloned()
            .collect()
    }

    /// Keyword score of one snapshot; 0 when no keyword matched.
    ///
    /// Aspect bonuses (applying, major) only add to a snapshot that already
    /// matched a keyword, so an unrelated question scores nothing. This gate
    /// is deliberate: without it every aspected snapshot would score and the
    /// "first 3 aspected, original order" fallback could never apply.
    pub fn score(&self, snapshot: &TransitSnapshot, question: &str, chart: &NatalChart) -> i32 {
        let mut keyword_score =
            PLANET_KEYWORD_POINTS * self.keywords.planet_hits(snapshot.body.name, question) as i32;

        if let Some(house) = snapshot.current_house {
            keyword_score += HOUSE_KEYWORD_POINTS * self.keywords.house_hits(house, question) as i32;
        }

        for aspect in &snapshot.aspects {
            let natal_house = aspect
                .natal_house
                .or_else(|| chart.planet(aspect.with_body).and_then(|p| p.house));
            if let Some(house) = natal_house {
                keyword_score += HOUSE_KEYWORD_POINTS * self.keywords.house_hits(house, question) as i32;
            }
        }

        if keyword_score == 0 {
            return 0;
        }

        let applying = snapshot.aspects.iter().filter(|a| a.applying).count() as i32;
        let major = snapshot.aspects.iter().filter(|a| a.kind.is_major()).count() as i32;
        keyword_score + applying + major
    }
}

fn touches_houses(snapshot: &TransitSnapshot, houses: &[u8]) -> bool {
    let in_house = |h: Option<u8>| h.is_some_and(|h| houses.contains(&h));
    in_house(snapshot.current_house) || snapshot.aspects.iter().any(|a| in_house(a.natal_house))
}

/// Relevant snapshots using the built-in keyword dictionary.
pub fn filter_relevant(
    snapshots: &[TransitSnapshot],
    question: &str,
    chart: &NatalChart,
) -> Vec<TransitSnapshot> {
    RelevanceFilter::new().filter(snapshots, question, chart)
}
