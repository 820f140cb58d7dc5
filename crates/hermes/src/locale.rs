//! User-facing languages and their label tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use urania::{AspectKind, Body, Sign};

/// Languages the bot and the narrator speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
}

/// Arabic varieties offered after choosing Arabic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Msa,
    Maghrebi,
    Egyptian,
    Levantine,
    Gulf,
}

/// Everything the bot says outside of the narrator's answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotText {
    AskDialect,
    AskDay,
    AskMonth,
    AskYear,
    AskHour,
    AskMinute,
    AskPlace,
    InvalidNumber,
    InvalidDate,
    PlaceNotFound,
    ChartReady,
    ChartFailed,
    AnswerFailed,
}

/// Section headings and inline words used when rendering a prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptLabels {
    pub natal_header: &'static str,
    pub transits_header: &'static str,
    pub history_header: &'static str,
    pub question_header: &'static str,
    pub ascendant: &'static str,
    pub house: &'static str,
    pub ruled_by: &'static str,
    pub retrograde: &'static str,
    pub applying: &'static str,
    pub separating: &'static str,
    pub no_aspects: &'static str,
    pub unknown_house: &'static str,
    pub user: &'static str,
    pub assistant: &'static str,
}

/// Language menu shown before a language is known.
pub const LANGUAGE_MENU: &str = "Choose your language / Choisissez votre langue / اختر لغتك\n\
1. English\n2. Français\n3. العربية";

const SIGNS_EN: [&str; 12] = [
    "Aries", "Taurus", "Gemini", "Cancer", "Leo", "Virgo", "Libra", "Scorpio", "Sagittarius",
    "Capricorn", "Aquarius", "Pisces",
];
const SIGNS_FR: [&str; 12] = [
    "Bélier", "Taureau", "Gémeaux", "Cancer", "Lion", "Vierge", "Balance", "Scorpion",
    "Sagittaire", "Capricorne", "Verseau", "Poissons",
];
const SIGNS_AR: [&str; 12] = [
    "الحمل", "الثور", "الجوزاء", "السرطان", "الأسد", "العذراء", "الميزان", "العقرب", "القوس",
    "الجدي", "الدلو", "الحوت",
];

const BODIES_EN: [&str; 10] = [
    "Sun", "Moon", "Mercury", "Venus", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
];
const BODIES_FR: [&str; 10] = [
    "Soleil", "Lune", "Mercure", "Vénus", "Mars", "Jupiter", "Saturne", "Uranus", "Neptune",
    "Pluton",
];
const BODIES_AR: [&str; 10] = [
    "الشمس", "القمر", "عطارد", "الزهرة", "المريخ", "المشتري", "زحل", "أورانوس", "نبتون", "بلوتو",
];

// Same order as AspectKind::PRIORITY
const ASPECTS_EN: [&str; 9] = [
    "conjunction",
    "semi-sextile",
    "semi-square",
    "sextile",
    "square",
    "trine",
    "sesquiquadrate",
    "quincunx",
    "opposition",
];
const ASPECTS_FR: [&str; 9] = [
    "conjonction",
    "semi-sextile",
    "semi-carré",
    "sextile",
    "carré",
    "trigone",
    "sesqui-carré",
    "quinconce",
    "opposition",
];
const ASPECTS_AR: [&str; 9] = [
    "اقتران",
    "نصف تسديس",
    "نصف تربيع",
    "تسديس",
    "تربيع",
    "تثليث",
    "تربيع ونصف",
    "تباين",
    "مقابلة",
];

const LABELS_EN: PromptLabels = PromptLabels {
    natal_header: "Natal chart",
    transits_header: "Current transits",
    history_header: "Recent conversation",
    question_header: "Question",
    ascendant: "Ascendant",
    house: "house",
    ruled_by: "house ruled by",
    retrograde: "retrograde",
    applying: "applying",
    separating: "separating",
    no_aspects: "no aspects to the natal chart",
    unknown_house: "house unknown",
    user: "User",
    assistant: "Astrologer",
};

const LABELS_FR: PromptLabels = PromptLabels {
    natal_header: "Thème natal",
    transits_header: "Transits actuels",
    history_header: "Conversation récente",
    question_header: "Question",
    ascendant: "Ascendant",
    house: "maison",
    ruled_by: "maison gouvernée par",
    retrograde: "rétrograde",
    applying: "appliquant",
    separating: "séparant",
    no_aspects: "aucun aspect au thème natal",
    unknown_house: "maison inconnue",
    user: "Utilisateur",
    assistant: "Astrologue",
};

const LABELS_AR: PromptLabels = PromptLabels {
    natal_header: "الخريطة الفلكية عند الولادة",
    transits_header: "العبورات الحالية",
    history_header: "المحادثة الأخيرة",
    question_header: "السؤال",
    ascendant: "الطالع",
    house: "البيت",
    ruled_by: "حاكم البيت",
    retrograde: "متراجع",
    applying: "مقترب",
    separating: "مبتعد",
    no_aspects: "لا توجد جوانب مع الخريطة الأصلية",
    unknown_house: "البيت غير معروف",
    user: "المستخدم",
    assistant: "المنجم",
};

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Fr, Locale::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Ar => "ar",
        }
    }

    /// Parse a language code, a language name or a menu number.
    pub fn from_code(input: &str) -> Option<Locale> {
        let input = input.trim().to_lowercase();
        // "en-US", "fr_CA" and friends
        let primary = input.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "1" | "en" | "eng" | "english" | "anglais" => Some(Locale::En),
            "2" | "fr" | "fra" | "french" | "français" | "francais" => Some(Locale::Fr),
            "3" | "ar" | "ara" | "arabic" | "arabe" | "العربية" | "عربي" => Some(Locale::Ar),
            _ => None,
        }
    }

    /// English name of the language, used in narrator instructions.
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
            Locale::Ar => "Arabic",
        }
    }

    pub fn sign_name(self, sign: Sign) -> &'static str {
        let table = match self {
            Locale::En => &SIGNS_EN,
            Locale::Fr => &SIGNS_FR,
            Locale::Ar => &SIGNS_AR,
        };
        table[sign.index()]
    }

    pub fn body_name(self, body: Body) -> &'static str {
        let table = match self {
            Locale::En => &BODIES_EN,
            Locale::Fr => &BODIES_FR,
            Locale::Ar => &BODIES_AR,
        };
        table[body as usize]
    }

    pub fn aspect_name(self, kind: AspectKind) -> &'static str {
        let table = match self {
            Locale::En => &ASPECTS_EN,
            Locale::Fr => &ASPECTS_FR,
            Locale::Ar => &ASPECTS_AR,
        };
        table[kind as usize]
    }

    /// Localized form of a ruler label such as `mars/pluto`.
    pub fn ruler_name(self, label: &str) -> String {
        label
            .split('/')
            .map(|name| match Body::from_name(name) {
                Some(body) => self.body_name(body).to_string(),
                None => name.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn prompt_labels(self) -> &'static PromptLabels {
        match self {
            Locale::En => &LABELS_EN,
            Locale::Fr => &LABELS_FR,
            Locale::Ar => &LABELS_AR,
        }
    }

    pub fn text(self, text: BotText) -> &'static str {
        match self {
            Locale::En => text_en(text),
            Locale::Fr => text_fr(text),
            Locale::Ar => text_ar(text),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn text_en(text: BotText) -> &'static str {
    match text {
        BotText::AskDialect => "Which Arabic would you like?",
        BotText::AskDay => "What day of the month were you born? (1-31)",
        BotText::AskMonth => "Which month? (1-12)",
        BotText::AskYear => "Which year? (for example 1990)",
        BotText::AskHour => "At what hour, local time? (0-23)",
        BotText::AskMinute => "And the minute? (0-59)",
        BotText::AskPlace => "In which city were you born?",
        BotText::InvalidNumber => "Please answer with a number in the range shown.",
        BotText::InvalidDate => "That date does not exist. Let's start again from the day.",
        BotText::PlaceNotFound => "I could not find that place. Please try another spelling or a nearby city.",
        BotText::ChartReady => "Your chart is ready. Ask me anything about what the sky holds for you.",
        BotText::ChartFailed => "I could not compute your chart right now. Please send your city again later.",
        BotText::AnswerFailed => "The stars are clouded for a moment. Please ask again shortly.",
    }
}

fn text_fr(text: BotText) -> &'static str {
    match text {
        BotText::AskDialect => "Quel arabe préférez-vous ?",
        BotText::AskDay => "Quel jour du mois êtes-vous né(e) ? (1-31)",
        BotText::AskMonth => "Quel mois ? (1-12)",
        BotText::AskYear => "Quelle année ? (par exemple 1990)",
        BotText::AskHour => "À quelle heure, heure locale ? (0-23)",
        BotText::AskMinute => "Et la minute ? (0-59)",
        BotText::AskPlace => "Dans quelle ville êtes-vous né(e) ?",
        BotText::InvalidNumber => "Merci de répondre par un nombre dans l'intervalle indiqué.",
        BotText::InvalidDate => "Cette date n'existe pas. Reprenons à partir du jour.",
        BotText::PlaceNotFound => "Je ne trouve pas ce lieu. Essayez une autre orthographe ou une ville proche.",
        BotText::ChartReady => "Votre thème est prêt. Posez-moi vos questions sur ce que le ciel vous réserve.",
        BotText::ChartFailed => "Impossible de calculer votre thème pour le moment. Renvoyez votre ville un peu plus tard.",
        BotText::AnswerFailed => "Les étoiles sont voilées un instant. Reposez votre question dans un moment.",
    }
}

fn text_ar(text: BotText) -> &'static str {
    match text {
        BotText::AskDialect => "أي لهجة عربية تفضل؟",
        BotText::AskDay => "في أي يوم من الشهر ولدت؟ (1-31)",
        BotText::AskMonth => "في أي شهر؟ (1-12)",
        BotText::AskYear => "في أي سنة؟ (مثلا 1990)",
        BotText::AskHour => "في أي ساعة بالتوقيت المحلي؟ (0-23)",
        BotText::AskMinute => "وفي أي دقيقة؟ (0-59)",
        BotText::AskPlace => "في أي مدينة ولدت؟",
        BotText::InvalidNumber => "الرجاء الإجابة برقم ضمن المجال المذكور.",
        BotText::InvalidDate => "هذا التاريخ غير موجود. لنبدأ من جديد باليوم.",
        BotText::PlaceNotFound => "لم أجد هذا المكان. جرب كتابة أخرى أو مدينة قريبة.",
        BotText::ChartReady => "خريطتك جاهزة. اسألني عما تخبئه لك السماء.",
        BotText::ChartFailed => "تعذر حساب خريطتك الآن. أرسل مدينتك مرة أخرى لاحقا.",
        BotText::AnswerFailed => "النجوم محجوبة للحظة. أعد السؤال بعد قليل.",
    }
}

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Msa,
        Dialect::Maghrebi,
        Dialect::Egyptian,
        Dialect::Levantine,
        Dialect::Gulf,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Dialect::Msa => "msa",
            Dialect::Maghrebi => "maghrebi",
            Dialect::Egyptian => "egyptian",
            Dialect::Levantine => "levantine",
            Dialect::Gulf => "gulf",
        }
    }

    /// Parse a dialect code or a 1-based menu number.
    pub fn from_code(input: &str) -> Option<Dialect> {
        let input = input.trim().to_lowercase();
        if let Ok(n) = input.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Dialect::ALL.get(i).copied());
        }
        Dialect::ALL.into_iter().find(|d| d.code() == input)
    }

    /// Name shown in the dialect menu.
    pub fn native_name(self) -> &'static str {
        match self {
            Dialect::Msa => "الفصحى",
            Dialect::Maghrebi => "الدارجة المغاربية",
            Dialect::Egyptian => "المصرية",
            Dialect::Levantine => "الشامية",
            Dialect::Gulf => "الخليجية",
        }
    }

    /// Description given to the narrator.
    pub fn instruction(self) -> &'static str {
        match self {
            Dialect::Msa => "Modern Standard Arabic",
            Dialect::Maghrebi => "Maghrebi Darija (Moroccan, Algerian, Tunisian)",
            Dialect::Egyptian => "Egyptian Arabic",
            Dialect::Levantine => "Levantine Arabic",
            Dialect::Gulf => "Gulf Arabic",
        }
    }

    pub fn menu() -> String {
        Dialect::ALL
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {}", i + 1, d.native_name()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_code() {
        assert_eq!(Locale::from_code("1"), Some(Locale::En));
        assert_eq!(Locale::from_code(" Français "), Some(Locale::Fr));
        assert_eq!(Locale::from_code("fr-CA"), Some(Locale::Fr));
        assert_eq!(Locale::from_code("العربية"), Some(Locale::Ar));
        assert_eq!(Locale::from_code("de"), None);
    }

    #[test]
    fn test_label_tables() {
        assert_eq!(Locale::Fr.sign_name(Sign::Leo), "Lion");
        assert_eq!(Locale::En.sign_name(Sign::Pisces), "Pisces");
        assert_eq!(Locale::Fr.body_name(Body::Pluto), "Pluton");
        assert_eq!(Locale::Ar.body_name(Body::Sun), "الشمس");
        assert_eq!(Locale::En.aspect_name(AspectKind::Sesquiquadrate), "sesquiquadrate");
        assert_eq!(Locale::Fr.aspect_name(AspectKind::Trine), "trigone");
    }

    #[test]
    fn test_aspect_table_matches_priority_order() {
        for (i, kind) in AspectKind::PRIORITY.iter().enumerate() {
            assert_eq!(*kind as usize, i);
            assert_eq!(Locale::En.aspect_name(*kind), kind.name());
        }
    }

    #[test]
    fn test_ruler_name_localized() {
        assert_eq!(Locale::Fr.ruler_name("mars/pluto"), "Mars/Pluton");
        assert_eq!(Locale::En.ruler_name("venus"), "Venus");
    }

    #[test]
    fn test_dialect_from_code() {
        assert_eq!(Dialect::from_code("2"), Some(Dialect::Maghrebi));
        assert_eq!(Dialect::from_code("GULF"), Some(Dialect::Gulf));
        assert_eq!(Dialect::from_code("0"), None);
        assert_eq!(Dialect::from_code("6"), None);
        assert!(Dialect::menu().starts_with("1. الفصحى"));
    }
}
