use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Entity, Language, LemmaPair, TaggedToken};
use super::{NlpEngine, NlpError, StopwordFilter};

/// Words with inner apostrophes, or a single symbol.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:['’´]\w+)*|[^\w\s]").unwrap());

/// Dictionary and suffix driven engine. Needs no model files, so it is the
/// default collaborator and the one used in tests.
#[derive(Debug, Clone)]
pub struct RuleBasedEngine {
    en_stopwords: StopwordFilter,
    de_stopwords: StopwordFilter,
}

impl Default for RuleBasedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedEngine {
    pub fn new() -> Self {
        Self {
            en_stopwords: StopwordFilter::new(Language::En),
            de_stopwords: StopwordFilter::new(Language::De),
        }
    }

    fn stopwords(&self, language: Language) -> &StopwordFilter {
        match language {
            Language::En => &self.en_stopwords,
            Language::De => &self.de_stopwords,
        }
    }

    fn split(text: &str) -> Vec<&str> {
        TOKEN.find_iter(text).map(|m| m.as_str()).collect()
    }
}

impl NlpEngine for RuleBasedEngine {
    fn tokenize(&self, text: &str, _language: Language) -> Result<Vec<String>, NlpError> {
        Ok(Self::split(text).into_iter().map(str::to_string).collect())
    }

    fn lemmatize(&self, text: &str, language: Language) -> Result<Vec<LemmaPair>, NlpError> {
        Ok(Self::split(text)
            .into_iter()
            .map(|token| LemmaPair {
                text: token.to_string(),
                lemma: lemma_of(token, language),
            })
            .collect())
    }

    fn tag(&self, text: &str, language: Language) -> Result<Vec<TaggedToken>, NlpError> {
        let tokens = Self::split(text);
        Ok(tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let sentence_start = i == 0 || is_sentence_end(tokens[i - 1]);
                let (pos, tag) = tag_of(token, language, sentence_start);
                TaggedToken {
                    text: token.to_string(),
                    pos: pos.into(),
                    tag: tag.into(),
                }
            })
            .collect())
    }

    fn entities(&self, text: &str, language: Language) -> Result<Vec<Entity>, NlpError> {
        let tokens = Self::split(text);
        let stopwords = self.stopwords(language);
        Ok(find_entities(&tokens, language, stopwords))
    }

    fn is_stop_word(&self, token: &str, language: Language) -> bool {
        self.stopwords(language).is_stopword(token)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lemmas
// ═══════════════════════════════════════════════════════════════════════════

const EN_IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
    ("been", "be"), ("being", "be"), ("'s", "be"), ("'m", "be"), ("'re", "be"),
    ("has", "have"), ("had", "have"), ("'ve", "have"),
    ("does", "do"), ("did", "do"), ("done", "do"),
    ("went", "go"), ("gone", "go"), ("goes", "go"),
    ("said", "say"), ("made", "make"), ("took", "take"), ("taken", "take"),
    ("came", "come"), ("saw", "see"), ("seen", "see"), ("knew", "know"),
    ("known", "know"), ("got", "get"), ("gave", "give"), ("given", "give"),
    ("found", "find"), ("thought", "think"), ("told", "tell"), ("left", "leave"),
    ("felt", "feel"), ("kept", "keep"), ("ran", "run"), ("wrote", "write"),
    ("written", "write"), ("n't", "not"), ("children", "child"), ("men", "man"),
    ("women", "woman"), ("people", "person"), ("feet", "foot"), ("mice", "mouse"),
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
];

const DE_IRREGULAR: &[(&str, &str)] = &[
    ("bin", "sein"), ("bist", "sein"), ("ist", "sein"), ("sind", "sein"),
    ("seid", "sein"), ("war", "sein"), ("warst", "sein"), ("waren", "sein"),
    ("gewesen", "sein"), ("habe", "haben"), ("hast", "haben"), ("hat", "haben"),
    ("habt", "haben"), ("hatte", "haben"), ("hatten", "haben"), ("gehabt", "haben"),
    ("werde", "werden"), ("wirst", "werden"), ("wird", "werden"), ("wurde", "werden"),
    ("wurden", "werden"), ("kann", "können"), ("kannst", "können"), ("konnte", "können"),
    ("muss", "müssen"), ("musst", "müssen"), ("musste", "müssen"), ("will", "wollen"),
    ("willst", "wollen"), ("wollte", "wollen"), ("soll", "sollen"), ("sollte", "sollen"),
    ("darf", "dürfen"), ("mag", "mögen"), ("geht", "gehen"), ("ging", "gehen"),
    ("gegangen", "gehen"), ("gibt", "geben"), ("gab", "geben"), ("gegeben", "geben"),
    ("der", "der"), ("die", "der"), ("das", "der"), ("den", "der"), ("dem", "der"),
    ("des", "der"), ("eine", "ein"), ("einen", "ein"), ("einem", "ein"),
    ("einer", "ein"), ("eines", "ein"),
];

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Lemma of a single token.
pub fn lemma_of(token: &str, language: Language) -> String {
    if !token.chars().any(char::is_alphanumeric) {
        return token.to_string();
    }
    match language {
        Language::En => english_lemma(token),
        Language::De => german_lemma(token),
    }
}

fn english_lemma(token: &str) -> String {
    let lower = token.to_lowercase();
    if let Some(lemma) = lookup(EN_IRREGULAR, &lower) {
        return lemma.to_string();
    }
    // Contractions keep their surface form.
    if lower.contains(['\'', '’']) {
        return lower;
    }
    let len = lower.chars().count();

    if len > 4 && lower.ends_with("ies") {
        return format!("{}y", &lower[..lower.len() - 3]);
    }
    if lower.ends_with("sses") {
        return lower[..lower.len() - 2].to_string();
    }
    if len > 5 && lower.ends_with("ing") {
        return undouble(&lower[..lower.len() - 3]);
    }
    if len > 4 && lower.ends_with("ed") && !lower.ends_with("eed") {
        return undouble(&lower[..lower.len() - 2]);
    }
    if len > 3
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

/// `runn` -> `run`, `stopp` -> `stop`; leaves `fall`, `miss` alone.
fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    if let [.., a, b] = chars.as_slice() {
        if a == b && !VOWELS.contains(a) && !matches!(a, 'l' | 's' | 'z') {
            return chars[..chars.len() - 1].iter().collect();
        }
    }
    stem.to_string()
}

fn german_lemma(token: &str) -> String {
    let lower = token.to_lowercase();
    if let Some(lemma) = lookup(DE_IRREGULAR, &lower) {
        return lemma.to_string();
    }
    // Nouns keep their capital and are not inflected further.
    if token.chars().next().is_some_and(char::is_uppercase) {
        return token.to_string();
    }
    let len = lower.chars().count();
    if len > 4 && lower.ends_with("st") {
        return format!("{}en", &lower[..lower.len() - 2]);
    }
    if len > 3 && lower.ends_with('t') && !lower.ends_with("et") {
        return format!("{}en", &lower[..lower.len() - 1]);
    }
    lower
}

// ═══════════════════════════════════════════════════════════════════════════
// Part of speech
// ═══════════════════════════════════════════════════════════════════════════

/// (word, universal POS, fine tag)
const EN_CLOSED: &[(&str, &str, &str)] = &[
    ("the", "DET", "DT"), ("a", "DET", "DT"), ("an", "DET", "DT"),
    ("this", "DET", "DT"), ("that", "DET", "DT"), ("these", "DET", "DT"),
    ("those", "DET", "DT"), ("every", "DET", "DT"), ("some", "DET", "DT"),
    ("i", "PRON", "PRP"), ("you", "PRON", "PRP"), ("he", "PRON", "PRP"),
    ("she", "PRON", "PRP"), ("it", "PRON", "PRP"), ("we", "PRON", "PRP"),
    ("they", "PRON", "PRP"), ("me", "PRON", "PRP"), ("him", "PRON", "PRP"),
    ("us", "PRON", "PRP"), ("them", "PRON", "PRP"),
    ("my", "PRON", "PRP$"), ("your", "PRON", "PRP$"), ("his", "PRON", "PRP$"),
    ("her", "PRON", "PRP$"), ("its", "PRON", "PRP$"), ("our", "PRON", "PRP$"),
    ("their", "PRON", "PRP$"),
    ("in", "ADP", "IN"), ("on", "ADP", "IN"), ("at", "ADP", "IN"), ("of", "ADP", "IN"),
    ("for", "ADP", "IN"), ("with", "ADP", "IN"), ("by", "ADP", "IN"),
    ("from", "ADP", "IN"), ("into", "ADP", "IN"), ("about", "ADP", "IN"),
    ("over", "ADP", "IN"), ("under", "ADP", "IN"), ("to", "PART", "TO"),
    ("and", "CCONJ", "CC"), ("or", "CCONJ", "CC"), ("but", "CCONJ", "CC"),
    ("if", "SCONJ", "IN"), ("because", "SCONJ", "IN"), ("while", "SCONJ", "IN"),
    ("although", "SCONJ", "IN"),
    ("is", "AUX", "VBZ"), ("am", "AUX", "VBP"), ("are", "AUX", "VBP"),
    ("was", "AUX", "VBD"), ("were", "AUX", "VBD"), ("be", "AUX", "VB"),
    ("been", "AUX", "VBN"), ("being", "AUX", "VBG"), ("has", "AUX", "VBZ"),
    ("have", "AUX", "VBP"), ("had", "AUX", "VBD"), ("do", "AUX", "VBP"),
    ("does", "AUX", "VBZ"), ("did", "AUX", "VBD"), ("'s", "AUX", "VBZ"),
    ("will", "AUX", "MD"), ("would", "AUX", "MD"), ("can", "AUX", "MD"),
    ("could", "AUX", "MD"), ("should", "AUX", "MD"), ("may", "AUX", "MD"),
    ("might", "AUX", "MD"), ("must", "AUX", "MD"), ("shall", "AUX", "MD"),
    ("not", "PART", "RB"), ("n't", "PART", "RB"),
    ("very", "ADV", "RB"), ("also", "ADV", "RB"), ("just", "ADV", "RB"),
    ("now", "ADV", "RB"), ("then", "ADV", "RB"), ("here", "ADV", "RB"),
    ("there", "ADV", "RB"), ("never", "ADV", "RB"), ("always", "ADV", "RB"),
    ("hello", "INTJ", "UH"), ("hi", "INTJ", "UH"), ("oh", "INTJ", "UH"),
    ("yes", "INTJ", "UH"), ("no", "INTJ", "UH"),
];

const DE_CLOSED: &[(&str, &str, &str)] = &[
    ("der", "DET", "ART"), ("die", "DET", "ART"), ("das", "DET", "ART"),
    ("den", "DET", "ART"), ("dem", "DET", "ART"), ("des", "DET", "ART"),
    ("ein", "DET", "ART"), ("eine", "DET", "ART"), ("einen", "DET", "ART"),
    ("einem", "DET", "ART"), ("einer", "DET", "ART"), ("eines", "DET", "ART"),
    ("ich", "PRON", "PPER"), ("du", "PRON", "PPER"), ("er", "PRON", "PPER"),
    ("sie", "PRON", "PPER"), ("es", "PRON", "PPER"), ("wir", "PRON", "PPER"),
    ("ihr", "PRON", "PPER"), ("mich", "PRON", "PPER"), ("dich", "PRON", "PPER"),
    ("uns", "PRON", "PPER"), ("euch", "PRON", "PPER"), ("ihm", "PRON", "PPER"),
    ("ihn", "PRON", "PPER"), ("ihnen", "PRON", "PPER"), ("sich", "PRON", "PRF"),
    ("in", "ADP", "APPR"), ("an", "ADP", "APPR"), ("auf", "ADP", "APPR"),
    ("aus", "ADP", "APPR"), ("bei", "ADP", "APPR"), ("mit", "ADP", "APPR"),
    ("nach", "ADP", "APPR"), ("von", "ADP", "APPR"), ("zu", "ADP", "APPR"),
    ("für", "ADP", "APPR"), ("über", "ADP", "APPR"), ("unter", "ADP", "APPR"),
    ("vor", "ADP", "APPR"), ("durch", "ADP", "APPR"), ("gegen", "ADP", "APPR"),
    ("ohne", "ADP", "APPR"), ("um", "ADP", "APPR"), ("zwischen", "ADP", "APPR"),
    ("im", "ADP", "APPRART"), ("am", "ADP", "APPRART"), ("zum", "ADP", "APPRART"),
    ("zur", "ADP", "APPRART"), ("vom", "ADP", "APPRART"), ("beim", "ADP", "APPRART"),
    ("und", "CCONJ", "KON"), ("oder", "CCONJ", "KON"), ("aber", "CCONJ", "KON"),
    ("denn", "CCONJ", "KON"), ("dass", "SCONJ", "KOUS"), ("weil", "SCONJ", "KOUS"),
    ("wenn", "SCONJ", "KOUS"), ("ob", "SCONJ", "KOUS"), ("obwohl", "SCONJ", "KOUS"),
    ("bin", "AUX", "VAFIN"), ("bist", "AUX", "VAFIN"), ("ist", "AUX", "VAFIN"),
    ("sind", "AUX", "VAFIN"), ("seid", "AUX", "VAFIN"), ("war", "AUX", "VAFIN"),
    ("waren", "AUX", "VAFIN"), ("hat", "AUX", "VAFIN"), ("habe", "AUX", "VAFIN"),
    ("haben", "AUX", "VAFIN"), ("hatte", "AUX", "VAFIN"), ("wird", "AUX", "VAFIN"),
    ("werden", "AUX", "VAFIN"), ("wurde", "AUX", "VAFIN"), ("kann", "AUX", "VMFIN"),
    ("können", "AUX", "VMFIN"), ("muss", "AUX", "VMFIN"), ("müssen", "AUX", "VMFIN"),
    ("soll", "AUX", "VMFIN"), ("will", "AUX", "VMFIN"), ("darf", "AUX", "VMFIN"),
    ("nicht", "PART", "PTKNEG"), ("zu", "PART", "PTKZU"),
    ("sehr", "ADV", "ADV"), ("auch", "ADV", "ADV"), ("noch", "ADV", "ADV"),
    ("schon", "ADV", "ADV"), ("hier", "ADV", "ADV"), ("dort", "ADV", "ADV"),
    ("jetzt", "ADV", "ADV"), ("immer", "ADV", "ADV"), ("nie", "ADV", "ADV"),
    ("hallo", "INTJ", "ITJ"), ("ja", "INTJ", "ITJ"), ("nein", "INTJ", "ITJ"),
];

fn is_sentence_end(token: &str) -> bool {
    matches!(token, "." | "!" | "?")
}

fn is_number(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && token.chars().any(|c| c.is_ascii_digit())
}

fn punct_tag(token: &str, language: Language) -> &'static str {
    match (language, token) {
        (Language::En, "." | "!" | "?") => ".",
        (Language::En, ",") => ",",
        (Language::En, "(" | "[") => "-LRB-",
        (Language::En, ")" | "]") => "-RRB-",
        (Language::En, "\"" | "“" | "„") => "``",
        (Language::En, "”") => "''",
        (Language::En, _) => ":",
        (Language::De, "." | "!" | "?") => "$.",
        (Language::De, ",") => "$,",
        (Language::De, _) => "$(",
    }
}

/// Universal POS and fine-grained tag for one token.
pub fn tag_of(token: &str, language: Language, sentence_start: bool) -> (&'static str, &'static str) {
    if !token.chars().any(char::is_alphanumeric) {
        return ("PUNCT", punct_tag(token, language));
    }
    if is_number(token) {
        return ("NUM", if language == Language::En { "CD" } else { "CARD" });
    }

    let lower = token.to_lowercase();
    let closed = match language {
        Language::En => EN_CLOSED,
        Language::De => DE_CLOSED,
    };
    if let Some((_, pos, tag)) = closed.iter().find(|(w, _, _)| *w == lower) {
        return (*pos, *tag);
    }

    let capitalized = token.chars().next().is_some_and(char::is_uppercase);
    match language {
        Language::En => {
            if capitalized && !sentence_start {
                ("PROPN", "NNP")
            } else if lower.ends_with("ing") && lower.len() > 4 {
                ("VERB", "VBG")
            } else if lower.ends_with("ed") && lower.len() > 3 {
                ("VERB", "VBD")
            } else if lower.ends_with("ly") && lower.len() > 3 {
                ("ADV", "RB")
            } else if ["ous", "ful", "able", "ible", "ive", "less", "ic", "al"]
                .iter()
                .any(|s| lower.ends_with(s))
            {
                ("ADJ", "JJ")
            } else if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
                ("NOUN", "NNS")
            } else if capitalized {
                ("PROPN", "NNP")
            } else {
                ("NOUN", "NN")
            }
        }
        Language::De => {
            if capitalized {
                ("NOUN", "NN")
            } else if ["lich", "ig", "isch", "bar", "sam", "los"]
                .iter()
                .any(|s| lower.ends_with(s))
            {
                ("ADJ", "ADJD")
            } else if lower.ends_with("en") {
                ("VERB", "VVINF")
            } else if lower.ends_with('t') || lower.ends_with('e') {
                ("VERB", "VVFIN")
            } else {
                ("ADV", "ADV")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Entities
// ═══════════════════════════════════════════════════════════════════════════

const TITLES: &[&str] = &["mr", "mrs", "ms", "dr", "prof", "sir", "herr", "frau"];
const COMPANY_SUFFIXES: &[&str] = &["inc", "ltd", "corp", "llc", "co", "gmbh", "ag", "kg", "plc"];
const PLACES: &[&str] = &[
    "berlin", "munich", "münchen", "hamburg", "vienna", "wien", "london", "paris", "rome",
    "madrid", "germany", "deutschland", "austria", "österreich", "england", "france",
    "europe", "europa", "america", "amerika",
];

fn is_capitalized_word(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
        && token.chars().all(|c| c.is_alphanumeric() || matches!(c, '\'' | '’' | '-'))
}

/// Capitalised non-stopword, or a company suffix (those are often listed as
/// stopwords). Titles end a run.
fn continues_run(token: &str, stopwords: &StopwordFilter) -> bool {
    let lower = token.to_lowercase();
    is_capitalized_word(token)
        && !TITLES.contains(&lower.as_str())
        && (!stopwords.is_stopword(token) || COMPANY_SUFFIXES.contains(&lower.as_str()))
}

fn find_entities(tokens: &[&str], language: Language, stopwords: &StopwordFilter) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut after_title = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        let lower = token.to_lowercase();

        if TITLES.contains(&lower.as_str()) {
            after_title = true;
            i += 1;
            continue;
        }
        if after_title && token == "." {
            i += 1;
            continue;
        }

        if !is_capitalized_word(token) || stopwords.is_stopword(token) {
            after_title = false;
            i += 1;
            continue;
        }

        let sentence_start = i == 0 || is_sentence_end(tokens[i - 1]);
        let start = i;
        while i < tokens.len() && continues_run(tokens[i], stopwords) {
            i += 1;
        }
        let run = &tokens[start..i];
        let last = run[run.len() - 1].to_lowercase();

        let label = if after_title {
            Some("PER")
        } else if run.len() > 1 && COMPANY_SUFFIXES.contains(&last.as_str()) {
            Some("ORG")
        } else if run.len() == 1 && PLACES.contains(&last.as_str()) {
            Some("LOC")
        } else if run.len() == 1 && (sentence_start || language == Language::De) {
            // A lone capital at sentence start, or any German noun.
            None
        } else {
            Some("MISC")
        };

        if let Some(label) = label {
            entities.push(Entity {
                text: run.join(" "),
                label: label.to_string(),
            });
        }
        after_title = false;
    }

    entities
}
