use whatlang::{Lang, detect};

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// Reduce a language tag to its bare lowercase primary subtag:
/// `en-US` -> `en`, `pt_BR` -> `pt`.
pub fn normalize_lang(tag: Option<&str>) -> Option<String> {
    let tag = tag?.trim();
    let primary = tag.split(['_', '-']).next().unwrap_or_default();
    let primary = primary.trim().to_lowercase();
    (!primary.is_empty()).then_some(primary)
}

/// Statistical guess from body text. Only languages with a known two-letter
/// code are reported.
pub fn detect_language(text: &str) -> Option<String> {
    // Skip detection for very short text
    if text.trim().len() < MIN_TEXT_LENGTH {
        return None;
    }

    let info = detect(text)?;
    if info.confidence() < MIN_CONFIDENCE {
        return None;
    }
    lang_to_code(info.lang()).map(str::to_string)
}

fn lang_to_code(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Fin => "fi",
        Lang::Heb => "he",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        Lang::Ukr => "uk",
        Lang::Ind => "id",
        _ => return None,
    };
    Some(code)
}
