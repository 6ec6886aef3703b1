/// Guess the source language of a text for backends that need an explicit
/// language pair.
///
/// Any Cyrillic character selects Ukrainian when one of the letters
/// і ї є ґ appears anywhere in the text, Russian otherwise. Everything else
/// is assumed to be English.
pub fn guess_source_lang(text: &str) -> &'static str {
    let has_cyrillic = text.chars().any(|ch| ('\u{0400}'..='\u{04FF}').contains(&ch));
    if !has_cyrillic {
        return "en";
    }
    if text.chars().any(|ch| matches!(ch, 'і' | 'ї' | 'є' | 'ґ')) {
        "uk"
    } else {
        "ru"
    }
}
