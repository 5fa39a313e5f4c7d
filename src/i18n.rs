/*
Message catalogue for the texts the bot sends to the chat.

This module provides:
- A tiny embedded translations store for EN/RU (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.

Usage:
    use crate::i18n;
    let verdict = i18n::tr(Some("ru"), "verdict.approved", None);
    let report = i18n::tr(None, "report.failure", Some(&[("error", "API returned 500")]));

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Params are substituted in the order given. Callers pass user-controlled
  values last so their contents are inserted verbatim.
- Default language is `en`. If a key is missing for the requested language,
  the fallback language will be used.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "verdict.approved": "Work checked: the reviewer liked everything. Hooray!",
  "verdict.reviewing": "Work taken for review.",
  "verdict.rejected": "Work checked: the reviewer has remarks.",
  "report.status_changed": "Changed status for \"{homework}\". {verdict}",
  "report.no_new_status": "No new statuses.",
  "report.failure": "Program failure: {error}"
}
"#;

const RU_JSON: &str = r#"
{
  "verdict.approved": "Работа проверена: ревьюеру всё понравилось. Ура!",
  "verdict.reviewing": "Работа взята на проверку ревьюером.",
  "verdict.rejected": "Работа проверена: у ревьюера есть замечания.",
  "report.status_changed": "Изменился статус проверки работы \"{homework}\". {verdict}",
  "report.no_new_status": "Новых статусов нет.",
  "report.failure": "Сбой в работе программы: {error}"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    let ru_map: HashMap<String, String> = serde_json::from_str(RU_JSON).unwrap_or_else(|e| {
        panic!("failed to parse RU_JSON in i18n module: {}", e);
    });
    out.insert("ru".to_string(), ru_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Normalize a language tag into a short, lowercase code (e.g. "ru-RU" -> "ru").
pub fn normalize_language(lang: &str) -> String {
    lang.trim().split('-').next().unwrap_or(lang).to_lowercase()
}

/// Returns true if the given language code has a message catalogue.
pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Translate a key using an explicit language (or default if None).
///
/// - `lang`: optional language code (`"en"`, `"ru"`). If None, DEFAULT_LANG is used.
/// - `key`: translation key (flat string, e.g. "verdict.reviewing").
/// - `params`: optional slice of (name, value) for placeholder replacement.
///
/// Returns the translated and parameter-substituted string. If no translation is found,
/// returns the default language value or the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_exist_in_every_language() {
        for lang in ["en", "ru"] {
            for key in ["verdict.approved", "verdict.reviewing", "verdict.rejected"] {
                assert_ne!(tr(Some(lang), key, None), key, "{} missing in {}", key, lang);
            }
        }
    }

    #[test]
    fn failure_template_substitutes_error() {
        let s = tr(None, "report.failure", Some(&[("error", "API returned 500")]));
        assert_eq!(s, "Program failure: API returned 500");
    }

    #[test]
    fn user_values_are_inserted_verbatim() {
        let s = tr(
            None,
            "report.status_changed",
            Some(&[("verdict", "ok"), ("homework", "{verdict}")]),
        );
        assert_eq!(s, "Changed status for \"{verdict}\". ok");
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let s = tr(Some("fr"), "report.no_new_status", None);
        assert_eq!(s, "No new statuses.");
    }

    #[test]
    fn missing_key_returns_key() {
        let k = "non.existent.key";
        assert_eq!(tr(Some("ru"), k, None), k.to_string());
    }

    #[test]
    fn test_is_supported_language() {
        assert!(is_supported_language("ru"));
        assert!(is_supported_language("en"));
        assert!(!is_supported_language("fr"));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("en-US"), "en");
        assert_eq!(normalize_language("ru"), "ru");
        assert_eq!(normalize_language(" RU-ru"), "ru");
    }
}
