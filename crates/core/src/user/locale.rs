//! Country resolution from user locale tags

use hearth_domain::constants::DEFAULT_COUNTRY_CODE;
use hearth_domain::Result;

use super::ports::UserDirectory;

/// Region subtag of a BCP 47 locale tag, upper-cased.
///
/// The region is the first subtag after the language that is two letters or
/// three digits, so script subtags (`zh-Hant-TW`) are skipped. Scanning stops
/// at the first singleton (`-x-`, `-u-`). Anything else resolves to `US`.
pub fn country_from_locale(locale: Option<&str>) -> String {
    locale
        .and_then(|tag| {
            tag.split('-')
                .skip(1)
                .take_while(|subtag| subtag.len() > 1)
                .find(|subtag| is_region(subtag))
        })
        .map_or_else(|| DEFAULT_COUNTRY_CODE.to_string(), str::to_ascii_uppercase)
}

fn is_region(subtag: &str) -> bool {
    match subtag.len() {
        2 => subtag.bytes().all(|b| b.is_ascii_alphabetic()),
        3 => subtag.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}

/// Country code for a user, from their stored preferences.
pub async fn resolve_country(users: &dyn UserDirectory, user_id: &str) -> Result<String> {
    let prefs = users.find_preferences(user_id).await?;
    Ok(country_from_locale(prefs.as_ref().and_then(|p| p.locale.as_deref())))
}
