use tracing::warn;

/// Locales shipped in `locales/`
pub const AVAILABLE_LOCALES: &[&str] = &["en"];

/// Switch the message locale, keeping the fallback for unknown ones
pub fn set_locale(locale: &str) {
    if AVAILABLE_LOCALES.contains(&locale) {
        rust_i18n::set_locale(locale);
    } else {
        warn!("Locale '{}' is not available, falling back to en", locale);
        rust_i18n::set_locale("en");
    }
}
