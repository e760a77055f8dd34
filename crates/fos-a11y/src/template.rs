//! Announcement Templates
//!
//! `{name}` placeholder substitution for announcement strings.

/// Replace the first `{key}` of every `(key, value)` pair in `template`
///
/// Placeholders without a matching key are left as they are, and keys that
/// do not occur in the template are ignored. Each placeholder is replaced
/// at most once per call.
///
/// ```
/// use fos_a11y::render;
///
/// assert_eq!(render("Navigated to: {title}", &[("title", "Home")]), "Navigated to: Home");
/// assert_eq!(render("{title} at {url}", &[]), "{title} at {url}");
/// ```
///
/// The values are required; "no replacements" is spelled `&[]`:
///
/// ```compile_fail
/// let _ = fos_a11y::render("Navigated to: {title}");
/// ```
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (key, value) in values {
        let placeholder = format!("{{{key}}}");
        output = output.replacen(&placeholder, value, 1);
    }
    output
}
