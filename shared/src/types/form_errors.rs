use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

// ---------------------------------------------------------------------------
// Field errors
// ---------------------------------------------------------------------------

/// Per-field, user-facing messages collected during one validation pass.
///
/// Keys are the query-parameter / JSON names the pages read back
/// (`emailError`, `owner`, ...). Setting the same key twice keeps the first
/// message, so the first failing rule of a field is the one shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

// ---------------------------------------------------------------------------
// URL error-parameter propagation
// ---------------------------------------------------------------------------

/// Error parameters cleared from a return URL before new ones are appended.
pub const ERROR_PARAMS: [&str; 9] = [
    "emailError",
    "passwordError",
    "confirmPasswordError",
    "firstNameError",
    "lastNameError",
    "termsPrivacyError",
    "termsAgbError",
    "authError",
    "connectionError",
];

/// Append `errors` as query parameters to `url`, dropping stale error
/// parameters first.
///
/// `url` may be absolute or relative; relative URLs are resolved against
/// `base_url`. Only `path?query` is returned, so a forged absolute `returnTo`
/// never sends the browser off-site. Empty messages are skipped.
pub fn append_error_params<'a, I>(url: &str, base_url: &str, errors: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let parsed = if url.starts_with("http") {
        Url::parse(url).ok()
    } else {
        Url::parse(base_url).ok().and_then(|base| base.join(url).ok())
    };

    let Some(mut parsed) = parsed else {
        // Unparseable return target: fall back to a bare relative path so the
        // errors still reach the page.
        return append_to_path("/", errors);
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !ERROR_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut merged: Vec<(String, String)> = Vec::with_capacity(kept.len());
    merged.extend(kept);

    for (param, value) in errors {
        if value.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|(k, _)| k == param) {
            Some(existing) => existing.1 = value.to_string(),
            None => merged.push((param.to_string(), value.to_string())),
        }
    }

    if merged.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(merged.iter());
    }

    // A path starting with `//` would be read by the browser as another host.
    let path = format!("/{}", parsed.path().trim_start_matches('/'));
    match parsed.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path,
    }
}

fn append_to_path<'a, I>(path: &str, errors: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(errors.into_iter().filter(|(_, v)| !v.is_empty()))
        .finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}
