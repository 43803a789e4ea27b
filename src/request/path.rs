use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::{AlgoliaError, Result};

/// Placeholder segment of a path template: `{indexName}`
const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z][A-Za-z0-9_]*)\}";
/// Multi-index sentinel, never encoded.
pub const WILDCARD: &str = "*";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern compiles"));

/// Placeholder names in template order.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER.captures_iter(template).filter_map(|caps| caps.get(1)).map(|m| m.as_str()).collect()
}

/// True when every placeholder spans a whole `/` segment.
pub fn placeholders_are_segments(template: &str) -> bool {
    template.split('/').all(|segment| !segment.contains('{') || segment_placeholder(segment).is_some())
}

fn segment_placeholder(segment: &str) -> Option<&str> {
    let caps = PLACEHOLDER.captures(segment)?;
    let whole = caps.get(0)?;
    (whole.start() == 0 && whole.end() == segment.len()).then(|| caps.get(1).map(|m| m.as_str())).flatten()
}

pub fn encode_segment(value: &str) -> String {
    if value == WILDCARD {
        return WILDCARD.to_string();
    }
    urlencoding::encode(value).into_owned()
}

/// Substitute every placeholder with its encoded value.
///
/// Fails with `MissingParameter` naming the first placeholder `resolve`
/// has no value for.
pub fn render<F>(
    template: &str,
    resolve: F,
) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = resolve(name.as_str()).ok_or_else(|| AlgoliaError::MissingParameter(name.as_str().to_string()))?;

        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(&encode_segment(&value));
        last = whole.end();
    }
    rendered.push_str(&template[last..]);

    Ok(rendered)
}

/// Match a rendered path against its template, decoding placeholder values.
pub fn match_template(
    template: &str,
    path: &str,
) -> Option<HashMap<String, String>> {
    let expected: Vec<&str> = template.split('/').collect();
    let actual: Vec<&str> = path.split('/').collect();
    if expected.len() != actual.len() {
        return None;
    }

    let mut values = HashMap::new();
    for (segment, value) in expected.iter().zip(actual.iter()) {
        match segment_placeholder(segment) {
            Some(name) => {
                let decoded = urlencoding::decode(value).ok()?;
                values.insert(name.to_string(), decoded.into_owned());
            }
            None if segment == value => {}
            None => return None,
        }
    }

    Some(values)
}
