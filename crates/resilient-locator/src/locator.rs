// Locator parsing - "strategy=value" descriptors
//
// A locator string names how to find an element. It is either an explicit
// `strategy=value` pair or a bare value, which is treated as CSS.
//
// Parsing is lenient about the strategy: an unknown prefix degrades to CSS
// (using the whole original string) and logs a warning instead of failing.
// It is strict about content: empty input and empty values are errors.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy used to identify an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Css,
    XPath,
    Text,
    Role,
    Id,
    Placeholder,
    Label,
    Alt,
    Title,
    TestId,
}

/// Which strategy names a parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategySet {
    /// css, xpath, text, role, id
    #[default]
    Engine,
    /// Engine strategies plus placeholder, label, alt, title, test-id
    Extended,
}

impl Strategy {
    /// Canonical prefix for this strategy
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
            Strategy::Text => "text",
            Strategy::Role => "role",
            Strategy::Id => "id",
            Strategy::Placeholder => "placeholder",
            Strategy::Label => "label",
            Strategy::Alt => "alt",
            Strategy::Title => "title",
            Strategy::TestId => "test-id",
        }
    }

    /// Looks up a prefix (case-insensitive) within the given strategy set
    pub fn from_prefix(prefix: &str, set: StrategySet) -> Option<Strategy> {
        let strategy = match prefix.to_ascii_lowercase().as_str() {
            "css" => Strategy::Css,
            "xpath" => Strategy::XPath,
            "text" => Strategy::Text,
            "role" => Strategy::Role,
            "id" => Strategy::Id,
            "placeholder" => Strategy::Placeholder,
            "label" => Strategy::Label,
            "alt" => Strategy::Alt,
            "title" => Strategy::Title,
            "test-id" | "testid" | "data-testid" => Strategy::TestId,
            _ => return None,
        };

        if set == StrategySet::Engine && !strategy.is_engine() {
            return None;
        }
        Some(strategy)
    }

    /// Whether the strategy belongs to the core engine set
    pub fn is_engine(&self) -> bool {
        matches!(
            self,
            Strategy::Css | Strategy::XPath | Strategy::Text | Strategy::Role | Strategy::Id
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parsed `role=` locator: ARIA role plus attribute filters
///
/// `role=button[name='Submit',checked='true']` yields role `button` and
/// attributes `[("name", "Submit"), ("checked", "true")]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleQuery {
    pub role: String,
    pub attributes: Vec<(String, String)>,
}

impl RoleQuery {
    /// Returns the value of the named attribute, if present
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An immutable, parsed locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    strategy: Strategy,
    value: String,
    role: Option<RoleQuery>,
}

impl Locator {
    /// The original locator string
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Role query, present only for `Strategy::Role`
    pub fn role(&self) -> Option<&RoleQuery> {
        self.role.as_ref()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses a locator using the engine strategy set.
///
/// # Errors
///
/// Returns `Error::InvalidLocator` if the input is empty, a known strategy has
/// an empty value, or a role locator is malformed.
pub fn parse(locator: &str) -> Result<Locator> {
    parse_with(locator, StrategySet::Engine)
}

/// Parses a locator accepting the extended utility strategies as well.
pub fn parse_extended(locator: &str) -> Result<Locator> {
    parse_with(locator, StrategySet::Extended)
}

/// Parses a locator against an explicit strategy set.
pub fn parse_with(locator: &str, set: StrategySet) -> Result<Locator> {
    if locator.trim().is_empty() {
        return Err(Error::InvalidLocator("locator string is empty".to_string()));
    }

    let Some((prefix, rest)) = split_strategy_prefix(locator) else {
        return Ok(css(locator));
    };

    let Some(strategy) = Strategy::from_prefix(prefix, set) else {
        tracing::warn!(
            locator,
            prefix,
            "Unknown locator strategy, treating whole locator as CSS"
        );
        return Ok(css(locator));
    };

    let value = rest.trim();
    if value.is_empty() {
        return Err(Error::InvalidLocator(format!(
            "empty value for strategy '{}' in locator '{}'",
            strategy, locator
        )));
    }

    let role = if strategy == Strategy::Role {
        Some(parse_role(value, locator)?)
    } else {
        None
    };

    Ok(Locator {
        raw: locator.to_string(),
        strategy,
        value: value.to_string(),
        role,
    })
}

fn css(locator: &str) -> Locator {
    Locator {
        raw: locator.to_string(),
        strategy: Strategy::Css,
        value: locator.to_string(),
        role: None,
    }
}

/// Splits off an identifier-like prefix before the first `=`.
///
/// `input[name=q]` has no strategy prefix: `input[name` is not an identifier,
/// so the whole string is plain CSS.
pub(crate) fn split_strategy_prefix(locator: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = locator.split_once('=')?;
    let prefix = prefix.trim();
    let mut chars = prefix.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Some((prefix, rest))
    } else {
        None
    }
}

fn parse_role(value: &str, locator: &str) -> Result<RoleQuery> {
    let Some(open) = value.find('[') else {
        return Ok(RoleQuery {
            role: value.to_string(),
            attributes: Vec::new(),
        });
    };

    let role = value[..open].trim();
    if role.is_empty() {
        return Err(Error::InvalidLocator(format!(
            "missing role name in locator '{}'",
            locator
        )));
    }

    let body = value[open + 1..].strip_suffix(']').ok_or_else(|| {
        Error::InvalidLocator(format!("unterminated '[' in role locator '{}'", locator))
    })?;

    let mut attributes = Vec::new();
    for item in split_attributes(body) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once('=') {
            Some((key, raw)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(Error::InvalidLocator(format!(
                        "empty attribute name in role locator '{}'",
                        locator
                    )));
                }
                attributes.push((key.to_string(), unquote(raw.trim())));
            }
            // Bare flag such as `checkbox[checked]`
            None => attributes.push((item.to_string(), "true".to_string())),
        }
    }

    Ok(RoleQuery {
        role: role.to_string(),
        attributes,
    })
}

/// Splits on commas that are outside single or double quotes.
fn split_attributes(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if quote.is_some() => {
                current.push(c);
                escaped = true;
            }
            '\'' | '"' => {
                match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                }
                current.push(c);
            }
            ',' if quote.is_none() => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Strips matching outer quotes and resolves backslash escapes inside them.
fn unquote(raw: &str) -> String {
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')));
    if !quoted {
        return raw.to_string();
    }

    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_value_defaults_to_css() {
        let loc = parse("#submit").unwrap();
        assert_eq!(loc.strategy(), Strategy::Css);
        assert_eq!(loc.value(), "#submit");
    }

    #[test]
    fn test_explicit_strategies() {
        let cases = [
            ("css=.btn", Strategy::Css, ".btn"),
            ("xpath=//button[@id='go']", Strategy::XPath, "//button[@id='go']"),
            ("text=Sign in", Strategy::Text, "Sign in"),
            ("id=username", Strategy::Id, "username"),
            ("XPATH=//a", Strategy::XPath, "//a"),
        ];
        for (input, strategy, value) in cases {
            let loc = parse(input).unwrap();
            assert_eq!(loc.strategy(), strategy, "input: {}", input);
            assert_eq!(loc.value(), value, "input: {}", input);
        }
    }

    #[test]
    fn test_css_attribute_selector_is_not_a_prefix() {
        let loc = parse("input[name=q]").unwrap();
        assert_eq!(loc.strategy(), Strategy::Css);
        assert_eq!(loc.value(), "input[name=q]");
    }

    #[test]
    fn test_unknown_prefix_degrades_to_css_with_whole_string() {
        let loc = parse("bogus=thing").unwrap();
        assert_eq!(loc.strategy(), Strategy::Css);
        assert_eq!(loc.value(), "bogus=thing");
    }

    #[test]
    fn test_extended_prefixes_only_in_extended_set() {
        let engine = parse("placeholder=Email").unwrap();
        assert_eq!(engine.strategy(), Strategy::Css);
        assert_eq!(engine.value(), "placeholder=Email");

        let extended = parse_extended("placeholder=Email").unwrap();
        assert_eq!(extended.strategy(), Strategy::Placeholder);
        assert_eq!(extended.value(), "Email");

        assert_eq!(
            parse_extended("data-testid=save").unwrap().strategy(),
            Strategy::TestId
        );
        assert_eq!(
            parse_extended("test-id=save").unwrap().strategy(),
            Strategy::TestId
        );
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(parse(""), Err(Error::InvalidLocator(_))));
        assert!(matches!(parse("   "), Err(Error::InvalidLocator(_))));
    }

    #[test]
    fn test_empty_value_after_valid_prefix_is_error() {
        assert!(matches!(parse("xpath="), Err(Error::InvalidLocator(_))));
        assert!(matches!(parse("text=   "), Err(Error::InvalidLocator(_))));
    }

    #[test]
    fn test_role_with_attributes() {
        let loc = parse("role=button[name='Submit',checked='true']").unwrap();
        let role = loc.role().unwrap();
        assert_eq!(role.role, "button");
        assert_eq!(role.attribute("name"), Some("Submit"));
        assert_eq!(role.attribute("checked"), Some("true"));
    }

    #[test]
    fn test_role_without_attributes() {
        let loc = parse("role=navigation").unwrap();
        let role = loc.role().unwrap();
        assert_eq!(role.role, "navigation");
        assert!(role.attributes.is_empty());
    }

    #[test]
    fn test_role_quoted_value_keeps_commas_and_escapes() {
        let loc = parse(r#"role=link[name="Terms, Conditions",level='it\'s']"#).unwrap();
        let role = loc.role().unwrap();
        assert_eq!(role.attribute("name"), Some("Terms, Conditions"));
        assert_eq!(role.attribute("level"), Some("it's"));
    }

    #[test]
    fn test_role_bare_flag() {
        let loc = parse("role=checkbox[checked]").unwrap();
        assert_eq!(loc.role().unwrap().attribute("checked"), Some("true"));
    }

    #[test]
    fn test_role_malformed() {
        assert!(matches!(
            parse("role=button[name='x'"),
            Err(Error::InvalidLocator(_))
        ));
        assert!(matches!(
            parse("role=[name='x']"),
            Err(Error::InvalidLocator(_))
        ));
    }
}
