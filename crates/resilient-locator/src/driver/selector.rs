// Selector - structured driver-level selector
//
// A Selector is the driver-facing form of a parsed Locator. It is a chain of
// parts, each scoped inside the previous one, and renders to Playwright's
// selector syntax (`part >> part >> ...`).

use crate::locator::{Locator, Strategy, split_strategy_prefix};
use std::fmt;

/// One link in a selector chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Css(String),
    XPath(String),
    Text(String),
    Role {
        role: String,
        attributes: Vec<(String, String)>,
    },
    Id(String),
    /// Exact attribute match, e.g. `[placeholder="Email"]`
    Attribute {
        name: String,
        value: String,
    },
    Label(String),
    TestId(String),
    /// Zero-based match index
    Nth(usize),
}

/// Driver-level selector: an ordered chain of scoped parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<SelectorPart>,
}

impl Selector {
    /// Single CSS selector
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            parts: vec![SelectorPart::Css(css.into())],
        }
    }

    /// Builds the driver selector for a parsed locator
    pub fn from_locator(locator: &Locator) -> Self {
        let value = locator.value().to_string();
        let part = match locator.strategy() {
            Strategy::Css => SelectorPart::Css(value),
            Strategy::XPath => SelectorPart::XPath(value),
            Strategy::Text => SelectorPart::Text(value),
            Strategy::Role => match locator.role() {
                Some(query) => SelectorPart::Role {
                    role: query.role.clone(),
                    attributes: query.attributes.clone(),
                },
                None => SelectorPart::Role {
                    role: value,
                    attributes: Vec::new(),
                },
            },
            Strategy::Id => SelectorPart::Id(value),
            Strategy::Placeholder => SelectorPart::Attribute {
                name: "placeholder".to_string(),
                value,
            },
            Strategy::Alt => SelectorPart::Attribute {
                name: "alt".to_string(),
                value,
            },
            Strategy::Title => SelectorPart::Attribute {
                name: "title".to_string(),
                value,
            },
            Strategy::Label => SelectorPart::Label(value),
            Strategy::TestId => SelectorPart::TestId(value),
        };
        Self { parts: vec![part] }
    }

    /// Returns a new selector scoped inside this one
    pub fn then(&self, part: SelectorPart) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part);
        Self { parts }
    }

    /// Scopes a CSS selector inside this one
    pub fn child(&self, css: impl Into<String>) -> Self {
        self.then(SelectorPart::Css(css.into()))
    }

    /// Narrows to the nth (zero-based) match
    pub fn nth(&self, index: usize) -> Self {
        self.then(SelectorPart::Nth(index))
    }

    pub fn parts(&self) -> &[SelectorPart] {
        &self.parts
    }

    /// Returns the CSS text if this selector is a single CSS part
    pub fn as_single_css(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [SelectorPart::Css(css)] if split_strategy_prefix(css).is_none() => Some(css),
            _ => None,
        }
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // A CSS value that looks like `engine=...` must be pinned to the
            // css engine or the driver would read the prefix as an engine name.
            SelectorPart::Css(css) if split_strategy_prefix(css).is_some() => {
                write!(f, "css={}", css)
            }
            SelectorPart::Css(css) => f.write_str(css),
            SelectorPart::XPath(xpath) => write!(f, "xpath={}", xpath),
            SelectorPart::Text(text) => write!(f, "text={}", text),
            SelectorPart::Role { role, attributes } => {
                write!(f, "role={}", role)?;
                for (name, value) in attributes {
                    if value == "true" || value == "false" {
                        write!(f, "[{}={}]", name, value)?;
                    } else {
                        write!(f, "[{}=\"{}\"]", name, escape_quoted(value))?;
                    }
                }
                Ok(())
            }
            SelectorPart::Id(id) => write!(f, "id={}", id),
            SelectorPart::Attribute { name, value } => {
                write!(f, "[{}=\"{}\"]", name, escape_quoted(value))
            }
            SelectorPart::Label(label) => {
                write!(f, "internal:label=\"{}\"", escape_quoted(label))
            }
            SelectorPart::TestId(id) => write!(f, "data-testid={}", id),
            SelectorPart::Nth(index) => write!(f, "nth={}", index),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{parse, parse_extended};

    #[test]
    fn test_render_engine_strategies() {
        let cases = [
            ("#save", "#save"),
            ("xpath=//div", "xpath=//div"),
            ("text=Continue", "text=Continue"),
            ("id=email", "id=email"),
            ("bogus=thing", "css=bogus=thing"),
        ];
        for (input, rendered) in cases {
            let selector = Selector::from_locator(&parse(input).unwrap());
            assert_eq!(selector.to_string(), rendered, "input: {}", input);
        }
    }

    #[test]
    fn test_render_role_attributes() {
        let selector =
            Selector::from_locator(&parse("role=button[name='Submit',checked='true']").unwrap());
        assert_eq!(
            selector.to_string(),
            "role=button[name=\"Submit\"][checked=true]"
        );
    }

    #[test]
    fn test_render_extended_strategies() {
        let placeholder = Selector::from_locator(&parse_extended("placeholder=Email").unwrap());
        assert_eq!(placeholder.to_string(), "[placeholder=\"Email\"]");

        let label = Selector::from_locator(&parse_extended("label=Password").unwrap());
        assert_eq!(label.to_string(), "internal:label=\"Password\"");

        let test_id = Selector::from_locator(&parse_extended("test-id=save").unwrap());
        assert_eq!(test_id.to_string(), "data-testid=save");
    }

    #[test]
    fn test_chain_rendering() {
        let row = Selector::css("#grid")
            .child("tbody tr:nth-child(2)")
            .child("td:nth-child(3)");
        assert_eq!(
            row.to_string(),
            "#grid >> tbody tr:nth-child(2) >> td:nth-child(3)"
        );
        assert_eq!(Selector::css("li").nth(4).to_string(), "li >> nth=4");
    }

    #[test]
    fn test_single_css() {
        assert_eq!(Selector::css("#a").as_single_css(), Some("#a"));
        assert_eq!(Selector::css("#a").child("b").as_single_css(), None);
        assert_eq!(Selector::css("x=y").as_single_css(), None);
    }
}
