//! Output shapes for elements, fragments and attributes.
//!
//! The generator produces the attribute map and children list as PHP text and
//! hands them to a [`Formatter`], which decides what an element record looks
//! like in the output.

/// Turns generated pieces into element, fragment and attribute text.
pub trait Formatter: Send + Sync {
    /// `attributes` and `children` are PHP array literals, or `None` when the
    /// element has none.
    fn format_element(&self, tag: &str, attributes: Option<&str>, children: Option<&str>)
        -> String;

    fn format_fragment(&self, children: &str) -> String;

    /// One `key=>value` entry of an attribute map.
    fn format_attribute(&self, name: &str, value: &str) -> String {
        format!("'{name}'=>{value}")
    }
}

/// `['$', 'tag', attrs?, children?]`. Fragments are the bare children list.
///
/// The leading `'$'` tells element records apart from plain lists of children.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralFormatter;

impl Formatter for LiteralFormatter {
    fn format_element(
        &self,
        tag: &str,
        attributes: Option<&str>,
        children: Option<&str>,
    ) -> String {
        let mut fields = vec!["'$'".to_string(), format!("'{tag}'")];
        fields.extend(element_fields(attributes, children));
        format!("[{}]", fields.join(", "))
    }

    fn format_fragment(&self, children: &str) -> String {
        children.to_string()
    }
}

/// `['tag', attrs?, children?]`, without the `'$'` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareLiteralFormatter;

impl Formatter for BareLiteralFormatter {
    fn format_element(
        &self,
        tag: &str,
        attributes: Option<&str>,
        children: Option<&str>,
    ) -> String {
        let mut fields = vec![format!("'{tag}'")];
        fields.extend(element_fields(attributes, children));
        format!("[{}]", fields.join(", "))
    }

    fn format_fragment(&self, children: &str) -> String {
        children.to_string()
    }
}

/// Calls into userland functions: `html('tag', attrs?, children?)` and
/// `fragment(children)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PragmaFormatter {
    pub pragma: String,
    pub fragment: String,
}

impl PragmaFormatter {
    pub fn new(pragma: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            pragma: pragma.into(),
            fragment: fragment.into(),
        }
    }
}

impl Default for PragmaFormatter {
    fn default() -> Self {
        Self::new("html", "fragment")
    }
}

impl Formatter for PragmaFormatter {
    fn format_element(
        &self,
        tag: &str,
        attributes: Option<&str>,
        children: Option<&str>,
    ) -> String {
        let mut fields = vec![format!("'{tag}'")];
        fields.extend(element_fields(attributes, children));
        format!("{}({})", self.pragma, fields.join(", "))
    }

    fn format_fragment(&self, children: &str) -> String {
        format!("{}({children})", self.fragment)
    }
}

/// Trailing absent fields are dropped; an absent attribute map in front of
/// children is written as `null`.
fn element_fields(attributes: Option<&str>, children: Option<&str>) -> Vec<String> {
    let attributes = attributes.filter(|a| !is_absent(a));
    let children = children.filter(|c| !is_absent(c));

    match (attributes, children) {
        (None, None) => Vec::new(),
        (Some(attributes), None) => vec![attributes.to_string()],
        (attributes, Some(children)) => vec![
            attributes.unwrap_or("null").to_string(),
            children.to_string(),
        ],
    }
}

fn is_absent(field: &str) -> bool {
    matches!(field, "" | "null" | "[]")
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Field trimming
    // =========================================================================

    #[test]
    fn test_element_without_fields() {
        assert_eq!(LiteralFormatter.format_element("div", None, None), "['$', 'div']");
        assert_eq!(
            LiteralFormatter.format_element("div", Some("[]"), Some("")),
            "['$', 'div']"
        );
    }

    #[test]
    fn test_element_with_attributes_only() {
        assert_eq!(
            LiteralFormatter.format_element("br", Some("['id'=>'x']"), Some("[]")),
            "['$', 'br', ['id'=>'x']]"
        );
    }

    #[test]
    fn test_element_with_children_only() {
        assert_eq!(
            LiteralFormatter.format_element("p", Some("null"), Some("['Hi']")),
            "['$', 'p', null, ['Hi']]"
        );
        assert_eq!(
            LiteralFormatter.format_element("p", None, Some("['Hi']")),
            "['$', 'p', null, ['Hi']]"
        );
    }

    #[test]
    fn test_element_with_both_fields() {
        assert_eq!(
            LiteralFormatter.format_element("a", Some("['href'=>\"/\"]"), Some("['Home']")),
            "['$', 'a', ['href'=>\"/\"], ['Home']]"
        );
    }

    // =========================================================================
    // Variants
    // =========================================================================

    #[test]
    fn test_bare_literal_has_no_marker() {
        assert_eq!(
            BareLiteralFormatter.format_element("p", None, Some("['Hi']")),
            "['p', null, ['Hi']]"
        );
        assert_eq!(BareLiteralFormatter.format_fragment("['Hi']"), "['Hi']");
    }

    #[test]
    fn test_pragma_defaults() {
        let formatter = PragmaFormatter::default();
        assert_eq!(formatter.format_element("div", None, None), "html('div')");
        assert_eq!(
            formatter.format_element("li", Some("['id'=>1]"), None),
            "html('li', ['id'=>1])"
        );
        assert_eq!(formatter.format_fragment("['a', 'b']"), "fragment(['a', 'b'])");
    }

    #[test]
    fn test_pragma_custom_names() {
        let formatter = PragmaFormatter::new("h", "Fragment::of");
        assert_eq!(
            formatter.format_element("p", None, Some("['x']")),
            "h('p', null, ['x'])"
        );
        assert_eq!(formatter.format_fragment("[]"), "Fragment::of([])");
    }

    #[test]
    fn test_attribute_entry() {
        assert_eq!(LiteralFormatter.format_attribute("id", "$id"), "'id'=>$id");
        assert_eq!(
            PragmaFormatter::default().format_attribute("data-x", "true"),
            "'data-x'=>true"
        );
    }
}
