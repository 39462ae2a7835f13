// crates/pmc-rs-export/src/nested.rs
//! Nested line lists and their indented rendering.

/// A line, or a block whose lines sit one indent level deeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested {
    Line(String),
    Block(Vec<Nested>),
}

impl Nested {
    pub fn line(text: impl Into<String>) -> Self {
        Nested::Line(text.into())
    }

    pub fn blank() -> Self {
        Nested::Line(String::new())
    }
}

impl From<&str> for Nested {
    fn from(text: &str) -> Self {
        Nested::Line(text.to_string())
    }
}

impl From<String> for Nested {
    fn from(text: String) -> Self {
        Nested::Line(text)
    }
}

impl From<Vec<Nested>> for Nested {
    fn from(items: Vec<Nested>) -> Self {
        Nested::Block(items)
    }
}

const INDENT: &str = "    ";

/// Renders `items` with four spaces per nesting level. Blank lines carry no
/// indentation and the text ends with a newline.
pub fn format_nested_lists(items: &[Nested]) -> String {
    let mut out = String::new();
    write_level(items, 0, &mut out);
    out
}

fn write_level(items: &[Nested], depth: usize, out: &mut String) {
    for item in items {
        match item {
            Nested::Line(text) if text.is_empty() => out.push('\n'),
            Nested::Line(text) => {
                for _ in 0..depth {
                    out.push_str(INDENT);
                }
                out.push_str(text);
                out.push('\n');
            }
            Nested::Block(children) => write_level(children, depth + 1, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_indent_by_four_spaces() {
        let text = format_nested_lists(&[
            "int main(void)".into(),
            "{".into(),
            vec!["if (x)".into(), "{".into(), vec!["return 1;".into()].into(), "}".into()].into(),
            "}".into(),
        ]);
        assert_eq!(
            text,
            "int main(void)\n{\n    if (x)\n    {\n        return 1;\n    }\n}\n"
        );
    }

    #[test]
    fn blank_lines_are_not_indented() {
        let text = format_nested_lists(&[vec!["a".into(), Nested::blank(), "b".into()].into()]);
        assert_eq!(text, "    a\n\n    b\n");
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(format_nested_lists(&[]), "");
    }
}
