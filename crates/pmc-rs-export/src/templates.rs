// crates/pmc-rs-export/src/templates.rs
//! Framing of generated C files.
//!
//! A source file is its banner, its `#include` lines and its body; a header
//! additionally gets an include guard derived from its file name. The
//! embedded templates can be replaced by `c_source.hbs` / `c_header.hbs`
//! files in a template directory.

use std::path::Path;

use handlebars::Handlebars;
use log::debug;
use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::names::include_guard;
use crate::nested::{Nested, format_nested_lists};

const SOURCE: &str = "c_source";
const HEADER: &str = "c_header";

const EMBEDDED_SOURCE: &str = include_str!("../templates/c_source.hbs");
const EMBEDDED_HEADER: &str = include_str!("../templates/c_header.hbs");

/// One generated C file before framing.
#[derive(Debug, Clone)]
pub struct CFile {
    pub name: String,
    /// `"interface.h"` or `<stdint.h>`, in emission order.
    pub includes: Vec<String>,
    pub body: Vec<Nested>,
}

impl CFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            includes: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn include(mut self, header: impl Into<String>) -> Self {
        self.includes.push(header.into());
        self
    }

    pub fn is_header(&self) -> bool {
        self.name.ends_with(".h")
    }
}

#[derive(Serialize)]
struct FrameContext<'a> {
    banner: &'a str,
    guard: String,
    includes: String,
    body: String,
}

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Embedded templates, with any found in `template_dir` taking their place.
    pub fn new(template_dir: Option<&Path>) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        for (name, embedded) in [(SOURCE, EMBEDDED_SOURCE), (HEADER, EMBEDDED_HEADER)] {
            let file = template_dir.map(|d| d.join(format!("{name}.hbs")));
            match file.filter(|f| f.is_file()) {
                Some(path) => {
                    debug!("Using template {}", path.display());
                    let text = std::fs::read_to_string(&path).map_err(|e| ExportError::io(&path, e))?;
                    registry.register_template_string(name, text)?;
                }
                None => registry.register_template_string(name, embedded)?,
            }
        }
        Ok(Self { registry })
    }

    /// Frames `file` and returns its text, ending in exactly one newline.
    pub fn render(&self, file: &CFile, banner: &str) -> Result<String> {
        let includes = file
            .includes
            .iter()
            .map(|h| {
                if h.starts_with('<') {
                    format!("#include {h}")
                } else {
                    format!("#include \"{h}\"")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let context = FrameContext {
            banner,
            guard: include_guard(&file.name),
            includes,
            body: format_nested_lists(&file.body).trim_end().to_string(),
        };
        let template = if file.is_header() { HEADER } else { SOURCE };
        let text = self.registry.render(template, &context)?;
        Ok(format!("{}\n", text.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> CFile {
        let mut file = CFile::new(name).include("<stdint.h>").include("interface.h");
        file.body.push("extern int x;".into());
        file
    }

    #[test]
    fn header_gets_guard_and_includes() {
        let templates = Templates::new(None).expect("templates");
        let text = templates.render(&file("interface.h"), "generated").expect("render");
        assert_eq!(
            text,
            "/* generated */\n\n#ifndef INTERFACE_H\n#define INTERFACE_H\n\n\
             #include <stdint.h>\n#include \"interface.h\"\n\nextern int x;\n\n\
             #endif /* INTERFACE_H */\n"
        );
    }

    #[test]
    fn source_has_no_guard() {
        let templates = Templates::new(None).expect("templates");
        let text = templates.render(&file("interface.c"), "generated").expect("render");
        assert!(!text.contains("#ifndef"));
        assert!(text.ends_with("extern int x;\n"));
    }

    #[test]
    fn template_directory_overrides_embedded() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("c_source.hbs"), "// {{banner}}\n{{body}}\n").expect("write");
        let templates = Templates::new(Some(dir.path())).expect("templates");
        let text = templates.render(&file("a.c"), "custom").expect("render");
        assert_eq!(text, "// custom\nextern int x;\n");
        let header = templates.render(&file("a.h"), "custom").expect("render");
        assert!(header.contains("#ifndef A_H"));
    }
}
