/**
 * Indented markup output.  The RDF/XML emitter describes the document as a tree
 * of `F` values and `generate_formatted` writes it out line by line with
 * two-space indentation per nesting level.
 **/
use std::io::Write;

use crate::errors::{ConvertError, Result};

/// `generate_formatted` input type that allows for hierarchical indentation and
/// not having to call to_string() on everything.
#[derive(Clone, Debug)]
pub enum F {
    /// Indents its children by one 2-spaced level.
    /// Use like `F::Indent(vec![...])`.
    Indent(Vec<F>),
    /// Doesn't indent its children.
    /// Use like `F::Seq(vec![...])`.
    Seq(Vec<F>),
    /// For when you don't have a 'static lifetime string literal that's part of
    /// the program source.  Frequently this is the result of a `format!` call.
    /// Use like `F::T(format!(r#"<cim:IdentifiedObject.name>{}</cim:IdentifiedObject.name>"#, name))`.
    T(String),
    /// For string literals in the program.  Avoid having to type `to_string()`!
    /// Use like `F::S("</rdf:RDF>")`.
    S(&'static str),
}

fn write_line(writer: &mut dyn Write, text: &str, indent: u32) -> Result<()> {
    for _ in 0..indent {
        write!(writer, "  ").map_err(write_err)?;
    }
    writeln!(writer, "{}", text).map_err(write_err)
}

fn write_err(err: std::io::Error) -> ConvertError {
    ConvertError::Generation(format!("write error: {}", err))
}

pub fn generate_formatted(writer: &mut dyn Write, formatted: &F, indent: u32) -> Result<()> {
    match *formatted {
        F::Indent(ref seq) => {
            for f in seq {
                generate_formatted(writer, f, indent + 1)?;
            }
            Ok(())
        }
        F::Seq(ref seq) => {
            for f in seq {
                generate_formatted(writer, f, indent)?;
            }
            Ok(())
        }
        F::T(ref text) => write_line(writer, text, indent),
        F::S(text) => write_line(writer, text, indent),
    }
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: &F) -> String {
        let mut out = Vec::new();
        generate_formatted(&mut out, f, 0).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_indentation_levels() {
        let f = F::Seq(vec![
            F::S("<a>"),
            F::Indent(vec![
                F::T(format!("<b>{}</b>", 1)),
                F::Indent(vec![F::S("<c/>")]),
                F::Seq(vec![F::S("<d/>")]),
            ]),
            F::S("</a>"),
        ]);
        assert_eq!(render(&f), "<a>\n  <b>1</b>\n    <c/>\n  <d/>\n</a>\n");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape(r#"Substation "North" & <yard>"#),
            "Substation &quot;North&quot; &amp; &lt;yard&gt;"
        );
        assert_eq!(xml_escape("Здания и сооружения"), "Здания и сооружения");
    }
}
