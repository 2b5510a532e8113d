use std::fmt::{self, Write};

/// Width of one level of indentation in generated source.
pub(crate) const INDENT_WIDTH: usize = 4;

/// Displays a byte string as the body of a protobuf string literal.
pub(crate) struct Escaped<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Escaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &ch in self.0 {
            match ch {
                b'\t' => f.write_str("\\t")?,
                b'\r' => f.write_str("\\r")?,
                b'\n' => f.write_str("\\n")?,
                b'\\' => f.write_str("\\\\")?,
                b'\'' => f.write_str("\\'")?,
                b'"' => f.write_str("\\\"")?,
                b'\x20'..=b'\x7e' => f.write_char(ch as char)?,
                _ => {
                    write!(f, "\\{:03o}", ch)?;
                }
            }
        }

        Ok(())
    }
}

/// Displays leading whitespace for the given nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Indent(pub usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.0 * INDENT_WIDTH)
    }
}

#[test]
fn escaped() {
    assert_eq!(Escaped(b"it's").to_string(), "it\\'s");
    assert_eq!(Escaped(b"a\\b\n").to_string(), "a\\\\b\\n");
    assert_eq!(Escaped(&[0xff]).to_string(), "\\377");
}

#[test]
fn indent() {
    assert_eq!(Indent(0).to_string(), "");
    assert_eq!(Indent(2).to_string(), "        ");
}
