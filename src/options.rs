//! Rendering of uninterpreted options back into protobuf source syntax.

use std::fmt;

use prost_types::UninterpretedOption;

use crate::fmt::Escaped;

/// The default name of the option used to inherit the fields of another message.
///
/// In source files it is written as `option (oneproto.extends) = "package.Parent";`.
pub const DEFAULT_EXTENDS_OPTION: &str = "oneproto.extends";

/// The value of an [`UninterpretedOption`].
///
/// An option produced by the parser has exactly one of its value fields set. If several are
/// set, the first in declaration order of this enum wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue<'a> {
    /// A bare identifier, such as `true` or `SPEED`.
    Identifier(&'a str),
    /// A floating point literal.
    Double(f64),
    /// The text of a message literal, without the surrounding braces.
    Aggregate(&'a str),
    /// A string literal.
    String(&'a [u8]),
    /// A non-negative integer literal.
    PositiveInt(u64),
    /// A negative integer literal.
    NegativeInt(i64),
}

impl<'a> OptionValue<'a> {
    /// Gets the value of an option, or `None` if no value field is set.
    pub fn from_option(option: &'a UninterpretedOption) -> Option<Self> {
        option
            .identifier_value
            .as_deref()
            .map(OptionValue::Identifier)
            .or_else(|| option.double_value.map(OptionValue::Double))
            .or_else(|| option.aggregate_value.as_deref().map(OptionValue::Aggregate))
            .or_else(|| option.string_value.as_deref().map(OptionValue::String))
            .or_else(|| option.positive_int_value.map(OptionValue::PositiveInt))
            .or_else(|| option.negative_int_value.map(OptionValue::NegativeInt))
    }
}

impl<'a> fmt::Display for OptionValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            OptionValue::Identifier(value) => f.write_str(value),
            OptionValue::Double(value) if value.is_nan() => f.write_str("nan"),
            OptionValue::Double(value) if value.is_infinite() => {
                f.write_str(if value > 0.0 { "inf" } else { "-inf" })
            }
            OptionValue::Double(value) => write!(f, "{}", value),
            OptionValue::Aggregate(value) => write!(f, "{{{}}}", value),
            OptionValue::String(value) => write!(f, "'{}'", Escaped(value)),
            OptionValue::PositiveInt(value) => write!(f, "{}", value),
            OptionValue::NegativeInt(value) => write!(f, "{}", value),
        }
    }
}

struct OptionName<'a>(&'a UninterpretedOption);

impl<'a> fmt::Display for OptionName<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.0.name.iter().enumerate() {
            if index != 0 {
                f.write_str(".")?;
            }
            if part.is_extension {
                write!(f, "({})", part.name_part)?;
            } else {
                f.write_str(&part.name_part)?;
            }
        }
        Ok(())
    }
}

/// Renders the name path of an option, e.g. `(my.ext).field`.
///
/// Only extension parts are wrapped in parentheses, so built-in options such as `deprecated`
/// stay unwrapped and the output remains valid protobuf.
pub fn option_name(option: &UninterpretedOption) -> String {
    OptionName(option).to_string()
}

/// Renders an option as `name = value`, the form used inside `option ...;` statements and
/// bracketed field options.
pub fn stringify(option: &UninterpretedOption) -> String {
    match OptionValue::from_option(option) {
        Some(value) => format!("{} = {}", OptionName(option), value),
        None => OptionName(option).to_string(),
    }
}

/// Returns true if the first part of the option's name is `sentinel`.
pub fn is_extends_directive(option: &UninterpretedOption, sentinel: &str) -> bool {
    option
        .name
        .first()
        .map_or(false, |part| part.name_part.trim_start_matches('.') == sentinel)
}

/// Renders a list of field or enum value options as ` [a = 1, b = 'x']`, or an empty string
/// if there are none.
pub fn value_options(options: &[UninterpretedOption]) -> String {
    if options.is_empty() {
        return String::new();
    }

    let options: Vec<String> = options.iter().map(stringify).collect();
    format!(" [{}]", options.join(", "))
}

/// The string payload of an option, if it has one and it is valid UTF-8.
pub(crate) fn string_value(option: &UninterpretedOption) -> Option<&str> {
    option
        .string_value
        .as_deref()
        .and_then(|value| std::str::from_utf8(value).ok())
}

#[cfg(test)]
pub(crate) fn option(name: &str, is_extension: bool) -> UninterpretedOption {
    use prost_types::uninterpreted_option::NamePart;

    UninterpretedOption {
        name: vec![NamePart {
            name_part: name.to_owned(),
            is_extension,
        }],
        ..Default::default()
    }
}
