use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, FieldDescriptorProto,
};

use crate::{fmt::Escaped, options::stringify};

/// Finds the synthetic map entry message referenced by `field` among `scope`, the nested types
/// of the message declaring the field.
pub fn map_entry<'a>(
    scope: &'a [DescriptorProto],
    field: &FieldDescriptorProto,
) -> Option<&'a DescriptorProto> {
    let type_name = field.type_name.as_deref().filter(|name| !name.is_empty())?;
    let type_name = type_name.rsplit('.').next().unwrap_or(type_name);

    scope.iter().find(|nested| {
        nested.name() == type_name
            && nested
                .options
                .as_ref()
                .map_or(false, |options| options.map_entry())
    })
}

/// Renders the type of a field, including any `repeated`, `optional` or `required` label.
///
/// `scope` is the list of nested types of the message declaring the field, and is searched
/// for map entry types: a field referencing one is rendered as `map<K,V>`.
pub fn field_type(scope: &[DescriptorProto], field: &FieldDescriptorProto) -> String {
    let name = match field.type_name.as_deref().filter(|name| !name.is_empty()) {
        Some(type_name) => {
            if let Some(entry) = map_entry(scope, field) {
                return format!(
                    "map<{},{}>",
                    entry_field_type(entry, 1),
                    entry_field_type(entry, 2)
                );
            }
            type_name.to_owned()
        }
        None => scalar_name(field.r#type()),
    };

    match field.label() {
        Label::Repeated => format!("repeated {}", name),
        Label::Required => format!("required {}", name),
        Label::Optional if field.proto3_optional() => format!("optional {}", name),
        Label::Optional => name,
    }
}

/// Renders a complete field declaration, e.g. `repeated string names = 3 [deprecated = true];`.
pub fn field_line(scope: &[DescriptorProto], field: &FieldDescriptorProto) -> String {
    let mut options: Vec<String> = default_option(field).into_iter().collect();
    options.extend(
        field
            .options
            .iter()
            .flat_map(|options| &options.uninterpreted_option)
            .map(stringify),
    );

    let options = if options.is_empty() {
        String::new()
    } else {
        format!(" [{}]", options.join(", "))
    };

    format!(
        "{} {} = {}{};",
        field_type(scope, field),
        field.name(),
        field.number(),
        options
    )
}

fn entry_field_type(entry: &DescriptorProto, number: i32) -> String {
    entry
        .field
        .iter()
        .find(|field| field.number() == number)
        .map(|field| field_type(&entry.nested_type, field))
        .unwrap_or_default()
}

fn scalar_name(ty: Type) -> String {
    let name = ty.as_str_name();
    name.strip_prefix("TYPE_")
        .unwrap_or(name)
        .to_ascii_lowercase()
}

fn default_option(field: &FieldDescriptorProto) -> Option<String> {
    let value = field.default_value.as_deref()?;
    if field.r#type == Some(Type::String as i32) {
        Some(format!("default = '{}'", Escaped(value.as_bytes())))
    } else if field.r#type == Some(Type::Bytes as i32) {
        // Already escaped in the descriptor.
        Some(format!("default = '{}'", value))
    } else {
        Some(format!("default = {}", value))
    }
}
