use prost_types::{
    field_descriptor_proto::{Label, Type},
    FieldOptions,
};

use super::*;
use crate::{file::File, options::option, resolve::Resolver};

fn generate(files: &[(&str, &str)], template: &str) -> String {
    let files = files
        .iter()
        .map(|(name, source)| {
            File::from_source(name, source)
                .unwrap()
                .into_file_descriptor_proto()
        })
        .collect();
    let mut tree = NamespaceTree::build(files, "root");
    Resolver::new(&mut tree).resolve_all().unwrap();

    Generator::new(&tree).generate(template)
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

#[test]
fn merged_message_with_map() {
    let output = generate(
        &[(
            "user.proto",
            r#"
                syntax = "proto3";
                package root;

                message User {
                    option (oneproto.extends) = "root.Base";
                    map<string, int32> tags = 3;
                    repeated string emails = 2;
                }

                message Base {
                    string id = 1;
                }
            "#,
        )],
        "syntax = \"proto3\";\n\npackage root;\n",
    );

    similar_asserts::assert_eq!(
        output,
        "\
syntax = \"proto3\";

package root;

message User {
    string id = 1;
    repeated string emails = 2;
    map<string,int32> tags = 3;
}

message Base {
    string id = 1;
}
"
    );
}

#[test]
fn map_of_messages() {
    let output = generate(
        &[(
            "root.proto",
            r#"
                syntax = "proto3";
                package root;
                message Index {
                    map<int64, Entry> entries = 1;
                    message Entry { string value = 1; }
                }
            "#,
        )],
        "",
    );

    similar_asserts::assert_eq!(
        output,
        "\
message Index {
    map<int64,Entry> entries = 1;

    message Entry {
        string value = 1;
    }
}
"
    );
}

#[test]
fn nested_namespaces() {
    let output = generate(
        &[
            ("a/c.proto", "package root.a.c; message C {}"),
            ("a/b.proto", "package root.a.b; message B {}"),
            ("top.proto", "package root; message Top {}"),
        ],
        "",
    );

    similar_asserts::assert_eq!(
        output,
        "\
message Top {
}

message a {
    message b {
        message B {
        }
    }

    message c {
        message C {
        }
    }
}
"
    );
}

#[test]
fn extensions_grouped_by_extendee() {
    let output = generate(
        &[(
            "ext.proto",
            r#"
                syntax = "proto2";
                package root;
                extend Foo { optional int32 x = 100; }
                extend Bar { repeated string y = 101; }
                extend Foo { optional int32 z = 102; }
            "#,
        )],
        "",
    );

    similar_asserts::assert_eq!(
        output,
        "\
extend Foo {
    int32 x = 100;
    int32 z = 102;
}

extend Bar {
    repeated string y = 101;
}
"
    );
}

#[test]
fn enums_services_and_messages() {
    let output = generate(
        &[(
            "svc.proto",
            r#"
                syntax = "proto3";
                package root;

                message GetRequest {
                    string id = 1 [deprecated = true];
                }

                service Users {
                    option (api.version) = 2;
                    rpc Get(GetRequest) returns (GetRequest);
                    rpc Watch(stream GetRequest) returns (stream GetRequest) {
                        option deprecated = true;
                    }
                }

                enum Status {
                    option allow_alias = true;
                    UNKNOWN = 0;
                    ACTIVE = 1 [(label) = "on"];
                    ENABLED = 1;
                }
            "#,
        )],
        "",
    );

    similar_asserts::assert_eq!(
        output,
        "\
enum Status {
    option allow_alias = true;

    UNKNOWN = 0;
    ACTIVE = 1 [(label) = 'on'];
    ENABLED = 1;
}

service Users {
    option (api.version) = 2;

    rpc Get(GetRequest) returns (GetRequest);

    rpc Watch(stream GetRequest) returns (stream GetRequest) {
        option deprecated = true;
    }
}

message GetRequest {
    string id = 1 [deprecated = true];
}
"
    );
}

#[test]
fn message_contents_order() {
    let output = generate(
        &[(
            "root.proto",
            r#"
                syntax = "proto2";
                package root;
                message Outer {
                    option (my.opt) = "x";
                    extend Other { optional bool flag = 50; }
                    message Inner { optional int32 a = 1; }
                    enum Kind { KIND_A = 0; }
                    optional Inner inner = 1;
                    required Kind kind = 2 [default = KIND_A];
                }
            "#,
        )],
        "",
    );

    similar_asserts::assert_eq!(
        output,
        "\
message Outer {
    option (my.opt) = 'x';

    Inner inner = 1;
    required Kind kind = 2 [default = KIND_A];

    enum Kind {
        KIND_A = 0;
    }

    message Inner {
        int32 a = 1;
    }

    extend Other {
        bool flag = 50;
    }
}
"
    );
}

#[test]
fn template_without_trailing_newline() {
    let output = generate(&[("a.proto", "package root; message A {}")], "syntax = \"proto3\";");
    assert_eq!(output, "syntax = \"proto3\";\n\nmessage A {\n}\n");

    let output = generate(&[], "syntax = \"proto3\";\n");
    assert_eq!(output, "syntax = \"proto3\";\n\n");

    let output = generate(&[], "");
    assert_eq!(output, "");
}

#[test]
fn custom_extends_option_not_rendered() {
    let file = FileDescriptorProto {
        package: Some("root".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("A".to_owned()),
            options: Some(prost_types::MessageOptions {
                uninterpreted_option: vec![
                    UninterpretedOption {
                        string_value: Some(b"root.B".to_vec()),
                        ..option("acme.inherits", true)
                    },
                    UninterpretedOption {
                        identifier_value: Some("true".to_owned()),
                        ..option("deprecated", false)
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        }],
        ..Default::default()
    };
    let tree = NamespaceTree::build(vec![file], "root");

    let output = Generator::new(&tree)
        .extends_option("acme.inherits")
        .generate("");
    assert_eq!(output, "message A {\n    option deprecated = true;\n}\n");

    let output = Generator::new(&tree).generate("");
    assert_eq!(
        output,
        "message A {\n    option (acme.inherits) = 'root.B';\n    option deprecated = true;\n}\n"
    );
}

#[test]
fn balanced_braces() {
    let output = generate(
        &[
            (
                "a.proto",
                r#"
                    syntax = "proto3";
                    package root.x.y;
                    message A {
                        map<string, B> bs = 1;
                        message B { enum E { E_0 = 0; } }
                    }
                    service S { rpc M(A) returns (A); }
                "#,
            ),
            ("b.proto", "package root.x; enum F { F_0 = 0; }"),
        ],
        "",
    );

    let mut depth = 0i32;
    for line in output.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('}') {
            depth -= 1;
        }
        assert!(depth >= 0, "unbalanced output:\n{}", output);
        if !trimmed.is_empty() {
            assert_eq!(line.len() - trimmed.len(), depth as usize * 4, "{}", output);
        }
        if trimmed.ends_with('{') {
            depth += 1;
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn field_labels_and_defaults() {
    let scope: &[DescriptorProto] = &[];

    let field = scalar("name", 1, Type::String);
    assert_eq!(field_line(scope, &field), "string name = 1;");

    let field = FieldDescriptorProto {
        default_value: Some("it's".to_owned()),
        ..scalar("name", 1, Type::String)
    };
    assert_eq!(field_line(scope, &field), "string name = 1 [default = 'it\\'s'];");

    let field = FieldDescriptorProto {
        default_value: Some("-1.5".to_owned()),
        options: Some(FieldOptions {
            uninterpreted_option: vec![UninterpretedOption {
                identifier_value: Some("true".to_owned()),
                ..option("deprecated", false)
            }],
            ..Default::default()
        }),
        ..scalar("ratio", 4, Type::Double)
    };
    assert_eq!(
        field_line(scope, &field),
        "double ratio = 4 [default = -1.5, deprecated = true];"
    );

    let field = FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..scalar("ids", 2, Type::Fixed64)
    };
    assert_eq!(field_type(scope, &field), "repeated fixed64");

    let field = FieldDescriptorProto {
        proto3_optional: Some(true),
        ..scalar("count", 3, Type::Uint32)
    };
    assert_eq!(field_type(scope, &field), "optional uint32");

    let field = FieldDescriptorProto {
        label: Some(Label::Required as i32),
        r#type: None,
        type_name: Some(".pkg.Foo".to_owned()),
        ..scalar("foo", 5, Type::Message)
    };
    assert_eq!(field_type(scope, &field), "required .pkg.Foo");
}

#[test]
fn map_entry_requires_flag() {
    let entry = DescriptorProto {
        name: Some("TagsEntry".to_owned()),
        field: vec![
            scalar("key", 1, Type::String),
            scalar("value", 2, Type::Int32),
        ],
        ..Default::default()
    };
    let field = FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        r#type: None,
        type_name: Some("TagsEntry".to_owned()),
        ..scalar("tags", 1, Type::Message)
    };

    let scope = [entry.clone()];
    assert!(map_entry(&scope, &field).is_none());
    assert_eq!(field_type(&scope, &field), "repeated TagsEntry");

    let scope = [DescriptorProto {
        options: Some(prost_types::MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..entry
    }];
    assert_eq!(map_entry(&scope, &field).unwrap().name(), "TagsEntry");
    assert_eq!(field_type(&scope, &field), "map<string,int32>");
    assert_eq!(field_line(&scope, &field), "map<string,int32> tags = 1;");
}
