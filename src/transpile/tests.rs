use std::fs;

use prost::Message;
use tempfile::TempDir;

use super::*;
use crate::file::File;

const TEMPLATE: &str = "syntax = \"proto3\";\n\npackage root;\n";

fn write(dir: &Path, name: &str, source: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "base.proto",
        r#"
            syntax = "proto3";
            package root;

            message Entity {
                option deprecated = false;
                string id = 1;
            }
        "#,
    );
    write(
        dir.path(),
        "users/user.proto",
        r#"
            syntax = "proto3";
            package root.users;

            message User {
                option (oneproto.extends) = "root.Entity";
                string name = 2;
                map<string, string> labels = 3;
            }
        "#,
    );
    write(
        dir.path(),
        "users/admin.proto",
        r#"
            syntax = "proto3";
            package root.users;

            message Admin {
                option (oneproto.extends) = "root.users.User";
                repeated string roles = 4;
            }
        "#,
    );
    dir
}

#[test]
fn merge_directory() {
    let dir = fixture();

    let output = Transpiler::new([dir.path()], "root")
        .template(TEMPLATE)
        .open_dir(dir.path())
        .unwrap()
        .generate()
        .unwrap();

    similar_asserts::assert_eq!(
        output,
        "\
syntax = \"proto3\";

package root;

message Entity {
    option deprecated = false;

    string id = 1;
}

message users {
    message Admin {
        string id = 1;
        string name = 2;
        map<string,string> labels = 3;
        repeated string roles = 4;
    }

    message User {
        string id = 1;
        string name = 2;
        map<string,string> labels = 3;
    }
}
"
    );
}

#[test]
fn inherit_options() {
    let dir = fixture();

    let output = Transpiler::new([dir.path()], "root")
        .inherit_options(true)
        .open_file("base.proto")
        .unwrap()
        .open_file("users/user.proto")
        .unwrap()
        .generate()
        .unwrap();

    similar_asserts::assert_eq!(
        output,
        "\
message Entity {
    option deprecated = false;

    string id = 1;
}

message users {
    message User {
        option deprecated = false;

        string id = 1;
        string name = 2;
        map<string,string> labels = 3;
    }
}
"
    );
}

#[test]
fn output_is_deterministic() {
    let dir = fixture();

    let mut transpiler = Transpiler::new([dir.path()], "root");
    transpiler.template(TEMPLATE).open_dir(dir.path()).unwrap();

    let first = transpiler.generate().unwrap();
    let second = transpiler.generate().unwrap();
    assert_eq!(first, second);

    let mut reversed = Transpiler::new([dir.path()], "root");
    reversed
        .template(TEMPLATE)
        .open_files(["users/user.proto", "users/admin.proto", "base.proto"])
        .unwrap();
    let reversed = reversed.generate().unwrap();
    assert_eq!(
        first.lines().filter(|line| line.contains(" = ")).count(),
        reversed.lines().filter(|line| line.contains(" = ")).count()
    );
}

#[test]
fn open_file_twice() {
    let dir = fixture();

    let mut transpiler = Transpiler::new([dir.path()], "root");
    transpiler
        .open_file("base.proto")
        .unwrap()
        .open_file("base.proto")
        .unwrap();
    assert_eq!(transpiler.files().len(), 1);
}

#[test]
fn missing_extends_target() {
    let dir = fixture();

    let err = Transpiler::new([dir.path()], "root")
        .open_file("users/user.proto")
        .unwrap()
        .generate()
        .unwrap_err();
    assert!(err.is_extends());
    assert_eq!(err.message(), Some("users.User"));
}

#[test]
fn file_not_found() {
    let dir = TempDir::new().unwrap();

    let err = Transpiler::new([dir.path()], "root")
        .open_file("missing.proto")
        .unwrap_err();
    assert!(err.is_file_not_found());
    assert_eq!(err.file(), Some("missing.proto"));
}

#[test]
fn multiple_includes() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(second.path(), "b.proto", "package root; message B {}");

    let output = transpile(["b.proto"], [first.path(), second.path()], "root", "").unwrap();
    assert_eq!(output, "message B {\n}\n");
}

#[test]
fn template_file() {
    let dir = fixture();
    write(dir.path(), "header.txt", TEMPLATE);

    let output = Transpiler::new([dir.path()], "root")
        .template_file(dir.path().join("header.txt"))
        .unwrap()
        .generate()
        .unwrap();
    assert_eq!(output, format!("{}\n", TEMPLATE));

    let err = Transpiler::new([dir.path()], "root")
        .template_file(dir.path().join("missing.txt"))
        .unwrap_err();
    assert!(err.is_io());
}

#[test]
fn custom_file_resolver() {
    struct Resolver;

    impl FileResolver for Resolver {
        fn open_file(&self, name: &str) -> Result<crate::file::File, Error> {
            match name {
                "a.proto" => File::from_source(name, "package root.a; message A {}"),
                _ => Err(Error::file_not_found(name)),
            }
        }
    }

    let output = Transpiler::with_file_resolver(Resolver, "root")
        .open_file("a.proto")
        .unwrap()
        .generate()
        .unwrap();
    assert_eq!(output, "message a {\n    message A {\n    }\n}\n");
}

#[test]
fn file_descriptor_set() {
    let file = File::from_source(
        "a.proto",
        "package root; message Base { optional int32 id = 1; }",
    )
    .unwrap()
    .into_file_descriptor_proto();
    let child = File::from_source(
        "b.proto",
        "package root; message Child { option (oneproto.extends) = 'root.Base'; }",
    )
    .unwrap()
    .into_file_descriptor_proto();

    let set = FileDescriptorSet {
        file: vec![file, child],
    };

    let mut transpiler = Transpiler::with_file_resolver(ChainFileResolver::new(), "root");
    transpiler
        .decode_file_descriptor_set(set.encode_to_vec().as_slice())
        .unwrap();
    assert_eq!(transpiler.files().len(), 2);

    let output = transpiler.generate().unwrap();
    assert_eq!(
        output,
        "message Base {\n    int32 id = 1;\n}\n\nmessage Child {\n    int32 id = 1;\n}\n"
    );

    let err = transpiler
        .decode_file_descriptor_set(&b"\xff\xff"[..])
        .unwrap_err();
    assert!(!err.is_parse());
}
