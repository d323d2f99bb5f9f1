use pretty_assertions::assert_eq;

use super::super::*;

#[test]
fn test_include_replaces_directive_with_preprocessed_content() {
    let mut loader = MemoryLoader::new();
    loader.insert("lib.h", "#define PI 3\nfloat p;");

    let unit = preprocess(
        SourceFile::embedded("#include \"lib.h\"\nPI"),
        &mut loader,
    );

    // Definitions leak out of the include into the rest of the file.
    assert_eq!(unit.code, "//#define PI 3\nfloat p;\n 3 ");

    let replacement = unit.chunks[0].replacement.as_ref().unwrap();
    match &replacement.construct.kind {
        ConstructKind::Directive(DirectiveKind::Include { path, unit: sub }) => {
            assert_eq!(path, "lib.h");
            assert_eq!(sub.file.uri, "lib.h");
            assert_eq!(sub.code, "//#define PI 3\nfloat p;");
        }
        other => panic!("expected an include directive, got {other:?}"),
    }
}

#[test]
fn test_definitions_flow_into_includes() {
    let mut loader = MemoryLoader::new();
    loader.insert("use.h", "N");

    let unit = preprocess(
        SourceFile::embedded("#define N 5\n#include \"use.h\""),
        &mut loader,
    );

    assert_eq!(unit.code, "//#define N 5\n 5 ");
}

#[test]
fn test_loader_failure_is_recovered() {
    let unit = preprocess(
        SourceFile::embedded("#include \"missing.h\"\nafter"),
        &mut NullLoader,
    );

    assert_eq!(unit.diagnostics.len(), 1);
    assert_eq!(unit.diagnostics[0].id, DiagnosticId::IncludePath);
    // Scanning continued past the failed include.
    assert_eq!(unit.code, "//#include \"missing.h\"\nafter");
}

#[test]
fn test_include_depth_guard() {
    let mut loader = MemoryLoader::new();
    loader.insert("self.h", "#include \"self.h\"");

    let mut macros = MacroTable::new();
    let unit = preprocess_with(
        SourceFile::embedded("#include \"self.h\""),
        &mut macros,
        &mut loader,
        3,
    );

    assert_eq!(unit.diagnostics.len(), 1);
    let diagnostic = &unit.diagnostics[0];
    assert_eq!(diagnostic.id, DiagnosticId::IncludeDeep);

    // Exactly 3 nested attempts before the guard fired.
    let mut hops = 0;
    let mut current = diagnostic;
    while let Some(cause) = current.cause.as_deref() {
        hops += 1;
        current = cause;
    }
    assert_eq!(hops, 3);
    assert_eq!(current.id, DiagnosticId::IncludeDeep);
}

#[test]
fn test_nested_diagnostics_chain_to_their_origin() {
    let mut loader = MemoryLoader::new();
    loader.insert("bad.h", "#define defined 1");

    let unit = preprocess(SourceFile::embedded("#include \"bad.h\""), &mut loader);

    assert_eq!(unit.diagnostics.len(), 1);
    let diagnostic = &unit.diagnostics[0];
    assert_eq!(diagnostic.id, DiagnosticId::DefinedMisnomer);
    assert!(diagnostic.message.contains("from included file \"bad.h\""));

    let origin = diagnostic.origin();
    assert_eq!(origin.uri, "bad.h");
    assert_eq!(origin.id, DiagnosticId::DefinedMisnomer);
}

#[test]
fn test_sourcemap_recurses_into_includes() {
    let mut loader = MemoryLoader::new();
    loader.insert("i.h", "hello");

    let unit = preprocess(
        SourceFile::embedded("A\n#include \"i.h\"\nB"),
        &mut loader,
    );

    assert_eq!(unit.code, "A\nhello\nB");

    // Offset 4 sits inside the included text.
    let mapped = unit.sourcemap(4).unwrap();
    assert_eq!(mapped.chunk_index, 1);
    // The outer mapping points at the include path literal.
    assert_eq!(mapped.input_offset, 11);
    assert_eq!(mapped.input_length, 5);

    let original = mapped.original.as_deref().unwrap();
    assert_eq!(original.unit.file.uri, "i.h");
    assert_eq!(original.input_offset, 2);
    assert_eq!(original.input_length, 0);
    assert!(original.original.is_none());
}

#[test]
fn test_include_depth_zero_refuses_immediately() {
    let mut loader = MemoryLoader::new();
    loader.insert("a.h", "ok");

    let mut macros = MacroTable::new();
    let unit = preprocess_with(
        SourceFile::embedded("#include \"a.h\""),
        &mut macros,
        &mut loader,
        0,
    );

    assert_eq!(unit.diagnostics.len(), 1);
    assert_eq!(unit.diagnostics[0].id, DiagnosticId::IncludeDeep);
    assert_eq!(unit.code, "//#include \"a.h\"");
}
