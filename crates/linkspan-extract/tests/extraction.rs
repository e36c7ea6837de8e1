//! End-to-end extraction over real sources.

use std::fs;
use std::path::Path;

use linkspan_core::{FileRecordSet, ObjcRuntime, Platform, Record, SourceLanguage, TargetInfo};
use linkspan_extract::{
    ExtractError, ExtractionPipeline, Extractor, FileFilter, UnitInput, UnitOutcome,
};
use linkspan_parser::{CompileOptions, Frontend};
use pretty_assertions::assert_eq;

const LINUX: TargetInfo = TargetInfo::new(Platform::Linux, ObjcRuntime::Apple);

fn extract_source(path: &str, language: SourceLanguage, source: &str) -> FileRecordSet {
    let unit = Frontend::new(LINUX).parse_source(path, source, language, &CompileOptions::default());
    let filter = FileFilter::new([path]);
    let mut records = FileRecordSet::new();
    Extractor::new(&LINUX, &filter)
        .extract(&unit, &mut records)
        .expect("valid extents");
    records
}

fn names(records: &FileRecordSet, file: &str) -> Vec<String> {
    records
        .get(file)
        .unwrap_or_default()
        .iter()
        .map(|record| record.name.clone())
        .collect()
}

fn write(path: &Path, contents: &str) -> String {
    fs::write(path, contents).expect("write source");
    path.display().to_string()
}

#[test]
fn constructors_destructors_and_methods() {
    let records = extract_source(
        "/src/foo.cpp",
        SourceLanguage::Cxx,
        r"
struct Foo {
    Foo() {}
    ~Foo() {}
    void bar() {}
};
",
    );
    assert_eq!(
        names(&records, "/src/foo.cpp"),
        vec!["_ZN3FooC1Ev", "_ZN3FooD1Ev", "_ZN3Foo3barEv"]
    );
}

#[test]
fn ranges_cover_the_full_definition() {
    let records = extract_source(
        "/src/add.cpp",
        SourceLanguage::Cxx,
        "int add(int a, int b)\n{\n    return a + b;\n}\n\nint one() { return 1; }\n",
    );
    assert_eq!(
        records.get("/src/add.cpp"),
        Some(
            &[
                Record::new("_Z3addii", 1, 4).expect("range"),
                Record::new("_Z3onev", 6, 6).expect("range"),
            ][..]
        )
    );
    for (_, file_records) in records.iter() {
        for record in file_records {
            assert!(1 <= record.start && record.start <= record.end);
        }
    }
}

#[test]
fn c_linkage_gives_plain_identifiers() {
    let records = extract_source(
        "/src/api.cpp",
        SourceLanguage::Cxx,
        "extern \"C\" int api_call(int x) { return x; }\nint main() { return 0; }\n",
    );
    assert_eq!(names(&records, "/src/api.cpp"), vec!["api_call", "main"]);

    let records = extract_source(
        "/src/plain.c",
        SourceLanguage::C,
        "static int helper(void) { return 0; }\nint run(int n) { return n; }\n",
    );
    assert_eq!(names(&records, "/src/plain.c"), vec!["helper", "run"]);
}

#[test]
fn declarations_without_bodies_are_skipped() {
    let records = extract_source(
        "/src/decls.cpp",
        SourceLanguage::Cxx,
        r"
void proto();
struct Shape {
    Shape() = default;
    virtual double area() const = 0;
    Shape(const Shape&) = delete;
};
",
    );
    assert!(records.is_empty());
}

#[test]
fn each_definition_is_recorded_once() {
    let records = extract_source(
        "/src/once.cpp",
        SourceLanguage::Cxx,
        r"
namespace app {
struct Widget {
    int size() const;
};
int Widget::size() const { return 0; }
int helper() { return 1; }
}
",
    );
    assert_eq!(
        names(&records, "/src/once.cpp"),
        vec!["_ZNK3app6Widget4sizeEv", "_ZN3app6helperEv"]
    );
}

#[test]
fn objc_methods_and_their_blocks() {
    let records = extract_source(
        "/src/Foo.m",
        SourceLanguage::ObjC,
        "@implementation Foo\n- (void)doThing {\n}\n+ (void)setUp:(int)x {\n}\n@end\n",
    );
    assert_eq!(
        names(&records, "/src/Foo.m"),
        vec!["-[Foo doThing]", "+[Foo setUp:]"]
    );
}

#[test]
fn only_requested_files_get_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let header = dir.path().join("shape.h");
    write(&header, "inline int area() { return 0; }\n");
    let a = write(
        &dir.path().join("a.cpp"),
        "#include \"shape.h\"\nint a_fn() { return area(); }\n",
    );
    let b = write(&dir.path().join("b.cpp"), "int b_fn() { return 0; }\n");

    let inputs: Vec<UnitInput> = [&a, &b]
        .iter()
        .map(|path| UnitInput {
            path: (*path).clone(),
            options: CompileOptions::default(),
        })
        .collect();
    let pipeline = ExtractionPipeline::new(
        Frontend::new(LINUX),
        FileFilter::new([a.clone(), b.clone()]),
    );
    let report = pipeline.run(&inputs);

    assert_eq!(report.records.file_count(), 2);
    assert_eq!(names(&report.records, &a), vec!["_Z4a_fnv"]);
    assert_eq!(names(&report.records, &b), vec!["_Z4b_fnv"]);
    assert!(report.records.get(&header.display().to_string()).is_none());
    assert!(report.failures(true).is_empty());
}

#[test]
fn failed_units_do_not_stop_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = write(&dir.path().join("good.c"), "int ok(void) { return 0; }\n");
    let missing = dir.path().join("missing.c").display().to_string();
    let broken = write(&dir.path().join("broken.c"), "int bad( { }\nint fine(void) { return 1; }\n");

    let inputs: Vec<UnitInput> = [&missing, &good, &broken]
        .iter()
        .map(|path| UnitInput {
            path: (*path).clone(),
            options: CompileOptions::default(),
        })
        .collect();
    let pipeline = ExtractionPipeline::new(
        Frontend::new(LINUX),
        FileFilter::new([good.clone(), missing.clone(), broken.clone()]),
    );
    let report = pipeline.run(&inputs);

    assert_eq!(names(&report.records, &good), vec!["ok"]);
    assert!(matches!(report.outcomes[0], UnitOutcome::Failed { .. }));
    assert_eq!(report.outcomes[0].file(), missing);
    assert!(!report.outcomes[1].is_failure(true));
    assert!(report.outcomes[2].is_failure(true));
    assert!(!report.outcomes[2].is_failure(false));
    assert_eq!(report.failures(true).len(), 2);

    assert!(report.outcomes[1].syntax_error().is_none());
    let diagnostic = report.outcomes[2].syntax_error().expect("syntax errors reported");
    assert!(matches!(
        &diagnostic,
        ExtractError::SyntaxErrors { file, count } if *file == broken && *count > 0
    ));
    assert!(diagnostic.to_string().starts_with(&format!("{broken}: ")));
}

#[test]
fn header_syntax_errors_do_not_fail_the_unit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let include = dir.path().join("include");
    fs::create_dir_all(&include).expect("create include dir");
    write(&include.join("vendor.h"), "int broken( { }\nstruct { int x; \n");
    let main = write(
        &dir.path().join("main.cpp"),
        "#include <vendor.h>\nint answer() { return 42; }\n",
    );

    let options = CompileOptions {
        include_dirs: vec![include],
        ..CompileOptions::default()
    };
    let pipeline = ExtractionPipeline::new(Frontend::new(LINUX), FileFilter::new([main.clone()]));
    let report = pipeline.run(&[UnitInput {
        path: main.clone(),
        options,
    }]);

    assert_eq!(names(&report.records, &main), vec!["_Z6answerv"]);
    assert!(!report.outcomes[0].is_failure(true));
    assert!(report.outcomes[0].syntax_error().is_none());
}

#[test]
fn lambda_call_operators_are_recorded() {
    let records = extract_source(
        "/src/lambda.cpp",
        SourceLanguage::Cxx,
        "int g() {\n    auto f = [](int x) {\n        return x;\n    };\n    return f(1);\n}\n",
    );
    assert_eq!(
        records.get("/src/lambda.cpp"),
        Some(
            &[
                Record::new("_Z1gv", 1, 6).expect("range"),
                Record::new("_ZZ1gvENKUliE_clEi", 2, 4).expect("range"),
            ][..]
        )
    );
}

#[test]
fn lambdas_are_numbered_per_signature_and_nest() {
    let records = extract_source(
        "/src/lambdas.cpp",
        SourceLanguage::Cxx,
        r"
void run() {
    auto a = [](int x) { return x; };
    auto b = [](int y) { return y + 1; };
    auto c = [] { return 0; };
    auto d = [n = 1]() mutable { return [](int z) { return z; }(n++); };
}
",
    );
    assert_eq!(
        names(&records, "/src/lambdas.cpp"),
        vec![
            "_Z3runv",
            "_ZZ3runvENKUliE_clEi",
            "_ZZ3runvENKUliE0_clEi",
            "_ZZ3runvENKUlvE_clEv",
            "_ZZ3runvENUlvE0_clEv",
            "_ZZZ3runvENUlvE0_clEvENKUliE_clEi",
        ]
    );
}

#[test]
fn namespace_scope_lambda_is_recorded_without_a_name() {
    let records = extract_source(
        "/src/global.cpp",
        SourceLanguage::Cxx,
        "auto lam = [](int x) {\n    return x * 2;\n};\n",
    );
    assert_eq!(
        records.get("/src/global.cpp"),
        Some(&[Record::new("", 1, 3).expect("range")][..])
    );
}

#[test]
fn parallel_runs_match_sequential_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths: Vec<String> = (0..6)
        .map(|idx| {
            write(
                &dir.path().join(format!("unit{idx}.cpp")),
                &format!("namespace n{idx} {{ int f(int x) {{ return x; }} }}\nint g{idx}() {{ return 0; }}\n"),
            )
        })
        .collect();
    let inputs: Vec<UnitInput> = paths
        .iter()
        .map(|path| UnitInput {
            path: path.clone(),
            options: CompileOptions::default(),
        })
        .collect();
    let filter = FileFilter::new(paths.clone());

    let sequential = ExtractionPipeline::new(Frontend::new(LINUX), filter.clone()).run(&inputs);
    let parallel = ExtractionPipeline::new(Frontend::new(LINUX), filter)
        .with_jobs(4)
        .run(&inputs);

    assert_eq!(sequential.records, parallel.records);
    assert_eq!(
        sequential.records.to_json_pretty().expect("json"),
        parallel.records.to_json_pretty().expect("json")
    );
    assert_eq!(sequential.records.record_count(), 12);
}
