use idea_core::parser::Parser;
use miette::Report;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_all_ok_idea_files() {
    let tests_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("ok");
    let entries = fs::read_dir(&tests_dir).expect("Failed to read tests/ok directory");

    let mut parsed = 0;
    for entry in entries {
        let entry = entry.expect("Failed to read directory entry");
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "idea") {
            println!("Parsing file: {:?}", path);
            let source = fs::read_to_string(&path)
                .unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));

            let name = path.to_string_lossy().to_string();
            let mut parser = Parser::new_with_name(&source, name);

            if let Err(err) = parser.parse_schema() {
                panic!("Failed to parse {:?}. Error: {:#?}", path, Report::new(err));
            }
            parsed += 1;
        }
    }
    assert!(parsed > 0, "no .idea fixtures found in {:?}", tests_dir);
}
