use docfill::template::{DocxPackage, Template, TemplateDocument};
use docfill::{
    DocfillError, ErrorKind, GenerationRequest, PlaceholderMap, TemplateKind, extract_placeholders, substitute,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_text_template(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

fn create_docx_template(dir: &Path, filename: &str, paragraphs: &[&str]) -> PathBuf {
    let file_path = dir.join(filename);
    TemplateDocument::Rich(DocxPackage::from_paragraphs(paragraphs).unwrap())
        .save(&file_path, false)
        .unwrap();
    file_path
}

fn paragraphs_of(path: &Path) -> Vec<String> {
    Template::open(path).unwrap().load().unwrap().blocks().to_vec()
}

fn fill_all(mut map: PlaceholderMap, value: &str) -> PlaceholderMap {
    let names: Vec<String> = map.names().map(String::from).collect();
    for name in names {
        let filled = format!("{}-{}", value, name);
        map.insert(name, filled);
    }
    map
}

#[test]
fn test_extract_placeholders_txt() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(
        temp_dir.path(),
        "test-template.txt",
        "This is a %placeholder1% and %placeholder2% template.",
    );

    let placeholders = extract_placeholders(&template, "%").unwrap();
    assert_eq!(placeholders.len(), 2);
    assert!(placeholders.contains("placeholder1"));
    assert!(placeholders.contains("placeholder2"));
}

#[test]
fn test_extract_placeholders_docx() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_docx_template(
        temp_dir.path(),
        "test-template.docx",
        &["This is a %placeholder1% and %placeholder2% template."],
    );

    let placeholders = extract_placeholders(&template, "%").unwrap();
    assert_eq!(placeholders.len(), 2);
    assert!(placeholders.contains("placeholder1"));
    assert!(placeholders.contains("placeholder2"));
}

#[test]
fn test_round_trip_txt_leaves_no_tokens() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(
        temp_dir.path(),
        "letter.txt",
        "Dear %Manager%,\n\nI would love to join %Company% as a %Role%.\n%Company% is great.\n\n%date%\n",
    );

    let extracted = extract_placeholders(&template, "%").unwrap();
    assert_eq!(extracted.names().collect::<Vec<_>>(), vec!["Manager", "Company", "Role", "date"]);

    let output = temp_dir.path().join("letter-out.txt");
    let request = GenerationRequest::new(&template, &output).with_placeholders(fill_all(extracted, "v"));
    let report = substitute(&request).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "Dear v-Manager,\n\nI would love to join v-Company as a v-Role.\nv-Company is great.\n\nv-date\n"
    );
    assert_eq!(report.kind, TemplateKind::PlainText);
    assert_eq!(report.blocks, 6);
    assert_eq!(report.replacements.get("Company"), Some(&2));
    assert_eq!(report.total_replacements(), 5);
    assert!(extract_placeholders(&output, "%").unwrap().is_empty());
}

#[test]
fn test_round_trip_docx_keeps_paragraph_count() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_docx_template(
        temp_dir.path(),
        "letter.docx",
        &["Dear %Manager%,", "", "Welcome to %Company% & friends.", "%Company%"],
    );

    let extracted = extract_placeholders(&template, "%").unwrap();
    assert_eq!(extracted.len(), 2);

    let output = temp_dir.path().join("letter-out.docx");
    let request = GenerationRequest::new(&template, &output).with_placeholders(fill_all(extracted, "<x>"));
    let report = substitute(&request).unwrap();

    assert_eq!(report.kind, TemplateKind::RichDocument);
    assert_eq!(report.blocks, 4);
    assert_eq!(
        paragraphs_of(&output),
        vec![
            "Dear <x>-Manager,".to_string(),
            "".to_string(),
            "Welcome to <x>-Company & friends.".to_string(),
            "<x>-Company".to_string(),
        ]
    );
}

#[test]
fn test_docx_placeholder_split_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("split.docx");
    TemplateDocument::Rich(
        DocxPackage::from_runs(&[vec!["Hello ", "%Fir", "st", "Name%", "!"]]).unwrap(),
    )
    .save(&template, false)
    .unwrap();

    let extracted = extract_placeholders(&template, "%").unwrap();
    assert!(extracted.contains("FirstName"));

    let output = temp_dir.path().join("split-out.docx");
    let mut map = PlaceholderMap::new();
    map.insert("FirstName", "Grace");
    substitute(&GenerationRequest::new(&template, &output).with_placeholders(map)).unwrap();

    assert_eq!(paragraphs_of(&output), vec!["Hello Grace!".to_string()]);
}

#[test]
fn test_docx_address_block_keeps_breaks_and_tabs() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_docx_template(
        temp_dir.path(),
        "address.docx",
        &["%Company%\n%Street%", "Attn:\t%Name%"],
    );

    let output = temp_dir.path().join("address-out.docx");
    let map: PlaceholderMap = [("Company", "Acme"), ("Street", "1 Main St"), ("Name", "Ada")]
        .into_iter()
        .collect();
    substitute(&GenerationRequest::new(&template, &output).with_placeholders(map)).unwrap();

    assert_eq!(
        paragraphs_of(&output),
        vec!["Acme\n1 Main St".to_string(), "Attn:\tAda".to_string()]
    );
}

#[test]
fn test_template_without_bookend_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let content = "No placeholders here.\nJust 100 percent text.\n";
    let template = create_text_template(temp_dir.path(), "plain.txt", content);

    let extracted = extract_placeholders(&template, "%").unwrap();
    assert!(extracted.is_empty());

    let output = temp_dir.path().join("plain-out.txt");
    let report = substitute(&GenerationRequest::new(&template, &output).with_placeholders(extracted)).unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), content);
    assert_eq!(report.total_replacements(), 0);
}

#[test]
fn test_mapped_key_missing_from_template_is_unmatched() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(temp_dir.path(), "letter.txt", "Hello %Name%!\n");
    let output = temp_dir.path().join("letter-out.txt");

    let map: PlaceholderMap = [("Name", "Alice"), ("City", "Paris")].into_iter().collect();
    let err = substitute(&GenerationRequest::new(&template, &output).with_placeholders(map)).unwrap_err();

    match &err {
        DocfillError::UnmatchedPlaceholders(keys) => assert_eq!(keys, &vec!["City".to_string()]),
        other => panic!("expected UnmatchedPlaceholders, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::UnmatchedPlaceholders);

    // The output is written before validation and is not rolled back.
    assert_eq!(fs::read_to_string(&output).unwrap(), "Hello Alice!\n");
}

#[test]
fn test_whitespace_mismatched_key_is_unmatched() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(temp_dir.path(), "letter.txt", "Hi % First Name %\n");

    let extracted = extract_placeholders(&template, "%").unwrap();
    assert_eq!(extracted.names().collect::<Vec<_>>(), vec!["First Name"]);

    // The trimmed key does not reproduce the padded token, so it has no effect.
    let output = temp_dir.path().join("out.txt");
    let err = substitute(&GenerationRequest::new(&template, &output).with_placeholders(fill_all(extracted, "v")))
        .unwrap_err();
    assert!(matches!(err, DocfillError::UnmatchedPlaceholders(ref keys) if keys == &vec!["First Name".to_string()]));
    assert_eq!(fs::read_to_string(&output).unwrap(), "Hi % First Name %\n");
}

#[test]
fn test_existing_output_is_not_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(temp_dir.path(), "letter.txt", "Hello %Name%\n");
    let output = create_text_template(temp_dir.path(), "existing.txt", "precious contents");

    let map: PlaceholderMap = [("Name", "Alice")].into_iter().collect();
    let request = GenerationRequest::new(&template, &output).with_placeholders(map);

    let err = substitute(&request).unwrap_err();
    assert!(matches!(err, DocfillError::OutputExists(_)));
    assert_eq!(fs::read_to_string(&output).unwrap(), "precious contents");

    substitute(&request.with_overwrite(true)).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "Hello Alice\n");
}

#[test]
fn test_pdf_template_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(temp_dir.path(), "letter.pdf", "%Name%");
    let output = temp_dir.path().join("out.pdf");

    let err = extract_placeholders(&template, "%").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);

    let map: PlaceholderMap = [("Name", "Alice")].into_iter().collect();
    let err = substitute(&GenerationRequest::new(&template, &output).with_placeholders(map)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(!output.exists());
}

#[test]
fn test_missing_template_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("missing.txt");

    let err = extract_placeholders(&template, "%").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TemplateNotFound);

    let err = substitute(&GenerationRequest::new(&template, temp_dir.path().join("out.txt"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
}

#[test]
fn test_legacy_binary_doc_is_io_failure() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("old.doc");
    fs::write(&template, b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1 not a zip").unwrap();

    let err = extract_placeholders(&template, "%").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

#[test]
fn test_custom_bookend() {
    let temp_dir = TempDir::new().unwrap();
    let template = create_text_template(temp_dir.path(), "letter.txt", "Save 50% with {{Code{{ today\n");

    let extracted = extract_placeholders(&template, "{{").unwrap();
    assert_eq!(extracted.names().collect::<Vec<_>>(), vec!["Code"]);

    let output = temp_dir.path().join("out.txt");
    let request = GenerationRequest::new(&template, &output)
        .with_bookend("{{")
        .with_placeholders([("Code", "SPRING")].into_iter().collect());
    substitute(&request).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "Save 50% with SPRING today\n");
}
