use crate::security::PathSanitizer;

#[test]
fn test_plain_file_name() {
    let result = PathSanitizer::sanitize("report.pdf");
    assert_eq!(result.unwrap(), "report.pdf");
}

#[test]
fn test_directories_are_stripped() {
    let result = PathSanitizer::sanitize("uploads/2024/report.pdf");
    assert_eq!(result.unwrap(), "report.pdf");
}

#[test]
fn test_windows_style_paths_normalized() {
    let result = PathSanitizer::sanitize("Documents\\notes\\minutes.docx");
    assert_eq!(result.unwrap(), "minutes.docx");
}

#[test]
fn test_hidden_files_allowed_by_default() {
    let result = PathSanitizer::sanitize(".notes.md");
    assert_eq!(result.unwrap(), ".notes.md");
}

#[test]
fn test_hidden_files_rejected_when_disabled() {
    let result = PathSanitizer::sanitize_with_options(".env", false);
    assert!(result.unwrap_err().to_string().contains("Hidden files"));
}

#[test]
fn test_reject_parent_directory_traversal() {
    let result = PathSanitizer::sanitize("../etc/passwd");
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Parent directory traversal"));
}

#[test]
fn test_reject_parent_in_middle() {
    let result = PathSanitizer::sanitize("docs/..\\..\\secret.txt");
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Parent directory traversal"));
}

#[test]
fn test_reject_absolute_unix_path() {
    let result = PathSanitizer::sanitize("/etc/passwd");
    assert!(result.unwrap_err().to_string().contains("Absolute path"));
}

#[test]
fn test_reject_absolute_windows_path() {
    let result = PathSanitizer::sanitize("C:\\Users\\me\\file.txt");
    assert!(result.unwrap_err().to_string().contains("Absolute path"));
}

#[test]
fn test_reject_empty_name() {
    let result = PathSanitizer::sanitize("   ");
    assert!(result.unwrap_err().to_string().contains("Empty file name"));
}

#[test]
fn test_reject_only_current_dir() {
    let result = PathSanitizer::sanitize("./.");
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("No valid components"));
}

#[test]
fn test_reject_control_characters() {
    let result = PathSanitizer::sanitize("bad\nname.txt");
    assert!(result.unwrap_err().to_string().contains("Control characters"));
}

#[test]
fn test_name_with_spaces_and_unicode() {
    assert_eq!(
        PathSanitizer::sanitize("My Documents/年度 报告.pdf").unwrap(),
        "年度 报告.pdf"
    );
}
