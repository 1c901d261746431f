use super::*;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_upload_sanitizes_name() {
    let source = Source::upload("C-drive/uploads/Report.PDF", b"%PDF".to_vec()).unwrap();
    assert_eq!(source.name(), "Report.PDF");
    assert_eq!(source.bytes(), b"%PDF");
    assert_eq!(source.url(), None);
}

#[test]
fn test_upload_rejects_traversal() {
    let err = Source::upload("../../etc/passwd", vec![]).unwrap_err();
    assert!(matches!(err, SourceError::InvalidName(_)));
}

#[test]
fn test_fetched_page_is_markdown() {
    let source = Source::fetched("https://example.com", "# Example");
    assert_eq!(source.name(), FETCHED_PAGE_NAME);
    assert_eq!(source.bytes(), b"# Example");
    assert_eq!(source.url(), Some("https://example.com"));
}

#[test]
fn test_from_path_reads_file() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"local notes").unwrap();

    let source = Source::from_path(file.path()).unwrap();
    assert!(source.name().ends_with(".txt"));
    assert_eq!(source.bytes(), b"local notes");
}

#[test]
fn test_from_path_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Source::from_path(&dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, SourceError::Read { .. }));
}

#[test]
fn test_request_url_appends_target() {
    let fetcher = PageFetcher::new("https://reader.example/").unwrap();
    assert_eq!(
        fetcher.request_url(" https://example.com/page ").unwrap(),
        "https://reader.example/https://example.com/page"
    );
}

#[test]
fn test_request_url_rejects_empty() {
    let fetcher = PageFetcher::new(DEFAULT_FETCH_ENDPOINT).unwrap();
    assert!(matches!(fetcher.request_url("  "), Err(FetchError::EmptyUrl)));
}

#[test]
fn test_fetch_unreachable_endpoint() {
    // Nothing listens on port 9 locally
    let fetcher =
        PageFetcher::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = fetcher.fetch("https://example.com").unwrap_err();
    assert!(matches!(err, FetchError::RequestFailed(_)));
}

#[test]
#[ignore = "requires network access"]
fn test_fetch_live_page() {
    let fetcher = PageFetcher::new(DEFAULT_FETCH_ENDPOINT).unwrap();
    let text = fetcher.fetch("https://example.com").unwrap();
    assert!(text.contains("Example Domain"));
}
