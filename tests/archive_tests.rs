//! Tests for the archive reader
//!
//! These tests verify:
//! - Every contained file is handed out with its lines, in archive order
//! - Directory entries are skipped
//! - Missing paths and failed downloads fail with Fetch, non-zip bytes with ArchiveFormat
//! - Lines that are not UTF-8 are reported with file and line

mod common;

use std::fs;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use common::{buenos_aires_line, setup_temp_archive, zip_bytes};
use placetime::archive::{fetch, is_remote, open_source, ArchiveReader, LineSource};
use placetime::parser::Records;
use placetime::PlaceTimeError;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// =============================================================================
// Helper Functions
// =============================================================================

/// Drain a line source into (name, lines) pairs
fn collect_files<L: LineSource>(source: &mut L) -> Vec<(String, Vec<String>)> {
    let mut files = Vec::new();
    while let Some(file) = source.next_file() {
        let file = file.unwrap();
        let name = file.name().to_string();
        let lines = file.map(|l| l.unwrap()).collect();
        files.push((name, lines));
    }
    files
}

/// Serve a single HTTP response on a loopback port, returning its URL
fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/dump.zip", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        // The client may hang up early on error statuses
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(body);
    });

    (url, handle)
}

// =============================================================================
// Source Classification Tests
// =============================================================================

#[test]
fn test_is_remote() {
    assert!(is_remote("https://download.geonames.org/export/dump/cities15000.zip"));
    assert!(is_remote("http://localhost/dump.zip"));
    assert!(!is_remote("/tmp/dump.zip"));
    assert!(!is_remote("dump.zip"));
}

#[test]
fn test_missing_path_is_fetch_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.zip");

    let result = open_source(missing.to_str().unwrap());

    assert!(matches!(result, Err(PlaceTimeError::Fetch(_))));
}

#[test]
fn test_unreachable_url_is_fetch_error() {
    let result = open_source("http://127.0.0.1:1/dump.zip");

    assert!(matches!(result, Err(PlaceTimeError::Fetch(_))));
}

#[test]
fn test_http_error_status_is_fetch_error() {
    let (url, server) = serve_once("404 Not Found", b"no such dump");

    let result = fetch(&url);

    server.join().unwrap();
    match result {
        Err(PlaceTimeError::Fetch(msg)) => assert!(msg.contains("404")),
        other => panic!("Expected Fetch, got {:?}", other),
    }
}

#[test]
fn test_downloaded_body_is_returned() {
    let (url, server) = serve_once("200 OK", b"archive bytes");

    let body = fetch(&url).unwrap();

    server.join().unwrap();
    assert_eq!(&body[..], b"archive bytes");
}

#[test]
fn test_downloaded_non_zip_is_format_error() {
    let (url, server) = serve_once("200 OK", b"this is not a zip archive");

    let result = ArchiveReader::open(&url);

    server.join().unwrap();
    assert!(matches!(result, Err(PlaceTimeError::ArchiveFormat(_))));
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reads_single_file() {
    let (_temp, path) = setup_temp_archive(&[("cities.txt", "line one\nline two\n")]);

    let mut reader = ArchiveReader::open(path.to_str().unwrap()).unwrap();
    let files = collect_files(&mut reader);

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "cities.txt");
    assert_eq!(files[0].1, vec!["line one", "line two"]);
}

#[test]
fn test_reads_every_file_in_order() {
    let (_temp, path) = setup_temp_archive(&[
        ("a.txt", "a1\na2"),
        ("b.txt", "b1"),
        ("readme.txt", ""),
    ]);

    let mut reader = ArchiveReader::open(path.to_str().unwrap()).unwrap();
    assert_eq!(reader.remaining().collect::<Vec<_>>(), vec!["a.txt", "b.txt", "readme.txt"]);

    let files = collect_files(&mut reader);

    assert_eq!(files.len(), 3);
    assert_eq!(files[0].1, vec!["a1", "a2"]);
    assert_eq!(files[1].1, vec!["b1"]);
    assert!(files[2].1.is_empty());
    assert_eq!(reader.remaining().count(), 0);
    assert!(reader.next_file().is_none());
}

#[test]
fn test_skips_directories() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.add_directory("nested/", options).unwrap();
    zip.start_file("nested/cities.txt", options).unwrap();
    zip.write_all(b"x").unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let mut reader = ArchiveReader::new("memory", Cursor::new(bytes)).unwrap();
    let files = collect_files(&mut reader);

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "nested/cities.txt");
}

#[test]
fn test_in_memory_archive() {
    let bytes = zip_bytes(&[("cities.txt", "only line")]);

    let mut reader = ArchiveReader::new("memory", Cursor::new(bytes)).unwrap();

    assert_eq!(reader.origin(), "memory");
    let files = collect_files(&mut reader);
    assert_eq!(files[0].1, vec!["only line"]);
}

#[test]
fn test_partially_read_file_can_be_dropped() {
    let (_temp, path) = setup_temp_archive(&[("a.txt", "a1\na2\na3"), ("b.txt", "b1")]);
    let mut reader = ArchiveReader::open(path.to_str().unwrap()).unwrap();

    {
        let mut first = reader.next_file().unwrap().unwrap();
        assert_eq!(first.next().unwrap().unwrap(), "a1");
    }
    let mut second = reader.next_file().unwrap().unwrap();

    assert_eq!(second.name(), "b.txt");
    assert_eq!(second.next().unwrap().unwrap(), "b1");
}

#[test]
fn test_not_a_zip_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dump.zip");
    fs::write(&path, b"this is not a zip archive").unwrap();

    let result = ArchiveReader::open(path.to_str().unwrap());

    assert!(matches!(result, Err(PlaceTimeError::ArchiveFormat(_))));
}

#[test]
fn test_empty_archive_has_no_files() {
    let bytes = zip_bytes(&[]);

    let mut reader = ArchiveReader::new("memory", Cursor::new(bytes)).unwrap();

    assert!(reader.next_file().is_none());
}

#[test]
fn test_invalid_utf8_line_reports_position() {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("cities.txt", SimpleFileOptions::default()).unwrap();
    zip.write_all(format!("{}\n", buenos_aires_line()).as_bytes()).unwrap();
    zip.write_all(b"3451191\tBad \xff name\n").unwrap();
    let bytes = zip.finish().unwrap().into_inner();
    let mut reader = ArchiveReader::new("memory", Cursor::new(bytes)).unwrap();

    let (name, lines) = reader.next_file().unwrap().unwrap().into_parts();
    let mut records = Records::new(name, lines);

    assert!(records.next().unwrap().is_ok());
    match records.next().unwrap() {
        Err(PlaceTimeError::InvalidEncoding { file, line }) => {
            assert_eq!(file, "cities.txt");
            assert_eq!(line, 2);
        }
        other => panic!("Expected InvalidEncoding, got {:?}", other),
    }
}
