use std::io::Write;
use std::path::Path;

use dbexport::output::{open_sink, summary_text};

#[test]
fn summary_lists_rows_and_file() {
    let text = summary_text(42, Path::new("/tmp/export.csv"));
    assert_eq!(text, "rows_written: 42\nfile: /tmp/export.csv\n");
}

#[test]
fn file_sink_receives_written_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    {
        let mut sink = open_sink(Some(&path)).unwrap();
        sink.write_all(b"a,b\n").unwrap();
        sink.flush().unwrap();
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
}

#[test]
fn missing_parent_directory_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.csv");
    let err = match open_sink(Some(&path)) {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("parent directory does not exist"), "Got: {err}");
}
