use dbexport::format_csv::ExportWriter;
use dbexport::options::{ExportOptions, LineTerminator};
use dbexport::value::{Column, ColumnKind};

fn make_column(name: &str, ordinal: usize) -> Column {
    Column::new(name, ordinal, ColumnKind::NullableText)
}

fn fields(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn write_all(opts: &ExportOptions, header: &[Column], rows: &[Vec<String>]) -> String {
    let mut writer = ExportWriter::new(Vec::new(), opts);
    if !header.is_empty() {
        writer.write_header(header).unwrap();
    }
    for row in rows {
        writer.write_row(row).unwrap();
    }
    String::from_utf8(writer.flush().unwrap()).unwrap()
}

/// Read `input` back with the csv crate's standard quoting rules.
fn parse_records(input: &str, delimiter: u8) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes())
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn basic_output_header_and_data_rows() {
    let output = write_all(
        &ExportOptions::default(),
        &[make_column("id", 0), make_column("name", 1), make_column("city", 2)],
        &[
            fields(&["1", "Alice", "Portland"]),
            fields(&["2", "Bob", "Seattle"]),
        ],
    );

    assert_eq!(output, "id,name,city\n1,Alice,Portland\n2,Bob,Seattle\n");
}

#[test]
fn crlf_line_terminators() {
    let opts = ExportOptions {
        terminator: LineTerminator::CrLf,
        ..Default::default()
    };
    let output = write_all(&opts, &[make_column("x", 0)], &[fields(&["1"])]);

    // Every record (including header) ends with \r\n
    let lines: Vec<&str> = output.split("\r\n").collect();
    assert_eq!(lines, vec!["x", "1", ""]);
    let without_crlf = output.replace("\r\n", "");
    assert!(!without_crlf.contains('\n'), "found bare LF outside CRLF");
}

#[test]
fn rfc4180_escaping_commas_quotes_newlines() {
    let output = write_all(
        &ExportOptions::default(),
        &[],
        &[
            fields(&["hello, world"]),
            fields(&["say \"hi\""]),
            fields(&["line1\nline2"]),
            fields(&["a,b\"c\nd"]),
            fields(&["cr\ronly"]),
        ],
    );

    let expected = "\"hello, world\"\n\
                    \"say \"\"hi\"\"\"\n\
                    \"line1\nline2\"\n\
                    \"a,b\"\"c\nd\"\n\
                    \"cr\ronly\"\n";
    assert_eq!(output, expected);
}

#[test]
fn tab_delimiter_quotes_embedded_tabs_only() {
    let opts = ExportOptions {
        delimiter: b'\t',
        ..Default::default()
    };
    let output = write_all(&opts, &[], &[fields(&["a,b", "c\td", "e"])]);
    assert_eq!(output, "a,b\t\"c\td\"\te\n");
}

#[test]
fn embedded_delimiter_round_trips() {
    for (delimiter, sample) in [(',', "x,y,,z"), (';', "1;2"), ('|', "|lead and trail|")] {
        let opts = ExportOptions {
            delimiter: delimiter as u8,
            ..Default::default()
        };
        let row = fields(&["plain", sample, "with \"quotes\" too"]);
        let output = write_all(&opts, &[], std::slice::from_ref(&row));

        let parsed = parse_records(&output, delimiter as u8);
        assert_eq!(parsed, vec![row], "delimiter {delimiter:?}");
    }
}

#[test]
fn column_names_with_special_characters_are_escaped() {
    let output = write_all(
        &ExportOptions::default(),
        &[
            make_column("normal", 0),
            make_column("has, comma", 1),
            make_column("has \"quote\"", 2),
        ],
        &[],
    );

    assert_eq!(output, "normal,\"has, comma\",\"has \"\"quote\"\"\"\n");
}

#[test]
fn rows_written_excludes_header() {
    let mut writer = ExportWriter::new(Vec::new(), &ExportOptions::default());
    writer.write_header(&[make_column("a", 0)]).unwrap();
    writer.write_row(&fields(&["1"])).unwrap();
    writer.write_row(&fields(&["2"])).unwrap();
    assert_eq!(writer.rows_written(), 2);
}

#[test]
fn nothing_reaches_sink_before_flush_for_small_output() {
    let mut writer = ExportWriter::new(Vec::new(), &ExportOptions::default());
    writer.write_row(&fields(&["1", "2"])).unwrap();
    let sink = writer.flush().unwrap();
    assert_eq!(sink, b"1,2\n");
}

#[test]
fn flush_surfaces_sink_errors() {
    struct FailingSink;

    impl std::io::Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut writer = ExportWriter::new(FailingSink, &ExportOptions::default());
    writer.write_row(&fields(&["buffered"])).unwrap();
    let err = match writer.flush() {
        Ok(_) => panic!("flush should fail"),
        Err(e) => e,
    };
    assert!(err.to_string().starts_with("write:"), "Got: {err}");
    assert!(err.to_string().contains("pipe closed"), "Got: {err}");
}

#[test]
fn multi_row_output_round_trips_through_csv_reader() {
    let opts = ExportOptions {
        terminator: LineTerminator::CrLf,
        ..Default::default()
    };
    let rows = vec![
        fields(&["1", "line1\nline2", "trailing space "]),
        fields(&["2", "", "\"quoted\""]),
        fields(&["3", "a,b", "cr\ronly"]),
    ];
    let output = write_all(&opts, &[], &rows);
    assert_eq!(parse_records(&output, b','), rows);
}

#[test]
fn single_empty_field_is_quoted_to_stay_a_record() {
    let output = write_all(
        &ExportOptions::default(),
        &[],
        &[fields(&[""]), fields(&["x"])],
    );
    assert_eq!(output, "\"\"\nx\n");
    assert_eq!(parse_records(&output, b','), vec![fields(&[""]), fields(&["x"])]);
}
