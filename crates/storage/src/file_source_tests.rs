// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn lines_input(path: &str) -> InputSource {
    InputSource::File {
        path: PathBuf::from(path),
        format: FileFormat::Lines,
    }
}

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

#[tokio::test]
async fn lines_are_keyed_by_line_number() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "in.txt", "alpha\n\nbeta gamma\r\ndelta");
    let source = FileRecordSource::new().with_base_dir(dir.path());

    let batch = source
        .read_batch(&lines_input("in.txt"), None)
        .await
        .unwrap();
    assert_eq!(
        batch.records,
        vec![
            Record::new("0", "alpha"),
            Record::new("2", "beta gamma"),
            Record::new("3", "delta"),
        ]
    );
    assert!(batch.next.is_none());
}

#[tokio::test]
async fn batches_resume_from_cursor() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "in.txt", "a\nb\nc\nd\ne\n");
    let source = FileRecordSource::new()
        .with_base_dir(dir.path())
        .with_batch_lines(2);
    let input = lines_input("in.txt");

    let mut keys = vec![];
    let mut cursor = None;
    let mut batches = 0;
    loop {
        let batch = source.read_batch(&input, cursor.as_ref()).await.unwrap();
        batches += 1;
        keys.extend(batch.records.into_iter().map(|r| r.key));
        match batch.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(keys, vec!["0", "1", "2", "3", "4"]);
    assert_eq!(batches, 3);
}

#[tokio::test]
async fn key_value_lines_split_on_tab() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "kv.tsv", "user1\tclick\nuser2\tview\tlate\n");
    let input = InputSource::File {
        path: dir.path().join("kv.tsv"),
        format: FileFormat::KeyValue,
    };

    let batch = FileRecordSource::new().read_batch(&input, None).await.unwrap();
    assert_eq!(
        batch.records,
        vec![
            Record::new("user1", "click"),
            Record::new("user2", "view\tlate"),
        ]
    );
}

#[tokio::test]
async fn key_value_line_without_tab_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "kv.tsv", "ok\tyes\nbroken\n");
    let input = InputSource::File {
        path: dir.path().join("kv.tsv"),
        format: FileFormat::KeyValue,
    };

    let err = FileRecordSource::new()
        .read_batch(&input, None)
        .await
        .unwrap_err();
    match err {
        SourceError::Malformed { location, .. } => assert!(location.ends_with("kv.tsv:2")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileRecordSource::new().with_base_dir(dir.path());
    let err = source
        .read_batch(&lines_input("absent.txt"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn other_descriptors_are_unsupported() {
    let input = InputSource::Search {
        search_id: "s".into(),
        page_size: 10,
    };
    let err = FileRecordSource::new()
        .read_batch(&input, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Unsupported("search")));
}

#[tokio::test]
async fn garbage_cursor_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "in.txt", "a\n");
    let source = FileRecordSource::new().with_base_dir(dir.path());
    let cursor = Cursor("not-a-cursor".into());
    let err = source
        .read_batch(&lines_input("in.txt"), Some(&cursor))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::InvalidCursor(_)));
}
