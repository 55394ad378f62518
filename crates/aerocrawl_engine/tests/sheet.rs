use std::fs;

use aerocrawl_engine::{CsvBook, SheetError, SheetStore};
use tempfile::TempDir;

fn columns() -> Vec<String> {
    ["Region", "Name", "URL"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn row(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("out");
    assert!(!dir.exists());
    CsvBook::open(&dir).unwrap();
    assert!(dir.is_dir());
}

#[test]
fn open_fails_on_non_directory_path() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = CsvBook::open(&file_path).unwrap_err();
    assert!(matches!(err, SheetError::OutputDir(_)));
}

#[test]
fn appends_land_in_their_section_in_order() {
    let temp = TempDir::new().unwrap();
    let mut book = CsvBook::open(temp.path()).unwrap();

    book.ensure_section("US", &columns()).unwrap();
    book.ensure_section("FR", &columns()).unwrap();
    book.append_row("US", row(&["Springfield", "Abraham Field", "u1"]))
        .unwrap();
    book.append_row("FR", row(&["Paris", "Le Bourget", "f1"]))
        .unwrap();
    book.append_row("US", row(&["Portland", "Hillsboro", "u2"]))
        .unwrap();
    book.save().unwrap();

    let us = fs::read_to_string(temp.path().join("US.csv")).unwrap();
    assert_eq!(
        us,
        "Region,Name,URL\nSpringfield,Abraham Field,u1\nPortland,Hillsboro,u2\n"
    );
    let fr = fs::read_to_string(temp.path().join("FR.csv")).unwrap();
    assert_eq!(fr, "Region,Name,URL\nParis,Le Bourget,f1\n");
}

#[test]
fn append_to_unknown_section_is_an_error() {
    let temp = TempDir::new().unwrap();
    let mut book = CsvBook::open(temp.path()).unwrap();
    let err = book.append_row("NOPE", row(&["a", "b", "c"])).unwrap_err();
    assert!(matches!(err, SheetError::NoSuchSection(name) if name == "NOPE"));
}

#[test]
fn reopening_keeps_rows_and_does_not_duplicate_headers() {
    let temp = TempDir::new().unwrap();

    let mut book = CsvBook::open(temp.path()).unwrap();
    book.ensure_section("US", &columns()).unwrap();
    book.append_row("US", row(&["Springfield", "Abraham Field", "u1"]))
        .unwrap();
    book.save().unwrap();

    // Second run against the same directory continues appending.
    let mut book = CsvBook::open(temp.path()).unwrap();
    book.ensure_section("US", &columns()).unwrap();
    book.append_row("US", row(&["Portland", "Hillsboro", "u2"]))
        .unwrap();
    book.save().unwrap();

    let us = fs::read_to_string(temp.path().join("US.csv")).unwrap();
    assert_eq!(
        us,
        "Region,Name,URL\nSpringfield,Abraham Field,u1\nPortland,Hillsboro,u2\n"
    );
}

#[test]
fn quoted_values_survive_a_save_and_reload() {
    let temp = TempDir::new().unwrap();

    let mut book = CsvBook::open(temp.path()).unwrap();
    book.ensure_section("US", &columns()).unwrap();
    book.append_row("US", row(&["a,b", "say \"hi\"", "line\nbreak"]))
        .unwrap();
    book.save().unwrap();

    let book = CsvBook::open(temp.path()).unwrap();
    let rows = book.section_rows("US").unwrap();
    assert_eq!(rows, [row(&["a,b", "say \"hi\"", "line\nbreak"])]);
}
