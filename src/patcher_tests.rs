//! Tests for localization file patching

use std::io::Write;

use tempfile::NamedTempFile;

use crate::error::SyncError;
use crate::models::{Item, ItemId, ItemPrice};
use crate::patcher::{patch_file, patch_text, write_patched};

fn priced_item(key: &str, average: u64) -> Item {
    let mut item = Item::new(ItemId::new(key), key);
    item.attach_price(ItemPrice::from_average(average));
    item
}

// ── patch_text ───────────────────────────────────────────────────────

#[test]
fn replaces_existing_annotation() {
    let (out, report) = patch_text("item.x1^(old)\n", &[priced_item("item.x1", 1000)]);
    assert_eq!(out, "item.x1^(§7 1000руб.)\n");
    assert_eq!(report.lines_rewritten, 1);
}

#[test]
fn unrelated_lines_are_untouched() {
    let text = "header = A  \nitem.x1=Болт^(§2 old)\n\tC trailing\t";
    let (out, report) = patch_text(text, &[priced_item("item.x1", 25_000)]);
    assert_eq!(
        out,
        "header = A  \nitem.x1=Болт^(§5 25000руб.)\n\tC trailing\t"
    );
    assert_eq!(report.lines_total, 3);
    assert_eq!(report.lines_rewritten, 1);
}

#[test]
fn line_without_delimiter_is_trimmed_and_annotated() {
    let (out, _) = patch_text("item.x1=Болт   \n", &[priced_item("item.x1", 90_000)]);
    assert_eq!(out, "item.x1=Болт^(§6 90000руб.)\n");
}

#[test]
fn cuts_at_first_delimiter() {
    let (out, _) = patch_text("item.x1=a ^(one)^(two)\n", &[priced_item("item.x1", 5_000)]);
    assert_eq!(out, "item.x1=a^(§2 5000руб.)\n");
}

#[test]
fn keeps_crlf_terminator() {
    let (out, _) = patch_text("A\r\nitem.x1^(x)\r\nC\r\n", &[priced_item("item.x1", 1)]);
    assert_eq!(out, "A\r\nitem.x1^(§7 1руб.)\r\nC\r\n");
}

#[test]
fn last_line_without_newline_gets_one() {
    let (out, _) = patch_text("A\nitem.x1^(x)", &[priced_item("item.x1", 1)]);
    assert_eq!(out, "A\nitem.x1^(§7 1руб.)\n");
}

#[test]
fn first_matching_item_wins() {
    let items = [
        priced_item("item.x1", 100),
        priced_item("item.x1.extra", 90_000),
    ];
    let (out, _) = patch_text("item.x1.extra^(x)\n", &items);
    assert_eq!(out, "item.x1.extra^(§7 100руб.)\n");
}

#[test]
fn one_item_may_rewrite_many_lines() {
    let (out, report) = patch_text(
        "item.x1.name^(a)\nother\nitem.x1.desc^(b)\n",
        &[priced_item("item.x1", 7_000)],
    );
    assert_eq!(
        out,
        "item.x1.name^(§2 7000руб.)\nother\nitem.x1.desc^(§2 7000руб.)\n"
    );
    assert_eq!(report.lines_rewritten, 2);
}

#[test]
fn unpriced_and_empty_key_items_never_match() {
    let unpriced = Item::new(ItemId::new("1"), "item.x1");
    let empty_key = priced_item("", 1000);
    let text = "item.x1^(x)\nanything\n";
    let (out, report) = patch_text(text, &[unpriced, empty_key]);
    assert_eq!(out, text);
    assert_eq!(report.lines_rewritten, 0);
}

#[test]
fn repatching_is_idempotent() {
    let items = [priced_item("item.x1", 12_345), priced_item("item.y2", 3)];
    let text = "# comment\nitem.x1 = Болт ^(§7 10руб.)\nitem.y2\r\ntail";
    let (first, _) = patch_text(text, &items);
    let (second, _) = patch_text(&first, &items);
    assert_eq!(first, second);
}

// ── patch_file ───────────────────────────────────────────────────────

#[test]
fn patch_file_rewrites_in_place() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "A\nitem.x1^(old)\nC\n").unwrap();

    let report = patch_file(file.path(), &[priced_item("item.x1", 1000)]).unwrap();

    assert_eq!(report.lines_rewritten, 1);
    let content = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(content, "A\nitem.x1^(§7 1000руб.)\nC\n");
}

#[test]
fn patch_file_twice_is_byte_identical() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "item.x1=Болт^(old)\nkeep me\n").unwrap();
    let items = [priced_item("item.x1", 80_000)];

    patch_file(file.path(), &items).unwrap();
    let first = std::fs::read(file.path()).unwrap();
    patch_file(file.path(), &items).unwrap();
    let second = std::fs::read(file.path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn patch_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("ru.lang");

    match patch_file(&missing, &[priced_item("item.x1", 1)]) {
        Err(SyncError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected Io error, got: {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn patch_file_writes_through_symlink() {
    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("ru.lang");
    let link = dir.path().join("current.lang");
    std::fs::write(&real, "item.x1^(old)\n").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    patch_file(&link, &[priced_item("item.x1", 1000)]).unwrap();

    let link_meta = std::fs::symlink_metadata(&link).unwrap();
    assert!(link_meta.file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), real);
    assert_eq!(
        std::fs::read_to_string(&real).unwrap(),
        "item.x1^(§7 1000руб.)\n"
    );
}

#[test]
fn write_falls_back_to_open_file_without_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("ru.lang");
    std::fs::write(&target, "item.x1^(a much longer old annotation)\ntail\n").unwrap();
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(&target)
        .unwrap();
    let permissions = file.metadata().unwrap().permissions();

    let unwritable = dir.path().join("missing-dir");
    write_patched(&mut file, &target, &unwritable, "short\n", permissions).unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "short\n");
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}
