//! Localization file rewriting
//!
//! Lines mentioning a known name key get their trailing `^(...)` annotation
//! replaced; every other byte of the file is left as it was.

use crate::error::{Result, SyncError};
use crate::models::{Item, ItemPrice};
use std::fs::{File, OpenOptions, Permissions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Annotation delimiter of the localization format
const DELIMITER: char = '^';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub lines_total: usize,
    pub lines_rewritten: usize,
}

/// Rewrite every line that references a priced item's name key.
///
/// The first item (in `items` order) whose key occurs in a line wins. Items
/// without a price or with an empty key never match.
pub fn patch_text(text: &str, items: &[Item]) -> (String, PatchReport) {
    let priced: Vec<(&str, ItemPrice)> = items
        .iter()
        .filter(|item| !item.name_key.is_empty())
        .filter_map(|item| item.price().map(|price| (item.name_key.as_str(), price)))
        .collect();

    let mut output = String::with_capacity(text.len());
    let mut report = PatchReport::default();

    for line in text.split_inclusive('\n') {
        report.lines_total += 1;
        match priced.iter().find(|(key, _)| line.contains(key)) {
            Some((_, price)) => {
                let rewritten = rewrite_line(line, price);
                log::info!("Edited line: {}", rewritten.trim_end());
                output.push_str(&rewritten);
                report.lines_rewritten += 1;
            }
            None => output.push_str(line),
        }
    }

    (output, report)
}

/// Cut the line at the first delimiter, trim trailing whitespace and append the annotation
fn rewrite_line(line: &str, price: &ItemPrice) -> String {
    let terminator = if line.ends_with("\r\n") { "\r\n" } else { "\n" };
    let prefix = line.split(DELIMITER).next().unwrap_or_default().trim_end();
    format!("{}{}{}", prefix, price.annotation(), terminator)
}

/// Patch the file at `path` in place.
///
/// Symlinks are followed, so the file they point at is rewritten and the link
/// stays. The new content goes to a temporary file next to that target and is
/// renamed over it, so readers see either the old or the new file. When no
/// temporary file can be created there, the open file is overwritten instead.
pub fn patch_file(path: &Path, items: &[Item]) -> Result<PatchReport> {
    let target = std::fs::canonicalize(path).map_err(|e| SyncError::io(path, e))?;
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&target)
        .map_err(|e| SyncError::io(&target, e))?;

    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| SyncError::io(&target, e))?;
    let permissions = file
        .metadata()
        .map_err(|e| SyncError::io(&target, e))?
        .permissions();

    let (patched, report) = patch_text(&text, items);
    if report.lines_rewritten == 0 {
        log::info!("No lines of {} reference a known item", path.display());
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    write_patched(&mut file, &target, dir, &patched, permissions)?;

    log::info!(
        "Patched {}: {} of {} lines rewritten",
        path.display(),
        report.lines_rewritten,
        report.lines_total
    );
    Ok(report)
}

/// Replace `target` with `contents` through a temporary file in `dir`,
/// falling back to truncating and rewriting the already open `file`.
pub(crate) fn write_patched(
    file: &mut File,
    target: &Path,
    dir: &Path,
    contents: &str,
    permissions: Permissions,
) -> Result<()> {
    let mut tmp = match tempfile::NamedTempFile::new_in(dir) {
        Ok(tmp) => tmp,
        Err(e) => {
            log::warn!(
                "Cannot create a temporary file in {} ({}), overwriting {} directly",
                dir.display(),
                e,
                target.display()
            );
            return overwrite(file, contents).map_err(|e| SyncError::io(target, e));
        }
    };

    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SyncError::io(tmp.path(), e))?;
    std::fs::set_permissions(tmp.path(), permissions).map_err(|e| SyncError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| SyncError::io(target, e.error))?;
    Ok(())
}

fn overwrite(file: &mut File, contents: &str) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
#[path = "patcher_tests.rs"]
mod tests;
