//! Shortcut record parser
//!
//! `shortcuts.vdf` is a binary KeyValues file. Each field is a type tag,
//! a NUL-terminated name, then a payload; strings are NUL-terminated too.
//! Records carry no length prefix, so boundaries are found by scanning for
//! the `AppName` field that opens every shortcut.
//!
//! Parsing runs in two passes:
//! 1. Collect the byte offset of every `AppName` header
//! 2. Slice from each offset to the next (or end of buffer) and pull the
//!    name and exe out of that slice
//!
//! Only the fields needed for artwork are modelled. Everything else in the
//! slice is left alone.

use super::record::{decode_latin1, ShortcutRecord};
use crate::error::{MalformedReason, ParseError};

/// Type tag of string fields
const TYPE_STRING: u8 = 0x01;

/// Opens every shortcut entry; casing differs across Steam versions
const FIELD_APP_NAME: &[u8] = b"AppName";
const FIELD_EXE: &[u8] = b"Exe";
const FIELD_START_DIR: &[u8] = b"StartDir";

/// Name and exe of one shortcut, as found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawShortcut {
    pub display_name: String,
    pub executable_path: String,
    /// Offset of the record's `AppName` header in the buffer
    pub offset: usize,
}

impl RawShortcut {
    /// Attach the owning account and derive the app id
    pub fn into_record(self, owner_user_id: &str) -> ShortcutRecord {
        ShortcutRecord::new(self.display_name, self.executable_path, owner_user_id)
    }
}

/// Parse every shortcut in a store.
///
/// One entry per `AppName` header, in file order. A record missing its
/// `Exe` or `StartDir` field comes back as an error in its own slot and
/// does not affect its neighbours.
pub fn parse(data: &[u8]) -> Vec<Result<RawShortcut, ParseError>> {
    let boundaries = field_offsets(data, FIELD_APP_NAME);

    boundaries
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = boundaries.get(index + 1).copied().unwrap_or(data.len());
            parse_record(&data[start..end], index, start)
        })
        .collect()
}

/// Pull name and exe out of one record slice (starts at its `AppName` tag)
fn parse_record(slice: &[u8], index: usize, offset: usize) -> Result<RawShortcut, ParseError> {
    let malformed = |reason| ParseError::MalformedRecord {
        index,
        offset,
        reason,
    };

    let name_start = header_len(FIELD_APP_NAME);
    let exe_tag = find_field(&slice[name_start..], FIELD_EXE)
        .map(|pos| name_start + pos)
        .ok_or_else(|| malformed(MalformedReason::MissingExe))?;

    let exe_start = exe_tag + header_len(FIELD_EXE);
    let start_dir_tag = find_field(&slice[exe_start..], FIELD_START_DIR)
        .map(|pos| exe_start + pos)
        .ok_or_else(|| malformed(MalformedReason::MissingStartDir))?;

    let display_name = trim_trailing_nuls(&slice[name_start..exe_tag]);
    let executable_path = trim_trailing_nuls(&slice[exe_start..start_dir_tag]);
    if executable_path.is_empty() {
        return Err(malformed(MalformedReason::EmptyExe));
    }

    Ok(RawShortcut {
        display_name: decode_latin1(display_name),
        executable_path: decode_latin1(executable_path),
        offset,
    })
}

/// Tag byte + name + NUL terminator
fn header_len(name: &[u8]) -> usize {
    name.len() + 2
}

/// True when `window` is exactly a string-field header for `name`
fn is_field_header(window: &[u8], name: &[u8]) -> bool {
    window.len() == header_len(name)
        && window[0] == TYPE_STRING
        && window[window.len() - 1] == 0
        && window[1..window.len() - 1].eq_ignore_ascii_case(name)
}

/// Offset of the first header for `name` (at its tag byte)
fn find_field(data: &[u8], name: &[u8]) -> Option<usize> {
    data.windows(header_len(name))
        .position(|window| is_field_header(window, name))
}

/// Offsets of every header for `name`
fn field_offsets(data: &[u8], name: &[u8]) -> Vec<usize> {
    data.windows(header_len(name))
        .enumerate()
        .filter(|(_, window)| is_field_header(window, name))
        .map(|(i, _)| i)
        .collect()
}

fn trim_trailing_nuls(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., 0] = bytes {
        bytes = rest;
    }
    bytes
}
