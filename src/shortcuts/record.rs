//! Shared data structures for shortcut records
//!
//! The shortcuts store is read one byte per character (Latin-1), so every
//! string here maps back to the exact bytes Steam wrote.

use super::appid;

/// A single non-Steam shortcut owned by one Steam account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutRecord {
    /// Title shown in the library (may be empty)
    pub display_name: String,
    /// Launch target, usually quoted (e.g. `"C:\Games\foo.exe"`)
    pub executable_path: String,
    /// Numeric account directory under `userdata/`
    pub owner_user_id: String,
    /// Derived from name and exe, never parsed
    pub app_id: u64,
}

impl ShortcutRecord {
    pub fn new(
        display_name: impl Into<String>,
        executable_path: impl Into<String>,
        owner_user_id: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        let executable_path = executable_path.into();
        let app_id = appid::derive_app_id(&display_name, &executable_path);

        Self {
            display_name,
            executable_path,
            owner_user_id: owner_user_id.into(),
            app_id,
        }
    }

    /// The app id as Steam writes it in folder and file names
    pub fn app_id_string(&self) -> String {
        self.app_id.to_string()
    }

    /// Title to send to lookup services.
    ///
    /// Steam stores names as UTF-8, but the parser decodes one byte per
    /// character. Re-reading the original bytes as UTF-8 turns `CafÃ©` back
    /// into `Café` for search purposes without touching the hashed form.
    pub fn search_title(&self) -> String {
        readable(&self.display_name).trim().to_string()
    }
}

/// Re-read single-byte decoded text as UTF-8 for display
pub fn readable(text: &str) -> String {
    String::from_utf8_lossy(&encode_latin1(text)).into_owned()
}

/// Decode bytes one-to-one into chars (U+0000..=U+00FF)
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode_latin1`].
///
/// Chars above U+00FF cannot come out of the parser; if a caller passes one
/// anyway it is written as its UTF-8 bytes.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) => out.push(b),
            Err(_) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out
}
