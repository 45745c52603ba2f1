//! Write-to-temp-then-rename helper and the shared JSON layout.
//!
//! A reader either sees the previous contents or the new ones, never a
//! truncated file.

use std::io::Write;

use cap_std::fs_utf8::Dir;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Renders `value` as JSON indented by four spaces, with a trailing newline.
pub(crate) fn render_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Replaces `file_name` inside `dir` with `contents`.
///
/// The data is flushed to a hidden sibling and synced before the rename.
pub(crate) fn write_atomic(dir: &Dir, file_name: &str, contents: &[u8]) -> std::io::Result<()> {
    let temp_name = format!(".{file_name}.tmp");
    {
        let mut file = dir.create(&temp_name)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    dir.rename(&temp_name, dir, file_name)
}
