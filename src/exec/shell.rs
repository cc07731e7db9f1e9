//! POSIX shell quoting.

/// Quotes a string so a POSIX shell reads it back as one word.
///
/// Strings made only of safe characters are returned unchanged, so plain
/// paths like `out/mybin.linux-x86_64` stay readable.
pub fn quote(s: &str) -> String {
    shell_escape::unix::escape(s.into()).into_owned()
}
