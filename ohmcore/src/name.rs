//! Short diagnostic names for parameters.

/// Spreadsheet-style name of a position: `A`..`Z`, `AA`, `AB`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortName(pub usize);

impl std::fmt::Display for ShortName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.0 + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        // ascii only
        f.write_str(std::str::from_utf8(&letters).unwrap_or("?"))
    }
}
