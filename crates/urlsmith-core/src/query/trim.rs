//! Trim: tombstone pairs whose key matches a literal or `*`-pattern.

use super::QueryStore;

impl QueryStore {
    /// Tombstones every pair whose key matches `pattern`.
    ///
    /// A trailing unescaped `*` makes the pattern a prefix match; a
    /// trailing `\*` matches a literal key ending in `*` (the backslash
    /// is removed before matching). Comparison is case-insensitive ASCII
    /// against the encoded key. The store counts as modified whether or
    /// not anything matched.
    pub fn trim(&mut self, pattern: &str) {
        let mut pat = pattern.to_string();
        let mut prefix = false;
        if pat.ends_with('*') {
            if pat.ends_with("\\*") {
                pat.truncate(pat.len() - 2);
                pat.push('*');
            } else {
                prefix = true;
                pat.truncate(pat.len() - 1);
            }
        }
        let pat = pat.as_bytes();

        for pair in self.pairs.iter_mut() {
            let key = pair.key_encoded().as_bytes();
            let hit = if prefix {
                key.len() >= pat.len() && key[..pat.len()].eq_ignore_ascii_case(pat)
            } else {
                key.eq_ignore_ascii_case(pat)
            };
            if hit {
                pair.tombstone();
            }
        }
        self.modified = true;
    }
}
