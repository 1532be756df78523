//! Replace: overwrite the first pair matching a key, dedupe the rest.

use super::{QueryPair, QueryStore};
use crate::diag;

impl QueryStore {
    /// Replaces the first pair whose encoded form starts with the key of
    /// `spec` (`key[=value]`), tombstoning any further matches so exactly
    /// one pair per key survives. Without a match, `force_append` appends
    /// `spec` as a new pair instead.
    pub fn replace(&mut self, spec: &str, force_append: bool) {
        let key = match spec.find('=') {
            Some(i) => &spec[..i],
            None => spec,
        };
        let key_bytes = key.as_bytes();
        let json_mode = self.json_mode;
        let quiet = self.quiet;

        let mut replaced = false;
        for pair in self.pairs.iter_mut() {
            let enc = pair.encoded.as_bytes();
            if enc.len() < key_bytes.len() || &enc[..key_bytes.len()] != key_bytes {
                continue;
            }
            if replaced {
                pair.tombstone();
                continue;
            }
            let (new_pair, _) = QueryPair::build(spec, json_mode, quiet);
            *pair = new_pair;
            replaced = true;
        }

        if !replaced && force_append {
            diag::note(quiet, &format!("key '{key}' not in url, appending to query"));
            self.add_pair(spec);
        }
        self.modified = true;
    }
}
