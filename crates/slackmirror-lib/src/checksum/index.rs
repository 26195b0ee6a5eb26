use crate::manifest::normalize_location;
use crate::verification::ContentDigest;
use std::collections::HashMap;

/// Reference digests keyed by store-relative path (`slackware64/a/a-1.0.tgz`).
#[derive(Clone, Debug, Default)]
pub struct ChecksumIndex {
    digests: HashMap<String, ContentDigest>,
}

impl ChecksumIndex {
    /// Parses a `CHECKSUMS.md5` style listing of `<hex>  ./<path>` lines.
    pub fn parse(text: &str) -> Self {
        Self::parse_with_prefix(text, "")
    }

    /// Like [`ChecksumIndex::parse`], but prepends `prefix` to every path.
    ///
    /// Listings published in a subdirectory of the mirror (for example
    /// `slackware64/CHECKSUMS.md5`) name files relative to that subdirectory,
    /// while manifest locations are relative to the mirror root.
    pub fn parse_with_prefix(text: &str, prefix: &str) -> Self {
        let prefix = normalize_location(prefix);
        let mut digests = HashMap::new();

        for line in text.lines() {
            let Some((digest, path)) = parse_line(line) else {
                continue;
            };
            let key = if prefix.is_empty() {
                path.to_string()
            } else {
                format!("{prefix}/{path}")
            };
            digests.insert(key, digest);
        }

        tracing::debug!(entries = digests.len(), "Parsed checksum listing");
        Self { digests }
    }

    /// Looks up the reference digest for `name` under `location`.
    pub fn lookup(&self, location: &str, name: &str) -> Option<&ContentDigest> {
        let location = normalize_location(location);
        if location.is_empty() {
            self.digests.get(name)
        } else {
            self.digests.get(&format!("{location}/{name}"))
        }
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(ContentDigest, &str)> {
    let line = line.trim_end_matches('\r');
    let (hex_digest, rest) = line.split_once(char::is_whitespace)?;
    let path = rest.trim_start().strip_prefix("./")?;
    if path.is_empty() {
        return None;
    }
    let digest = ContentDigest::from_hex(hex_digest)?;
    Some((digest, path))
}
