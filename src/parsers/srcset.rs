//! Responsive image candidate parsing
//!
//! Storefront images expose their renditions as a comma separated list of
//! `"<path> <width>w"` entries. The widest rendition is the one worth keeping.

/// One rendition from a responsive image candidate list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub path: String,
    pub width: u32,
}

impl ImageCandidate {
    /// Parses a single `"<path> <width>w"` entry
    fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let path = parts.next()?;
        let descriptor = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let width = descriptor.strip_suffix('w')?.parse().ok()?;
        Some(Self {
            path: path.to_string(),
            width,
        })
    }
}

/// Parses every entry and orders them widest first
///
/// The sort is stable, so entries of equal width keep their original order.
/// Returns `None` if there are no entries or any entry is malformed.
pub fn rank_candidates<'a, I>(entries: I) -> Option<Vec<ImageCandidate>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates = entries
        .into_iter()
        .map(ImageCandidate::parse)
        .collect::<Option<Vec<_>>>()?;

    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|a, b| b.width.cmp(&a.width));
    Some(candidates)
}

/// Picks the path of the widest rendition from a `srcset` attribute value
///
/// Ties go to the entry listed first.
pub fn select_highest_resolution(srcset: &str) -> Option<String> {
    let entries = srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty());

    rank_candidates(entries)?
        .into_iter()
        .next()
        .map(|candidate| candidate.path)
}
