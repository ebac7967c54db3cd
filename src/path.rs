use std::fmt;

use itertools::Itertools;

/// Separator used by the equipment exports between hierarchy levels.
pub const PATH_SEPARATOR: char = '\\';

/// A position in the equipment hierarchy, e.g. `Plant\Buildings\Substation`.
///
/// Segments are trimmed and never empty, and a `HierPath` always has at least
/// one segment.  Ordering is lexicographic over the segments, which puts every
/// ancestor before its descendants.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HierPath(Vec<String>);

impl HierPath {
    /// Split a raw export cell into a path.  Leading, trailing and doubled
    /// separators are tolerated; `None` means nothing but whitespace was left.
    pub fn parse(raw: &str, separator: char) -> Option<HierPath> {
        HierPath::from_segments(raw.split(separator))
    }

    pub fn from_segments<I, S>(segments: I) -> Option<HierPath>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(HierPath(segments))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The last segment, which becomes the element's name.
    pub fn name(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// The first `len` segments.  `len` is clamped to `1..=self.len()`.
    pub fn prefix(&self, len: usize) -> HierPath {
        let len = len.clamp(1, self.0.len());
        HierPath(self.0[..len].to_vec())
    }

    pub fn parent(&self) -> Option<HierPath> {
        if self.is_root() {
            None
        } else {
            Some(self.prefix(self.0.len() - 1))
        }
    }

    /// All strict prefixes, shortest first.
    pub fn ancestors(&self) -> impl Iterator<Item = HierPath> + '_ {
        (1..self.0.len()).map(move |len| self.prefix(len))
    }
}

impl fmt::Display for HierPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(&PATH_SEPARATOR.to_string()))
    }
}
