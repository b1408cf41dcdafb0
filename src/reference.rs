//! Link reference definition map (spec §4.4).
//!
//! Grounded on `original_source/src/references.c`: labels are normalized by
//! case-folding, trimming, and collapsing internal whitespace; the first
//! definition encountered for a given normalized label wins, which the
//! reference C code achieves by prepending each new definition (`ref->next =
//! map->refs`) and, at lookup time, sorting by `(label, age)` and keeping
//! only the lowest-age entry per label. `max_ref_size` bounds how many bytes
//! of `url`+`title` a single parse can pull out of the map, guarding against
//! documents crafted to blow up output size via many references to a huge
//! definition.

use crate::strings;

pub const MAX_LINK_LABEL_LENGTH: usize = 1000;

struct Reference {
    label: String,
    url: Vec<u8>,
    title: Vec<u8>,
    age: usize,
    size: usize,
}

/// Case-fold, trim, and collapse whitespace in a reference label. Returns
/// `None` if the label is empty or composed solely of whitespace.
fn normalize_reference(label: &[u8]) -> Option<String> {
    if label.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(label);
    let folded = caseless::default_case_fold_str(&text);
    let trimmed = strings::trim_slice(folded.as_bytes());
    let collapsed = strings::normalize_whitespace(trimmed);
    if collapsed.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&collapsed).into_owned())
}

/// A reference map accumulated while parsing a document; definitions are
/// appended in document order and resolved lazily, first-definition-wins,
/// the first time a lookup is performed.
pub struct ReferenceMap {
    refs: Vec<Reference>,
    sorted: Option<Vec<usize>>,
    max_ref_size: usize,
    ref_size: usize,
}

impl ReferenceMap {
    pub fn new(max_ref_size: usize) -> Self {
        ReferenceMap {
            refs: Vec::new(),
            sorted: None,
            max_ref_size,
            ref_size: 0,
        }
    }

    /// Record a reference definition. Ignored if the label normalizes to
    /// empty.
    pub fn create(&mut self, label: &[u8], url: &[u8], title: &[u8]) {
        let Some(reflabel) = normalize_reference(label) else {
            return;
        };

        let url = strings::clean_url(url);
        let title = strings::clean_title(title);
        let size = url.len() + title.len();
        let age = self.refs.len();

        self.refs.push(Reference {
            label: reflabel,
            url,
            title,
            age,
            size,
        });
        self.sorted = None;
    }

    fn ensure_sorted(&mut self) {
        if self.sorted.is_some() {
            return;
        }
        let mut order: Vec<usize> = (0..self.refs.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = &self.refs[a];
            let rb = &self.refs[b];
            ra.label.cmp(&rb.label).then(ra.age.cmp(&rb.age))
        });

        let mut dedup = Vec::with_capacity(order.len());
        for idx in order {
            if let Some(&last) = dedup.last() {
                let last_label: &str = &self.refs[last].label;
                if last_label == self.refs[idx].label {
                    continue;
                }
            }
            dedup.push(idx);
        }
        self.sorted = Some(dedup);
    }

    /// Look up a reference by its (unnormalized) label. Returns `None` if
    /// the label is out of range, unknown, or resolving it would exceed the
    /// expansion-size cap.
    pub fn lookup(&mut self, label: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        if label.is_empty() || label.len() > MAX_LINK_LABEL_LENGTH || self.refs.is_empty() {
            return None;
        }

        let norm = normalize_reference(label)?;
        self.ensure_sorted();
        let sorted = self.sorted.as_ref().unwrap();

        let idx = sorted
            .binary_search_by(|&i| self.refs[i].label.as_str().cmp(norm.as_str()))
            .ok()?;
        let r = &self.refs[sorted[idx]];

        if self.max_ref_size != 0 && r.size > self.max_ref_size.saturating_sub(self.ref_size) {
            return None;
        }

        self.ref_size += r.size;
        Some((r.url.clone(), r.title.clone()))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_definition_for_a_label_wins() {
        let mut map = ReferenceMap::new(0);
        map.create(b"foo", b"/first", b"");
        map.create(b"foo", b"/second", b"");
        let (url, _) = map.lookup(b"foo").unwrap();
        assert_eq!(url, b"/first");
    }

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let mut map = ReferenceMap::new(0);
        map.create(b"Foo   Bar", b"/target", b"");
        let (url, _) = map.lookup(b"foo bar").unwrap();
        assert_eq!(url, b"/target");
    }

    #[test]
    fn whitespace_only_label_is_ignored() {
        let mut map = ReferenceMap::new(0);
        map.create(b"   ", b"/target", b"");
        assert!(map.is_empty());
    }

    #[test]
    fn expansion_cap_blocks_lookups_past_the_budget() {
        let mut map = ReferenceMap::new(5);
        map.create(b"foo", b"0123456789", b"");
        assert!(map.lookup(b"foo").is_none());
    }
}
