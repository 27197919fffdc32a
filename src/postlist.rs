//! The posting-list pruning protocol, plus an in-memory leaf and an OR combinator.
//!
//! A posting list starts positioned *before* its first document; the first
//! [`PostList::advance`] or [`PostList::skip_to`] moves it onto one. Both take a
//! `threshold`: the score a document must exceed to be worth visiting. A node whose
//! [`PostList::recompute_max_weight`] cannot reach the threshold may jump straight to the
//! end.

use crate::stats::{DocId, DocumentSource, StatFlags};
use crate::weight::Weight;
use std::fmt;

/// One node of a scored query tree.
pub trait PostList: fmt::Debug {
    /// Current document, or `None` before the first move and at the end.
    fn docid(&self) -> Option<DocId>;

    /// True once the list has been exhausted.
    fn at_end(&self) -> bool;

    /// Within-document frequency at the current document (0 when not on one).
    fn wdf(&self) -> u32;

    /// Upper bound on [`PostList::wdf`] over the whole list.
    fn wdf_upper_bound(&self) -> u32;

    /// Move to the next document that could score above `threshold`.
    fn advance(&mut self, threshold: f64);

    /// Move to the first document `>= target` that could score above `threshold`.
    /// A list already at or past `target` does not move.
    fn skip_to(&mut self, target: DocId, threshold: f64);

    /// Score of the current document.
    ///
    /// The per-document statistics are the ones named by [`PostList::doc_stats_needed`]
    /// (others may be passed as 0); `docs` serves lazy lookups of anything else.
    fn current_weight(
        &self,
        doclen: u32,
        unique_terms: u32,
        wdf_doc_max: u32,
        docs: &dyn DocumentSource,
    ) -> f64;

    /// Upper bound on [`PostList::current_weight`] for the rest of the list.
    fn recompute_max_weight(&mut self) -> f64;

    /// Number of query subexpressions matching the current document.
    fn matching_subquery_count(&self) -> usize;

    /// Per-document statistics [`PostList::current_weight`] wants from the caller.
    fn doc_stats_needed(&self) -> StatFlags;

    /// True when every document in the list scores zero.
    fn is_boolean(&self) -> bool {
        false
    }
}

impl<P: PostList + ?Sized> PostList for Box<P> {
    fn docid(&self) -> Option<DocId> {
        (**self).docid()
    }
    fn at_end(&self) -> bool {
        (**self).at_end()
    }
    fn wdf(&self) -> u32 {
        (**self).wdf()
    }
    fn wdf_upper_bound(&self) -> u32 {
        (**self).wdf_upper_bound()
    }
    fn advance(&mut self, threshold: f64) {
        (**self).advance(threshold)
    }
    fn skip_to(&mut self, target: DocId, threshold: f64) {
        (**self).skip_to(target, threshold)
    }
    fn current_weight(
        &self,
        doclen: u32,
        unique_terms: u32,
        wdf_doc_max: u32,
        docs: &dyn DocumentSource,
    ) -> f64 {
        (**self).current_weight(doclen, unique_terms, wdf_doc_max, docs)
    }
    fn recompute_max_weight(&mut self) -> f64 {
        (**self).recompute_max_weight()
    }
    fn matching_subquery_count(&self) -> usize {
        (**self).matching_subquery_count()
    }
    fn doc_stats_needed(&self) -> StatFlags {
        (**self).doc_stats_needed()
    }
    fn is_boolean(&self) -> bool {
        (**self).is_boolean()
    }
}

/// One (document, wdf) entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Document identifier.
    pub docid: DocId,
    /// Occurrences of the term in the document.
    pub wdf: u32,
}

/// A term's postings held in memory, optionally weighted.
#[derive(Debug)]
pub struct TermPostList {
    term: String,
    postings: Vec<Posting>,
    pos: usize,
    started: bool,
    wdf_upper: u32,
    weight: Option<Weight>,
}

impl TermPostList {
    /// Unweighted list; postings are sorted by document id.
    pub fn new(term: impl Into<String>, mut postings: Vec<Posting>) -> Self {
        postings.sort_by_key(|p| p.docid);
        let wdf_upper = postings.iter().map(|p| p.wdf).max().unwrap_or(0);
        Self {
            term: term.into(),
            postings,
            pos: 0,
            started: false,
            wdf_upper,
            weight: None,
        }
    }

    /// Attach the weight that scores this term.
    #[must_use]
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    /// The term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Number of documents in the list.
    pub fn termfreq(&self) -> u32 {
        u32::try_from(self.postings.len()).unwrap_or(u32::MAX)
    }

    /// Total occurrences across the list.
    pub fn collection_freq(&self) -> u64 {
        self.postings.iter().map(|p| u64::from(p.wdf)).sum()
    }

    fn max_weight(&self) -> f64 {
        self.weight.as_ref().map_or(0.0, Weight::max_partial_score)
    }

    fn current(&self) -> Option<&Posting> {
        if self.started {
            self.postings.get(self.pos)
        } else {
            None
        }
    }

    fn finish(&mut self) {
        self.started = true;
        self.pos = self.postings.len();
    }
}

impl PostList for TermPostList {
    fn docid(&self) -> Option<DocId> {
        self.current().map(|p| p.docid)
    }

    fn at_end(&self) -> bool {
        self.started && self.pos >= self.postings.len()
    }

    fn wdf(&self) -> u32 {
        self.current().map_or(0, |p| p.wdf)
    }

    fn wdf_upper_bound(&self) -> u32 {
        self.wdf_upper
    }

    fn advance(&mut self, threshold: f64) {
        if threshold > self.max_weight() {
            self.finish();
            return;
        }
        if self.started {
            self.pos = (self.pos + 1).min(self.postings.len());
        } else {
            self.started = true;
        }
    }

    fn skip_to(&mut self, target: DocId, threshold: f64) {
        if threshold > self.max_weight() {
            self.finish();
            return;
        }
        self.started = true;
        let rest = &self.postings[self.pos.min(self.postings.len())..];
        self.pos += rest.partition_point(|p| p.docid < target);
    }

    fn current_weight(
        &self,
        doclen: u32,
        unique_terms: u32,
        wdf_doc_max: u32,
        _docs: &dyn DocumentSource,
    ) -> f64 {
        match &self.weight {
            Some(w) if self.current().is_some() => {
                w.partial_score(self.wdf(), doclen, unique_terms, wdf_doc_max)
            }
            _ => 0.0,
        }
    }

    fn recompute_max_weight(&mut self) -> f64 {
        self.max_weight()
    }

    fn matching_subquery_count(&self) -> usize {
        1
    }

    fn doc_stats_needed(&self) -> StatFlags {
        self.weight.as_ref().map_or(StatFlags::NONE, |w| {
            w.stats_needed().intersection(StatFlags::PER_DOCUMENT)
        })
    }

    fn is_boolean(&self) -> bool {
        self.weight.as_ref().map_or(true, Weight::is_boolean)
    }
}

/// Union of its children: a document matches if any child does, and scores the sum of the
/// matching children's weights.
#[derive(Debug)]
pub struct OrPostList {
    children: Vec<Box<dyn PostList>>,
    maxes: Vec<f64>,
    max_weight: f64,
    current: Option<DocId>,
    started: bool,
}

impl OrPostList {
    /// Combine `children`, none of which has been moved yet.
    pub fn new(mut children: Vec<Box<dyn PostList>>) -> Self {
        let maxes: Vec<f64> = children
            .iter_mut()
            .map(|c| c.recompute_max_weight())
            .collect();
        let max_weight: f64 = maxes.iter().sum();
        Self {
            children,
            maxes,
            max_weight,
            current: None,
            started: false,
        }
    }

    /// Threshold child `i` has to reach if every other child scores its maximum.
    fn child_threshold(&self, threshold: f64, i: usize) -> f64 {
        threshold - (self.max_weight - self.maxes[i])
    }

    /// Drop exhausted children and move onto the smallest remaining document.
    fn settle(&mut self) {
        // Order-preserving, so scores are always summed in the same order.
        let mut i = 0;
        while i < self.children.len() {
            if self.children[i].at_end() {
                self.children.remove(i);
                self.maxes.remove(i);
            } else {
                i += 1;
            }
        }
        self.max_weight = self.maxes.iter().sum();
        self.current = self.children.iter().filter_map(|c| c.docid()).min();
    }

    fn finish(&mut self) {
        self.started = true;
        self.children.clear();
        self.maxes.clear();
        self.max_weight = 0.0;
        self.current = None;
    }

    fn on_current(&self) -> impl Iterator<Item = &Box<dyn PostList>> + '_ {
        let current = self.current;
        self.children
            .iter()
            .filter(move |c| current.is_some() && c.docid() == current)
    }
}

impl PostList for OrPostList {
    fn docid(&self) -> Option<DocId> {
        self.current
    }

    fn at_end(&self) -> bool {
        self.started && self.current.is_none()
    }

    fn wdf(&self) -> u32 {
        self.on_current()
            .fold(0u32, |acc, c| acc.saturating_add(c.wdf()))
    }

    fn wdf_upper_bound(&self) -> u32 {
        self.children
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.wdf_upper_bound()))
    }

    fn advance(&mut self, threshold: f64) {
        if threshold > self.max_weight {
            self.finish();
            return;
        }
        let current = self.current;
        let first = !self.started;
        self.started = true;
        for i in 0..self.children.len() {
            if first || self.children[i].docid() == current {
                let t = self.child_threshold(threshold, i);
                self.children[i].advance(t);
            }
        }
        self.settle();
    }

    fn skip_to(&mut self, target: DocId, threshold: f64) {
        if threshold > self.max_weight {
            self.finish();
            return;
        }
        self.started = true;
        for i in 0..self.children.len() {
            let t = self.child_threshold(threshold, i);
            self.children[i].skip_to(target, t);
        }
        self.settle();
    }

    fn current_weight(
        &self,
        doclen: u32,
        unique_terms: u32,
        wdf_doc_max: u32,
        docs: &dyn DocumentSource,
    ) -> f64 {
        self.on_current()
            .map(|c| c.current_weight(doclen, unique_terms, wdf_doc_max, docs))
            .sum()
    }

    fn recompute_max_weight(&mut self) -> f64 {
        for (child, max) in self.children.iter_mut().zip(self.maxes.iter_mut()) {
            *max = child.recompute_max_weight();
        }
        self.max_weight = self.maxes.iter().sum();
        self.max_weight
    }

    fn matching_subquery_count(&self) -> usize {
        self.on_current().map(|c| c.matching_subquery_count()).sum()
    }

    fn doc_stats_needed(&self) -> StatFlags {
        self.children
            .iter()
            .fold(StatFlags::NONE, |acc, c| acc | c.doc_stats_needed())
    }

    fn is_boolean(&self) -> bool {
        self.children.iter().all(|c| c.is_boolean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDocs;

    impl DocumentSource for NoDocs {
        fn doclength(&self, _did: DocId) -> u32 {
            0
        }
        fn unique_terms(&self, _did: DocId) -> u32 {
            0
        }
        fn wdf_doc_max(&self, _did: DocId) -> u32 {
            0
        }
    }

    fn leaf(term: &str, docs: &[(DocId, u32)]) -> TermPostList {
        let postings = docs
            .iter()
            .map(|&(docid, wdf)| Posting { docid, wdf })
            .collect();
        TermPostList::new(term, postings)
    }

    fn walk(pl: &mut dyn PostList) -> Vec<(DocId, u32, usize)> {
        let mut out = Vec::new();
        pl.advance(0.0);
        while let Some(did) = pl.docid() {
            out.push((did, pl.wdf(), pl.matching_subquery_count()));
            pl.advance(0.0);
        }
        assert!(pl.at_end());
        out
    }

    #[test]
    fn leaf_starts_before_first_document() {
        let mut pl = leaf("a", &[(5, 1), (2, 3)]);
        assert_eq!(pl.docid(), None);
        assert!(!pl.at_end());
        assert_eq!(pl.wdf_upper_bound(), 3);
        assert_eq!(walk(&mut pl), vec![(2, 3, 1), (5, 1, 1)]);
    }

    #[test]
    fn leaf_skip_to_does_not_move_backwards() {
        let mut pl = leaf("a", &[(1, 1), (4, 1), (9, 2)]);
        pl.skip_to(3, 0.0);
        assert_eq!(pl.docid(), Some(4));
        pl.skip_to(2, 0.0);
        assert_eq!(pl.docid(), Some(4));
        pl.skip_to(9, 0.0);
        assert_eq!(pl.wdf(), 2);
        pl.skip_to(10, 0.0);
        assert!(pl.at_end());
    }

    #[test]
    fn unreachable_threshold_ends_leaf() {
        let mut pl = leaf("a", &[(1, 1)]);
        pl.advance(0.5);
        assert!(pl.at_end());
        assert_eq!(pl.current_weight(0, 0, 0, &NoDocs), 0.0);
    }

    #[test]
    fn or_merges_and_sums_wdf() {
        let a = leaf("a", &[(1, 2), (3, 1)]);
        let b = leaf("b", &[(3, 4), (7, 1)]);
        let mut or = OrPostList::new(vec![Box::new(a), Box::new(b)]);
        assert_eq!(or.wdf_upper_bound(), 6);
        assert_eq!(walk(&mut or), vec![(1, 2, 1), (3, 5, 2), (7, 1, 1)]);
    }

    #[test]
    fn or_skip_to_lands_on_union() {
        let a = leaf("a", &[(2, 1), (8, 1)]);
        let b = leaf("b", &[(5, 1), (9, 1)]);
        let mut or = OrPostList::new(vec![Box::new(a), Box::new(b)]);
        or.skip_to(6, 0.0);
        assert_eq!(or.docid(), Some(8));
        or.advance(0.0);
        assert_eq!(or.docid(), Some(9));
        or.advance(0.0);
        assert!(or.at_end());
    }
}
