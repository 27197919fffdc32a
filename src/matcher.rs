//! Top-k matching over a scored posting-list tree.
//!
//! A min-heap holds the best `k` documents seen so far. Once it is full, its weakest
//! score becomes the threshold passed to [`PostList::advance`], so subtrees whose bounds
//! cannot beat it are skipped, and the loop stops as soon as the tree's bound cannot.
//! A tree where nothing scores keeps its first `k` matches without scoring them.

use crate::postlist::PostList;
use crate::stats::{DocId, DocumentSource, StatFlags};
use crate::weight::Weight;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct FloatOrd(f64);

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Heap key: higher score wins, then lower doc id.
type Rank = (FloatOrd, Reverse<DocId>);

/// Run `root` to completion and return the best `k` documents.
///
/// `extra`, when given, adds its term-independent score to every match. Documents with a
/// non-finite score are dropped. Output is sorted by `(score desc, doc_id asc)`.
pub fn top_k(
    root: &mut dyn PostList,
    extra: Option<&Weight>,
    docs: &dyn DocumentSource,
    k: usize,
) -> Vec<(DocId, f64)> {
    if k == 0 {
        return Vec::new();
    }
    if root.is_boolean() && extra.map_or(true, Weight::is_boolean) {
        return first_k(root, k);
    }

    let mut needed = root.doc_stats_needed();
    if let Some(extra) = extra {
        needed |= extra.stats_needed().intersection(StatFlags::PER_DOCUMENT);
    }
    let max_extra = extra.map_or(0.0, Weight::max_extra_score);
    let mut max_part = root.recompute_max_weight();

    let mut heap: BinaryHeap<Reverse<Rank>> = BinaryHeap::with_capacity(k + 1);
    let mut scored = 0usize;
    loop {
        let min_score = if heap.len() == k {
            heap.peek().map(|Reverse((FloatOrd(s), _))| *s)
        } else {
            None
        };
        if let Some(min_score) = min_score {
            if max_part + max_extra <= min_score {
                tracing::debug!(
                    max_part,
                    max_extra,
                    min_score,
                    scored,
                    "bound cannot beat the top-k, stopping"
                );
                break;
            }
        }
        let threshold = min_score.map_or(f64::NEG_INFINITY, |m| m - max_extra);

        root.advance(threshold);
        let Some(did) = root.docid() else {
            break;
        };

        let doclen = if needed.contains(StatFlags::DOC_LENGTH) {
            docs.doclength(did)
        } else {
            0
        };
        let unique_terms = if needed.contains(StatFlags::UNIQUE_TERMS) {
            docs.unique_terms(did)
        } else {
            0
        };
        let wdf_doc_max = if needed.contains(StatFlags::WDF_DOC_MAX) {
            docs.wdf_doc_max(did)
        } else {
            0
        };

        let mut score = root.current_weight(doclen, unique_terms, wdf_doc_max, docs);
        if let Some(extra) = extra {
            score += extra.extra_score(doclen, unique_terms, wdf_doc_max);
        }
        scored += 1;
        if !score.is_finite() {
            continue;
        }

        let rank = (FloatOrd(score), Reverse(did));
        if heap.len() < k {
            heap.push(Reverse(rank));
        } else if let Some(Reverse(weakest)) = heap.peek() {
            if rank > *weakest {
                tracing::trace!(did, score, "entered top-k");
                heap.pop();
                heap.push(Reverse(rank));
            }
        }
        max_part = root.recompute_max_weight();
    }

    let mut results: Vec<(DocId, f64)> = heap
        .into_iter()
        .map(|Reverse((FloatOrd(score), Reverse(did)))| (did, score))
        .collect();

    // Deterministic: score desc, then doc_id asc.
    results.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    results
}

/// Every match scores zero, so the best `k` are the lowest doc ids.
fn first_k(root: &mut dyn PostList, k: usize) -> Vec<(DocId, f64)> {
    let mut results = Vec::with_capacity(k);
    while results.len() < k {
        root.advance(f64::NEG_INFINITY);
        let Some(did) = root.docid() else {
            break;
        };
        results.push((did, 0.0));
    }
    tracing::debug!(matched = results.len(), "boolean tree, scoring skipped");
    results
}
