//! Synonym groups: several subqueries scored as one pseudo-term.
//!
//! The group's wdf is the sum of its children's wdfs (an approximation: a term repeated
//! under the group is counted twice), and one [`Weight`] initialized with the group's
//! aggregate statistics scores it. See [`Weight::initialize_for_synonym`].

use crate::postlist::{OrPostList, PostList};
use crate::stats::{DocId, DocumentSource, StatFlags};
use crate::weight::Weight;

/// A synonym group exposed to the rest of the tree as a single term.
#[derive(Debug)]
pub struct SynonymPostList {
    subtree: Box<dyn PostList>,
    weight: Weight,
    want_wdf: bool,
    want_wdf_doc_max: bool,
    pruned: bool,
}

impl SynonymPostList {
    /// Group `children` under `weight`. A single child is wrapped directly; more are merged
    /// with an [`OrPostList`].
    pub fn new(mut children: Vec<Box<dyn PostList>>, weight: Weight) -> Self {
        let subtree: Box<dyn PostList> = if children.len() == 1 {
            children.remove(0)
        } else {
            Box::new(OrPostList::new(children))
        };
        let mut pl = Self {
            subtree,
            weight,
            want_wdf: false,
            want_wdf_doc_max: false,
            pruned: false,
        };
        pl.derive_wants();
        pl
    }

    /// Replace the scoring weight. The previous one is dropped.
    pub fn set_weight(&mut self, weight: Weight) {
        self.weight = weight;
        self.derive_wants();
        tracing::debug!(
            scheme = self.weight.scheme().name(),
            want_wdf = self.want_wdf,
            want_wdf_doc_max = self.want_wdf_doc_max,
            "rebound synonym weight"
        );
    }

    /// The weight scoring this group.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    fn derive_wants(&mut self) {
        self.want_wdf = self.weight.needs_wdf();
        self.want_wdf_doc_max = self.weight.needs_wdf_doc_max();
    }
}

impl PostList for SynonymPostList {
    fn docid(&self) -> Option<DocId> {
        if self.pruned {
            None
        } else {
            self.subtree.docid()
        }
    }

    fn at_end(&self) -> bool {
        self.pruned || self.subtree.at_end()
    }

    fn wdf(&self) -> u32 {
        if self.pruned {
            0
        } else {
            self.subtree.wdf()
        }
    }

    fn wdf_upper_bound(&self) -> u32 {
        self.subtree.wdf_upper_bound()
    }

    fn advance(&mut self, threshold: f64) {
        if threshold > self.weight.max_partial_score() {
            // Nothing in the group can reach it.
            self.pruned = true;
            return;
        }
        // Child bounds say nothing about the group's aggregate score.
        self.subtree.advance(0.0);
    }

    fn skip_to(&mut self, target: DocId, threshold: f64) {
        if threshold > self.weight.max_partial_score() {
            self.pruned = true;
            return;
        }
        self.subtree.skip_to(target, 0.0);
    }

    fn current_weight(
        &self,
        mut doclen: u32,
        unique_terms: u32,
        mut wdf_doc_max: u32,
        docs: &dyn DocumentSource,
    ) -> f64 {
        let mut wdf = 0;
        if self.want_wdf {
            wdf = self.subtree.wdf();
            if self.weight.needs_doclength() {
                // Summed wdfs can exceed the document length.
                wdf = wdf.min(doclen);
            }
        }
        if self.want_wdf_doc_max {
            // Max wdf is undefined for a group; the document length bounds it.
            if doclen == 0 {
                if let Some(did) = self.subtree.docid() {
                    doclen = docs.doclength(did);
                }
            }
            wdf_doc_max = doclen;
        }
        self.weight
            .partial_score(wdf, doclen, unique_terms, wdf_doc_max)
    }

    fn recompute_max_weight(&mut self) -> f64 {
        self.weight.max_partial_score()
    }

    fn matching_subquery_count(&self) -> usize {
        1
    }

    fn doc_stats_needed(&self) -> StatFlags {
        self.weight
            .stats_needed()
            .intersection(StatFlags::DOC_LENGTH | StatFlags::UNIQUE_TERMS)
    }

    fn is_boolean(&self) -> bool {
        self.weight.is_boolean()
    }
}
