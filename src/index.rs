//! In-memory inverted index: the database collaborator for small collections and tests.
//!
//! Documents are caller-tokenized term streams. The index serves collection statistics,
//! shard bounds ([`ShardBounds`]), per-document statistics ([`DocumentSource`]) and
//! leaf posting lists ([`TermPostList`]), and wires them into a scored top-k search.

use crate::matcher;
use crate::postlist::{OrPostList, PostList, Posting, TermPostList};
use crate::stats::{
    CollectionStats, DocId, DocumentSource, ScoringEnv, ShardBounds, TermStats,
};
use crate::weight::{Scheme, Weight};
use crate::Error;
use postings::PostingsIndex;
use std::collections::{BTreeMap, BTreeSet};

/// Per-document statistics the postings store does not keep.
#[derive(Debug, Clone, Copy)]
struct DocExtra {
    unique_terms: u32,
    wdf_max: u32,
}

/// Inverted index held entirely in memory.
#[derive(Debug)]
pub struct MemoryIndex {
    postings: PostingsIndex<String>,
    extra: BTreeMap<DocId, DocExtra>,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            postings: PostingsIndex::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Add/update a document by doc id and token stream.
    pub fn add_document(&mut self, doc_id: DocId, terms: &[String]) {
        // Updates are delete+add.
        self.delete_document(doc_id);
        // The id was just freed, so the add cannot collide.
        let _ = self.postings.add_document(doc_id, terms);

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for term in terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
        self.extra.insert(
            doc_id,
            DocExtra {
                unique_terms: u32::try_from(counts.len()).unwrap_or(u32::MAX),
                wdf_max: counts.values().copied().max().unwrap_or(0),
            },
        );
    }

    /// Delete a document by id.
    ///
    /// Returns whether the document existed.
    pub fn delete_document(&mut self, doc_id: DocId) -> bool {
        let known = self.extra.remove(&doc_id).is_some();
        self.postings.delete_document(doc_id) || known
    }

    /// Count of documents currently indexed.
    pub fn num_docs(&self) -> u32 {
        u32::try_from(self.extra.len()).unwrap_or(u32::MAX)
    }

    /// Iterate document ids in ascending order.
    pub fn document_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.extra.keys().copied()
    }

    /// Occurrences of `term` in `doc_id` (0 if doc missing / term absent).
    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> u32 {
        self.postings.term_frequency(doc_id, term)
    }

    /// Number of documents containing `term`.
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.postings.df(term)
    }

    /// Total occurrences of `term`.
    pub fn collection_frequency(&self, term: &str) -> u64 {
        self.postings
            .postings_iter(term)
            .map(|(_doc, tf)| u64::from(tf))
            .sum()
    }

    /// Document length (in terms). Returns 0 for unknown doc ids.
    pub fn document_length(&self, doc_id: DocId) -> u32 {
        self.postings.document_len(doc_id)
    }

    /// Sum of all document lengths.
    pub fn total_length(&self) -> u64 {
        self.document_ids()
            .map(|d| u64::from(self.document_length(d)))
            .sum()
    }

    /// Average document length over indexed docs.
    pub fn avg_doc_len(&self) -> f64 {
        if self.extra.is_empty() {
            return 0.0;
        }
        self.total_length() as f64 / self.extra.len() as f64
    }

    fn live_rset(&self, rset: &[DocId]) -> BTreeSet<DocId> {
        rset.iter()
            .copied()
            .filter(|d| self.extra.contains_key(d))
            .collect()
    }

    /// Collection statistics for `terms`, with `rset` as the relevance set.
    ///
    /// This index is its own only shard, so database-scope bounds equal shard bounds.
    pub fn collection_stats<S: AsRef<str>>(&self, terms: &[S], rset: &[DocId]) -> CollectionStats {
        let rset = self.live_rset(rset);
        let mut stats = CollectionStats::new();
        stats.collection_size = self.num_docs();
        stats.rset_size = u32::try_from(rset.len()).unwrap_or(u32::MAX);
        stats.total_length = self.total_length();
        stats.db_doclength_lower = self.doclength_lower_bound();
        stats.db_doclength_upper = self.doclength_upper_bound();
        stats.db_unique_terms_lower = self.unique_terms_lower_bound();
        stats.db_unique_terms_upper = self.unique_terms_upper_bound();
        for term in terms {
            let term = term.as_ref();
            let reltermfreq = rset
                .iter()
                .filter(|&&d| self.term_frequency(d, term) > 0)
                .count();
            stats.set_term(
                term,
                TermStats {
                    termfreq: self.doc_frequency(term),
                    reltermfreq: u32::try_from(reltermfreq).unwrap_or(u32::MAX),
                    collection_freq: self.collection_frequency(term),
                },
            );
        }
        stats
    }

    /// Aggregate statistics for a synonym group: documents matching any member, the
    /// relevant ones among them, and the members' summed occurrences.
    pub fn synonym_stats<S: AsRef<str>>(&self, terms: &[S], rset: &[DocId]) -> TermStats {
        let mut docs = BTreeSet::new();
        let mut collection_freq = 0u64;
        for term in terms {
            for (doc, tf) in self.postings.postings_iter(term.as_ref()) {
                docs.insert(doc);
                collection_freq += u64::from(tf);
            }
        }
        let reltermfreq = self.live_rset(rset).intersection(&docs).count();
        TermStats {
            termfreq: u32::try_from(docs.len()).unwrap_or(u32::MAX),
            reltermfreq: u32::try_from(reltermfreq).unwrap_or(u32::MAX),
            collection_freq,
        }
    }

    /// Unweighted posting list for `term` (empty if absent).
    pub fn postlist(&self, term: &str) -> TermPostList {
        let mut postings: Vec<Posting> = self
            .postings
            .postings_iter(term)
            .map(|(docid, wdf)| Posting { docid, wdf })
            .collect();
        postings.sort_unstable_by_key(|p| p.docid);
        TermPostList::new(term, postings)
    }

    /// Retrieve the top `k` documents for a tokenized query under `scheme`.
    ///
    /// Repeated query terms raise the term's wqf. Output is sorted by
    /// `(score desc, doc_id asc)`.
    pub fn search(
        &self,
        query_terms: &[String],
        scheme: &dyn Scheme,
        k: usize,
    ) -> Result<Vec<(DocId, f64)>, Error> {
        self.search_with_rset(query_terms, scheme, k, &[])
    }

    /// [`MemoryIndex::search`] with a relevance set for feedback-aware schemes.
    pub fn search_with_rset(
        &self,
        query_terms: &[String],
        scheme: &dyn Scheme,
        k: usize,
        rset: &[DocId],
    ) -> Result<Vec<(DocId, f64)>, Error> {
        if query_terms.is_empty() {
            return Err(Error::EmptyQuery);
        }
        if self.extra.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut wqfs: BTreeMap<&str, u32> = BTreeMap::new();
        for term in query_terms {
            *wqfs.entry(term.as_str()).or_insert(0) += 1;
        }
        let distinct: Vec<&str> = wqfs.keys().copied().collect();
        let stats = self.collection_stats(&distinct, rset);
        let query_length = u32::try_from(query_terms.len()).unwrap_or(u32::MAX);
        let env = ScoringEnv::new(&stats, self, query_length);

        let leaves: Vec<Box<dyn PostList>> = wqfs
            .iter()
            .map(|(&term, &wqf)| {
                let pl = self.postlist(term);
                let weight = Weight::initialize_for_term(
                    scheme.clone_box(),
                    &env,
                    term,
                    wqf,
                    1.0,
                    Some(&pl as &dyn PostList),
                );
                Box::new(pl.with_weight(weight)) as Box<dyn PostList>
            })
            .collect();
        let mut root = OrPostList::new(leaves);
        let extra = Weight::initialize_for_extra(scheme.clone_box(), &env);
        Ok(matcher::top_k(&mut root, Some(&extra), self, k))
    }
}

impl ShardBounds for MemoryIndex {
    fn doclength_lower_bound(&self) -> u32 {
        self.document_ids()
            .map(|d| self.document_length(d))
            .min()
            .unwrap_or(0)
    }

    fn doclength_upper_bound(&self) -> u32 {
        self.document_ids()
            .map(|d| self.document_length(d))
            .max()
            .unwrap_or(0)
    }

    fn unique_terms_lower_bound(&self) -> u32 {
        self.extra.values().map(|d| d.unique_terms).min().unwrap_or(0)
    }

    fn unique_terms_upper_bound(&self) -> u32 {
        self.extra.values().map(|d| d.unique_terms).max().unwrap_or(0)
    }

    fn wdf_upper_bound(&self, term: &str) -> u32 {
        self.postings
            .postings_iter(term)
            .map(|(_doc, tf)| tf)
            .max()
            .unwrap_or(0)
    }
}

impl DocumentSource for MemoryIndex {
    fn doclength(&self, did: DocId) -> u32 {
        self.document_length(did)
    }

    fn unique_terms(&self, did: DocId) -> u32 {
        self.extra.get(&did).map_or(0, |d| d.unique_terms)
    }

    fn wdf_doc_max(&self, did: DocId) -> u32 {
        self.extra.get(&did).map_or(0, |d| d.wdf_max)
    }
}
