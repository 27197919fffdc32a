//! Statistics negotiation.
//!
//! A scheme states which statistics it reads with [`StatFlags`] while it is being
//! built. Initialization gathers exactly those statistics into a [`Snapshot`];
//! anything undeclared reads as zero. The snapshot is immutable afterwards, and the
//! initialized [`crate::Weight`] has no way to declare more.
//!
//! Two scopes of length bounds exist:
//! - shard scope ([`ShardBounds`]): used for `max_*` bounds, which are per shard
//! - database scope ([`CollectionStats`]): used where a value must be identical on
//!   every shard (e.g. the language-model extra offsets)

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Document identifier.
pub type DocId = u32;

/// A set of statistics a weighting scheme needs.
///
/// Every flag has its own bit. Flags that are cheap to fetch together are grouped
/// (see [`StatFlags::TERM_GROUP`]) by the gatherer rather than by sharing bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatFlags(u32);

impl StatFlags {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Number of documents in the collection.
    pub const COLLECTION_SIZE: Self = Self(1 << 0);
    /// Number of documents in the relevance set.
    pub const RSET_SIZE: Self = Self(1 << 1);
    /// Average document length.
    pub const AVERAGE_LENGTH: Self = Self(1 << 2);
    /// Number of documents containing the term.
    pub const TERMFREQ: Self = Self(1 << 3);
    /// Number of relevance-set documents containing the term.
    pub const RELTERMFREQ: Self = Self(1 << 4);
    /// Number of terms in the query.
    pub const QUERY_LENGTH: Self = Self(1 << 5);
    /// Within-query frequency of the term.
    pub const WQF: Self = Self(1 << 6);
    /// Within-document frequency of the term.
    pub const WDF: Self = Self(1 << 7);
    /// Document length.
    pub const DOC_LENGTH: Self = Self(1 << 8);
    /// Lower bound on document length in this shard.
    pub const DOC_LENGTH_MIN: Self = Self(1 << 9);
    /// Upper bound on document length in this shard.
    pub const DOC_LENGTH_MAX: Self = Self(1 << 10);
    /// Upper bound on the term's wdf in this shard.
    pub const WDF_MAX: Self = Self(1 << 11);
    /// Total occurrences of the term in the collection.
    pub const COLLECTION_FREQ: Self = Self(1 << 12);
    /// Number of distinct terms in the document.
    pub const UNIQUE_TERMS: Self = Self(1 << 13);
    /// Sum of all document lengths.
    pub const TOTAL_LENGTH: Self = Self(1 << 14);
    /// Largest wdf of any term in the document.
    pub const WDF_DOC_MAX: Self = Self(1 << 15);
    /// Lower bound on unique terms per document in this shard.
    pub const UNIQUE_TERMS_MIN: Self = Self(1 << 16);
    /// Upper bound on unique terms per document in this shard.
    pub const UNIQUE_TERMS_MAX: Self = Self(1 << 17);
    /// Lower bound on document length across the whole database.
    pub const DB_DOC_LENGTH_MIN: Self = Self(1 << 18);
    /// Upper bound on document length across the whole database.
    pub const DB_DOC_LENGTH_MAX: Self = Self(1 << 19);
    /// Lower bound on unique terms per document across the whole database.
    pub const DB_UNIQUE_TERMS_MIN: Self = Self(1 << 20);
    /// Upper bound on unique terms per document across the whole database.
    pub const DB_UNIQUE_TERMS_MAX: Self = Self(1 << 21);

    /// Term statistics served by one lookup.
    pub const TERM_GROUP: Self =
        Self(Self::TERMFREQ.0 | Self::RELTERMFREQ.0 | Self::COLLECTION_FREQ.0);

    /// Per-document statistics a matcher has to look up for each candidate.
    pub const PER_DOCUMENT: Self =
        Self(Self::DOC_LENGTH.0 | Self::UNIQUE_TERMS.0 | Self::WDF_DOC_MAX.0);

    const NAMES: [(Self, &'static str); 22] = [
        (Self::COLLECTION_SIZE, "COLLECTION_SIZE"),
        (Self::RSET_SIZE, "RSET_SIZE"),
        (Self::AVERAGE_LENGTH, "AVERAGE_LENGTH"),
        (Self::TERMFREQ, "TERMFREQ"),
        (Self::RELTERMFREQ, "RELTERMFREQ"),
        (Self::QUERY_LENGTH, "QUERY_LENGTH"),
        (Self::WQF, "WQF"),
        (Self::WDF, "WDF"),
        (Self::DOC_LENGTH, "DOC_LENGTH"),
        (Self::DOC_LENGTH_MIN, "DOC_LENGTH_MIN"),
        (Self::DOC_LENGTH_MAX, "DOC_LENGTH_MAX"),
        (Self::WDF_MAX, "WDF_MAX"),
        (Self::COLLECTION_FREQ, "COLLECTION_FREQ"),
        (Self::UNIQUE_TERMS, "UNIQUE_TERMS"),
        (Self::TOTAL_LENGTH, "TOTAL_LENGTH"),
        (Self::WDF_DOC_MAX, "WDF_DOC_MAX"),
        (Self::UNIQUE_TERMS_MIN, "UNIQUE_TERMS_MIN"),
        (Self::UNIQUE_TERMS_MAX, "UNIQUE_TERMS_MAX"),
        (Self::DB_DOC_LENGTH_MIN, "DB_DOC_LENGTH_MIN"),
        (Self::DB_DOC_LENGTH_MAX, "DB_DOC_LENGTH_MAX"),
        (Self::DB_UNIQUE_TERMS_MIN, "DB_UNIQUE_TERMS_MIN"),
        (Self::DB_UNIQUE_TERMS_MAX, "DB_UNIQUE_TERMS_MAX"),
    ];

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every flag in `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is also in `self`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flags in `self` that are also in `other`.
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Flags in `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Declare a need. Additive: declaring a flag twice is a no-op.
    pub fn need(&mut self, flag: Self) {
        self.0 |= flag.0;
    }

    /// Builder form of [`StatFlags::need`].
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl BitOr for StatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for StatFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("StatFlags(NONE)");
        }
        f.write_str("StatFlags(")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// Per-term collection statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermStats {
    /// Documents containing the term.
    pub termfreq: u32,
    /// Relevance-set documents containing the term.
    pub reltermfreq: u32,
    /// Total occurrences of the term.
    pub collection_freq: u64,
}

/// Collection-wide statistics, shared read-only by every shard of one query.
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    /// Number of documents.
    pub collection_size: u32,
    /// Number of documents in the relevance set.
    pub rset_size: u32,
    /// Sum of document lengths.
    pub total_length: u64,
    /// Lower bound on document length over the whole database.
    pub db_doclength_lower: u32,
    /// Upper bound on document length over the whole database.
    pub db_doclength_upper: u32,
    /// Lower bound on unique terms per document over the whole database.
    pub db_unique_terms_lower: u32,
    /// Upper bound on unique terms per document over the whole database.
    pub db_unique_terms_upper: u32,
    terms: HashMap<String, TermStats>,
}

impl CollectionStats {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record statistics for a term (replacing earlier ones).
    pub fn set_term(&mut self, term: impl Into<String>, stats: TermStats) {
        self.terms.insert(term.into(), stats);
    }

    /// Builder form of [`CollectionStats::set_term`].
    #[must_use]
    pub fn with_term(mut self, term: impl Into<String>, stats: TermStats) -> Self {
        self.set_term(term, stats);
        self
    }

    /// Statistics for `term` (all zero if unknown).
    pub fn term_stats(&self, term: &str) -> TermStats {
        self.terms.get(term).copied().unwrap_or_default()
    }

    /// Average document length (0 for an empty collection).
    pub fn average_length(&self) -> f64 {
        if self.collection_size == 0 {
            return 0.0;
        }
        self.total_length as f64 / self.collection_size as f64
    }
}

/// Shard-scope bounds supplied by the database collaborator.
pub trait ShardBounds {
    /// Lower bound on document length.
    fn doclength_lower_bound(&self) -> u32;
    /// Upper bound on document length.
    fn doclength_upper_bound(&self) -> u32;
    /// Lower bound on unique terms per document.
    fn unique_terms_lower_bound(&self) -> u32;
    /// Upper bound on unique terms per document.
    fn unique_terms_upper_bound(&self) -> u32;
    /// Upper bound on `term`'s wdf.
    fn wdf_upper_bound(&self, term: &str) -> u32;
}

/// Fixed shard bounds, for callers that already know them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardSummary {
    /// Lower bound on document length.
    pub doclength_lower: u32,
    /// Upper bound on document length.
    pub doclength_upper: u32,
    /// Lower bound on unique terms per document.
    pub unique_terms_lower: u32,
    /// Upper bound on unique terms per document.
    pub unique_terms_upper: u32,
    /// Upper bound on wdf, applied to every term.
    pub wdf_upper: u32,
}

impl ShardBounds for ShardSummary {
    fn doclength_lower_bound(&self) -> u32 {
        self.doclength_lower
    }
    fn doclength_upper_bound(&self) -> u32 {
        self.doclength_upper
    }
    fn unique_terms_lower_bound(&self) -> u32 {
        self.unique_terms_lower
    }
    fn unique_terms_upper_bound(&self) -> u32 {
        self.unique_terms_upper
    }
    fn wdf_upper_bound(&self, _term: &str) -> u32 {
        self.wdf_upper
    }
}

/// Per-document statistics, looked up from the enclosing tree on demand.
pub trait DocumentSource {
    /// Length of `did` (0 if unknown).
    fn doclength(&self, did: DocId) -> u32;
    /// Distinct terms in `did`.
    fn unique_terms(&self, did: DocId) -> u32;
    /// Largest wdf of any term in `did`.
    fn wdf_doc_max(&self, did: DocId) -> u32;
}

/// Where a weight's statistics come from during initialization.
#[derive(Clone, Copy)]
pub struct ScoringEnv<'a> {
    /// Collection-wide statistics.
    pub stats: &'a CollectionStats,
    /// Bounds for the shard being scored.
    pub shard: &'a dyn ShardBounds,
    /// Number of terms in the query (counting repeats).
    pub query_length: u32,
}

impl<'a> ScoringEnv<'a> {
    /// Bundle the statistics sources for one shard of one query.
    pub fn new(stats: &'a CollectionStats, shard: &'a dyn ShardBounds, query_length: u32) -> Self {
        Self {
            stats,
            shard,
            query_length,
        }
    }
}

/// What a snapshot is being gathered for.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Subject<'a> {
    Term {
        term: &'a str,
        wqf: u32,
        wdf_bound_hint: Option<u32>,
    },
    Synonym {
        stats: TermStats,
        wdf_upper: u32,
    },
    Extra,
}

/// Statistics captured at initialization, restricted to the declared set.
///
/// Undeclared statistics read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    needed: StatFlags,
    factor: f64,
    collection_size: u32,
    rset_size: u32,
    average_length: f64,
    termfreq: u32,
    reltermfreq: u32,
    collection_freq: u64,
    query_length: u32,
    wqf: u32,
    doclength_lower: u32,
    doclength_upper: u32,
    wdf_upper: u32,
    unique_terms_lower: u32,
    unique_terms_upper: u32,
    total_length: u64,
    db_doclength_lower: u32,
    db_doclength_upper: u32,
    db_unique_terms_lower: u32,
    db_unique_terms_upper: u32,
}

impl Snapshot {
    pub(crate) fn gather(
        needed: StatFlags,
        env: &ScoringEnv<'_>,
        factor: f64,
        subject: Subject<'_>,
    ) -> Self {
        let stats = env.stats;
        let shard = env.shard;
        let has = |flag| needed.contains(flag);

        let mut snap = Self {
            needed,
            factor,
            ..Self::default()
        };
        if has(StatFlags::COLLECTION_SIZE) {
            snap.collection_size = stats.collection_size;
        }
        if has(StatFlags::RSET_SIZE) {
            snap.rset_size = stats.rset_size;
        }
        if has(StatFlags::AVERAGE_LENGTH) {
            snap.average_length = stats.average_length();
        }
        if has(StatFlags::TOTAL_LENGTH) {
            snap.total_length = stats.total_length;
        }
        if has(StatFlags::QUERY_LENGTH) {
            snap.query_length = env.query_length;
        }

        if needed.intersects(StatFlags::TERM_GROUP) {
            let ts = match subject {
                Subject::Term { term, .. } => stats.term_stats(term),
                Subject::Synonym { stats, .. } => stats,
                Subject::Extra => TermStats::default(),
            };
            if has(StatFlags::TERMFREQ) {
                snap.termfreq = ts.termfreq;
            }
            if has(StatFlags::RELTERMFREQ) {
                snap.reltermfreq = ts.reltermfreq;
            }
            if has(StatFlags::COLLECTION_FREQ) {
                snap.collection_freq = ts.collection_freq;
            }
        }
        if has(StatFlags::WQF) {
            snap.wqf = match subject {
                Subject::Term { wqf, .. } => wqf,
                Subject::Synonym { .. } => 1,
                Subject::Extra => 0,
            };
        }
        if has(StatFlags::WDF_MAX) {
            snap.wdf_upper = match subject {
                Subject::Term {
                    term,
                    wdf_bound_hint,
                    ..
                } => {
                    let bound = shard.wdf_upper_bound(term);
                    wdf_bound_hint.map_or(bound, |hint| hint.min(bound))
                }
                // The summed wdf is only clamped to the document length when the
                // length is declared.
                Subject::Synonym { wdf_upper, .. } if has(StatFlags::DOC_LENGTH) => {
                    wdf_upper.min(shard.doclength_upper_bound())
                }
                Subject::Synonym { wdf_upper, .. } => wdf_upper,
                Subject::Extra => 0,
            };
        }

        if has(StatFlags::DOC_LENGTH_MIN) {
            snap.doclength_lower = shard.doclength_lower_bound();
        }
        if has(StatFlags::DOC_LENGTH_MAX) {
            snap.doclength_upper = shard.doclength_upper_bound();
        }
        if has(StatFlags::UNIQUE_TERMS_MIN) {
            snap.unique_terms_lower = shard.unique_terms_lower_bound();
        }
        if has(StatFlags::UNIQUE_TERMS_MAX) {
            snap.unique_terms_upper = shard.unique_terms_upper_bound();
        }
        if has(StatFlags::DB_DOC_LENGTH_MIN) {
            snap.db_doclength_lower = stats.db_doclength_lower;
        }
        if has(StatFlags::DB_DOC_LENGTH_MAX) {
            snap.db_doclength_upper = stats.db_doclength_upper;
        }
        if has(StatFlags::DB_UNIQUE_TERMS_MIN) {
            snap.db_unique_terms_lower = stats.db_unique_terms_lower;
        }
        if has(StatFlags::DB_UNIQUE_TERMS_MAX) {
            snap.db_unique_terms_upper = stats.db_unique_terms_upper;
        }
        snap
    }

    /// The declared set this snapshot was gathered for.
    pub fn needed(&self) -> StatFlags {
        self.needed
    }
    /// Scaling factor (0 when initialized for the extra score only).
    pub fn factor(&self) -> f64 {
        self.factor
    }
    /// Number of documents.
    pub fn collection_size(&self) -> u32 {
        self.collection_size
    }
    /// Relevance-set size.
    pub fn rset_size(&self) -> u32 {
        self.rset_size
    }
    /// Average document length.
    pub fn average_length(&self) -> f64 {
        self.average_length
    }
    /// Documents containing the term.
    pub fn termfreq(&self) -> u32 {
        self.termfreq
    }
    /// Relevance-set documents containing the term.
    pub fn reltermfreq(&self) -> u32 {
        self.reltermfreq
    }
    /// Total occurrences of the term.
    pub fn collection_freq(&self) -> u64 {
        self.collection_freq
    }
    /// Number of query terms.
    pub fn query_length(&self) -> u32 {
        self.query_length
    }
    /// Within-query frequency.
    pub fn wqf(&self) -> u32 {
        self.wqf
    }
    /// Shard lower bound on document length.
    pub fn doclength_lower_bound(&self) -> u32 {
        self.doclength_lower
    }
    /// Shard upper bound on document length.
    pub fn doclength_upper_bound(&self) -> u32 {
        self.doclength_upper
    }
    /// Shard upper bound on the term's wdf.
    pub fn wdf_upper_bound(&self) -> u32 {
        self.wdf_upper
    }
    /// Shard lower bound on unique terms.
    pub fn unique_terms_lower_bound(&self) -> u32 {
        self.unique_terms_lower
    }
    /// Shard upper bound on unique terms.
    pub fn unique_terms_upper_bound(&self) -> u32 {
        self.unique_terms_upper
    }
    /// Sum of document lengths.
    pub fn total_length(&self) -> u64 {
        self.total_length
    }
    /// Database lower bound on document length.
    pub fn db_doclength_lower_bound(&self) -> u32 {
        self.db_doclength_lower
    }
    /// Database upper bound on document length.
    pub fn db_doclength_upper_bound(&self) -> u32 {
        self.db_doclength_upper
    }
    /// Database lower bound on unique terms.
    pub fn db_unique_terms_lower_bound(&self) -> u32 {
        self.db_unique_terms_lower
    }
    /// Database upper bound on unique terms.
    pub fn db_unique_terms_upper_bound(&self) -> u32 {
        self.db_unique_terms_upper
    }
}
