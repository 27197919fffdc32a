//! `lexweight`: pluggable weighting schemes with bound-aware posting-list pruning.
//!
//! This crate is the scoring half of a lexical retrieval engine:
//! - a scheme declares which corpus/document statistics it reads ([`StatFlags`])
//! - an initialized [`Weight`] turns those statistics into per-document scores
//!   plus upper bounds that never undershoot a real score
//! - posting lists ([`postlist`], [`synonym`]) use those bounds to skip documents
//!   that cannot reach the current top-k cutoff
//!
//! Schemes:
//! - Boolean, coordinate match, Dice coefficient ([`simple`])
//! - BM25 / BM25+ ([`bm25`])
//! - TF-IDF with SMART-style normalizations ([`tfidf`])
//! - Divergence from Randomness: InL2, IfB2, IneB2, BB2, DLH, DPH, PL2, PL2+ ([`dfr`])
//! - Language models: Jelinek-Mercer, Dirichlet / Dir+, absolute discount, two-stage
//!   ([`query_likelihood`])
//!
//! Scope:
//! - Scoring and pruning over caller-supplied posting lists and statistics
//! - Wire encoding of scheme configuration for remote shards
//! - An in-memory index ([`index::MemoryIndex`]) standing in for a real database
//!
//! Non-goals:
//! - On-disk posting formats
//! - Query parsing
//! - Distributed shard coordination
//!
//! References:
//! - Robertson & Zaragoza (2009): BM25 and beyond
//! - Amati & van Rijsbergen (2002): Divergence from Randomness
//! - Zhai & Lafferty (2004): smoothing methods for language models in IR
//! - Lv & Zhai (2011): lower-bounding term frequency normalization (BM25+, Dir+)

pub mod bm25;
pub mod dfr;
pub mod index;
pub mod matcher;
pub mod postlist;
pub mod query_likelihood;
pub mod registry;
pub mod simple;
pub mod stats;
pub mod synonym;
pub mod tfidf;
pub mod weight;

pub use error::Error;
pub use registry::{Registry, SerialisedScheme};
pub use stats::{DocId, StatFlags};
pub use weight::{Scheme, SchemeKind, Weight};

mod error {
    /// Errors for weighting-scheme construction, transport and retrieval.
    #[derive(thiserror::Error, Debug, Clone, PartialEq)]
    pub enum Error {
        /// No scheme is registered under this name.
        #[error("unknown weighting scheme: {0:?}")]
        SchemeNotFound(String),
        /// A scheme rejected its parameters.
        #[error("invalid parameters for {scheme}: {reason}")]
        InvalidParameters {
            /// Scheme name.
            scheme: String,
            /// What was wrong.
            reason: String,
        },
        /// The scheme does not support remote transport.
        #[error("weighting scheme {0} is not remotable")]
        NotRemotable(&'static str),
        /// Serialised parameters could not be decoded.
        #[error("bad serialised parameters for {scheme}: {reason}")]
        Serialisation {
            /// Scheme name (or "scheme" for the outer envelope).
            scheme: String,
            /// Decoder message.
            reason: String,
        },
        /// Query term list was empty.
        #[error("empty query")]
        EmptyQuery,
        /// Index contains no documents.
        #[error("empty index")]
        EmptyIndex,
    }

    impl Error {
        pub(crate) fn invalid(scheme: &str, reason: impl Into<String>) -> Self {
            Self::InvalidParameters {
                scheme: scheme.to_string(),
                reason: reason.into(),
            }
        }
    }
}
