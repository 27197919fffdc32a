//! The weighting-scheme contract.
//!
//! Two layers:
//! - [`Scheme`]: an uninitialized, immutable configuration (a "prototype"). It
//!   declares its statistic needs and can be cloned, serialised and built from a
//!   factory string.
//! - [`Weight`]: one scheme initialized for one term (or synonym group, or the
//!   term-independent extra) on one shard. It owns the derived state produced by
//!   [`Scheme::init`] and a frozen copy of the declared needs.
//!
//! Initialization consumes the scheme, so statistics can only be declared before it.

use crate::postlist::PostList;
use crate::stats::{ScoringEnv, Snapshot, StatFlags, Subject, TermStats};
use crate::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Distinguishes schemes the matcher can treat specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    /// Produces real scores.
    Scored,
    /// Every score and bound is zero.
    Boolean,
}

/// A configured, not yet initialized weighting scheme.
pub trait Scheme: fmt::Debug + Send + Sync {
    /// Registry name, e.g. `"bm25"`.
    fn name(&self) -> &'static str;

    /// Scored or boolean.
    fn kind(&self) -> SchemeKind {
        SchemeKind::Scored
    }

    /// Statistics this configuration reads.
    fn stats_needed(&self) -> StatFlags;

    /// An independent, value-identical copy.
    fn clone_box(&self) -> Box<dyn Scheme>;

    /// Compute derived state from the gathered statistics.
    ///
    /// `snapshot.factor()` is 0 when only the extra score will be used.
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer>;

    /// Encode the configuration parameters.
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Err(Error::NotRemotable(self.name()))
    }

    /// Decode parameters produced by [`Scheme::serialise`] into a new scheme.
    fn unserialise(&self, _params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        Err(Error::NotRemotable(self.name()))
    }

    /// Build a new scheme from whitespace-separated parameter tokens.
    fn create_from_parameters(&self, _params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        Err(Error::NotRemotable(self.name()))
    }
}

impl Clone for Box<dyn Scheme> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Derived per-term state of an initialized scheme.
///
/// Implementations may assume that statistics the scheme did not declare are zero,
/// both in the snapshot and in the arguments.
pub trait Scorer: fmt::Debug + Send + Sync {
    /// Term-dependent contribution for one document.
    fn sumpart(&self, wdf: u32, doclen: u32, unique_terms: u32, wdf_doc_max: u32) -> f64;

    /// Upper bound on [`Scorer::sumpart`] over this shard.
    fn maxpart(&self) -> f64;

    /// Term-independent contribution for one document.
    fn sumextra(&self, _doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        0.0
    }

    /// Upper bound on [`Scorer::sumextra`] over this shard.
    fn maxextra(&self) -> f64 {
        0.0
    }
}

/// A scheme initialized for one term, synonym group or extra score on one shard.
#[derive(Debug)]
pub struct Weight {
    scheme: Box<dyn Scheme>,
    needed: StatFlags,
    scorer: Box<dyn Scorer>,
    max_part: f64,
    max_extra: f64,
}

impl Weight {
    /// Initialize `scheme` for a single term.
    ///
    /// `postlist`, when given, may tighten the shard's wdf bound for the term.
    pub fn initialize_for_term(
        scheme: Box<dyn Scheme>,
        env: &ScoringEnv<'_>,
        term: &str,
        wqf: u32,
        factor: f64,
        postlist: Option<&dyn PostList>,
    ) -> Self {
        let subject = Subject::Term {
            term,
            wqf,
            wdf_bound_hint: postlist.map(|pl| pl.wdf_upper_bound()),
        };
        Self::initialize(scheme, env, factor, subject)
    }

    /// Initialize `scheme` for a synonym group with aggregated term statistics.
    ///
    /// `wdf_upper` bounds the group's summed wdf, usually the merged members'
    /// [`PostList::wdf_upper_bound`].
    pub fn initialize_for_synonym(
        scheme: Box<dyn Scheme>,
        env: &ScoringEnv<'_>,
        factor: f64,
        stats: TermStats,
        wdf_upper: u32,
    ) -> Self {
        Self::initialize(scheme, env, factor, Subject::Synonym { stats, wdf_upper })
    }

    /// Initialize `scheme` for its term-independent contribution only.
    pub fn initialize_for_extra(scheme: Box<dyn Scheme>, env: &ScoringEnv<'_>) -> Self {
        Self::initialize(scheme, env, 0.0, Subject::Extra)
    }

    fn initialize(
        scheme: Box<dyn Scheme>,
        env: &ScoringEnv<'_>,
        factor: f64,
        subject: Subject<'_>,
    ) -> Self {
        let needed = scheme.stats_needed();
        let snapshot = Snapshot::gather(needed, env, factor, subject);
        let scorer = scheme.init(&snapshot);
        let max_part = scorer.maxpart();
        let max_extra = scorer.maxextra();
        debug_assert!(max_part.is_finite() && max_part >= 0.0, "bad maxpart {max_part}");
        debug_assert!(max_extra.is_finite() && max_extra >= 0.0, "bad maxextra {max_extra}");
        tracing::debug!(
            scheme = scheme.name(),
            needed = ?needed,
            factor,
            max_part,
            max_extra,
            "initialized weight"
        );
        Self {
            scheme,
            needed,
            scorer,
            max_part,
            max_extra,
        }
    }

    /// Contribution of this term to one document's score.
    ///
    /// Statistics the scheme did not declare are zeroed before use, and the wdf is
    /// clamped to the document length when both are declared.
    pub fn partial_score(&self, wdf: u32, doclen: u32, unique_terms: u32, wdf_doc_max: u32) -> f64 {
        let mut wdf = self.declared(StatFlags::WDF, wdf);
        let doclen = self.declared(StatFlags::DOC_LENGTH, doclen);
        if self.needed.contains(StatFlags::WDF | StatFlags::DOC_LENGTH) {
            wdf = wdf.min(doclen);
        }
        self.scorer.sumpart(
            wdf,
            doclen,
            self.declared(StatFlags::UNIQUE_TERMS, unique_terms),
            self.declared(StatFlags::WDF_DOC_MAX, wdf_doc_max),
        )
    }

    /// Upper bound on [`Weight::partial_score`] for this shard.
    pub fn max_partial_score(&self) -> f64 {
        self.max_part
    }

    /// Term-independent contribution to one document's score.
    pub fn extra_score(&self, doclen: u32, unique_terms: u32, wdf_doc_max: u32) -> f64 {
        self.scorer.sumextra(
            self.declared(StatFlags::DOC_LENGTH, doclen),
            self.declared(StatFlags::UNIQUE_TERMS, unique_terms),
            self.declared(StatFlags::WDF_DOC_MAX, wdf_doc_max),
        )
    }

    /// Upper bound on [`Weight::extra_score`] for this shard.
    pub fn max_extra_score(&self) -> f64 {
        self.max_extra
    }

    fn declared(&self, flag: StatFlags, value: u32) -> u32 {
        if self.needed.contains(flag) {
            value
        } else {
            0
        }
    }

    /// The frozen declared set.
    pub fn stats_needed(&self) -> StatFlags {
        self.needed
    }

    /// Whether scoring reads the wdf.
    pub fn needs_wdf(&self) -> bool {
        self.needed.contains(StatFlags::WDF)
    }

    /// Whether scoring reads the document length.
    pub fn needs_doclength(&self) -> bool {
        self.needed.contains(StatFlags::DOC_LENGTH)
    }

    /// Whether scoring reads the number of unique terms.
    pub fn needs_unique_terms(&self) -> bool {
        self.needed.contains(StatFlags::UNIQUE_TERMS)
    }

    /// Whether scoring reads the maximum wdf in the document.
    pub fn needs_wdf_doc_max(&self) -> bool {
        self.needed.contains(StatFlags::WDF_DOC_MAX)
    }

    /// True for schemes that never score.
    pub fn is_boolean(&self) -> bool {
        self.scheme.kind() == SchemeKind::Boolean
    }

    /// The configuration this weight was initialized from.
    pub fn scheme(&self) -> &dyn Scheme {
        self.scheme.as_ref()
    }
}

/// Encode a params struct as scheme parameter bytes.
pub(crate) fn encode_params<T: Serialize>(scheme: &str, params: &T) -> Result<Vec<u8>, Error> {
    postcard::to_allocvec(params).map_err(|e| Error::Serialisation {
        scheme: scheme.to_string(),
        reason: e.to_string(),
    })
}

/// Decode scheme parameter bytes, rejecting trailing data.
pub(crate) fn decode_params<T: DeserializeOwned>(scheme: &str, bytes: &[u8]) -> Result<T, Error> {
    let (value, rest) = postcard::take_from_bytes(bytes).map_err(|e| Error::Serialisation {
        scheme: scheme.to_string(),
        reason: e.to_string(),
    })?;
    if !rest.is_empty() {
        return Err(Error::Serialisation {
            scheme: scheme.to_string(),
            reason: format!("{} trailing bytes", rest.len()),
        });
    }
    Ok(value)
}

/// Parse one numeric factory-string parameter.
pub(crate) fn parse_param(scheme: &str, token: &str) -> Result<f64, Error> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::invalid(scheme, format!("parameter {token:?} is not a number")))
}

/// Parse up to `N` optional numeric parameters over `defaults`.
pub(crate) fn parse_params<const N: usize>(
    scheme: &str,
    params: &[&str],
    defaults: [f64; N],
) -> Result<[f64; N], Error> {
    if params.len() > N {
        return Err(Error::invalid(
            scheme,
            format!("expected at most {N} parameters, got {}", params.len()),
        ));
    }
    let mut out = defaults;
    for (slot, token) in out.iter_mut().zip(params) {
        *slot = parse_param(scheme, token)?;
    }
    Ok(out)
}

/// Reject any parameter tokens for schemes that take none.
pub(crate) fn no_params(scheme: &str, params: &[&str]) -> Result<(), Error> {
    if params.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid(scheme, "no parameters expected"))
    }
}

/// Reject any parameter bytes for schemes that encode nothing.
pub(crate) fn no_param_bytes(scheme: &str, bytes: &[u8]) -> Result<(), Error> {
    if bytes.is_empty() {
        Ok(())
    } else {
        Err(Error::Serialisation {
            scheme: scheme.to_string(),
            reason: format!("{} unexpected bytes", bytes.len()),
        })
    }
}
