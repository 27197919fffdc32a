//! Okapi BM25 and BM25+.
//!
//! Score for one term in one document:
//!
//! ```text
//! idf · qtf · (k1 + 1)·wdf / (k1·(b·L + 1 − b) + wdf)          (BM25)
//! idf · qtf · ((k1 + 1)·wdf / (k1·(b·L + 1 − b) + wdf) + δ)    (BM25+)
//! ```
//!
//! where `L = max(doclen / avglen, min_normlen)` and `qtf = (k3 + 1)·wqf / (k3 + wqf)`.
//! A nonzero `k2` adds the term-independent length correction
//! `2·k2·query_length / (1 + L)`.
//!
//! Only the statistics the nonzero parameters need are requested: with `k1·b = 0`
//! and `k2 = 0` the document length is never fetched.
//!
//! References:
//! - Robertson & Walker (1994). "Some simple effective approximations to the 2-Poisson model..."
//! - Robertson & Zaragoza (2009). "The Probabilistic Relevance Framework: BM25 and Beyond."
//! - Lv & Zhai (2011). "Lower-bounding term frequency normalization."

use crate::stats::{Snapshot, StatFlags};
use crate::weight::{decode_params, encode_params, parse_params, Scheme, Scorer};
use crate::Error;
use serde::{Deserialize, Serialize};

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document-length correction weight (term-independent).
    pub k2: f64,
    /// Within-query-frequency saturation.
    pub k3: f64,
    /// Length normalization strength, in `[0, 1]`.
    pub b: f64,
    /// Floor on the normalized document length.
    pub min_normlen: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.0,
            k2: 0.0,
            k3: 1.0,
            b: 0.5,
            min_normlen: 0.5,
        }
    }
}

impl Bm25Params {
    /// Clamp into the valid domain: `k* >= 0`, `b` in `[0, 1]`, `min_normlen >= 0`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            k1: self.k1.max(0.0),
            k2: self.k2.max(0.0),
            k3: self.k3.max(0.0),
            b: self.b.max(0.0).min(1.0),
            min_normlen: self.min_normlen.max(0.0),
        }
    }

    fn stats_needed(&self) -> StatFlags {
        let mut need = StatFlags::COLLECTION_SIZE
            | StatFlags::RSET_SIZE
            | StatFlags::TERMFREQ
            | StatFlags::RELTERMFREQ
            | StatFlags::WDF
            | StatFlags::WDF_MAX;
        let length_normalized = self.k1 != 0.0 && self.b != 0.0;
        if self.k2 != 0.0 || length_normalized {
            need.need(StatFlags::DOC_LENGTH_MIN | StatFlags::AVERAGE_LENGTH);
        }
        if length_normalized {
            need.need(StatFlags::DOC_LENGTH);
        }
        if self.k2 != 0.0 {
            need.need(StatFlags::DOC_LENGTH | StatFlags::QUERY_LENGTH);
        }
        if self.k3 != 0.0 {
            need.need(StatFlags::WQF);
        }
        need
    }
}

/// BM25+ parameters: BM25 plus a lower-bound offset `delta` for matching terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25PlusParams {
    /// Shared BM25 parameters.
    pub base: Bm25Params,
    /// Added to the saturated wdf of every matching term.
    pub delta: f64,
}

impl Default for Bm25PlusParams {
    fn default() -> Self {
        Self {
            base: Bm25Params::default(),
            delta: 1.0,
        }
    }
}

impl Bm25PlusParams {
    /// Clamp into the valid domain (`delta >= 0`).
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            base: self.base.clamped(),
            delta: self.delta.max(0.0),
        }
    }
}

/// BM25 weighting scheme (`"bm25"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Weight {
    params: Bm25Params,
    need: StatFlags,
}

impl Default for Bm25Weight {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

impl Bm25Weight {
    /// Create BM25 with `params` (clamped into range).
    pub fn new(params: Bm25Params) -> Self {
        let params = params.clamped();
        Self {
            need: params.stats_needed(),
            params,
        }
    }

    /// Effective parameters.
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}

/// BM25+ weighting scheme (`"bm25+"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25PlusWeight {
    params: Bm25PlusParams,
    need: StatFlags,
}

impl Default for Bm25PlusWeight {
    fn default() -> Self {
        Self::new(Bm25PlusParams::default())
    }
}

impl Bm25PlusWeight {
    /// Create BM25+ with `params` (clamped into range).
    pub fn new(params: Bm25PlusParams) -> Self {
        let params = params.clamped();
        Self {
            need: params.base.stats_needed(),
            params,
        }
    }

    /// Effective parameters.
    pub fn params(&self) -> Bm25PlusParams {
        self.params
    }
}

/// Robertson/Sparck Jones weight when relevance information is present,
/// otherwise the plain probabilistic idf ratio. Returned before taking the log.
fn idf_ratio(snap: &Snapshot, plus: bool) -> f64 {
    let n = f64::from(snap.collection_size());
    let tf = f64::from(snap.termfreq());
    if snap.rset_size() != 0 {
        let r = f64::from(snap.reltermfreq());
        let rset = f64::from(snap.rset_size());
        let tw = ((r + 0.5) * (n - rset - tf + r + 0.5)) / ((rset - r + 0.5) * (tf - r + 0.5));
        floor_ratio(tw)
    } else if plus {
        ((n + 1.0) / tf.max(1.0)).max(1.0)
    } else {
        floor_ratio((n - tf + 0.5) / (tf + 0.5))
    }
}

/// Keep very common terms slightly positive instead of letting the log go negative.
fn floor_ratio(tw: f64) -> f64 {
    let tw = tw.max(0.0);
    if tw < 2.0 {
        tw * 0.5 + 1.0
    } else {
        tw
    }
}

#[derive(Debug)]
struct Bm25Scorer {
    params: Bm25Params,
    /// `None` for BM25, `Some(delta)` for BM25+.
    plus_delta: Option<f64>,
    termweight: f64,
    len_factor: f64,
    query_length: f64,
    wdf_max: f64,
    doclen_min: f64,
}

impl Bm25Scorer {
    fn new(params: Bm25Params, plus_delta: Option<f64>, snap: &Snapshot) -> Self {
        let mut len_factor = snap.average_length();
        if len_factor != 0.0 {
            len_factor = 1.0 / len_factor;
        }
        if params.k2 == 0.0 && (params.b == 0.0 || params.k1 == 0.0) {
            len_factor = 0.0;
        }

        let mut termweight = idf_ratio(snap, plus_delta.is_some()).ln() * snap.factor();
        if params.k3 != 0.0 {
            let wqf = f64::from(snap.wqf());
            termweight *= (params.k3 + 1.0) * wqf / (params.k3 + wqf);
        }
        if plus_delta.is_none() {
            termweight *= params.k1 + 1.0;
        }

        Self {
            params,
            plus_delta,
            termweight,
            len_factor,
            query_length: f64::from(snap.query_length()),
            wdf_max: f64::from(snap.wdf_upper_bound()),
            doclen_min: f64::from(snap.doclength_lower_bound()),
        }
    }

    fn normlen(&self, len: f64) -> f64 {
        (len * self.len_factor).max(self.params.min_normlen)
    }

    /// Saturated wdf in `[0, 1)` (BM25) or `[0, k1 + 1)` (BM25+).
    fn saturate(&self, wdf: f64, denom: f64) -> f64 {
        match self.plus_delta {
            None => wdf / denom,
            Some(delta) => (self.params.k1 + 1.0) * wdf / denom + delta,
        }
    }
}

impl Scorer for Bm25Scorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 {
            return 0.0;
        }
        let p = &self.params;
        let wdf = f64::from(wdf);
        let normlen = self.normlen(f64::from(doclen));
        let denom = p.k1 * (normlen * p.b + (1.0 - p.b)) + wdf;
        self.termweight * self.saturate(wdf, denom)
    }

    fn maxpart(&self) -> f64 {
        if self.wdf_max == 0.0 {
            return 0.0;
        }
        let p = &self.params;
        let mut denom = p.k1;
        if p.k1 != 0.0 && p.b != 0.0 {
            // A document is at least as long as the wdf it contains.
            let normlen_lb = self.normlen(self.wdf_max.max(self.doclen_min));
            denom *= normlen_lb * p.b + (1.0 - p.b);
        }
        denom += self.wdf_max;
        self.termweight * self.saturate(self.wdf_max, denom)
    }

    fn sumextra(&self, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if self.params.k2 == 0.0 {
            return 0.0;
        }
        let num = 2.0 * self.params.k2 * self.query_length;
        num / (1.0 + self.normlen(f64::from(doclen)))
    }

    fn maxextra(&self) -> f64 {
        if self.params.k2 == 0.0 {
            return 0.0;
        }
        let num = 2.0 * self.params.k2 * self.query_length;
        num / (1.0 + self.normlen(self.doclen_min))
    }
}

impl Scheme for Bm25Weight {
    fn name(&self) -> &'static str {
        "bm25"
    }
    fn stats_needed(&self) -> StatFlags {
        self.need
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(Bm25Scorer::new(self.params, None, snapshot))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let params: Bm25Params = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(params)))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let d = Bm25Params::default();
        let [k1, k2, k3, b, min_normlen] =
            parse_params(self.name(), params, [d.k1, d.k2, d.k3, d.b, d.min_normlen])?;
        Ok(Box::new(Self::new(Bm25Params {
            k1,
            k2,
            k3,
            b,
            min_normlen,
        })))
    }
}

impl Scheme for Bm25PlusWeight {
    fn name(&self) -> &'static str {
        "bm25+"
    }
    fn stats_needed(&self) -> StatFlags {
        self.need
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(Bm25Scorer::new(
            self.params.base,
            Some(self.params.delta),
            snapshot,
        ))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let params: Bm25PlusParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(params)))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let d = Bm25PlusParams::default();
        let [k1, k2, k3, b, min_normlen, delta] = parse_params(
            self.name(),
            params,
            [d.base.k1, d.base.k2, d.base.k3, d.base.b, d.base.min_normlen, d.delta],
        )?;
        Ok(Box::new(Self::new(Bm25PlusParams {
            base: Bm25Params {
                k1,
                k2,
                k3,
                b,
                min_normlen,
            },
            delta,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CollectionStats, ScoringEnv, ShardSummary, TermStats};
    use crate::Weight;

    fn collection(n: u32, avg: u64, tf: u32) -> CollectionStats {
        let mut stats = CollectionStats::new();
        stats.collection_size = n;
        stats.total_length = u64::from(n) * avg;
        stats.with_term(
            "t",
            TermStats {
                termfreq: tf,
                reltermfreq: 0,
                collection_freq: u64::from(tf) * 3,
            },
        )
    }

    fn shard() -> ShardSummary {
        ShardSummary {
            doclength_lower: 5,
            doclength_upper: 200,
            unique_terms_lower: 1,
            unique_terms_upper: 150,
            wdf_upper: 20,
        }
    }

    #[test]
    fn default_regression_score_is_reproducible() {
        let stats = collection(1000, 40, 10);
        let sh = shard();
        let env = ScoringEnv::new(&stats, &sh, 1);
        let w = Weight::initialize_for_term(Box::new(Bm25Weight::default()), &env, "t", 1, 1.0, None);

        let tw: f64 = (1000.0 - 10.0 + 0.5) / (10.0 + 0.5);
        let mut termweight = tw.ln() * 1.0;
        termweight *= (1.0 + 1.0) * 1.0 / (1.0 + 1.0);
        termweight *= 1.0 + 1.0;
        let normlen = (50.0 * (1.0 / 40.0_f64)).max(0.5);
        let denom = 1.0 * (normlen * 0.5 + (1.0 - 0.5)) + 3.0;
        let expected = termweight * (3.0 / denom);

        let got = w.partial_score(3, 50, 0, 0);
        assert_eq!(got.to_bits(), expected.to_bits());
        assert!((got - 6.6136).abs() < 1e-3, "got {got}");
        assert_eq!(w.extra_score(50, 0, 0), 0.0);
        assert_eq!(w.max_extra_score(), 0.0);
    }

    #[test]
    fn no_length_stats_when_length_normalization_is_off() {
        let w = Bm25Weight::new(Bm25Params {
            b: 0.0,
            ..Bm25Params::default()
        });
        let need = w.stats_needed();
        assert!(!need.contains(StatFlags::DOC_LENGTH));
        assert!(!need.contains(StatFlags::DOC_LENGTH_MIN));
        assert!(!need.contains(StatFlags::AVERAGE_LENGTH));
        assert!(need.contains(StatFlags::WQF));

        let w = Bm25Weight::new(Bm25Params {
            k1: 0.0,
            k3: 0.0,
            ..Bm25Params::default()
        });
        assert!(!w.stats_needed().contains(StatFlags::DOC_LENGTH));
        assert!(!w.stats_needed().contains(StatFlags::WQF));

        let w = Bm25Weight::new(Bm25Params {
            k2: 1.0,
            b: 0.0,
            ..Bm25Params::default()
        });
        let need = w.stats_needed();
        assert!(need.contains(StatFlags::DOC_LENGTH | StatFlags::QUERY_LENGTH));
        assert!(need.contains(StatFlags::DOC_LENGTH_MIN | StatFlags::AVERAGE_LENGTH));
    }

    #[test]
    fn params_are_clamped() {
        let p = Bm25Weight::new(Bm25Params {
            k1: -1.0,
            k2: -2.0,
            k3: -3.0,
            b: 1.5,
            min_normlen: -0.1,
        })
        .params();
        assert_eq!(p.k1, 0.0);
        assert_eq!(p.k2, 0.0);
        assert_eq!(p.k3, 0.0);
        assert_eq!(p.b, 1.0);
        assert_eq!(p.min_normlen, 0.0);
    }

    #[test]
    fn relevance_feedback_raises_relevant_terms() {
        let mut stats = collection(1000, 40, 10);
        let sh = shard();
        let env = ScoringEnv::new(&stats, &sh, 1);
        let plain = Weight::initialize_for_term(Box::new(Bm25Weight::default()), &env, "t", 1, 1.0, None);

        stats.rset_size = 5;
        stats.set_term(
            "t",
            TermStats {
                termfreq: 10,
                reltermfreq: 4,
                collection_freq: 30,
            },
        );
        let env = ScoringEnv::new(&stats, &sh, 1);
        let fed = Weight::initialize_for_term(Box::new(Bm25Weight::default()), &env, "t", 1, 1.0, None);
        assert!(fed.partial_score(3, 50, 0, 0) > plain.partial_score(3, 50, 0, 0));
    }

    #[test]
    fn k2_extra_is_bounded_and_positive() {
        let stats = collection(100, 40, 10);
        let sh = shard();
        let env = ScoringEnv::new(&stats, &sh, 3);
        let scheme = Bm25Weight::new(Bm25Params {
            k2: 1.0,
            ..Bm25Params::default()
        });
        let w = Weight::initialize_for_extra(Box::new(scheme), &env);
        let max = w.max_extra_score();
        assert!(max > 0.0);
        for len in [5, 6, 40, 200] {
            let e = w.extra_score(len, 0, 0);
            assert!(e > 0.0 && e <= max, "len {len}: {e} > {max}");
        }
    }

    #[test]
    fn bm25_plus_adds_floor_for_matches_only() {
        let stats = collection(1000, 40, 10);
        let sh = shard();
        let env = ScoringEnv::new(&stats, &sh, 1);
        let w = Weight::initialize_for_term(Box::new(Bm25PlusWeight::default()), &env, "t", 1, 1.0, None);
        assert_eq!(w.partial_score(0, 50, 0, 0), 0.0);

        let idf = (1001.0_f64 / 10.0).ln();
        // Very long document: the saturated part tends to zero, delta remains.
        let long = w.partial_score(1, 200, 0, 0);
        assert!(long > idf * 1.0);
        assert!(long <= w.max_partial_score());
    }

    #[test]
    fn bound_dominates_grid() {
        let stats = collection(500, 30, 50);
        let sh = shard();
        let env = ScoringEnv::new(&stats, &sh, 2);
        for scheme in [
            Box::new(Bm25Weight::default()) as Box<dyn Scheme>,
            Box::new(Bm25PlusWeight::default()),
            Box::new(Bm25Weight::new(Bm25Params {
                k1: 2.0,
                b: 0.75,
                ..Bm25Params::default()
            })),
        ] {
            let w = Weight::initialize_for_term(scheme, &env, "t", 2, 1.0, None);
            let max = w.max_partial_score();
            for wdf in 1..=20 {
                for len in [5, 6, 10, 19, 20, 30, 100, 200] {
                    let s = w.partial_score(wdf, len, 0, 0);
                    assert!(s <= max, "{s} > {max} at wdf={wdf} len={len}");
                }
            }
        }
    }

    #[test]
    fn create_from_parameters_parses_in_order() {
        let s = Bm25Weight::default()
            .create_from_parameters(&["1.2", "0", "1", "0.75", "0.5"])
            .unwrap();
        let expected = Bm25Weight::new(Bm25Params {
            k1: 1.2,
            k2: 0.0,
            k3: 1.0,
            b: 0.75,
            min_normlen: 0.5,
        });
        assert_eq!(s.serialise().unwrap(), expected.serialise().unwrap());

        assert!(Bm25Weight::default()
            .create_from_parameters(&["1", "2", "3", "4", "5", "6"])
            .is_err());
        assert!(Bm25PlusWeight::default()
            .create_from_parameters(&["x"])
            .is_err());
    }
}
