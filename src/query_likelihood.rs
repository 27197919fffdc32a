//! Query likelihood language models.
//!
//! Ranks documents by \(\log P(Q|D)\): the log-probability that a smoothed document language
//! model generated the query (Ponte & Croft, 1998). Each smoothing method is rearranged into:
//!
//! - a term-dependent part, `ln(1 + p_ml-ish / (α_d · p_c))`, which is zero for non-matching
//!   documents and positive otherwise
//! - a term-independent extra, `|Q| · ln α_d`, plus a constant offset chosen so the extra is
//!   never negative for documents no longer than the database's longest
//!
//! Dropping the query-constant `Σ ln p_c` keeps the ranking unchanged.
//!
//! References:
//! - Zhai & Lafferty (2004). "A study of smoothing methods for language models applied to
//!   information retrieval."
//! - Lv & Zhai (2011). "Lower-bounding term frequency normalization" (Dir+).

use crate::stats::{Snapshot, StatFlags};
use crate::weight::{decode_params, encode_params, parse_params, Scheme, Scorer};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Query-term scale: `wqf · factor`.
fn scale(snap: &Snapshot) -> f64 {
    f64::from(snap.wqf()) * snap.factor()
}

/// Collection probability of the term, `cf / total_length`, when both are known.
fn collection_probability(snap: &Snapshot) -> Option<f64> {
    let cf = snap.collection_freq() as f64;
    let total = snap.total_length() as f64;
    (cf > 0.0 && total > 0.0).then(|| cf / total)
}

fn common_stats() -> StatFlags {
    StatFlags::DOC_LENGTH
        | StatFlags::DOC_LENGTH_MIN
        | StatFlags::COLLECTION_FREQ
        | StatFlags::TOTAL_LENGTH
        | StatFlags::WDF
        | StatFlags::WDF_MAX
        | StatFlags::WQF
}

/// Jelinek-Mercer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmJmParams {
    /// Weight of the collection model. Values outside `(0, 1)` select a
    /// query-length-dependent default.
    pub lambda: f64,
}

impl Default for LmJmParams {
    fn default() -> Self {
        Self { lambda: 0.0 }
    }
}

impl LmJmParams {
    fn is_dynamic(&self) -> bool {
        !(self.lambda > 0.0 && self.lambda < 1.0)
    }

    /// The smoothing weight actually used for a query of `query_length` terms.
    pub fn effective_lambda(&self, query_length: u32) -> f64 {
        if self.is_dynamic() {
            ((f64::from(query_length) - 1.0) / 10.0).clamp(0.1, 0.7)
        } else {
            self.lambda
        }
    }
}

/// Jelinek-Mercer smoothing (`"lmjm"`): linear interpolation with the collection model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LmJmWeight {
    params: LmJmParams,
}

impl LmJmWeight {
    /// Create with `lambda` (any finite value; see [`LmJmParams::lambda`]).
    pub fn new(lambda: f64) -> Result<Self, Error> {
        if !lambda.is_finite() {
            return Err(Error::invalid("lmjm", "lambda must be finite"));
        }
        Ok(Self {
            params: LmJmParams { lambda },
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> LmJmParams {
        self.params
    }
}

#[derive(Debug)]
struct LmJmScorer {
    scale: f64,
    multiplier: f64,
    upper_bound: f64,
}

impl Scorer for LmJmScorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 {
            return 0.0;
        }
        let p_ml = f64::from(wdf) / f64::from(doclen.max(1));
        self.scale * (1.0 + self.multiplier * p_ml).ln()
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

impl Scheme for LmJmWeight {
    fn name(&self) -> &'static str {
        "lmjm"
    }

    fn stats_needed(&self) -> StatFlags {
        let mut need = common_stats();
        if self.params.is_dynamic() {
            need.need(StatFlags::QUERY_LENGTH);
        }
        need
    }

    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }

    fn init(&self, snap: &Snapshot) -> Box<dyn Scorer> {
        let lambda = self.params.effective_lambda(snap.query_length());
        let scale = scale(snap);
        let multiplier =
            collection_probability(snap).map_or(0.0, |p_c| (1.0 - lambda) / (lambda * p_c));

        let wdf_max = f64::from(snap.wdf_upper_bound());
        let max_ratio = (wdf_max / f64::from(snap.doclength_lower_bound().max(1))).min(1.0);
        Box::new(LmJmScorer {
            scale,
            multiplier,
            upper_bound: scale * (1.0 + multiplier * max_ratio).ln(),
        })
    }

    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }

    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let p: LmJmParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(p.lambda)?))
    }

    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let [lambda] = parse_params(self.name(), params, [LmJmParams::default().lambda])?;
        Ok(Box::new(Self::new(lambda)?))
    }
}

/// Dirichlet prior parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmDirichletParams {
    /// Prior strength, `> 0`.
    pub mu: f64,
    /// Dir+ lower-bounding pseudo-count, `>= 0` (0 disables it).
    pub delta: f64,
}

impl Default for LmDirichletParams {
    fn default() -> Self {
        Self {
            mu: 2000.0,
            delta: 0.05,
        }
    }
}

/// Dirichlet prior smoothing (`"lmdirichlet"`), with the Dir+ lower bound when `delta > 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LmDirichletWeight {
    params: LmDirichletParams,
}

impl LmDirichletWeight {
    /// Create with `mu > 0` and `delta >= 0`.
    pub fn new(mu: f64, delta: f64) -> Result<Self, Error> {
        if !(mu > 0.0 && mu.is_finite()) {
            return Err(Error::invalid("lmdirichlet", "mu must be > 0"));
        }
        if !(delta >= 0.0 && delta.is_finite()) {
            return Err(Error::invalid("lmdirichlet", "delta must be >= 0"));
        }
        Ok(Self {
            params: LmDirichletParams { mu, delta },
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> LmDirichletParams {
        self.params
    }
}

#[derive(Debug)]
struct LmDirichletScorer {
    mu: f64,
    scale: f64,
    /// `total_length / (mu · cf)`, or 0 for an unseen term.
    inv_prior: f64,
    plus: f64,
    query_length: f64,
    offset: f64,
    upper_bound: f64,
    upper_extra: f64,
}

impl LmDirichletScorer {
    fn part(&self, wdf: f64) -> f64 {
        self.scale * ((1.0 + wdf * self.inv_prior).ln() + self.plus)
    }

    fn extra(&self, doclen: f64) -> f64 {
        (self.query_length * (self.mu / (doclen + self.mu)).ln() + self.offset).max(0.0)
    }
}

impl Scorer for LmDirichletScorer {
    fn sumpart(&self, wdf: u32, _doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || self.inv_prior == 0.0 {
            return 0.0;
        }
        self.part(f64::from(wdf))
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }

    fn sumextra(&self, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        self.extra(f64::from(doclen))
    }

    fn maxextra(&self) -> f64 {
        self.upper_extra
    }
}

impl Scheme for LmDirichletWeight {
    fn name(&self) -> &'static str {
        "lmdirichlet"
    }

    fn stats_needed(&self) -> StatFlags {
        common_stats() | StatFlags::QUERY_LENGTH | StatFlags::DB_DOC_LENGTH_MAX
    }

    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }

    fn init(&self, snap: &Snapshot) -> Box<dyn Scorer> {
        let LmDirichletParams { mu, delta } = self.params;
        let inv_prior = collection_probability(snap).map_or(0.0, |p_c| 1.0 / (mu * p_c));
        let plus = if delta > 0.0 {
            (1.0 + delta * inv_prior).ln()
        } else {
            0.0
        };
        let query_length = f64::from(snap.query_length());
        let db_max = f64::from(snap.db_doclength_upper_bound());
        let mut scorer = LmDirichletScorer {
            mu,
            scale: scale(snap),
            inv_prior,
            plus,
            query_length,
            offset: query_length * ((db_max + mu) / mu).ln(),
            upper_bound: 0.0,
            upper_extra: 0.0,
        };
        let wdf_max = snap.wdf_upper_bound();
        if wdf_max > 0 && inv_prior > 0.0 {
            scorer.upper_bound = scorer.part(f64::from(wdf_max));
        }
        scorer.upper_extra = scorer.extra(f64::from(snap.doclength_lower_bound()));
        Box::new(scorer)
    }

    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }

    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let p: LmDirichletParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(p.mu, p.delta)?))
    }

    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let d = LmDirichletParams::default();
        let [mu, delta] = parse_params(self.name(), params, [d.mu, d.delta])?;
        Ok(Box::new(Self::new(mu, delta)?))
    }
}

/// Absolute-discount parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmAbsDiscountParams {
    /// Amount subtracted from each seen count, in `(0, 1)`.
    pub delta: f64,
}

impl Default for LmAbsDiscountParams {
    fn default() -> Self {
        Self { delta: 0.7 }
    }
}

/// Absolute discounting (`"lmabsdiscount"`): subtract `delta` from every seen count and give
/// the mass to the collection model in proportion to the document's vocabulary size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LmAbsDiscountWeight {
    params: LmAbsDiscountParams,
}

impl LmAbsDiscountWeight {
    /// Create with `0 < delta < 1`.
    pub fn new(delta: f64) -> Result<Self, Error> {
        if !(delta > 0.0 && delta < 1.0) {
            return Err(Error::invalid("lmabsdiscount", "delta must be in (0, 1)"));
        }
        Ok(Self {
            params: LmAbsDiscountParams { delta },
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> LmAbsDiscountParams {
        self.params
    }
}

#[derive(Debug)]
struct LmAbsDiscountScorer {
    delta: f64,
    scale: f64,
    /// `delta · p_c`, or 0 for an unseen term.
    discount_mass: f64,
    query_length: f64,
    offset: f64,
    upper_bound: f64,
    upper_extra: f64,
}

impl LmAbsDiscountScorer {
    fn part(&self, wdf: f64, unique_terms: f64) -> f64 {
        let kept = (wdf - self.delta).max(0.0);
        self.scale * (1.0 + kept / (self.discount_mass * unique_terms.max(1.0))).ln()
    }

    /// `ratio` is the document's `unique_terms / doclen`, capped at 1.
    fn extra(&self, ratio: f64) -> f64 {
        (self.query_length * (self.delta * ratio).ln() + self.offset).max(0.0)
    }
}

fn vocabulary_ratio(unique_terms: f64, doclen: f64) -> f64 {
    (unique_terms.max(1.0) / doclen.max(1.0)).min(1.0)
}

impl Scorer for LmAbsDiscountScorer {
    fn sumpart(&self, wdf: u32, _doclen: u32, unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || self.discount_mass == 0.0 {
            return 0.0;
        }
        self.part(f64::from(wdf), f64::from(unique_terms))
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }

    fn sumextra(&self, doclen: u32, unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        self.extra(vocabulary_ratio(f64::from(unique_terms), f64::from(doclen)))
    }

    fn maxextra(&self) -> f64 {
        self.upper_extra
    }
}

impl Scheme for LmAbsDiscountWeight {
    fn name(&self) -> &'static str {
        "lmabsdiscount"
    }

    fn stats_needed(&self) -> StatFlags {
        common_stats()
            | StatFlags::QUERY_LENGTH
            | StatFlags::UNIQUE_TERMS
            | StatFlags::UNIQUE_TERMS_MIN
            | StatFlags::UNIQUE_TERMS_MAX
            | StatFlags::DB_DOC_LENGTH_MAX
    }

    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }

    fn init(&self, snap: &Snapshot) -> Box<dyn Scorer> {
        let delta = self.params.delta;
        let query_length = f64::from(snap.query_length());
        let db_max = f64::from(snap.db_doclength_upper_bound()).max(1.0);
        let mut scorer = LmAbsDiscountScorer {
            delta,
            scale: scale(snap),
            discount_mass: collection_probability(snap).map_or(0.0, |p_c| delta * p_c),
            query_length,
            offset: query_length * (db_max / delta).ln(),
            upper_bound: 0.0,
            upper_extra: 0.0,
        };
        let wdf_max = snap.wdf_upper_bound();
        if wdf_max > 0 && scorer.discount_mass > 0.0 {
            scorer.upper_bound = scorer.part(
                f64::from(wdf_max),
                f64::from(snap.unique_terms_lower_bound()),
            );
        }
        scorer.upper_extra = scorer.extra(vocabulary_ratio(
            f64::from(snap.unique_terms_upper_bound()),
            f64::from(snap.doclength_lower_bound()),
        ));
        Box::new(scorer)
    }

    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }

    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let p: LmAbsDiscountParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(p.delta)?))
    }

    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let [delta] = parse_params(self.name(), params, [LmAbsDiscountParams::default().delta])?;
        Ok(Box::new(Self::new(delta)?))
    }
}

/// Two-stage smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lm2StageParams {
    /// Jelinek-Mercer weight of the second stage, in `[0, 1)`.
    pub lambda: f64,
    /// Dirichlet prior strength of the first stage, `> 0`.
    pub mu: f64,
}

impl Default for Lm2StageParams {
    fn default() -> Self {
        Self {
            lambda: 0.7,
            mu: 2000.0,
        }
    }
}

/// Two-stage smoothing (`"lm2stage"`): a Dirichlet-smoothed document model, then interpolated
/// with the collection model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lm2StageWeight {
    params: Lm2StageParams,
}

impl Lm2StageWeight {
    /// Create with `0 <= lambda < 1` and `mu > 0`.
    pub fn new(lambda: f64, mu: f64) -> Result<Self, Error> {
        if !(0.0..1.0).contains(&lambda) {
            return Err(Error::invalid("lm2stage", "lambda must be in [0, 1)"));
        }
        if !(mu > 0.0 && mu.is_finite()) {
            return Err(Error::invalid("lm2stage", "mu must be > 0"));
        }
        Ok(Self {
            params: Lm2StageParams { lambda, mu },
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> Lm2StageParams {
        self.params
    }
}

#[derive(Debug)]
struct Lm2StageScorer {
    params: Lm2StageParams,
    scale: f64,
    /// Collection probability, or 0 for an unseen term.
    p_c: f64,
    query_length: f64,
    offset: f64,
    upper_bound: f64,
    upper_extra: f64,
}

impl Lm2StageScorer {
    fn part(&self, wdf: f64, doclen: f64) -> f64 {
        let Lm2StageParams { lambda, mu } = self.params;
        self.scale * (1.0 + (1.0 - lambda) * wdf / ((mu + lambda * doclen) * self.p_c)).ln()
    }

    /// Smoothing mass left for the collection model, `α(doclen)`.
    fn alpha(&self, doclen: f64) -> f64 {
        let Lm2StageParams { lambda, mu } = self.params;
        (1.0 - lambda) * mu / (doclen + mu) + lambda
    }

    fn extra(&self, doclen: f64) -> f64 {
        (self.query_length * self.alpha(doclen).ln() + self.offset).max(0.0)
    }
}

impl Scorer for Lm2StageScorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || self.p_c == 0.0 {
            return 0.0;
        }
        self.part(f64::from(wdf), f64::from(doclen))
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }

    fn sumextra(&self, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        self.extra(f64::from(doclen))
    }

    fn maxextra(&self) -> f64 {
        self.upper_extra
    }
}

impl Scheme for Lm2StageWeight {
    fn name(&self) -> &'static str {
        "lm2stage"
    }

    fn stats_needed(&self) -> StatFlags {
        common_stats() | StatFlags::QUERY_LENGTH | StatFlags::DB_DOC_LENGTH_MAX
    }

    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }

    fn init(&self, snap: &Snapshot) -> Box<dyn Scorer> {
        let query_length = f64::from(snap.query_length());
        let mut scorer = Lm2StageScorer {
            params: self.params,
            scale: scale(snap),
            p_c: collection_probability(snap).unwrap_or(0.0),
            query_length,
            offset: 0.0,
            upper_bound: 0.0,
            upper_extra: 0.0,
        };
        scorer.offset =
            -query_length * scorer.alpha(f64::from(snap.db_doclength_upper_bound())).ln();

        let wdf_max = snap.wdf_upper_bound();
        if wdf_max > 0 && scorer.p_c > 0.0 {
            // Shortest document that can hold wdf_max occurrences.
            let len = wdf_max.max(snap.doclength_lower_bound());
            scorer.upper_bound = scorer.part(f64::from(wdf_max), f64::from(len));
        }
        scorer.upper_extra = scorer.extra(f64::from(snap.doclength_lower_bound()));
        Box::new(scorer)
    }

    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }

    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let p: Lm2StageParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(p.lambda, p.mu)?))
    }

    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let d = Lm2StageParams::default();
        let [lambda, mu] = parse_params(self.name(), params, [d.lambda, d.mu])?;
        Ok(Box::new(Self::new(lambda, mu)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CollectionStats, ScoringEnv, ShardSummary, TermStats};
    use crate::Weight;

    fn stats() -> CollectionStats {
        let mut s = CollectionStats::new();
        s.collection_size = 200;
        s.total_length = 200 * 60;
        s.db_doclength_lower = 3;
        s.db_doclength_upper = 500;
        s.with_term(
            "t",
            TermStats {
                termfreq: 30,
                reltermfreq: 0,
                collection_freq: 75,
            },
        )
    }

    fn shard() -> ShardSummary {
        ShardSummary {
            doclength_lower: 3,
            doclength_upper: 500,
            unique_terms_lower: 2,
            unique_terms_upper: 240,
            wdf_upper: 20,
        }
    }

    fn all() -> Vec<Box<dyn Scheme>> {
        vec![
            Box::new(LmJmWeight::default()),
            Box::new(LmJmWeight::new(0.3).unwrap()),
            Box::new(LmDirichletWeight::default()),
            Box::new(LmDirichletWeight::new(500.0, 0.0).unwrap()),
            Box::new(LmAbsDiscountWeight::default()),
            Box::new(Lm2StageWeight::default()),
        ]
    }

    #[test]
    fn parts_and_extras_are_bounded() {
        let s = stats();
        let sh = shard();
        let env = ScoringEnv::new(&s, &sh, 3);
        for scheme in all() {
            let name = scheme.name();
            let part = Weight::initialize_for_term(scheme.clone(), &env, "t", 1, 1.0, None);
            let extra = Weight::initialize_for_extra(scheme, &env);
            for len in [3u32, 4, 10, 20, 60, 200, 500] {
                for uniq in [2u32, 3, 10, 60, 240] {
                    if uniq > len {
                        continue;
                    }
                    let e = extra.extra_score(len, uniq, 0);
                    assert!(e >= 0.0, "{name}: extra {e}");
                    assert!(e <= extra.max_extra_score() * (1.0 + 1e-12), "{name}: extra {e}");
                    for wdf in 1..=20u32.min(len) {
                        let p = part.partial_score(wdf, len, uniq, 0);
                        assert!(p >= 0.0, "{name}: part {p}");
                        assert!(
                            p <= part.max_partial_score() * (1.0 + 1e-12),
                            "{name}: part {p} > {}",
                            part.max_partial_score()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn jm_lambda_follows_query_length_when_out_of_range() {
        let p = LmJmParams::default();
        assert_eq!(p.effective_lambda(1), 0.1);
        assert!((p.effective_lambda(5) - 0.4).abs() < 1e-12);
        assert_eq!(p.effective_lambda(30), 0.7);
        assert_eq!(LmJmParams { lambda: 0.25 }.effective_lambda(30), 0.25);
        assert!(LmJmWeight::default()
            .stats_needed()
            .contains(StatFlags::QUERY_LENGTH));
        assert!(!LmJmWeight::new(0.5)
            .unwrap()
            .stats_needed()
            .contains(StatFlags::QUERY_LENGTH));
    }

    #[test]
    fn dirichlet_matches_hand_computation() {
        let s = stats();
        let sh = shard();
        let env = ScoringEnv::new(&s, &sh, 2);
        let scheme = LmDirichletWeight::new(1000.0, 0.0).unwrap();
        let w = Weight::initialize_for_term(Box::new(scheme), &env, "t", 1, 1.0, None);
        let p_c: f64 = 75.0 / 12000.0;
        let want = (1.0 + 4.0 / (1000.0 * p_c)).ln();
        assert!((w.partial_score(4, 100, 0, 0) - want).abs() < 1e-12);

        let e = Weight::initialize_for_extra(Box::new(scheme), &env);
        let want = 2.0 * (1000.0f64 / 1100.0).ln() + 2.0 * (1500.0f64 / 1000.0).ln();
        assert!((e.extra_score(100, 0, 0) - want).abs() < 1e-12);
        // The longest document in the database gets exactly zero.
        assert!(e.extra_score(500, 0, 0).abs() < 1e-12);
    }

    #[test]
    fn dir_plus_rewards_any_match() {
        let s = stats();
        let sh = shard();
        let env = ScoringEnv::new(&s, &sh, 1);
        let plain = Weight::initialize_for_term(
            Box::new(LmDirichletWeight::new(2000.0, 0.0).unwrap()),
            &env,
            "t",
            1,
            1.0,
            None,
        );
        let plus =
            Weight::initialize_for_term(Box::new(LmDirichletWeight::default()), &env, "t", 1, 1.0, None);
        assert!(plus.partial_score(1, 400, 0, 0) > plain.partial_score(1, 400, 0, 0));
    }

    #[test]
    fn two_stage_without_interpolation_is_dirichlet() {
        let s = stats();
        let sh = shard();
        let env = ScoringEnv::new(&s, &sh, 2);
        let two = Weight::initialize_for_term(
            Box::new(Lm2StageWeight::new(0.0, 800.0).unwrap()),
            &env,
            "t",
            1,
            1.0,
            None,
        );
        let dir = Weight::initialize_for_term(
            Box::new(LmDirichletWeight::new(800.0, 0.0).unwrap()),
            &env,
            "t",
            1,
            1.0,
            None,
        );
        for (wdf, len) in [(1, 10), (3, 40), (7, 300)] {
            let a = two.partial_score(wdf, len, 0, 0);
            let b = dir.partial_score(wdf, len, 0, 0);
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn unseen_terms_score_zero() {
        let s = stats();
        let sh = shard();
        let env = ScoringEnv::new(&s, &sh, 1);
        for scheme in all() {
            let w = Weight::initialize_for_term(scheme, &env, "absent", 1, 1.0, None);
            assert_eq!(w.partial_score(2, 10, 5, 0), 0.0);
            assert_eq!(w.max_partial_score(), 0.0);
        }
    }

    #[test]
    fn parameters_are_validated() {
        assert!(LmDirichletWeight::new(0.0, 0.1).is_err());
        assert!(LmDirichletWeight::new(10.0, -0.1).is_err());
        assert!(LmAbsDiscountWeight::new(1.0).is_err());
        assert!(LmAbsDiscountWeight::new(0.0).is_err());
        assert!(Lm2StageWeight::new(1.0, 10.0).is_err());
        assert!(Lm2StageWeight::new(0.5, 0.0).is_err());
        assert!(LmJmWeight::default().create_from_parameters(&["0.4"]).is_ok());
        assert!(LmJmWeight::default()
            .create_from_parameters(&["0.4", "1"])
            .is_err());
        assert!(Lm2StageWeight::default()
            .create_from_parameters(&["0.2", "900"])
            .is_ok());
    }
}
