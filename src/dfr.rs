//! Divergence from Randomness (DFR) schemes.
//!
//! Each model multiplies an information-content factor (how surprising the observed
//! wdf is under a randomness model) by an aftereffect-of-sampling factor (how much
//! one more occurrence adds). Most use "normalization 2" for the wdf:
//!
//! ```text
//! wdfn = wdf · log2(1 + c · avglen / doclen)
//! ```
//!
//! Every bound below is derived from the monotonicity of its formula in `wdfn` and
//! `doclen`, evaluated at the extreme values the shard's bounds allow.
//!
//! Robustness notes:
//! - document lengths are clamped to `>= 1` and term/collection frequencies to `>= 1`
//! - scores are clamped to `>= 0`
//!
//! References:
//! - Amati & van Rijsbergen (2002). "Probabilistic models of information retrieval
//!   based on measuring the divergence from randomness."
//! - Amati (2006). "Frequentist and Bayesian approach to IR" (DLH, DPH).

use crate::stats::{Snapshot, StatFlags};
use crate::weight::{
    decode_params, encode_params, no_param_bytes, no_params, parse_params, Scheme, Scorer,
};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};

/// Parameter shared by the normalization-2 models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DfrParams {
    /// Length-normalization strength, `> 0`.
    pub c: f64,
}

impl Default for DfrParams {
    fn default() -> Self {
        Self { c: 1.0 }
    }
}

impl DfrParams {
    fn validate(&self, scheme: &str) -> Result<(), Error> {
        if self.c > 0.0 && self.c.is_finite() {
            Ok(())
        } else {
            Err(Error::invalid(scheme, "parameter c must be > 0"))
        }
    }
}

/// PL2+ parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pl2PlusParams {
    /// Length-normalization strength, `> 0`.
    pub c: f64,
    /// Pseudo-wdf whose score is added to every match, `> 0`.
    pub delta: f64,
}

impl Default for Pl2PlusParams {
    fn default() -> Self {
        Self { c: 1.0, delta: 0.8 }
    }
}

/// `wdf · log2(1 + c·avglen / len)`.
fn normalise_wdf(wdf: f64, len: f64, c_avlen: f64) -> f64 {
    wdf * (1.0 + c_avlen / len.max(1.0)).log2()
}

/// Largest normalized wdf: the largest wdf in the shortest document that can hold it.
///
/// `w · log2(1 + a/w)` is increasing in `w`, so this dominates every document.
fn wdfn_upper(snap: &Snapshot, c_avlen: f64) -> f64 {
    let wdf_max = f64::from(snap.wdf_upper_bound());
    if wdf_max == 0.0 {
        return 0.0;
    }
    let len = wdf_max.max(f64::from(snap.doclength_lower_bound()));
    normalise_wdf(wdf_max, len, c_avlen)
}

/// Smallest normalized wdf of any match: wdf 1 in the longest document.
fn wdfn_lower(snap: &Snapshot, c_avlen: f64) -> f64 {
    normalise_wdf(1.0, f64::from(snap.doclength_upper_bound()), c_avlen)
}

fn scale(snap: &Snapshot) -> f64 {
    f64::from(snap.wqf()) * snap.factor()
}

/// `scale · wdfn / (wdfn + 1)`: the shape shared by InL2, IfB2 and IneB2.
#[derive(Debug)]
struct SaturatingScorer {
    c_avlen: f64,
    scale: f64,
    upper_bound: f64,
}

impl SaturatingScorer {
    fn new(params: DfrParams, snap: &Snapshot, per_term: f64) -> Self {
        let c_avlen = params.c * snap.average_length();
        let scale = scale(snap) * per_term;
        let x = wdfn_upper(snap, c_avlen);
        Self {
            c_avlen,
            scale,
            upper_bound: scale * x / (x + 1.0),
        }
    }
}

impl Scorer for SaturatingScorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 {
            return 0.0;
        }
        let x = normalise_wdf(f64::from(wdf), f64::from(doclen), self.c_avlen);
        self.scale * x / (x + 1.0)
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

/// InL2: inverse document frequency, Laplace aftereffect.
fn inl2_scorer(params: DfrParams, snap: &Snapshot) -> SaturatingScorer {
    let n = f64::from(snap.collection_size());
    let tf = f64::from(snap.termfreq());
    let idf = ((n + 1.0) / (tf + 0.5)).log2().max(0.0);
    SaturatingScorer::new(params, snap, idf)
}

/// IfB2: inverse term frequency, Bernoulli aftereffect.
fn ifb2_scorer(params: DfrParams, snap: &Snapshot) -> SaturatingScorer {
    let n = f64::from(snap.collection_size());
    let cf = snap.collection_freq() as f64;
    let tf = f64::from(snap.termfreq()).max(1.0);
    let idf = ((n + 1.0) / (cf + 0.5)).log2().max(0.0);
    SaturatingScorer::new(params, snap, idf * (cf + 1.0) / tf)
}

/// IneB2: inverse expected document frequency, Bernoulli aftereffect.
fn ineb2_scorer(params: DfrParams, snap: &Snapshot) -> SaturatingScorer {
    let n = f64::from(snap.collection_size());
    let cf = snap.collection_freq() as f64;
    let tf = f64::from(snap.termfreq()).max(1.0);
    let expected = if n > 0.0 {
        n * (1.0 - ((n - 1.0) / n).powf(cf))
    } else {
        0.0
    };
    let idf = ((n + 1.0) / (expected + 0.5)).log2().max(0.0);
    SaturatingScorer::new(params, snap, idf * (cf + 1.0) / tf)
}

/// BB2: Bose-Einstein randomness model with Stirling's approximation of the
/// binomial coefficients, Bernoulli aftereffect.
#[derive(Debug)]
struct Bb2Scorer {
    c_avlen: f64,
    n: f64,
    cf: f64,
    scale: f64,
    base: f64,
    stirling_1: f64,
    stirling_2: f64,
    upper_bound: f64,
}

fn stirling_value(difference: f64, y: f64, constant: f64) -> f64 {
    (y + 0.5) * (constant - y.log2()) + difference * constant
}

impl Bb2Scorer {
    fn new(params: DfrParams, snap: &Snapshot) -> Self {
        let c_avlen = params.c * snap.average_length();
        // Keep every log argument >= 1.
        let n = f64::from(snap.collection_size()).max(2.0);
        let cf = (snap.collection_freq() as f64).max(1.0);
        let tf = f64::from(snap.termfreq()).max(1.0);
        let mut scorer = Self {
            c_avlen,
            n,
            cf,
            scale: scale(snap) * (cf + 1.0) / tf,
            base: -1.0 / LN_2 - (n - 1.0).log2(),
            stirling_1: (n + cf - 1.0).log2(),
            stirling_2: cf.log2(),
            upper_bound: 0.0,
        };
        if scorer.scale > 0.0 && snap.wdf_upper_bound() > 0 {
            let x_hi = scorer.clamp_wdfn(wdfn_upper(snap, c_avlen));
            let x_lo = scorer.clamp_wdfn(wdfn_lower(snap, c_avlen));
            // The Stirling difference grows with wdfn while 1/(wdfn+1) shrinks.
            scorer.upper_bound =
                scorer.scale / (x_lo + 1.0) * (scorer.base + scorer.stirling(x_hi)).max(0.0);
        }
        scorer
    }

    /// The model is only defined for `wdfn <= F - 1`.
    fn clamp_wdfn(&self, x: f64) -> f64 {
        x.min(self.cf - 1.0).max(0.0)
    }

    fn stirling(&self, x: f64) -> f64 {
        let y1 = self.n + self.cf - x - 2.0;
        let y2 = self.cf - x;
        stirling_value(x + 1.0, y1, self.stirling_1) - stirling_value(x, y2, self.stirling_2)
    }
}

impl Scorer for Bb2Scorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || self.scale == 0.0 {
            return 0.0;
        }
        let x = self.clamp_wdfn(normalise_wdf(
            f64::from(wdf),
            f64::from(doclen),
            self.c_avlen,
        ));
        (self.scale / (x + 1.0) * (self.base + self.stirling(x))).max(0.0)
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

/// PL2 and PL2+: Poisson randomness model, Laplace aftereffect.
#[derive(Debug)]
struct Pl2Scorer {
    c_avlen: f64,
    scale: f64,
    p1: f64,
    p2: f64,
    /// Score of a pseudo-wdf `delta` (PL2+), otherwise 0.
    dw: f64,
    upper_bound: f64,
}

impl Pl2Scorer {
    fn new(c: f64, delta: Option<f64>, snap: &Snapshot) -> Self {
        let c_avlen = c * snap.average_length();
        let n = f64::from(snap.collection_size()).max(1.0);
        let cf = (snap.collection_freq() as f64).max(1.0);
        let mean = cf / n;
        let mut scorer = Self {
            c_avlen,
            scale: scale(snap),
            p1: mean / LN_2 + 0.5 * (2.0 * PI).log2(),
            p2: mean.log2() + 1.0 / LN_2,
            dw: 0.0,
            upper_bound: 0.0,
        };
        if let Some(delta) = delta {
            scorer.dw = scorer.per_wdfn(delta).max(0.0);
        }

        let x_hi = wdfn_upper(snap, c_avlen);
        if scorer.scale > 0.0 && x_hi > 0.0 {
            let x_lo = wdfn_lower(snap, c_avlen);
            let p2_term = if scorer.p2 >= 0.0 {
                x_lo / (x_lo + 1.0)
            } else {
                x_hi / (x_hi + 1.0)
            };
            let bound = scorer.p1 / (x_lo + 1.0) + x_hi.log2().max(0.0) - scorer.p2 * p2_term;
            scorer.upper_bound = scorer.scale * (bound.max(0.0) + scorer.dw);
        }
        scorer
    }

    /// `(P1 + (x + 0.5)·log2(x) − P2·x) / (x + 1)`.
    fn per_wdfn(&self, x: f64) -> f64 {
        (self.p1 + (x + 0.5) * x.log2() - self.p2 * x) / (x + 1.0)
    }
}

impl Scorer for Pl2Scorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || self.scale == 0.0 {
            return 0.0;
        }
        let x = normalise_wdf(f64::from(wdf), f64::from(doclen), self.c_avlen);
        if x <= 0.0 || !x.is_finite() {
            return 0.0;
        }
        (self.scale * (self.per_wdfn(x) + self.dw)).max(0.0)
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

fn pl2_scorer(params: DfrParams, snap: &Snapshot) -> Pl2Scorer {
    Pl2Scorer::new(params.c, None, snap)
}

/// Which hypergeometric approximation to score with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hypergeometric {
    Dlh,
    Dph,
}

/// DLH and DPH: parameter-free hypergeometric models.
#[derive(Debug)]
struct HypergeometricScorer {
    model: Hypergeometric,
    scale: f64,
    /// `total_length / collection_freq`.
    log_constant: f64,
    upper_bound: f64,
}

impl HypergeometricScorer {
    fn new(model: Hypergeometric, snap: &Snapshot) -> Self {
        let cf = (snap.collection_freq() as f64).max(1.0);
        let mut scorer = Self {
            model,
            scale: scale(snap),
            log_constant: snap.total_length() as f64 / cf,
            upper_bound: 0.0,
        };
        let wdf_max = f64::from(snap.wdf_upper_bound());
        if scorer.scale > 0.0 && wdf_max > 0.0 {
            let len_min = f64::from(snap.doclength_lower_bound()).max(1.0);
            let len_max = f64::from(snap.doclength_upper_bound());
            let f_max = (wdf_max / len_min).min(1.0);
            let info = (f_max * scorer.log_constant).log2().max(0.0);
            // wdf·(1 − wdf/len) peaks at len/4.
            let spread = (0.5 * (2.0 * PI * wdf_max.min(len_max / 4.0)).log2()).max(0.0);
            let divisor = match model {
                Hypergeometric::Dlh => 1.5,
                Hypergeometric::Dph => 2.0,
            };
            scorer.upper_bound = scorer.scale * (info + spread / divisor);
        }
        scorer
    }
}

impl Scorer for HypergeometricScorer {
    fn sumpart(&self, wdf: u32, doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        if wdf == 0 || wdf >= doclen || self.scale == 0.0 {
            return 0.0;
        }
        let w = f64::from(wdf);
        let l = f64::from(doclen);
        let f = w / l;
        let spread = 0.5 * (2.0 * PI * w * (1.0 - f)).log2();
        let v = match self.model {
            Hypergeometric::Dlh => {
                (w * (f * self.log_constant).log2() + (l - w) * (1.0 - f).log2() + spread)
                    / (w + 0.5)
            }
            Hypergeometric::Dph => {
                let norm = (1.0 - f) * (1.0 - f) / (w + 1.0);
                norm * (w * (f * self.log_constant).log2() + spread)
            }
        };
        (self.scale * v).max(0.0)
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

macro_rules! c_param_scheme {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $scorer:path, $stats:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $ty {
            params: DfrParams,
        }

        impl Default for $ty {
            fn default() -> Self {
                Self {
                    params: DfrParams::default(),
                }
            }
        }

        impl $ty {
            /// Create with normalization parameter `c`, which must be `> 0`.
            pub fn new(c: f64) -> Result<Self, Error> {
                let params = DfrParams { c };
                params.validate($name)?;
                Ok(Self { params })
            }

            /// Effective parameters.
            pub fn params(&self) -> DfrParams {
                self.params
            }
        }

        impl Scheme for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn stats_needed(&self) -> StatFlags {
                $stats
            }
            fn clone_box(&self) -> Box<dyn Scheme> {
                Box::new(*self)
            }
            fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
                Box::new($scorer(self.params, snapshot))
            }
            fn serialise(&self) -> Result<Vec<u8>, Error> {
                encode_params($name, &self.params)
            }
            fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
                let params: DfrParams = decode_params($name, params)?;
                Ok(Box::new(Self::new(params.c)?))
            }
            fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
                let [c] = parse_params($name, params, [DfrParams::default().c])?;
                Ok(Box::new(Self::new(c)?))
            }
        }
    };
}

fn normalization2_stats() -> StatFlags {
    StatFlags::AVERAGE_LENGTH
        | StatFlags::DOC_LENGTH
        | StatFlags::DOC_LENGTH_MIN
        | StatFlags::COLLECTION_SIZE
        | StatFlags::WDF
        | StatFlags::WDF_MAX
        | StatFlags::WQF
}

c_param_scheme!(
    /// InL2 (`"inl2"`).
    InL2Weight,
    "inl2",
    inl2_scorer,
    normalization2_stats() | StatFlags::TERMFREQ
);

c_param_scheme!(
    /// IfB2 (`"ifb2"`).
    IfB2Weight,
    "ifb2",
    ifb2_scorer,
    normalization2_stats() | StatFlags::TERMFREQ | StatFlags::COLLECTION_FREQ
);

c_param_scheme!(
    /// IneB2 (`"ineb2"`).
    IneB2Weight,
    "ineb2",
    ineb2_scorer,
    normalization2_stats() | StatFlags::TERMFREQ | StatFlags::COLLECTION_FREQ
);

c_param_scheme!(
    /// BB2 (`"bb2"`).
    Bb2Weight,
    "bb2",
    Bb2Scorer::new,
    normalization2_stats()
        | StatFlags::TERMFREQ
        | StatFlags::COLLECTION_FREQ
        | StatFlags::DOC_LENGTH_MAX
);

c_param_scheme!(
    /// PL2 (`"pl2"`).
    Pl2Weight,
    "pl2",
    pl2_scorer,
    normalization2_stats() | StatFlags::COLLECTION_FREQ | StatFlags::DOC_LENGTH_MAX
);

/// PL2+ (`"pl2+"`): PL2 with the score of a pseudo-wdf `delta` added to each match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pl2PlusWeight {
    params: Pl2PlusParams,
}

impl Default for Pl2PlusWeight {
    fn default() -> Self {
        Self {
            params: Pl2PlusParams::default(),
        }
    }
}

impl Pl2PlusWeight {
    /// Create with `c > 0` and `delta > 0`.
    pub fn new(c: f64, delta: f64) -> Result<Self, Error> {
        DfrParams { c }.validate("pl2+")?;
        if !(delta > 0.0 && delta.is_finite()) {
            return Err(Error::invalid("pl2+", "parameter delta must be > 0"));
        }
        Ok(Self {
            params: Pl2PlusParams { c, delta },
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> Pl2PlusParams {
        self.params
    }
}

impl Scheme for Pl2PlusWeight {
    fn name(&self) -> &'static str {
        "pl2+"
    }
    fn stats_needed(&self) -> StatFlags {
        normalization2_stats() | StatFlags::COLLECTION_FREQ | StatFlags::DOC_LENGTH_MAX
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(Pl2Scorer::new(
            self.params.c,
            Some(self.params.delta),
            snapshot,
        ))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let p: Pl2PlusParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(p.c, p.delta)?))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let d = Pl2PlusParams::default();
        let [c, delta] = parse_params(self.name(), params, [d.c, d.delta])?;
        Ok(Box::new(Self::new(c, delta)?))
    }
}

fn hypergeometric_stats() -> StatFlags {
    StatFlags::DOC_LENGTH
        | StatFlags::DOC_LENGTH_MIN
        | StatFlags::DOC_LENGTH_MAX
        | StatFlags::COLLECTION_FREQ
        | StatFlags::TOTAL_LENGTH
        | StatFlags::WDF
        | StatFlags::WDF_MAX
        | StatFlags::WQF
}

/// DLH (`"dlh"`): parameter-free hypergeometric model with Laplace normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DlhWeight;

/// DPH (`"dph"`): parameter-free hypergeometric model with Popper normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DphWeight;

impl Scheme for DlhWeight {
    fn name(&self) -> &'static str {
        "dlh"
    }
    fn stats_needed(&self) -> StatFlags {
        hypergeometric_stats()
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(HypergeometricScorer::new(Hypergeometric::Dlh, snapshot))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        no_param_bytes(self.name(), params)?;
        Ok(Box::new(DlhWeight))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        no_params(self.name(), params)?;
        Ok(Box::new(DlhWeight))
    }
}

impl Scheme for DphWeight {
    fn name(&self) -> &'static str {
        "dph"
    }
    fn stats_needed(&self) -> StatFlags {
        hypergeometric_stats()
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(HypergeometricScorer::new(Hypergeometric::Dph, snapshot))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        no_param_bytes(self.name(), params)?;
        Ok(Box::new(DphWeight))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        no_params(self.name(), params)?;
        Ok(Box::new(DphWeight))
    }
}
