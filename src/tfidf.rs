//! TF-IDF with selectable normalizations.
//!
//! The weight of a term in a document is `wdfn · idfn · wqf · factor`, where `wdfn`
//! normalizes the within-document frequency and `idfn` the document frequency.
//! Normalizations can be named in full (`"tfidf LOG TFIDF NONE"`) or by a
//! three-letter SMART code (`"tfidf ltn"`).
//!
//! References:
//! - Spärck Jones (1972): term specificity / IDF motivation.
//! - Salton & Buckley (1988): term-weighting approaches in automatic text retrieval.
//! - Singhal, Buckley & Mitra (1996): pivoted document length normalization.

use crate::stats::{Snapshot, StatFlags};
use crate::weight::{decode_params, encode_params, parse_param, Scheme, Scorer};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Within-document frequency normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WdfNorm {
    /// `wdf`.
    None,
    /// 1 if the term occurs.
    Boolean,
    /// `wdf²`.
    Square,
    /// `1 + ln(wdf)`.
    Log,
    /// `(1 + ln(1 + ln(wdf))) / (1 − s + s·len/avglen) + δ`.
    Pivoted,
    /// `(1 + ln(wdf)) / (1 + ln(len / unique_terms))`.
    LogAverage,
    /// `0.2 + 0.8·ln(1 + wdf)`.
    AugLog,
    /// `sqrt(wdf − 0.5) + 1`.
    Sqrt,
    /// `0.9 + 0.1·wdf / (len / unique_terms)`.
    AugAverage,
    /// `wdf / wdf_doc_max`.
    Max,
    /// `0.5 + 0.5·wdf / wdf_doc_max`.
    Aug,
}

/// Document frequency normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdfNorm {
    /// 1.
    None,
    /// `ln(N / tf)`.
    TfIdf,
    /// `ln(N / tf)²`.
    Square,
    /// `1 / tf`.
    Freq,
    /// `ln((N − tf) / tf)`, floored at 0.
    Prob,
    /// `ln((N + 1) / tf)`.
    Pivoted,
    /// `cf / tf`.
    GlobalFreq,
    /// `ln(cf / tf + 1)`.
    LogGlobalFreq,
    /// `cf / tf + 1`.
    IncrementedGlobalFreq,
    /// `sqrt(cf / tf − 0.9)`.
    SqrtGlobalFreq,
}

/// Final weight normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WtNorm {
    /// `wdfn · idfn`.
    None,
}

impl WdfNorm {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NONE" => Self::None,
            "BOOLEAN" => Self::Boolean,
            "SQUARE" => Self::Square,
            "LOG" => Self::Log,
            "PIVOTED" => Self::Pivoted,
            "LOG_AVERAGE" => Self::LogAverage,
            "AUG_LOG" => Self::AugLog,
            "SQRT" => Self::Sqrt,
            "AUG_AVERAGE" => Self::AugAverage,
            "MAX" => Self::Max,
            "AUG" => Self::Aug,
            _ => return None,
        })
    }

    fn from_code(c: char) -> Option<Self> {
        Some(match c {
            'n' => Self::None,
            'b' => Self::Boolean,
            's' => Self::Square,
            'l' => Self::Log,
            'P' => Self::Pivoted,
            'L' => Self::LogAverage,
            'm' => Self::Max,
            'a' => Self::Aug,
            _ => return None,
        })
    }

    fn stats_needed(self) -> StatFlags {
        let base = StatFlags::WDF | StatFlags::WDF_MAX;
        match self {
            Self::Pivoted => {
                base | StatFlags::DOC_LENGTH | StatFlags::DOC_LENGTH_MIN | StatFlags::AVERAGE_LENGTH
            }
            Self::LogAverage | Self::AugAverage => {
                base | StatFlags::DOC_LENGTH | StatFlags::UNIQUE_TERMS
            }
            Self::Max | Self::Aug => base | StatFlags::WDF_DOC_MAX,
            _ => base,
        }
    }
}

impl IdfNorm {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NONE" => Self::None,
            "TFIDF" => Self::TfIdf,
            "SQUARE" => Self::Square,
            "FREQ" => Self::Freq,
            "PROB" => Self::Prob,
            "PIVOTED" => Self::Pivoted,
            "GLOBAL_FREQ" => Self::GlobalFreq,
            "LOG_GLOBAL_FREQ" => Self::LogGlobalFreq,
            "INCREMENTED_GLOBAL_FREQ" => Self::IncrementedGlobalFreq,
            "SQRT_GLOBAL_FREQ" => Self::SqrtGlobalFreq,
            _ => return None,
        })
    }

    fn from_code(c: char) -> Option<Self> {
        Some(match c {
            'n' => Self::None,
            't' => Self::TfIdf,
            's' => Self::Square,
            'f' => Self::Freq,
            'p' => Self::Prob,
            'P' => Self::Pivoted,
            _ => return None,
        })
    }

    fn stats_needed(self) -> StatFlags {
        match self {
            Self::None => StatFlags::NONE,
            Self::Freq => StatFlags::TERMFREQ,
            Self::TfIdf | Self::Square | Self::Prob | Self::Pivoted => {
                StatFlags::TERMFREQ | StatFlags::COLLECTION_SIZE
            }
            Self::GlobalFreq
            | Self::LogGlobalFreq
            | Self::IncrementedGlobalFreq
            | Self::SqrtGlobalFreq => StatFlags::TERMFREQ | StatFlags::COLLECTION_FREQ,
        }
    }
}

impl WtNorm {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "NONE" => Some(Self::None),
            _ => None,
        }
    }

    fn from_code(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::None),
            _ => None,
        }
    }
}

/// TF-IDF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfIdfParams {
    /// Within-document frequency normalization.
    pub wdf_norm: WdfNorm,
    /// Document frequency normalization.
    pub idf_norm: IdfNorm,
    /// Final weight normalization.
    pub wt_norm: WtNorm,
    /// Pivot slope for [`WdfNorm::Pivoted`], in `(0, 1]`.
    pub slope: f64,
    /// Additive offset for [`WdfNorm::Pivoted`], `> 0`.
    pub delta: f64,
}

impl Default for TfIdfParams {
    fn default() -> Self {
        Self {
            wdf_norm: WdfNorm::None,
            idf_norm: IdfNorm::TfIdf,
            wt_norm: WtNorm::None,
            slope: 0.2,
            delta: 1.0,
        }
    }
}

impl TfIdfParams {
    /// Parameters from a three-letter SMART code such as `"ntn"` or `"Ptn"`.
    pub fn from_code(code: &str) -> Result<Self, Error> {
        let bad = || Error::invalid("tfidf", format!("bad normalization code {code:?}"));
        let mut chars = code.chars();
        let (Some(w), Some(i), Some(t), None) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(bad());
        };
        Ok(Self {
            wdf_norm: WdfNorm::from_code(w).ok_or_else(bad)?,
            idf_norm: IdfNorm::from_code(i).ok_or_else(bad)?,
            wt_norm: WtNorm::from_code(t).ok_or_else(bad)?,
            ..Self::default()
        })
    }

    /// Parameters from full normalization names, e.g. `("LOG", "TFIDF", "NONE")`.
    pub fn from_names(wdf: &str, idf: &str, wt: &str) -> Result<Self, Error> {
        let unknown = |kind: &str, name: &str| {
            Error::invalid("tfidf", format!("unknown {kind} normalization {name:?}"))
        };
        Ok(Self {
            wdf_norm: WdfNorm::from_name(wdf).ok_or_else(|| unknown("wdf", wdf))?,
            idf_norm: IdfNorm::from_name(idf).ok_or_else(|| unknown("idf", idf))?,
            wt_norm: WtNorm::from_name(wt).ok_or_else(|| unknown("wt", wt))?,
            ..Self::default()
        })
    }

    fn validate(&self) -> Result<(), Error> {
        if !(self.slope > 0.0 && self.slope <= 1.0) {
            return Err(Error::invalid("tfidf", "slope must be in (0, 1]"));
        }
        if !(self.delta > 0.0) || !self.delta.is_finite() {
            return Err(Error::invalid("tfidf", "delta must be > 0"));
        }
        Ok(())
    }
}

/// TF-IDF weighting scheme (`"tfidf"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TfIdfWeight {
    params: TfIdfParams,
    need: StatFlags,
}

impl Default for TfIdfWeight {
    fn default() -> Self {
        let params = TfIdfParams::default();
        Self {
            need: Self::stats_for(&params),
            params,
        }
    }
}

impl TfIdfWeight {
    /// Create TF-IDF, rejecting an out-of-range slope or delta.
    pub fn new(params: TfIdfParams) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self {
            need: Self::stats_for(&params),
            params,
        })
    }

    /// Create TF-IDF from a SMART code.
    pub fn from_code(code: &str) -> Result<Self, Error> {
        Self::new(TfIdfParams::from_code(code)?)
    }

    /// Effective parameters.
    pub fn params(&self) -> TfIdfParams {
        self.params
    }

    fn stats_for(params: &TfIdfParams) -> StatFlags {
        StatFlags::WQF | params.wdf_norm.stats_needed() | params.idf_norm.stats_needed()
    }
}

#[derive(Debug)]
struct TfIdfScorer {
    params: TfIdfParams,
    wqf_factor: f64,
    idfn: f64,
    average_length: f64,
    upper_bound: f64,
}

impl TfIdfScorer {
    fn new(params: TfIdfParams, snap: &Snapshot) -> Self {
        let wqf_factor = f64::from(snap.wqf()) * snap.factor();
        let idfn = idfn(
            params.idf_norm,
            f64::from(snap.collection_size()),
            f64::from(snap.termfreq()),
            snap.collection_freq() as f64,
        );
        let mut scorer = Self {
            params,
            wqf_factor,
            idfn,
            average_length: snap.average_length(),
            upper_bound: 0.0,
        };
        let wdfn_max = scorer.wdfn_upper(
            f64::from(snap.wdf_upper_bound()),
            f64::from(snap.doclength_lower_bound()),
        );
        scorer.upper_bound = wdfn_max * idfn * wqf_factor;
        scorer
    }

    /// Ratio of document length to its number of distinct terms, at least 1.
    fn average_wdf(len: f64, unique_terms: f64) -> f64 {
        if unique_terms <= 0.0 {
            return 1.0;
        }
        (len / unique_terms).max(1.0)
    }

    fn pivot(&self, len: f64) -> f64 {
        let normlen = if self.average_length > 0.0 {
            len / self.average_length
        } else {
            1.0
        };
        1.0 - self.params.slope + self.params.slope * normlen
    }

    fn wdfn(&self, wdf: u32, len: u32, unique_terms: u32, wdf_doc_max: u32) -> f64 {
        if wdf == 0 {
            return 0.0;
        }
        let w = f64::from(wdf);
        match self.params.wdf_norm {
            WdfNorm::None => w,
            WdfNorm::Boolean => 1.0,
            WdfNorm::Square => w * w,
            WdfNorm::Log => 1.0 + w.ln(),
            WdfNorm::Pivoted => {
                (1.0 + (1.0 + w.ln()).ln()) / self.pivot(f64::from(len.max(1))) + self.params.delta
            }
            WdfNorm::LogAverage => {
                (1.0 + w.ln())
                    / (1.0 + Self::average_wdf(f64::from(len), f64::from(unique_terms)).ln())
            }
            WdfNorm::AugLog => 0.2 + 0.8 * (1.0 + w).ln(),
            WdfNorm::Sqrt => (w - 0.5).sqrt() + 1.0,
            WdfNorm::AugAverage => {
                0.9 + 0.1 * (w / Self::average_wdf(f64::from(len), f64::from(unique_terms)))
            }
            WdfNorm::Max => w / f64::from(wdf_doc_max.max(wdf)),
            WdfNorm::Aug => 0.5 + 0.5 * w / f64::from(wdf_doc_max.max(wdf)),
        }
    }

    fn wdfn_upper(&self, wdf_max: f64, doclen_min: f64) -> f64 {
        if wdf_max <= 0.0 {
            return 0.0;
        }
        match self.params.wdf_norm {
            WdfNorm::None => wdf_max,
            WdfNorm::Boolean => 1.0,
            WdfNorm::Square => wdf_max * wdf_max,
            WdfNorm::Log | WdfNorm::LogAverage => 1.0 + wdf_max.ln(),
            WdfNorm::Pivoted => {
                (1.0 + (1.0 + wdf_max.ln()).ln()) / self.pivot(doclen_min.max(1.0))
                    + self.params.delta
            }
            WdfNorm::AugLog => 0.2 + 0.8 * (1.0 + wdf_max).ln(),
            WdfNorm::Sqrt => (wdf_max - 0.5).sqrt() + 1.0,
            WdfNorm::AugAverage => 0.9 + 0.1 * wdf_max,
            WdfNorm::Max | WdfNorm::Aug => 1.0,
        }
    }
}

fn idfn(norm: IdfNorm, n: f64, tf: f64, cf: f64) -> f64 {
    let tf = tf.max(1.0);
    let v = match norm {
        IdfNorm::None => 1.0,
        IdfNorm::TfIdf => (n / tf).ln(),
        IdfNorm::Square => (n / tf).ln().powi(2),
        IdfNorm::Freq => 1.0 / tf,
        IdfNorm::Prob => {
            if n <= tf {
                0.0
            } else {
                ((n - tf) / tf).ln()
            }
        }
        IdfNorm::Pivoted => ((n + 1.0) / tf).ln(),
        IdfNorm::GlobalFreq => cf / tf,
        IdfNorm::LogGlobalFreq => (cf / tf + 1.0).ln(),
        IdfNorm::IncrementedGlobalFreq => cf / tf + 1.0,
        IdfNorm::SqrtGlobalFreq => (cf / tf - 0.9).max(0.0).sqrt(),
    };
    // Terms in more than half the collection would otherwise score below absent ones.
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

impl Scorer for TfIdfScorer {
    fn sumpart(&self, wdf: u32, doclen: u32, unique_terms: u32, wdf_doc_max: u32) -> f64 {
        let wdfn = self.wdfn(wdf, doclen, unique_terms, wdf_doc_max);
        match self.params.wt_norm {
            WtNorm::None => wdfn * self.idfn * self.wqf_factor,
        }
    }

    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

impl Scheme for TfIdfWeight {
    fn name(&self) -> &'static str {
        "tfidf"
    }
    fn stats_needed(&self) -> StatFlags {
        self.need
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(TfIdfScorer::new(self.params, snapshot))
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        encode_params(self.name(), &self.params)
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        let params: TfIdfParams = decode_params(self.name(), params)?;
        Ok(Box::new(Self::new(params)?))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let parsed = match params {
            [] => TfIdfParams::default(),
            [code] => TfIdfParams::from_code(code)?,
            [wdf, idf, wt] => TfIdfParams::from_names(wdf, idf, wt)?,
            [wdf, idf, wt, slope, delta] => TfIdfParams {
                slope: parse_param(self.name(), slope)?,
                delta: parse_param(self.name(), delta)?,
                ..TfIdfParams::from_names(wdf, idf, wt)?
            },
            _ => {
                return Err(Error::invalid(
                    self.name(),
                    "expected a code, or wdf idf wt names with optional slope and delta",
                ))
            }
        };
        Ok(Box::new(Self::new(parsed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CollectionStats, ScoringEnv, ShardSummary, TermStats};
    use crate::Weight;

    /// Six documents; the term occurs in two of them, nine times in total.
    fn weight(params: TfIdfParams) -> Weight {
        let mut stats = CollectionStats::new();
        stats.collection_size = 6;
        stats.total_length = 6 * 30;
        stats.set_term(
            "word",
            TermStats {
                termfreq: 2,
                reltermfreq: 0,
                collection_freq: 9,
            },
        );
        let shard = ShardSummary {
            doclength_lower: 10,
            doclength_upper: 120,
            unique_terms_lower: 5,
            unique_terms_upper: 60,
            wdf_upper: 8,
        };
        let env = ScoringEnv::new(&stats, &shard, 1);
        let scheme = TfIdfWeight::new(params).unwrap();
        Weight::initialize_for_term(Box::new(scheme), &env, "word", 1, 1.0, None)
    }

    fn named(wdf: &str, idf: &str) -> Weight {
        weight(TfIdfParams::from_names(wdf, idf, "NONE").unwrap())
    }

    fn assert_close(got: f64, want: f64) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }

    #[test]
    fn default_is_ntn() {
        let w = weight(TfIdfParams::default());
        assert_close(w.partial_score(8, 81, 56, 8), 8.0 * (6.0_f64 / 2.0).ln());
        assert_eq!(TfIdfParams::default(), TfIdfParams::from_code("ntn").unwrap());
    }

    #[test]
    fn idf_normalizations() {
        assert_close(named("NONE", "FREQ").partial_score(8, 81, 56, 8), 8.0 / 2.0);
        assert_close(
            named("NONE", "SQUARE").partial_score(8, 81, 56, 8),
            8.0 * (6.0_f64 / 2.0).ln().powi(2),
        );
        assert_close(
            named("NONE", "PROB").partial_score(8, 81, 56, 8),
            8.0 * ((6.0_f64 - 2.0) / 2.0).ln(),
        );
        assert_close(
            named("NONE", "PIVOTED").partial_score(1, 81, 56, 8),
            (7.0_f64 / 2.0).ln(),
        );
        assert_close(named("NONE", "GLOBAL_FREQ").partial_score(8, 81, 56, 8), 8.0 * (9.0 / 2.0));
        assert_close(
            named("NONE", "LOG_GLOBAL_FREQ").partial_score(8, 81, 56, 8),
            8.0 * (9.0_f64 / 2.0 + 1.0).ln(),
        );
        assert_close(
            named("NONE", "INCREMENTED_GLOBAL_FREQ").partial_score(1, 81, 56, 8),
            9.0 / 2.0 + 1.0,
        );
        assert_close(
            named("NONE", "SQRT_GLOBAL_FREQ").partial_score(8, 81, 56, 8),
            8.0 * (9.0_f64 / 2.0 - 0.9).sqrt(),
        );
    }

    #[test]
    fn wdf_normalizations() {
        assert_close(named("BOOLEAN", "NONE").partial_score(8, 81, 56, 8), 1.0);
        assert_close(named("SQUARE", "NONE").partial_score(8, 81, 56, 8), 64.0);
        assert_close(named("LOG", "NONE").partial_score(8, 81, 56, 8), 1.0 + 8.0_f64.ln());
        assert_close(named("LOG", "NONE").partial_score(1, 31, 26, 4), 1.0);
        assert_close(
            named("LOG_AVERAGE", "NONE").partial_score(8, 81, 56, 8),
            (1.0 + 8.0_f64.ln()) / (1.0 + (81.0_f64 / 56.0).ln()),
        );
        assert_close(
            named("AUG_LOG", "NONE").partial_score(8, 81, 56, 8),
            0.2 + 0.8 * 9.0_f64.ln(),
        );
        assert_close(named("SQRT", "NONE").partial_score(8, 81, 56, 8), 7.5_f64.sqrt() + 1.0);
        assert_close(
            named("AUG_AVERAGE", "NONE").partial_score(8, 81, 56, 8),
            0.9 + 0.1 * (8.0 / (81.0 / 56.0)),
        );
        assert_close(named("MAX", "NONE").partial_score(8, 81, 56, 8), 8.0 / 8.0);
        assert_close(named("MAX", "NONE").partial_score(1, 31, 26, 4), 1.0 / 4.0);
        assert_close(named("AUG", "NONE").partial_score(1, 31, 26, 4), 0.5 + 0.5 * 1.0 / 4.0);
    }

    #[test]
    fn pivoted_prefers_shorter_documents() {
        let w = named("PIVOTED", "NONE");
        assert!(w.partial_score(3, 20, 10, 3) > w.partial_score(3, 60, 10, 3));
        assert!(w.partial_score(8, 10, 5, 8) <= w.max_partial_score());
    }

    #[test]
    fn term_in_every_document_scores_zero() {
        let mut stats = CollectionStats::new();
        stats.collection_size = 50;
        stats.total_length = 500;
        stats.set_term(
            "everywhere",
            TermStats {
                termfreq: 50,
                reltermfreq: 0,
                collection_freq: 300,
            },
        );
        let shard = ShardSummary {
            doclength_lower: 1,
            doclength_upper: 40,
            unique_terms_lower: 1,
            unique_terms_upper: 40,
            wdf_upper: 12,
        };
        let env = ScoringEnv::new(&stats, &shard, 1);
        let scheme = TfIdfWeight::from_code("ntn").unwrap();
        let w = Weight::initialize_for_term(Box::new(scheme), &env, "everywhere", 1, 1.0, None);
        for wdf in [1, 5, 12] {
            assert_eq!(w.partial_score(wdf, 40, 10, wdf), 0.0);
        }
        assert_eq!(w.max_partial_score(), 0.0);
    }

    #[test]
    fn bounds_dominate_scores_for_every_norm() {
        let wdf_norms = [
            "NONE", "BOOLEAN", "SQUARE", "LOG", "PIVOTED", "LOG_AVERAGE", "AUG_LOG", "SQRT",
            "AUG_AVERAGE", "MAX", "AUG",
        ];
        for norm in wdf_norms {
            let w = named(norm, "TFIDF");
            let max = w.max_partial_score();
            for wdf in 1..=8 {
                for (len, uniq) in [(10, 5), (10, 10), (30, 12), (120, 60)] {
                    for wdf_doc_max in [wdf, 8] {
                        let s = w.partial_score(wdf, len, uniq, wdf_doc_max);
                        assert!(s <= max + 1e-12, "{norm}: {s} > {max}");
                    }
                }
            }
        }
    }

    #[test]
    fn factory_accepts_codes_and_names() {
        let proto = TfIdfWeight::default();
        let by_name = proto.create_from_parameters(&["NONE", "TFIDF", "NONE"]).unwrap();
        let by_code = proto.create_from_parameters(&["ntn"]).unwrap();
        assert_eq!(by_name.serialise().unwrap(), by_code.serialise().unwrap());

        let custom = proto
            .create_from_parameters(&["PIVOTED", "PIVOTED", "NONE", "0.5", "2"])
            .unwrap();
        let expected = TfIdfWeight::new(TfIdfParams {
            wdf_norm: WdfNorm::Pivoted,
            idf_norm: IdfNorm::Pivoted,
            wt_norm: WtNorm::None,
            slope: 0.5,
            delta: 2.0,
        })
        .unwrap();
        assert_eq!(custom.serialise().unwrap(), expected.serialise().unwrap());
    }

    #[test]
    fn factory_rejects_bad_input() {
        let proto = TfIdfWeight::default();
        for bad in [
            vec!["FUN", "NONE", "NONE"],
            vec!["NONE", "FUN", "NONE"],
            vec!["NONE", "NONE", "FUN"],
            vec!["NONE"],
            vec!["NONE", "NONE"],
            vec!["xyz"],
            vec!["PIVOTED", "NONE", "NONE", "0", "1"],
            vec!["PIVOTED", "NONE", "NONE", "0.5", "0"],
        ] {
            assert!(
                matches!(
                    proto.create_from_parameters(&bad),
                    Err(Error::InvalidParameters { .. })
                ),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn stats_follow_normalizations() {
        let need = TfIdfWeight::from_code("nnn").unwrap().stats_needed();
        assert!(!need.contains(StatFlags::TERMFREQ));
        assert!(!need.contains(StatFlags::DOC_LENGTH));
        let need = TfIdfWeight::from_code("Ptn").unwrap().stats_needed();
        assert!(need.contains(StatFlags::DOC_LENGTH | StatFlags::AVERAGE_LENGTH));
        assert!(need.contains(StatFlags::COLLECTION_SIZE | StatFlags::TERMFREQ));
        let need = TfIdfWeight::from_code("mnn").unwrap().stats_needed();
        assert!(need.contains(StatFlags::WDF_DOC_MAX));
    }
}
