//! Schemes with no tunable parameters: boolean, coordinate match, Dice coefficient.

use crate::stats::{Snapshot, StatFlags};
use crate::weight::{no_param_bytes, no_params, Scheme, SchemeKind, Scorer};
use crate::Error;

/// Boolean weighting: every document scores zero.
///
/// The matcher can detect this through [`SchemeKind::Boolean`] and skip scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolWeight;

#[derive(Debug)]
struct ZeroScorer;

impl Scorer for ZeroScorer {
    fn sumpart(&self, _wdf: u32, _doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        0.0
    }
    fn maxpart(&self) -> f64 {
        0.0
    }
}

impl Scheme for BoolWeight {
    fn name(&self) -> &'static str {
        "bool"
    }
    fn kind(&self) -> SchemeKind {
        SchemeKind::Boolean
    }
    fn stats_needed(&self) -> StatFlags {
        StatFlags::NONE
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, _snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(ZeroScorer)
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        no_param_bytes(self.name(), params)?;
        Ok(Box::new(BoolWeight))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        no_params(self.name(), params)?;
        Ok(Box::new(BoolWeight))
    }
}

/// Coordinate matching: one point (times the factor) per matching term.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordWeight;

#[derive(Debug)]
struct CoordScorer {
    factor: f64,
}

impl Scorer for CoordScorer {
    fn sumpart(&self, _wdf: u32, _doclen: u32, _unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        self.factor
    }
    fn maxpart(&self) -> f64 {
        self.factor
    }
}

impl Scheme for CoordWeight {
    fn name(&self) -> &'static str {
        "coord"
    }
    fn stats_needed(&self) -> StatFlags {
        StatFlags::NONE
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        Box::new(CoordScorer {
            factor: snapshot.factor(),
        })
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        no_param_bytes(self.name(), params)?;
        Ok(Box::new(CoordWeight))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        no_params(self.name(), params)?;
        Ok(Box::new(CoordWeight))
    }
}

/// Dice coefficient: `2·|Q ∩ D| / (|Q| + |D|)`, with `|D|` the document's unique terms.
///
/// Each matching term contributes `2·wqf / (query_length + unique_terms)`, so the
/// parts sum to the coefficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceCoeffWeight;

#[derive(Debug)]
struct DiceScorer {
    numerator: f64,
    query_length: f64,
    upper_bound: f64,
}

impl Scorer for DiceScorer {
    fn sumpart(&self, _wdf: u32, _doclen: u32, unique_terms: u32, _wdf_doc_max: u32) -> f64 {
        let denom = self.query_length + f64::from(unique_terms);
        if denom <= 0.0 {
            return 0.0;
        }
        self.numerator / denom
    }
    fn maxpart(&self) -> f64 {
        self.upper_bound
    }
}

impl Scheme for DiceCoeffWeight {
    fn name(&self) -> &'static str {
        "dicecoeff"
    }
    fn stats_needed(&self) -> StatFlags {
        StatFlags::QUERY_LENGTH
            | StatFlags::UNIQUE_TERMS
            | StatFlags::UNIQUE_TERMS_MIN
            | StatFlags::WQF
    }
    fn clone_box(&self) -> Box<dyn Scheme> {
        Box::new(*self)
    }
    fn init(&self, snapshot: &Snapshot) -> Box<dyn Scorer> {
        let numerator = 2.0 * f64::from(snapshot.wqf()) * snapshot.factor();
        let query_length = f64::from(snapshot.query_length());
        let denom = query_length + f64::from(snapshot.unique_terms_lower_bound());
        let upper_bound = if denom > 0.0 { numerator / denom } else { 0.0 };
        Box::new(DiceScorer {
            numerator,
            query_length,
            upper_bound,
        })
    }
    fn serialise(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }
    fn unserialise(&self, params: &[u8]) -> Result<Box<dyn Scheme>, Error> {
        no_param_bytes(self.name(), params)?;
        Ok(Box::new(DiceCoeffWeight))
    }
    fn create_from_parameters(&self, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        no_params(self.name(), params)?;
        Ok(Box::new(DiceCoeffWeight))
    }
}
