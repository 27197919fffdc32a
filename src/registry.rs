//! Name → prototype registry, factory strings, and the serialised-scheme envelope.
//!
//! The registry is the configuration surface for choosing a scheme at runtime:
//!
//! ```
//! use lexweight::Registry;
//!
//! let registry = Registry::default();
//! let scheme = registry.create("bm25 1.2 0 1 0.75 0.5").unwrap();
//! assert_eq!(scheme.name(), "bm25");
//! ```

use crate::bm25::{Bm25PlusWeight, Bm25Weight};
use crate::dfr::{
    Bb2Weight, DlhWeight, DphWeight, IfB2Weight, IneB2Weight, InL2Weight, Pl2PlusWeight, Pl2Weight,
};
use crate::query_likelihood::{
    Lm2StageWeight, LmAbsDiscountWeight, LmDirichletWeight, LmJmWeight,
};
use crate::simple::{BoolWeight, CoordWeight, DiceCoeffWeight};
use crate::tfidf::TfIdfWeight;
use crate::weight::Scheme;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prototypes keyed by scheme name.
#[derive(Debug, Clone)]
pub struct Registry {
    schemes: BTreeMap<&'static str, Box<dyn Scheme>>,
}

impl Default for Registry {
    /// Every built-in scheme, with default parameters.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(BoolWeight));
        registry.register(Box::new(CoordWeight));
        registry.register(Box::new(DiceCoeffWeight));
        registry.register(Box::new(Bm25Weight::default()));
        registry.register(Box::new(Bm25PlusWeight::default()));
        registry.register(Box::new(TfIdfWeight::default()));
        registry.register(Box::new(InL2Weight::default()));
        registry.register(Box::new(IfB2Weight::default()));
        registry.register(Box::new(IneB2Weight::default()));
        registry.register(Box::new(Bb2Weight::default()));
        registry.register(Box::new(DlhWeight));
        registry.register(Box::new(DphWeight));
        registry.register(Box::new(Pl2Weight::default()));
        registry.register(Box::new(Pl2PlusWeight::default()));
        registry.register(Box::new(LmJmWeight::default()));
        registry.register(Box::new(LmDirichletWeight::default()));
        registry.register(Box::new(LmAbsDiscountWeight::default()));
        registry.register(Box::new(Lm2StageWeight::default()));
        registry
    }
}

impl Registry {
    /// A registry with no schemes.
    pub fn empty() -> Self {
        Self {
            schemes: BTreeMap::new(),
        }
    }

    /// Add (or replace) a prototype under its own name.
    pub fn register(&mut self, prototype: Box<dyn Scheme>) {
        self.schemes.insert(prototype.name(), prototype);
    }

    /// The prototype registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Scheme> {
        self.schemes.get(name).map(|s| s.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schemes.keys().copied()
    }

    /// Build a scheme from a factory string: a name followed by whitespace-separated
    /// parameters, e.g. `"pl2+ 1.5 0.9"`.
    pub fn create(&self, text: &str) -> Result<Box<dyn Scheme>, Error> {
        let mut tokens = text.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| Error::SchemeNotFound(String::new()))?;
        let params: Vec<&str> = tokens.collect();
        self.create_with(name, &params)
    }

    /// Build a scheme from a name and already-split parameters.
    pub fn create_with(&self, name: &str, params: &[&str]) -> Result<Box<dyn Scheme>, Error> {
        let prototype = self
            .get(name)
            .ok_or_else(|| Error::SchemeNotFound(name.to_string()))?;
        let scheme = prototype.create_from_parameters(params)?;
        tracing::debug!(scheme = name, ?params, "created weighting scheme");
        Ok(scheme)
    }

    /// Rebuild a scheme shipped from another process.
    pub fn unserialise(&self, wire: &SerialisedScheme) -> Result<Box<dyn Scheme>, Error> {
        let prototype = self
            .get(&wire.name)
            .ok_or_else(|| Error::SchemeNotFound(wire.name.clone()))?;
        prototype.unserialise(&wire.params)
    }
}

/// A scheme name paired with its parameter bytes: the unit sent to a remote shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialisedScheme {
    /// Registry name.
    pub name: String,
    /// Scheme-defined parameter encoding.
    pub params: Vec<u8>,
}

impl SerialisedScheme {
    /// Capture a scheme's configuration, or fail with [`Error::NotRemotable`].
    pub fn from_scheme(scheme: &dyn Scheme) -> Result<Self, Error> {
        Ok(Self {
            name: scheme.name().to_string(),
            params: scheme.serialise()?,
        })
    }

    /// Self-delimiting byte encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        crate::weight::encode_params("scheme", self)
    }

    /// Decode bytes produced by [`SerialisedScheme::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        crate::weight::decode_params("scheme", bytes)
    }
}
