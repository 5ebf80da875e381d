//! Typed gauge families.

use std::marker::PhantomData;

use prometheus::{GaugeVec, Opts, Registry};

use super::NAMESPACE;

/// A fixed label schema for one metric kind.
///
/// `values()` must return exactly one value per entry of `NAMES`, in the same
/// order.
pub trait LabelSet {
    /// Label names, in exposition order.
    const NAMES: &'static [&'static str];

    /// Label values matching [`Self::NAMES`].
    fn values(&self) -> Vec<&str>;
}

/// A gauge vector that only accepts its own label record.
pub struct GaugeFamily<L> {
    vec: GaugeVec,
    _labels: PhantomData<fn(&L)>,
}

impl<L> Clone for GaugeFamily<L> {
    fn clone(&self) -> Self {
        Self {
            vec: self.vec.clone(),
            _labels: PhantomData,
        }
    }
}

impl<L> std::fmt::Debug for GaugeFamily<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeFamily").finish_non_exhaustive()
    }
}

impl<L: LabelSet> GaugeFamily<L> {
    /// Create the family `<namespace>_<subsystem>_<name>`.
    ///
    /// # Errors
    /// Returns `prometheus::Error` for an invalid metric or label name.
    pub fn new(subsystem: &str, name: &str, help: &str) -> Result<Self, prometheus::Error> {
        let opts = Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(subsystem);
        Ok(Self {
            vec: GaugeVec::new(opts, L::NAMES)?,
            _labels: PhantomData,
        })
    }

    /// Register the family with a registry.
    ///
    /// # Errors
    /// Returns `prometheus::Error::AlreadyReg` if the name is taken.
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.vec.clone()))
    }

    /// Set the series for `labels`, creating it if needed.
    pub fn set(&self, labels: &L, value: f64) {
        self.vec.with_label_values(&labels.values()).set(value);
    }

    /// Add one to the series for `labels`, creating it at 0 first if needed.
    pub fn inc(&self, labels: &L) {
        self.vec.with_label_values(&labels.values()).inc();
    }
}
