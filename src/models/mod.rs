// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The harmonization model store: one fitted linear correction per (pod,
//! sensor) pair, mapping a pod's raw reading onto the colocation pod's reading.
//! The colocation pod itself never has an entry.
//!
//! The store can be written to and read from JSON or a little-endian binary
//! format; the format is chosen by the file's extension. Both formats keep
//! every model parameter bit-for-bit.

pub(crate) mod bin;
mod error;
pub(crate) mod json;

pub use error::*;

use std::{path::Path, str::FromStr};

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::math::LinearFit;

lazy_static::lazy_static! {
    pub(crate) static ref MODEL_STORE_EXTENSIONS: String = ModelStoreType::iter().join(", ");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum ModelStoreType {
    /// Human-readable; the default.
    #[strum(serialize = "json")]
    Json,

    /// Compact little-endian binary.
    #[strum(serialize = "bin")]
    Bin,
}

/// A fitted correction for one sensor of one pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizationModel {
    /// The names of the input columns, in order. The first is always the
    /// sensor itself; the elapsed-time column may follow.
    pub features: Vec<String>,

    pub fit: LinearFit,
}

impl HarmonizationModel {
    /// Predict colocation-equivalent readings. `x` must have one column per
    /// feature.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        if x.len_of(Axis(1)) != self.fit.num_features() {
            return Err(ModelError::FeatureCount {
                expected: self.fit.num_features(),
                got: x.len_of(Axis(1)),
            });
        }
        Ok(self.fit.predict(x))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonizationModels {
    colocation_pod: String,

    /// Pod name -> sensor name -> model. Insertion order is kept so that
    /// reports list pods in the order they were harmonized.
    models: IndexMap<String, IndexMap<String, HarmonizationModel>>,
}

impl HarmonizationModels {
    pub fn new(colocation_pod: String) -> HarmonizationModels {
        HarmonizationModels {
            colocation_pod,
            models: IndexMap::new(),
        }
    }

    pub fn colocation_pod(&self) -> &str {
        &self.colocation_pod
    }

    pub fn insert(
        &mut self,
        pod: &str,
        sensor: &str,
        model: HarmonizationModel,
    ) -> Result<(), ModelError> {
        if pod == self.colocation_pod {
            return Err(ModelError::ColocationPodEntry(pod.to_string()));
        }
        self.models
            .entry(pod.to_string())
            .or_default()
            .insert(sensor.to_string(), model);
        Ok(())
    }

    pub fn get(&self, pod: &str, sensor: &str) -> Option<&HarmonizationModel> {
        self.models.get(pod).and_then(|m| m.get(sensor))
    }

    pub fn contains_pod(&self, pod: &str) -> bool {
        self.models.contains_key(pod)
    }

    pub fn pods(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|k| k.as_str())
    }

    pub fn sensors(&self, pod: &str) -> impl Iterator<Item = &str> {
        self.models
            .get(pod)
            .into_iter()
            .flat_map(|m| m.keys().map(|k| k.as_str()))
    }

    /// The number of pods with models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (&str, &IndexMap<String, HarmonizationModel>)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a model store from a file. The format is determined by the file's
    /// extension.
    pub fn read_from_ext<P: AsRef<Path>>(file: P) -> Result<HarmonizationModels, ModelStoreReadError> {
        let file = file.as_ref();
        let ext = file.extension().and_then(|e| e.to_str());
        match ext.and_then(|s| ModelStoreType::from_str(&s.to_lowercase()).ok()) {
            Some(ModelStoreType::Json) => json::read(file),
            Some(ModelStoreType::Bin) => bin::read(file),
            None => Err(ModelStoreReadError::UnsupportedExt {
                ext: ext.unwrap_or("<no extension>").to_string(),
            }),
        }
    }

    /// From the target file extension, write out the appropriately-formatted
    /// model store.
    pub fn write_to_ext<P: AsRef<Path>>(&self, file: P) -> Result<(), ModelStoreWriteError> {
        let file = file.as_ref();
        let ext = file.extension().and_then(|e| e.to_str());
        match ext.and_then(|s| ModelStoreType::from_str(&s.to_lowercase()).ok()) {
            Some(ModelStoreType::Json) => json::write(self, file),
            Some(ModelStoreType::Bin) => bin::write(self, file),
            None => Err(ModelStoreWriteError::UnsupportedExt {
                ext: ext.unwrap_or("<no extension>").to_string(),
            }),
        }
    }
}
