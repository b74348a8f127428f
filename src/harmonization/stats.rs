// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cross-validation statistics of harmonization models.

use indexmap::IndexMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use vec1::Vec1;

/// The statistics recorded for every fold.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum Statistic {
    Training_R2,
    Testing_R2,
    Training_RMSE,
    Testing_RMSE,
    Training_MBE,
    Testing_MBE,
}

/// The performance of one fold. R² values are rounded to 2 decimal places;
/// mean bias errors are predicted minus actual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldStatistics {
    pub training_r2: f64,
    pub testing_r2: f64,
    pub training_rmse: f64,
    pub testing_rmse: f64,
    pub training_mbe: f64,
    pub testing_mbe: f64,
}

impl FoldStatistics {
    pub fn get(&self, stat: Statistic) -> f64 {
        match stat {
            Statistic::Training_R2 => self.training_r2,
            Statistic::Testing_R2 => self.testing_r2,
            Statistic::Training_RMSE => self.training_rmse,
            Statistic::Testing_RMSE => self.testing_rmse,
            Statistic::Training_MBE => self.training_mbe,
            Statistic::Testing_MBE => self.testing_mbe,
        }
    }
}

/// One statistic for one sensor: rows are folds, columns are pods.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticTable {
    pub pods: Vec<String>,

    /// One inner vector per fold, each with one value per pod.
    pub rows: Vec<Vec<f64>>,
}

/// Fold statistics of every (pod, sensor) pair of a harmonization.
#[derive(Debug, Clone)]
pub struct HarmonizationStats {
    k_folds: usize,

    /// Keyed by sensor, then pod.
    folds: IndexMap<String, IndexMap<String, Vec1<FoldStatistics>>>,
}

impl HarmonizationStats {
    pub fn new(k_folds: usize) -> HarmonizationStats {
        HarmonizationStats {
            k_folds,
            folds: IndexMap::new(),
        }
    }

    pub fn k_folds(&self) -> usize {
        self.k_folds
    }

    pub(crate) fn push(&mut self, pod: &str, sensor: &str, folds: Vec1<FoldStatistics>) {
        self.folds
            .entry(sensor.to_string())
            .or_default()
            .insert(pod.to_string(), folds);
    }

    pub fn sensors(&self) -> impl Iterator<Item = &str> {
        self.folds.keys().map(|s| s.as_str())
    }

    pub fn get(&self, pod: &str, sensor: &str) -> Option<&Vec1<FoldStatistics>> {
        self.folds.get(sensor)?.get(pod)
    }

    /// The table of `stat` for `sensor`, if that sensor was harmonized.
    pub fn table(&self, stat: Statistic, sensor: &str) -> Option<StatisticTable> {
        let by_pod = self.folds.get(sensor)?;
        let rows = (0..self.k_folds)
            .map(|i_fold| {
                by_pod
                    .values()
                    .map(|folds| folds.get(i_fold).map(|f| f.get(stat)).unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();
        Some(StatisticTable {
            pods: by_pod.keys().cloned().collect(),
            rows,
        })
    }

    /// Every statistic's tables, keyed by sensor.
    pub fn tables(&self) -> impl Iterator<Item = (Statistic, IndexMap<String, StatisticTable>)> + '_ {
        Statistic::iter().map(move |stat| {
            let tables = self
                .sensors()
                .filter_map(|sensor| Some((sensor.to_string(), self.table(stat, sensor)?)))
                .collect();
            (stat, tables)
        })
    }
}
