// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A cache of preprocessed pod data. Entries are keyed by the folder they live
//! in and the pipeline stage; they are never invalidated, so delete the file
//! to force the data to be read again.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::StageCacheError;
use crate::timeseries::PodTimeseries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(serialize = "harmonization")]
    Harmonization,

    #[strum(serialize = "field")]
    Field,
}

impl Stage {
    fn file_name(self) -> String {
        format!("pod_{self}_data.json")
    }
}

/// A pod's data as stored in the cache. json has no NaN, so missing values
/// are nulls. Ingested readings are always finite, so a null is never an
/// infinity.
#[derive(Serialize, Deserialize)]
struct CachedPod {
    timestamps: Vec<NaiveDateTime>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

impl From<&PodTimeseries> for CachedPod {
    fn from(table: &PodTimeseries) -> CachedPod {
        CachedPod {
            timestamps: table.timestamps().to_vec(),
            columns: table
                .columns()
                .map(|(name, values)| {
                    let values = values
                        .iter()
                        .map(|&v| if v.is_nan() { None } else { Some(v) })
                        .collect();
                    (name.to_string(), values)
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageCache {
    folder: PathBuf,
}

impl StageCache {
    pub fn new<P: AsRef<Path>>(folder: P) -> StageCache {
        StageCache {
            folder: folder.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, stage: Stage) -> PathBuf {
        self.folder.join(stage.file_name())
    }

    /// Get the cached data of a stage, if it's there.
    pub fn load(
        &self,
        stage: Stage,
    ) -> Result<Option<IndexMap<String, PodTimeseries>>, StageCacheError> {
        let file = self.path(stage);
        if !file.exists() {
            debug!("No cached {stage} data at {}", file.display());
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&file)?);
        let cached: IndexMap<String, CachedPod> =
            serde_json::from_reader(reader).map_err(|err| StageCacheError::Decode {
                file: file.clone(),
                err,
            })?;
        let mut pods = IndexMap::with_capacity(cached.len());
        for (pod, data) in cached {
            let columns = data
                .columns
                .into_iter()
                .map(|(name, values)| {
                    let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                    (name, values)
                })
                .collect();
            pods.insert(pod, PodTimeseries::new(data.timestamps, columns)?);
        }
        info!("Using cached {stage} data from {}", file.display());
        Ok(Some(pods))
    }

    pub fn store(
        &self,
        stage: Stage,
        pods: &IndexMap<String, PodTimeseries>,
    ) -> Result<(), StageCacheError> {
        let file = self.path(stage);
        let cached: IndexMap<&str, CachedPod> = pods
            .iter()
            .map(|(pod, data)| (pod.as_str(), CachedPod::from(data)))
            .collect();
        let mut writer = BufWriter::new(File::create(&file)?);
        serde_json::to_writer(&mut writer, &cached)?;
        writer.flush()?;
        debug!("Cached {stage} data to {}", file.display());
        Ok(())
    }

    /// Load a stage's data, or create it with `read` and cache it.
    pub fn load_or_else<E, F>(
        &self,
        stage: Stage,
        read: F,
    ) -> Result<IndexMap<String, PodTimeseries>, E>
    where
        E: From<StageCacheError>,
        F: FnOnce() -> Result<IndexMap<String, PodTimeseries>, E>,
    {
        if let Some(pods) = self.load(stage)? {
            return Ok(pods);
        }
        let pods = read()?;
        self.store(stage, &pods)?;
        Ok(pods)
    }
}
