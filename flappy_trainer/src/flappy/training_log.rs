// training_log.rs

use std::{
    fs::{self, File, OpenOptions},
    path::Path,
};

use csv::WriterBuilder;
use serde::Serialize;

use super::error::Result;

/// One finished training episode.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EpisodeRecord {
    pub stage: String,
    pub episode: usize,
    pub exploration_rate: f32,
    pub frames_survived: usize,
    pub score: u32,
}

/// Appends episode records to a csv file. The header is written only when the file is new or
/// empty so several runs can share a file.
pub struct TrainingLog {
    writer: csv::Writer<File>,
}

impl TrainingLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let write_header = fs::metadata(path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        Ok(Self { writer })
    }

    pub fn append(&mut self, record: &EpisodeRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}
