//! Tabular dataset ingestion.
//!
//! Datasets are delimited text files read with the `csv` crate: the first record is a
//! header and every following record is a row whose values are kept in column order,
//! byte for byte. Quoted fields may contain the delimiter; surrounding whitespace is
//! part of the value.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info_span};

use crate::{Result, UniqueRowsError};

/// An immutable row of opaque values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// A header plus its rows, read once per proof run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

const SAMPLE_NAMES: [&str; 100] = [
    "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Hannah", "Ivy", "Jack",
    "Katherine", "Liam", "Michael", "Nina", "Oscar", "Paul", "Quincy", "Rachel", "Sam", "Tina",
    "Uma", "Victor", "Wendy", "Xander", "Yara", "Zack", "Aaron", "Bella", "Cameron", "Daisy",
    "Edward", "Fiona", "George", "Helena", "Isaac", "Julia", "Karl", "Lily", "Martin", "Nora",
    "Oliver", "Penelope", "Quinn", "Robert", "Sara", "Thomas", "Ursula", "Violet", "Walter",
    "Xenia", "Yvonne", "Zane", "Arthur", "Beatrice", "Chris", "Diana", "Ethan", "Frances",
    "Gregory", "Harriet", "Ian", "Jessie", "Kevin", "Laura", "Miles", "Natalie", "Omar",
    "Phoebe", "Quentin", "Riley", "Shane", "Talia", "Umar", "Vivian", "Wyatt", "Xavier",
    "Yasmine", "Zara", "Adrian", "Beth", "Caleb", "Denise", "Eric", "Faith", "Gareth", "Heather",
    "Isaiah", "Jenny", "Kurt", "Leah", "Marcus", "Nadine", "Owen", "Paula", "Quinton", "Ruth",
    "Simon", "Tamara", "Ulysses", "Valerie",
];

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            UniqueRowsError::InvalidInput(format!(
                "Delimiter {:?} is not a single ASCII character",
                delimiter
            ))
        })
}

impl Dataset {
    /// Parse delimited text. Fails with `EmptyDataset` when there are no data rows.
    pub fn parse(contents: &str, delimiter: char) -> Result<Self> {
        Self::from_reader(contents.as_bytes(), delimiter)
    }

    fn from_reader<R: Read>(source: R, delimiter: char) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .has_headers(true)
            .trim(Trim::None)
            .from_reader(source);

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() {
            return Err(UniqueRowsError::EmptyDataset);
        }

        // Records with a different field count than the header are rejected
        let rows = reader
            .records()
            .map(|record| Ok(Row::new(record?.iter().map(str::to_string).collect())))
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Err(UniqueRowsError::EmptyDataset);
        }

        Ok(Self { header, rows })
    }

    /// Read a delimited file from disk.
    pub fn read_delimited(path: &Path, delimiter: char) -> Result<Self> {
        let _span = info_span!("read_dataset", path = %path.display()).entered();
        let file = std::fs::File::open(path).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to read dataset {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file, delimiter)?;
        debug!(
            "Read {} rows with {} columns",
            dataset.rows.len(),
            dataset.header.len()
        );
        Ok(dataset)
    }

    /// Serialize back to delimited text, quoting values where needed.
    pub fn to_delimited(&self, delimiter: char) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row.values())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| UniqueRowsError::IO(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| UniqueRowsError::Serialization(e.to_string()))
    }

    pub fn write_delimited(&self, path: &Path, delimiter: char) -> Result<()> {
        std::fs::write(path, self.to_delimited(delimiter)?).map_err(|e| {
            UniqueRowsError::IO(format!("Failed to write dataset {}: {}", path.display(), e))
        })
    }

    /// Sample `Name,Age` dataset with all rows distinct.
    pub fn sample(num_rows: usize) -> Self {
        let rows = (0..num_rows)
            .map(|i| {
                Row::new(vec![
                    SAMPLE_NAMES[i % SAMPLE_NAMES.len()].to_string(),
                    (25 + i * 5).to_string(),
                ])
            })
            .collect();
        Self {
            header: vec!["Name".to_string(), "Age".to_string()],
            rows,
        }
    }

    /// Sample dataset where `duplicates` rows are copies of earlier rows.
    ///
    /// Copies are placed at random positions drawn from `seed`, so the result is
    /// reproducible.
    pub fn sample_with_duplicates(num_rows: usize, duplicates: usize, seed: u64) -> Result<Self> {
        if duplicates >= num_rows {
            return Err(UniqueRowsError::InvalidInput(format!(
                "{} duplicates requested for {} rows",
                duplicates, num_rows
            )));
        }
        let mut dataset = Self::sample(num_rows - duplicates);
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..duplicates {
            let source = rng.gen_range(0..dataset.rows.len());
            let position = rng.gen_range(0..=dataset.rows.len());
            let copy = dataset.rows[source].clone();
            dataset.rows.insert(position, copy);
        }
        Ok(dataset)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}
