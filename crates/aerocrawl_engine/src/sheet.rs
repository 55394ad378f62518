use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crawl_logging::{crawl_debug, crawl_info};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::csv;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("no such section: {0}")]
    NoSuchSection(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Durable, spreadsheet-like record sink: named sections with a header row,
/// row appends, and a single finalizing save.
pub trait SheetStore: Send {
    /// Creates the section if absent. Re-running against an existing book
    /// neither duplicates the header nor discards prior rows.
    fn ensure_section(&mut self, name: &str, columns: &[String]) -> Result<(), SheetError>;

    fn append_row(&mut self, section: &str, row: Vec<String>) -> Result<(), SheetError>;

    /// Persists every section. Called exactly once at pipeline shutdown.
    fn save(&mut self) -> Result<(), SheetError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Directory-backed sheet book: one `<section>.csv` file per section, header
/// row first. Opening an existing directory loads prior sections so a new
/// run keeps appending to them.
#[derive(Debug)]
pub struct CsvBook {
    dir: PathBuf,
    sections: Vec<Section>,
}

impl CsvBook {
    pub fn open(dir: &Path) -> Result<Self, SheetError> {
        if dir.exists() {
            let meta = fs::metadata(dir).map_err(|e| SheetError::OutputDir(e.to_string()))?;
            if !meta.is_dir() {
                return Err(SheetError::OutputDir("path is not a directory".into()));
            }
        } else {
            fs::create_dir_all(dir).map_err(|e| SheetError::OutputDir(e.to_string()))?;
        }
        // Writability probe before any crawling starts.
        NamedTempFile::new_in(dir).map_err(|e| SheetError::OutputDir(e.to_string()))?;

        let mut sections = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("csv"))
            .collect();
        entries.sort();

        for path in entries {
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path)?;
            let mut rows = csv::decode_rows(&text);
            if rows.is_empty() {
                continue;
            }
            let columns = rows.remove(0);
            crawl_debug!("loaded existing section '{name}' with {} rows", rows.len());
            sections.push(Section {
                name: name.to_string(),
                columns,
                rows,
            });
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            sections,
        })
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    fn section_path(&self, name: &str) -> PathBuf {
        // Section names come from configuration; keep them filesystem-safe.
        let safe: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{safe}.csv"))
    }

    /// Rows currently held for a section.
    pub fn section_rows(&self, name: &str) -> Option<&[Vec<String>]> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.rows.as_slice())
    }
}

impl SheetStore for CsvBook {
    fn ensure_section(&mut self, name: &str, columns: &[String]) -> Result<(), SheetError> {
        if self.section_mut(name).is_some() {
            return Ok(());
        }
        self.sections.push(Section {
            name: name.to_string(),
            columns: columns.to_vec(),
            rows: Vec::new(),
        });
        Ok(())
    }

    fn append_row(&mut self, section: &str, row: Vec<String>) -> Result<(), SheetError> {
        match self.section_mut(section) {
            Some(section) => {
                section.rows.push(row);
                Ok(())
            }
            None => Err(SheetError::NoSuchSection(section.to_string())),
        }
    }

    fn save(&mut self) -> Result<(), SheetError> {
        for section in &self.sections {
            let target = self.section_path(&section.name);
            let mut tmp = NamedTempFile::new_in(&self.dir)?;
            tmp.write_all(csv::encode_row(&section.columns).as_bytes())?;
            for row in &section.rows {
                tmp.write_all(csv::encode_row(row).as_bytes())?;
            }
            tmp.flush()?;
            tmp.as_file_mut().sync_all()?;

            // Replace any previous copy atomically.
            if target.exists() {
                fs::remove_file(&target)?;
            }
            tmp.persist(&target).map_err(|e| SheetError::Io(e.error))?;
        }
        crawl_info!(
            "saved {} section(s) to {}",
            self.sections.len(),
            self.dir.display()
        );
        Ok(())
    }
}
