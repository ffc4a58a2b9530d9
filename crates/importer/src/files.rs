use crate::error::ImportError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::path::Path;

/// Reads every row of a headed CSV file into `T`, matching columns by name.
/// Surrounding whitespace is trimmed from headers and fields.
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    if !path.is_file() {
        return Err(ImportError::FileNotFound(path.to_path_buf()));
    }

    let csv_error = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    reader
        .deserialize()
        .map(|record| record.map_err(csv_error))
        .collect()
}

/// Appends one row, writing the header first when the file is new or empty.
pub(crate) fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<(), ImportError> {
    let write_error = |source| ImportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(folder) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(folder).map_err(write_error)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;
    let is_empty = file.metadata().map_err(write_error)?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_empty)
        .from_writer(file);
    writer.serialize(record).map_err(|source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(write_error)?;
    Ok(())
}

/// The 1-based file line of the `index`-th data row, counting the header.
pub(crate) fn data_line(index: usize) -> u64 {
    index as u64 + 2
}
