//! MovieLens 100k loader.
//!
//! Reads `ml-100k/u.data` (tab separated: user, item, rating, timestamp) and
//! `ml-100k/u.item` (pipe separated, latin-1: id, title, release date, video
//! release date, IMDb URL, then one flag per genre in `GENRE_NAMES` order).

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder};

use crate::{
    error::DatasetError,
    models::{Catalog, CatalogItem, Rating, GENRE_NAMES},
};

const RATINGS_FILE: &str = "u.data";
const ITEMS_FILE: &str = "u.item";
const RATING_COLUMNS: usize = 4;
const GENRE_OFFSET: usize = 5;
const ITEM_COLUMNS: usize = GENRE_OFFSET + GENRE_NAMES.len();

/// Catalog and rating tables loaded from disk
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: Catalog,
    pub ratings: Vec<Rating>,
}

/// Loads `<data_dir>/ml-100k/u.data` and `<data_dir>/ml-100k/u.item`
pub fn load_movielens_100k(data_dir: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let root = data_dir.as_ref().join("ml-100k");
    if !root.is_dir() {
        return Err(DatasetError::NotFound(root.display().to_string()));
    }

    let ratings = read_ratings(File::open(root.join(RATINGS_FILE))?)?;
    let catalog = read_items(File::open(root.join(ITEMS_FILE))?)?;

    tracing::info!(
        path = %root.display(),
        items = catalog.len(),
        ratings = ratings.len(),
        "Loaded MovieLens 100k"
    );

    Ok(Dataset { catalog, ratings })
}

/// Parses tab-separated rating rows
pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<Rating>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut ratings = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let line = line_of(&record);
        check_width(&record, RATINGS_FILE, line, RATING_COLUMNS)?;

        ratings.push(Rating {
            user_id: parse_field(&record, 0, RATINGS_FILE, line, "user_id")?,
            item_id: parse_field(&record, 1, RATINGS_FILE, line, "item_id")?,
            rating: parse_finite(&record, 2, RATINGS_FILE, line, "rating")?,
            timestamp: parse_field(&record, 3, RATINGS_FILE, line, "timestamp")?,
        });
    }

    Ok(ratings)
}

/// Parses pipe-separated, latin-1 encoded item rows into a validated catalog
pub fn read_items<R: Read>(reader: R) -> Result<Catalog, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut items = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let line = line_of(&record);
        check_width(&record, ITEMS_FILE, line, ITEM_COLUMNS)?;

        let item_id = parse_field(&record, 0, ITEMS_FILE, line, "item_id")?;
        let title = decode_latin1(&record[1]);
        let genres = (GENRE_OFFSET..ITEM_COLUMNS)
            .map(|column| parse_finite(&record, column, ITEMS_FILE, line, "genre flag"))
            .collect::<Result<Vec<f64>, _>>()?;

        items.push(CatalogItem {
            item_id,
            title,
            genres,
        });
    }

    Ok(Catalog::new(items)?)
}

fn line_of(record: &ByteRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn check_width(
    record: &ByteRecord,
    file: &'static str,
    line: u64,
    expected: usize,
) -> Result<(), DatasetError> {
    if record.len() < expected {
        return Err(DatasetError::MissingColumns {
            file,
            line,
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

fn parse_field<T: FromStr>(
    record: &ByteRecord,
    column: usize,
    file: &'static str,
    line: u64,
    field: &'static str,
) -> Result<T, DatasetError> {
    let raw = decode_latin1(&record[column]);
    raw.trim().parse().map_err(|_| DatasetError::InvalidField {
        file,
        line,
        field,
        value: raw,
    })
}

/// Like `parse_field`, but `NaN` and infinities are invalid too
fn parse_finite(
    record: &ByteRecord,
    column: usize,
    file: &'static str,
    line: u64,
    field: &'static str,
) -> Result<f64, DatasetError> {
    let value: f64 = parse_field(record, column, file, line, field)?;
    if !value.is_finite() {
        return Err(DatasetError::InvalidField {
            file,
            line,
            field,
            value: decode_latin1(&record[column]).trim().to_string(),
        });
    }
    Ok(value)
}

/// Latin-1 maps each byte to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
