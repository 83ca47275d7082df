//! Historical storm track archive (IBTrACS layout).
//!
//! The archive is optional reference data for the map overlay. It is read
//! once, subsampled, and never changes afterwards. Load failures degrade to
//! an empty archive.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::models::TrackPoint;

const LAT_COLUMN: usize = 8;
const LON_COLUMN: usize = 9;
const WIND_COLUMN: usize = 10;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("track file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("track archive unreadable: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("track CSV unreadable: {0}")]
    Csv(#[from] csv::Error),
    #[error("track archive contains no files")]
    EmptyArchive,
}

/// Read-only set of track points shared across requests.
#[derive(Debug, Clone)]
pub struct TrackArchive {
    points: Arc<[TrackPoint]>,
}

impl Default for TrackArchive {
    fn default() -> Self {
        Self::empty()
    }
}

impl TrackArchive {
    pub fn empty() -> Self {
        Self::from_points(Vec::new())
    }

    pub fn from_points(points: Vec<TrackPoint>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Load and subsample; any error yields an empty archive.
    pub fn load_or_empty(path: impl AsRef<Path>, limit: usize, seed: u64) -> Self {
        let path = path.as_ref();
        match read_track_points(path) {
            Ok(points) => {
                let total = points.len();
                let archive = Self::from_points(subsample(points, limit, seed));
                tracing::info!(
                    "Loaded {} historical track points ({} kept) from {}",
                    total,
                    archive.len(),
                    path.display()
                );
                archive
            }
            Err(err) => {
                tracing::debug!("Historical tracks unavailable: {}", err);
                Self::empty()
            }
        }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Read every usable point from a CSV file or a ZIP archive holding one.
pub fn read_track_points(path: &Path) -> Result<Vec<TrackPoint>, TrackError> {
    let file = File::open(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_zip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !is_zip {
        return parse_track_csv(file);
    }

    let mut archive = zip::ZipArchive::new(file)?;
    if archive.is_empty() {
        return Err(TrackError::EmptyArchive);
    }
    let mut csv_index = 0;
    for index in 0..archive.len() {
        if archive.by_index(index)?.name().to_ascii_lowercase().ends_with(".csv") {
            csv_index = index;
            break;
        }
    }
    let entry = archive.by_index(csv_index)?;
    parse_track_csv(entry)
}

/// Parse IBTrACS-style CSV: header, units row, then data rows.
pub fn parse_track_csv<R: Read>(reader: R) -> Result<Vec<TrackPoint>, TrackError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut points = Vec::new();
    for record in reader.byte_records().skip(1) {
        // A malformed row only loses that row.
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                tracing::debug!("Skipping unreadable track row: {}", err);
                continue;
            }
        };
        let field = |index: usize| {
            record
                .get(index)
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        if let (Some(latitude), Some(longitude), Some(wind_kt)) =
            (field(LAT_COLUMN), field(LON_COLUMN), field(WIND_COLUMN))
        {
            points.push(TrackPoint {
                latitude,
                longitude,
                wind_kt,
            });
        }
    }
    Ok(points)
}

/// Keep at most `limit` points, chosen at random but in file order.
pub fn subsample(points: Vec<TrackPoint>, limit: usize, seed: u64) -> Vec<TrackPoint> {
    if points.len() <= limit {
        return points;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, points.len(), limit).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|index| points[index]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "SID,SEASON,NUMBER,BASIN,SUBBASIN,NAME,ISO_TIME,NATURE,LAT,LON,WMO_WIND\n";
    const UNITS: &str = " ,Year, , , , , , ,degrees_north,degrees_east,kts\n";

    fn sample_csv() -> String {
        let mut csv = String::from(HEADER);
        csv.push_str(UNITS);
        csv.push_str("1,2019,1,NI,BB,FANI,2019-05-02,TS,17.5,85.1,100\n");
        csv.push_str("1,2019,1,NI,BB,FANI,2019-05-03,TS,19.8,85.8,\n");
        csv.push_str("2,2020,2,NI,AS,NISARGA,2020-06-03,TS,18.5,72.9,55\n");
        csv
    }

    #[test]
    fn parses_rows_and_drops_blanks() {
        let points = parse_track_csv(sample_csv().as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], TrackPoint { latitude: 17.5, longitude: 85.1, wind_kt: 100.0 });
        assert!(points[0].is_cyclone_strength());
        assert!(!points[1].is_cyclone_strength());
    }

    #[test]
    fn units_row_is_skipped_even_if_numeric() {
        let mut csv = String::from(HEADER);
        csv.push_str("x,x,x,x,x,x,x,x,1.0,2.0,3.0\n");
        csv.push_str("1,2019,1,NI,BB,FANI,2019-05-02,TS,17.5,85.1,100\n");
        let points = parse_track_csv(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn non_utf8_row_keeps_the_rest() {
        let mut csv = Vec::from(HEADER.as_bytes());
        csv.extend_from_slice(UNITS.as_bytes());
        csv.extend_from_slice(b"1,2019,1,NI,BB,FANI,2019-05-02,TS,17.5,85.1,100\n");
        csv.extend_from_slice(b"2,2020,2,NI,AS,N\xffSARGA,2020-06-03,TS,18.5,72.9,55\n");
        csv.extend_from_slice(b"3,2021,3,NI,BB,YAAS,2021-05-26,TS,21.4,87.0,75\n");
        let points = parse_track_csv(csv.as_slice()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].latitude, 18.5);
    }

    #[test]
    fn subsample_is_bounded_seeded_and_ordered() {
        let points: Vec<TrackPoint> = (0..50)
            .map(|i| TrackPoint { latitude: i as f64, longitude: 80.0, wind_kt: 30.0 })
            .collect();
        let first = subsample(points.clone(), 10, 7);
        let second = subsample(points.clone(), 10, 7);
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].latitude < w[1].latitude));
        assert_eq!(subsample(points, 100, 7).len(), 50);
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let path = std::env::temp_dir().join(format!("tracks-{}.zip", uuid::Uuid::new_v4()));
        let archive = TrackArchive::load_or_empty(&path, 1000, 42);
        assert!(archive.is_empty());
    }

    #[test]
    fn corrupt_archive_degrades_to_empty() {
        let path = std::env::temp_dir().join(format!("tracks-{}.zip", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(read_track_points(&path), Err(TrackError::Zip(_))));
        assert!(TrackArchive::load_or_empty(&path, 1000, 42).is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reads_plain_csv_file() {
        let path = std::env::temp_dir().join(format!("tracks-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, sample_csv()).unwrap();
        let archive = TrackArchive::load_or_empty(&path, 1000, 42);
        assert_eq!(archive.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reads_csv_inside_zip() {
        let path = std::env::temp_dir().join(format!("tracks-{}.zip", uuid::Uuid::new_v4()));
        {
            let file = File::create(&path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file("README.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"IBTrACS North Indian basin").unwrap();
            writer
                .start_file("ibtracs.NI.list.v04r01.csv", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(sample_csv().as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        let points = read_track_points(&path).unwrap();
        assert_eq!(points.len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
