//! Streams the path-table CSV and derives, for every solveable row, the
//! set of achievable saves and (lazily) the fumens that realize them.

use std::collections::HashMap;

use csv::StringRecord;
use fs_err::File;

use crate::bag;
use crate::error::Error;
use crate::fumen;
use crate::piece::{self, Piece, PieceCounter};

/// Literal column headers of the path-table CSV (the upstream solver
/// writes these in Japanese; this crate neither translates nor aliases
/// them, so a row is recognizable to a human reading the raw file too).
pub const COLUMN_QUEUE: &str = "ツモ";
pub const COLUMN_FUMEN_COUNT: &str = "対応地形数";
pub const COLUMN_USED_PIECES: &str = "使用ミノ";
pub const COLUMN_UNUSED_PIECES: &str = "未使用ミノ";
pub const COLUMN_FUMENS: &str = "テト譜";

const UNUSED_PIECES_DELIMITER: char = ';';
const FUMENS_DELIMITER: char = ';';

/// Every column [`PathReader`] requires to be present in the header.
pub const REQUIRED_COLUMNS: [&str; 3] = [COLUMN_QUEUE, COLUMN_UNUSED_PIECES, COLUMN_FUMENS];

/// All columns of the path-table schema, in the order the `file` filter
/// output mode writes them.
pub const PATH_COLUMNS: [&str; 5] = [
    COLUMN_QUEUE,
    COLUMN_FUMEN_COUNT,
    COLUMN_USED_PIECES,
    COLUMN_UNUSED_PIECES,
    COLUMN_FUMENS,
];

/// One row's worth of derived save information.
#[derive(Debug, Clone)]
pub struct SaveRow {
    pub queue: String,
    pub solveable: bool,
    /// One save string per `unused_pieces` token, in file order.
    pub saves: Vec<String>,
    /// `fumens[i]` is the subset of the row's fumens consistent with
    /// `saves[i]`; only populated when `assign_fumens` was requested.
    pub fumens: Option<Vec<Vec<String>>>,
    /// The raw CSV row, keyed by header; only populated when
    /// `assign_line` was requested (the filter engine needs it to
    /// rewrite a narrowed row; the percent engine never does).
    pub line: Option<HashMap<String, String>>,
}

/// Streams solved rows out of a path-table CSV, deriving the precise set
/// of achievable saves per row from the PC's build/leftover geometry.
pub struct PathReader {
    inner: csv::Reader<File>,
    headers: StringRecord,
    build: String,
    num_pieces: i64,
    hold: i64,
    width: i64,
    height: i64,
    unused_last_bag: PieceCounter,
    /// Pieces of `leftover` that `build` never consumed; the raw queue of
    /// every solveable row must begin with exactly this multiset.
    unused_leftover: PieceCounter,
    leading_size: usize,
    fumen_comment_cache: HashMap<String, PieceCounter>,
}

impl PathReader {
    /// Opens `filepath` and validates its header against
    /// [`REQUIRED_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened, or
    /// [`Error::Validation`] naming the missing columns.
    pub fn open(
        filepath: &str,
        build: &str,
        leftover: &str,
        width: i64,
        height: i64,
        hold: i64,
    ) -> Result<Self, Error> {
        let file = File::open(filepath)?;
        let mut inner = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = inner.headers()?.clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let num_pieces = bag::width_height_to_num_pieces(width, height, hold)?;
        let build_pieces = piece::parse_queue(&build.replace('X', ""))
            .map_err(|e| Error::Validation(e.to_string()))?;
        let leftover_pieces = piece::parse_queue(&leftover.replace('X', ""))
            .map_err(|e| Error::Validation(e.to_string()))?;
        let bag_comp = bag::bag_composition(leftover.len() as i64, num_pieces);
        let unused_last_bag =
            bag::final_bag_unused(&build_pieces, &leftover_pieces, &bag_comp);
        let leading_size = (bag::leading_size(&bag_comp) as usize).max(build.len());

        let leftover_counter = PieceCounter::from_pieces(leftover_pieces.iter().copied());
        let build_counter = PieceCounter::from_pieces(build_pieces.iter().copied());
        let unused_leftover = leftover_counter.saturating_sub(&build_counter);

        Ok(PathReader {
            inner,
            headers,
            build: build.to_string(),
            num_pieces,
            hold,
            width,
            height,
            unused_last_bag,
            unused_leftover,
            leading_size,
            fumen_comment_cache: HashMap::new(),
        })
    }

    /// Reads the next row, deriving its saves (and, if requested, its
    /// per-save fumen lists and raw line).
    ///
    /// Returns `Ok(None)` once the file is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Consistency`] when the path table disagrees with
    /// its declared geometry, or [`Error::Fumen`] when `assign_fumens` is
    /// set and a fumen's first-page comment is empty.
    pub fn read_row(
        &mut self,
        assign_fumens: bool,
        assign_line: bool,
    ) -> Result<Option<SaveRow>, Error> {
        let mut record = StringRecord::new();
        if !self.inner.read_record(&mut record)? {
            return Ok(None);
        }
        let row: HashMap<String, String> = self
            .headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        let queue = row.get(COLUMN_QUEUE).cloned().unwrap_or_default();
        let fumens_field = row.get(COLUMN_FUMENS).cloned().unwrap_or_default();
        let solveable = !fumens_field.is_empty();

        if !solveable {
            return Ok(Some(SaveRow {
                queue,
                solveable,
                saves: Vec::new(),
                fumens: if assign_fumens { Some(Vec::new()) } else { None },
                line: if assign_line { Some(row) } else { None },
            }));
        }

        let full_queue: Vec<Piece> = piece::parse_queue(&self.build.replace('X', ""))
            .map_err(|e| Error::Consistency {
                queue: queue.clone(),
                message: e.to_string(),
            })?
            .into_iter()
            .chain(
                piece::parse_queue(&queue)
                    .map_err(|e| Error::Consistency { queue: queue.clone(), message: e.to_string() })?,
            )
            .collect();

        let min_required = (self.num_pieces - self.hold).max(0) as usize;
        if full_queue.len() < min_required {
            return Err(Error::Consistency {
                queue: queue.clone(),
                message: format!(
                    "full queue could not produce a {}x{} PC; likely build {} is too short",
                    self.width, self.height, self.build
                ),
            });
        }
        if full_queue.len() as i64 > self.num_pieces + self.hold {
            log::warn!(
                "queue '{}' is longer than num_pieces + hold ({}); path table may contain padding",
                queue,
                self.num_pieces + self.hold
            );
        }

        let unused_leftover_len = self.unused_leftover.total() as usize;
        let queue_prefix: String = queue.chars().take(unused_leftover_len).collect();
        let prefix_matches = queue_prefix.chars().count() == unused_leftover_len
            && PieceCounter::from_str(&queue_prefix).map(|c| c == self.unused_leftover).unwrap_or(false);
        if !prefix_matches {
            return Err(Error::Consistency {
                queue: queue.clone(),
                message: "queue doesn't begin with expected leftover remainder".to_string(),
            });
        }

        let leftover_len = self.leading_size.min(full_queue.len());
        let bag_slice_end = (leftover_len + 7).min(full_queue.len());
        let bag_slice = &full_queue[leftover_len..bag_slice_end];
        let mut seen = PieceCounter::new();
        for &p in bag_slice {
            seen.add(p);
        }
        if piece::BAG.iter().any(|&p| seen.count(p) > 1) {
            return Err(Error::Consistency {
                queue: queue.clone(),
                message: "final bag slice of the full queue contains a repeated piece".to_string(),
            });
        }

        let seen_after_leading: PieceCounter = if self.leading_size < full_queue.len() {
            PieceCounter::from_pieces(full_queue[self.leading_size..].iter().copied())
        } else {
            PieceCounter::new()
        };
        let unseen_last_bag: Vec<Piece> = self
            .unused_last_bag
            .elements()
            .into_iter()
            .filter(|&p| seen_after_leading.count(p) == 0)
            .collect();
        let unseen_last_bag_str: String = unseen_last_bag.iter().map(|p| p.to_string()).collect();

        let unused_pieces_field = row.get(COLUMN_UNUSED_PIECES).cloned().unwrap_or_default();
        let unused_tokens: Vec<&str> = unused_pieces_field.split(UNUSED_PIECES_DELIMITER).collect();

        let mut saves = Vec::with_capacity(unused_tokens.len());
        let mut save_fumens = Vec::with_capacity(unused_tokens.len());
        let fumens: Vec<&str> = fumens_field.split(FUMENS_DELIMITER).collect();
        let queue_counter = PieceCounter::from_str(&queue).map_err(|e| Error::Consistency {
            queue: queue.clone(),
            message: e.to_string(),
        })?;

        for unused_piece in &unused_tokens {
            let save_raw = format!("{}{}", unseen_last_bag_str, unused_piece);
            let save = piece::sort_queue(&save_raw).map_err(|e| Error::Consistency {
                queue: queue.clone(),
                message: e.to_string(),
            })?;
            saves.push(save);

            if assign_fumens {
                let mut curr_save_fumens = Vec::new();
                for &fumen_code in &fumens {
                    let comment_counter = self.fumen_comment_for(fumen_code)?;
                    let fumen_unused = queue_counter.saturating_sub(&comment_counter);
                    let fumen_unused_str: String =
                        fumen_unused.elements().iter().map(|p| p.to_string()).collect();
                    if *unused_piece == fumen_unused_str {
                        curr_save_fumens.push(fumen_code.to_string());
                    }
                }
                save_fumens.push(curr_save_fumens);
            }
        }

        Ok(Some(SaveRow {
            queue,
            solveable,
            saves,
            fumens: if assign_fumens { Some(save_fumens) } else { None },
            line: if assign_line { Some(row) } else { None },
        }))
    }

    fn fumen_comment_for(&mut self, fumen_code: &str) -> Result<PieceCounter, Error> {
        if let Some(counter) = self.fumen_comment_cache.get(fumen_code) {
            return Ok(*counter);
        }
        let comments = fumen::fumen_get_comments(fumen_code)?;
        let first = comments.first().ok_or_else(|| Error::Fumen {
            fumen: fumen_code.to_string(),
            message: "fumen has no pages".to_string(),
        })?;
        if first.is_empty() {
            return Err(Error::Fumen {
                fumen: fumen_code.to_string(),
                message: "first-page comment is empty; cannot derive the pieces used in this solve".to_string(),
            });
        }
        let counter = PieceCounter::from_str(first).map_err(|e| Error::Fumen {
            fumen: fumen_code.to_string(),
            message: e.to_string(),
        })?;
        self.fumen_comment_cache.insert(fumen_code.to_string(), counter);
        Ok(counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fumen::{encode, Field, Page};
    use std::io::Write;

    fn write_path_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn fumen_with_comment(comment: &str) -> String {
        encode(&[Page { field: Field::new(4), comment: comment.to_string() }])
    }

    #[test]
    fn missing_required_column_is_a_validation_error() {
        let file = write_path_csv("a,b,c\n1,2,3\n");
        let path = file.path().to_str().unwrap();
        let result = PathReader::open(path, "", "O", 10, 4, 1);
        assert!(result.is_err());
    }

    #[test]
    fn non_solveable_row_yields_empty_saves() {
        let header = format!(
            "{},{},{},{}",
            COLUMN_QUEUE, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_FUMENS
        );
        let contents = format!("{}\nTILJSZO,0,,\n", header);
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();
        let mut reader = PathReader::open(path, "", "O", 10, 4, 1).unwrap();
        let row = reader.read_row(false, false).unwrap().unwrap();
        assert!(!row.solveable);
        assert!(row.saves.is_empty());
    }

    #[test]
    fn queue_beginning_with_leftover_remainder_is_accepted() {
        let header = format!(
            "{},{},{},{}",
            COLUMN_QUEUE, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_FUMENS
        );
        let fumen = fumen_with_comment("OTIL");
        let contents = format!("{}\nOTIL,1,O,{}\n", header, fumen);
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();
        let mut reader = PathReader::open(path, "", "O", 4, 4, 0).unwrap();
        let row = reader.read_row(false, false).unwrap().unwrap();
        assert!(row.solveable);
        assert_eq!(row.saves.len(), 1);
    }

    #[test]
    fn queue_not_beginning_with_leftover_remainder_is_a_consistency_error() {
        let header = format!(
            "{},{},{},{}",
            COLUMN_QUEUE, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_FUMENS
        );
        let fumen = fumen_with_comment("TILJ");
        // leftover "O" was never consumed by the (empty) build, so the row's
        // queue must start with "O"; this one starts with "T" instead.
        let contents = format!("{}\nTILJ,1,O,{}\n", header, fumen);
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();
        let mut reader = PathReader::open(path, "", "O", 4, 4, 0).unwrap();
        let err = reader.read_row(false, false).unwrap_err();
        match err {
            Error::Consistency { message, .. } => {
                assert!(message.contains("leftover remainder"));
            }
            other => panic!("expected Error::Consistency, got {other:?}"),
        }
    }

    #[test]
    fn solveable_row_derives_saves_and_fumens() {
        let fumen = fumen_with_comment("TILJSZO");
        let header = format!(
            "{},{},{},{}",
            COLUMN_QUEUE, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_FUMENS
        );
        let contents = format!("{}\nTILJSZO,1,O,{}\n", header, fumen);
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();
        let mut reader = PathReader::open(path, "", "O", 10, 4, 1).unwrap();
        let row = reader.read_row(true, true).unwrap().unwrap();
        assert!(row.solveable);
        assert_eq!(row.saves.len(), 1);
        assert!(row.line.is_some());
    }
}
