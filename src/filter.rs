//! Filters a path table by a wanted-save expression and, depending on
//! the requested output mode, emits a narrowed path table, a uniquified
//! solution bundle, or a true-minimal covering set.

use std::collections::HashSet;

use csv::Writer;
use fs_err::File;
use std::io::Write as IoWrite;

use crate::cover::{self, Choice, Graph, NodeId};
use crate::error::Error;
use crate::expr::{evaluate_all, Ast};
use crate::fumen::{fumen_combine, fumen_combine_comments, make_fumen_url};
use crate::reader::{PathReader, COLUMN_FUMENS, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_USED_PIECES, PATH_COLUMNS};

/// The three output modes `filter`'s stage 1 can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Emit a filtered path-table CSV narrowed to surviving fumens.
    File,
    /// Accumulate the global set of surviving fumens, combined into one fumen.
    Unique,
    /// Proceed to stage 2: compute a true minimal covering set.
    Minimal,
}

#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub output_mode: OutputMode,
    pub cumulative: bool,
    pub console_print: bool,
    pub tinyurl: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            output_mode: OutputMode::Minimal,
            cumulative: false,
            console_print: true,
            tinyurl: true,
        }
    }
}

/// What `filter` produced, for the caller to print or test against.
#[derive(Debug, Clone, Default)]
pub struct FilterSummary {
    pub unique_fumen: Option<String>,
    pub minimal_report: Option<String>,
}

/// Runs stage 1 (and, in `minimal` mode, stage 2) of the filter engine.
///
/// `output_path` is required unless `options.output_mode` is
/// [`OutputMode::Unique`]. `choose` is consulted only if stage 2's
/// search finds more than one minimum-cardinality cover.
///
/// # Errors
///
/// Propagates any [`Error`] raised while reading the path table,
/// evaluating an AST, or decoding/encoding a fumen.
pub fn filter(
    filepath: &str,
    output_path: Option<&str>,
    asts: &[Ast],
    labels: &[String],
    build: &str,
    leftover: &str,
    width: i64,
    height: i64,
    hold: i64,
    log_file: &mut File,
    options: &FilterOptions,
    choose: impl FnMut(&[&str], &[&str]) -> Choice,
) -> Result<FilterSummary, Error> {
    let mut unique_fumens: HashSet<String> = HashSet::new();
    let mut fumen_lists: Vec<Vec<String>> = Vec::new();
    let mut total_rows: usize = 0;

    let mut writer = if options.output_mode == OutputMode::File {
        let path = output_path.ok_or_else(|| {
            Error::Validation("an output path is required for the 'file' output mode".to_string())
        })?;
        let mut writer = Writer::from_writer(File::create(path)?);
        writer.write_record(PATH_COLUMNS)?;
        Some(writer)
    } else {
        None
    };

    let mut reader = PathReader::open(filepath, build, leftover, width, height, hold)?;
    while let Some(row) = reader.read_row(true, true)? {
        total_rows += 1;
        if !row.solveable {
            continue;
        }

        let fumens = row.fumens.ok_or_else(|| {
            Error::Internal("path reader did not populate fumens despite assign_fumens=true".to_string())
        })?;
        let line = row.line.ok_or_else(|| {
            Error::Internal("path reader did not populate line despite assign_line=true".to_string())
        })?;

        let mut indices = Vec::new();
        for ast in asts {
            indices = evaluate_all(ast, &row.saves)?;
            if !indices.is_empty() {
                break;
            }
        }

        let mut new_fumens = Vec::new();
        for &i in &indices {
            new_fumens.extend(fumens[i].iter().cloned());
        }

        match options.output_mode {
            OutputMode::Unique => {
                unique_fumens.extend(new_fumens);
            }
            OutputMode::Minimal => {
                if !new_fumens.is_empty() {
                    fumen_lists.push(new_fumens);
                }
            }
            OutputMode::File => {
                let unused_pieces_field = line.get(COLUMN_UNUSED_PIECES).cloned().unwrap_or_default();
                let unused_tokens: Vec<&str> = unused_pieces_field.split(';').collect();
                let narrowed_unused: Vec<&str> = indices.iter().filter_map(|&i| unused_tokens.get(i).copied()).collect();

                let mut record: Vec<String> = Vec::with_capacity(PATH_COLUMNS.len());
                for column in PATH_COLUMNS {
                    let value = match column {
                        COLUMN_FUMENS => new_fumens.join(";"),
                        COLUMN_UNUSED_PIECES => narrowed_unused.join(";"),
                        COLUMN_FUMEN_COUNT => new_fumens.len().to_string(),
                        COLUMN_USED_PIECES => String::new(),
                        _ => line.get(column).cloned().unwrap_or_default(),
                    };
                    record.push(value);
                }
                if let Some(writer) = writer.as_mut() {
                    writer.write_record(&record)?;
                }
            }
        }
    }

    if let Some(writer) = writer.as_mut() {
        writer.flush()?;
    }

    let mut summary = FilterSummary::default();

    match options.output_mode {
        OutputMode::Unique => {
            let combined = fumen_combine(&unique_fumens.into_iter().collect::<Vec<_>>())?;
            log_file.write_all(combined.as_bytes())?;
            if options.console_print {
                println!("{}", combined);
            }
            summary.unique_fumen = Some(combined);
        }
        OutputMode::Minimal => {
            let report = generate_minimal_report(&fumen_lists, labels, total_rows, options, choose)?;
            log_file.write_all(report.as_bytes())?;
            log_file.write_all(b"\n")?;
            if options.console_print {
                println!("{}", report);
            }
            summary.minimal_report = Some(report);
        }
        OutputMode::File => {}
    }

    Ok(summary)
}

fn generate_minimal_report(
    fumen_lists: &[Vec<String>],
    labels: &[String],
    total_rows: usize,
    options: &FilterOptions,
    choose: impl FnMut(&[&str], &[&str]) -> Choice,
) -> Result<String, Error> {
    let graph = cover::fumens_to_graph(fumen_lists);
    let minimal = cover::find_minimal_nodes(&graph);
    let chosen: Vec<NodeId> = cover::find_best_set(minimal.sets, &graph, choose);

    let annotated = if options.cumulative {
        cover::cumulative_coverage(&graph, &chosen, total_rows)
    } else {
        cover::default_coverage(&graph, &chosen, total_rows)
    };

    let fumens: Vec<String> = annotated.iter().map(|(n, _)| graph.fumen(*n).to_string()).collect();
    let comments: Vec<String> = annotated.iter().map(|(_, label)| label.clone()).collect();
    let combined = fumen_combine_comments(&fumens, &comments, false)?;

    let line = if options.tinyurl {
        format!(
            "Tinyurl is an external service not reachable from this build; use the raw fumen URL: {}",
            make_fumen_url(&combined)
        )
    } else {
        combined.clone()
    };

    Ok(format!("True minimal for {}:\n{}", labels.join(","), line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Parser;
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
    fn unique_mode_combines_surviving_fumens() {
        let f1 = fumen_with_comment("TILJSZO");
        let header = format!(
            "{},{},{},{}",
            crate::reader::COLUMN_QUEUE,
            crate::reader::COLUMN_FUMEN_COUNT,
            crate::reader::COLUMN_UNUSED_PIECES,
            crate::reader::COLUMN_FUMENS
        );
        let contents = format!("{header}\nTILJSZO,1,O,{f}\n", header = header, f = f1);
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();

        let ast = Parser::parse("O").unwrap();
        let log = tempfile::NamedTempFile::new().unwrap();
        let mut log_file = fs_err::File::create(log.path()).unwrap();

        let options = FilterOptions { output_mode: OutputMode::Unique, ..Default::default() };
        let summary = filter(
            path,
            None,
            &[ast],
            &["O".to_string()],
            "",
            "O",
            10,
            4,
            1,
            &mut log_file,
            &options,
            |_a, _b| Choice::First,
        )
        .unwrap();
        assert!(summary.unique_fumen.is_some());
    }
}
