//! End-to-end tests wiring the path reader into the percent and filter
//! engines, the way the CLI does.
//!
//! All tests share one deliberately small PC geometry (4 wide, 4 tall, no
//! hold) so that `final_bag_unused` leaves exactly `S`, `Z`, `O` unseen
//! from a `TILJ` queue (§4.1/§4.5): every save is `SZO` plus whatever the
//! path table's unused-pieces token adds, which lets a wanted save on
//! `T`/`I`/`L` distinguish between tokens on the same row.

use std::io::Write;

use pcsaves::cover::Choice;
use pcsaves::expr::Parser;
use pcsaves::filter::{self, FilterOptions, OutputMode};
use pcsaves::fumen::{encode, Field, Page};
use pcsaves::percent::{self, PercentOptions};
use pcsaves::reader::{COLUMN_FUMENS, COLUMN_FUMEN_COUNT, COLUMN_QUEUE, COLUMN_UNUSED_PIECES};

fn fumen_with_comment(comment: &str) -> String {
    encode(&[Page { field: Field::new(4), comment: comment.to_string() }])
}

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn header() -> String {
    format!("{},{},{},{}", COLUMN_QUEUE, COLUMN_FUMEN_COUNT, COLUMN_UNUSED_PIECES, COLUMN_FUMENS)
}

#[test]
fn percent_reports_over_total_rows_including_unsolveable() {
    let contents = format!(
        "{header}\nTILJ,1,,x\nILTJ,1,,x\nJLTI,0,,\n",
        header = header()
    );
    let file = write_csv(&contents);

    let ast = Parser::parse("O").unwrap();
    let log = tempfile::NamedTempFile::new().unwrap();
    let mut log_file = fs_err::File::create(log.path()).unwrap();
    let options = PercentOptions { over_solves: false, ..Default::default() };
    percent::percent(
        file.path().to_str().unwrap(),
        &[ast],
        &["O".to_string()],
        "",
        "",
        4,
        4,
        0,
        &mut log_file,
        &options,
    )
    .unwrap();

    let output = std::fs::read_to_string(log.path()).unwrap();
    assert!(output.contains("[2/3]"));
}

#[test]
fn percent_non_best_save_counts_are_independent_not_mutually_exclusive() {
    // The row's lone unused-pieces token "OT" makes both wanted saves
    // match simultaneously; neither should steal the other's count the
    // way mutual-exclusion (best-save) mode would.
    let contents = format!("{header}\nTILJ,1,OT,x\n", header = header());
    let file = write_csv(&contents);

    let ast_o = Parser::parse("O").unwrap();
    let ast_t = Parser::parse("T").unwrap();
    let log = tempfile::NamedTempFile::new().unwrap();
    let mut log_file = fs_err::File::create(log.path()).unwrap();
    let options = PercentOptions::default();
    percent::percent(
        file.path().to_str().unwrap(),
        &[ast_o, ast_t],
        &["O".to_string(), "T".to_string()],
        "",
        "",
        4,
        4,
        0,
        &mut log_file,
        &options,
    )
    .unwrap();

    let output = std::fs::read_to_string(log.path()).unwrap();
    assert!(output.contains("O: 100.00% [1/1]"));
    assert!(output.contains("T: 100.00% [1/1]"));
}

#[test]
fn filter_minimal_mode_reports_a_true_minimal_cover() {
    // Three rows of the same queue, each solvable only via a different
    // leftover piece (T, I, L) and a distinct fumen; the minimal cover
    // must keep all three since none of their fumens overlap.
    let f_t = fumen_with_comment("ILJ");
    let f_i = fumen_with_comment("TLJ");
    let f_l = fumen_with_comment("TIJ");
    let contents = format!(
        "{header}\nTILJ,1,T,{f_t}\nTILJ,1,I,{f_i}\nTILJ,1,L,{f_l}\n",
        header = header(),
        f_t = f_t,
        f_i = f_i,
        f_l = f_l
    );
    let file = write_csv(&contents);

    let ast = Parser::parse("T||I||L").unwrap();
    let log = tempfile::NamedTempFile::new().unwrap();
    let mut log_file = fs_err::File::create(log.path()).unwrap();
    let options = FilterOptions { output_mode: OutputMode::Minimal, console_print: false, tinyurl: false, ..Default::default() };
    let summary = filter::filter(
        file.path().to_str().unwrap(),
        None,
        &[ast],
        &["TIL".to_string()],
        "",
        "",
        4,
        4,
        0,
        &mut log_file,
        &options,
        |_a, _b| Choice::First,
    )
    .unwrap();

    let report = summary.minimal_report.unwrap();
    assert!(report.starts_with("True minimal for TIL:"));
}

#[test]
fn filter_file_mode_narrows_unused_pieces_to_surviving_indices() {
    let f_t = fumen_with_comment("ILJ");
    let f_i = fumen_with_comment("TLJ");
    let contents = format!(
        "{header}\nTILJ,2,T;I,{f_t};{f_i}\n",
        header = header(),
        f_t = f_t,
        f_i = f_i
    );
    let file = write_csv(&contents);

    let ast = Parser::parse("T").unwrap();
    let log = tempfile::NamedTempFile::new().unwrap();
    let mut log_file = fs_err::File::create(log.path()).unwrap();
    let out = tempfile::NamedTempFile::new().unwrap();
    let options = FilterOptions { output_mode: OutputMode::File, console_print: false, tinyurl: false, ..Default::default() };
    filter::filter(
        file.path().to_str().unwrap(),
        Some(out.path().to_str().unwrap()),
        &[ast],
        &["T".to_string()],
        "",
        "",
        4,
        4,
        0,
        &mut log_file,
        &options,
        |_a, _b| Choice::First,
    )
    .unwrap();

    let mut reader = csv::Reader::from_path(out.path()).unwrap();
    let headers = reader.headers().unwrap().clone();
    let unused_index = headers.iter().position(|h| h == COLUMN_UNUSED_PIECES).unwrap();
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[unused_index], "T");
}
