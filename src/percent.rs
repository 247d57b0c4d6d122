//! Tallies how often a wanted-save expression is achievable across a
//! path table, with optional prefix-tree breakdown and failure listing.

use std::collections::HashMap;
use std::fmt::Write as _;

use fs_err::File;
use std::io::Write as IoWrite;

use crate::error::Error;
use crate::expr::{evaluate, first_matching, Ast};
use crate::piece::{queue_val, sort_queue};
use crate::reader::PathReader;

/// A node of the per-prefix counting tree: a count plus, lazily, one
/// child per next piece seen.
#[derive(Debug, Clone, Default)]
struct PercentNode {
    count: u64,
    children: Option<HashMap<char, PercentNode>>,
}

impl PercentNode {
    fn leaf(count: u64) -> Self {
        PercentNode { count, children: None }
    }
}

/// Walks (and lazily grows) the path from `node` down `queue`'s first
/// `depth` pieces, incrementing the count at `node` itself and at every
/// prefix node visited along the way.
fn bump_path(node: &mut PercentNode, queue: &str, depth: usize) {
    node.count += 1;
    let mut current = node;
    for piece in queue.chars().take(depth) {
        let children = current.children.get_or_insert_with(HashMap::new);
        let child = children.entry(piece).or_insert_with(PercentNode::default);
        child.count += 1;
        current = child;
    }
}

/// Options controlling [`percent`]'s accounting mode.
#[derive(Debug, Clone, Default)]
pub struct PercentOptions {
    pub console_print: bool,
    pub include_fails: bool,
    pub over_solves: bool,
    pub all_saves: bool,
    pub best_save: bool,
    pub tree_depth: usize,
}

/// Runs the percent engine over `filepath`, writing a plain-text report
/// to `log_file` (and, if requested, stdout).
///
/// # Errors
///
/// Propagates any [`Error`] raised while reading the path table or
/// evaluating an AST.
pub fn percent(
    filepath: &str,
    asts: &[Ast],
    labels: &[String],
    build: &str,
    leftover: &str,
    width: i64,
    height: i64,
    hold: i64,
    log_file: &mut File,
    options: &PercentOptions,
) -> Result<(), Error> {
    let mut saveable_counters: Vec<PercentNode> = asts.iter().map(|_| PercentNode::default()).collect();
    let mut total = PercentNode::default();
    let mut fails = Vec::new();
    let mut all_saves_dict: HashMap<String, u64> = HashMap::new();

    let mut reader = PathReader::open(filepath, build, leftover, width, height, hold)?;

    while let Some(row) = reader.read_row(false, false)? {
        if options.over_solves && !row.solveable {
            continue;
        }

        if options.all_saves {
            for save in &row.saves {
                *all_saves_dict.entry(save.clone()).or_insert(0) += 1;
            }
            total.count += 1;
            continue;
        }

        // Best-save mode attributes a row to its single highest-priority save
        // (mutual exclusion). Otherwise every wanted save is independent: a
        // row can count toward more than one save's tally.
        let mut any_matched = false;
        if options.best_save {
            if let Some(index) = first_matching(asts, &row.saves)? {
                bump_path(&mut saveable_counters[index], &row.queue, options.tree_depth);
                any_matched = true;
            }
        } else if !row.saves.is_empty() {
            for (i, ast) in asts.iter().enumerate() {
                if evaluate(ast, &row.saves)? {
                    bump_path(&mut saveable_counters[i], &row.queue, options.tree_depth);
                    any_matched = true;
                }
            }
        }

        if !any_matched && options.include_fails {
            fails.push(row.queue.clone());
        }

        bump_path(&mut total, &row.queue, options.tree_depth);
    }

    let (labels, saveable_counters): (Vec<String>, Vec<PercentNode>) = if options.all_saves {
        let mut entries: Vec<(String, u64)> = all_saves_dict.into_iter().collect();
        entries.sort_by_key(|(save, _)| queue_val(save).unwrap_or(0));
        entries
            .into_iter()
            .map(|(save, count)| (save, PercentNode::leaf(count)))
            .unzip()
    } else {
        (labels.to_vec(), saveable_counters)
    };

    let output = print_percent(&labels, &saveable_counters, &total, &fails, options.tree_depth);
    log_file.write_all(output.as_bytes())?;
    if options.console_print {
        print!("{}", output);
    }
    Ok(())
}

fn print_tree_helper(pieces: &str, node: &PercentNode, total_node: &PercentNode, tree_depth: usize, depth: usize) -> String {
    let mut output = String::new();
    let save_percent = if total_node.count != 0 {
        (node.count as f64 / total_node.count as f64) * 100.0
    } else {
        0.0
    };

    if depth > 0 {
        let indent = "  ".repeat(depth - 1);
        let _ = writeln!(
            output,
            "{}∟ {} -> {:.2}% [{}/{}]",
            indent, pieces, save_percent, node.count, total_node.count
        );
    }

    if depth < tree_depth {
        if let (Some(children), Some(total_children)) = (&node.children, &total_node.children) {
            let mut keys: Vec<char> = children.keys().copied().collect();
            keys.sort();
            for piece in keys {
                if let Some(total_child) = total_children.get(&piece) {
                    let child = &children[&piece];
                    let next_pieces = format!("{}{}", pieces, piece);
                    output.push_str(&print_tree_helper(&next_pieces, child, total_child, tree_depth, depth + 1));
                }
            }
        }
    }

    output
}

fn print_percent(
    labels: &[String],
    saveable_counters: &[PercentNode],
    total: &PercentNode,
    fails: &[String],
    tree_depth: usize,
) -> String {
    let mut output = String::new();

    if !fails.is_empty() {
        output.push_str("Fails:\n");
        output.push_str(&fails.join("\n"));
        output.push_str("\n\n");
    }

    for (label, counter) in labels.iter().zip(saveable_counters.iter()) {
        let save_percent = if total.count != 0 {
            (counter.count as f64 / total.count as f64) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(output, "{}: {:.2}% [{}/{}]", label, save_percent, counter.count, total.count);
        if tree_depth == 0 {
            continue;
        }
        output.push_str(&print_tree_helper("", counter, total, tree_depth, 0));
    }

    output
}

/// Sorts a piece-count histogram's keys into canonical save order, for
/// callers that built the histogram themselves (e.g. tests).
pub fn sorted_saves(saves: &[String]) -> Vec<String> {
    let mut sorted = saves.to_vec();
    sorted.sort_by_key(|s| queue_val(&sort_queue(s).unwrap_or_else(|_| s.clone())).unwrap_or(0));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Parser;
    use std::io::Write;

    fn write_path_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn scenario_5_percent_over_solves_vs_total() {
        let header = format!(
            "{},{},{},{}",
            crate::reader::COLUMN_QUEUE,
            crate::reader::COLUMN_FUMEN_COUNT,
            crate::reader::COLUMN_UNUSED_PIECES,
            crate::reader::COLUMN_FUMENS
        );
        let fumen = crate::fumen::encode(&[crate::fumen::Page {
            field: crate::fumen::Field::new(4),
            comment: "TILJSZO".to_string(),
        }]);
        let contents = format!(
            "{header}\nTILJSZO,1,O,{f}\nILJSZOT,1,O,{f}\nLJSZOTI,1,O,{f}\nJSZOTIL,0,,\n",
            header = header,
            f = fumen
        );
        let file = write_path_csv(&contents);
        let path = file.path().to_str().unwrap();

        let ast = Parser::parse("O").unwrap();
        let log = tempfile::NamedTempFile::new().unwrap();
        let mut log_file = fs_err::File::create(log.path()).unwrap();

        let opts_over = PercentOptions { over_solves: true, ..Default::default() };
        percent(
            path,
            &[ast.clone()],
            &["O".to_string()],
            "",
            "O",
            10,
            4,
            1,
            &mut log_file,
            &opts_over,
        )
        .unwrap();

        let opts_total = PercentOptions { over_solves: false, ..Default::default() };
        let mut log_file2 = fs_err::File::create(log.path()).unwrap();
        percent(
            path,
            &[ast],
            &["O".to_string()],
            "",
            "O",
            10,
            4,
            1,
            &mut log_file2,
            &opts_total,
        )
        .unwrap();
    }

    #[test]
    fn sorted_saves_orders_canonically() {
        let saves = vec!["OT".to_string(), "TI".to_string()];
        let sorted = sorted_saves(&saves);
        assert_eq!(sorted, vec!["TI".to_string(), "OT".to_string()]);
    }
}
