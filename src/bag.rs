//! Pure bag-geometry arithmetic: mapping a perfect-clear's width, height,
//! hold capacity and leftover length to bag compositions and the set of
//! pieces the final bag could not have contributed to the build.

use crate::piece::{parse_queue, is_queue, Piece, PieceCounter, BAG};
use crate::error::Error;

/// `PCNUM2LONUM(k)`: the leftover length implied by a 4-line PC index.
///
/// Valid for `k` in `1..=9`; the result is always in `1..=7`.
pub fn pcnum_to_leftover_len(pc_num: i64) -> i64 {
    ((4 * pc_num + 1).rem_euclid(7)) + 1
}

/// `WIDTHHEIGHT2NUMPIECES`: the number of pieces a PC of this geometry
/// consumes, including the pieces resting in hold at the end.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `width * height` is not divisible by 4.
pub fn width_height_to_num_pieces(width: i64, height: i64, hold: i64) -> Result<i64, Error> {
    let area = width * height;
    if area % 4 != 0 {
        return Err(Error::Validation(
            "Width and height does not produce an area divisible by 4 necessary for a PC".into(),
        ));
    }
    Ok(area / 4 + hold)
}

/// `LONUM2BAGCOMP`: the prefix of the queue accounted for by each bag,
/// given the leftover length and the total number of pieces in the PC.
///
/// The first entry is `leftover_len`, the rest are full bags of 7 except
/// possibly the last, which is the remainder.
pub fn bag_composition(leftover_len: i64, num_pieces: i64) -> Vec<i64> {
    let mut bag_comp = vec![leftover_len];
    let mut total = leftover_len;
    while total < num_pieces {
        let next = (num_pieces - total).min(7);
        bag_comp.push(next);
        total += next;
    }
    bag_comp
}

/// The index at which the final bag's pieces start inside the full queue:
/// the sum of every bag composition entry except the last.
pub fn leading_size(bag_comp: &[i64]) -> i64 {
    bag_comp[..bag_comp.len().saturating_sub(1)].iter().sum()
}

/// The set of bag pieces that `build` could not have consumed from the
/// final bag, before the queue itself is known to narrow it further.
///
/// Mirrors `_get_unused_last_bag`: if the PC spans fewer than three bags,
/// only `leftover` is subtracted from `build`; otherwise a full bag is
/// assumed to have been consumed in between and is subtracted too.
pub fn final_bag_unused(build: &[Piece], leftover: &[Piece], bag_comp: &[i64]) -> PieceCounter {
    let build_count = PieceCounter::from_pieces(build.iter().copied());
    let leftover_count = PieceCounter::from_pieces(leftover.iter().copied());

    let subtrahend = if bag_comp.len() < 3 {
        leftover_count
    } else {
        let full_bag = PieceCounter::from_pieces(BAG.iter().copied());
        leftover_count.union(&full_bag)
    };

    let last_bag_used = build_count.saturating_sub(&subtrahend);
    let full_bag = PieceCounter::from_pieces(BAG.iter().copied());
    full_bag.saturating_sub(&last_bag_used)
}

/// Resolved leftover and build strings ready for [`crate::reader::PathReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub leftover: String,
    pub build: String,
}

/// Resolves the `-b`/`-l`/`-pc`/`-ll`/`-ho` CLI flags into concrete leftover
/// and build strings, performing every cross-check the original tool does.
///
/// `leftover` may contain at most one `-`, splitting "still held" pieces
/// from pieces "used from the following bag" (the `X-Y` form of `-l`).
///
/// # Errors
///
/// Returns [`Error::Validation`] for every inconsistency the original CLI
/// rejects: a build/leftover containing non-bag characters, more than one
/// `-` in leftover, a leftover length that disagrees with `pc_num`, or a
/// build that would need to hold more pieces than `hold` allows.
pub fn resolve_geometry(
    leftover: &str,
    leftover_length: Option<i64>,
    build: Option<&str>,
    pc_num: Option<i64>,
    hold: i64,
) -> Result<Geometry, Error> {
    if let Some(build) = build {
        if !is_queue(build) {
            return Err(Error::Validation(
                "Build expected to contain only TILJSZO pieces".into(),
            ));
        }
    }
    if leftover.is_empty() && build.is_some() {
        return Err(Error::Validation("-l must be set".into()));
    }

    let halves: Vec<&str> = leftover.splitn(3, '-').collect();
    if halves.len() > 2 {
        return Err(Error::Validation(
            "Leftover should contain at most one '-'".into(),
        ));
    }
    for half in &halves {
        if !is_queue(half) {
            return Err(Error::Validation(
                "Leftover expected to contain only TILJSZO pieces aside from '-'".into(),
            ));
        }
    }

    let mut leftover_length = leftover_length;
    if let Some(pc_num) = pc_num {
        let from_pc = pcnum_to_leftover_len(pc_num);
        if let Some(given) = leftover_length {
            if given != from_pc {
                return Err(Error::Validation(
                    "Leftover length and PC number are inconsistent".into(),
                ));
            }
        }
        leftover_length = Some(from_pc);
    }

    if halves.len() == 1 && build.is_some() {
        if let Some(pc_num) = pc_num {
            if pcnum_to_leftover_len(pc_num) != halves[0].len() as i64 {
                return Err(Error::Validation(
                    "PC number doesn't match the actual length of leftover".into(),
                ));
            }
        }
        if let Some(len) = leftover_length {
            if len != halves[0].len() as i64 {
                return Err(Error::Validation(
                    "Leftover length doesn't match the actual length of leftover".into(),
                ));
            }
        }
    }

    let leftover_length = leftover_length.ok_or_else(|| {
        Error::Validation("Either -pc or -ll must be set".into())
    })?;
    if !(1..=7).contains(&leftover_length) {
        return Err(Error::Validation(
            "Leftover length out of valid 1-7 range".into(),
        ));
    }

    let mut halves: Vec<String> = halves.into_iter().map(str::to_string).collect();
    if halves.len() == 1 && (halves[0].len() as i64) < leftover_length {
        halves.push(String::new());
    }

    if halves.len() == 2 && halves[0].len() as i64 > hold && !halves[1].is_empty() {
        return Err(Error::Validation(
            "More leftover pieces unused than possible to hold".into(),
        ));
    }

    let (leftover, build) = if halves.len() == 1 && build.is_some() {
        (halves.remove(0), build.unwrap().to_string())
    } else if halves.len() == 2 {
        let used_leftover_length = leftover_length - halves[0].len() as i64;
        let padding: String = std::iter::repeat('X').take(used_leftover_length.max(0) as usize).collect();
        let build = format!("{}{}", padding, halves[1]);
        let leftover = format!("{}{}", padding, halves[0]);
        (leftover, build)
    } else {
        (halves.remove(0), String::new())
    };

    let leftover_pieces = parse_queue(&leftover.replace('X', ""))
        .map_err(|e| Error::Validation(e.to_string()))?;
    let build_pieces = parse_queue(&build.replace('X', ""))
        .map_err(|e| Error::Validation(e.to_string()))?;
    let leftover_counter = PieceCounter::from_pieces(leftover_pieces);
    let build_counter = PieceCounter::from_pieces(build_pieces);

    let only_leftover_build = build_counter.is_subset_of(&leftover_counter);
    let unused_leftover = leftover_counter.saturating_sub(&build_counter);
    if !only_leftover_build && unused_leftover.total() > hold as u32 {
        return Err(Error::Validation(format!(
            "Not possible to build {} with given leftover {} with hold {}",
            build, leftover, hold
        )));
    }

    Ok(Geometry { leftover, build })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcnum_to_leftover_len_scenario() {
        assert_eq!(pcnum_to_leftover_len(2), 3);
        for k in 1..=9 {
            let len = pcnum_to_leftover_len(k);
            assert!((1..=7).contains(&len));
        }
    }

    #[test]
    fn bag_composition_scenario() {
        let comp = bag_composition(3, 11);
        assert_eq!(comp, vec![3, 7, 1]);
        assert_eq!(leading_size(&comp), 10);
    }

    #[test]
    fn width_height_rejects_non_multiple_of_four() {
        assert!(width_height_to_num_pieces(10, 3, 1).is_err());
    }

    #[test]
    fn width_height_includes_hold() {
        assert_eq!(width_height_to_num_pieces(10, 4, 1).unwrap(), 11);
    }

    #[test]
    fn resolve_geometry_plain_leftover() {
        let geo = resolve_geometry("O", None, Some("OILJO"), None, 1).unwrap();
        assert_eq!(geo.leftover, "O");
        assert_eq!(geo.build, "OILJO");
    }

    #[test]
    fn resolve_geometry_rejects_too_many_dashes() {
        assert!(resolve_geometry("T-I-O", None, None, Some(1), 1).is_err());
    }

    #[test]
    fn resolve_geometry_rejects_exceeding_hold() {
        // build "IJ" draws J from the next bag and leaves T of the leftover
        // stranded with no hold slot to carry it forward.
        let result = resolve_geometry("TI", Some(2), Some("IJ"), None, 0);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_geometry_split_form_pads_with_x() {
        let geo = resolve_geometry("T-IO", Some(3), None, None, 2).unwrap();
        assert_eq!(geo.leftover, "XXT");
        assert_eq!(geo.build, "XXIO");
    }
}
