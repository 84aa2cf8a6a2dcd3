//! Points awarded for one resolved question.
//!
//! Flat ceiling of 100, 20 points per wrong attempt, 1 point per 5 s
//! elapsed, floor of 30 so a finished question always pays something.
//! Applied exactly once, when the answer status flips to correct.

pub const POINTS_CEILING: u32 = 100;
pub const POINTS_FLOOR: u32 = 30;

const WRONG_ATTEMPT_PENALTY: i64 = 20;
const SECONDS_PER_PENALTY_POINT: i64 = 5;

pub fn compute_points(wrong_attempts: u32, elapsed_seconds: u32) -> u32 {
  let penalty = i64::from(wrong_attempts) * WRONG_ATTEMPT_PENALTY
    + i64::from(elapsed_seconds) / SECONDS_PER_PENALTY_POINT;
  (i64::from(POINTS_CEILING) - penalty).max(i64::from(POINTS_FLOOR)) as u32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn perfect_answer_pays_the_ceiling() {
    assert_eq!(compute_points(0, 0), 100);
    assert_eq!(compute_points(0, 4), 100);
  }

  #[test]
  fn one_retry_and_twelve_seconds_pays_78() {
    assert_eq!(compute_points(1, 12), 78);
  }

  #[test]
  fn floor_is_never_undercut() {
    assert_eq!(compute_points(10, 0), 30);
    assert_eq!(compute_points(0, 100_000), 30);
    assert_eq!(compute_points(u32::MAX, u32::MAX), 30);
  }

  #[test]
  fn monotone_non_increasing_in_both_arguments() {
    for wrong in 0..6 {
      for secs in (0..120).step_by(7) {
        let here = compute_points(wrong, secs);
        assert!(here >= POINTS_FLOOR && here <= POINTS_CEILING);
        assert!(compute_points(wrong + 1, secs) <= here);
        assert!(compute_points(wrong, secs + 5) <= here);
      }
    }
  }
}
