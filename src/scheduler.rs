use time::PrimitiveDateTime;

use crate::{
    error::{DriftwallError, DriftwallResult},
    schedule::Timeline,
};

/// Which event is active and how far into it the clock sits. Ephemeral:
/// recomputed on every tick, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ScheduleResult {
    pub index: usize,
    pub elapsed_in_event: i64, // seconds, in [0, event.duration)
}

/// Map the wall clock onto the cyclic playlist.
///
/// The position inside the cycle is the true mathematical modulo of the
/// signed seconds since the anchor, so a future anchor still resolves to a
/// valid in-range position. The active event is the first whose half-open
/// cumulative interval `[acc, acc + duration)` contains that position; at an
/// exact boundary the next event wins.
#[tracing::instrument(skip(timeline), level = "debug")]
pub fn resolve(timeline: &Timeline, now: PrimitiveDateTime) -> DriftwallResult<ScheduleResult> {
    let total = timeline.total_duration();
    if total == 0 {
        return Err(DriftwallError::DegenerateSchedule);
    }

    let elapsed = (now - timeline.anchor()).whole_seconds();
    let loop_pos = elapsed.rem_euclid(total);

    let mut accumulated = 0i64;
    for (index, event) in timeline.events().iter().enumerate() {
        if loop_pos < accumulated + event.duration() {
            return Ok(ScheduleResult {
                index,
                elapsed_in_event: loop_pos - accumulated,
            });
        }
        accumulated += event.duration();
    }

    // Unreachable under the modulo invariant, but rounding must not be
    // allowed to produce a garbage index.
    Ok(ScheduleResult {
        index: 0,
        elapsed_in_event: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Event;
    use time::{Duration, macros::datetime};

    fn basic_timeline() -> Timeline {
        Timeline::new(
            datetime!(2001-01-01 00:00:00),
            vec![
                Event::Static {
                    duration: 10,
                    file: "a.png".into(),
                },
                Event::Transition {
                    duration: 20,
                    from: "a.png".into(),
                    to: "b.png".into(),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn walkthrough_static_then_transition_then_wrap() {
        let tl = basic_timeline();
        let t0 = tl.anchor();

        let r = resolve(&tl, t0 + Duration::seconds(5)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (0, 5));

        let r = resolve(&tl, t0 + Duration::seconds(15)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (1, 5));
        assert_eq!(tl.get(1).unwrap().progress(r.elapsed_in_event), Some(0.25));

        let r = resolve(&tl, t0 + Duration::seconds(35)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (0, 5));
    }

    #[test]
    fn boundary_favors_next_event() {
        let tl = basic_timeline();
        let t0 = tl.anchor();

        let r = resolve(&tl, t0 + Duration::seconds(10)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (1, 0));

        // End of cycle is the start of the next one.
        let r = resolve(&tl, t0 + Duration::seconds(30)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (0, 0));
    }

    #[test]
    fn cyclic_invariance_including_negative_periods() {
        let tl = basic_timeline();
        let t0 = tl.anchor();
        let base = resolve(&tl, t0 + Duration::seconds(17)).unwrap();

        for k in [-3i64, -1, 1, 2, 100] {
            let shifted = resolve(&tl, t0 + Duration::seconds(17 + k * 30)).unwrap();
            assert_eq!(shifted, base, "period shift k={k}");
        }
    }

    #[test]
    fn future_anchor_still_resolves_in_range() {
        let tl = basic_timeline();
        // 7 seconds before the anchor: loop position 23, inside the
        // transition (10..30) at elapsed 13.
        let r = resolve(&tl, tl.anchor() - Duration::seconds(7)).unwrap();
        assert_eq!((r.index, r.elapsed_in_event), (1, 13));
    }

    #[test]
    fn result_always_in_range() {
        let tl = basic_timeline();
        let t0 = tl.anchor();
        for s in -100i64..100 {
            let r = resolve(&tl, t0 + Duration::seconds(s)).unwrap();
            assert!(r.index < tl.len());
            let dur = tl.get(r.index).unwrap().duration();
            assert!((0..dur).contains(&r.elapsed_in_event), "now={s}");
        }
    }

    #[test]
    fn index_monotone_within_one_cycle() {
        let tl = basic_timeline();
        let t0 = tl.anchor();
        let mut last = 0usize;
        for s in 0i64..30 {
            let r = resolve(&tl, t0 + Duration::seconds(s)).unwrap();
            assert!(r.index >= last);
            last = r.index;
        }
    }
}
