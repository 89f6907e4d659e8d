use time::PrimitiveDateTime;

use crate::{
    cache::ImageCache,
    composite::{Frame, Surface, render},
    error::DriftwallResult,
    schedule::{Event, Timeline},
    scheduler::{ScheduleResult, resolve},
};

/// Drives one wallpaper: schedule resolution, image residency, compositing.
///
/// Deliberately free of any event loop. A timer, a test harness, or a manual
/// step function calls [`tick`](Self::tick) on its own cadence (a coarse
/// re-poll, not an event-precise wake-up) and [`redraw`](Self::redraw) when
/// the surface is exposed or resized. Everything runs synchronously on the
/// caller's thread; the loop is the sole owner of the cache and of the
/// last-known schedule position.
pub struct RefreshLoop {
    timeline: Timeline,
    cache: ImageCache,
    last: Option<ScheduleResult>,
}

impl RefreshLoop {
    /// Build the loop and immediately resolve the schedule against `now`, so
    /// the first frame reflects the current clock rather than the first
    /// timer tick.
    pub fn new(timeline: Timeline, cache_capacity: usize, now: PrimitiveDateTime) -> Self {
        let last = match resolve(&timeline, now) {
            Ok(result) => Some(result),
            Err(err) => {
                tracing::warn!(%err, "initial schedule resolve failed");
                None
            }
        };
        Self {
            timeline,
            cache: ImageCache::new(cache_capacity),
            last,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn last_known(&self) -> Option<ScheduleResult> {
        self.last
    }

    /// Timer trigger: re-resolve the schedule, pull the frame's image(s)
    /// through the cache, composite, and remember the result for redraws.
    ///
    /// Returns `Ok(true)` when a frame was rendered. Per-tick failures (a
    /// degenerate schedule, one undecodable image) are logged and recovered
    /// by keeping the previously rendered frame; they yield `Ok(false)` and
    /// never abort playback.
    pub fn tick(&mut self, now: PrimitiveDateTime, surface: &mut Surface) -> DriftwallResult<bool> {
        let result = match resolve(&self.timeline, now) {
            Ok(result) => result,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, "skipping tick");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match self.composite(result, surface) {
            Ok(()) => {
                self.last = Some(result);
                Ok(true)
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, index = result.index, "keeping previous frame");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Exposure/resize trigger: re-composite from the last-known schedule
    /// position and the resident images, without re-running the scheduler.
    /// Presentation events must not shift which event is considered active.
    pub fn redraw(&mut self, surface: &mut Surface) -> DriftwallResult<bool> {
        let Some(result) = self.last else {
            tracing::debug!("redraw requested before any resolved frame");
            return Ok(false);
        };

        match self.composite(result, surface) {
            Ok(()) => Ok(true),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, index = result.index, "redraw skipped");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn composite(&mut self, result: ScheduleResult, surface: &mut Surface) -> DriftwallResult<()> {
        let Some(event) = self.timeline.get(result.index).cloned() else {
            // Stale index can only mean the schedule degenerated underneath
            // us; treat it like a skipped tick.
            return Err(crate::DriftwallError::DegenerateSchedule);
        };

        match &event {
            Event::Static { file, .. } => {
                let img = self.cache.get_or_load(file)?;
                render(surface, &Frame::Single(&img));
            }
            Event::Transition { from, to, .. } => {
                let from = self.cache.get_or_load(from)?;
                let to = self.cache.get_or_load(to)?;
                let progress = event.progress(result.elapsed_in_event).unwrap_or(1.0);
                render(
                    surface,
                    &Frame::Blend {
                        from: &from,
                        to: &to,
                        progress,
                    },
                );
            }
        }
        Ok(())
    }
}
