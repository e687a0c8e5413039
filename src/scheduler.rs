//! # Minute Tick Source
//!
//! Sleeps until the next wall-clock minute boundary and posts
//! [`Event::Tick`]. There is no sub-minute resolution: a tick always carries
//! a time truncated to the minute.
//!
//! The wall clock is read through a caller-supplied function, and
//! [`MinuteTicker`] remembers the last minute posted so a minute is never
//! ticked twice, even when a wakeup lands a few milliseconds before the
//! boundary or the clock is stepped back slightly.
//!
//! If the event queue closes the task ends; the face simply stops updating.

use crate::event::{Event, EventSender};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use std::time::Duration;

/// Time from `now` until the next `:00` second boundary.
///
/// Exactly on a boundary, the *next* boundary is a full minute away.
pub fn next_minute_delay(now: &NaiveDateTime) -> Duration {
    let into_minute =
        Duration::from_secs(now.second().into()) + Duration::from_nanos(now.nanosecond().into());
    // leap-second nanos (>= 1s) would underflow; treat as end of minute
    Duration::from_secs(60).saturating_sub(into_minute).max(Duration::from_millis(1))
}

/// Truncate to the start of the minute, rounding up if we are within
/// `slack` of the next one.
///
/// Timers never fire early on the monotonic clock, but the wall clock can
/// trail it by a few milliseconds; the slack keeps those wakeups on the
/// intended minute.
pub fn minute_of(now: NaiveDateTime, slack: Duration) -> NaiveDateTime {
    let nudged = now + ChronoDuration::from_std(slack).unwrap_or_else(|_| ChronoDuration::zero());
    nudged
        .with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(nudged)
}

const WAKE_SLACK: Duration = Duration::from_millis(500);

/// Backward clock steps up to this size repeat no minute; larger ones
/// (a manual clock change, DST fall-back) restart the sequence.
const MAX_BACKWARD_STEP_MINUTES: i64 = 5;

/// Turns raw wakeup times into a strictly increasing run of minutes.
#[derive(Debug, Default)]
pub struct MinuteTicker {
    last: Option<NaiveDateTime>,
}

impl MinuteTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last minute handed out, if any.
    pub fn last(&self) -> Option<NaiveDateTime> {
        self.last
    }

    fn within_step(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.last
            .filter(|last| *last - now < ChronoDuration::minutes(MAX_BACKWARD_STEP_MINUTES))
    }

    /// How long to sleep, seen from `now`, before the next tick is due.
    ///
    /// Normally the next `:00` boundary. If the clock reads earlier than the
    /// minute after the last tick (an early wakeup, a small backward step),
    /// sleep until that minute instead.
    pub fn delay(&self, now: &NaiveDateTime) -> Duration {
        match self.within_step(*now) {
            Some(last) => {
                let due = last + ChronoDuration::minutes(1);
                match (due - *now).to_std() {
                    Ok(wait) if wait > Duration::ZERO => wait,
                    _ => next_minute_delay(now),
                }
            }
            None => next_minute_delay(now),
        }
    }

    /// The minute to post for a wakeup at `now`, or `None` if that minute
    /// was already posted.
    pub fn on_wake(&mut self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let minute = minute_of(now, WAKE_SLACK);
        if let Some(last) = self.last {
            if minute <= last {
                if self.within_step(minute).is_some() {
                    debug!("Minute {} already ticked", minute.format("%H:%M"));
                    return None;
                }
                info!(
                    "Wall clock stepped back from {} to {}",
                    last.format("%H:%M"),
                    minute.format("%H:%M")
                );
            }
        }
        self.last = Some(minute);
        Some(minute)
    }
}

/// Post a tick at every minute boundary until the queue closes.
pub async fn run_ticks(events: EventSender) {
    run_ticks_with(events, || Local::now().naive_local()).await
}

/// [`run_ticks`] with the wall clock supplied by `clock`.
pub async fn run_ticks_with<C>(events: EventSender, mut clock: C)
where
    C: FnMut() -> NaiveDateTime,
{
    let mut ticker = MinuteTicker::new();
    loop {
        let delay = ticker.delay(&clock());
        tokio::time::sleep(delay).await;

        let Some(minute) = ticker.on_wake(clock()) else {
            continue;
        };
        debug!("Tick {}", minute.format("%H:%M"));
        if events.send(Event::Tick(minute)).await.is_err() {
            warn!("Event queue closed, minute ticks stopped");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;
    use chrono::NaiveDate;
    use std::collections::VecDeque;

    fn at(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 16)
            .unwrap()
            .and_hms_milli_opt(h, m, s, milli)
            .unwrap()
    }

    #[test]
    fn delay_runs_to_next_boundary() {
        assert_eq!(
            next_minute_delay(&at(10, 0, 15, 0)),
            Duration::from_secs(45)
        );
        assert_eq!(
            next_minute_delay(&at(10, 0, 59, 750)),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn on_boundary_waits_a_full_minute() {
        assert_eq!(next_minute_delay(&at(10, 0, 0, 0)), Duration::from_secs(60));
    }

    #[test]
    fn leap_second_does_not_underflow() {
        let leap = at(23, 59, 59, 1_500);
        assert_eq!(next_minute_delay(&leap), Duration::from_millis(1));
    }

    #[test]
    fn minute_truncates_and_absorbs_early_wakeups() {
        let slack = Duration::from_millis(500);
        assert_eq!(minute_of(at(10, 30, 0, 20), slack), at(10, 30, 0, 0));
        assert_eq!(minute_of(at(10, 29, 59, 900), slack), at(10, 30, 0, 0));
        assert_eq!(minute_of(at(10, 29, 42, 0), slack), at(10, 29, 0, 0));
    }

    #[test]
    fn early_wakeup_is_not_ticked_twice() {
        let mut ticker = MinuteTicker::new();
        assert_eq!(ticker.on_wake(at(10, 29, 59, 900)), Some(at(10, 30, 0, 0)));

        // the clock still reads before :00, sleep to the following minute
        assert_eq!(
            ticker.delay(&at(10, 29, 59, 901)),
            Duration::from_millis(60_099)
        );
        assert_eq!(ticker.on_wake(at(10, 29, 59, 950)), None);
        assert_eq!(ticker.on_wake(at(10, 31, 0, 10)), Some(at(10, 31, 0, 0)));
        assert_eq!(ticker.last(), Some(at(10, 31, 0, 0)));
    }

    #[test]
    fn small_backward_step_repeats_no_minute() {
        let mut ticker = MinuteTicker::new();
        ticker.on_wake(at(10, 31, 0, 0));

        assert_eq!(ticker.on_wake(at(10, 30, 58, 0)), None);
        assert_eq!(ticker.delay(&at(10, 30, 58, 0)), Duration::from_secs(62));
        assert_eq!(ticker.on_wake(at(10, 32, 0, 0)), Some(at(10, 32, 0, 0)));
    }

    #[test]
    fn large_backward_step_restarts_the_sequence() {
        let mut ticker = MinuteTicker::new();
        ticker.on_wake(at(10, 31, 0, 0));

        assert_eq!(ticker.delay(&at(9, 30, 30, 0)), Duration::from_secs(30));
        assert_eq!(ticker.on_wake(at(9, 31, 0, 5)), Some(at(9, 31, 0, 0)));
    }

    /// Clock that replays `times`, then keeps returning the last one.
    fn scripted_clock(times: Vec<NaiveDateTime>) -> impl FnMut() -> NaiveDateTime + Send {
        let mut times = VecDeque::from(times);
        let mut current = at(0, 0, 0, 0);
        move || {
            if let Some(next) = times.pop_front() {
                current = next;
            }
            current
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_posts_each_minute_once() {
        let (tx, mut rx) = event::channel();
        // the loop reads the clock once before sleeping and once on waking
        let clock = scripted_clock(vec![
            at(10, 29, 30, 0),
            at(10, 29, 59, 900), // wall clock trails the timer
            at(10, 29, 59, 901),
            at(10, 31, 0, 10),
            at(10, 31, 0, 11),
            at(10, 30, 59, 0), // stepped back a second
            at(10, 30, 59, 1),
            at(10, 32, 0, 0),
        ]);
        let task = tokio::spawn(run_ticks_with(tx, clock));

        let mut ticks = Vec::new();
        for _ in 0..3 {
            match rx.recv().await {
                Some(Event::Tick(minute)) => ticks.push(minute),
                other => panic!("Expected a tick, got {:?}", other),
            }
        }
        task.abort();

        assert_eq!(
            ticks,
            vec![at(10, 30, 0, 0), at(10, 31, 0, 0), at(10, 32, 0, 0)],
            "Each minute should be ticked exactly once, in order"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tick_loop_ends_when_queue_closes() {
        let (tx, rx) = event::channel();
        drop(rx);
        let clock = scripted_clock(vec![at(8, 0, 59, 0), at(8, 1, 0, 0)]);

        run_ticks_with(tx, clock).await;
    }
}
