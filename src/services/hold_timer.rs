use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|p| *p.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoldState {
    NoHold,
    Counting { remaining_secs: i64 },
    Expired,
}

impl HoldState {
    pub fn is_expired(&self) -> bool {
        matches!(self, HoldState::Expired)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, HoldState::Counting { .. })
    }

    /// Remaining time as `m:ss`, only while counting.
    pub fn countdown(&self) -> Option<String> {
        match self {
            HoldState::Counting { remaining_secs } => Some(format!(
                "{}:{:02}",
                remaining_secs / 60,
                remaining_secs % 60
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HoldTimer {
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
}

impl HoldTimer {
    pub fn new(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            expires_at,
            expired: false,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Once expired, this timer stays expired even if `now` moves backwards.
    pub fn poll(&mut self, now: DateTime<Utc>) -> HoldState {
        let Some(expires_at) = self.expires_at else {
            return HoldState::NoHold;
        };
        if self.expired {
            return HoldState::Expired;
        }

        let remaining_ms = (expires_at - now).num_milliseconds();
        if remaining_ms <= 0 {
            self.expired = true;
            return HoldState::Expired;
        }

        // Partial seconds round up so a live hold never reads 0:00.
        HoldState::Counting {
            remaining_secs: (remaining_ms + 999) / 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldView {
    #[serde(flatten)]
    pub state: HoldState,
    pub expired: bool,
    pub countdown: Option<String>,
    pub hold_expires_at: Option<DateTime<Utc>>,
}

impl HoldView {
    pub fn new(state: HoldState, hold_expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            state,
            expired: state.is_expired(),
            countdown: state.countdown(),
            hold_expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-16T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_countdown_ticks_down() {
        let clock = ManualClock::new(t0());
        let mut timer = HoldTimer::new(Some(t0() + Duration::seconds(247)));

        let state = timer.poll(clock.now());
        assert_eq!(state, HoldState::Counting { remaining_secs: 247 });
        assert_eq!(state.countdown().as_deref(), Some("4:07"));

        clock.advance(Duration::seconds(1));
        assert_eq!(timer.poll(clock.now()).countdown().as_deref(), Some("4:06"));
    }

    #[test]
    fn test_past_expiry_reports_expired_without_countdown() {
        let mut timer = HoldTimer::new(Some(t0() - Duration::seconds(1)));
        let state = timer.poll(t0());
        assert!(state.is_expired());
        assert_eq!(state.countdown(), None);
    }

    #[test]
    fn test_expiry_exactly_now_is_expired() {
        let mut timer = HoldTimer::new(Some(t0()));
        assert_eq!(timer.poll(t0()), HoldState::Expired);
    }

    #[test]
    fn test_last_partial_second_still_shows_time() {
        let mut timer = HoldTimer::new(Some(t0() + Duration::milliseconds(400)));
        let state = timer.poll(t0());
        assert_eq!(state, HoldState::Counting { remaining_secs: 1 });
        assert_eq!(state.countdown().as_deref(), Some("0:01"));

        let mut timer = HoldTimer::new(Some(t0() + Duration::milliseconds(247_300)));
        assert_eq!(timer.poll(t0()).countdown().as_deref(), Some("4:08"));
    }

    #[test]
    fn test_no_hold_is_not_expired() {
        let mut timer = HoldTimer::new(None);
        let state = timer.poll(t0());
        assert_eq!(state, HoldState::NoHold);
        assert!(!state.is_expired());
        assert_eq!(state.countdown(), None);
    }

    #[test]
    fn test_expired_is_latched() {
        let clock = ManualClock::new(t0());
        let mut timer = HoldTimer::new(Some(t0() + Duration::seconds(2)));
        clock.advance(Duration::seconds(3));
        assert_eq!(timer.poll(clock.now()), HoldState::Expired);

        clock.set(t0());
        assert_eq!(timer.poll(clock.now()), HoldState::Expired);
    }

    #[test]
    fn test_countdown_pads_seconds() {
        assert_eq!(
            HoldState::Counting { remaining_secs: 5 }.countdown().as_deref(),
            Some("0:05")
        );
        assert_eq!(
            HoldState::Counting { remaining_secs: 600 }.countdown().as_deref(),
            Some("10:00")
        );
    }

    #[test]
    fn test_view_serializes_flat() {
        let view = HoldView::new(HoldState::Counting { remaining_secs: 61 }, None);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "counting");
        assert_eq!(json["remaining_secs"], 61);
        assert_eq!(json["countdown"], "1:01");
        assert_eq!(json["expired"], false);
    }
}
