pub mod backend;
pub mod eligibility;
pub mod hold_timer;
pub mod hold_watch;
pub mod lifecycle;
pub mod refund;
