use crate::models::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    SubmitPayment,
    Confirm,
    Cancel,
    HoldExpired,
}

impl BookingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEvent::SubmitPayment => "submit_payment",
            BookingEvent::Confirm => "confirm",
            BookingEvent::Cancel => "cancel",
            BookingEvent::HoldExpired => "hold_expires",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} a booking that is {from}", .event.as_str())]
pub struct TransitionError {
    pub from: BookingStatus,
    pub event: BookingEvent,
}

pub fn can_cancel(status: BookingStatus) -> bool {
    matches!(
        status,
        BookingStatus::PendingPayment
            | BookingStatus::PendingConfirm
            | BookingStatus::WaitingSupplier
            | BookingStatus::Confirmed
    )
}

pub fn transition(
    from: BookingStatus,
    event: BookingEvent,
) -> Result<BookingStatus, TransitionError> {
    use BookingStatus::*;

    let next = match (event, from) {
        (BookingEvent::SubmitPayment, PendingPayment) => Some(PendingConfirm),
        (BookingEvent::Confirm, PendingPayment | PendingConfirm | WaitingSupplier) => {
            Some(Confirmed)
        }
        (BookingEvent::Cancel, s) if can_cancel(s) => Some(Cancelled),
        (BookingEvent::HoldExpired, PendingPayment) => Some(Expired),
        _ => None,
    };

    next.ok_or(TransitionError { from, event })
}
