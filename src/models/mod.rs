pub mod booking;
pub mod locale;
pub mod payment_method;
pub mod refund;

pub use booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
pub use locale::Locale;
pub use payment_method::PaymentMethod;
pub use refund::RefundQuote;
