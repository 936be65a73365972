pub mod availability;
pub mod booking;
pub mod notification;
pub mod slots;

pub use availability::{is_date_available, navigate_month, AvailabilityWindow, MonthGrid};
pub use booking::{Booking, BookingId, BookingOrigin, LocalBooking, NewBooking, ReminderKind};
pub use notification::{
    CancellationRequest, ConfirmationRequest, NotificationResponse, ReminderRequest,
    RescheduleRequest,
};
pub use slots::SLOT_CATALOG;
