pub mod booking_form;
pub mod calendar;
pub mod cancel;
pub mod clock;
pub mod email;
pub mod messaging;
pub mod notifications;
pub mod reminders;
pub mod reschedule;
pub mod scheduling;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
