use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::models::{
    CancellationRequest, ConfirmationRequest, NotificationResponse, ReminderKind, ReminderRequest,
    RescheduleRequest,
};
use crate::services::email::{EmailMessage, EmailProvider};
use crate::services::messaging::{format_phone, MessagingProvider};

/// Sends the customer- and owner-facing messages for each booking event.
///
/// Implementations report failure through [`NotificationResponse`] rather
/// than an error; callers log it and carry on.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    async fn send_confirmation(&self, req: &ConfirmationRequest) -> NotificationResponse;

    async fn send_cancellation(&self, req: &CancellationRequest) -> NotificationResponse;

    async fn send_reschedule(&self, req: &RescheduleRequest) -> NotificationResponse;

    async fn send_reminder(&self, kind: ReminderKind, req: &ReminderRequest) -> NotificationResponse;
}

/// Date as shown to people, e.g. "Monday, June 3, 2024".
pub fn display_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub struct Notifier {
    email: Box<dyn EmailProvider>,
    sms: Box<dyn MessagingProvider>,
    from_email: String,
    reply_to_email: String,
    owner_email: String,
    site_url: String,
}

impl Notifier {
    pub fn new(
        email: Box<dyn EmailProvider>,
        sms: Box<dyn MessagingProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            email,
            sms,
            from_email: config.from_email.clone(),
            reply_to_email: config.reply_to_email.clone(),
            owner_email: config.owner_email.clone(),
            site_url: config.public_base_url().to_string(),
        }
    }

    fn reschedule_url(&self, booking_id: &str) -> String {
        format!("{}/#/reschedule?id={booking_id}", self.site_url)
    }

    fn cancel_url(&self, booking_id: &str) -> String {
        format!("{}/#/cancel?id={booking_id}", self.site_url)
    }

    fn customer_message(&self, to: &str, subject: String, lines: Vec<String>) -> EmailMessage {
        EmailMessage {
            from: self.from_email.clone(),
            to: to.to_string(),
            reply_to: self.reply_to_email.clone(),
            subject,
            html: render_html(&lines),
            text: lines.join("\n\n"),
        }
    }

    /// Customer email; its outcome is the outcome of the notification.
    async fn deliver(&self, message: EmailMessage) -> NotificationResponse {
        match self.email.send_email(&message).await {
            Ok(()) => NotificationResponse::ok(),
            Err(e) => {
                tracing::error!(error = %e, to = %message.to, subject = %message.subject, "failed to send email");
                NotificationResponse::failed(e.to_string())
            }
        }
    }

    /// Owner alert. Failures are logged only.
    async fn alert_owner(&self, customer_email: &str, subject: String, lines: Vec<String>) {
        if self.owner_email.is_empty() {
            tracing::debug!("OWNER_EMAIL not set, skipping owner alert");
            return;
        }

        let message = EmailMessage {
            from: self.from_email.clone(),
            to: self.owner_email.clone(),
            reply_to: customer_email.to_string(),
            subject,
            html: render_html(&lines),
            text: lines.join("\n\n"),
        };
        if let Err(e) = self.email.send_email(&message).await {
            tracing::warn!(error = %e, "failed to send owner alert");
        }
    }

    async fn text_customer(&self, phone: &str, body: &str) {
        let to = format_phone(phone);
        if let Err(e) = self.sms.send_message(&to, body).await {
            tracing::warn!(error = %e, to = %to, "failed to send SMS");
        }
    }
}

#[async_trait]
impl NotificationDispatch for Notifier {
    async fn send_confirmation(&self, req: &ConfirmationRequest) -> NotificationResponse {
        let mut lines = vec![
            format!("Hi {}!", req.name),
            "Your website consultation has been confirmed.".to_string(),
            format!("Date: {}", req.date),
            format!("Time: {}", req.time),
        ];
        if let Some(business) = &req.business_name {
            lines.push(format!("Business: {business}"));
        }
        lines.push("We'll send you a reminder the day before your appointment.".to_string());
        if let Some(id) = &req.booking_id {
            lines.push(format!("Need to reschedule? {}", self.reschedule_url(id)));
            lines.push(format!("Need to cancel? {}", self.cancel_url(id)));
        }

        let response = self
            .deliver(self.customer_message(
                &req.email,
                format!("Booking Confirmed: {} at {}", req.date, req.time),
                lines,
            ))
            .await;

        let mut owner_lines = vec![
            format!("Name: {}", req.name),
            format!("Email: {}", req.email),
            format!("Date: {}", req.date),
            format!("Time: {}", req.time),
        ];
        if let Some(phone) = &req.phone {
            owner_lines.push(format!("Phone: {phone}"));
        }
        if let Some(business) = &req.business_name {
            owner_lines.push(format!("Business: {business}"));
        }
        self.alert_owner(
            &req.email,
            format!("New Booking: {} - {} at {}", req.name, req.date, req.time),
            owner_lines,
        )
        .await;

        if let Some(phone) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            let body = format!(
                "Hi {}! Your website consultation is confirmed for {} at {}.",
                req.name, req.date, req.time
            );
            self.text_customer(phone, &body).await;
        }

        response
    }

    async fn send_cancellation(&self, req: &CancellationRequest) -> NotificationResponse {
        let lines = vec![
            format!("Hi {},", req.name),
            format!(
                "Your consultation on {} at {} has been cancelled.",
                req.date, req.time
            ),
            format!(
                "Changed your mind? You can book a new time at {}",
                self.site_url
            ),
        ];
        let response = self
            .deliver(self.customer_message(
                &req.email,
                format!("Booking Cancelled: {} at {}", req.date, req.time),
                lines,
            ))
            .await;

        let mut owner_lines = vec![
            format!("Name: {}", req.name),
            format!("Email: {}", req.email),
            format!("Date: {}", req.date),
            format!("Time: {}", req.time),
        ];
        if let Some(business) = &req.business_name {
            owner_lines.push(format!("Business: {business}"));
        }
        self.alert_owner(
            &req.email,
            format!("Booking Cancelled: {} - {} at {}", req.name, req.date, req.time),
            owner_lines,
        )
        .await;

        response
    }

    async fn send_reschedule(&self, req: &RescheduleRequest) -> NotificationResponse {
        let mut lines = vec![
            format!("Hi {},", req.name),
            "Your consultation has been rescheduled.".to_string(),
            format!("Previous: {} at {}", req.old_date, req.old_time),
            format!("New: {} at {}", req.new_date, req.new_time),
        ];
        if let Some(id) = &req.booking_id {
            lines.push(format!("Need another change? {}", self.reschedule_url(id)));
        }
        let response = self
            .deliver(self.customer_message(
                &req.email,
                format!("Booking Rescheduled: {} at {}", req.new_date, req.new_time),
                lines,
            ))
            .await;

        let mut owner_lines = vec![
            format!("Name: {}", req.name),
            format!("Email: {}", req.email),
            format!("From: {} at {}", req.old_date, req.old_time),
            format!("To: {} at {}", req.new_date, req.new_time),
        ];
        if let Some(business) = &req.business_name {
            owner_lines.push(format!("Business: {business}"));
        }
        self.alert_owner(
            &req.email,
            format!(
                "Booking Rescheduled: {} - {} at {}",
                req.name, req.new_date, req.new_time
            ),
            owner_lines,
        )
        .await;

        response
    }

    async fn send_reminder(&self, kind: ReminderKind, req: &ReminderRequest) -> NotificationResponse {
        let (subject, opening) = match kind {
            ReminderKind::OneDay => (
                "Reminder — call tomorrow".to_string(),
                format!("Just a reminder: our call is tomorrow, {} at {}.", req.date, req.time),
            ),
            ReminderKind::StartingSoon => (
                "Starting shortly".to_string(),
                format!("Our call starts shortly, at {} today.", req.time),
            ),
        };

        let lines = vec![
            format!("Hi {}!", req.name),
            opening,
            format!("Can't make it? {}", self.reschedule_url(&req.booking_id)),
        ];
        self.deliver(self.customer_message(&req.email, subject, lines))
            .await
    }
}

fn render_html(lines: &[String]) -> String {
    let body: String = lines
        .iter()
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect();
    format!("<!DOCTYPE html><html><body>{body}</body></html>")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
