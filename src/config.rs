use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// Empty disables the authoritative store; bookings then go to the fallback.
    pub database_url: String,
    pub admin_token: String,
    /// Shown as the organizer in calendar invites.
    pub business_name: String,
    pub site_url: String,
    pub owner_email: String,
    pub from_email: String,
    pub reply_to_email: String,
    pub resend_api_key: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    pub fallback_path: String,
    pub reminder_interval_secs: u64,
    pub utc_offset_hours: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "leadbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Our Studio".to_string()),
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            owner_email: env::var("OWNER_EMAIL").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "bookings@example.com".to_string()),
            reply_to_email: env::var("REPLY_TO_EMAIL")
                .unwrap_or_else(|_| "bookings@example.com".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
            fallback_path: env::var("FALLBACK_PATH")
                .unwrap_or_else(|_| "fallback_bookings.json".to_string()),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            utc_offset_hours: env::var("UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Base URL used in cancel/reschedule links, without a trailing slash.
    pub fn public_base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}
