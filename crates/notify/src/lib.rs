//! Outbound email for LeadChat.
//!
//! The only message sent today is the thank-you note that follows a saved
//! lead. Delivery goes through Resend when an API key is configured.

pub mod resend;

pub use resend::ResendMailer;

use std::sync::Arc;

use leadchat_config::EmailConfig;
use leadchat_core::notify::{Email, Mailer};
use tracing::info;

pub const THANK_YOU_SUBJECT: &str = "Thanks for reaching out!";

/// Build the configured mailer, or `None` when email is disabled.
pub fn build_from_config(config: &EmailConfig) -> Option<Arc<dyn Mailer>> {
    let api_key = config.api_key.as_deref().filter(|k| !k.is_empty())?;
    info!(from = %config.from, "Thank-you emails enabled");
    Some(Arc::new(ResendMailer::new(&config.api_url, api_key)))
}

/// The thank-you email sent to a freshly captured lead.
pub fn thank_you_email(from: &str, name: &str, to: &str) -> Email {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #E63946;">Thanks for connecting, {name}!</h2>
  <p>We received your message and one of our team members will be in touch with you shortly.</p>
  <p>In the meantime, feel free to reply to this email if you have any questions.</p>
  <br>
  <p>Best regards,<br>The Team</p>
</div>"#,
        name = escape_html(name)
    );

    Email {
        from: from.to_string(),
        to: to.to_string(),
        subject: THANK_YOU_SUBJECT.to_string(),
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
