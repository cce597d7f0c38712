//! Contact submission payload and the email rendered from it.

use serde::Deserialize;

/// Prefix of every relayed subject line.
pub const SUBJECT_PREFIX: &str = "New Contact Form Submission: ";

/// Contact form fields as posted by the website. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSubmission {
    #[serde(rename = "from_name")]
    pub sender_name: Option<String>,
    #[serde(rename = "from_email")]
    pub sender_email: Option<String>,
    pub company_name: Option<String>,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub inquiry_type: Option<String>,
}

/// An email ready to be handed to a [`Mailer`](super::Mailer).
///
/// The sender address and recipient are filled in by the transport from its
/// configuration; only request-derived parts live here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Display name for the `From` header.
    pub from_name: Option<String>,
    /// Submitter address, passed through unchecked.
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

impl ContactSubmission {
    /// Render the notification email for this submission.
    pub fn to_email(&self) -> OutgoingEmail {
        OutgoingEmail {
            from_name: non_empty(&self.sender_name),
            reply_to: non_empty(&self.sender_email),
            subject: format!("{SUBJECT_PREFIX}{}", field(&self.subject)),
            html_body: self.render_html(),
        }
    }

    fn render_html(&self) -> String {
        let row = |label: &str, value: &Option<String>| {
            format!(
                "<p><strong>{label}:</strong> {}</p>\n",
                escape_html(field(value))
            )
        };

        let mut html = String::from("<h2>New Contact Form Submission</h2>\n");
        html.push_str(&row("Name", &self.sender_name));
        html.push_str(&row("Company", &self.company_name));
        html.push_str(&row("Email", &self.sender_email));
        html.push_str(&row("Phone", &self.phone_number));
        html.push_str(&row("Country", &self.country));
        html.push_str(&row("Inquiry Type", &self.inquiry_type));
        html.push_str("<h3>Message:</h3>\n");
        html.push_str(&format!("<p>{}</p>\n", escape_html(field(&self.message))));
        html
    }
}

/// Escape text for safe embedding in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
