use crate::submission::RequestRow;

#[cfg(feature = "web")]
use crate::config::MailConfig;
#[cfg(feature = "web")]
use crate::error::MailError;
#[cfg(feature = "web")]
use lettre::message::header::ContentType;
#[cfg(feature = "web")]
use lettre::transport::smtp::authentication::Credentials;
#[cfg(feature = "web")]
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Subject line for a new request notice
pub fn notice_subject(row: &RequestRow) -> String {
    let software = if row.software_nm.is_empty() {
        "N/A"
    } else {
        row.software_nm.as_str()
    };
    format!("New SW request received: {}", software)
}

/// HTML body listing every stored column of the request
pub fn notice_body(row: &RequestRow) -> String {
    let mut table = String::from("<h2>A new software request has been submitted.</h2>");
    table.push_str("<table border='1' cellpadding='5' cellspacing='0'>");
    table.push_str("<tr><th>Field</th><th>Value</th></tr>");
    for (key, value) in row.fields() {
        table.push_str(&format!(
            "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
            key,
            escape_html(value)
        ));
    }
    table.push_str("</table>");

    format!(
        "<html>\n  <body>\n    {}\n    <hr>\n    <p>This message was sent automatically.</p>\n  </body>\n</html>\n",
        table
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// STARTTLS mail client built from a [`MailConfig`]
#[cfg(feature = "web")]
pub struct Mailer {
    smtp: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

#[cfg(feature = "web")]
impl Mailer {
    /// Fails with [`MailError::MissingConfig`] unless sender, password and
    /// recipient are all set. No connection is opened here.
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let (Some(from), Some(password), Some(to)) = (
            config.sender_email.as_ref(),
            config.sender_password.as_ref(),
            config.recipient_email.as_ref(),
        ) else {
            return Err(MailError::MissingConfig);
        };
        if !config.is_complete() {
            return Err(MailError::MissingConfig);
        }

        let creds = Credentials::new(from.clone(), password.clone());
        let smtp = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.server())?
            .credentials(creds)
            .port(config.port())
            .build();

        Ok(Mailer {
            smtp,
            from: from.clone(),
            to: to.clone(),
        })
    }

    pub async fn send_html(&self, subject: &str, body: String) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(self.to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        self.smtp.send(email).await?;
        Ok(())
    }

    pub async fn send_request_notice(&self, row: &RequestRow) -> Result<(), MailError> {
        self.send_html(&notice_subject(row), notice_body(row)).await
    }
}

/// Send the notice for a stored request using the given configuration
#[cfg(feature = "web")]
pub async fn send_request_notice(config: &MailConfig, row: &RequestRow) -> Result<(), MailError> {
    Mailer::new(config)?.send_request_notice(row).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RequestRow {
        RequestRow {
            req_date: "20240305".into(),
            req_time: "09:00:00".into(),
            department: "R<&>D".into(),
            name: "Kim".into(),
            employee_id: "42".into(),
            software_nm: "MATLAB".into(),
            work_type: "install".into(),
        }
    }

    #[test]
    fn subject_names_the_software() {
        assert_eq!(notice_subject(&row()), "New SW request received: MATLAB");
        let mut unnamed = row();
        unnamed.software_nm.clear();
        assert_eq!(notice_subject(&unnamed), "New SW request received: N/A");
    }

    #[test]
    fn body_has_one_row_per_column_and_escapes_values() {
        let body = notice_body(&row());
        assert_eq!(body.matches("<tr><td><strong>").count(), 7);
        assert!(body.contains("<td><strong>software_nm</strong></td><td>MATLAB</td>"));
        assert!(body.contains("R&lt;&amp;&gt;D"));
        assert!(body.contains("<hr>"));
    }

    #[cfg(feature = "web")]
    #[test]
    fn incomplete_config_is_rejected_before_connecting() {
        let config = MailConfig {
            sender_email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(matches!(Mailer::new(&config), Err(MailError::MissingConfig)));
    }

    #[cfg(feature = "web")]
    #[tokio::test]
    async fn send_without_config_fails_fast() {
        let result = send_request_notice(&MailConfig::default(), &row()).await;
        assert!(matches!(result, Err(MailError::MissingConfig)));
    }
}
