use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Matches any HTML tag; used for the plain-text fallback.
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Open-tracking pixel embedded in every rendered message.
const TRACKING_PIXEL_URL: &str = "https://app.mailforge.dev/api/emails/track";

/// Renders the branded HTML wrapper around a message.
///
/// Pure: the only non-deterministic input is the current year embedded in
/// the footer. `message` is trusted verbatim; callers are expected to
/// supply sanitized HTML, nothing is escaped here.
pub fn render_message(sender_name: &str, message: &str, footer_text: Option<&str>) -> String {
    let footer = footer_text
        .filter(|text| !text.is_empty())
        .map(|text| format!(r#"<div style="margin-bottom: 10px;">{}</div>"#, text))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Message from {sender_name} via MailForge</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            color: #333333;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
        }}
        .header {{
            text-align: center;
            padding: 20px 0;
            border-bottom: 2px solid #2f6f4f;
            margin-bottom: 25px;
        }}
        .logo {{
            color: #2f6f4f;
            font-size: 24px;
            font-weight: bold;
            margin-bottom: 10px;
        }}
        .content {{
            background-color: #f9f9f9;
            padding: 25px;
            border-radius: 5px;
            margin-bottom: 25px;
        }}
        .message {{
            margin-bottom: 20px;
            line-height: 1.8;
        }}
        .signature {{
            margin-top: 30px;
            padding-top: 20px;
            border-top: 1px solid #e0e0e0;
            color: #666666;
        }}
        .footer {{
            text-align: center;
            font-size: 12px;
            color: #999999;
            margin-top: 30px;
            padding-top: 20px;
            border-top: 1px solid #e0e0e0;
        }}
    </style>
</head>
<body>
    <div class="header">
        <div class="logo">MailForge</div>
        <div style="color: #666666;">CRM for Small Teams</div>
    </div>

    <div class="content">
        <div style="font-size: 18px; font-weight: 500; margin-bottom: 15px;">
            Message from {sender_name}
        </div>

        <div class="message">
            {message}
        </div>

        <div class="signature">
            <div>Best regards,</div>
            <div style="font-weight: 500;">{sender_name}</div>
            <div>Sent via MailForge CRM</div>
        </div>
    </div>

    <div class="footer">
        <img src="{pixel}" height="1" width="1">
        {footer}
        <div>&copy; {year} MailForge. All rights reserved.</div>
    </div>
</body>
</html>
"#,
        sender_name = sender_name,
        message = message,
        pixel = TRACKING_PIXEL_URL,
        footer = footer,
        year = Utc::now().year(),
    )
}

/// Derives a plain-text fallback from an HTML body by dropping tags.
pub fn strip_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_message_embeds_content() {
        let html = render_message("Dana", "<p>Invoice attached.</p>", None);

        assert!(html.contains("Message from Dana"));
        assert!(html.contains("<p>Invoice attached.</p>"));
        assert!(html.contains(TRACKING_PIXEL_URL));
        assert!(html.contains(&Utc::now().year().to_string()));
        // No footer text was given, so no footer block beyond the pixel/year.
        assert!(!html.contains("margin-bottom: 10px;\">"));
    }

    #[test]
    fn test_render_message_with_footer_text() {
        let html = render_message("Dana", "<p>Hi</p>", Some("This email was sent from MailForge CRM."));
        assert!(html.contains("This email was sent from MailForge CRM."));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Hello <b>world</b></p>"),
            "Hello world".to_string()
        );
        assert_eq!(strip_tags("no markup"), "no markup".to_string());
        assert_eq!(strip_tags("<br/><img src=\"x\">"), "".to_string());
    }
}
