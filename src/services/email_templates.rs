//! HTML bodies for guest, hostel and staff emails.
//!
//! Every value that originates from a guest or an admin passes through
//! [`escape_html`] before it is interpolated.

use crate::entities::booking;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

const BRAND_COLOR: &str = "#0A4843";
const ACCENT_COLOR: &str = "#F7B03D";
const HOSTEL_ADDRESS: &str = "Av. Colón 1090, Asunción, Paraguay";
const DIRECTIONS_URL: &str =
    "https://www.google.com/maps/dir/?api=1&destination=-25.2855854,-57.6497056";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// The booking facts every booking-related template shows.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub room_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    pub guest_count: i32,
    pub total: Decimal,
    pub special_requests: Option<String>,
}

impl BookingDetails {
    pub fn from_booking(booking: &booking::Model, room_name: &str) -> Self {
        Self {
            guest_name: booking.guest_name.clone(),
            guest_email: booking.guest_email.clone(),
            guest_phone: booking.guest_phone.clone(),
            room_name: room_name.to_string(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: booking.nights,
            guest_count: booking.guest_count,
            total: booking.total_price(),
            special_requests: booking.special_requests.clone(),
        }
    }
}

pub fn escape_html(input: &str) -> String {
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

fn layout(title: &str, body: &str, footer: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <div style="background-color: {brand}; color: white; padding: 20px; border-radius: 8px 8px 0 0; text-align: center;">
    <h1 style="margin: 0; font-size: 24px;">{title}</h1>
  </div>
  <div style="background-color: #f9f9f9; padding: 20px; border: 1px solid #e5e5e5;">
    {body}
  </div>
  <div style="background-color: {brand}; color: white; padding: 15px; border-radius: 0 0 8px 8px; text-align: center;">
    <p style="margin: 0;">{footer}</p>
  </div>
</div>"#,
        brand = BRAND_COLOR,
        title = title,
        body = body,
        footer = footer,
    )
}

fn row(label: &str, value: &str) -> String {
    format!(
        r#"<p style="margin: 8px 0;"><strong>{}:</strong> {}</p>"#,
        label, value
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<a href="{}" style="display: inline-block; background-color: {}; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; font-weight: bold;">{}</a>"#,
        escape_html(href),
        BRAND_COLOR,
        label
    )
}

fn stay_rows(d: &BookingDetails) -> String {
    [
        row("Room", &escape_html(&d.room_name)),
        row("Check-in", &format!("{} (from 1:00 PM)", d.check_in)),
        row("Check-out", &format!("{} (by 12:00 PM)", d.check_out)),
        row("Nights", &d.nights.to_string()),
        row("Guests", &d.guest_count.to_string()),
        row("Total", &format!("${}", d.total)),
    ]
    .concat()
}

fn location_block() -> String {
    format!(
        r#"<h3 style="color: {};">How to find us</h3><p style="margin: 0 0 10px;">{}</p><a href="{}" style="color: {};">Get Directions</a>"#,
        BRAND_COLOR,
        HOSTEL_ADDRESS,
        escape_html(DIRECTIONS_URL),
        BRAND_COLOR
    )
}

/// Sent to the hostel inbox when a guest requests a stay.
pub fn hostel_booking_notification(d: &BookingDetails) -> RenderedEmail {
    let mut body = format!(
        r#"<h2 style="color: {};">Guest: {}</h2>"#,
        BRAND_COLOR,
        escape_html(&d.guest_name)
    );
    body.push_str(&row("Email", &escape_html(&d.guest_email)));
    body.push_str(&row(
        "Phone",
        &escape_html(d.guest_phone.as_deref().unwrap_or("Not provided")),
    ));
    body.push_str(&stay_rows(d));
    if let Some(requests) = d.special_requests.as_deref().filter(|s| !s.is_empty()) {
        body.push_str(&row("Special requests", &escape_html(requests)));
    }

    RenderedEmail {
        subject: format!("New Booking Request - {}", d.guest_name),
        html: layout("New Booking Request", &body, "Reply to this email to reach the guest."),
    }
}

pub fn guest_booking_received(hostel_name: &str, hostel_email: &str, d: &BookingDetails) -> RenderedEmail {
    let mut body = format!(
        r#"<h2 style="color: {};">Your Booking Summary</h2>"#,
        BRAND_COLOR
    );
    body.push_str(&stay_rows(d));
    body.push_str(&format!(
        r#"<h3 style="color: {};">What's next?</h3><ol><li>We'll confirm your reservation within 24 hours</li><li>Payment is due at check-in (cash or card)</li><li>Questions? Reply to this email</li></ol>"#,
        BRAND_COLOR
    ));
    body.push_str(&location_block());

    RenderedEmail {
        subject: format!("Booking Request Received - {}", hostel_name),
        html: layout(
            &format!("Thank you, {}!", escape_html(&d.guest_name)),
            &body,
            &format!("Questions? Contact us at {}", escape_html(hostel_email)),
        ),
    }
}

pub fn hostel_payment_received(d: &BookingDetails) -> RenderedEmail {
    let mut body = format!(
        r#"<h2 style="color: {};">Booking Details</h2>"#,
        BRAND_COLOR
    );
    body.push_str(&row("Guest", &escape_html(&d.guest_name)));
    body.push_str(&row("Email", &escape_html(&d.guest_email)));
    body.push_str(&stay_rows(d));

    RenderedEmail {
        subject: format!("Payment Received - {}", d.guest_name),
        html: layout(
            "Payment Confirmed",
            &body,
            &format!("Total paid: ${}", d.total),
        ),
    }
}

pub fn guest_payment_confirmed(
    hostel_name: &str,
    hostel_email: &str,
    d: &BookingDetails,
    checkin_link: &str,
) -> RenderedEmail {
    let mut body = format!(
        r#"<p style="color: #22c55e; font-weight: bold; text-align: center;">Payment Successful - ${}</p><h2 style="color: {};">Your Reservation</h2>"#,
        d.total, BRAND_COLOR
    );
    body.push_str(&stay_rows(d));
    body.push_str(&format!(
        r#"<div style="background-color: {}; padding: 20px; border-radius: 8px; text-align: center; margin: 20px 0;"><h3 style="color: {}; margin-top: 0;">Save time, check in online</h3><p>Complete your registration before you arrive.</p>{}</div>"#,
        ACCENT_COLOR,
        BRAND_COLOR,
        button(checkin_link, "Complete Online Check-in")
    ));
    body.push_str(&location_block());

    RenderedEmail {
        subject: format!("Booking Confirmed - {}", hostel_name),
        html: layout(
            "You're all set!",
            &body,
            &format!("Questions? Contact us at {}", escape_html(hostel_email)),
        ),
    }
}

pub fn checkin_reminder(hostel_name: &str, d: &BookingDetails, checkin_link: &str) -> RenderedEmail {
    let mut body = format!(
        r#"<p style="color: #333; line-height: 1.6;">Just a friendly reminder that your stay at {} begins <strong>tomorrow</strong>!</p>"#,
        escape_html(hostel_name)
    );
    body.push_str(&stay_rows(d));
    body.push_str(&format!(
        r#"<div style="background-color: {}; padding: 20px; border-radius: 8px; text-align: center; margin: 20px 0;"><h3 style="color: {}; margin-top: 0;">Check in online</h3><p>Complete your registration now to skip the paperwork when you arrive.</p>{}</div>"#,
        ACCENT_COLOR,
        BRAND_COLOR,
        button(checkin_link, "Complete Online Check-in")
    ));
    body.push_str(&location_block());

    RenderedEmail {
        subject: format!("Your stay starts tomorrow! - {}", hostel_name),
        html: layout(
            &format!("See you tomorrow, {}!", escape_html(&d.guest_name)),
            &body,
            "We can't wait to welcome you!",
        ),
    }
}

pub fn checkout_reminder(hostel_name: &str, guest_name: &str) -> RenderedEmail {
    let body = format!(
        r#"<p style="color: #333; line-height: 1.6;">Just a friendly reminder that today is your check-out day!</p>
<div style="background-color: {accent}20; padding: 15px; border-radius: 8px; margin: 20px 0;"><h3 style="color: {brand}; margin-top: 0;">Check-out by 12:00 PM</h3><p style="margin: 0;">Please return your key to reception before noon.</p></div>
<h3 style="color: {brand};">Before you go:</h3>
<ul style="color: #333; line-height: 1.8;"><li>Check you have all your belongings</li><li>Return any borrowed items</li><li>Let us know if you need luggage storage</li></ul>"#,
        accent = ACCENT_COLOR,
        brand = BRAND_COLOR,
    );

    RenderedEmail {
        subject: format!("Check-out reminder - {}", hostel_name),
        html: layout(
            &format!("Good morning, {}!", escape_html(guest_name)),
            &body,
            "Thank you for staying with us! Safe travels!",
        ),
    }
}

pub fn staff_invitation(
    hostel_name: &str,
    role: &str,
    accept_link: &str,
    message: Option<&str>,
    expires_at: DateTime<Utc>,
) -> RenderedEmail {
    let mut body = format!(
        r#"<p style="color: #333; line-height: 1.6;">You have been invited to join the {} team as <strong>{}</strong>.</p>"#,
        escape_html(hostel_name),
        escape_html(role)
    );
    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
        body.push_str(&format!(
            r#"<blockquote style="border-left: 4px solid {}; margin: 16px 0; padding-left: 12px; color: #555;">{}</blockquote>"#,
            ACCENT_COLOR,
            escape_html(message)
        ));
    }
    body.push_str(&format!(
        r#"<p style="text-align: center;">{}</p><p style="color: #777; font-size: 12px;">This invitation expires on {}.</p>"#,
        button(accept_link, "Accept Invitation"),
        expires_at.format("%Y-%m-%d")
    ));

    RenderedEmail {
        subject: format!("You're invited to {}", hostel_name),
        html: layout("Team Invitation", &body, hostel_name),
    }
}
