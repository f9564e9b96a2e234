pub mod booking;
pub mod check_in;
pub mod consent_log;
pub mod content;
pub mod email_reminder;
pub mod faq;
pub mod guest;
pub mod hostel;
pub mod hostel_image;
pub mod hostel_rule;
pub mod invitation;
pub mod room;
