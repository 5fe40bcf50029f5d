//! Session and campaign builders shared by the unit tests.

use funnel_core::{Campaign, Session, Stage, Timeline};

pub const MINUTE: i64 = 60_000;

/// A landing-only session at t=0.
pub fn session(id: &str) -> Session {
    Session {
        session_id: id.to_string(),
        device_type: "desktop".into(),
        ip_address: "203.0.113.7".into(),
        raw_location: String::new(),
        country: None,
        city: None,
        utm_campaign_id: None,
        timeline: Timeline::default(),
    }
}

/// Marks every stage up to and including `last` as reached, ten minutes
/// apart, and moves `updated_at` to the last reached stage.
pub fn through(mut session: Session, last: Stage) -> Session {
    let t = &mut session.timeline;
    for stage in Stage::ALL.iter().copied().filter(|s| *s <= last) {
        let ts = t.landing + stage.index() as i64 * 10 * MINUTE;
        match stage {
            Stage::Landing => {}
            Stage::FormStart => t.form_start = Some(ts),
            Stage::FormFilled => t.form_filled_without_login = Some(ts),
            Stage::UnderReview => t.under_review = Some(ts),
            Stage::PaymentStarted => t.payment_started = Some(ts),
            Stage::PaymentSuccess => t.payment_successful = Some(ts),
        }
        t.updated_at = ts;
    }
    session
}

pub fn with_device(mut session: Session, device: &str) -> Session {
    session.device_type = device.to_string();
    session
}

pub fn with_country(mut session: Session, country: &str) -> Session {
    session.country = Some(country.to_string());
    session
}

pub fn with_campaign(mut session: Session, utm_id: &str) -> Session {
    session.utm_campaign_id = Some(utm_id.to_string());
    session
}

pub fn campaign(utm_id: &str, source: &str, name: &str, medium: &str) -> Campaign {
    Campaign {
        utm_id: utm_id.to_string(),
        source: source.to_string(),
        campaign: name.to_string(),
        medium: medium.to_string(),
        active: true,
        created_at: 0,
        phone_number: None,
    }
}
