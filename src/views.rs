//! Server-rendered HTML pages.

use chrono::SecondsFormat;

use crate::models::location::LocationRecord;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const LOCATIONS_TEMPLATE: &str = include_str!("../templates/view_locations.html");

pub fn index_page() -> &'static str {
    INDEX_TEMPLATE
}

pub fn locations_page(records: &[LocationRecord]) -> String {
    let mut rows = String::new();

    if records.is_empty() {
        rows.push_str(
            "                <tr><td class=\"empty\" colspan=\"9\">No locations recorded yet.</td></tr>\n",
        );
    }

    for record in records {
        let accuracy = record
            .accuracy
            .map(|a| format!("{a:.1}"))
            .unwrap_or_else(|| "&ndash;".to_string());
        let user_agent = record
            .user_agent
            .as_deref()
            .map(escape_html)
            .unwrap_or_else(|| "&ndash;".to_string());

        rows.push_str(&format!(
            "                <tr><td>{id}</td><td>{lat}</td><td>{lon}</td><td>{accuracy}</td>\
             <td>{timestamp}</td><td>{user_agent}</td><td>{ip}</td><td>{created}</td>\
             <td><a href=\"https://www.openstreetmap.org/?mlat={lat}&amp;mlon={lon}#map=16/{lat}/{lon}\" \
             rel=\"noopener noreferrer\">open</a></td></tr>\n",
            id = record.id,
            lat = record.latitude,
            lon = record.longitude,
            timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            ip = escape_html(&record.ip_address.to_string()),
            created = record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }

    LOCATIONS_TEMPLATE
        .replace("{{count}}", &records.len().to_string())
        .replace("{{rows}}", rows.trim_end_matches('\n'))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::{IncomingLocation, ValidationPolicy};
    use chrono::Utc;
    use std::net::{IpAddr, Ipv4Addr};

    fn record(user_agent: &str) -> LocationRecord {
        IncomingLocation {
            latitude: Some(37.77),
            longitude: Some(-122.41),
            user_agent: Some(user_agent.to_string()),
            ..Default::default()
        }
        .into_record(
            ValidationPolicy::default(),
            IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_listing_shows_placeholder() {
        let page = locations_page(&[]);
        assert!(page.contains("0 record(s)"));
        assert!(page.contains("No locations recorded yet."));
        assert!(!page.contains("{{rows}}"));
    }

    #[test]
    fn rows_are_rendered_in_order() {
        let first = record("first");
        let second = record("second");
        let page = locations_page(&[first.clone(), second.clone()]);

        assert!(page.contains("2 record(s)"));
        let a = page.find(&first.id.to_string()).unwrap();
        let b = page.find(&second.id.to_string()).unwrap();
        assert!(a < b);
        assert!(page.contains("203.0.113.9"));
        assert!(page.contains("mlat=37.77&amp;mlon=-122.41"));
    }

    #[test]
    fn user_agent_is_escaped() {
        let page = locations_page(&[record("<script>alert('x')</script>")]);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
    }

    #[test]
    fn index_loads_client_script() {
        assert!(index_page().contains("/static/script.js"));
    }
}
