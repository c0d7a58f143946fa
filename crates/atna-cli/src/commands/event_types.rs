//! `atna event-types` command implementation.

use anyhow::Result;
use atna_audit::{EventType, EventTypeRegistry};
use atna_core::{AtnaConfig, EventCategory};

pub fn run_event_types(config: &AtnaConfig) -> Result<()> {
    let registry = EventTypeRegistry::from_config(&config.audit)?;
    for event_type in registry.iter() {
        println!("{}", describe(event_type));
    }
    Ok(())
}

/// One line per event type: tag, category, event id, action, type codes.
fn describe(event_type: &EventType) -> String {
    let category = match event_type.category {
        EventCategory::Connection => "connection",
        EventCategory::StudyManagement => "study-management",
    };
    let mut line = format!(
        "{:<32} {:<18} {} action={}",
        event_type.tag,
        category,
        event_type.event_id,
        event_type.action.code()
    );
    for code in &event_type.type_codes {
        line.push_str(&format!(" type={}", code));
    }
    line
}
