use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use crate::config::ServiceContext;
use crate::notifier::{NotificationEvent, Notifier};

/// Tracing layer that mirrors error events into the notifier queue. Level
/// selection happens via the filter attached in `init_observability`.
pub(crate) struct ErrorNotifyLayer {
    notifier: Notifier,
    service: ServiceContext,
}

impl ErrorNotifyLayer {
    pub(crate) fn new(notifier: Notifier, service: ServiceContext) -> Self {
        Self { notifier, service }
    }
}

impl<S> Layer<S> for ErrorNotifyLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let message = visitor.values.remove("message").map(strip_debug_quotes);

        self.notifier.try_notify(NotificationEvent {
            level: *event.metadata().level(),
            timestamp: Utc::now(),
            service: self.service.name.clone(),
            environment: self.service.environment.clone(),
            component: self.service.component.clone(),
            target: event.metadata().target().to_string(),
            message,
            fields: visitor.values,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    values: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn record(&mut self, field: &Field, value: String) {
        let value = if is_sensitive(field.name()) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.values.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }
}

fn strip_debug_quotes(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

fn is_sensitive(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    ["password", "secret", "token", "webhook", "authorization"]
        .iter()
        .any(|needle| field.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_field_names_are_redacted() {
        assert!(is_sensitive("pppoe_password"));
        assert!(is_sensitive("signing_secret"));
        assert!(is_sensitive("DISCORD_WEBHOOK_URL"));
        assert!(!is_sensitive("invoice_id"));
    }

    #[test]
    fn debug_quoting_is_stripped_from_messages() {
        assert_eq!(
            strip_debug_quotes("\"sweep failed\"".to_string()),
            "sweep failed"
        );
        assert_eq!(strip_debug_quotes("plain".to_string()), "plain");
    }
}
