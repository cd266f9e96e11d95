use anyhow::Result;
use booking_core::{DeliveryReport, NotificationIntent, Notifier};
use futures::StreamExt;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::Message;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Consumes notification intents published by the appointment service and
/// delivers each one over the client's channels.
pub struct NotificationHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotificationHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn run(&self, consumer: StreamConsumer) {
        let mut message_stream = consumer.stream();

        while let Some(message) = message_stream.next().await {
            match message {
                Ok(m) => {
                    if let Some(payload) = m.payload_view::<str>() {
                        match payload {
                            Ok(json_str) => {
                                if let Err(e) = self.handle_payload(json_str).await {
                                    error!("Error handling notification: {}", e);
                                }
                            }
                            Err(e) => error!("Error parsing payload: {}", e),
                        }
                    }
                    if let Err(e) = consumer.commit_message(&m, rdkafka::consumer::CommitMode::Async) {
                        error!("Error committing message: {}", e);
                    }
                }
                Err(e) => error!("Error receiving message: {}", e),
            }
        }
    }

    pub async fn handle_payload(&self, json_str: &str) -> Result<DeliveryReport> {
        let intent: NotificationIntent = serde_json::from_str(json_str)?;
        let report = self.notifier.notify(&intent).await?;

        for outcome in &report.outcomes {
            if outcome.delivered {
                info!(
                    "{:?} for {} via {}: {}",
                    intent.kind, intent.appointment.appointment_number, outcome.channel, outcome.detail
                );
            } else {
                warn!(
                    "{:?} for {} via {} failed: {}",
                    intent.kind, intent.appointment.appointment_number, outcome.channel, outcome.detail
                );
            }
        }
        if report.outcomes.is_empty() {
            warn!(
                "{:?} for {} had no deliverable channel",
                intent.kind, intent.appointment.appointment_number
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_core::notify::MockNotifier;
    use booking_core::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn intent(kind: NotificationKind) -> NotificationIntent {
        let request = BookingRequest {
            service_type: "Dental".to_string(),
            client: ClientInfo {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                phone: "555".to_string(),
            },
            appointment_date: "2025-06-10".to_string(),
            appointment_time: "10:00".to_string(),
            purpose: None,
        };
        let appointment = NewAppointment::pending(&request, "APP-20250601-C0DE".to_string(), Utc::now())
            .into_appointment(Uuid::new_v4());
        match kind {
            NotificationKind::Confirmation => NotificationIntent::confirmation(appointment),
            NotificationKind::Reminder => NotificationIntent::reminder(appointment),
            NotificationKind::StatusUpdate => {
                NotificationIntent::status_update(appointment, AppointmentStatus::Confirmed)
            }
        }
    }

    #[tokio::test]
    async fn confirmation_goes_out_by_email_and_sms() {
        let handler = NotificationHandler::new(Arc::new(SimulatedNotifier));
        let payload = serde_json::to_string(&intent(NotificationKind::Confirmation)).unwrap();

        let report = handler.handle_payload(&payload).await.unwrap();
        let channels: Vec<Channel> = report.outcomes.iter().map(|o| o.channel).collect();
        assert_eq!(channels, vec![Channel::Email, Channel::Sms]);
    }

    #[tokio::test]
    async fn status_update_goes_out_by_email_only() {
        let handler = NotificationHandler::new(Arc::new(SimulatedNotifier));
        let payload = serde_json::to_string(&intent(NotificationKind::StatusUpdate)).unwrap();

        let report = handler.handle_payload(&payload).await.unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].channel, Channel::Email);
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        let handler = NotificationHandler::new(Arc::new(notifier));

        assert!(handler.handle_payload("{\"kind\":\"carrier_pigeon\"}").await.is_err());
    }

    #[tokio::test]
    async fn delivery_failure_is_reported() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(NotificationError::Transport("smtp timeout".to_string())));
        let handler = NotificationHandler::new(Arc::new(notifier));
        let payload = serde_json::to_string(&intent(NotificationKind::Reminder)).unwrap();

        assert!(handler.handle_payload(&payload).await.is_err());
    }
}
