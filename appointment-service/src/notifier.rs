use async_trait::async_trait;
use booking_core::{Channel, ChannelOutcome, DeliveryReport, NotificationError, NotificationIntent, Notifier};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

/// Hands notification intents to the notification service through Kafka.
/// Email and SMS delivery happens on the consuming side.
#[derive(Clone)]
pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: FutureProducer, topic: String) -> Self {
        Self { producer, topic }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn notify(&self, intent: &NotificationIntent) -> Result<DeliveryReport, NotificationError> {
        let json = serde_json::to_string(intent)?;
        let key = intent.appointment.id.to_string();
        let record = FutureRecord::to(&self.topic)
            .payload(&json)
            .key(&key);

        let (partition, offset) = self
            .producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| NotificationError::Transport(format!("Failed to publish notification: {}", e)))?;

        Ok(DeliveryReport {
            outcomes: vec![ChannelOutcome {
                channel: Channel::Broker,
                delivered: true,
                detail: format!("published to {} [{}] at offset {}", self.topic, partition, offset),
            }],
        })
    }
}
