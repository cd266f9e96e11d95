mod handlers;

use anyhow::Result;
use booking_core::SimulatedNotifier;
use clap::Parser;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "notification-service")]
struct Args {
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    kafka_brokers: String,

    #[arg(long, env = "NOTIFICATION_TOPIC", default_value = "appointment-notifications")]
    notification_topic: String,

    #[arg(long, default_value = "notification-service")]
    group_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", &args.group_id)
        .set("bootstrap.servers", &args.kafka_brokers)
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "6000")
        .set("enable.auto.commit", "true")
        .create()?;

    consumer.subscribe(&[&args.notification_topic])?;

    let handler = handlers::NotificationHandler::new(Arc::new(SimulatedNotifier));

    info!("Notification service consuming {}", args.notification_topic);
    handler.run(consumer).await;

    Ok(())
}
