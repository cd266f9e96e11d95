use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::error::NotificationError;
use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    Reminder,
    StatusUpdate,
}

/// A request to tell the client about something that happened to their
/// appointment. Delivery is decoupled from the lifecycle operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub kind: NotificationKind,
    pub appointment: Appointment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<AppointmentStatus>,
}

impl NotificationIntent {
    pub fn confirmation(appointment: Appointment) -> Self {
        Self { kind: NotificationKind::Confirmation, appointment, new_status: None }
    }

    pub fn reminder(appointment: Appointment) -> Self {
        Self { kind: NotificationKind::Reminder, appointment, new_status: None }
    }

    pub fn status_update(appointment: Appointment, new_status: AppointmentStatus) -> Self {
        Self { kind: NotificationKind::StatusUpdate, appointment, new_status: Some(new_status) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Broker,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
            Channel::Broker => write!(f, "broker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub delivered: bool,
    pub detail: String,
}

/// Per-channel results. Logged by the caller, never used for control flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.delivered)
    }
}

#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, intent: &NotificationIntent) -> Result<DeliveryReport, NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// Messages for an intent. A channel is left out when the matching contact
/// field is blank; status updates only go out by email.
pub fn render(intent: &NotificationIntent) -> (Option<EmailMessage>, Option<SmsMessage>) {
    let appt = &intent.appointment;
    let email_to = Some(appt.client_email.trim()).filter(|s| !s.is_empty());
    let sms_to = Some(appt.client_phone.trim()).filter(|s| !s.is_empty());

    match intent.kind {
        NotificationKind::Confirmation => {
            let email = email_to.map(|to| EmailMessage {
                to: to.to_string(),
                subject: format!("Appointment Confirmation - {}", appt.appointment_number),
                body: format!(
                    "Dear {},\n\n\
                     Your appointment has been successfully booked!\n\n\
                     Appointment Details:\n\
                     - Appointment Number: {}\n\
                     - Service: {}\n\
                     - Date: {}\n\
                     - Time: {}\n\n\
                     Please arrive 10 minutes early. If you need to reschedule, please contact us with your appointment number.\n",
                    appt.client_name,
                    appt.appointment_number,
                    appt.service_type,
                    appt.appointment_date,
                    appt.appointment_time
                ),
            });
            let sms = sms_to.map(|to| SmsMessage {
                to: to.to_string(),
                body: format!(
                    "Your appointment {} is confirmed for {} at {}.",
                    appt.appointment_number, appt.appointment_date, appt.appointment_time
                ),
            });
            (email, sms)
        }
        NotificationKind::Reminder => {
            let text = format!(
                "Reminder: Your appointment {} is scheduled for {} at {}.",
                appt.appointment_number, appt.appointment_date, appt.appointment_time
            );
            let email = email_to.map(|to| EmailMessage {
                to: to.to_string(),
                subject: format!("Appointment Reminder - {}", appt.appointment_number),
                body: text.clone(),
            });
            let sms = sms_to.map(|to| SmsMessage { to: to.to_string(), body: text });
            (email, sms)
        }
        NotificationKind::StatusUpdate => {
            let status = intent.new_status.unwrap_or(appt.status);
            let email = email_to.map(|to| EmailMessage {
                to: to.to_string(),
                subject: format!("Appointment Status Update - {}", appt.appointment_number),
                body: format!(
                    "Your appointment {} status has been updated to: {}\n\n\
                     If you have any questions, please contact us with your appointment number.\n",
                    appt.appointment_number, status
                ),
            });
            (email, None)
        }
    }
}

/// Renders messages and writes them to the log instead of handing them to
/// an SMTP or SMS provider.
#[derive(Debug, Clone, Default)]
pub struct SimulatedNotifier;

#[async_trait]
impl Notifier for SimulatedNotifier {
    async fn notify(&self, intent: &NotificationIntent) -> Result<DeliveryReport, NotificationError> {
        let (email, sms) = render(intent);
        let mut report = DeliveryReport::default();

        if let Some(email) = email {
            info!(to = %email.to, subject = %email.subject, "[email simulation] {}", email.body);
            report.outcomes.push(ChannelOutcome {
                channel: Channel::Email,
                delivered: true,
                detail: format!("email simulated for {}", email.to),
            });
        }

        if let Some(sms) = sms {
            info!(to = %sms.to, "[sms simulation] {}", sms.body);
            report.outcomes.push(ChannelOutcome {
                channel: Channel::Sms,
                delivered: true,
                detail: format!("sms simulated for {}", sms.to),
            });
        }

        Ok(report)
    }
}
