//! Caller notifications
//!
//! Purchases and ticket lookups are reported to an external messaging
//! collaborator. The dispatcher only enqueues; a background worker delivers,
//! so a slow provider never holds up a USSD response.

use crate::menu::{PaymentMethod, Route, TravelClass};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Message for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Purchase {
        phone_number: String,
        route: Route,
        class: TravelClass,
        date: NaiveDate,
        amount: Decimal,
        method: PaymentMethod,
        wallet: String,
    },
    TicketLookup {
        phone_number: String,
        ticket_number: String,
    },
}

impl Notification {
    pub fn phone_number(&self) -> &str {
        match self {
            Notification::Purchase { phone_number, .. }
            | Notification::TicketLookup { phone_number, .. } => phone_number,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Purchase { .. } => "purchase",
            Notification::TicketLookup { .. } => "ticket_lookup",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification {kind} has no recipient")]
    MissingRecipient { kind: &'static str },
}

/// Delivery of caller notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        (**self).deliver(notification).await
    }
}

/// Notifier that records deliveries in the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.phone_number().trim().is_empty() {
            return Err(NotifyError::MissingRecipient {
                kind: notification.kind(),
            });
        }
        match notification {
            Notification::Purchase {
                phone_number,
                route,
                amount,
                method,
                ..
            } => tracing::info!(
                phone = %phone_number,
                route = route.code(),
                amount = %amount,
                method = ?method,
                "Ticket purchase notification"
            ),
            Notification::TicketLookup {
                phone_number,
                ticket_number,
            } => tracing::info!(
                phone = %phone_number,
                ticket = %ticket_number,
                "Ticket status notification"
            ),
        }
        Ok(())
    }
}

/// Spawn the delivery worker. It stops once every sender is dropped.
pub fn spawn_notifier<N>(mut rx: mpsc::Receiver<Notification>, notifier: N) -> JoinHandle<()>
where
    N: Notifier + 'static,
{
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            match notifier.deliver(&notification).await {
                Ok(()) => tracing::debug!(
                    kind = notification.kind(),
                    phone = %notification.phone_number(),
                    "Notification delivered"
                ),
                Err(e) => tracing::warn!(
                    kind = notification.kind(),
                    phone = %notification.phone_number(),
                    error = %e,
                    "Notification delivery failed"
                ),
            }
        }
        tracing::info!("Notification worker stopped");
    })
}

#[cfg(test)]
pub use testing::RecordingNotifier;


#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(ticket: &str) -> Notification {
        Notification::TicketLookup {
            phone_number: "+27820000001".to_string(),
            ticket_number: ticket.to_string(),
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_in_order() {
        let notifier = Arc::new(RecordingNotifier::new());
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_notifier(rx, notifier.clone());

        tx.send(lookup("A1")).await.unwrap();
        tx.send(lookup("A2")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(notifier.delivered(), vec![lookup("A1"), lookup("A2")]);
    }

    #[tokio::test]
    async fn test_worker_survives_delivery_failures() {
        let notifier = Arc::new(RecordingNotifier::failing());
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_notifier(rx, notifier.clone());

        tx.send(lookup("A1")).await.unwrap();
        tx.send(lookup("A2")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(notifier.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_log_notifier_requires_recipient() {
        assert!(LogNotifier.deliver(&lookup("X")).await.is_ok());

        let anonymous = Notification::TicketLookup {
            phone_number: " ".to_string(),
            ticket_number: "X".to_string(),
        };
        let err = LogNotifier.deliver(&anonymous).await.unwrap_err();
        assert_eq!(err.to_string(), "Notification ticket_lookup has no recipient");
    }

    #[test]
    fn test_notification_json_is_tagged() {
        let json = serde_json::to_value(lookup("A1")).unwrap();
        assert_eq!(json["type"], "ticket_lookup");
        assert_eq!(json["ticket_number"], "A1");
    }
}
