//! Background sync and push events
//!
//! Both are delivered only to the active worker. The sync handler
//! acknowledges the form-submission tag but keeps no offline queue.

use crate::config::schema::NotificationsConfig;
use crate::error::ShellCacheResult;
use crate::worker::CacheManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Sync tag registered by pages that submit forms while offline
pub const FORM_SUBMISSION_TAG: &str = "form-submission";

/// Result of a background sync event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Handled,
    /// Tag not recognized
    Ignored,
}

/// Notification shown in response to a push
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

impl Notification {
    /// Build the notification for a push, using the payload text as body
    pub fn from_push(template: &NotificationsConfig, payload: Option<&str>) -> Self {
        let action = |action: &str, title: &str| NotificationAction {
            action: action.to_string(),
            title: title.to_string(),
            icon: template.icon.clone(),
        };

        Self {
            title: template.title.clone(),
            body: payload
                .map(str::to_string)
                .unwrap_or_else(|| template.body.clone()),
            icon: template.icon.clone(),
            badge: template.badge.clone(),
            vibrate: template.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: 1,
            },
            actions: vec![action("explore", "View Details"), action("close", "Close")],
        }
    }
}

/// Displays notifications on behalf of the worker
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> ShellCacheResult<()>;
}

impl CacheManager {
    /// Handle a background sync event
    pub async fn on_sync(&self, tag: &str) -> ShellCacheResult<SyncOutcome> {
        self.ensure_active()?;

        if tag != FORM_SUBMISSION_TAG {
            debug!("Ignoring sync tag {}", tag);
            return Ok(SyncOutcome::Ignored);
        }

        info!("Handling form submission sync");
        Ok(SyncOutcome::Handled)
    }

    /// Handle a push event by showing a notification
    pub async fn on_push(
        &self,
        payload: Option<&str>,
        notifier: &dyn Notifier,
    ) -> ShellCacheResult<Notification> {
        self.ensure_active()?;

        let notification = Notification::from_push(&self.settings.notifications, payload);
        notifier.show(&notification).await?;
        info!("Push notification shown: {}", notification.title);
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_without_payload_uses_default_body() {
        let template = NotificationsConfig::default();
        let notification = Notification::from_push(&template, None);

        assert_eq!(notification.title, "Jeressar High School");
        assert_eq!(notification.body, "New update from Jeressar High School");
        assert_eq!(notification.vibrate, vec![100, 50, 100]);
        assert_eq!(notification.data.primary_key, 1);
    }

    #[test]
    fn push_payload_becomes_body() {
        let template = NotificationsConfig::default();
        let notification = Notification::from_push(&template, Some("Open day on Friday"));
        assert_eq!(notification.body, "Open day on Friday");
    }

    #[test]
    fn notification_serializes_like_the_browser_options() {
        let notification = Notification::from_push(&NotificationsConfig::default(), None);
        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(json["actions"][0]["action"], "explore");
        assert_eq!(json["actions"][1]["title"], "Close");
        assert!(json["data"]["dateOfArrival"].is_string());
        assert_eq!(json["data"]["primaryKey"], 1);
    }
}
