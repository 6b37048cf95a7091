//! Notification steps appended after the cache rebuild.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;

use super::step::PipelineStep;

/// Name shared by every notification step; replacement is keyed on it.
pub const NOTIFICATION_STEP: &str = "notification";

/// The one recognized notification provider.
pub const SLACK: &str = "Slack";

const SLACK_IMAGE: &str = "plugins/slack";

/// A user's request to enable or disable a notification provider. Only
/// enabled entries produce a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRequest {
    pub name: String,
    pub value: bool,
}

impl NotificationRequest {
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: true,
        }
    }
}

/// Return the step sequence with every existing notification step removed
/// and one step appended per enabled, recognized request.
///
/// Running this twice with the same requests therefore yields exactly one
/// notification step.
pub fn replace_notifications(
    steps: Vec<PipelineStep>,
    requests: &[NotificationRequest],
    settings: &Settings,
) -> Vec<PipelineStep> {
    let mut steps: Vec<PipelineStep> = steps
        .into_iter()
        .filter(|step| step.name != NOTIFICATION_STEP)
        .collect();

    for request in requests.iter().filter(|r| r.value) {
        match request.name.as_str() {
            SLACK => match &settings.slack_webhook {
                Some(webhook) => {
                    info!("adding notification: {}", request.name);
                    steps.push(
                        PipelineStep::builder(NOTIFICATION_STEP, SLACK_IMAGE)
                            .setting("webhook", webhook.as_str())
                            .build(),
                    );
                }
                None => {
                    warn!("Slack notification requested but no webhook configured, skipping");
                }
            },
            other => {
                warn!("unrecognized notification provider: {other}");
            }
        }
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_webhook() -> Settings {
        Settings {
            slack_webhook: Some("https://hooks.slack.example/T1/B1".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn enabled_slack_request_appends_step() {
        let steps = replace_notifications(
            vec![],
            &[NotificationRequest::enabled(SLACK)],
            &settings_with_webhook(),
        );
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, NOTIFICATION_STEP);
        assert_eq!(steps[0].image, SLACK_IMAGE);
        assert_eq!(
            steps[0].settings.as_ref().unwrap().get("webhook"),
            Some(&serde_yaml::Value::from("https://hooks.slack.example/T1/B1"))
        );
    }

    #[test]
    fn disabled_request_produces_no_step() {
        let request = NotificationRequest {
            name: SLACK.to_string(),
            value: false,
        };
        let steps = replace_notifications(vec![], &[request], &settings_with_webhook());
        assert!(steps.is_empty());
    }

    #[test]
    fn existing_notification_steps_are_replaced_not_duplicated() {
        let settings = settings_with_webhook();
        let requests = [NotificationRequest::enabled(SLACK)];

        let once = replace_notifications(vec![], &requests, &settings);
        let twice = replace_notifications(once, &requests, &settings);

        let count = twice.iter().filter(|s| s.name == NOTIFICATION_STEP).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn non_notification_steps_are_untouched() {
        let execute = PipelineStep::builder("execute", "img").build();
        let steps = replace_notifications(
            vec![execute.clone()],
            &[NotificationRequest::enabled(SLACK)],
            &settings_with_webhook(),
        );
        assert_eq!(steps[0], execute);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn slack_without_webhook_is_skipped() {
        let steps = replace_notifications(
            vec![],
            &[NotificationRequest::enabled(SLACK)],
            &Settings::default(),
        );
        assert!(steps.is_empty());
    }

    #[test]
    fn unrecognized_provider_is_ignored() {
        let steps = replace_notifications(
            vec![],
            &[NotificationRequest::enabled("Pager")],
            &settings_with_webhook(),
        );
        assert!(steps.is_empty());
    }
}
