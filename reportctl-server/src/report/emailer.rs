//! Report emailer

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use url::Url;

use reportctl_core::{AuthConfig, AuthError, EmailConfig};

use super::mailer::{Email, MailError, Mailer};
use crate::db::{DbError, MembershipRepo, ReportContent, ReportContentRepo, Schedule};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("schedule '{schedule_id}' has no recipients")]
    NoRecipients { schedule_id: String },

    #[error("cannot build panel URL from '{url}'")]
    InvalidUrl { url: String },
}

/// One rendered panel in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelLink {
    #[serde(rename = "dashboardID")]
    pub dashboard_id: String,
    #[serde(rename = "panelID")]
    pub panel_id: i64,
    /// Render URL carrying the Grafana credentials, for fetching the image
    #[serde(skip)]
    pub render_url: String,
    /// Same URL without credentials, safe to show to recipients
    pub link: String,
}

/// An assembled report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "scheduleID")]
    pub schedule_id: String,
    #[serde(rename = "datasourceID")]
    pub datasource_id: i64,
    pub subject: String,
    pub recipients: Vec<String>,
    pub panels: Vec<PanelLink>,
}

pub struct ReportEmailer<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportEmailer<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Assemble the schedule's report and send it now.
    pub async fn create_report(
        &self,
        schedule: &Schedule,
        auth: &AuthConfig,
        datasource_id: i64,
        account: &EmailConfig,
        mailer: &dyn Mailer,
    ) -> Result<Report, ReportError> {
        let report = self
            .build_report(schedule, auth, datasource_id, Utc::now())
            .await?;

        let email = compose(&report, schedule, account);
        mailer.send(account, &email).await?;

        tracing::info!(
            schedule_id = %report.schedule_id,
            recipients = report.recipients.len(),
            panels = report.panels.len(),
            "Report emailed"
        );
        Ok(report)
    }

    /// Collect recipients and panel links for a report window ending at `now`.
    pub async fn build_report(
        &self,
        schedule: &Schedule,
        auth: &AuthConfig,
        datasource_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Report, ReportError> {
        let no_recipients = || ReportError::NoRecipients {
            schedule_id: schedule.id.clone(),
        };

        let group_id = schedule.report_group_id.as_deref().ok_or_else(no_recipients)?;
        let recipients = MembershipRepo::new(self.pool)
            .user_ids_for_group(group_id)
            .await?;
        if recipients.is_empty() {
            return Err(no_recipients());
        }

        // rejects URLs without an http(s) scheme
        auth.auth_url()?;
        let (plain, authed) = base_urls(auth)?;
        let content = ReportContentRepo::new(self.pool)
            .list_for_schedule(&schedule.id)
            .await?;

        let panels = content
            .iter()
            .map(|item| -> Result<PanelLink, ReportError> {
                let window = Window::ending_at(now, effective_lookback(schedule, item));
                Ok(PanelLink {
                    dashboard_id: item.dashboard_id.clone(),
                    panel_id: item.panel_id,
                    render_url: panel_url(&authed, item, window, &auth.url)?,
                    link: panel_url(&plain, item, window, &auth.url)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Report {
            schedule_id: schedule.id.clone(),
            datasource_id,
            subject: schedule.name.clone(),
            recipients,
            panels,
        })
    }
}

/// Report time range in epoch milliseconds
#[derive(Debug, Clone, Copy)]
struct Window {
    from: i64,
    to: i64,
}

impl Window {
    fn ending_at(now: DateTime<Utc>, lookback_secs: i64) -> Self {
        let to = now.timestamp_millis();
        Self {
            from: to.saturating_sub(lookback_secs.saturating_mul(1000)),
            to,
        }
    }
}

fn effective_lookback(schedule: &Schedule, content: &ReportContent) -> i64 {
    if content.lookback > 0 {
        content.lookback
    } else {
        schedule.lookback
    }
}

/// Plain and credentialed Grafana base URLs.
///
/// Credentials go through `set_username`/`set_password` so reserved
/// characters are percent-encoded. Errors only ever carry the plain URL.
fn base_urls(auth: &AuthConfig) -> Result<(Url, Url), ReportError> {
    let invalid = || ReportError::InvalidUrl {
        url: auth.url.clone(),
    };

    let plain = Url::parse(&auth.url).map_err(|_| invalid())?;
    let mut authed = plain.clone();
    authed.set_username(&auth.username).map_err(|_| invalid())?;
    authed
        .set_password(Some(&auth.password))
        .map_err(|_| invalid())?;
    Ok((plain, authed))
}

fn panel_url(
    base: &Url,
    content: &ReportContent,
    window: Window,
    display_url: &str,
) -> Result<String, ReportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ReportError::InvalidUrl {
            url: display_url.to_owned(),
        })?
        .pop_if_empty()
        .extend(["render", "d-solo", content.dashboard_id.as_str()]);

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("orgId", "1")
            .append_pair("panelId", &content.panel_id.to_string())
            .append_pair("from", &window.from.to_string())
            .append_pair("to", &window.to.to_string());

        for (name, value) in variable_pairs(&content.variables) {
            query.append_pair(&format!("var-{}", name), &value);
        }
    }

    Ok(url.into())
}

/// Flatten the stored variables object into `(name, value)` pairs.
///
/// Arrays produce one pair per element; nulls are dropped.
fn variable_pairs(raw: &str) -> Vec<(String, String)> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let object = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(object)) => object,
        _ => {
            tracing::warn!(variables = %raw, "Ignoring malformed report variables");
            return Vec::new();
        }
    };

    let mut pairs = Vec::new();
    for (name, value) in object {
        match value {
            serde_json::Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar).map(|v| (name.clone(), v)));
            }
            other => pairs.extend(scalar(&other).map(|v| (name.clone(), v))),
        }
    }
    pairs
}

fn scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compose(report: &Report, schedule: &Schedule, account: &EmailConfig) -> Email {
    let mut body = format!("{}\n", schedule.name);
    if !schedule.description.is_empty() {
        body.push_str(&schedule.description);
        body.push('\n');
    }
    body.push('\n');
    for panel in &report.panels {
        body.push_str(&format!(
            "Dashboard {} panel {}: {}\n",
            panel.dashboard_id, panel.panel_id, panel.link
        ));
    }

    Email {
        from: account.email.clone(),
        to: report.recipients.clone(),
        subject: report.subject.clone(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::db::repos::test_support;
    use crate::db::{
        ReportContentInput, ReportGroupInput, ReportGroupRepo, ScheduleInput, ScheduleRepo,
    };

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, _account: &EmailConfig, email: &Email) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn auth() -> AuthConfig {
        AuthConfig::new("admin", "pw", "http://grafana.local:3000/")
    }

    fn account() -> EmailConfig {
        EmailConfig {
            email: "reports@example.org".into(),
            password: "x".into(),
            host: "smtp.example.org".into(),
            port: 587,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    async fn fixture(pool: &SqlitePool, with_members: bool) -> Schedule {
        let group = ReportGroupRepo::new(pool)
            .create(ReportGroupInput {
                name: "Managers".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        if with_members {
            let members = MembershipRepo::new(pool);
            members.create(&group.id, "12").await.unwrap();
            members.create(&group.id, "4").await.unwrap();
        }

        let schedule = ScheduleRepo::new(pool)
            .create(ScheduleInput {
                name: "Weekly stock".into(),
                description: "Stock levels".into(),
                lookback: 3600,
                report_group_id: Some(group.id),
                ..Default::default()
            })
            .await
            .unwrap();

        let content = ReportContentRepo::new(pool);
        content
            .create(
                &schedule.id,
                ReportContentInput {
                    panel_id: 2,
                    dashboard_id: "stock".into(),
                    lookback: 0,
                    variables: r#"{"store":["Central","North"],"item":null}"#.into(),
                },
            )
            .await
            .unwrap();
        content
            .create(
                &schedule.id,
                ReportContentInput {
                    panel_id: 7,
                    dashboard_id: "usage".into(),
                    lookback: 60,
                    variables: String::new(),
                },
            )
            .await
            .unwrap();

        schedule
    }

    #[tokio::test]
    async fn builds_panel_links() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, true).await;

        let report = ReportEmailer::new(&pool)
            .build_report(&schedule, &auth(), 5, now())
            .await
            .unwrap();

        assert_eq!(report.recipients, vec!["12", "4"]);
        assert_eq!(report.datasource_id, 5);
        assert_eq!(report.panels.len(), 2);

        let to = 1_700_000_000_000i64;
        let stock = &report.panels[0];
        assert_eq!(
            stock.render_url,
            format!(
                "http://admin:pw@grafana.local:3000/render/d-solo/stock?orgId=1&panelId=2&from={}&to={}&var-store=Central&var-store=North",
                to - 3_600_000,
                to
            )
        );
        assert!(stock.link.starts_with("http://grafana.local:3000/render/d-solo/stock?"));

        // content lookback overrides the schedule's
        let usage = &report.panels[1];
        assert!(usage.link.contains(&format!("from={}&to={}", to - 60_000, to)));
    }

    #[tokio::test]
    async fn no_members_means_no_recipients() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, false).await;

        let err = ReportEmailer::new(&pool)
            .build_report(&schedule, &auth(), 1, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NoRecipients { .. }));
    }

    #[tokio::test]
    async fn missing_group_means_no_recipients() {
        let (_dir, pool) = test_support::pool().await;
        let mut schedule = fixture(&pool, true).await;
        schedule.report_group_id = None;

        let err = ReportEmailer::new(&pool)
            .build_report(&schedule, &auth(), 1, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NoRecipients { .. }));
    }

    #[tokio::test]
    async fn url_without_scheme_is_auth_error() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, true).await;

        let err = ReportEmailer::new(&pool)
            .build_report(&schedule, &AuthConfig::new("a", "b", "grafana.local"), 1, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Auth(AuthError::MissingScheme { .. })));
    }

    #[tokio::test]
    async fn create_report_sends_email() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, true).await;
        let mailer = RecordingMailer::default();

        ReportEmailer::new(&pool)
            .create_report(&schedule, &auth(), 1, &account(), &mailer)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Weekly stock");
        assert_eq!(sent[0].from, "reports@example.org");
        assert_eq!(sent[0].to, vec!["12", "4"]);
        assert!(sent[0].body.contains("Dashboard usage panel 7"));
        assert!(!sent[0].body.contains("admin:pw"));
    }

    #[tokio::test]
    async fn reserved_characters_in_password_are_encoded() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, true).await;

        for (password, encoded) in [("pa/ss", "pa%2Fss"), ("pa#ss", "pa%23ss"), ("pa?ss", "pa%3Fss")] {
            let auth = AuthConfig::new("admin", password, "http://grafana.local:3000");
            let report = ReportEmailer::new(&pool)
                .build_report(&schedule, &auth, 1, now())
                .await
                .unwrap();

            let render = Url::parse(&report.panels[0].render_url).unwrap();
            assert_eq!(render.host_str(), Some("grafana.local"));
            assert_eq!(render.username(), "admin");
            assert_eq!(render.password(), Some(encoded));
            assert_eq!(render.path(), "/render/d-solo/stock");
            assert!(!report.panels[0].link.contains(password));
        }
    }

    #[tokio::test]
    async fn invalid_url_error_omits_credentials() {
        let (_dir, pool) = test_support::pool().await;
        let schedule = fixture(&pool, true).await;

        // matches the http:// scheme check but has no host to attach credentials to
        let auth = AuthConfig::new("admin", "top/secret", "http://");
        let err = ReportEmailer::new(&pool)
            .build_report(&schedule, &auth, 1, now())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidUrl { .. }));
        assert!(!err.to_string().contains("top/secret"));
        assert!(!err.to_string().contains("admin"));
    }

    #[test]
    fn variable_pairs_flatten_values() {
        let pairs = variable_pairs(r#"{"a":"x","b":[1,"y",null],"c":true}"#);
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "1".to_string()),
                ("b".to_string(), "y".to_string()),
                ("c".to_string(), "true".to_string()),
            ]
        );
        assert!(variable_pairs("not json").is_empty());
    }
}
