//! Schema creation
//!
//! Tables keep the column names of the existing `msupply.db` file. There is
//! no versioning: `init` only creates tables that are missing.

use sqlx::SqlitePool;

pub const REPORT_GROUP_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS ReportGroup (
        id TEXT PRIMARY KEY,
        name TEXT,
        description TEXT
    )
"#;

pub const SCHEDULE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Schedule (
        id TEXT PRIMARY KEY,
        interval INTEGER,
        nextReportTime INTEGER,
        name TEXT,
        description TEXT,
        lookback INTEGER,
        reportGroupID TEXT,
        time TEXT,
        day INTEGER,
        FOREIGN KEY(reportGroupID) REFERENCES ReportGroup(id)
    )
"#;

pub const CONFIG_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS Config (
        id TEXT PRIMARY KEY,
        grafanaUsername TEXT,
        grafanaPassword TEXT,
        emailPassword TEXT,
        email TEXT,
        datasourceID INTEGER,
        emailHost TEXT,
        emailPort INTEGER,
        grafanaURL TEXT
    )
"#;

pub const REPORT_GROUP_MEMBERSHIP_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS ReportGroupMembership (
        id TEXT PRIMARY KEY,
        userID TEXT,
        reportGroupID TEXT,
        FOREIGN KEY(reportGroupID) REFERENCES ReportGroup(id)
    )
"#;

pub const REPORT_CONTENT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS ReportContent (
        id TEXT PRIMARY KEY,
        scheduleID TEXT,
        panelID INTEGER,
        dashboardID TEXT,
        lookback INTEGER,
        variables TEXT,
        FOREIGN KEY(scheduleID) REFERENCES Schedule(id)
    )
"#;

/// Table DDL with the name used in log lines, in dependency order.
const TABLES: [(&str, &str); 5] = [
    ("ReportGroup", REPORT_GROUP_TABLE),
    ("Schedule", SCHEDULE_TABLE),
    ("Config", CONFIG_TABLE),
    ("ReportGroupMembership", REPORT_GROUP_MEMBERSHIP_TABLE),
    ("ReportContent", REPORT_CONTENT_TABLE),
];

/// Create every missing table.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (name, ddl) in TABLES {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            tracing::error!(table = name, error = %e, "Could not create table");
            e
        })?;
    }
    Ok(())
}
