//! debug command - Dump resolved settings and local repository state
//!
//! Never contacts the remote and never fails on missing settings, so it can
//! be used to find out why another command does.

use anyhow::Result;
use serde::Serialize;

use super::Context;
use crate::cli::args::MessageArgs;
use crate::core::message::CommitMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteReport {
    pub owner: String,
    pub name: String,
}

/// Resolved settings as the other commands would see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugReport {
    pub remote: RemoteReport,
    pub has_token: bool,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub clean: bool,
    pub message: CommitMessage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the report without touching the remote.
pub fn debug_report(ctx: &Context, branch: Option<&str>, message: &MessageArgs) -> DebugReport {
    let spec = ctx.message_spec(message);

    let mut report = DebugReport {
        remote: RemoteReport {
            owner: ctx.owner().unwrap_or_default(),
            name: ctx.repo().unwrap_or_default(),
        },
        has_token: ctx.token().is_ok(),
        branch: ctx.branch(branch).unwrap_or_default(),
        commit: None,
        clean: false,
        message: CommitMessage::from(&spec),
        trailers: spec.trailers(),
        error: None,
    };

    match &ctx.git {
        Some(git) => {
            report.commit = git.head_commit().ok().flatten().map(|oid| oid.to_string());
            match git.is_clean() {
                Ok(clean) => report.clean = clean,
                Err(e) => report.error = Some(format!("local repository status: {e}")),
            }
        }
        None => report.error = Some("local repository status: no local repository".into()),
    }

    report
}

pub fn debug(ctx: &Context, branch: Option<&str>, message: &MessageArgs) -> Result<()> {
    let report = debug_report(ctx, branch, message);
    ctx.emit(&report, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::GlobalFlags;
    use crate::core::config::Config;
    use crate::git::LocalDefaults;
    use std::collections::HashMap;

    #[test]
    fn reports_resolved_settings() {
        let flags = GlobalFlags {
            owner: Some("acme".into()),
            repo: Some("widgets".into()),
            no_cli_token: true,
            ..Default::default()
        };
        let ctx = Context::from_parts(
            flags,
            Config::default(),
            LocalDefaults::default(),
            HashMap::from([("GHUP_TOKEN".to_string(), "secret".to_string())]),
        );
        let args = MessageArgs {
            message: Some("Update docs\n\nDetails".into()),
            user_name: Some("CI".into()),
            user_email: Some("ci@example.com".into()),
            ..Default::default()
        };

        let report = debug_report(&ctx, Some("main"), &args);
        assert_eq!(report.remote.owner, "acme");
        assert_eq!(report.remote.name, "widgets");
        assert!(report.has_token);
        assert_eq!(report.branch, "main");
        assert_eq!(report.message.headline, "Update docs");
        assert_eq!(report.trailers, vec!["Co-Authored-By: CI <ci@example.com>"]);
        assert!(report.error.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert!(!json.to_string().contains("secret"));
    }
}
