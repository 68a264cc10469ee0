//! engine::tag
//!
//! Tag reconciliation.
//!
//! # State machine
//!
//! ```text
//! Absent                               -> create
//! Present, same commit and kind        -> no-op
//! Present, different, force unset      -> Conflict naming the current commit
//! Present, different, force set        -> repoint (new tag object if annotated)
//! ```
//!
//! The kind of an existing tag is read from the object its ref points at,
//! never from a client-side flag.

use serde::Serialize;
use tracing::{debug, info};

use super::{resolve::require_commitish, ReconcileError};
use crate::core::types::{Oid, RefName};
use crate::forge::{Forge, ObjectKind};

/// A tag to reconcile against an already-resolved commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    pub target: Oid,
    /// Annotation message; `None` for a lightweight tag.
    pub annotation: Option<String>,
    pub force: bool,
    pub dry_run: bool,
}

impl TagSpec {
    fn kind(&self) -> ObjectKind {
        if self.annotation.is_some() {
            ObjectKind::Tag
        } else {
            ObjectKind::Commit
        }
    }
}

/// Bring tag `spec.name` to `spec.target`. Returns whether anything changed.
pub async fn ensure_tag(forge: &dyn Forge, spec: &TagSpec) -> Result<bool, ReconcileError> {
    let ref_name = RefName::for_tag(&spec.name)?;
    if spec.annotation.as_deref() == Some("") {
        return Err(ReconcileError::Validation(
            "annotated tag requires a message".into(),
        ));
    }

    let existing = forge.get_ref(&ref_name).await?;

    if let Some(existing) = &existing {
        let current = match existing.kind {
            ObjectKind::Tag => forge.get_tag_object(&existing.oid).await?.target,
            ObjectKind::Commit => existing.oid.clone(),
        };
        debug!("{} is {:?} at {}", ref_name, existing.kind, current);

        if current == spec.target && existing.kind == spec.kind() {
            info!("{} already points to {}", ref_name, current);
            return Ok(false);
        }
        if !spec.force {
            return Err(ReconcileError::Conflict(format!(
                "tag {:?} already exists: {}",
                spec.name, current
            )));
        }
    }

    if spec.dry_run {
        info!("dry-run: would point {} at {}", ref_name, spec.target);
        return Ok(true);
    }

    let object = match &spec.annotation {
        Some(message) => {
            forge
                .create_tag_object(&spec.name, message, &spec.target)
                .await?
        }
        None => spec.target.clone(),
    };

    if existing.is_some() {
        info!("replacing {} with {}", ref_name, object);
        forge.update_ref(&ref_name, &object, true).await?;
    } else {
        info!("creating {} at {}", ref_name, object);
        forge.create_ref(&ref_name, &object).await?;
    }

    Ok(true)
}

/// Inputs of the tag command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOptions {
    pub tag: String,
    pub commitish: String,
    /// Annotation message; ignored when `lightweight`.
    pub message: String,
    pub lightweight: bool,
    pub force: bool,
    pub dry_run: bool,
}

/// Outcome of the tag command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagReport {
    pub tag: String,
    pub commitish: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TagReport {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Resolve the commit-ish and reconcile the tag, capturing any failure in the report.
pub async fn reconcile_tag(forge: &dyn Forge, opts: &TagOptions) -> TagReport {
    let mut report = TagReport {
        tag: opts.tag.clone(),
        commitish: opts.commitish.clone(),
        ..Default::default()
    };

    let result = async {
        let target = require_commitish(forge, &opts.commitish).await?;
        report.sha = Some(target.clone());
        report.url = Some(forge.commit_url(&target));

        let spec = TagSpec {
            name: opts.tag.clone(),
            target,
            annotation: (!opts.lightweight).then(|| opts.message.clone()),
            force: opts.force,
            dry_run: opts.dry_run,
        };
        ensure_tag(forge, &spec).await
    }
    .await;

    match result {
        Ok(updated) => report.updated = updated,
        Err(e) => report.error = Some(e.to_string()),
    }
    report
}
