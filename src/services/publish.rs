//! Fire-and-forget handoff to the downstream publishing workflow
//!
//! Approval state is authoritative: a failed notification is logged and
//! never rolls back the approval. Retrying the publish is the workflow's
//! responsibility, not ours.

use serde_json::json;

use crate::domain::approvals::ApprovalRow;

/// Signal the publishing workflow that `approval` is cleared to post.
pub fn notify_approved(client: reqwest::Client, webhook_url: String, approval: &ApprovalRow) {
    let payload = json!({
        "approval_id": approval.id,
        "account_id": approval.account_id,
        "video_path": approval.video_path,
        "caption": approval.caption,
        "hashtags": approval.hashtags,
        "scheduled_for": approval.scheduled_for,
    });
    let approval_id = approval.id;
    tokio::spawn(async move {
        let result = client
            .post(&webhook_url)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        if let Err(err) = result {
            tracing::warn!("publish webhook failed for approval {approval_id}: {err}");
        }
    });
}
