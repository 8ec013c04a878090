//! Pure event-to-payload rendering, one function family per adapter
//! wire format. None of this touches I/O; adapters call these and then
//! ship the result.
//!
//! Grounded on the original `notifiers/slack/render.go`,
//! `notifiers/telegram/render.go` and `notifiers/discord/render.go` —
//! same structure (a `Payload`/`Attachment`/`Field` triple for chat-style
//! targets, a flat Markdown string for text-only targets), minus the
//! operation metadata (vote weight, transfer memo, witness approve flag)
//! that `notify_events::Event` no longer carries — see DESIGN.md.

use notify_events::Event;
use serde::Serialize;

const STEEMIT_BASE_URL: &str = "https://steemit.com";

/// Wire shape for both the incoming-webhook and `chat.postMessage`
/// adapters. Mirrors Slack's attachment payload closely enough that a
/// Slack incoming webhook accepts it unmodified; other chat backends
/// that speak the same convention (Mattermost, Rocket.Chat) do too.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Attachment {
    pub fallback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
}

fn message(text: impl Into<String>) -> WebhookPayload {
    WebhookPayload {
        text: Some(text.into()),
        attachments: Vec::new(),
    }
}

fn with_attachment(attachment: Attachment) -> WebhookPayload {
    WebhookPayload {
        text: None,
        attachments: vec![attachment],
    }
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or("")
}

fn comment_extract(body: &str) -> String {
    let lines: Vec<&str> = body.lines().take(5).collect();
    let mut extract = lines.join("\n");
    if body.lines().count() > 5 {
        extract.push_str("\n(truncated)");
    }
    extract
}

/// Renders an event into the webhook/chat wire shape. Used by both the
/// `webhook` and `chat_postmessage` adapters.
pub fn render_webhook(event: &Event) -> WebhookPayload {
    match event {
        Event::AccountUpdated { account } => message(format!("Account update detected for @{account}.")),
        Event::AccountWitnessVoted { account, witness } => {
            message(format!("@{account} changed their witness vote for @{witness}."))
        }
        Event::TransferMade { from, to, amount } => {
            message(format!("@{from} transferred {amount} to @{to}."))
        }
        Event::UserMentioned { mentioned_user, content } => message(format!(
            "@{mentioned_user} was mentioned by @{} in {STEEMIT_BASE_URL}{}",
            content.author, content.url
        )),
        Event::UserFollowStatusChanged { follower, following, what } => {
            message(render_follow_text(follower, following, *what))
        }
        Event::StoryPublished { content } => with_attachment(Attachment {
            fallback: format!("@{} has published \"{}\".", content.author, content.title),
            color: Some("#00C957".into()),
            pretext: Some(format!("@{} has published or updated a story.", content.author)),
            title: Some(content.title.clone()),
            title_link: Some(format!("{STEEMIT_BASE_URL}{}", content.url)),
            fields: vec![
                Field {
                    title: "Summary".into(),
                    value: first_line(&content.body).to_string(),
                },
                Field {
                    title: "Tags".into(),
                    value: content.tags.join(", "),
                },
            ],
        }),
        Event::StoryVoted { voter, content } => {
            let evt = format!("@{voter} cast a vote on a story by @{}.", content.author);
            with_attachment(Attachment {
                fallback: evt.clone(),
                color: Some("#BDFCC9".into()),
                pretext: Some(evt),
                title: Some(content.title.clone()),
                title_link: Some(format!("{STEEMIT_BASE_URL}{}", content.url)),
                fields: vec![Field {
                    title: "Story Pending Payout".into(),
                    value: content.pending_payout_value.clone(),
                }],
            })
        }
        Event::CommentPublished { content } => {
            let evt = format!(
                "@{} commented on @{}/{}",
                content.author, content.parent_author, content.parent_permlink
            );
            with_attachment(Attachment {
                fallback: evt.clone(),
                color: Some("#FF9912".into()),
                pretext: Some(evt),
                title: None,
                title_link: None,
                fields: vec![Field {
                    title: "Comment Body".into(),
                    value: comment_extract(&content.body),
                }],
            })
        }
        Event::CommentVoted { voter, content } => {
            let evt = format!(
                "@{voter} cast a vote on comment @{}/{}",
                content.author, content.permlink
            );
            with_attachment(Attachment {
                fallback: evt.clone(),
                color: Some("#FFEBCD".into()),
                pretext: Some(evt),
                title: Some(format!("@{}/{}", content.author, content.permlink)),
                title_link: Some(format!("{STEEMIT_BASE_URL}{}", content.url)),
                fields: vec![Field {
                    title: "Comment Pending Payout".into(),
                    value: content.pending_payout_value.clone(),
                }],
            })
        }
    }
}

fn render_follow_text(follower: &str, following: &str, what: notify_types::FollowState) -> String {
    use notify_types::FollowState;
    match what {
        FollowState::Followed => format!("@{follower} started following @{following}."),
        FollowState::Muted => format!("@{follower} muted @{following}."),
        FollowState::Reset => format!("@{follower} reset the follow status for @{following}."),
    }
}

/// Renders an event as a flat Markdown-ish string, for text-only
/// targets (Telegram, Discord). `link` formats an account or URL
/// reference in the target's own link syntax.
pub fn render_text(event: &Event, link: impl Fn(&str) -> String) -> String {
    match event {
        Event::AccountUpdated { account } => {
            format!("Account update detected for {}.", link(account))
        }
        Event::AccountWitnessVoted { account, witness } => {
            format!("{} changed their witness vote for {}.", link(account), link(witness))
        }
        Event::TransferMade { from, to, amount } => {
            format!("{} transferred {amount} to {}.", link(from), link(to))
        }
        Event::UserMentioned { mentioned_user, content } => format!(
            "{} was mentioned by {} in {STEEMIT_BASE_URL}{}.",
            link(mentioned_user),
            link(&content.author),
            content.url
        ),
        Event::UserFollowStatusChanged { follower, following, what } => {
            render_follow_text(follower, following, *what)
        }
        Event::StoryPublished { content } => format!(
            "{} has published or updated a story.\nTitle: {}\nTags: {}\nLink: {STEEMIT_BASE_URL}{}",
            link(&content.author),
            content.title,
            content.tags.join(", "),
            content.url
        ),
        Event::StoryVoted { voter, content } => format!(
            "{} cast a vote on a story by {}.\nTitle: {}\nLink: {STEEMIT_BASE_URL}{}\nPending Payout: {}",
            link(voter),
            link(&content.author),
            content.title,
            content.url,
            content.pending_payout_value
        ),
        Event::CommentPublished { content } => format!(
            "{} commented on @{}/{}.\nContent: {}",
            link(&content.author),
            content.parent_author,
            content.parent_permlink,
            comment_extract(&content.body)
        ),
        Event::CommentVoted { voter, content } => format!(
            "{} cast a vote on comment @{}/{}.\nLink: {STEEMIT_BASE_URL}{}\nPending Payout: {}",
            link(voter),
            content.author,
            content.permlink,
            content.url,
            content.pending_payout_value
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_types::Content;

    fn content() -> Content {
        Content {
            author: "alice".into(),
            permlink: "hello-world".into(),
            parent_author: String::new(),
            parent_permlink: String::new(),
            body: "line one\nline two".into(),
            url: "/alice/hello-world".into(),
            title: "Hello World".into(),
            tags: vec!["rust".into()],
            pending_payout_value: "1.000 SBD".into(),
            total_payout_value: "0.000 SBD".into(),
        }
    }

    #[test]
    fn story_published_webhook_sets_attachment_title() {
        let payload = render_webhook(&Event::StoryPublished { content: content() });
        assert_eq!(payload.attachments.len(), 1);
        assert_eq!(payload.attachments[0].title.as_deref(), Some("Hello World"));
    }

    #[test]
    fn transfer_made_renders_plain_text() {
        let text = render_webhook(&Event::TransferMade {
            from: "bob".into(),
            to: "carol".into(),
            amount: "1.000 STEEM".into(),
        });
        assert_eq!(text.text.as_deref(), Some("@bob transferred 1.000 STEEM to @carol."));
    }

    #[test]
    fn render_text_uses_supplied_link_formatter() {
        let text = render_text(
            &Event::AccountUpdated { account: "dave".into() },
            |a| format!("[{a}]"),
        );
        assert_eq!(text, "Account update detected for [dave].");
    }
}
