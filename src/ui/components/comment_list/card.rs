//! Builds the markup for one comment card, its replies, and the placeholder
//! nodes shown while data is pending.

use chrono::{DateTime, Utc};

use crate::comments::{
    Comment,
    present::{
        RESERVED_AUTHOR, RESERVED_AVATAR, generate_avatar_color, initial_letter, like_label,
        relative_time,
    },
};
use crate::markup::{Element, Node, highlight};

pub const EXPORT_TOOLTIP: &str = "Export this comment as PNG";

/// Everything a card needs besides the comment itself.
#[derive(Clone, Copy)]
pub(super) struct CardContext<'a> {
    pub search_term: Option<&'a str>,
    pub now: DateTime<Utc>,
    pub avatar_failed: &'a dyn Fn(&str) -> bool,
}

/// One card for `comment` followed by one card per reply. Replies of replies
/// are not rendered.
pub(super) fn create_comment_card(comment: &Comment, ctx: CardContext<'_>, out: &mut Vec<Node>) {
    out.push(create_single_comment(comment, false, ctx).into());
    out.extend(
        comment
            .replies
            .iter()
            .map(|reply| create_single_comment(reply, true, ctx).into()),
    );
}

pub(super) fn create_single_comment(
    comment: &Comment,
    is_reply: bool,
    ctx: CardContext<'_>,
) -> Element {
    let author = comment.author_name();
    let mut card = Element::new("div");
    if is_reply {
        card = card.class("reply-card");
    }
    card = card
        .class("comment-card")
        .attr("data-comment-id", comment.id());

    let text = Element::new("span")
        .class("comment-text")
        .children_from(highlight(comment.body(), ctx.search_term));
    let header = Element::new("div")
        .class("comment-header")
        .child(Element::new("span").class("comment-author").child(author))
        .child(text);

    let mut actions = Element::new("div").class("comment-actions").child(
        Element::new("span")
            .class("comment-date")
            .child(relative_time(comment.timestamp(), ctx.now)),
    );
    if let Some(likes) = like_label(comment.like_total()) {
        actions = actions.child(Element::new("span").class("comment-likes").child(likes));
    }
    actions = actions.child(Element::new("span").class("comment-reply").child("Reply"));
    if comment.channel_owner_liked {
        actions = actions.child(
            Element::new("span")
                .class("channel-owner-liked")
                .child("❤️"),
        );
    }

    let export = Element::new("div").class("comment-export").child(
        Element::new("button")
            .class("export-btn")
            .attr("data-comment-id", comment.id())
            .attr("title", EXPORT_TOOLTIP)
            .child(Element::new("i").class("bi-download")),
    );

    card.child(avatar(comment, is_reply, (ctx.avatar_failed)(comment.id())))
        .child(
            Element::new("div")
                .class("comment-content")
                .child(header)
                .child(actions),
        )
        .child(export)
}

/// The image and its colored-initial fallback are built together so that a
/// load failure only flips visibility.
fn avatar(comment: &Comment, is_reply: bool, failed: bool) -> Element {
    let author = comment.author_name();
    let size = if is_reply { "avatar-sm" } else { "avatar-md" };
    let color = generate_avatar_color(author);
    let placeholder = Element::new("div")
        .class("avatar-initial")
        .class(size)
        .attr("style", format!("background-color: {color}"))
        .child(initial_letter(author));

    let source = if author == RESERVED_AUTHOR {
        Some(RESERVED_AVATAR)
    } else {
        comment.avatar_url()
    };
    let container = Element::new("div").class("profile-avatar");
    match source {
        Some(src) => container
            .child(
                Element::new("img")
                    .class("avatar-image")
                    .class(size)
                    .attr("src", src)
                    .attr("alt", author)
                    .hidden(failed),
            )
            .child(placeholder.hidden(!failed)),
        None => container.child(placeholder),
    }
}

pub(super) fn skeleton_card() -> Node {
    let bar = |width: &str| {
        Element::new("div")
            .class("skeleton")
            .attr("data-width", width)
    };
    Element::new("div")
        .class("comment-card")
        .class("skeleton")
        .child(
            Element::new("div")
                .class("comment-header")
                .child(bar("32").class("skeleton-avatar"))
                .child(bar("120"))
                .child(bar("80")),
        )
        .child(bar("100%"))
        .child(bar("80%"))
        .child(bar("60"))
        .into()
}

pub(super) fn empty_state(message: &str) -> Node {
    Element::new("div")
        .class("empty-state")
        .child(Element::new("i").class("bi-chat-square-text"))
        .child(Element::new("p").child(message))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn never_failed(_: &str) -> bool {
        false
    }

    fn ctx(term: Option<&str>) -> CardContext<'_> {
        CardContext {
            search_term: term,
            now: now(),
            avatar_failed: &never_failed,
        }
    }

    #[test]
    fn card_carries_comment_fields() {
        let comment = Comment::new("c1", "bob", "hello there")
            .published_at(now() - TimeDelta::days(10))
            .likes(1_500)
            .owner_liked(true);
        let card = create_single_comment(&comment, false, ctx(None));

        assert!(card.has_class("comment-card"));
        assert!(!card.has_class("reply-card"));
        assert_eq!(card.get_attr("data-comment-id"), Some("c1"));
        let text = |class: &str| card.find_class(class).map(Element::text_content);
        assert_eq!(text("comment-author").as_deref(), Some("bob"));
        assert_eq!(text("comment-text").as_deref(), Some("hello there"));
        assert_eq!(text("comment-date").as_deref(), Some("1w"));
        assert_eq!(text("comment-likes").as_deref(), Some("1.5K likes"));
        assert_eq!(text("avatar-initial").as_deref(), Some("O"));
        assert!(card.find_class("channel-owner-liked").is_some());
        let button = card.find_class("export-btn").expect("export trigger");
        assert_eq!(button.get_attr("data-comment-id"), Some("c1"));
    }

    #[test]
    fn zero_likes_omit_the_element() {
        let card = create_single_comment(&Comment::new("c", "a", "t"), false, ctx(None));
        assert!(card.find_class("comment-likes").is_none());
        assert!(card.find_class("channel-owner-liked").is_none());
    }

    #[test]
    fn single_like_is_singular() {
        let comment = Comment::new("c", "a", "t").likes(1);
        let card = create_single_comment(&comment, false, ctx(None));
        assert_eq!(
            card.find_class("comment-likes").map(Element::text_content),
            Some("1 like".to_string())
        );
    }

    #[test]
    fn replies_flatten_to_one_level() {
        let nested = Comment::new("r1", "carol", "reply").reply(Comment::new("r2", "dan", "deep"));
        let comment = Comment::new("c1", "bob", "top").reply(nested);
        let mut out = Vec::new();
        create_comment_card(&comment, ctx(None), &mut out);

        assert_eq!(out.len(), 2);
        let reply = out[1].as_element().expect("element");
        assert!(reply.has_class("reply-card"));
        assert_eq!(reply.get_attr("data-comment-id"), Some("r1"));
        assert!(!out.iter().any(|n| n.to_html().contains("deep")));
    }

    #[test]
    fn avatar_url_renders_image_with_hidden_placeholder() {
        let comment = Comment::new("c", "bob", "t").avatar("https://cdn/bob.jpg");
        let card = create_single_comment(&comment, false, ctx(None));
        let img = card.find_class("avatar-image").expect("image");
        assert_eq!(img.get_attr("src"), Some("https://cdn/bob.jpg"));
        assert!(!img.is_hidden());
        assert!(card.find_class("avatar-initial").expect("placeholder").is_hidden());
    }

    #[test]
    fn failed_avatar_shows_placeholder_at_bind_time() {
        let comment = Comment::new("c", "bob", "t").avatar("https://cdn/bob.jpg");
        let failed = |_: &str| true;
        let card = create_single_comment(
            &comment,
            false,
            CardContext {
                avatar_failed: &failed,
                ..ctx(None)
            },
        );
        assert!(card.find_class("avatar-image").expect("image").is_hidden());
        assert!(!card.find_class("avatar-initial").expect("placeholder").is_hidden());
    }

    #[test]
    fn reserved_author_uses_bundled_avatar() {
        let comment = Comment::new("c", RESERVED_AUTHOR, "t").avatar("https://cdn/other.jpg");
        let card = create_single_comment(&comment, false, ctx(None));
        assert_eq!(
            card.find_class("avatar-image").and_then(|img| img.get_attr("src")),
            Some(RESERVED_AVATAR)
        );
    }

    #[test]
    fn no_avatar_renders_only_placeholder() {
        let card = create_single_comment(&Comment::new("c", "", "t"), false, ctx(None));
        assert!(card.find_class("avatar-image").is_none());
        let placeholder = card.find_class("avatar-initial").expect("placeholder");
        assert!(!placeholder.is_hidden());
        assert_eq!(placeholder.text_content(), "U");
        assert_eq!(
            placeholder.get_attr("style"),
            Some("background-color: #FF6B6B")
        );
    }

    #[test]
    fn author_and_text_are_escaped() {
        let comment = Comment::new("c", "<script>", "<b>bold</b> & co");
        let html = create_single_comment(&comment, false, ctx(Some("bold"))).to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(
            r#"&lt;b&gt;<mark class="search-highlight">bold</mark>&lt;/b&gt; &amp; co"#
        ));
    }

    #[test]
    fn skeleton_has_no_comment_binding() {
        let node = skeleton_card();
        let el = node.as_element().expect("element");
        assert!(el.has_class("skeleton"));
        assert!(!node.to_html().contains("data-comment-id"));
    }

    #[test]
    fn empty_state_shows_message() {
        assert_eq!(empty_state("Nothing here").text_content(), "Nothing here");
    }
}
