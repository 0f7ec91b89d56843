//! Canonical paths used as redirect targets.

pub(crate) fn index() -> String {
    "/".to_string()
}

pub(crate) fn post_detail(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

pub(crate) fn profile(username: &str) -> String {
    format!("/profile/{username}/")
}
