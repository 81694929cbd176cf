use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use uuid::Uuid;

use super::API_V1_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn api(base: &str, path: &str) -> String {
    base_join(base, &format!("{}/{}", API_V1_PREFIX, path))
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn health(base: &str) -> String {
    api(base, "health")
}
pub fn auth_register(base: &str) -> String {
    api(base, "auth/register")
}
pub fn auth_login(base: &str) -> String {
    api(base, "auth/login")
}
pub fn me(base: &str) -> String {
    api(base, "me")
}
pub fn tasks(base: &str) -> String {
    api(base, "tasks")
}
pub fn tasks_bulk(base: &str) -> String {
    api(base, "tasks/bulk")
}
pub fn task(base: &str, task_id: Uuid) -> String {
    api(base, &format!("tasks/{}", task_id))
}
pub fn task_complete(base: &str, task_id: Uuid) -> String {
    api(base, &format!("tasks/{}/complete", task_id))
}
pub fn pet(base: &str) -> String {
    api(base, "pet")
}
pub fn pet_feed(base: &str) -> String {
    api(base, "pet/feed")
}
pub fn pet_play(base: &str) -> String {
    api(base, "pet/play")
}
pub fn decorations(base: &str) -> String {
    api(base, "decorations")
}
pub fn decorations_buy(base: &str) -> String {
    api(base, "decorations/buy")
}
pub fn sync(base: &str) -> String {
    api(base, "sync")
}
pub fn invite_create(base: &str) -> String {
    api(base, "invite")
}
pub fn invite(base: &str, token: &str) -> String {
    api(base, &format!("invite/{}", enc(token)))
}
pub fn invite_qr(base: &str, token: &str) -> String {
    api(base, &format!("invite/{}/qr", enc(token)))
}

/// Link a person opens in the browser to accept an invite (served by the web app).
pub fn invite_landing(app_url: &str, token: &str) -> String {
    base_join(app_url, &format!("invite/{}", enc(token)))
}
