use crate::models::policy::Policy;
use crate::models::report::Workplace;

const REMOTE_MARKERS: &[&str] = &["remote", "work from home", "telehealth"];

fn content(title: &str, body: &str) -> String {
    format!("{} {}", title.to_lowercase(), body.to_lowercase())
}

fn any_hit(content: &str, triggers: &[String]) -> bool {
    triggers.iter().any(|t| content.contains(t.as_str()))
}

/// Decide whether a post is a relevant job post under `policy`.
///
/// Matching is case-insensitive plain substring search with no word
/// boundaries, so `"ra"` matches inside `"camera"`. Pass an empty `body`
/// for platforms without a separate body.
pub fn accepts(title: &str, body: &str, policy: &Policy) -> bool {
    let content = content(title, body);
    let has_keyword = any_hit(&content, &policy.keywords);
    let has_location = any_hit(&content, &policy.locations);
    let has_job_type = any_hit(&content, &policy.job_types);
    policy.rule.decide(has_keyword, has_location, has_job_type)
}

pub fn workplace(title: &str, body: &str) -> Workplace {
    let content = content(title, body);
    if REMOTE_MARKERS.iter().any(|m| content.contains(m)) {
        Workplace::Remote
    } else {
        Workplace::OnSite
    }
}
