use crate::output::{format_line, Finding, StatusClass};
use crate::prober::Title;

#[test]
fn join_rule_is_idempotent_on_separators() {
    for (base, path) in [
        ("http://a.com/", "/x"),
        ("http://a.com", "x"),
        ("http://a.com/", "x"),
        ("http://a.com", "/x"),
    ] {
        assert_eq!(crate::utils::format_url(base, path), "http://a.com/x");
    }
}

#[test]
fn classification_is_a_total_partition() {
    for status in 0..=u16::MAX {
        let class = StatusClass::of(status);
        let expected = if (200..300).contains(&status) {
            StatusClass::Success
        } else if (300..400).contains(&status) {
            StatusClass::Redirect
        } else if (400..500).contains(&status) {
            StatusClass::ClientError
        } else {
            StatusClass::Other
        };
        assert_eq!(class, expected, "status {status}");
    }
}

#[test]
fn wordlist_example_is_cleaned() {
    let out = crate::utils::clean_lines(["admin", "", "  login  ", "backup"]);
    assert_eq!(out, vec!["admin", "login", "backup"]);
}

#[test]
fn line_truncates_url_and_title() {
    let finding = Finding {
        url: format!("http://a.com/{}", "u".repeat(300)),
        status: 503,
        class: StatusClass::of(503),
        title: Some(Title::Text("t".repeat(200))),
    };
    let line = format_line(&finding, false);
    let mut cols = line.split_whitespace();
    let url = cols.next().unwrap();
    let status = cols.next().unwrap();
    let title = cols.next().unwrap();
    assert_eq!(url.chars().count(), 128);
    assert!(url.ends_with("..."));
    assert_eq!(status, "503");
    assert_eq!(title.chars().count(), 128);
    assert!(title.ends_with("..."));
}

#[test]
fn colored_line_still_carries_status() {
    colored::control::set_override(true);
    let titled = Finding {
        url: "http://a.com/x".to_string(),
        status: 200,
        class: StatusClass::Success,
        title: Some(Title::Missing),
    };
    let status_only = Finding {
        url: "http://a.com/y".to_string(),
        status: 302,
        class: StatusClass::Redirect,
        title: None,
    };
    let titled_line = format_line(&titled, true);
    let status_only_line = format_line(&status_only, true);
    colored::control::unset_override();

    assert!(titled_line.contains("200"));
    assert!(titled_line.contains("\u{1b}["));
    assert!(titled_line.ends_with("No Title"));

    // no padding hides inside the escape codes when the status is last
    assert!(status_only_line.ends_with("302\u{1b}[0m"), "{status_only_line:?}");
}
