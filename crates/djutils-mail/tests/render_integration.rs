//! Integration tests for rendering message templates from disk.

use std::fs;

use djutils_core::Settings;
use djutils_mail::{render_messages, Context, MailError, MessageRenderer};

fn write(dir: &std::path::Path, name: &str, source: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

#[test]
fn test_render_pair_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "accounts/user/account_recover.txt", "Hello {{ user }},\nuse {{ code }}.");
    write(
        dir.path(),
        "accounts/user/account_recover.html",
        "<p>Hello {{ user }}</p><p>{{ code }}</p>",
    );

    let renderer = MessageRenderer::from_dir(dir.path()).unwrap();
    let mut context = Context::new();
    context.insert("user", "ada");
    context.insert("code", "1234");

    let (text, html) = render_messages(&renderer, "accounts/user", "account_recover", &context).unwrap();
    assert_eq!(text, "Hello ada,\nuse 1234.");
    assert_eq!(html, "<p>Hello ada</p><p>1234</p>");
}

#[test]
fn test_earlier_dir_wins() {
    let project = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    write(project.path(), "m.txt", "project");
    write(fallback.path(), "m.txt", "fallback");
    write(fallback.path(), "m.html", "fallback html");

    let settings = Settings {
        template_dirs: vec![project.path().to_path_buf(), fallback.path().to_path_buf()],
        ..Settings::default()
    };
    let renderer = MessageRenderer::from_settings(&settings).unwrap();
    let (text, html) = render_messages(&renderer, "", "m", &Context::new()).unwrap();
    assert_eq!(text, "project");
    assert_eq!(html, "fallback html");
}

#[test]
fn test_template_inheritance_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "base.html", "<body>{% block content %}{% endblock %}</body>");
    write(
        dir.path(),
        "mail/welcome.html",
        r#"{% extends "base.html" %}{% block content %}Welcome {{ name }}{% endblock %}"#,
    );
    write(dir.path(), "mail/welcome.txt", "Welcome {{ name }}");

    let renderer = MessageRenderer::from_dir(dir.path()).unwrap();
    let mut context = Context::new();
    context.insert("name", "Ada");
    let (_, html) = render_messages(&renderer, "mail", "welcome", &context).unwrap();
    assert_eq!(html, "<body>Welcome Ada</body>");
}

#[test]
fn test_broken_template_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "bad.txt", "{{ unclosed");
    assert!(matches!(MessageRenderer::from_dir(dir.path()), Err(MailError::Load(_))));
}
