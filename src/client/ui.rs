use crate::types::auth::SessionStatus;
use std::time::{Duration, Instant};

pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    Info,
}

/// Transient message in the corner of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    shown_at: Instant,
}

impl Banner {
    pub fn new(text: impl Into<String>, kind: BannerKind) -> Self {
        Self {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, BannerKind::Success)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, BannerKind::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, BannerKind::Info)
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < BANNER_TTL
    }
}

/// Header bar: login/signup buttons or the greeting plus logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderDisplay {
    pub logged_in: bool,
    pub greeting: String,
    /// The login form is dimmed and inert while someone is logged in.
    pub login_form_enabled: bool,
}

impl Default for HeaderDisplay {
    fn default() -> Self {
        Self::logged_out()
    }
}

impl HeaderDisplay {
    pub fn logged_out() -> Self {
        Self {
            logged_in: false,
            greeting: "Hello, User!".to_string(),
            login_form_enabled: true,
        }
    }

    /// Logged in only when the status says so and carries a non-empty email.
    pub fn from_status(status: &SessionStatus) -> Self {
        let Some(email) = status
            .email
            .as_deref()
            .filter(|e| status.logged_in && !e.is_empty())
        else {
            return Self::logged_out();
        };
        let name = status
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(email);
        Self {
            logged_in: true,
            greeting: format!("Hello, {name}!"),
            login_form_enabled: false,
        }
    }
}

/// Where a document click landed, relative to the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Sidebar,
    ToggleButton,
    Elsewhere,
}

/// Collapsible navigation sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sidebar {
    open: bool,
}

impl Sidebar {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// The toggle button hides while the sidebar is open.
    pub fn toggle_button_visible(&self) -> bool {
        !self.open
    }

    pub fn aria_expanded(&self) -> &'static str {
        if self.open { "true" } else { "false" }
    }

    pub fn document_click(&mut self, target: ClickTarget) {
        if target == ClickTarget::Elsewhere {
            self.close();
        }
    }

    pub fn key_down(&mut self, key: &str) {
        if key == "Escape" {
            self.close();
        }
    }

    /// Click on a sidebar link: its `href`, else its `data-target`. A link
    /// with neither is inert and leaves the sidebar alone.
    pub fn follow_link<'a>(
        &mut self,
        href: Option<&'a str>,
        data_target: Option<&'a str>,
    ) -> Option<&'a str> {
        let target = non_empty(href).or_else(|| non_empty(data_target))?;
        self.close();
        Some(target)
    }
}

fn non_empty(attr: Option<&str>) -> Option<&str> {
    attr.filter(|v| !v.is_empty())
}

/// Where a prev/next topic button leads.
pub fn topic_button_target(data_target: Option<&str>) -> Option<&str> {
    non_empty(data_target)
}

/// Last path segment of the current location, `index.html` for `/`.
pub fn current_page(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(last) if !last.is_empty() => last,
        _ => "index.html",
    }
}

/// Navigation links (by `href` or `data-target`) marked active for `path`.
pub fn active_links<'a>(targets: &[&'a str], path: &str) -> Vec<&'a str> {
    let page = current_page(path);
    targets
        .iter()
        .copied()
        .filter(|t| !t.is_empty() && t.ends_with(page))
        .collect()
}
