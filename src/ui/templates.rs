// Askama template definitions

use askama::Template;

use crate::db::{BlogPost, Project, User};

/// Custom filters for Askama templates
mod filters {
    /// Date part of an RFC 3339 timestamp
    pub fn date(s: &str) -> ::askama::Result<String> {
        match chrono::DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Ok(dt.format("%B %-d, %Y").to_string()),
            Err(_) => Ok(s.split('T').next().unwrap_or(s).to_string()),
        }
    }
}

/// Navigation bar state shared by every page
pub struct Nav {
    pub site_name: String,
    pub user_name: String, // Empty when signed out
    pub user_role: String,
}

impl Nav {
    pub fn new(site_name: &str, user: Option<&User>) -> Self {
        Self {
            site_name: site_name.to_string(),
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            user_role: user.map(|u| u.role.clone()).unwrap_or_default(),
        }
    }

    pub fn signed_in(&self) -> bool {
        !self.user_name.is_empty()
    }
}

/// Post preview for list views
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub created_at: String,
}

impl From<&BlogPost> for PostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt(180),
            created_at: post.created_at.clone(),
        }
    }
}

/// Values echoed back into the application form
#[derive(Default)]
pub struct ApplyFormValues {
    pub project_id: String,
    pub name: String,
    pub email: String,
    pub statement: String,
}

// Home page
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub projects: Vec<Project>,
    pub posts: Vec<PostSummary>,
}

// Application form
#[derive(Template)]
#[template(path = "apply.html")]
pub struct ApplyTemplate {
    pub nav: Nav,
    pub projects: Vec<Project>,
    pub form: ApplyFormValues,
    pub error: Option<String>,
    pub submitted_title: Option<String>,
}

// Single blog post
#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub post: BlogPost,
    pub edit_url: Option<String>,
}

// Blog post editor, used by both the author and the teacher routes
#[derive(Template)]
#[template(path = "edit_post.html")]
pub struct EditPostTemplate {
    pub nav: Nav,
    pub post: BlogPost,
    pub action: String,
    pub teacher_mode: bool,
    pub error: Option<String>,
}

// Test-account login
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub accounts: Vec<User>,
    pub error: Option<String>,
}

// Not found / not allowed
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub nav: Nav,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_filter() {
        assert_eq!(
            filters::date("2024-03-05T10:00:00+00:00").unwrap(),
            "March 5, 2024"
        );
        assert_eq!(filters::date("2024-03-05 junk").unwrap(), "2024-03-05 junk");
        assert_eq!(filters::date("2024-03-05Tjunk").unwrap(), "2024-03-05");
    }

    #[test]
    fn test_message_template_escapes_html() {
        let html = MessageTemplate {
            nav: Nav::new("Research Match", None),
            title: "Not found".to_string(),
            message: "<script>alert(1)</script>".to_string(),
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Sign in"));
    }
}
