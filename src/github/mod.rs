//! GitHub API operations using octocrab.

pub mod auth;
pub mod commits;
pub mod publish;

pub use auth::get_github_token;
pub use commits::{
    build_client, day_window, fetch_commits, fetch_repo_context, parse_repo_name, yesterday,
};
pub use publish::{Published, close_old_issues, create_issue, write_report_file};
