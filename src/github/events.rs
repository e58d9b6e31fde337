/// The only `X-GitHub-Event` kind that triggers a backup. Everything else
/// is acknowledged and ignored.
pub const PUSH_EVENT: &str = "push";

/// Only pushes to the default branches are backed up.
pub fn is_main_branch(git_ref: &str) -> bool {
    git_ref == "refs/heads/main" || git_ref == "refs/heads/master"
}
