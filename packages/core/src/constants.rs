use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Get the path to the Engage directory (~/.engage)
pub fn engage_dir() -> PathBuf {
    // HOME first so tests can redirect it
    let home = env::var("HOME").map(PathBuf::from).ok().or_else(dirs::home_dir);
    engage_dir_under(home)
}

fn engage_dir_under(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => home.join(".engage"),
        None => {
            warn!("No home directory found; using ./.engage for local data");
            PathBuf::from(".").join(".engage")
        }
    }
}

/// Get the default path of the deliverable store (~/.engage/engage.db)
pub fn database_file() -> PathBuf {
    engage_dir().join("engage.db")
}

/// Get the default directory of the file-backed progress cache (~/.engage/progress)
pub fn progress_cache_dir() -> PathBuf {
    engage_dir().join("progress")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_engage_dir_under_home() {
        assert_eq!(
            engage_dir_under(Some(PathBuf::from("/home/ada"))),
            PathBuf::from("/home/ada/.engage")
        );
    }

    #[test]
    fn test_missing_home_falls_back_to_working_directory() {
        assert_eq!(engage_dir_under(None), PathBuf::from("./.engage"));
    }
}
