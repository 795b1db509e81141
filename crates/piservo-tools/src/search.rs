//! 配置文件搜索
//!
//! 只给出文件名时，依次查找：
//! 1. 当前目录
//! 2. home 目录
//! 3. `/etc`
//!
//! 都找不到时返回当前目录下的路径（之后保存时会在这里创建）。
//! 带目录部分的路径原样使用。

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 候选路径（按优先级）
pub fn search_paths(name: &str) -> Vec<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut paths = vec![cwd.join(name)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(name));
    }
    paths.push(Path::new("/etc").join(name));
    paths
}

/// 解析配置文件路径
pub fn find_config_file(name: &str) -> PathBuf {
    let given = Path::new(name);
    if given.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        return given.to_path_buf();
    }

    let candidates = search_paths(name);
    for path in &candidates {
        debug!("Searching config file: {}", path.display());
        if path.is_file() {
            debug!("Found config file at {}", path.display());
            return path.clone();
        }
    }

    let fallback = candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| PathBuf::from(name));
    warn!("Config file {} not found, defaulting to {}", name, fallback.display());
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_directory_is_used_as_is() {
        let p = find_config_file("/tmp/some/dir/servo.json");
        assert_eq!(p, PathBuf::from("/tmp/some/dir/servo.json"));

        let p = find_config_file("./servo.json");
        assert_eq!(p, PathBuf::from("./servo.json"));
    }

    #[test]
    fn test_search_order_starts_with_cwd() {
        let paths = search_paths("piservo-test-nonexistent.json");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(paths[0], cwd.join("piservo-test-nonexistent.json"));
        assert_eq!(
            paths.last().unwrap(),
            &PathBuf::from("/etc/piservo-test-nonexistent.json")
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_cwd() {
        let p = find_config_file("piservo-test-nonexistent-4242.json");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(p, cwd.join("piservo-test-nonexistent-4242.json"));
    }
}
