//! 调试快照服务 - 业务能力层
//!
//! 只负责"把页面源码落盘"能力。等待结果超时后的诊断副产品，
//! 文件名带时间戳，事后人工排查用。

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::Result;

/// 调试快照服务
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 写入一份时间戳命名的页面快照，返回文件路径
    pub fn write(&self, page_source: &str) -> Result<PathBuf> {
        let filename = format!("debug_info_{}.html", Local::now().format("%Y%m%d-%H%M%S"));
        let path = self.dir.join(filename);
        std::fs::write(&path, page_source)?;
        debug!("调试快照已写入: {}", path.display());
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_timestamped_html_snapshot() {
        let dir = std::env::temp_dir().join(format!("snapshots_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let writer = SnapshotWriter::new(&dir);
        let path = writer.write("<html><body>stale page</body></html>").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("debug_info_"));
        assert!(name.ends_with(".html"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "<html><body>stale page</body></html>"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
