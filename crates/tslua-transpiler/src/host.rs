//! Host capabilities and the output write path.
//!
//! All writes flow through a single [`OutputSink`] entry point. During the
//! native-emit phase the sink is wrapped in a [`NativeArtifactFilter`] so
//! artifacts of the front-end's own target never reach the disk.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::trace;

/// File or map suffixes of the front-end's native target. Writes with these
/// suffixes are incidental to driving its emit machinery and are dropped.
pub const NATIVE_EXTENSION: &str = ".js";
pub const NATIVE_MAP_EXTENSION: &str = ".js.map";

/// The capabilities the driver needs from its environment.
pub trait EmitHost {
    /// Must return an absolute path; a relative result is a defect in the
    /// host integration and aborts the run.
    fn current_directory(&self) -> PathBuf;

    fn read_file(&self, path: &Path) -> Option<String>;

    fn write_file(
        &mut self,
        path: &Path,
        content: &str,
        emit_bom: bool,
        source_files: &[PathBuf],
    ) -> Result<()>;
}

/// Where output bytes go. One concrete sink wraps the host's write
/// capability; decorators such as [`NativeArtifactFilter`] compose over it.
pub trait OutputSink {
    fn write(
        &mut self,
        file_name: &str,
        data: &str,
        emit_bom: bool,
        source_files: &[PathBuf],
    ) -> Result<()>;
}

/// Sink backed by an [`EmitHost`].
pub struct HostSink<'a> {
    host: &'a mut dyn EmitHost,
}

impl<'a> HostSink<'a> {
    pub fn new(host: &'a mut dyn EmitHost) -> Self {
        Self { host }
    }
}

impl OutputSink for HostSink<'_> {
    fn write(
        &mut self,
        file_name: &str,
        data: &str,
        emit_bom: bool,
        source_files: &[PathBuf],
    ) -> Result<()> {
        self.host
            .write_file(Path::new(file_name), data, emit_bom, source_files)
    }
}

/// Drops writes of the front-end's native artifacts, forwards everything
/// else unchanged.
pub struct NativeArtifactFilter<'a> {
    inner: &'a mut dyn OutputSink,
}

impl<'a> NativeArtifactFilter<'a> {
    pub fn new(inner: &'a mut dyn OutputSink) -> Self {
        Self { inner }
    }

    pub fn is_native_artifact(file_name: &str) -> bool {
        file_name.ends_with(NATIVE_EXTENSION) || file_name.ends_with(NATIVE_MAP_EXTENSION)
    }
}

impl OutputSink for NativeArtifactFilter<'_> {
    fn write(
        &mut self,
        file_name: &str,
        data: &str,
        emit_bom: bool,
        source_files: &[PathBuf],
    ) -> Result<()> {
        if Self::is_native_artifact(file_name) {
            trace!(file = file_name, "dropped native artifact write");
            return Ok(());
        }
        self.inner.write(file_name, data, emit_bom, source_files)
    }
}

const BOM: &str = "\u{feff}";

/// Host bound to the ambient process: `std::env` and `std::fs`.
pub struct SystemHost;

impl EmitHost for SystemHost {
    fn current_directory(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_default()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn write_file(
        &mut self,
        path: &Path,
        content: &str,
        emit_bom: bool,
        _source_files: &[PathBuf],
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        if emit_bom {
            let mut data = String::with_capacity(BOM.len() + content.len());
            data.push_str(BOM);
            data.push_str(content);
            std::fs::write(path, data)
                .with_context(|| format!("failed to write {}", path.display()))
        } else {
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(String, String)>,
    }

    impl OutputSink for RecordingSink {
        fn write(
            &mut self,
            file_name: &str,
            data: &str,
            _emit_bom: bool,
            _source_files: &[PathBuf],
        ) -> Result<()> {
            self.writes.push((file_name.to_string(), data.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_filter_drops_native_artifacts() {
        let mut sink = RecordingSink::default();
        let mut filter = NativeArtifactFilter::new(&mut sink);
        filter.write("main.js", "var x;", false, &[]).unwrap();
        filter.write("main.js.map", "{}", false, &[]).unwrap();
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_filter_forwards_everything_else_once() {
        let mut sink = RecordingSink::default();
        let mut filter = NativeArtifactFilter::new(&mut sink);
        filter.write("main.lua", "local x\n", false, &[]).unwrap();
        filter.write("main.lua.map", "{}", false, &[]).unwrap();
        filter.write("data.json", "{}", false, &[]).unwrap();
        assert_eq!(
            sink.writes,
            vec![
                ("main.lua".to_string(), "local x\n".to_string()),
                ("main.lua.map".to_string(), "{}".to_string()),
                ("data.json".to_string(), "{}".to_string()),
            ]
        );
    }

    #[test]
    fn test_is_native_artifact() {
        assert!(NativeArtifactFilter::is_native_artifact("a/b/c.js"));
        assert!(NativeArtifactFilter::is_native_artifact("c.js.map"));
        assert!(!NativeArtifactFilter::is_native_artifact("c.lua"));
        assert!(!NativeArtifactFilter::is_native_artifact("c.json"));
        assert!(!NativeArtifactFilter::is_native_artifact("cjs"));
    }
}
