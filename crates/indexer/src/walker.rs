use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::warn;
use walkdir::WalkDir;

use crate::error::{IndexerError, Result};
use crate::ledger::Ledger;

/// A discovered vault file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Absolute path
    pub path: PathBuf,

    /// Path relative to the vault root, forward slashes
    pub relative_path: String,

    /// Modification time as unix milliseconds. Informational only; change
    /// detection goes through the content fingerprint.
    pub mtime_ms: u64,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    /// Read the file content, lossily decoding invalid UTF-8.
    pub fn read_content(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Content fingerprint: blake3 of the decoded text, hex-truncated.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex()[..16].to_string()
}

/// Recursive vault file discovery with gitignore-dialect exclusion.
///
/// The matcher is built once at construction from the configured patterns
/// unioned with the vault root's own `.gitignore` (if present).
pub struct VaultWalker {
    root: PathBuf,
    include_extensions: Vec<String>,
    matcher: Gitignore,
}

impl VaultWalker {
    pub fn new(
        root: impl AsRef<Path>,
        include_extensions: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "vault root is not a directory: {}",
                root.display()
            )));
        }

        let mut builder = GitignoreBuilder::new(&root);
        for pattern in exclude_patterns {
            builder.add_line(None, pattern).map_err(|e| {
                IndexerError::Config(format!("invalid exclude pattern '{pattern}': {e}"))
            })?;
        }
        let gitignore = root.join(".gitignore");
        if gitignore.is_file() {
            if let Some(err) = builder.add(&gitignore) {
                warn!("Ignoring unreadable {}: {err}", gitignore.display());
            }
        }
        let matcher = builder
            .build()
            .map_err(|e| IndexerError::Config(format!("failed to build exclusion matcher: {e}")))?;

        let include_extensions = include_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        Ok(Self {
            root,
            include_extensions,
            matcher,
        })
    }

    /// Vault root this walker was built for
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover indexable files, sorted by relative path.
    #[must_use]
    pub fn walk(&self) -> Vec<FileInfo> {
        let mut files = Vec::new();

        let mut it = WalkDir::new(&self.root).follow_links(false).into_iter();
        loop {
            let entry = match it.next() {
                None => break,
                Some(Err(e)) => {
                    warn!("Failed to read entry: {e}");
                    continue;
                }
                Some(Ok(entry)) => entry,
            };

            if entry.path() == self.root {
                continue;
            }
            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };

            let is_dir = entry.file_type().is_dir();
            if self.matcher.matched(&relative, is_dir).is_ignore() {
                if is_dir {
                    it.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() || !self.has_included_extension(entry.path()) {
                continue;
            }

            match self.file_info_at(entry.path().to_path_buf(), relative) {
                Ok(info) => files.push(info),
                Err(e) => warn!("Skipping {}: {e}", entry.path().display()),
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files
    }

    /// Resolve an explicitly named vault-relative path.
    ///
    /// Existence is the only requirement. Extension and exclusion rules
    /// apply to discovery, not to files the caller named directly.
    #[must_use]
    pub fn file_info(&self, relative_path: &str) -> Option<FileInfo> {
        let path = self.root.join(relative_path);
        if !path.is_file() {
            return None;
        }
        self.file_info_at(path, relative_path.replace('\\', "/"))
            .ok()
    }

    /// Ledger paths whose files no longer exist under the root.
    #[must_use]
    pub fn find_deleted(&self, ledger: &Ledger) -> Vec<String> {
        ledger
            .paths()
            .filter(|path| !self.root.join(path).is_file())
            .cloned()
            .collect()
    }

    fn file_info_at(&self, path: PathBuf, relative_path: String) -> Result<FileInfo> {
        let metadata = std::fs::metadata(&path)?;
        let mtime_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as u64);

        Ok(FileInfo {
            path,
            relative_path,
            mtime_ms,
            size: metadata.len(),
        })
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(relative.to_string_lossy().replace('\\', "/"))
    }

    fn has_included_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.include_extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn walker(root: &Path, excludes: &[&str]) -> VaultWalker {
        let excludes: Vec<String> = excludes.iter().map(ToString::to_string).collect();
        VaultWalker::new(root, &[".md".to_string()], &excludes).unwrap()
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    fn walked_paths(walker: &VaultWalker) -> Vec<String> {
        walker
            .walk()
            .into_iter()
            .map(|f| f.relative_path)
            .collect()
    }

    #[test]
    fn test_walk_finds_markdown_recursively() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.md");
        touch(dir.path(), "sub/deep/b.md");
        touch(dir.path(), "c.txt");

        let paths = walked_paths(&walker(dir.path(), &[]));
        assert_eq!(paths, vec!["a.md".to_string(), "sub/deep/b.md".to_string()]);
    }

    #[test]
    fn test_extension_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "UPPER.MD");

        let paths = walked_paths(&walker(dir.path(), &[]));
        assert_eq!(paths, vec!["UPPER.MD".to_string()]);
    }

    #[test]
    fn test_default_exclude_patterns() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "kept.md");
        touch(dir.path(), ".obsidian/hidden.md");
        touch(dir.path(), "_drafts/draft.md");
        touch(dir.path(), "node_modules/pkg/readme.md");

        let paths = walked_paths(&walker(dir.path(), &[".*", "_*", "node_modules"]));
        assert_eq!(paths, vec!["kept.md".to_string()]);
    }

    #[test]
    fn test_root_gitignore_is_honored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "kept.md");
        touch(dir.path(), "archive/old.md");
        fs::write(dir.path().join(".gitignore"), "archive/\n").unwrap();

        let paths = walked_paths(&walker(dir.path(), &[]));
        assert_eq!(paths, vec!["kept.md".to_string()]);
    }

    #[test]
    fn test_gitignore_negation() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "logs/skip.md");
        touch(dir.path(), "logs/keep.md");
        fs::write(dir.path().join(".gitignore"), "logs/*\n!logs/keep.md\n").unwrap();

        let paths = walked_paths(&walker(dir.path(), &[]));
        assert_eq!(paths, vec!["logs/keep.md".to_string()]);
    }

    #[test]
    fn test_file_info_resolves_by_existence_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub/a.md");
        touch(dir.path(), "todo.txt");
        touch(dir.path(), "_private/x.md");

        let w = walker(dir.path(), &["_*"]);
        let info = w.file_info("sub/a.md").unwrap();
        assert_eq!(info.relative_path, "sub/a.md");
        assert!(info.size > 0);

        // Named paths bypass the extension and exclusion rules that govern
        // discovery.
        assert!(w.file_info("todo.txt").is_some());
        assert!(w.file_info("_private/x.md").is_some());
        assert!(w.file_info("missing.md").is_none());
    }

    #[test]
    fn test_nonexistent_root_is_rejected() {
        let err = VaultWalker::new("/no/such/dir", &[".md".to_string()], &[])
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, IndexerError::InvalidPath(_)));
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_addressed() {
        let a = fingerprint("hello");
        let b = fingerprint("hello");
        let c = fingerprint("hello!");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}
