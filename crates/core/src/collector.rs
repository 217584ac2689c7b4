use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOptions {
    pub recursive: bool,
    pub include_hidden: bool,
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug, Default)]
pub struct Collected {
    pub files: Vec<PathBuf>,
    pub skipped_directories: Vec<PathBuf>,
    pub unmatched: Vec<String>,
    pub errors: Vec<PatternError>,
}

#[derive(Default)]
struct Sink {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,
}

impl Sink {
    fn len(&self) -> usize {
        self.files.len() + self.directories.len()
    }
}

pub fn collect_files(patterns: &[String], options: &CollectOptions) -> Collected {
    let mut sink = Sink::default();
    let mut collected = Collected::default();

    for pattern in patterns {
        let before = sink.len();
        // An existing path is never reinterpreted as a glob, even with `{` or `[` in its name.
        if pattern.contains(GLOB_META) && !Path::new(pattern).exists() {
            if let Err(err) = collect_glob(pattern, options, &mut sink) {
                collected.errors.push(err);
                continue;
            }
        } else {
            collect_literal(Path::new(pattern), options, &mut sink);
        }

        if sink.len() == before {
            tracing::debug!(%pattern, "pattern matched nothing");
            collected.unmatched.push(pattern.clone());
        }
    }

    collected.files = dedupe(sink.files);
    collected.skipped_directories = dedupe(sink.directories);
    collected
}

fn collect_literal(path: &Path, options: &CollectOptions, sink: &mut Sink) {
    if path.is_file() {
        sink.files.push(path.to_path_buf());
    } else if path.is_dir() {
        take_directory(path, options, sink);
    }
}

fn collect_glob(
    pattern: &str,
    options: &CollectOptions,
    sink: &mut Sink,
) -> Result<(), PatternError> {
    // Without recursion `**` is just another `*`.
    let effective = if options.recursive {
        pattern.to_string()
    } else {
        pattern.replace("**", "*")
    };
    let matcher = compile(&effective).map_err(|source| PatternError::Invalid {
        pattern: pattern.to_string(),
        source,
    })?;

    let (base, remainder) = split_base(&effective);
    let dot_rule = DotRule::new(&remainder);
    let walk_root = if base.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base.as_path()
    };
    if !walk_root.is_dir() {
        return Ok(());
    }

    let mut walker = WalkDir::new(walk_root).min_depth(1).sort_by_file_name();
    if !(options.recursive && effective.contains("**")) {
        walker = walker.max_depth(remainder.len());
    }

    let include_hidden = options.include_hidden;
    for entry in walker
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || include_hidden
                || !is_hidden(e.path())
                || dot_rule.allows(e.depth(), e.file_name())
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(%pattern, error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let path = if base.as_os_str().is_empty() {
            entry
                .path()
                .strip_prefix(".")
                .unwrap_or(entry.path())
                .to_path_buf()
        } else {
            entry.path().to_path_buf()
        };
        if !matcher.is_match(&path) {
            continue;
        }

        if path.is_file() {
            sink.files.push(path);
        } else if path.is_dir() {
            take_directory(&path, options, sink);
        }
    }

    Ok(())
}

fn take_directory(dir: &Path, options: &CollectOptions, sink: &mut Sink) {
    if !options.recursive {
        sink.directories.push(dir.to_path_buf());
        return;
    }

    let include_hidden = options.include_hidden;
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.path().is_file() {
            sink.files.push(entry.path().to_path_buf());
        }
    }
}

/// Pattern components that spell out a leading dot, which let the walk enter
/// hidden entries without `include_hidden`. `**` itself never matches them.
struct DotRule {
    fixed: Vec<bool>,
    double_star: Option<usize>,
    floating: Vec<GlobMatcher>,
}

impl DotRule {
    fn new(remainder: &[&str]) -> Self {
        let double_star = remainder.iter().position(|c| *c == "**");
        let fixed_len = double_star.unwrap_or(remainder.len());
        let fixed = remainder[..fixed_len]
            .iter()
            .map(|c| c.starts_with('.'))
            .collect();
        let floating = remainder[fixed_len..]
            .iter()
            .filter(|c| c.starts_with('.'))
            .filter_map(|c| compile(c).ok())
            .collect();
        Self {
            fixed,
            double_star,
            floating,
        }
    }

    /// `depth` counts from 1 for the entries directly under the base.
    fn allows(&self, depth: usize, name: &OsStr) -> bool {
        match self.double_star {
            Some(star) if depth > star => self.floating.iter().any(|m| m.is_match(name)),
            _ => self.fixed.get(depth - 1).copied().unwrap_or(false),
        }
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Splits a glob into its leading wildcard-free directory and the path
/// components left after it.
fn split_base(pattern: &str) -> (PathBuf, Vec<&str>) {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let mut base = components[..literal].join("/");
    if base.is_empty() && pattern.starts_with('/') {
        base.push('/');
    }
    let remainder = components[literal..]
        .iter()
        .copied()
        .filter(|c| !c.is_empty())
        .collect();
    (PathBuf::from(base), remainder)
}

fn dedupe(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    let mut seen = HashSet::<PathBuf>::new();
    paths.retain(|path| seen.insert(fs::canonicalize(path).unwrap_or_else(|_| path.clone())));
    paths
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{collect_files, split_base, CollectOptions, PatternError};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    fn tree() -> TempDir {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        for rel in [
            "a.jpg",
            "b.JPG",
            "notes.txt",
            ".hidden.jpg",
            "2013/c.jpg",
            "2013/july/d.jpg",
            "2013/.cache/e.jpg",
            ".private/f.jpg",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, rel).expect("write");
        }
        temp
    }

    fn pattern(root: &Path, rel: &str) -> String {
        format!("{}/{}", root.display(), rel)
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn star_stays_in_one_directory_and_skips_hidden() {
        let temp = tree();
        let found = collect_files(&[pattern(temp.path(), "*.jpg")], &CollectOptions::default());
        assert_eq!(names(temp.path(), &found.files), vec!["a.jpg"]);
        assert!(found.unmatched.is_empty());
    }

    #[test]
    fn hidden_option_includes_dotfiles() {
        let temp = tree();
        let options = CollectOptions {
            recursive: false,
            include_hidden: true,
        };
        let found = collect_files(&[pattern(temp.path(), "*.jpg")], &options);
        assert_eq!(names(temp.path(), &found.files), vec![".hidden.jpg", "a.jpg"]);
    }

    #[test]
    fn recursive_double_star_reaches_every_depth_once() {
        let temp = tree();
        let options = CollectOptions {
            recursive: true,
            include_hidden: false,
        };
        let patterns = vec![
            pattern(temp.path(), "**/*.jpg"),
            pattern(temp.path(), "2013/*.jpg"),
            pattern(temp.path(), "a.jpg"),
        ];
        let found = collect_files(&patterns, &options);
        assert_eq!(
            names(temp.path(), &found.files),
            vec!["2013/c.jpg", "2013/july/d.jpg", "a.jpg"]
        );
    }

    #[test]
    fn double_star_without_recursion_is_single_level() {
        let temp = tree();
        let found = collect_files(
            &[pattern(temp.path(), "**/*.jpg")],
            &CollectOptions::default(),
        );
        assert_eq!(names(temp.path(), &found.files), vec!["2013/c.jpg"]);
    }

    #[test]
    fn recursive_expands_matched_directories() {
        let temp = tree();
        let options = CollectOptions {
            recursive: true,
            include_hidden: true,
        };
        let found = collect_files(&[pattern(temp.path(), "2013")], &options);
        assert_eq!(
            names(temp.path(), &found.files),
            vec!["2013/.cache/e.jpg", "2013/c.jpg", "2013/july/d.jpg"]
        );
    }

    #[test]
    fn directories_without_recursion_are_reported() {
        let temp = tree();
        let found = collect_files(&[pattern(temp.path(), "20*")], &CollectOptions::default());
        assert!(found.files.is_empty());
        assert_eq!(found.skipped_directories, vec![temp.path().join("2013")]);
        assert!(found.unmatched.is_empty());
    }

    #[test]
    fn literal_hidden_file_is_taken_as_is() {
        let temp = tree();
        let found = collect_files(
            &[pattern(temp.path(), ".hidden.jpg")],
            &CollectOptions::default(),
        );
        assert_eq!(names(temp.path(), &found.files), vec![".hidden.jpg"]);
    }

    #[test]
    fn dot_patterns_reach_hidden_entries_without_option() {
        let temp = tree();
        let found = collect_files(
            &[pattern(temp.path(), ".*.jpg")],
            &CollectOptions::default(),
        );
        assert_eq!(names(temp.path(), &found.files), vec![".hidden.jpg"]);

        let found = collect_files(
            &[pattern(temp.path(), "*/.cache/*.jpg")],
            &CollectOptions::default(),
        );
        assert_eq!(names(temp.path(), &found.files), vec!["2013/.cache/e.jpg"]);
    }

    #[test]
    fn double_star_skips_hidden_unless_spelled_out() {
        let temp = tree();
        let options = CollectOptions {
            recursive: true,
            include_hidden: false,
        };
        let found = collect_files(&[pattern(temp.path(), "**/.cache/*.jpg")], &options);
        assert_eq!(names(temp.path(), &found.files), vec!["2013/.cache/e.jpg"]);

        let found = collect_files(&[pattern(temp.path(), "**/f.jpg")], &options);
        assert!(found.files.is_empty());
    }

    #[test]
    fn existing_path_with_brace_is_literal() {
        let temp = tree();
        fs::write(temp.path().join("IMG{1}.jpg"), b"x").expect("write");
        fs::write(temp.path().join("IMG1.jpg"), b"x").expect("write");

        let found = collect_files(
            &[pattern(temp.path(), "IMG{1}.jpg")],
            &CollectOptions::default(),
        );
        assert_eq!(names(temp.path(), &found.files), vec!["IMG{1}.jpg"]);
        assert!(found.unmatched.is_empty());
    }

    #[test]
    fn unmatched_and_invalid_patterns_are_reported() {
        let temp = tree();
        let missing = pattern(temp.path(), "*.png");
        let gone = pattern(temp.path(), "gone.jpg");
        let invalid = pattern(temp.path(), "[.jpg");
        let found = collect_files(
            &[missing.clone(), gone.clone(), invalid],
            &CollectOptions::default(),
        );
        assert!(found.files.is_empty());
        assert_eq!(found.unmatched, vec![missing, gone]);
        assert!(matches!(
            found.errors.as_slice(),
            [PatternError::Invalid { .. }]
        ));
    }

    #[test]
    fn split_base_stops_at_first_wildcard() {
        assert_eq!(split_base("*.jpg"), (PathBuf::new(), vec!["*.jpg"]));
        assert_eq!(
            split_base("photos/2013/*/*.jpg"),
            (PathBuf::from("photos/2013"), vec!["*", "*.jpg"])
        );
        assert_eq!(split_base("/*.jpg"), (PathBuf::from("/"), vec!["*.jpg"]));
    }
}
