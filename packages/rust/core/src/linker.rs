//! End-to-end link operation: symbol file → `srcsrv` index → embedded stream.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use pdblink_providers::ProviderRegistry;
use pdblink_shared::{LinkOptions, PathPair, PdbLinkError, Reporter, Result, SourceFileRecord};

use crate::embed::Embedder;
use crate::normalize::{FsNormalizer, IndexNormalizer, PathNormalizer};
use crate::repository::{Repository, RepositoryOpener, find_repository_root};
use crate::symbols::SymbolOpener;
use crate::verify;

/// Outcome of a successful link.
#[derive(Debug, Clone)]
pub struct LinkReport {
    pub symbol_path: PathBuf,
    /// The side-car index written next to the symbol file.
    pub sidecar_path: PathBuf,
    /// Name of the provider that matched.
    pub provider: String,
    /// The remote URL the provider matched.
    pub remote_url: String,
    pub revision: String,
    /// Source files that made it into the index.
    pub indexed: usize,
    /// Source files recorded in the symbol file.
    pub total: usize,
    /// Files that failed the checksum check (empty when verification was skipped).
    pub changed_or_missing: Vec<String>,
    /// False when the index was written but not embedded.
    pub embedded: bool,
}

impl LinkReport {
    pub fn summary(&self) -> String {
        format!("{}/{} files indexed", self.indexed, self.total)
    }
}

/// Links symbol files to their hosted sources.
///
/// Collaborators are borrowed so one linker can process many symbol files.
pub struct Linker<'a> {
    registry: &'a ProviderRegistry,
    symbols: &'a dyn SymbolOpener,
    repositories: &'a dyn RepositoryOpener,
    embedder: &'a dyn Embedder,
    reporter: &'a dyn Reporter,
}

impl<'a> Linker<'a> {
    pub fn new(
        registry: &'a ProviderRegistry,
        symbols: &'a dyn SymbolOpener,
        repositories: &'a dyn RepositoryOpener,
        embedder: &'a dyn Embedder,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            registry,
            symbols,
            repositories,
            embedder,
            reporter,
        }
    }

    /// [`Linker::link`], reporting any failure instead of returning it.
    pub fn run(&self, options: &LinkOptions) -> bool {
        match self.link(options) {
            Ok(_) => true,
            Err(e) => {
                self.reporter
                    .error(&format!("{}: {e}", options.symbol_path.display()));
                false
            }
        }
    }

    /// Index one symbol file and embed the result.
    ///
    /// 1. Read the recorded source files
    /// 2. Locate the checkout and its revision
    /// 3. Pick a hosting provider
    /// 4. Resolve build paths to repository paths
    /// 5. Verify checksums (optional)
    /// 6. Build and write the side-car index
    /// 7. Embed it (unless `index_only`)
    #[instrument(skip_all, fields(symbol = %options.symbol_path.display()))]
    pub fn link(&self, options: &LinkOptions) -> Result<LinkReport> {
        self.reporter
            .info(&format!("Linking {}", options.symbol_path.display()));

        // The symbol reader and repository handle do not outlive this call.
        let mut report = self.write_index(options)?;

        if options.index_only {
            self.reporter.info(&format!(
                "Index written to {}; skipping embed",
                report.sidecar_path.display()
            ));
        } else {
            self.embedder
                .embed(&options.symbol_path, &report.sidecar_path)?;
            report.embedded = true;
        }

        info!(
            indexed = report.indexed,
            total = report.total,
            provider = %report.provider,
            "link complete"
        );
        self.reporter.info(&report.summary());
        Ok(report)
    }

    fn write_index(&self, options: &LinkOptions) -> Result<LinkReport> {
        // --- Read symbols ---
        let reader = self.symbols.open(&options.symbol_path)?;
        let records = reader.files_and_checksums()?;
        if records.is_empty() {
            return Err(PdbLinkError::discovery(format!(
                "{} records no source files",
                options.symbol_path.display()
            )));
        }
        self.reporter
            .debug(&format!("{} source files recorded", records.len()));

        // --- Locate repository ---
        let root = self.locate_root(options, &records)?;
        let mut repo = RepositorySession::new(self.repositories, root, self.reporter);

        let revision = match &options.revision {
            Some(revision) => revision.clone(),
            None => repo.head_commit()?.ok_or_else(|| {
                PdbLinkError::discovery(format!(
                    "no commit found at HEAD in {}",
                    repo.root().display()
                ))
            })?,
        };

        // --- Select provider ---
        let candidates = match &options.remote_url {
            Some(url) => vec![url.clone()],
            None => repo.remotes()?,
        };
        let provider = self.registry.select(&candidates).ok_or_else(|| {
            if candidates.is_empty() {
                PdbLinkError::Provider("repository has no remotes to match".into())
            } else {
                PdbLinkError::Provider(format!(
                    "no matching provider for {}",
                    candidates.join(", ")
                ))
            }
        })?;
        self.reporter.info(&format!(
            "Using {} for {}",
            provider.provider, provider.remote_url
        ));

        // --- Normalize paths ---
        let normalizer = repo.normalizer()?;
        let path_pairs = self.resolve_paths(normalizer.as_ref(), &records);

        // --- Verify ---
        let changed_or_missing = if options.skip_verify {
            self.reporter.debug("skipping checksum verification");
            Vec::new()
        } else {
            verify::find_changed_or_missing(reader.as_ref(), self.reporter)
        };

        // --- Build and serialize ---
        let context =
            pdblink_srcsrv::build(&provider, &revision, path_pairs, options.download_method)?;
        if context.indexed_count() == 0 {
            return Err(PdbLinkError::discovery(format!(
                "no tracked source files among the {} recorded",
                context.total_count()
            )));
        }

        let sidecar_path = pdblink_srcsrv::write_sidecar(&options.symbol_path, &context)?;

        Ok(LinkReport {
            symbol_path: options.symbol_path.clone(),
            sidecar_path,
            provider: provider.provider,
            remote_url: provider.remote_url,
            revision: context.revision.clone(),
            indexed: context.indexed_count(),
            total: context.total_count(),
            changed_or_missing,
            embedded: false,
        })
    }

    fn locate_root(&self, options: &LinkOptions, records: &[SourceFileRecord]) -> Result<PathBuf> {
        if let Some(dir) = &options.working_dir {
            if !dir.is_dir() {
                return Err(PdbLinkError::config(format!(
                    "working directory {} does not exist",
                    dir.display()
                )));
            }
            return std::path::absolute(dir).map_err(|e| PdbLinkError::io(dir, e));
        }

        let first = records
            .first()
            .map(|r| Path::new(&r.build_path))
            .ok_or_else(|| PdbLinkError::discovery("no source files to locate a checkout from"))?;
        let start = first.parent().unwrap_or(first);

        let root = find_repository_root(start).ok_or_else(|| {
            PdbLinkError::discovery(format!("no .git found above {}", start.display()))
        })?;
        self.reporter
            .debug(&format!("repository root: {}", root.display()));
        Ok(root)
    }

    fn resolve_paths(
        &self,
        normalizer: &dyn PathNormalizer,
        records: &[SourceFileRecord],
    ) -> Vec<PathPair> {
        records
            .iter()
            .map(|record| {
                let repo_path = normalizer.normalize(&record.build_path);
                if repo_path.is_none() {
                    self.reporter
                        .debug(&format!("{} is not tracked", record.build_path));
                }
                PathPair::new(record.build_path.clone(), repo_path)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Repository session
// ---------------------------------------------------------------------------

/// Lazily opened repository handle, released exactly once on drop.
///
/// An open failure is remembered: later calls see no handle and the
/// normalizer falls back to walking the file system.
struct RepositorySession<'a> {
    opener: &'a dyn RepositoryOpener,
    root: PathBuf,
    reporter: &'a dyn Reporter,
    /// `None` until the first open attempt.
    handle: Option<Option<Box<dyn Repository>>>,
}

impl<'a> RepositorySession<'a> {
    fn new(opener: &'a dyn RepositoryOpener, root: PathBuf, reporter: &'a dyn Reporter) -> Self {
        Self {
            opener,
            root,
            reporter,
            handle: None,
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn get(&mut self) -> Option<&dyn Repository> {
        let (opener, root, reporter) = (self.opener, &self.root, self.reporter);
        self.handle
            .get_or_insert_with(|| match opener.open(root) {
                Ok(repo) => {
                    reporter.debug(&format!("opened repository at {}", repo.workdir().display()));
                    Some(repo)
                }
                Err(e) if e.is_not_found() => {
                    reporter.warning(&format!(
                        "{} is not an openable checkout ({e}); resolving paths from the file system",
                        root.display()
                    ));
                    None
                }
                Err(e) => {
                    reporter.warning(&format!(
                        "repository at {} is unusable ({e}); resolving paths from the file system",
                        root.display()
                    ));
                    None
                }
            })
            .as_deref()
    }

    fn head_commit(&mut self) -> Result<Option<String>> {
        match self.get() {
            Some(repo) => repo.head_commit(),
            None => Ok(None),
        }
    }

    fn remotes(&mut self) -> Result<Vec<String>> {
        match self.get() {
            Some(repo) => repo.remotes(),
            None => Ok(Vec::new()),
        }
    }

    fn normalizer(&mut self) -> Result<Box<dyn PathNormalizer>> {
        let root = self.root.clone();
        match self.get() {
            Some(repo) => {
                let tracked = repo.tracked_files()?;
                Ok(Box::new(IndexNormalizer::new(repo.workdir(), tracked)))
            }
            None => Ok(Box::new(FsNormalizer::new(root))),
        }
    }
}

impl Drop for RepositorySession<'_> {
    fn drop(&mut self) {
        if let Some(Some(repo)) = self.handle.take() {
            drop(repo);
            self.reporter.debug("released repository handle");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use pdblink_providers::CustomProvider;
    use pdblink_shared::DownloadMethod;

    use super::*;
    use crate::symbols::SymbolReader;

    const REV: &str = "0123456789abcdef0123456789abcdef01234567";

    // --- Fakes ---

    #[derive(Clone, Default)]
    struct FakeSymbols {
        files: Vec<String>,
        changed: Vec<String>,
        alive: Arc<AtomicBool>,
    }

    struct FakeReader {
        files: Vec<String>,
        changed: Vec<String>,
        alive: Arc<AtomicBool>,
    }

    impl SymbolOpener for FakeSymbols {
        fn open(&self, _symbol_path: &Path) -> Result<Box<dyn SymbolReader>> {
            self.alive.store(true, Ordering::SeqCst);
            Ok(Box::new(FakeReader {
                files: self.files.clone(),
                changed: self.changed.clone(),
                alive: Arc::clone(&self.alive),
            }))
        }
    }

    impl SymbolReader for FakeReader {
        fn files_and_checksums(&self) -> Result<Vec<SourceFileRecord>> {
            Ok(self
                .files
                .iter()
                .map(|f| SourceFileRecord {
                    build_path: f.clone(),
                    checksum: vec![0; 32],
                })
                .collect())
        }

        fn find_missing_or_changed(&self) -> Result<Vec<String>> {
            Ok(self.changed.clone())
        }
    }

    impl Drop for FakeReader {
        fn drop(&mut self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeRepos {
        remotes: Vec<String>,
        head: Option<String>,
        tracked: Vec<String>,
        fail_open: bool,
        broken: bool,
        opened: Arc<AtomicUsize>,
        released: Arc<AtomicUsize>,
    }

    struct FakeRepo {
        workdir: PathBuf,
        remotes: Vec<String>,
        head: Option<String>,
        tracked: Vec<String>,
        released: Arc<AtomicUsize>,
    }

    impl RepositoryOpener for FakeRepos {
        fn open(&self, root: &Path) -> Result<Box<dyn Repository>> {
            if self.fail_open {
                return Err(PdbLinkError::discovery("metadata directory is unreadable"));
            }
            if self.broken {
                return Err(PdbLinkError::Repository("object database is corrupt".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeRepo {
                workdir: root.to_path_buf(),
                remotes: self.remotes.clone(),
                head: self.head.clone(),
                tracked: self.tracked.clone(),
                released: Arc::clone(&self.released),
            }))
        }
    }

    impl Repository for FakeRepo {
        fn workdir(&self) -> &Path {
            &self.workdir
        }

        fn remotes(&self) -> Result<Vec<String>> {
            Ok(self.remotes.clone())
        }

        fn head_commit(&self) -> Result<Option<String>> {
            Ok(self.head.clone())
        }

        fn tracked_files(&self) -> Result<Vec<String>> {
            Ok(self.tracked.clone())
        }
    }

    impl Drop for FakeRepo {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Clone)]
    struct EmbedCall {
        index_path: PathBuf,
        index_existed: bool,
        reader_alive: bool,
    }

    #[derive(Default)]
    struct RecordingEmbedder {
        calls: Mutex<Vec<EmbedCall>>,
        reader_alive: Arc<AtomicBool>,
        fail: bool,
    }

    impl Embedder for RecordingEmbedder {
        fn embed(&self, _symbol_path: &Path, index_path: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(EmbedCall {
                index_path: index_path.to_path_buf(),
                index_existed: index_path.is_file(),
                reader_alive: self.reader_alive.load(Ordering::SeqCst),
            });
            if self.fail {
                return Err(PdbLinkError::Embed("pdbstr exited with 1\nPDB is read-only".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        entries: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingReporter {
        fn at(&self, level: &str) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn debug(&self, message: &str) {
            self.entries.lock().unwrap().push(("debug", message.to_string()));
        }
        fn info(&self, message: &str) {
            self.entries.lock().unwrap().push(("info", message.to_string()));
        }
        fn warning(&self, message: &str) {
            self.entries.lock().unwrap().push(("warning", message.to_string()));
        }
        fn error(&self, message: &str) {
            self.entries.lock().unwrap().push(("error", message.to_string()));
        }
    }

    // --- Fixture ---

    /// A temp dir holding a checkout (`widgets/.git`) and an `out/app.pdb` path.
    struct Fixture {
        dir: PathBuf,
        repo_root: PathBuf,
        symbol: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("pdblink-linker-test-{}", uuid::Uuid::now_v7()));
            let repo_root = dir.join("widgets");
            std::fs::create_dir_all(repo_root.join(".git")).unwrap();
            std::fs::create_dir_all(dir.join("out")).unwrap();
            let symbol = dir.join("out").join("app.pdb");
            Self {
                dir,
                repo_root,
                symbol,
            }
        }

        fn build_path(&self, relative: &str) -> String {
            self.repo_root.join(relative).to_string_lossy().into_owned()
        }

        fn sidecar(&self) -> PathBuf {
            pdblink_srcsrv::sidecar_path(&self.symbol)
        }

        fn options(&self) -> LinkOptions {
            LinkOptions {
                symbol_path: self.symbol.clone(),
                ..LinkOptions::default()
            }
        }

        fn symbols(&self, relative: &[&str]) -> FakeSymbols {
            FakeSymbols {
                files: relative.iter().map(|r| self.build_path(r)).collect(),
                ..FakeSymbols::default()
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    const FILES: [&str; 3] = ["src/Main.cs", "src/Util/Str.cs", "include/api.h"];

    fn github_repo(tracked: &[&str]) -> FakeRepos {
        FakeRepos {
            remotes: vec!["https://github.com/octo/widgets.git".into()],
            head: Some(REV.into()),
            tracked: tracked.iter().map(|t| t.to_string()).collect(),
            ..FakeRepos::default()
        }
    }

    fn body_lines(stream: &str) -> Vec<&str> {
        stream
            .split("\r\n")
            .skip_while(|l| !l.starts_with("SRCSRV: source files"))
            .skip(1)
            .take_while(|l| !l.starts_with("SRCSRV: end"))
            .collect()
    }

    // --- Scenarios ---

    #[test]
    fn all_tracked_files_are_indexed_and_embedded() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        let report = linker.link(&fx.options()).unwrap();
        assert_eq!((report.indexed, report.total), (3, 3));
        assert_eq!(report.provider, "github");
        assert_eq!(report.revision, REV);
        assert_eq!(report.sidecar_path, fx.sidecar());
        assert!(report.embedded);

        let stream = std::fs::read_to_string(fx.sidecar()).unwrap();
        assert!(stream.contains(&format!(
            "RAWURL=https://raw.githubusercontent.com/octo/widgets/{REV}/%var2%\r\n"
        )));
        let body = body_lines(&stream);
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], format!("{}*src/Main.cs", fx.build_path("src/Main.cs")));

        let calls = embedder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].index_path, fx.sidecar());
        assert!(calls[0].index_existed);
        assert!(reporter.at("info").contains(&"3/3 files indexed".to_string()));
    }

    #[test]
    fn untracked_files_are_left_out_of_the_body() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES[..2]);
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        let report = linker.link(&fx.options()).unwrap();
        assert_eq!(report.summary(), "2/3 files indexed");

        let stream = std::fs::read_to_string(fx.sidecar()).unwrap();
        assert_eq!(body_lines(&stream).len(), 2);
        assert!(!stream.contains("api.h"));
        assert!(reporter.at("info").contains(&"2/3 files indexed".to_string()));
    }

    #[test]
    fn no_checkout_fails_before_writing() {
        let fx = Fixture::new();
        let loose = fx.dir.join("loose");
        std::fs::create_dir_all(&loose).unwrap();
        let symbols = FakeSymbols {
            files: vec![loose.join("a.c").to_string_lossy().into_owned()],
            ..FakeSymbols::default()
        };
        let repos = github_repo(&["a.c"]);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let err = linker.link(&fx.options()).unwrap_err();
        assert!(matches!(err, PdbLinkError::Discovery { .. }), "{err}");
        assert!(!fx.sidecar().exists());
        assert_eq!(repos.opened.load(Ordering::SeqCst), 0);
        assert!(embedder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn unmatched_explicit_remote_is_a_provider_error() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let options = LinkOptions {
            remote_url: Some("https://code.example.invalid/team/widgets.git".into()),
            ..fx.options()
        };
        let err = linker.link(&options).unwrap_err();
        assert!(matches!(err, PdbLinkError::Provider(_)), "{err}");
        assert!(err.to_string().contains("code.example.invalid"));
        assert!(!fx.sidecar().exists());
        assert_eq!(
            repos.opened.load(Ordering::SeqCst),
            repos.released.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn half_templated_raw_url_is_a_config_error() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = FakeRepos {
            remotes: vec!["https://git.corp.example/widgets".into()],
            ..github_repo(&FILES)
        };
        let embedder = RecordingEmbedder::default();
        let mut registry = ProviderRegistry::new();
        registry.register_first(Box::new(
            CustomProvider::new(
                "corp",
                r"^https://git\.corp\.example/(?P<repo>[^/]+)$",
                "https://git.corp.example/{repo}/raw/{revision}",
            )
            .unwrap(),
        ));
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let err = linker.link(&fx.options()).unwrap_err();
        assert!(matches!(err, PdbLinkError::Config { .. }), "{err}");
        assert!(!fx.sidecar().exists());
    }

    // --- Orchestration details ---

    #[test]
    fn symbol_reader_is_released_before_embed() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder {
            reader_alive: Arc::clone(&symbols.alive),
            ..RecordingEmbedder::default()
        };
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        linker.link(&fx.options()).unwrap();
        let calls = embedder.calls.lock().unwrap();
        assert!(!calls[0].reader_alive);
        assert_eq!(repos.opened.load(Ordering::SeqCst), 1);
        assert_eq!(repos.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn index_only_skips_embed() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let options = LinkOptions {
            index_only: true,
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert!(!report.embedded);
        assert!(fx.sidecar().is_file());
        assert!(embedder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn run_reports_success() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        assert!(linker.run(&fx.options()));
        assert!(reporter.at("error").is_empty());
        assert!(reporter.at("info").contains(&"3/3 files indexed".to_string()));
        assert_eq!(embedder.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn embed_failure_is_fatal_and_keeps_the_sidecar() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder {
            fail: true,
            ..RecordingEmbedder::default()
        };
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        assert!(!linker.run(&fx.options()));
        assert!(fx.sidecar().is_file());
        let errors = reporter.at("error");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("PDB is read-only"));
    }

    #[test]
    fn checksum_mismatches_warn_without_failing() {
        let fx = Fixture::new();
        let mut symbols = fx.symbols(&FILES);
        symbols.changed = vec![fx.build_path("src/Main.cs")];
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        let report = linker.link(&fx.options()).unwrap();
        assert_eq!(report.changed_or_missing.len(), 1);
        assert_eq!(reporter.at("warning").len(), 1);

        let quiet = RecordingReporter::default();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &quiet);
        let options = LinkOptions {
            skip_verify: true,
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert!(report.changed_or_missing.is_empty());
        assert!(quiet.at("warning").is_empty());
    }

    #[test]
    fn missing_head_commit_is_a_discovery_error() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = FakeRepos {
            head: None,
            ..github_repo(&FILES)
        };
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let err = linker.link(&fx.options()).unwrap_err();
        assert!(err.to_string().contains("no commit found at HEAD"));
        assert_eq!(repos.released.load(Ordering::SeqCst), 1);

        let options = LinkOptions {
            revision: Some("feedface".into()),
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert_eq!(report.revision, "feedface");
    }

    #[test]
    fn nothing_tracked_is_a_discovery_error() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&["README.md"]);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let err = linker.link(&fx.options()).unwrap_err();
        assert!(err.to_string().contains("no tracked source files"));
        assert!(!fx.sidecar().exists());
    }

    #[test]
    fn empty_symbol_file_is_a_discovery_error() {
        let fx = Fixture::new();
        let symbols = FakeSymbols::default();
        let repos = github_repo(&[]);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let err = linker.link(&fx.options()).unwrap_err();
        assert!(matches!(err, PdbLinkError::Discovery { .. }));
    }

    #[test]
    fn unopenable_repository_falls_back_to_the_file_system() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.repo_root.join("Src")).unwrap();
        std::fs::write(fx.repo_root.join("Src").join("Main.cs"), "class Main {}").unwrap();

        let symbols = fx.symbols(&["src/main.cs", "src/gone.cs"]);
        let repos = FakeRepos {
            fail_open: true,
            ..FakeRepos::default()
        };
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        let options = LinkOptions {
            revision: Some(REV.into()),
            remote_url: Some("git@github.com:octo/widgets.git".into()),
            working_dir: Some(fx.repo_root.clone()),
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert_eq!(report.summary(), "1/2 files indexed");

        let stream = std::fs::read_to_string(fx.sidecar()).unwrap();
        assert!(body_lines(&stream)[0].ends_with("*Src/Main.cs"));
        let warnings = reporter.at("warning");
        assert!(warnings[0].contains("not an openable checkout"));
        assert!(!warnings[0].contains("is unusable"));
    }

    #[test]
    fn broken_repository_degrades_with_its_own_warning() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.repo_root.join("src")).unwrap();
        std::fs::write(fx.repo_root.join("src").join("Main.cs"), "class Main {}").unwrap();

        let symbols = fx.symbols(&["src/Main.cs"]);
        let repos = FakeRepos {
            broken: true,
            ..FakeRepos::default()
        };
        let embedder = RecordingEmbedder::default();
        let reporter = RecordingReporter::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &reporter);

        let options = LinkOptions {
            revision: Some(REV.into()),
            remote_url: Some("https://github.com/octo/widgets.git".into()),
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert_eq!(report.summary(), "1/1 files indexed");

        let warnings = reporter.at("warning");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("is unusable"));
        assert!(warnings[0].contains("object database is corrupt"));
        assert!(!warnings[0].contains("not an openable checkout"));
    }

    #[test]
    fn missing_working_directory_is_a_config_error() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = github_repo(&FILES);
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let options = LinkOptions {
            working_dir: Some(fx.dir.join("no-such-dir")),
            ..fx.options()
        };
        let err = linker.link(&options).unwrap_err();
        assert!(matches!(err, PdbLinkError::Config { .. }));
    }

    #[test]
    fn azure_remote_produces_structured_index() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = FakeRepos {
            remotes: vec!["https://dev.azure.com/contoso/Web/_git/Web".into()],
            ..github_repo(&FILES)
        };
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let options = LinkOptions {
            download_method: DownloadMethod::Powershell,
            ..fx.options()
        };
        let report = linker.link(&options).unwrap();
        assert_eq!(report.provider, "azure-devops");

        let stream = std::fs::read_to_string(fx.sidecar()).unwrap();
        assert!(stream.contains("TFS_COLLECTION=https://dev.azure.com/contoso/\r\n"));
        assert!(stream.contains(&format!("TFS_COMMIT={REV}\r\n")));
        assert!(stream.contains("SRCSRVVERCTRL=git\r\n"));
        assert_eq!(body_lines(&stream).len(), 3);
    }

    #[test]
    fn first_matching_remote_wins() {
        let fx = Fixture::new();
        let symbols = fx.symbols(&FILES);
        let repos = FakeRepos {
            remotes: vec![
                "https://code.example.invalid/mirror.git".into(),
                "git@bitbucket.org:team/widgets.git".into(),
                "https://github.com/octo/widgets.git".into(),
            ],
            ..github_repo(&FILES)
        };
        let embedder = RecordingEmbedder::default();
        let registry = ProviderRegistry::new();
        let linker = Linker::new(&registry, &symbols, &repos, &embedder, &pdblink_shared::SilentReporter);

        let report = linker.link(&fx.options()).unwrap();
        assert_eq!(report.provider, "bitbucket");
        assert_eq!(report.remote_url, "git@bitbucket.org:team/widgets.git");
    }
}
