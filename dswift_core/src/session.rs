use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::BlockGrammar;
use crate::DswiftError;
use crate::DswiftResult;
use crate::SourceCache;
use crate::TagCache;

/// Prefix of generated generator class names.
pub const DEFAULT_CLASS_PREFIX: &str = "DSwiftGenerator";

/// Hands out unique generator class names: `DSwiftGenerator0`,
/// `DSwiftGenerator1`, ...
#[derive(Debug)]
pub struct NameAllocator {
	prefix: String,
	next: AtomicUsize,
}

impl Default for NameAllocator {
	fn default() -> Self {
		Self::with_prefix(DEFAULT_CLASS_PREFIX)
	}
}

impl NameAllocator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
			next: AtomicUsize::new(0),
		}
	}

	#[allow(clippy::should_implement_trait)]
	pub fn next(&self) -> String {
		let index = self.next.fetch_add(1, Ordering::Relaxed);
		format!("{}{index}", self.prefix)
	}
}

/// Long-lived collaborators shared by every generation in one process.
#[derive(Debug, Default)]
pub struct Services {
	pub grammar: BlockGrammar,
	pub sources: SourceCache,
	pub tags: TagCache,
	pub names: NameAllocator,
}

impl Services {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_grammar(grammar: BlockGrammar) -> Self {
		Self {
			grammar,
			..Self::default()
		}
	}
}

/// Absolute paths of files inlined during one generation run.
#[derive(Debug, Default)]
pub struct IncludeTracker {
	included: Mutex<BTreeSet<PathBuf>>,
}

impl IncludeTracker {
	/// Record `path`. Returns `false` when it was already recorded.
	pub fn insert(&self, path: &Path) -> bool {
		lock(&self.included).insert(path.to_path_buf())
	}

	pub fn contains(&self, path: &Path) -> bool {
		lock(&self.included).contains(path)
	}
}

/// State scoped to a single top-level generation: which files have been
/// inlined and which are currently being expanded.
#[derive(Debug, Default)]
pub struct GenerationRun {
	included: IncludeTracker,
	stack: Mutex<Vec<PathBuf>>,
}

impl GenerationRun {
	pub fn new() -> Self {
		Self::default()
	}

	/// Start expanding `path`. Fails when `path` is already being expanded
	/// further up the include chain. The returned guard ends the expansion
	/// when dropped.
	pub fn enter(&self, path: &Path) -> DswiftResult<ExpansionGuard<'_>> {
		let mut stack = lock(&self.stack);

		if stack.iter().any(|entry| entry == path) {
			let chain = stack
				.iter()
				.map(|entry| entry.display().to_string())
				.chain(std::iter::once(path.display().to_string()))
				.collect::<Vec<_>>()
				.join(" -> ");

			return Err(DswiftError::IncludeCycle { chain });
		}

		stack.push(path.to_path_buf());
		self.included.insert(path);

		Ok(ExpansionGuard { run: self })
	}

	/// Whether `path` has been inlined anywhere in this run.
	pub fn is_included(&self, path: &Path) -> bool {
		self.included.contains(path)
	}

	/// The files currently being expanded, outermost first.
	pub fn include_stack(&self) -> Vec<PathBuf> {
		lock(&self.stack).clone()
	}
}

/// Pops the include stack of a [`GenerationRun`] when dropped.
#[derive(Debug)]
pub struct ExpansionGuard<'a> {
	run: &'a GenerationRun,
}

impl Drop for ExpansionGuard<'_> {
	fn drop(&mut self) {
		lock(&self.run.stack).pop();
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
