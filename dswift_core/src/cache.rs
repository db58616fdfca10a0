use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::DswiftResult;
use crate::ProjectContext;
use crate::Tag;
use crate::TextEncoding;
use crate::ToolsVersionHeader;
use crate::encoding::read_text;
use crate::parse_tools_version_header;

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// A compute-once map keyed by absolute path.
///
/// Every key has its own slot so that a slow computation only blocks callers
/// asking for the same key. Failed computations leave the slot empty and the
/// next caller retries.
pub struct MemoCache<V> {
	slots: Mutex<HashMap<PathBuf, Slot<V>>>,
}

impl<V> Default for MemoCache<V> {
	fn default() -> Self {
		Self {
			slots: Mutex::new(HashMap::new()),
		}
	}
}

impl<V> std::fmt::Debug for MemoCache<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoCache")
			.field("len", &self.len())
			.finish()
	}
}

impl<V> MemoCache<V> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return the stored value for `key`, computing it under the key's lock
	/// when absent.
	pub fn get_or_try_insert_with(
		&self,
		key: &Path,
		compute: impl FnOnce() -> DswiftResult<V>,
	) -> DswiftResult<Arc<V>> {
		let slot = {
			let mut slots = lock(&self.slots);
			Arc::clone(slots.entry(key.to_path_buf()).or_default())
		};
		let mut value = lock(&slot);

		if let Some(value) = value.as_ref() {
			tracing::debug!(path = %key.display(), "cache hit");
			return Ok(Arc::clone(value));
		}

		tracing::debug!(path = %key.display(), "cache miss");
		let computed = Arc::new(compute()?);
		*value = Some(Arc::clone(&computed));

		Ok(computed)
	}

	/// The stored value for `key`, if one has been computed.
	pub fn get(&self, key: &Path) -> Option<Arc<V>> {
		let slot = lock(&self.slots).get(key).map(Arc::clone)?;
		let value = lock(&slot);
		value.as_ref().map(Arc::clone)
	}

	/// Number of computed entries.
	pub fn len(&self) -> usize {
		lock(&self.slots)
			.values()
			.filter(|slot| lock(slot).is_some())
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		lock(&self.slots).clear();
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A template or included file as loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
	pub path: PathBuf,
	pub text: String,
	pub encoding: TextEncoding,
	/// The `dswift-tools-version` header, when the file opts into tags.
	pub header: Option<ToolsVersionHeader>,
}

/// Loaded file contents keyed by absolute path.
#[derive(Debug, Default)]
pub struct SourceCache {
	files: MemoCache<SourceFile>,
}

impl SourceCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load `path`, decoding it with the encoding the project declares for it
	/// or the one its byte-order mark indicates.
	pub fn load(&self, path: &Path, project: &ProjectContext) -> DswiftResult<Arc<SourceFile>> {
		self.files.get_or_try_insert_with(path, || {
			let decoded = read_text(path, project.declared_encoding(path))?;
			let header = parse_tools_version_header(path, &decoded.text)?;

			Ok(SourceFile {
				path: path.to_path_buf(),
				text: decoded.text,
				encoding: decoded.encoding,
				header,
			})
		})
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

/// Tags discovered in each file, keyed by absolute path.
#[derive(Debug, Default)]
pub struct TagCache {
	tags: MemoCache<Vec<Tag>>,
}

impl TagCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get_or_try_insert_with(
		&self,
		path: &Path,
		discover: impl FnOnce() -> DswiftResult<Vec<Tag>>,
	) -> DswiftResult<Arc<Vec<Tag>>> {
		self.tags.get_or_try_insert_with(path, discover)
	}

	pub fn len(&self) -> usize {
		self.tags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}
