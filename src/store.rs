// Whole-file persistence shared by every on-disk store
//
// Files here are read by other processes at any moment, so writes always go to
// a uniquely named sibling temp file that is renamed over the target.
use crate::error::{AwswError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Read a file, treating a missing file as `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AwswError::Persistence(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Replace `path` with `contents` so readers see either the old or new file
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    write_atomic_inner(path, contents).map_err(|e| {
        AwswError::Persistence(format!("Failed to write {}: {}", path.display(), e))
    })
}

fn write_atomic_inner(path: &Path, contents: &[u8]) -> io::Result<()> {
    // Replace the file a symlink points at, not the link itself
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };

    let parent = parent_dir(&target)?;
    create_private_dir(parent)?;

    let temp_path = temp_path_for(&target);
    let result = (|| {
        let mut file = open_private(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, &target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn parent_dir(path: &Path) -> io::Result<&Path> {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        Some(_) => Ok(Path::new(".")),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path has no parent directory",
        )),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
    }

    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
    }
}

fn open_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

/// Exclusive advisory lock on `<path>.lock`, released on drop
///
/// Serializes read-modify-write cycles between concurrent invocations.
/// On platforms without `flock` this only creates the lock file.
pub struct FileLock {
    #[cfg(unix)]
    _lock: nix::fcntl::Flock<File>,
    #[cfg(not(unix))]
    _file: File,
}

impl FileLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        Self::acquire_inner(path).map_err(|e| {
            AwswError::Persistence(format!("Failed to lock {}: {}", path.display(), e))
        })
    }

    fn acquire_inner(path: &Path) -> io::Result<Self> {
        let lock_path = lock_path_for(path);
        create_private_dir(parent_dir(&lock_path)?)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use nix::fcntl::{Flock, FlockArg};
            let lock = Flock::lock(file, FlockArg::LockExclusive)
                .map_err(|(_, errno)| io::Error::from(errno))?;
            tracing::trace!("Locked {}", lock_path.display());
            Ok(Self { _lock: lock })
        }

        #[cfg(not(unix))]
        {
            Ok(Self { _file: file })
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}
