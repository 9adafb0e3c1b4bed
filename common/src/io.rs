use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const QUALIFIER: &str = "dev";
pub const ORGANIZATION: &str = "xairaven";
pub const APPLICATION: &str = "sniffer";

pub fn get_storage_file_path(
    file_name: &str, file_kind: FileKind,
) -> Result<PathBuf, std::io::Error> {
    Ok(get_storage_directory(file_kind)?.join(file_name))
}

/// Platform directory for the given kind of file. <br>
/// Falls back to the current directory when the platform has no home directory.
pub fn get_storage_directory(file_kind: FileKind) -> Result<PathBuf, std::io::Error> {
    let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION);
    match dirs {
        None => env::current_dir(),
        Some(value) => Ok(file_kind.into_path(&value).to_path_buf()),
    }
}

pub fn create_parent_directories(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent_path) = path.parent() {
        return fs::create_dir_all(parent_path);
    }

    Ok(())
}

pub enum FileKind {
    Captures,
    Config,
}

impl FileKind {
    pub fn into_path(self, project_dirs: &ProjectDirs) -> &Path {
        match self {
            FileKind::Config => project_dirs.config_dir(),
            FileKind::Captures => project_dirs.data_dir(),
        }
    }
}
