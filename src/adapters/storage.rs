use crate::domain::ports::Storage;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Deletes `path`; a file that is already gone is not an error.
    pub async fn remove_file(&self, path: &str) -> std::io::Result<()> {
        match fs::remove_file(Path::new(&self.base_path).join(path)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        fs::read(full_path)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> std::io::Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)
    }

    fn display_path(&self, path: &str) -> String {
        Path::new(&self.base_path).join(path).display().to_string()
    }
}
