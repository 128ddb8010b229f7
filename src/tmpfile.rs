use crate::error::Result;
use std::io::Write;
use std::path::PathBuf;

const PREFIX: &str = "dotr_";

/// Reserve a unique path `<tmp>/dotr_XXXXXX.<suffix>`. The file is created
/// empty and left on disk so no other caller can be handed the same name.
pub fn generate_path(suffix: &str) -> Result<PathBuf> {
    create(suffix)
}

pub fn create(suffix: &str) -> Result<PathBuf> {
    create_with_content("", suffix)
}

pub fn create_with_content(content: &str, suffix: &str) -> Result<PathBuf> {
    let suffix = if suffix.is_empty() {
        String::new()
    } else {
        format!(".{}", suffix.trim_start_matches('.'))
    };
    let named = tempfile::Builder::new()
        .prefix(PREFIX)
        .suffix(&suffix)
        .tempfile()?;
    let (mut file, path) = named.keep().map_err(|e| e.error)?;
    if !content.is_empty() {
        file.write_all(content.as_bytes())?;
    }
    log::debug!("allocated temp file {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_unique_and_carry_suffix() {
        let a = generate_path("svg").unwrap();
        let b = generate_path("svg").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("svg"));
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(PREFIX));
        assert!(a.exists());
        std::fs::remove_file(a).unwrap();
        std::fs::remove_file(b).unwrap();
    }

    #[test]
    fn leading_dot_in_suffix_is_not_doubled() {
        let path = create(".gv").unwrap();
        assert!(path.to_string_lossy().ends_with(".gv"));
        assert!(!path.to_string_lossy().ends_with("..gv"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn create_with_content_writes_text() {
        let path = create_with_content("digraph G {}\n", "gv").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "digraph G {}\n");
        std::fs::remove_file(path).unwrap();
    }
}
