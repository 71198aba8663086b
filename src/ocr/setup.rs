use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Common install locations of the UB-Mannheim Windows build.
const COMMON_INSTALL_DIRS: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the directory for storing Tesseract language data
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quiz-assistant")
        .join("tesseract")
}

fn traineddata_name(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Ensures Tesseract and the model for `language` are available.
///
/// The executable must already be installed; the language model is
/// downloaded into the local data directory when no tessdata has it.
pub fn ensure_tesseract(language: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;

    if let Ok(tessdata) = find_tessdata_dir(language) {
        info!("Tesseract found at {}, tessdata at {}", executable.display(), tessdata.display());
        return Ok(TesseractPaths {
            executable,
            tessdata,
        });
    }

    info!("{} not found locally, downloading...", traineddata_name(language));
    let tessdata = get_tesseract_dir().join("tessdata");
    fs::create_dir_all(&tessdata)?;
    download_tessdata(&tessdata, language)?;

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Downloads `<language>.traineddata` from the tessdata repository.
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let name = traineddata_name(language);
    let url = format!("{}/{}", TESSDATA_REPO, name);
    let path = tessdata_dir.join(&name);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "quiz-assistant")
        .send()
        .with_context(|| format!("Failed to download {}", name))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;

    // Write to a temp name first so an interrupted download is not mistaken for a model
    let partial = tessdata_dir.join(format!("{}.part", name));
    let mut file = fs::File::create(&partial)?;
    file.write_all(&bytes)?;
    drop(file);
    fs::rename(&partial, &path)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(())
}

/// Finds the Tesseract executable: system PATH first, then common install paths
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in &COMMON_INSTALL_DIRS {
        let p = Path::new(dir).join("tesseract.exe");
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Please install Tesseract-OCR:\n\
         1. Download from: https://github.com/UB-Mannheim/tesseract/releases\n\
         2. Run the installer (choose to add to PATH)\n\
         3. Restart this application after installation"
    ))
}

/// Finds a tessdata directory containing the model for `language`
pub fn find_tessdata_dir(language: &str) -> Result<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }
    candidates.extend(COMMON_INSTALL_DIRS.iter().map(|d| Path::new(d).join("tessdata")));

    find_model_in(&candidates, language).ok_or_else(|| {
        anyhow!(
            "tessdata directory not found. Please ensure {} is available.",
            traineddata_name(language)
        )
    })
}

fn find_model_in(candidates: &[PathBuf], language: &str) -> Option<PathBuf> {
    let name = traineddata_name(language);
    candidates.iter().find(|dir| dir.join(&name).exists()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_find_model_in_prefers_first_candidate_with_model() {
        let empty = tempdir().unwrap();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("chi_sim.traineddata"), b"model").unwrap();
        fs::write(second.path().join("chi_sim.traineddata"), b"model").unwrap();

        let candidates = vec![
            empty.path().to_path_buf(),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ];
        assert_eq!(
            find_model_in(&candidates, "chi_sim"),
            Some(first.path().to_path_buf())
        );
        assert_eq!(find_model_in(&candidates, "eng"), None);
    }
}
