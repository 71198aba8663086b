use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Embed the Windows manifest (per-monitor DPI awareness, no elevation)
    println!("cargo:rerun-if-changed=quiz-assistant.rc");
    println!("cargo:rerun-if-changed=quiz-assistant.manifest");
    let _ = embed_resource::compile("quiz-assistant.rc", embed_resource::NONE);

    // Copy the answer bank and config next to the executable
    copy_answer_bank();
    copy_config();
}

/// target/<profile>, found from OUT_DIR (target/<profile>/build/<pkg>-<hash>/out).
fn target_dir() -> PathBuf {
    let out_dir = env::var("OUT_DIR").unwrap();
    Path::new(&out_dir)
        .ancestors()
        .nth(3)
        .expect("Could not find target directory")
        .to_path_buf()
}

/// Copies `data/` so the executable finds its answer files.
fn copy_answer_bank() {
    let data_src = Path::new("data");
    if data_src.exists() {
        copy_dir_recursive(data_src, &target_dir().join("data"));
        println!("cargo:rerun-if-changed=data/");
    }
}

/// Recursively copies a directory and its contents.
fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    if let Ok(entries) = fs::read_dir(src) {
        for entry in entries.flatten() {
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if src_path.is_dir() {
                copy_dir_recursive(&src_path, &dst_path);
            } else {
                let _ = fs::copy(&src_path, &dst_path);
            }
        }
    }
}

/// Copies config.json to the target directory.
fn copy_config() {
    let config_src = Path::new("config.json");
    if config_src.exists() {
        let _ = fs::copy(config_src, target_dir().join("config.json"));
        println!("cargo:rerun-if-changed=config.json");
    }
}
