use std::env;
use std::path::{Path, PathBuf};

/// Print a hint when FFmpeg development files are unlikely to be found.
///
/// Linking itself is done by `ffmpeg-sys-next`; this script only points
/// Windows builds at a vcpkg install so the failure is not a bare link error.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let is_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !is_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_ffmpeg_dir() {
        Some(dir) if dir.join("include").join("libavcodec").exists() => warn(&format!(
            "found FFmpeg under vcpkg at {0}; set FFMPEG_DIR={0} to use it",
            dir.display()
        )),
        Some(dir) => warn(&format!("no FFmpeg headers under {}", dir.display())),
        None => warn("FFMPEG_DIR is not set; install FFmpeg (e.g. `vcpkg install ffmpeg`) and point FFMPEG_DIR at it"),
    }
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(Path::new(&root).join("installed").join(triplet))
}

fn warn(message: &str) {
    println!("cargo:warning=cutlist: {message}");
}
