//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so the stylesheet can be served with
//! an immutable cache policy.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let hash = match fingerprint_css(&manifest_dir, &css_path) {
        Ok(hash) => hash,
        Err(e) => {
            println!("cargo:warning=CSS fingerprinting skipped: {e}");
            String::new()
        }
    };

    println!("cargo:rustc-env=CSS_HASH={hash}");
}

/// Copy main.css to `static/css/derived/main.{hash}.css` and return the hash.
fn fingerprint_css(manifest_dir: &Path, css_path: &Path) -> std::io::Result<String> {
    let content = fs::read(css_path)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let short = digest[..8].to_string();

    let derived_dir = manifest_dir.join("static/css/derived");
    fs::create_dir_all(&derived_dir)?;
    fs::write(derived_dir.join(format!("main.{short}.css")), &content)?;

    Ok(short)
}
