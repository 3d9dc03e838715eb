use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=SCHEMAWELD_ROOT_HINT");

    let hint = env::var("SCHEMAWELD_ROOT_HINT").ok();

    if let Some(raw_hint) = hint {
        let candidate = PathBuf::from(raw_hint);
        let canonical = candidate.canonicalize().unwrap_or(candidate);

        println!("cargo:rustc-env=SCHEMAWELD_ROOT_HINT={}", canonical.display());
    }
}
