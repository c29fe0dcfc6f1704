use std::{env, fs, path::PathBuf};

fn main() {
    // 1) Handle memory.x based on target
    let target = env::var("TARGET").unwrap_or_default();
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo always sets OUT_DIR"));

    if target.starts_with("thumbv6m") || target.starts_with("thumbv8m") {
        let memory_x = if target.starts_with("thumbv8m") {
            "memory-pico2.x"
        } else {
            "memory-pico1.x"
        };
        let contents = fs::read_to_string(memory_x)
            .unwrap_or_else(|err| panic!("Failed to read {memory_x}: {err}"));
        fs::write(out_dir.join("memory.x"), contents).expect("Failed to write memory.x");
        println!("cargo:rustc-link-search={}", out_dir.display());
        println!("cargo:rerun-if-changed={memory_x}");
    }

    // 2) Strip wiring, overridable from the environment
    let strip_pin = env_or_default("KNOB_STRIP_PIN", "0");
    let strip_len = env_or_default("KNOB_STRIP_LEN", "5");

    // 3) Expose as compile-time constants
    println!("cargo:rustc-env=KNOB_STRIP_PIN={strip_pin}");
    println!("cargo:rustc-env=KNOB_STRIP_LEN={strip_len}");

    println!("cargo:rerun-if-env-changed=KNOB_STRIP_PIN");
    println!("cargo:rerun-if-env-changed=KNOB_STRIP_LEN");
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
