// File: crates/cml-render-skia/build.rs
// Summary: Links the Windows system libraries Skia's font and ICU code expect.

fn main() {
    #[cfg(target_os = "windows")]
    {
        // RegOpenKeyExW and friends.
        println!("cargo:rustc-link-lib=advapi32");
    }
}
