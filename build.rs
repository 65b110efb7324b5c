/// Expose the compilation target triple as an environment variable at build time.
///
/// `render-diff --version` reports it alongside the crate version.
fn main() {
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET={target}");
}
